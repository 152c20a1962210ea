pub mod payment;
mod view;

use bot_core::{
    handlers::{callback::callback_handler, message::message_handler, Services},
    state::StateHolder,
    widget::View,
};
use env::Env;
use eyre::Result;
use ledger::{channel::ChannelManager, Ledger};
use log::info;
use teloxide::{
    dispatching::UpdateFilterExt as _,
    dptree,
    prelude::{Dispatcher, Requester as _},
    types::{CallbackQuery, Message, PreCheckoutQuery, Update},
    Bot,
};
use view::menu::{MainMenuItem, MainMenuView};

#[derive(Clone)]
pub struct BotApp {
    pub bot: Bot,
    pub env: Env,
    pub state: StateHolder,
}

impl BotApp {
    pub fn new(env: Env) -> Self {
        BotApp {
            bot: Bot::new(env.tg_token()),
            state: StateHolder::default(),
            env,
        }
    }

    pub async fn start(self, ledger: Ledger, channel: ChannelManager) -> Result<()> {
        let bot = self.bot;
        bot.set_my_commands(vec![
            MainMenuItem::Home.into(),
            MainMenuItem::Subscriptions.into(),
            MainMenuItem::Channel.into(),
            MainMenuItem::Profile.into(),
        ])
        .await?;

        let services = Services {
            ledger,
            channel,
            env: self.env,
            state: self.state,
        };
        let payment_services = services.clone();
        let msg_services = services.clone();
        let callback_services = services;

        let handler = dptree::entry()
            .branch(
                Update::filter_message()
                    .filter(|msg: Message| msg.successful_payment().is_some())
                    .endpoint(move |bot: Bot, msg: Message| {
                        payment::successful_payment_handler(bot, msg, payment_services.clone())
                    }),
            )
            .branch(
                Update::filter_message().endpoint(move |bot: Bot, msg: Message| {
                    message_handler(bot, msg, msg_services.clone(), || MainMenuView.widget())
                }),
            )
            .branch(
                Update::filter_pre_checkout_query().endpoint(|bot: Bot, q: PreCheckoutQuery| {
                    payment::pre_checkout_handler(bot, q)
                }),
            )
            .branch(
                Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
                    callback_handler(bot, q, callback_services.clone(), || {
                        MainMenuView.widget()
                    })
                }),
            );

        info!("Bot started");
        Dispatcher::builder(bot, handler)
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
        Ok(())
    }
}
