pub mod callback;
pub mod message;

use crate::{
    bot::{Origin, TgBot},
    context::Context,
    state::StateHolder,
    widget::{Jmp, Widget},
    ACCESS_DENIED, ERROR,
};
use env::Env;
use eyre::Error;
use ledger::{channel::ChannelManager, Ledger};
use log::{error, warn};
use model::user::UserName;
use teloxide::{
    prelude::Requester as _,
    types::{ChatId, User as TgUser},
    utils::markdown::escape,
    Bot,
};

/// Everything an update handler needs besides the update itself.
#[derive(Clone)]
pub struct Services {
    pub ledger: Ledger,
    pub channel: ChannelManager,
    pub env: Env,
    pub state: StateHolder,
}

pub fn user_name(from: &TgUser) -> UserName {
    UserName {
        tg_user_name: from.username.clone(),
        first_name: from.first_name.clone(),
        last_name: from.last_name.clone(),
    }
}

/// Registers or refreshes the sender and restores the chat's screen stack.
async fn build_context(
    bot: Bot,
    services: &Services,
    from: &TgUser,
    chat_id: ChatId,
) -> Result<(Context, Option<Widget>), (Error, Bot)> {
    let tg_id = from.id.0 as i64;
    let ledger = &services.ledger;
    let mut session = ledger
        .db
        .start_session(tg_id)
        .await
        .map_err(|err| (err, bot.clone()))?;
    let me = ledger
        .users
        .upsert(&mut session, tg_id, &user_name(from))
        .await
        .map_err(|err| (err, bot.clone()))?;

    let state = services.state.get_state(chat_id).unwrap_or_default();
    let origin = if let Some(origin) = state.origin {
        origin
    } else {
        let id = bot
            .send_message(chat_id, ".")
            .await
            .map_err(|err| (err.into(), bot.clone()))?
            .id;
        Origin {
            chat_id,
            message_id: id,
            tkn: services.state.get_token(chat_id),
        }
    };

    let tg_bot = TgBot::new(bot, services.state.tokens(), origin);
    Ok((
        Context::new(
            tg_bot,
            me,
            ledger.clone(),
            services.channel.clone(),
            services.env.clone(),
            session,
        ),
        state.view,
    ))
}

/// The only authorization check: a screen that requires a right the sender
/// lacks is replaced with the main menu before it handles or shows anything.
async fn gate(
    ctx: &mut Context,
    widget: Widget,
    system_handler: &impl Fn() -> Widget,
) -> Widget {
    if widget.is_allowed(&ctx.rights) {
        return widget;
    }
    warn!("User {} is not allowed to open {}", ctx.me.tg_id, widget.name());
    ctx.send_notification(&escape(ACCESS_DENIED)).await;
    system_handler()
}

fn apply_jmp(mut widget: Widget, jmp: Jmp, system_handler: &impl Fn() -> Widget) -> Widget {
    match jmp {
        Jmp::Next(mut new_widget) => {
            new_widget.set_back(widget);
            new_widget
        }
        Jmp::Goto(new_widget) => new_widget,
        Jmp::Stay | Jmp::None => widget,
        Jmp::Back => widget.take_back().unwrap_or_else(system_handler),
        Jmp::Home => system_handler(),
    }
}

async fn report_error(ctx: &mut Context, err: Error) {
    error!("Failed to handle update: {:#}", err);
    let text = if ctx.is_admin() {
        format!("Failed to handle message: {:#}", err)
    } else {
        ERROR.to_owned()
    };
    if let Err(err) = ctx.send_msg(&escape(&text)).await {
        error!("send message error :{:#}", err);
    }
}
