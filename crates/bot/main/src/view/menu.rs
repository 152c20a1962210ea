use async_trait::async_trait;
use bot_admin::{broadcast::BroadcastView, search::UserSearch, AdminMenu};
use bot_core::{
    callback_data::Calldata as _,
    calldata,
    context::Context,
    widget::{Jmp, View},
};
use bot_viewer::day::{fmt_days_left, fmt_utc_dt};
use chrono::{DateTime, Utc};
use eyre::{bail, Result};
use model::subscription::SubscriptionView;
use serde::{Deserialize, Serialize};
use strum::EnumIter;
use teloxide::{
    types::{BotCommand, InlineKeyboardButton, InlineKeyboardMarkup, Message},
    utils::markdown::escape,
};

use super::{channel::ChannelInfoView, products::ProductsView, profile::ProfileView};

pub struct MainMenuView;

#[async_trait]
impl View for MainMenuView {
    fn name(&self) -> &'static str {
        "MainMenu"
    }

    fn main_view(&self) -> bool {
        true
    }

    async fn show(&mut self, ctx: &mut Context) -> Result<()> {
        let now = Utc::now();
        let status = menu_status(&ctx.me.subscription(now), now);
        let text = format!(
            "🏠 *Добро пожаловать, {}\\!*\n\n\
             Здесь вы можете приобрести доступ к нашему приватному каналу за звезды Telegram\\.\n\n\
             📺 Статус подписки: {}\n\nВыберите действие:",
            escape(&ctx.me.name.first_name),
            status
        );

        let mut keymap = InlineKeyboardMarkup::default();
        keymap = keymap.append_row(vec![
            MenuCallback::Subscriptions.button("💎 Подписки"),
            MenuCallback::Channel.button("ℹ️ О канале"),
        ]);
        keymap = keymap.append_row(MenuCallback::Profile.btn_row("👤 Профиль"));
        if ctx.is_admin() {
            keymap = keymap.append_row(MenuCallback::Admin.btn_row("🔧 Админ-панель"));
        }
        ctx.edit_origin(&text, keymap).await?;
        Ok(())
    }

    async fn handle_message(&mut self, ctx: &mut Context, msg: &Message) -> Result<Jmp> {
        let command = if let Some(command) = msg.text().and_then(Command::parse) {
            command
        } else {
            return Ok(Jmp::None);
        };
        // The screen is redrawn below the command.
        ctx.origin().invalidate();

        Ok(match command {
            Command::Menu(MainMenuItem::Home) => Jmp::Home,
            Command::Menu(MainMenuItem::Subscriptions) => ProductsView.into(),
            Command::Menu(MainMenuItem::Channel) => ChannelInfoView.into(),
            Command::Menu(MainMenuItem::Profile) => ProfileView.into(),
            Command::Menu(MainMenuItem::Admin) => AdminMenu.into(),
            Command::Broadcast(text) => BroadcastView::new(text).into(),
            Command::SearchUser(query) => UserSearch::new(query).into(),
        })
    }

    async fn handle_callback(&mut self, _: &mut Context, data: &str) -> Result<Jmp> {
        Ok(match calldata!(data) {
            MenuCallback::Subscriptions => ProductsView.into(),
            MenuCallback::Channel => ChannelInfoView.into(),
            MenuCallback::Profile => ProfileView.into(),
            MenuCallback::Admin => AdminMenu.into(),
        })
    }
}

#[derive(Serialize, Deserialize)]
enum MenuCallback {
    Subscriptions,
    Channel,
    Profile,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Menu(MainMenuItem),
    Broadcast(Option<String>),
    SearchUser(Option<String>),
}

impl Command {
    /// Parses `/command[@bot] [args]`. Plain text is not a command.
    pub fn parse(text: &str) -> Option<Command> {
        let text = text.trim();
        if !text.starts_with('/') {
            return None;
        }
        let (command, args) = match text.split_once(char::is_whitespace) {
            Some((command, args)) => (command, Some(args.trim().to_owned())),
            None => (text, None),
        };
        let command = command.split('@').next().unwrap_or(command);
        let args = args.filter(|args| !args.is_empty());

        match command {
            BROADCAST_NAME => Some(Command::Broadcast(args)),
            SEARCH_USER_NAME => Some(Command::SearchUser(args)),
            _ => MainMenuItem::try_from(command).ok().map(Command::Menu),
        }
    }
}

#[derive(EnumIter, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MainMenuItem {
    Home,
    Subscriptions,
    Channel,
    Profile,
    Admin,
}

const HOME_DESCRIPTION: &str = "Главное меню 🏠";
const HOME_NAME: &str = "/start";

const SUBSCRIPTIONS_DESCRIPTION: &str = "Подписки 💎";
const SUBSCRIPTIONS_NAME: &str = "/subscriptions";

const CHANNEL_DESCRIPTION: &str = "О канале ℹ️";
const CHANNEL_NAME: &str = "/channel";

const PROFILE_DESCRIPTION: &str = "Профиль 👤";
const PROFILE_NAME: &str = "/profile";

const ADMIN_DESCRIPTION: &str = "Админ-панель 🔧";
const ADMIN_NAME: &str = "/admin";

const BROADCAST_NAME: &str = "/broadcast";
const SEARCH_USER_NAME: &str = "/search_user";

impl MainMenuItem {
    pub fn description(&self) -> &'static str {
        match self {
            MainMenuItem::Home => HOME_DESCRIPTION,
            MainMenuItem::Subscriptions => SUBSCRIPTIONS_DESCRIPTION,
            MainMenuItem::Channel => CHANNEL_DESCRIPTION,
            MainMenuItem::Profile => PROFILE_DESCRIPTION,
            MainMenuItem::Admin => ADMIN_DESCRIPTION,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MainMenuItem::Home => HOME_NAME,
            MainMenuItem::Subscriptions => SUBSCRIPTIONS_NAME,
            MainMenuItem::Channel => CHANNEL_NAME,
            MainMenuItem::Profile => PROFILE_NAME,
            MainMenuItem::Admin => ADMIN_NAME,
        }
    }
}

impl From<MainMenuItem> for InlineKeyboardButton {
    fn from(value: MainMenuItem) -> Self {
        InlineKeyboardButton::callback(value.description(), value.name())
    }
}

impl From<MainMenuItem> for BotCommand {
    fn from(value: MainMenuItem) -> Self {
        BotCommand {
            command: value.name().to_string(),
            description: value.description().to_string(),
        }
    }
}

impl TryFrom<&str> for MainMenuItem {
    type Error = eyre::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            HOME_NAME | HOME_DESCRIPTION | "/home" => Ok(MainMenuItem::Home),
            SUBSCRIPTIONS_NAME | SUBSCRIPTIONS_DESCRIPTION => Ok(MainMenuItem::Subscriptions),
            CHANNEL_NAME | CHANNEL_DESCRIPTION => Ok(MainMenuItem::Channel),
            PROFILE_NAME | PROFILE_DESCRIPTION => Ok(MainMenuItem::Profile),
            ADMIN_NAME | ADMIN_DESCRIPTION => Ok(MainMenuItem::Admin),
            _ => bail!("Unknown command"),
        }
    }
}

fn menu_status(sub: &SubscriptionView, now: DateTime<Utc>) -> String {
    match sub.until {
        Some(until) if sub.active => format!(
            "✅ Активна\n⏰ Действует до: _{}_ \\(осталось {}\\)",
            fmt_utc_dt(&until),
            fmt_days_left(sub, now)
        ),
        _ => "❌ Неактивна".to_owned(),
    }
}
