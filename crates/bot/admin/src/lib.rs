use async_trait::async_trait;
use bot_core::{
    callback_data::Calldata as _,
    calldata,
    context::Context,
    widget::{Jmp, View},
};
use eyre::Result;
use model::rights::Rule;
use serde::{Deserialize, Serialize};
use teloxide::types::InlineKeyboardMarkup;

pub mod broadcast;
pub mod card;
pub mod channel;
pub mod export;
pub mod payments;
pub mod search;
pub mod settings;
pub mod stats;
pub mod users;

pub struct AdminMenu;

#[async_trait]
impl View for AdminMenu {
    fn name(&self) -> &'static str {
        "AdminMenu"
    }

    fn required_rule(&self) -> Option<Rule> {
        Some(Rule::ViewStatistics)
    }

    async fn show(&mut self, ctx: &mut Context) -> Result<()> {
        let mut keymap = InlineKeyboardMarkup::default();
        keymap = keymap.append_row(vec![
            Callback::Stats.button("📊 Статистика"),
            Callback::Users.button("👥 Пользователи"),
        ]);
        keymap = keymap.append_row(vec![
            Callback::Payments.button("💰 Платежи"),
            Callback::Channel.button("📺 Канал"),
        ]);
        keymap = keymap.append_row(Callback::Settings.btn_row("🔧 Настройки"));
        ctx.edit_origin("🔧 *Панель администратора*\n\nВыберите раздел:", keymap)
            .await?;
        Ok(())
    }

    async fn handle_callback(&mut self, _: &mut Context, data: &str) -> Result<Jmp> {
        Ok(match calldata!(data) {
            Callback::Stats => stats::StatsView.into(),
            Callback::Users => users::UsersView.into(),
            Callback::Payments => payments::PaymentsView.into(),
            Callback::Channel => channel::ChannelView.into(),
            Callback::Settings => settings::SettingsView.into(),
        })
    }
}

#[derive(Serialize, Deserialize)]
enum Callback {
    Stats,
    Users,
    Payments,
    Channel,
    Settings,
}
