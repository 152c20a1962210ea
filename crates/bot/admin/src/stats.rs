use async_trait::async_trait;
use bot_core::{
    callback_data::Calldata as _,
    calldata,
    context::Context,
    widget::{Jmp, View},
};
use bot_viewer::fmt_stars;
use chrono::Utc;
use eyre::Result;
use model::rights::Rule;
use serde::{Deserialize, Serialize};
use teloxide::types::InlineKeyboardMarkup;

pub struct StatsView;

#[async_trait]
impl View for StatsView {
    fn name(&self) -> &'static str {
        "StatsView"
    }

    fn required_rule(&self) -> Option<Rule> {
        Some(Rule::ViewStatistics)
    }

    async fn show(&mut self, ctx: &mut Context) -> Result<()> {
        let summary = ctx
            .ledger
            .statistics
            .summary(&mut ctx.session, Utc::now())
            .await?;
        let text = format!(
            "📊 *Статистика бота*\n\n\
             👥 Всего пользователей: {}\n\
             ✅ Активных подписок: {}\n\
             💰 Всего покупок: {}\n\
             ⭐ Общий доход: {}\n",
            summary.users,
            summary.active,
            summary.revenue.count,
            fmt_stars(summary.revenue.amount)
        );
        let keymap = InlineKeyboardMarkup::default().append_row(Callback::Refresh.btn_row("🔄 Обновить"));
        ctx.edit_origin(&text, keymap).await?;
        Ok(())
    }

    async fn handle_callback(&mut self, _: &mut Context, data: &str) -> Result<Jmp> {
        match calldata!(data) {
            Callback::Refresh => Ok(Jmp::Stay),
        }
    }
}

#[derive(Serialize, Deserialize)]
enum Callback {
    Refresh,
}
