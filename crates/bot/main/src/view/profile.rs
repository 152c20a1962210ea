use async_trait::async_trait;
use bot_core::{
    callback_data::Calldata as _,
    calldata,
    context::Context,
    widget::{Jmp, View},
};
use bot_viewer::user::user_base_info;
use chrono::Utc;
use eyre::Result;
use serde::{Deserialize, Serialize};
use teloxide::types::InlineKeyboardMarkup;

use super::history::HistoryView;

pub struct ProfileView;

#[async_trait]
impl View for ProfileView {
    fn name(&self) -> &'static str {
        "ProfileView"
    }

    async fn show(&mut self, ctx: &mut Context) -> Result<()> {
        let purchases = ctx
            .ledger
            .purchases
            .count_by_user(&mut ctx.session, ctx.me.tg_id)
            .await?;
        let text = format!(
            "👤 *Ваш профиль*\n\n{}\n💰 Всего покупок: {}",
            user_base_info(&ctx.me, Utc::now()),
            purchases
        );
        let keymap =
            InlineKeyboardMarkup::default().append_row(Callback::History.btn_row("📊 История покупок"));
        ctx.edit_origin(&text, keymap).await?;
        Ok(())
    }

    async fn handle_callback(&mut self, _: &mut Context, data: &str) -> Result<Jmp> {
        match calldata!(data) {
            Callback::History => Ok(HistoryView.into()),
        }
    }
}

#[derive(Serialize, Deserialize)]
enum Callback {
    History,
}
