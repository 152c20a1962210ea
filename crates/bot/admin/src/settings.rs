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

use crate::{broadcast::BroadcastView, export::ExportView};

pub struct SettingsView;

#[async_trait]
impl View for SettingsView {
    fn name(&self) -> &'static str {
        "SettingsView"
    }

    fn required_rule(&self) -> Option<Rule> {
        Some(Rule::ViewStatistics)
    }

    async fn show(&mut self, ctx: &mut Context) -> Result<()> {
        let mut keymap = InlineKeyboardMarkup::default();
        if ctx.has_right(Rule::Broadcast) {
            keymap = keymap.append_row(Callback::Broadcast.btn_row("📢 Рассылка"));
        }
        if ctx.has_right(Rule::ExportData) {
            keymap = keymap.append_row(Callback::Export.btn_row("📦 Экспорт данных"));
        }
        ctx.edit_origin("🔧 *Настройки*", keymap).await?;
        Ok(())
    }

    async fn handle_callback(&mut self, _: &mut Context, data: &str) -> Result<Jmp> {
        match calldata!(data) {
            Callback::Broadcast => Ok(BroadcastView::new(None).into()),
            Callback::Export => Ok(ExportView.into()),
        }
    }
}

#[derive(Serialize, Deserialize)]
enum Callback {
    Broadcast,
    Export,
}
