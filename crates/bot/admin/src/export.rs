use async_trait::async_trait;
use bot_core::{
    callback_data::Calldata as _,
    calldata,
    context::Context,
    widget::{Jmp, View},
};
use eyre::Result;
use log::info;
use model::rights::Rule;
use serde::{Deserialize, Serialize};
use teloxide::types::InlineKeyboardMarkup;

const TEXT: &str = "📦 *Экспорт данных*\n\n\
                    Архив с пользователями и покупками в формате CSV\\.";

pub struct ExportView;

#[async_trait]
impl View for ExportView {
    fn name(&self) -> &'static str {
        "ExportView"
    }

    fn required_rule(&self) -> Option<Rule> {
        Some(Rule::ExportData)
    }

    async fn show(&mut self, ctx: &mut Context) -> Result<()> {
        let keymap =
            InlineKeyboardMarkup::default().append_row(Callback::Download.btn_row("📥 Скачать"));
        ctx.edit_origin(TEXT, keymap).await?;
        Ok(())
    }

    async fn handle_callback(&mut self, ctx: &mut Context, data: &str) -> Result<Jmp> {
        match calldata!(data) {
            Callback::Download => {
                info!("Export requested by {}", ctx.me.tg_id);
                let archive = ctx.ledger.export.make_archive(&mut ctx.session).await?;
                ctx.send_document(archive, "export.zip").await?;
                Ok(Jmp::Stay)
            }
        }
    }
}

#[derive(Serialize, Deserialize)]
enum Callback {
    Download,
}
