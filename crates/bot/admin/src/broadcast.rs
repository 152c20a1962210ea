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
use teloxide::{
    types::{InlineKeyboardMarkup, Message},
    utils::markdown::escape,
};

/// Composes a plain-text message and sends it to every known user.
pub struct BroadcastView {
    text: Option<String>,
}

impl BroadcastView {
    pub fn new(text: Option<String>) -> BroadcastView {
        BroadcastView { text }
    }
}

#[async_trait]
impl View for BroadcastView {
    fn name(&self) -> &'static str {
        "BroadcastView"
    }

    fn required_rule(&self) -> Option<Rule> {
        Some(Rule::Broadcast)
    }

    async fn show(&mut self, ctx: &mut Context) -> Result<()> {
        match &self.text {
            Some(text) => {
                let preview = format!(
                    "📢 *Предпросмотр рассылки:*\n\n{}\n\nОтправить всем пользователям?",
                    escape(text)
                );
                let keymap = InlineKeyboardMarkup::default().append_row(vec![
                    Callback::Send.button("✅ Отправить"),
                    Callback::Edit.button("✏️ Изменить"),
                ]);
                ctx.edit_origin(&preview, keymap).await?;
            }
            None => {
                ctx.edit_origin(
                    "📢 *Рассылка*\n\nОтправьте текст сообщения для всех пользователей\\.",
                    InlineKeyboardMarkup::default(),
                )
                .await?;
            }
        }
        Ok(())
    }

    async fn handle_message(&mut self, ctx: &mut Context, msg: &Message) -> Result<Jmp> {
        ctx.delete_msg(msg.id).await?;
        if let Some(text) = msg.text().map(str::trim).filter(|t| !t.is_empty()) {
            self.text = Some(text.to_owned());
        }
        Ok(Jmp::Stay)
    }

    async fn handle_callback(&mut self, ctx: &mut Context, data: &str) -> Result<Jmp> {
        match calldata!(data) {
            Callback::Send => {
                let text = match self.text.take() {
                    Some(text) => text,
                    None => return Ok(Jmp::Stay),
                };
                info!("Broadcast started by {}", ctx.me.tg_id);
                let report = ctx.channel.broadcast(&text).await?;
                ctx.send_notification(&format!(
                    "✅ Рассылка завершена\\!\n\n📤 Отправлено: {}\n❌ Ошибок: {}",
                    report.sent, report.failed
                ))
                .await;
                Ok(Jmp::Back)
            }
            Callback::Edit => {
                self.text = None;
                Ok(Jmp::Stay)
            }
        }
    }
}

#[derive(Serialize, Deserialize)]
enum Callback {
    Send,
    Edit,
}
