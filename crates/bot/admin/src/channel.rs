use async_trait::async_trait;
use bot_core::{
    callback_data::Calldata as _,
    calldata,
    context::Context,
    widget::{Jmp, View},
};
use bot_viewer::{fmt_percent, user::user_row};
use chrono::Utc;
use eyre::Result;
use model::rights::Rule;
use serde::{Deserialize, Serialize};
use teloxide::types::InlineKeyboardMarkup;

const SUBSCRIBERS_LIMIT: usize = 20;

pub struct ChannelView;

#[async_trait]
impl View for ChannelView {
    fn name(&self) -> &'static str {
        "ChannelView"
    }

    fn required_rule(&self) -> Option<Rule> {
        Some(Rule::ManageChannel)
    }

    async fn show(&mut self, ctx: &mut Context) -> Result<()> {
        let summary = ctx
            .ledger
            .statistics
            .channel(&mut ctx.session, Utc::now())
            .await?;
        let text = format!(
            "📺 *Управление каналом*\n\n\
             👥 Всего пользователей: {}\n\
             ✅ Активных подписок: {}\n\
             ⏰ Истекших в канале: {}\n\
             📢 В канале: {}\n\
             📈 Конверсия: {}\n\n\
             ID канала: `{}`",
            summary.users,
            summary.active,
            summary.expired_in_channel,
            summary.in_channel,
            fmt_percent(summary.conversion()),
            ctx.env.channel_id()
        );
        let mut keymap = InlineKeyboardMarkup::default();
        keymap = keymap.append_row(vec![
            Callback::Sync.button("🔄 Синхронизация"),
            Callback::Cleanup.button("🧹 Очистка"),
        ]);
        keymap = keymap.append_row(Callback::Subscribers.btn_row("👥 Подписчики"));
        ctx.edit_origin(&text, keymap).await?;
        Ok(())
    }

    async fn handle_callback(&mut self, ctx: &mut Context, data: &str) -> Result<Jmp> {
        match calldata!(data) {
            Callback::Sync => {
                let report = ctx.channel.sync_all(Utc::now()).await?;
                ctx.send_notification(&format!(
                    "✅ Синхронизация завершена\n➕ Добавлено: {}\n➖ Удалено: {}\n❌ Ошибок: {}",
                    report.admitted, report.evicted, report.failed
                ))
                .await;
                Ok(Jmp::Stay)
            }
            Callback::Cleanup => {
                let report = ctx.channel.sweep().await;
                ctx.send_notification(&format!(
                    "🧹 Удалено пользователей: {}\n❌ Ошибок: {}",
                    report.evicted, report.failed
                ))
                .await;
                Ok(Jmp::Stay)
            }
            Callback::Subscribers => Ok(SubscribersView.into()),
        }
    }
}

#[derive(Serialize, Deserialize)]
enum Callback {
    Sync,
    Cleanup,
    Subscribers,
}

pub struct SubscribersView;

#[async_trait]
impl View for SubscribersView {
    fn name(&self) -> &'static str {
        "SubscribersView"
    }

    fn required_rule(&self) -> Option<Rule> {
        Some(Rule::ManageChannel)
    }

    async fn show(&mut self, ctx: &mut Context) -> Result<()> {
        let now = Utc::now();
        let users = ctx.ledger.users.active(&mut ctx.session, now).await?;
        let mut text = format!("👥 *Активные подписчики* \\({}\\)\n\n", users.len());
        for user in users.iter().take(SUBSCRIBERS_LIMIT) {
            text.push_str(&user_row(user, now));
        }
        if users.len() > SUBSCRIBERS_LIMIT {
            text.push_str(&format!("\n\\.\\.\\. и еще {}", users.len() - SUBSCRIBERS_LIMIT));
        }
        if users.is_empty() {
            text.push_str("Активных подписчиков нет\\.");
        }
        ctx.edit_origin(&text, InlineKeyboardMarkup::default())
            .await?;
        Ok(())
    }
}
