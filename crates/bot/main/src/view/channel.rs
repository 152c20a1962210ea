use async_trait::async_trait;
use bot_core::{
    callback_data::Calldata as _,
    calldata,
    context::Context,
    widget::{Jmp, View},
};
use bot_viewer::day::fmt_utc_dt;
use chrono::Utc;
use eyre::Result;
use log::error;
use serde::{Deserialize, Serialize};
use teloxide::{
    types::{InlineKeyboardButton, InlineKeyboardMarkup},
    utils::markdown::escape,
};
use url::Url;

use super::products::ProductsView;

const TEASER: &str = "📺 *Приватный канал*\n\n\
                      🔒 Для доступа к каналу необходима активная подписка\\.\n\n\
                      💎 В канале вы найдете:\n\
                      • Эксклюзивный контент\n\
                      • Полезные материалы\n\
                      • Общение с единомышленниками\n\n\
                      📺 Оформите подписку для получения доступа\\!";

pub struct ChannelInfoView;

#[async_trait]
impl View for ChannelInfoView {
    fn name(&self) -> &'static str {
        "ChannelInfoView"
    }

    async fn show(&mut self, ctx: &mut Context) -> Result<()> {
        let sub = ctx.me.subscription(Utc::now());
        let until = match sub.until {
            Some(until) if sub.active => until,
            _ => {
                let keymap = InlineKeyboardMarkup::default()
                    .append_row(Callback::Subscriptions.btn_row("📺 Подписки"));
                ctx.edit_origin(TEASER, keymap).await?;
                return Ok(());
            }
        };

        let info = match ctx.channel.channel_info().await {
            Ok(info) => info,
            Err(err) => {
                error!("Failed to get channel info: {:#}", err);
                ctx.edit_origin(
                    "❌ Не удалось получить информацию о канале\\.",
                    InlineKeyboardMarkup::default(),
                )
                .await?;
                return Ok(());
            }
        };

        let mut text = format!(
            "📺 *Информация о канале*\n\n\
             📋 Название: {}\n👥 Участников: {}\n📝 Описание: {}\n\n\
             ✅ У вас есть активная подписка\\!\n⏰ Действует до: _{}_\n\n",
            escape(&info.title),
            info.member_count,
            escape(
                info.description
                    .as_deref()
                    .unwrap_or("Эксклюзивный контент для подписчиков")
            ),
            fmt_utc_dt(&until)
        );
        if ctx.me.is_in_channel {
            text.push_str("🎉 Вы уже состоите в канале\\!");
        } else {
            text.push_str("🔗 Нажмите кнопку ниже для вступления в канал\\.");
        }

        let mut keymap = InlineKeyboardMarkup::default();
        if let Some(link) = ctx.env.channel_invite_link().and_then(|l| Url::parse(l).ok()) {
            keymap = keymap.append_row(vec![InlineKeyboardButton::url("🔗 Вступить в канал", link)]);
        }
        ctx.edit_origin(&text, keymap).await?;
        Ok(())
    }

    async fn handle_callback(&mut self, _: &mut Context, data: &str) -> Result<Jmp> {
        match calldata!(data) {
            Callback::Subscriptions => Ok(ProductsView.into()),
        }
    }
}

#[derive(Serialize, Deserialize)]
enum Callback {
    Subscriptions,
}
