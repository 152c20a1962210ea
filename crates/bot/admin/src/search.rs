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
use model::{rights::Rule, user::UserIdent};
use serde::{Deserialize, Serialize};
use teloxide::{
    types::{InlineKeyboardMarkup, Message},
    utils::markdown::escape,
};

use crate::card::UserCard;

const PROMPT: &str = "🔍 *Поиск пользователя*\n\nОтправьте `@username` или Telegram ID\\.";

pub struct UserSearch {
    query: Option<String>,
}

impl UserSearch {
    pub fn new(query: Option<String>) -> UserSearch {
        UserSearch { query }
    }
}

#[async_trait]
impl View for UserSearch {
    fn name(&self) -> &'static str {
        "UserSearch"
    }

    fn required_rule(&self) -> Option<Rule> {
        Some(Rule::ViewUsers)
    }

    async fn show(&mut self, ctx: &mut Context) -> Result<()> {
        let query = match &self.query {
            Some(query) => query,
            None => {
                ctx.edit_origin(PROMPT, InlineKeyboardMarkup::default())
                    .await?;
                return Ok(());
            }
        };

        if UserIdent::parse(query).is_none() {
            let text = format!(
                "❌ Некорректный запрос: `{}`\n\n{}",
                escape(query),
                PROMPT
            );
            ctx.edit_origin(&text, InlineKeyboardMarkup::default())
                .await?;
            return Ok(());
        }

        match ctx.ledger.find_user(&mut ctx.session, query).await? {
            Some(user) => {
                let text = format!(
                    "🔍 *Результат поиска*\n\n{}",
                    user_base_info(&user, Utc::now())
                );
                let keymap = InlineKeyboardMarkup::default()
                    .append_row(Callback::Open(user.tg_id).btn_row("📋 Карточка пользователя"));
                ctx.edit_origin(&text, keymap).await?;
            }
            None => {
                let text = format!(
                    "❌ Пользователь `{}` не найден\\.\n\n{}",
                    escape(query),
                    PROMPT
                );
                ctx.edit_origin(&text, InlineKeyboardMarkup::default())
                    .await?;
            }
        }
        Ok(())
    }

    async fn handle_message(&mut self, ctx: &mut Context, msg: &Message) -> Result<Jmp> {
        ctx.delete_msg(msg.id).await?;
        self.query = msg
            .text()
            .map(|text| text.trim().to_owned())
            .filter(|text| !text.is_empty());
        Ok(Jmp::Stay)
    }

    async fn handle_callback(&mut self, _: &mut Context, data: &str) -> Result<Jmp> {
        match calldata!(data) {
            Callback::Open(tg_id) => Ok(UserCard::new(tg_id).into()),
        }
    }
}

#[derive(Serialize, Deserialize)]
enum Callback {
    Open(i64),
}
