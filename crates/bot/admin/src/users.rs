use async_trait::async_trait;
use bot_core::{
    callback_data::Calldata as _,
    calldata,
    context::Context,
    widget::{Jmp, View},
};
use bot_viewer::{day::fmt_utc_date, user::user_row};
use chrono::Utc;
use eyre::Result;
use model::rights::Rule;
use serde::{Deserialize, Serialize};
use teloxide::types::InlineKeyboardMarkup;

use crate::{card::UserCard, search::UserSearch};

const RECENT_USERS: i64 = 10;

pub struct UsersView;

#[async_trait]
impl View for UsersView {
    fn name(&self) -> &'static str {
        "UsersView"
    }

    fn required_rule(&self) -> Option<Rule> {
        Some(Rule::ViewUsers)
    }

    async fn show(&mut self, ctx: &mut Context) -> Result<()> {
        let now = Utc::now();
        let users = ctx
            .ledger
            .users
            .recent(&mut ctx.session, RECENT_USERS)
            .await?;

        let mut text = "👥 *Последние пользователи:*\n\n".to_owned();
        let mut keymap = InlineKeyboardMarkup::default();
        for user in &users {
            text.push_str(&user_row(user, now));
            text.push_str(&format!("Регистрация: _{}_\n\n", fmt_utc_date(&user.created_at)));
            keymap = keymap.append_row(
                Callback::Open(user.tg_id).btn_row(format!("{} {}", user.name.first_name, user.tg_id)),
            );
        }
        if users.is_empty() {
            text.push_str("Пользователей пока нет\\.");
        }
        keymap = keymap.append_row(Callback::Search.btn_row("🔍 Поиск пользователя"));
        ctx.edit_origin(&text, keymap).await?;
        Ok(())
    }

    async fn handle_callback(&mut self, _: &mut Context, data: &str) -> Result<Jmp> {
        Ok(match calldata!(data) {
            Callback::Open(tg_id) => UserCard::new(tg_id).into(),
            Callback::Search => UserSearch::new(None).into(),
        })
    }
}

#[derive(Serialize, Deserialize)]
enum Callback {
    Open(i64),
    Search,
}
