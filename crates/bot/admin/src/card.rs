use async_trait::async_trait;
use bot_core::{
    callback_data::Calldata as _,
    calldata,
    context::Context,
    widget::{Jmp, View},
};
use bot_viewer::{
    day::fmt_utc_dt,
    purchase::render_purchase,
    user::{fmt_actor, user_base_info},
};
use chrono::Utc;
use eyre::Result;
use model::rights::Rule;
use serde::{Deserialize, Serialize};
use teloxide::types::InlineKeyboardMarkup;

pub struct UserCard {
    tg_id: i64,
}

impl UserCard {
    pub fn new(tg_id: i64) -> UserCard {
        UserCard { tg_id }
    }
}

#[async_trait]
impl View for UserCard {
    fn name(&self) -> &'static str {
        "UserCard"
    }

    fn required_rule(&self) -> Option<Rule> {
        Some(Rule::ViewUsers)
    }

    async fn show(&mut self, ctx: &mut Context) -> Result<()> {
        let user = ctx.ledger.get_user(&mut ctx.session, self.tg_id).await?;
        let purchases = ctx
            .ledger
            .purchases
            .by_user(&mut ctx.session, self.tg_id)
            .await?;

        let mut text = format!(
            "📋 *Карточка пользователя*\n\n{}\n✏️ Изменен: _{}_ \\({}\\)\n💰 Покупок: {}\n",
            user_base_info(&user, Utc::now()),
            fmt_utc_dt(&user.updated_at),
            fmt_actor(user.updated_by),
            purchases.len()
        );
        for purchase in purchases.iter().take(5) {
            text.push('\n');
            text.push_str(&render_purchase(purchase));
        }

        let keymap = InlineKeyboardMarkup::default()
            .append_row(Callback::CheckMembership.btn_row("🔍 Проверить членство"));
        ctx.edit_origin(&text, keymap).await?;
        Ok(())
    }

    async fn handle_callback(&mut self, ctx: &mut Context, data: &str) -> Result<Jmp> {
        match calldata!(data) {
            Callback::CheckMembership => {
                let present = ctx.channel.check(self.tg_id).await?;
                let text = if present {
                    "✅ Пользователь состоит в канале"
                } else {
                    "❌ Пользователь не состоит в канале"
                };
                ctx.send_notification(text).await;
                Ok(Jmp::Stay)
            }
        }
    }
}

#[derive(Serialize, Deserialize)]
enum Callback {
    CheckMembership,
}
