use async_trait::async_trait;
use bot_core::{
    callback_data::Calldata as _,
    calldata,
    context::Context,
    widget::{Jmp, View},
};
use bot_viewer::day::fmt_utc_date;
use chrono::Utc;
use eyre::Result;
use log::info;
use model::{
    errors::LedgerError,
    product::{Product, CURRENCY},
};
use serde::{Deserialize, Serialize};
use teloxide::{
    prelude::Requester as _,
    types::{InlineKeyboardMarkup, LabeledPrice},
};

pub struct ProductsView;

impl ProductsView {
    async fn send_invoice(&self, ctx: &mut Context, product: Product) -> Result<Jmp> {
        let sub = ctx.me.subscription(Utc::now());
        if let Some(until) = sub.until.filter(|_| sub.active) {
            ctx.send_notification(&format!(
                "ℹ️ У вас уже есть активная подписка до _{}_\\. \
                 Новая подписка будет добавлена к текущей\\.",
                fmt_utc_date(&until)
            ))
            .await;
        }

        info!("Invoice for {} sent to {}", product.id(), ctx.me.tg_id);
        ctx.bot
            .send_invoice(
                ctx.chat_id(),
                product.title(),
                product.description(),
                product.payload(),
                ctx.env.payment_provider_token(),
                CURRENCY,
                vec![LabeledPrice::new(product.title(), product.price())],
            )
            .await?;
        ctx.origin().invalidate();
        Ok(Jmp::Stay)
    }
}

#[async_trait]
impl View for ProductsView {
    fn name(&self) -> &'static str {
        "ProductsView"
    }

    async fn show(&mut self, ctx: &mut Context) -> Result<()> {
        let text = "💎 *Доступные подписки*\n\n\
                    Выберите подписку для покупки:\n\n\
                    📺 Получите доступ к эксклюзивному контенту нашего приватного канала\\!";
        let mut keymap = InlineKeyboardMarkup::default();
        for product in Product::list() {
            keymap = keymap.append_row(
                Callback::Buy(product.id().to_owned())
                    .btn_row(format!("{} - {} ⭐", product.title(), product.price())),
            );
        }
        ctx.edit_origin(text, keymap).await?;
        Ok(())
    }

    async fn handle_callback(&mut self, ctx: &mut Context, data: &str) -> Result<Jmp> {
        match calldata!(data) {
            Callback::Buy(id) => {
                let product = Product::from_id(&id).ok_or(LedgerError::UnknownProduct(id))?;
                self.send_invoice(ctx, product).await
            }
        }
    }
}

#[derive(Serialize, Deserialize)]
enum Callback {
    Buy(String),
}
