use async_trait::async_trait;
use bot_core::{context::Context, widget::View};
use bot_viewer::purchase::render_purchase;
use eyre::Result;
use teloxide::types::InlineKeyboardMarkup;

const HISTORY_LEN: usize = 5;

pub struct HistoryView;

#[async_trait]
impl View for HistoryView {
    fn name(&self) -> &'static str {
        "HistoryView"
    }

    async fn show(&mut self, ctx: &mut Context) -> Result<()> {
        let purchases = ctx
            .ledger
            .purchases
            .by_user(&mut ctx.session, ctx.me.tg_id)
            .await?;

        let mut text = "📊 *История ваших покупок:*\n\n".to_owned();
        if purchases.is_empty() {
            text.push_str("У вас пока нет покупок\\.");
        }
        let skip = purchases.len().saturating_sub(HISTORY_LEN);
        for purchase in purchases.iter().skip(skip) {
            text.push_str(&render_purchase(purchase));
            text.push('\n');
        }
        ctx.edit_origin(&text, InlineKeyboardMarkup::default())
            .await?;
        Ok(())
    }
}
