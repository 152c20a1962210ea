use async_trait::async_trait;
use bot_core::{
    callback_data::Calldata as _,
    calldata,
    context::Context,
    widget::{Jmp, View},
};
use bot_viewer::{fmt_stars, purchase::render_payment};
use chrono::{NaiveDate, Utc};
use eyre::Result;
use model::{purchase::Revenue, rights::Rule};
use serde::{Deserialize, Serialize};
use teloxide::types::InlineKeyboardMarkup;

const RECENT_PAYMENTS: i64 = 10;
const STATS_DAYS: i64 = 7;

pub struct PaymentsView;

#[async_trait]
impl View for PaymentsView {
    fn name(&self) -> &'static str {
        "PaymentsView"
    }

    fn required_rule(&self) -> Option<Rule> {
        Some(Rule::ViewPayments)
    }

    async fn show(&mut self, ctx: &mut Context) -> Result<()> {
        let purchases = ctx
            .ledger
            .purchases
            .recent(&mut ctx.session, RECENT_PAYMENTS)
            .await?;

        let mut text = "💰 *Последние платежи:*\n\n".to_owned();
        if purchases.is_empty() {
            text.push_str("Платежей пока нет\\.");
        }
        for purchase in &purchases {
            text.push_str(&render_payment(purchase));
            text.push('\n');
        }

        let keymap =
            InlineKeyboardMarkup::default().append_row(Callback::Stats.btn_row("📈 Статистика платежей"));
        ctx.edit_origin(&text, keymap).await?;
        Ok(())
    }

    async fn handle_callback(&mut self, _: &mut Context, data: &str) -> Result<Jmp> {
        match calldata!(data) {
            Callback::Stats => Ok(PaymentStats.into()),
        }
    }
}

#[derive(Serialize, Deserialize)]
enum Callback {
    Stats,
}

pub struct PaymentStats;

#[async_trait]
impl View for PaymentStats {
    fn name(&self) -> &'static str {
        "PaymentStats"
    }

    fn required_rule(&self) -> Option<Rule> {
        Some(Rule::ViewPayments)
    }

    async fn show(&mut self, ctx: &mut Context) -> Result<()> {
        let now = Utc::now();
        let total = ctx
            .ledger
            .statistics
            .revenue_for_last(&mut ctx.session, now, STATS_DAYS)
            .await?;
        let daily = ctx
            .ledger
            .statistics
            .daily_revenue(&mut ctx.session, now, STATS_DAYS)
            .await?;
        let latest = ctx.ledger.purchases.recent(&mut ctx.session, 5).await?;

        let mut text = format!(
            "📈 *Статистика платежей за {} дней*\n\n\
             💰 Доход: {}\n\
             🧾 Платежей: {}\n\n\
             *По дням:*\n",
            STATS_DAYS,
            fmt_stars(total.amount),
            total.count
        );
        for (day, revenue) in daily {
            text.push_str(&day_line(day, revenue));
        }
        if !latest.is_empty() {
            text.push_str("\n*Последние платежи:*\n");
            for purchase in &latest {
                text.push_str(&render_payment(purchase));
            }
        }

        ctx.edit_origin(&text, InlineKeyboardMarkup::default())
            .await?;
        Ok(())
    }
}

fn day_line(day: NaiveDate, revenue: Revenue) -> String {
    format!(
        "{}: {} \\({}\\)\n",
        day.format("%d\\.%m"),
        fmt_stars(revenue.amount),
        revenue.count
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_line() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        let revenue = Revenue {
            amount: 101,
            count: 2,
        };
        assert_eq!(day_line(day, revenue), "07\\.03: 101 звезда \\(2\\)\n");
        assert_eq!(
            day_line(day, Revenue::default()),
            "07\\.03: 0 звезд \\(0\\)\n"
        );
    }
}
