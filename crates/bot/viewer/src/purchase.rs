use model::purchase::Purchase;
use teloxide::utils::markdown::escape;

use crate::{day::fmt_utc_dt, fmt_stars};

pub fn render_purchase(purchase: &Purchase) -> String {
    format!(
        "• {}\n  💰 {}\n  📅 _{}_\n",
        escape(&purchase.product_title),
        fmt_stars(purchase.amount as i64),
        fmt_utc_dt(&purchase.created_at)
    )
}

/// Admin view of a payment: buyer id, product and the charge id.
pub fn render_payment(purchase: &Purchase) -> String {
    format!(
        "• `{}` {} \\- {} ⭐\n  📅 _{}_ `{}`\n",
        purchase.user_id,
        escape(&purchase.product_title),
        purchase.amount,
        fmt_utc_dt(&purchase.created_at),
        escape(&purchase.telegram_payment_charge_id)
    )
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use model::product::Product;

    use super::*;

    #[test]
    fn test_render_purchase() {
        let purchase = Purchase::new(
            1,
            Product::ThreeMonths,
            250,
            "ch_1".to_owned(),
            None,
            Utc::now(),
        );
        let text = render_purchase(&purchase);
        assert!(text.starts_with("• Подписка на 3 месяца\n  💰 250 звезд\n"));
        assert!(render_payment(&purchase).contains("`ch\\_1`"));
    }
}
