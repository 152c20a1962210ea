use bot_core::handlers::{user_name, Services};
use chrono::Utc;
use ledger::channel::{Admission, PaymentEvent, PaymentReceipt};
use log::{error, info, warn};
use model::{
    errors::LedgerError,
    product::{Product, CURRENCY},
};
use teloxide::{
    payloads::{AnswerPreCheckoutQuerySetters as _, SendMessageSetters as _},
    prelude::{Requester as _, ResponseResult},
    types::{Message, ParseMode, PreCheckoutQuery},
    utils::markdown::escape,
    Bot,
};

const PAYMENT_ERROR: &str = "❌ Ошибка при обработке платежа. Обратитесь в поддержку.";

/// Rejects invoices that do not name a known product at its current price.
pub fn validate_checkout(payload: &str, currency: &str, amount: u32) -> Result<Product, String> {
    let product = Product::from_payload(payload).ok_or_else(|| "Подписка не найдена".to_owned())?;
    if currency != CURRENCY || amount != product.price() {
        return Err("Цена подписки изменилась. Пожалуйста, повторите покупку.".to_owned());
    }
    Ok(product)
}

pub async fn pre_checkout_handler(bot: Bot, q: PreCheckoutQuery) -> ResponseResult<()> {
    match validate_checkout(&q.invoice_payload, &format!("{:?}", q.currency), q.total_amount as u32) {
        Ok(product) => {
            info!("Pre-checkout of {} by {}", product.id(), q.from.id);
            bot.answer_pre_checkout_query(q.id, true).await?;
        }
        Err(reason) => {
            warn!(
                "Pre-checkout rejected for {}: {} ({})",
                q.from.id, q.invoice_payload, reason
            );
            bot.answer_pre_checkout_query(q.id, false)
                .error_message(reason)
                .await?;
        }
    }
    Ok(())
}

pub async fn successful_payment_handler(
    bot: Bot,
    msg: Message,
    services: Services,
) -> ResponseResult<()> {
    let (payment, from) = match (msg.successful_payment(), msg.from.as_ref()) {
        (Some(payment), Some(from)) => (payment, from),
        _ => return Ok(()),
    };

    let event = PaymentEvent {
        tg_id: from.id.0 as i64,
        name: user_name(from),
        payload: payment.invoice_payload.clone(),
        amount: payment.total_amount as u32,
        telegram_payment_charge_id: payment.telegram_payment_charge_id.clone(),
        provider_payment_charge_id: Some(payment.provider_payment_charge_id.clone()),
    };
    let charge_id = event.telegram_payment_charge_id.clone();
    let amount = event.amount;

    let text = match services.channel.on_payment(event, Utc::now()).await {
        Ok(receipt) => payment_reply(&receipt, amount, &charge_id),
        Err(err) => {
            if let Some(LedgerError::UnknownProduct(payload)) = err.downcast_ref::<LedgerError>() {
                error!("Payment {} for unknown product {}", charge_id, payload);
            } else {
                error!("Failed to process payment {}: {:#}", charge_id, err);
            }
            escape(PAYMENT_ERROR)
        }
    };

    services.state.get_token(msg.chat.id).invalidate();
    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::MarkdownV2)
        .await?;
    Ok(())
}

/// Skipped admission only comes with a payment that was already recorded.
pub fn payment_reply(receipt: &PaymentReceipt, amount: u32, charge_id: &str) -> String {
    let product = receipt.product;
    match (receipt.duplicate, receipt.admission) {
        (true, _) | (false, Admission::Skipped) => format!(
            "ℹ️ *Этот платеж уже был обработан\\.*\n\nID транзакции: `{}`",
            escape(charge_id)
        ),
        (false, Admission::Granted) => format!(
            "✅ *Платеж успешно обработан\\!*\n\n\
             Подписка: {}\nСумма: {} ⭐\nПериод: {} дней\nID транзакции: `{}`\n\n\
             🎉 Ваша подписка активирована\\!\n\
             Проверьте личные сообщения \\- вам отправлена ссылка для вступления в канал\\.",
            escape(product.title()),
            amount,
            product.days(),
            escape(charge_id)
        ),
        (false, Admission::Failed) => format!(
            "✅ *Платеж обработан, но возникла проблема с добавлением в канал\\.*\n\n\
             Подписка: {}\nСумма: {} ⭐\n\n\
             ⚠️ Обратитесь в поддержку для получения доступа к каналу\\.",
            escape(product.title()),
            amount
        ),
    }
}
