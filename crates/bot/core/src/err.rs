use crate::{context::Context, widget::Jmp};
use eyre::{Error, Result};
use model::errors::LedgerError;
use teloxide::utils::markdown::escape;

/// Turns expected ledger errors into a notification for the user. Anything
/// else is returned to the handler.
pub async fn handle_result(ctx: &mut Context, result: Result<Jmp, Error>) -> Result<Jmp, Error> {
    match result {
        Ok(jmp) => Ok(jmp),
        Err(err) => {
            let ledger_err = err.downcast::<LedgerError>()?;
            if let Some(notification) = business_error(&ledger_err) {
                ctx.send_notification(&notification).await;
                Ok(Jmp::Stay)
            } else {
                Err(Error::new(ledger_err))
            }
        }
    }
}

pub fn business_error(err: &LedgerError) -> Option<String> {
    Some(match err {
        LedgerError::Eyre(_) | LedgerError::MongoError(_) => return None,
        LedgerError::UserNotFound(tg_id) => {
            format!("❌ Пользователь *{}* не найден", escape(&tg_id.to_string()))
        }
        LedgerError::UnknownProduct(product) => {
            format!("❌ Неизвестный товар: *{}*", escape(product))
        }
        LedgerError::InvalidQuery(query) => format!(
            "❌ Неверный формат запроса: *{}*\nИспользуйте @username или ID пользователя",
            escape(query)
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_error() {
        assert_eq!(
            business_error(&LedgerError::UserNotFound(-42)).as_deref(),
            Some("❌ Пользователь *\\-42* не найден")
        );
        assert!(business_error(&LedgerError::Eyre(eyre::eyre!("boom"))).is_none());
        assert!(business_error(&LedgerError::InvalidQuery("a.b".to_owned()))
            .unwrap()
            .contains("a\\.b"));
    }
}
