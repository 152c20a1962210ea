use std::sync::Arc;

use chrono::{DateTime, Utc};
use eyre::Result;
use log::{info, warn};
use model::{
    errors::LedgerError,
    purchase::{PaymentOutcome, Purchase},
    session::Session,
    subscription::extend_until,
};
use storage::{purchase::PurchaseStore, user::UserStore};
use tx_macro::tx;

#[derive(Clone)]
pub struct Purchases {
    store: Arc<PurchaseStore>,
    users: Arc<UserStore>,
}

impl Purchases {
    pub(crate) fn new(store: Arc<PurchaseStore>, users: Arc<UserStore>) -> Self {
        Purchases { store, users }
    }

    /// Records the purchase and extends the buyer's subscription by `days`.
    /// A charge id seen before is reported as a duplicate and changes nothing.
    #[tx]
    pub async fn apply_payment(
        &self,
        session: &mut Session,
        purchase: Purchase,
        days: u32,
        now: DateTime<Utc>,
    ) -> Result<PaymentOutcome> {
        if self
            .store
            .get_by_charge_id(session, &purchase.telegram_payment_charge_id)
            .await?
            .is_some()
        {
            warn!(
                "Payment {} already processed",
                purchase.telegram_payment_charge_id
            );
            return Ok(PaymentOutcome::Duplicate);
        }

        let user = self
            .users
            .get_by_tg_id(session, purchase.user_id)
            .await?
            .ok_or(LedgerError::UserNotFound(purchase.user_id))?;

        self.store.insert(session, &purchase).await?;
        let until = extend_until(user.subscription_until, now, days);
        self.users
            .set_subscription_until(session, user.tg_id, until)
            .await?;
        info!(
            "Subscription of {} extended by {} days until {}",
            user.tg_id, days, until
        );
        Ok(PaymentOutcome::Applied { until })
    }

    pub async fn by_user(&self, session: &mut Session, user_id: i64) -> Result<Vec<Purchase>> {
        self.store.find_by_user(session, user_id).await
    }

    pub async fn count_by_user(&self, session: &mut Session, user_id: i64) -> Result<u64> {
        self.store.count_by_user(session, user_id).await
    }

    pub async fn recent(&self, session: &mut Session, limit: i64) -> Result<Vec<Purchase>> {
        self.store.find_recent(session, limit).await
    }
}
