use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eyre::Result;
use model::{
    purchase::{PaymentOutcome, Purchase},
    session::{Session, SYSTEM_ACTOR},
    user::{User, UserName},
};

use super::SubscriberStore;
use crate::Ledger;

/// [`SubscriberStore`] backed by the ledger. Every call runs in its own session.
pub struct LedgerSubscribers {
    ledger: Ledger,
}

impl LedgerSubscribers {
    pub fn new(ledger: Ledger) -> Self {
        LedgerSubscribers { ledger }
    }

    async fn session(&self) -> Result<Session> {
        Ok(self.ledger.db.start_session(SYSTEM_ACTOR).await?)
    }
}

#[async_trait]
impl SubscriberStore for LedgerSubscribers {
    async fn get_user(&self, tg_id: i64) -> Result<Option<User>> {
        let mut session = self.session().await?;
        self.ledger.users.get(&mut session, tg_id).await
    }

    async fn upsert_user(&self, tg_id: i64, name: &UserName) -> Result<User> {
        let mut session = self.session().await?;
        self.ledger.users.upsert(&mut session, tg_id, name).await
    }

    async fn set_in_channel(&self, tg_id: i64, is_in_channel: bool) -> Result<()> {
        let mut session = self.session().await?;
        self.ledger
            .users
            .set_in_channel(&mut session, tg_id, is_in_channel)
            .await?;
        Ok(())
    }

    async fn apply_payment(
        &self,
        purchase: Purchase,
        days: u32,
        now: DateTime<Utc>,
    ) -> Result<PaymentOutcome> {
        let mut session = self.session().await?;
        self.ledger
            .purchases
            .apply_payment(&mut session, purchase, days, now)
            .await
    }

    async fn expired_in_channel(&self, now: DateTime<Utc>) -> Result<Vec<User>> {
        let mut session = self.session().await?;
        self.ledger.users.expired_in_channel(&mut session, now).await
    }

    async fn active_subscribers(&self, now: DateTime<Utc>) -> Result<Vec<User>> {
        let mut session = self.session().await?;
        self.ledger.users.active(&mut session, now).await
    }

    async fn all_users(&self) -> Result<Vec<User>> {
        let mut session = self.session().await?;
        self.ledger.users.all(&mut session).await
    }
}
