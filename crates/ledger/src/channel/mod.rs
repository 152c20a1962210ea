//! Keeps channel membership in line with paid subscriptions.
//!
//! The engine only talks to its two boundaries: a [`SubscriberStore`] holding
//! users and purchases and a [`ChannelGateway`] acting on the private channel.
//! `is_in_channel` is written only after the corresponding channel action
//! succeeded, so a failed call leaves the user in the state the next sweep or
//! sync will pick up again.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eyre::{Context as _, Result};
use log::{debug, error, info, warn};
use model::{
    errors::LedgerError,
    product::Product,
    purchase::{PaymentOutcome, Purchase},
    user::{User, UserName},
};

pub mod mongo;
#[cfg(test)]
mod tests;

pub const INVITE_TTL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_PAUSE: Duration = Duration::from_millis(100);
pub const BROADCAST_PAUSE: Duration = Duration::from_millis(50);

const INVITE_TEXT: &str = "🎉 Ваша подписка активирована!\n\n\
                           Присоединяйтесь к нашему приватному каналу:\n";
const INVITE_FOOTER: &str = "\n\n⚠️ Ссылка действительна в течение 1 часа.";
const EXPIRED_TEXT: &str = "⏰ Ваша подписка истекла.\n\n\
                            Вы были удалены из приватного канала.\n\
                            Для продления подписки используйте команду /start";

#[async_trait]
pub trait SubscriberStore: Send + Sync {
    async fn get_user(&self, tg_id: i64) -> Result<Option<User>>;
    async fn upsert_user(&self, tg_id: i64, name: &UserName) -> Result<User>;
    /// Unknown users are ignored with a warning.
    async fn set_in_channel(&self, tg_id: i64, is_in_channel: bool) -> Result<()>;
    async fn apply_payment(
        &self,
        purchase: Purchase,
        days: u32,
        now: DateTime<Utc>,
    ) -> Result<PaymentOutcome>;
    async fn expired_in_channel(&self, now: DateTime<Utc>) -> Result<Vec<User>>;
    async fn active_subscribers(&self, now: DateTime<Utc>) -> Result<Vec<User>>;
    async fn all_users(&self) -> Result<Vec<User>>;
}

#[async_trait]
pub trait ChannelGateway: Send + Sync {
    /// Invite link valid for a single join that expires after `ttl`.
    async fn create_single_use_invite(&self, ttl: Duration) -> Result<String>;
    async fn send_message(&self, tg_id: i64, text: &str) -> Result<()>;
    /// Removes the user and lifts the ban right away so a later purchase can
    /// bring them back.
    async fn kick_then_unban(&self, tg_id: i64) -> Result<()>;
    /// Api answers such as "user not found" come back as
    /// [`Membership::NotFound`]; only transport failures are errors.
    async fn membership(&self, tg_id: i64) -> Result<Membership>;
    async fn channel_info(&self) -> Result<ChannelInfo>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Owner,
    Administrator,
    Member,
    Other,
    NotFound,
}

impl Membership {
    pub fn is_present(&self) -> bool {
        matches!(
            self,
            Membership::Owner | Membership::Administrator | Membership::Member
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub title: String,
    pub member_count: u32,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub evicted: u32,
    pub failed: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub admitted: u32,
    pub evicted: u32,
    pub failed: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub sent: u32,
    pub failed: u32,
}

/// A successful Stars payment as reported by Telegram.
#[derive(Debug, Clone)]
pub struct PaymentEvent {
    pub tg_id: i64,
    pub name: UserName,
    pub payload: String,
    pub amount: u32,
    pub telegram_payment_charge_id: String,
    pub provider_payment_charge_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Granted,
    Failed,
    /// Nothing was attempted because the payment had already been applied.
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentReceipt {
    pub product: Product,
    pub until: Option<DateTime<Utc>>,
    pub duplicate: bool,
    pub admission: Admission,
}

#[derive(Clone)]
pub struct ChannelManager {
    store: Arc<dyn SubscriberStore>,
    gateway: Arc<dyn ChannelGateway>,
    pause: Duration,
    broadcast_pause: Duration,
}

impl ChannelManager {
    pub fn new(store: Arc<dyn SubscriberStore>, gateway: Arc<dyn ChannelGateway>) -> Self {
        ChannelManager {
            store,
            gateway,
            pause: DEFAULT_PAUSE,
            broadcast_pause: BROADCAST_PAUSE,
        }
    }

    /// Overrides both batch pauses.
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self.broadcast_pause = pause;
        self
    }

    /// Sends the user a fresh single-use invite and marks them as admitted.
    pub async fn grant(&self, tg_id: i64) -> Result<()> {
        let link = self
            .gateway
            .create_single_use_invite(INVITE_TTL)
            .await
            .with_context(|| format!("create invite for {}", tg_id))?;
        self.gateway
            .send_message(tg_id, &format!("{}{}{}", INVITE_TEXT, link, INVITE_FOOTER))
            .await
            .with_context(|| format!("send invite to {}", tg_id))?;
        self.store.set_in_channel(tg_id, true).await?;
        info!("User {} invited to the channel", tg_id);
        Ok(())
    }

    pub async fn evict(&self, tg_id: i64) -> Result<()> {
        self.gateway
            .kick_then_unban(tg_id)
            .await
            .with_context(|| format!("remove {} from the channel", tg_id))?;
        self.store.set_in_channel(tg_id, false).await?;
        info!("User {} removed from the channel", tg_id);

        if let Err(err) = self.gateway.send_message(tg_id, EXPIRED_TEXT).await {
            debug!("Failed to notify {} about expiry: {:#}", tg_id, err);
        }
        Ok(())
    }

    /// Asks the channel whether the user is there and stores the answer.
    pub async fn check(&self, tg_id: i64) -> Result<bool> {
        let present = self.gateway.membership(tg_id).await?.is_present();
        self.store.set_in_channel(tg_id, present).await?;
        Ok(present)
    }

    /// Evicts every admitted user whose subscription is over. Only listing
    /// the candidates can fail; per-user failures are counted.
    pub async fn try_sweep(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let expired = self.store.expired_in_channel(now).await?;
        let mut report = SweepReport::default();
        for (idx, user) in expired.iter().enumerate() {
            if idx > 0 {
                self.sleep(self.pause).await;
            }
            match self.evict(user.tg_id).await {
                Ok(()) => report.evicted += 1,
                Err(err) => {
                    warn!("Failed to evict {}: {:#}", user.tg_id, err);
                    report.failed += 1;
                }
            }
        }
        if report.evicted > 0 {
            info!("Removed {} users with expired subscriptions", report.evicted);
        }
        Ok(report)
    }

    pub async fn sweep(&self) -> SweepReport {
        match self.try_sweep(Utc::now()).await {
            Ok(report) => report,
            Err(err) => {
                error!("Failed to sweep expired subscriptions: {:#}", err);
                SweepReport::default()
            }
        }
    }

    /// Admits active subscribers missing from the channel and evicts expired
    /// ones still flagged in it.
    pub async fn sync_all(&self, now: DateTime<Utc>) -> Result<SyncReport> {
        let mut report = SyncReport::default();
        let mut first = true;

        let to_admit = self.store.active_subscribers(now).await?;
        for user in to_admit
            .iter()
            .filter(|user| user.channel_state(now).needs_admission())
        {
            if !std::mem::take(&mut first) {
                self.sleep(self.pause).await;
            }
            match self.grant(user.tg_id).await {
                Ok(()) => report.admitted += 1,
                Err(err) => {
                    warn!("Failed to admit {}: {:#}", user.tg_id, err);
                    report.failed += 1;
                }
            }
        }

        let to_evict = self.store.expired_in_channel(now).await?;
        for user in to_evict
            .iter()
            .filter(|user| user.channel_state(now).needs_eviction())
        {
            if !std::mem::take(&mut first) {
                self.sleep(self.pause).await;
            }
            match self.evict(user.tg_id).await {
                Ok(()) => report.evicted += 1,
                Err(err) => {
                    warn!("Failed to evict {}: {:#}", user.tg_id, err);
                    report.failed += 1;
                }
            }
        }
        info!(
            "Channel sync: admitted {}, evicted {}, failed {}",
            report.admitted, report.evicted, report.failed
        );
        Ok(report)
    }

    /// Applies a Stars payment and then admits the payer. Admission is
    /// reported separately and never undoes the payment.
    pub async fn on_payment(&self, event: PaymentEvent, now: DateTime<Utc>) -> Result<PaymentReceipt> {
        let product = Product::from_payload(&event.payload)
            .ok_or_else(|| LedgerError::UnknownProduct(event.payload.clone()))?;
        let user = self.store.upsert_user(event.tg_id, &event.name).await?;

        let purchase = Purchase::new(
            event.tg_id,
            product,
            event.amount,
            event.telegram_payment_charge_id,
            event.provider_payment_charge_id,
            now,
        );
        let until = match self
            .store
            .apply_payment(purchase, product.days(), now)
            .await?
        {
            PaymentOutcome::Applied { until } => until,
            PaymentOutcome::Duplicate => {
                return Ok(PaymentReceipt {
                    product,
                    until: user.subscription_until,
                    duplicate: true,
                    admission: Admission::Skipped,
                });
            }
        };
        info!(
            "Payment from {}: {} for {} stars",
            event.tg_id,
            product.id(),
            event.amount
        );

        let admission = match self.grant(event.tg_id).await {
            Ok(()) => Admission::Granted,
            Err(err) => {
                error!("Failed to admit {} after payment: {:#}", event.tg_id, err);
                Admission::Failed
            }
        };
        Ok(PaymentReceipt {
            product,
            until: Some(until),
            duplicate: false,
            admission,
        })
    }

    /// Sends `text` to every known user.
    pub async fn broadcast(&self, text: &str) -> Result<BroadcastReport> {
        let users = self.store.all_users().await?;
        let mut report = BroadcastReport::default();
        for (idx, user) in users.iter().enumerate() {
            if idx > 0 {
                self.sleep(self.broadcast_pause).await;
            }
            match self.gateway.send_message(user.tg_id, text).await {
                Ok(()) => report.sent += 1,
                Err(err) => {
                    debug!("Broadcast to {} failed: {:#}", user.tg_id, err);
                    report.failed += 1;
                }
            }
        }
        info!("Broadcast: sent {}, failed {}", report.sent, report.failed);
        Ok(report)
    }

    pub async fn channel_info(&self) -> Result<ChannelInfo> {
        self.gateway.channel_info().await
    }

    async fn sleep(&self, pause: Duration) {
        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
    }
}
