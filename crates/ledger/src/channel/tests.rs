use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Duration as Days, Utc};
use eyre::{eyre, Result};
use model::{
    product::Product,
    purchase::{PaymentOutcome, Purchase},
    subscription::extend_until,
    user::{User, UserName},
};
use parking_lot::Mutex;

use super::*;

#[derive(Default)]
struct MemoryStore {
    users: Mutex<HashMap<i64, User>>,
    purchases: Mutex<Vec<Purchase>>,
    fail_listing: bool,
}

impl MemoryStore {
    fn with_users(users: Vec<User>) -> Arc<Self> {
        Arc::new(MemoryStore {
            users: Mutex::new(users.into_iter().map(|u| (u.tg_id, u)).collect()),
            ..Default::default()
        })
    }

    fn user(&self, tg_id: i64) -> User {
        self.users.lock().get(&tg_id).cloned().unwrap()
    }
}

#[async_trait]
impl SubscriberStore for MemoryStore {
    async fn get_user(&self, tg_id: i64) -> Result<Option<User>> {
        Ok(self.users.lock().get(&tg_id).cloned())
    }

    async fn upsert_user(&self, tg_id: i64, name: &UserName) -> Result<User> {
        let mut users = self.users.lock();
        let user = users
            .entry(tg_id)
            .or_insert_with(|| User::new(tg_id, name.clone()));
        user.name = name.clone();
        Ok(user.clone())
    }

    async fn set_in_channel(&self, tg_id: i64, is_in_channel: bool) -> Result<()> {
        if let Some(user) = self.users.lock().get_mut(&tg_id) {
            user.is_in_channel = is_in_channel;
        }
        Ok(())
    }

    async fn apply_payment(
        &self,
        purchase: Purchase,
        days: u32,
        now: DateTime<Utc>,
    ) -> Result<PaymentOutcome> {
        let mut purchases = self.purchases.lock();
        if purchases
            .iter()
            .any(|p| p.telegram_payment_charge_id == purchase.telegram_payment_charge_id)
        {
            return Ok(PaymentOutcome::Duplicate);
        }
        let mut users = self.users.lock();
        let user = users
            .get_mut(&purchase.user_id)
            .ok_or_else(|| eyre!("user not found"))?;
        let until = extend_until(user.subscription_until, now, days);
        user.subscription_until = Some(until);
        purchases.push(purchase);
        Ok(PaymentOutcome::Applied { until })
    }

    async fn expired_in_channel(&self, now: DateTime<Utc>) -> Result<Vec<User>> {
        if self.fail_listing {
            return Err(eyre!("store is down"));
        }
        let mut users: Vec<_> = self
            .users
            .lock()
            .values()
            .filter(|u| u.is_in_channel && u.is_subscription_expired(now))
            .cloned()
            .collect();
        users.sort_by_key(|u| u.tg_id);
        Ok(users)
    }

    async fn active_subscribers(&self, now: DateTime<Utc>) -> Result<Vec<User>> {
        let mut users: Vec<_> = self
            .users
            .lock()
            .values()
            .filter(|u| u.is_subscription_active(now))
            .cloned()
            .collect();
        users.sort_by_key(|u| u.tg_id);
        Ok(users)
    }

    async fn all_users(&self) -> Result<Vec<User>> {
        let mut users: Vec<_> = self.users.lock().values().cloned().collect();
        users.sort_by_key(|u| u.tg_id);
        Ok(users)
    }
}

#[derive(Default)]
struct FakeChannel {
    fail_invite: bool,
    transport_down: bool,
    unreachable: HashSet<i64>,
    fail_kick: HashSet<i64>,
    members: HashMap<i64, Membership>,
    messages: Mutex<Vec<(i64, String)>>,
    kicked: Mutex<Vec<i64>>,
}

impl FakeChannel {
    fn messages_to(&self, tg_id: i64) -> Vec<String> {
        self.messages
            .lock()
            .iter()
            .filter(|(id, _)| *id == tg_id)
            .map(|(_, text)| text.clone())
            .collect()
    }
}

#[async_trait]
impl ChannelGateway for FakeChannel {
    async fn create_single_use_invite(&self, ttl: Duration) -> Result<String> {
        assert_eq!(ttl, INVITE_TTL);
        if self.fail_invite {
            return Err(eyre!("Too Many Requests"));
        }
        Ok("https://t.me/+invite".to_owned())
    }

    async fn send_message(&self, tg_id: i64, text: &str) -> Result<()> {
        if self.unreachable.contains(&tg_id) {
            return Err(eyre!("Forbidden: bot was blocked by the user"));
        }
        self.messages.lock().push((tg_id, text.to_owned()));
        Ok(())
    }

    async fn kick_then_unban(&self, tg_id: i64) -> Result<()> {
        if self.fail_kick.contains(&tg_id) {
            return Err(eyre!("Bad Request: not enough rights"));
        }
        self.kicked.lock().push(tg_id);
        Ok(())
    }

    async fn membership(&self, tg_id: i64) -> Result<Membership> {
        if self.transport_down {
            return Err(eyre!("connection reset"));
        }
        Ok(self
            .members
            .get(&tg_id)
            .copied()
            .unwrap_or(Membership::NotFound))
    }

    async fn channel_info(&self) -> Result<ChannelInfo> {
        Ok(ChannelInfo {
            title: "Private".to_owned(),
            member_count: self.members.len() as u32,
            description: None,
        })
    }
}

fn name(first: &str) -> UserName {
    UserName {
        tg_user_name: None,
        first_name: first.to_owned(),
        last_name: None,
    }
}

fn user(tg_id: i64, until: Option<DateTime<Utc>>, in_channel: bool) -> User {
    let mut user = User::new(tg_id, name("user"));
    user.subscription_until = until;
    user.is_in_channel = in_channel;
    user
}

fn manager(store: Arc<MemoryStore>, channel: Arc<FakeChannel>) -> ChannelManager {
    ChannelManager::new(store, channel).with_pause(Duration::ZERO)
}

fn payment(tg_id: i64, product: Product, charge_id: &str) -> PaymentEvent {
    PaymentEvent {
        tg_id,
        name: name("buyer"),
        payload: product.payload(),
        amount: product.price(),
        telegram_payment_charge_id: charge_id.to_owned(),
        provider_payment_charge_id: None,
    }
}

#[tokio::test]
async fn test_grant_sends_invite_and_sets_flag() {
    let now = Utc::now();
    let store = MemoryStore::with_users(vec![user(1, Some(now + Days::days(3)), false)]);
    let channel = Arc::new(FakeChannel::default());
    let manager = manager(store.clone(), channel.clone());

    manager.grant(1).await.unwrap();

    assert!(store.user(1).is_in_channel);
    let messages = channel.messages_to(1);
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("https://t.me/+invite"));
}

#[tokio::test]
async fn test_grant_invite_failure_keeps_flag() {
    let now = Utc::now();
    let store = MemoryStore::with_users(vec![user(1, Some(now + Days::days(3)), false)]);
    let channel = Arc::new(FakeChannel {
        fail_invite: true,
        ..Default::default()
    });
    let manager = manager(store.clone(), channel.clone());

    assert!(manager.grant(1).await.is_err());
    assert!(!store.user(1).is_in_channel);
    assert!(channel.messages_to(1).is_empty());
}

#[tokio::test]
async fn test_grant_undelivered_invite_keeps_flag() {
    let now = Utc::now();
    let store = MemoryStore::with_users(vec![user(1, Some(now + Days::days(3)), false)]);
    let channel = Arc::new(FakeChannel {
        unreachable: HashSet::from([1]),
        ..Default::default()
    });
    let manager = manager(store.clone(), channel);

    assert!(manager.grant(1).await.is_err());
    assert!(!store.user(1).is_in_channel);
}

#[tokio::test]
async fn test_grant_twice_keeps_expiry() {
    let until = Utc::now() + Days::days(10);
    let store = MemoryStore::with_users(vec![user(1, Some(until), false)]);
    let channel = Arc::new(FakeChannel::default());
    let manager = manager(store.clone(), channel.clone());

    manager.grant(1).await.unwrap();
    manager.grant(1).await.unwrap();

    let user = store.user(1);
    assert!(user.is_in_channel);
    assert_eq!(user.subscription_until, Some(until));
    assert_eq!(channel.messages_to(1).len(), 2);
}

#[tokio::test]
async fn test_evict_kick_failure_keeps_flag() {
    let now = Utc::now();
    let store = MemoryStore::with_users(vec![user(1, Some(now - Days::days(1)), true)]);
    let channel = Arc::new(FakeChannel {
        fail_kick: HashSet::from([1]),
        ..Default::default()
    });
    let manager = manager(store.clone(), channel.clone());

    assert!(manager.evict(1).await.is_err());
    assert!(store.user(1).is_in_channel);
    assert!(channel.messages_to(1).is_empty());
}

#[tokio::test]
async fn test_evict_ignores_notification_failure() {
    let now = Utc::now();
    let store = MemoryStore::with_users(vec![
        user(1, Some(now - Days::days(1)), true),
        user(2, Some(now - Days::days(1)), true),
    ]);
    let channel = Arc::new(FakeChannel {
        unreachable: HashSet::from([2]),
        ..Default::default()
    });
    let manager = manager(store.clone(), channel.clone());

    manager.evict(1).await.unwrap();
    manager.evict(2).await.unwrap();

    assert!(!store.user(1).is_in_channel);
    assert!(!store.user(2).is_in_channel);
    assert_eq!(*channel.kicked.lock(), vec![1, 2]);
    assert_eq!(channel.messages_to(1), vec![EXPIRED_TEXT.to_owned()]);
}

#[tokio::test]
async fn test_check_writes_observed_membership() {
    let store = MemoryStore::with_users(vec![
        user(1, None, true),
        user(2, None, false),
        user(3, None, true),
    ]);
    let channel = Arc::new(FakeChannel {
        members: HashMap::from([(2, Membership::Administrator), (3, Membership::Other)]),
        ..Default::default()
    });
    let manager = manager(store.clone(), channel);

    assert!(!manager.check(1).await.unwrap());
    assert!(manager.check(2).await.unwrap());
    assert!(!manager.check(3).await.unwrap());

    assert!(!store.user(1).is_in_channel);
    assert!(store.user(2).is_in_channel);
    assert!(!store.user(3).is_in_channel);
}

#[tokio::test]
async fn test_check_transport_failure_propagates() {
    let store = MemoryStore::with_users(vec![user(1, None, true)]);
    let channel = Arc::new(FakeChannel {
        transport_down: true,
        ..Default::default()
    });
    let manager = manager(store.clone(), channel);

    assert!(manager.check(1).await.is_err());
    assert!(store.user(1).is_in_channel);
}

#[tokio::test]
async fn test_sweep_evicts_only_expired_members() {
    let now = Utc::now();
    let store = MemoryStore::with_users(vec![
        user(1, Some(now - Days::days(2)), true),
        user(2, Some(now - Days::hours(1)), true),
        user(3, Some(now), true),
        user(4, Some(now + Days::days(5)), true),
        user(5, Some(now - Days::days(2)), false),
        user(6, None, true),
    ]);
    let channel = Arc::new(FakeChannel::default());
    let manager = manager(store.clone(), channel.clone());

    let report = manager.try_sweep(now).await.unwrap();

    assert_eq!(report, SweepReport { evicted: 3, failed: 0 });
    assert_eq!(*channel.kicked.lock(), vec![1, 2, 3]);
    for id in [1, 2, 3] {
        assert!(!store.user(id).is_in_channel);
    }
    assert!(store.user(4).is_in_channel);
    assert!(!store.user(5).is_in_channel);
    assert!(store.user(6).is_in_channel);
}

#[tokio::test]
async fn test_sweep_continues_after_failure() {
    let now = Utc::now();
    let store = MemoryStore::with_users(vec![
        user(1, Some(now - Days::days(1)), true),
        user(2, Some(now - Days::days(1)), true),
        user(3, Some(now - Days::days(1)), true),
    ]);
    let channel = Arc::new(FakeChannel {
        fail_kick: HashSet::from([2]),
        ..Default::default()
    });
    let manager = manager(store.clone(), channel.clone());

    let report = manager.try_sweep(now).await.unwrap();

    assert_eq!(report, SweepReport { evicted: 2, failed: 1 });
    assert!(!store.user(1).is_in_channel);
    assert!(store.user(2).is_in_channel);
    assert!(!store.user(3).is_in_channel);
}

#[tokio::test]
async fn test_sweep_never_fails() {
    let store = Arc::new(MemoryStore {
        fail_listing: true,
        ..Default::default()
    });
    let manager = manager(store.clone(), Arc::new(FakeChannel::default()));

    assert!(manager.try_sweep(Utc::now()).await.is_err());
    assert_eq!(manager.sweep().await, SweepReport::default());
}

#[tokio::test]
async fn test_sync_all() {
    let now = Utc::now();
    let store = MemoryStore::with_users(vec![
        user(1, Some(now + Days::days(5)), false),
        user(2, Some(now + Days::days(5)), true),
        user(3, Some(now - Days::days(5)), true),
        user(4, Some(now - Days::days(5)), false),
        // Flagged without ever paying, e.g. a channel admin.
        user(5, None, true),
        user(6, Some(now + Days::days(1)), false),
    ]);
    let channel = Arc::new(FakeChannel {
        unreachable: HashSet::from([6]),
        ..Default::default()
    });
    let manager = manager(store.clone(), channel.clone());

    let report = manager.sync_all(now).await.unwrap();

    assert_eq!(
        report,
        SyncReport {
            admitted: 1,
            evicted: 1,
            failed: 1
        }
    );
    assert!(store.user(1).is_in_channel);
    assert!(store.user(2).is_in_channel);
    assert!(!store.user(3).is_in_channel);
    assert!(!store.user(4).is_in_channel);
    assert!(store.user(5).is_in_channel);
    assert!(!store.user(6).is_in_channel);
    assert_eq!(*channel.kicked.lock(), vec![3]);
}

#[tokio::test]
async fn test_sequential_payments_extend_incrementally() {
    let now = Utc::now();
    let store = MemoryStore::with_users(vec![user(1, Some(now + Days::days(10)), true)]);
    let manager = manager(store.clone(), Arc::new(FakeChannel::default()));

    let mut expected = now + Days::days(10);
    for (idx, product) in [Product::OneMonth, Product::ThreeMonths, Product::OneMonth]
        .into_iter()
        .enumerate()
    {
        let receipt = manager
            .on_payment(payment(1, product, &format!("charge-{}", idx)), now)
            .await
            .unwrap();
        expected += Days::days(product.days() as i64);
        assert_eq!(receipt.until, Some(expected));
    }
    assert_eq!(store.user(1).subscription_until, Some(expected));
}

#[tokio::test]
async fn test_duplicate_payment_is_skipped() {
    let now = Utc::now();
    let store = Arc::new(MemoryStore::default());
    let channel = Arc::new(FakeChannel::default());
    let manager = manager(store.clone(), channel.clone());

    let first = manager
        .on_payment(payment(7, Product::OneMonth, "charge"), now)
        .await
        .unwrap();
    let second = manager
        .on_payment(payment(7, Product::OneMonth, "charge"), now)
        .await
        .unwrap();

    assert!(!first.duplicate);
    assert!(second.duplicate);
    assert_eq!(second.admission, Admission::Skipped);
    assert_eq!(second.until, first.until);
    assert_eq!(store.purchases.lock().len(), 1);
    assert_eq!(channel.messages_to(7).len(), 1);
}

#[tokio::test]
async fn test_payment_survives_failed_admission() {
    let now = Utc::now();
    let store = Arc::new(MemoryStore::default());
    let channel = Arc::new(FakeChannel {
        fail_invite: true,
        ..Default::default()
    });
    let manager = manager(store.clone(), channel);

    let receipt = manager
        .on_payment(payment(7, Product::SixMonths, "charge"), now)
        .await
        .unwrap();

    assert_eq!(receipt.admission, Admission::Failed);
    assert_eq!(receipt.until, Some(now + Days::days(180)));
    let user = store.user(7);
    assert_eq!(user.subscription_until, Some(now + Days::days(180)));
    assert!(!user.is_in_channel);
}

#[tokio::test]
async fn test_unknown_product_is_rejected() {
    let store = Arc::new(MemoryStore::default());
    let manager = manager(store.clone(), Arc::new(FakeChannel::default()));

    let mut event = payment(7, Product::OneMonth, "charge");
    event.payload = "subscription_forever".to_owned();

    assert!(manager.on_payment(event, Utc::now()).await.is_err());
    assert!(store.purchases.lock().is_empty());
}

#[tokio::test]
async fn test_payment_then_expiry_sweep() {
    let now = Utc::now();
    let store = Arc::new(MemoryStore::default());
    let channel = Arc::new(FakeChannel::default());
    let manager = manager(store.clone(), channel.clone());

    let receipt = manager
        .on_payment(payment(100, Product::OneMonth, "tg-charge-1"), now)
        .await
        .unwrap();

    assert_eq!(receipt.product, Product::OneMonth);
    assert_eq!(receipt.admission, Admission::Granted);
    let user = store.user(100);
    assert_eq!(user.subscription_until, Some(now + Days::days(30)));
    assert!(user.is_in_channel);
    {
        let purchases = store.purchases.lock();
        assert_eq!(purchases.len(), 1);
        assert_eq!(purchases[0].telegram_payment_charge_id, "tg-charge-1");
        assert_eq!(purchases[0].user_id, 100);
    }

    let report = manager.try_sweep(now + Days::days(31)).await.unwrap();
    assert_eq!(report.evicted, 1);
    assert!(!store.user(100).is_in_channel);
    assert_eq!(*channel.kicked.lock(), vec![100]);
}

#[tokio::test]
async fn test_broadcast_counts_failures() {
    let store = MemoryStore::with_users(vec![user(1, None, false), user(2, None, false)]);
    let channel = Arc::new(FakeChannel {
        unreachable: HashSet::from([2]),
        ..Default::default()
    });
    let manager = manager(store, channel.clone());

    let report = manager.broadcast("hello").await.unwrap();

    assert_eq!(report, BroadcastReport { sent: 1, failed: 1 });
    assert_eq!(channel.messages_to(1), vec!["hello".to_owned()]);
}
