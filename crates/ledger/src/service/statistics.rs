use std::sync::Arc;

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone as _, Utc};
use eyre::{eyre, Result};
use model::{purchase::Revenue, session::Session};
use storage::{purchase::PurchaseStore, user::UserStore};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub users: u64,
    pub active: u64,
    pub revenue: Revenue,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelSummary {
    pub users: u64,
    pub active: u64,
    pub in_channel: u64,
    pub expired_in_channel: u64,
}

impl ChannelSummary {
    /// Share of registered users holding an active subscription, in percent.
    pub fn conversion(&self) -> f64 {
        conversion(self.active, self.users)
    }
}

pub fn conversion(active: u64, users: u64) -> f64 {
    if users == 0 {
        0.0
    } else {
        active as f64 * 100.0 / users as f64
    }
}

#[derive(Clone)]
pub struct Statistics {
    users: Arc<UserStore>,
    purchases: Arc<PurchaseStore>,
}

impl Statistics {
    pub(crate) fn new(users: Arc<UserStore>, purchases: Arc<PurchaseStore>) -> Self {
        Statistics { users, purchases }
    }

    pub async fn summary(&self, session: &mut Session, now: DateTime<Utc>) -> Result<Summary> {
        Ok(Summary {
            users: self.users.count(session).await?,
            active: self.users.count_active(session, now).await?,
            revenue: self.purchases.revenue(session).await?,
        })
    }

    pub async fn channel(
        &self,
        session: &mut Session,
        now: DateTime<Utc>,
    ) -> Result<ChannelSummary> {
        Ok(ChannelSummary {
            users: self.users.count(session).await?,
            active: self.users.count_active(session, now).await?,
            in_channel: self.users.count_in_channel(session).await?,
            expired_in_channel: self.users.count_expired_in_channel(session, now).await?,
        })
    }

    /// Revenue of the `days` preceding `now`.
    pub async fn revenue_for_last(
        &self,
        session: &mut Session,
        now: DateTime<Utc>,
        days: i64,
    ) -> Result<Revenue> {
        self.purchases
            .revenue_between(session, now - Duration::days(days), now)
            .await
    }

    /// Revenue per local calendar day, today first.
    pub async fn daily_revenue(
        &self,
        session: &mut Session,
        now: DateTime<Utc>,
        days: i64,
    ) -> Result<Vec<(NaiveDate, Revenue)>> {
        let today = now.with_timezone(&Local).date_naive();
        let mut stats = Vec::with_capacity(days.max(0) as usize);
        for offset in 0..days {
            let day = today - Duration::days(offset);
            let (from, to) =
                day_bounds(day).ok_or_else(|| eyre!("Invalid local day: {}", day))?;
            let revenue = self.purchases.revenue_between(session, from, to).await?;
            stats.push((day, revenue));
        }
        Ok(stats)
    }
}

/// Start and end of a local calendar day in UTC.
pub fn day_bounds(day: NaiveDate) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = Local
        .from_local_datetime(&day.and_time(NaiveTime::MIN))
        .earliest()?;
    let end = Local
        .from_local_datetime(&day.succ_opt()?.and_time(NaiveTime::MIN))
        .earliest()?;
    Some((start.with_timezone(&Utc), end.with_timezone(&Utc)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion() {
        assert_eq!(conversion(0, 0), 0.0);
        assert_eq!(conversion(1, 4), 25.0);
        assert_eq!(conversion(3, 3), 100.0);
    }

    #[test]
    fn test_day_bounds() {
        let day = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let (from, to) = day_bounds(day).unwrap();
        assert!(from < to);
        assert_eq!(from.with_timezone(&Local).date_naive(), day);
        assert_eq!(
            (to - Duration::seconds(1)).with_timezone(&Local).date_naive(),
            day
        );
    }
}
