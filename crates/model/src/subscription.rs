use chrono::{DateTime, Duration, Utc};

use crate::user::User;

/// New expiry after buying `days`: the period is appended to whatever is still
/// left, or starts from `now` when nothing is left.
pub fn extend_until(
    current: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    days: u32,
) -> DateTime<Utc> {
    let base = match current {
        Some(until) if until > now => until,
        _ => now,
    };
    base + Duration::days(days as i64)
}

/// Relationship between a user and the channel. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    NoSubscription,
    ActiveNotAdmitted,
    ActiveAdmitted,
    ExpiredAdmitted,
    ExpiredNotAdmitted,
}

impl ChannelState {
    pub fn of(until: Option<DateTime<Utc>>, in_channel: bool, now: DateTime<Utc>) -> ChannelState {
        match (until, in_channel) {
            (None, _) => ChannelState::NoSubscription,
            (Some(until), true) if until > now => ChannelState::ActiveAdmitted,
            (Some(until), false) if until > now => ChannelState::ActiveNotAdmitted,
            (Some(_), true) => ChannelState::ExpiredAdmitted,
            (Some(_), false) => ChannelState::ExpiredNotAdmitted,
        }
    }

    pub fn needs_admission(&self) -> bool {
        matches!(self, ChannelState::ActiveNotAdmitted)
    }

    pub fn needs_eviction(&self) -> bool {
        matches!(self, ChannelState::ExpiredAdmitted)
    }
}

/// What a user's subscription looks like at a given moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionView {
    pub until: Option<DateTime<Utc>>,
    pub active: bool,
    pub state: ChannelState,
}

impl SubscriptionView {
    pub fn of(user: &User, now: DateTime<Utc>) -> SubscriptionView {
        SubscriptionView {
            until: user.subscription_until,
            active: user.is_subscription_active(now),
            state: user.channel_state(now),
        }
    }

    /// Whole days left, zero when inactive or less than a day remains.
    pub fn days_left(&self, now: DateTime<Utc>) -> i64 {
        match self.until {
            Some(until) if until > now => (until - now).num_days(),
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::UserName;
    use chrono::TimeZone as _;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_extend_without_subscription() {
        assert_eq!(extend_until(None, now(), 30), now() + Duration::days(30));
    }

    #[test]
    fn test_extend_expired_starts_from_now() {
        let expired = now() - Duration::days(10);
        assert_eq!(
            extend_until(Some(expired), now(), 30),
            now() + Duration::days(30)
        );
    }

    #[test]
    fn test_extend_active_is_additive() {
        let active = now() + Duration::days(5);
        assert_eq!(
            extend_until(Some(active), now(), 30),
            now() + Duration::days(35)
        );
    }

    #[test]
    fn test_sequential_payments_fold() {
        let payments = [30, 90, 180, 365];
        let mut until = None;
        let mut clock = now();
        for days in payments {
            until = Some(extend_until(until, clock, days));
            clock += Duration::hours(1);
        }
        assert_eq!(until, Some(now() + Duration::days(30 + 90 + 180 + 365)));
    }

    #[test]
    fn test_channel_state() {
        let now = now();
        let future = Some(now + Duration::days(1));
        let past = Some(now - Duration::days(1));
        assert_eq!(ChannelState::of(None, true, now), ChannelState::NoSubscription);
        assert_eq!(
            ChannelState::of(future, false, now),
            ChannelState::ActiveNotAdmitted
        );
        assert_eq!(ChannelState::of(future, true, now), ChannelState::ActiveAdmitted);
        assert_eq!(ChannelState::of(past, true, now), ChannelState::ExpiredAdmitted);
        assert_eq!(
            ChannelState::of(past, false, now),
            ChannelState::ExpiredNotAdmitted
        );
        assert_eq!(
            ChannelState::of(Some(now), true, now),
            ChannelState::ExpiredAdmitted
        );
    }

    fn user(until: Option<DateTime<Utc>>, in_channel: bool) -> User {
        let mut user = User::new(1, UserName::default());
        user.subscription_until = until;
        user.is_in_channel = in_channel;
        user
    }

    #[test]
    fn test_subscription_view_of() {
        let now = now();
        let until = now + Duration::days(3);

        let view = SubscriptionView::of(&user(Some(until), false), now);
        assert_eq!(view.until, Some(until));
        assert!(view.active);
        assert_eq!(view.state, ChannelState::ActiveNotAdmitted);

        let view = user(Some(now), true).subscription(now);
        assert!(!view.active);
        assert_eq!(view.state, ChannelState::ExpiredAdmitted);

        let view = user(None, false).subscription(now);
        assert_eq!(view.until, None);
        assert!(!view.active);
        assert_eq!(view.state, ChannelState::NoSubscription);
    }

    #[test]
    fn test_days_left() {
        let now = now();
        let view = |until| user(until, true).subscription(now);

        assert_eq!(view(Some(now + Duration::days(30))).days_left(now), 30);
        assert_eq!(
            view(Some(now + Duration::days(2) + Duration::hours(23))).days_left(now),
            2
        );
        assert_eq!(view(Some(now + Duration::hours(5))).days_left(now), 0);
        assert_eq!(view(Some(now - Duration::days(4))).days_left(now), 0);
        assert_eq!(view(None).days_left(now), 0);
    }
}
