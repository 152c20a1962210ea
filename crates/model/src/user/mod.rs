use core::fmt;
use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::subscription::{ChannelState, SubscriptionView};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub tg_id: i64,
    pub name: UserName,
    #[serde(default, with = "opt_datetime")]
    pub subscription_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_in_channel: bool,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
    /// Actor of the last change, `SYSTEM_ACTOR` for background jobs.
    #[serde(default)]
    pub updated_by: i64,
    #[serde(default)]
    pub version: u64,
}

impl User {
    pub fn new(tg_id: i64, name: UserName) -> User {
        let now = Utc::now();
        User {
            id: ObjectId::new(),
            tg_id,
            name,
            subscription_until: None,
            is_in_channel: false,
            created_at: now,
            updated_at: now,
            updated_by: tg_id,
            version: 0,
        }
    }

    pub fn is_subscription_active(&self, now: DateTime<Utc>) -> bool {
        self.subscription_until.map_or(false, |until| until > now)
    }

    /// Had a subscription and it ran out. Users that never paid are not expired.
    pub fn is_subscription_expired(&self, now: DateTime<Utc>) -> bool {
        self.subscription_until.map_or(false, |until| until <= now)
    }

    pub fn channel_state(&self, now: DateTime<Utc>) -> ChannelState {
        ChannelState::of(self.subscription_until, self.is_in_channel, now)
    }

    pub fn subscription(&self, now: DateTime<Utc>) -> SubscriptionView {
        SubscriptionView::of(self, now)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct UserName {
    pub tg_user_name: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
}

impl Display for UserName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first_name)?;
        if let Some(last_name) = &self.last_name {
            write!(f, " {}", last_name)?;
        }
        if let Some(tg_user_name) = &self.tg_user_name {
            write!(f, " (@{})", tg_user_name)?;
        }
        Ok(())
    }
}

/// Lookup key accepted by the admin search: `@handle` or a numeric id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserIdent {
    TgId(i64),
    UserName(String),
}

impl UserIdent {
    pub fn parse(query: &str) -> Option<UserIdent> {
        let query = query.trim();
        if let Some(name) = query.strip_prefix('@') {
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return None;
            }
            return Some(UserIdent::UserName(name.to_owned()));
        }
        query.parse::<i64>().ok().map(UserIdent::TgId)
    }
}

impl From<i64> for UserIdent {
    fn from(value: i64) -> Self {
        UserIdent::TgId(value)
    }
}

pub mod opt_datetime {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize as _, Deserializer, Serialize as _, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => bson::DateTime::from_chrono(*dt).serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<bson::DateTime>::deserialize(deserializer)?.map(|dt| dt.to_chrono()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user(until: Option<DateTime<Utc>>) -> User {
        let mut user = User::new(1, UserName::default());
        user.subscription_until = until;
        user
    }

    #[test]
    fn test_subscription_active_is_strict() {
        let now = Utc::now();
        assert!(user(Some(now + Duration::seconds(1))).is_subscription_active(now));
        assert!(!user(Some(now)).is_subscription_active(now));
        assert!(!user(None).is_subscription_active(now));
    }

    #[test]
    fn test_subscription_expired() {
        let now = Utc::now();
        assert!(user(Some(now)).is_subscription_expired(now));
        assert!(user(Some(now - Duration::days(1))).is_subscription_expired(now));
        assert!(!user(None).is_subscription_expired(now));
        assert!(!user(Some(now + Duration::days(1))).is_subscription_expired(now));
    }

    #[test]
    fn test_new_user_is_changed_by_self() {
        let user = User::new(77, UserName::default());
        assert_eq!(user.updated_by, 77);
    }

    #[test]
    fn test_user_name_display() {
        let name = UserName {
            tg_user_name: Some("ivan".to_owned()),
            first_name: "Ivan".to_owned(),
            last_name: Some("Petrov".to_owned()),
        };
        assert_eq!(name.to_string(), "Ivan Petrov (@ivan)");
    }

    #[test]
    fn test_user_ident_parse() {
        assert_eq!(UserIdent::parse(" 12345 "), Some(UserIdent::TgId(12345)));
        assert_eq!(
            UserIdent::parse("@some_user"),
            Some(UserIdent::UserName("some_user".to_owned()))
        );
        assert_eq!(UserIdent::parse("@"), None);
        assert_eq!(UserIdent::parse("@bad name"), None);
        assert_eq!(UserIdent::parse("abc"), None);
    }
}
