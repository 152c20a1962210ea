use chrono::{DateTime, Utc};
use model::{
    session::SYSTEM_ACTOR,
    subscription::{ChannelState, SubscriptionView},
    user::User,
};
use teloxide::utils::markdown::escape;

use crate::day::{fmt_days_left, fmt_utc_dt};

pub fn fmt_subscription_status(sub: &SubscriptionView, now: DateTime<Utc>) -> String {
    match sub.until {
        Some(until) if sub.active => format!(
            "✅ Активна до _{}_ \\(осталось {}\\)",
            fmt_utc_dt(&until),
            fmt_days_left(sub, now)
        ),
        Some(until) => format!("❌ Истекла _{}_", fmt_utc_dt(&until)),
        None => "❌ Нет активной подписки".to_owned(),
    }
}

/// Who made the last change to a user record.
pub fn fmt_actor(actor: i64) -> String {
    if actor == SYSTEM_ACTOR {
        "система".to_owned()
    } else {
        format!("`{}`", actor)
    }
}

pub fn fmt_channel_status(user: &User) -> &'static str {
    if user.is_in_channel {
        "✅ В канале"
    } else {
        "❌ Не в канале"
    }
}

pub fn fmt_channel_state(state: ChannelState) -> &'static str {
    match state {
        ChannelState::NoSubscription => "⚪",
        ChannelState::ActiveNotAdmitted => "🟡",
        ChannelState::ActiveAdmitted => "🟢",
        ChannelState::ExpiredAdmitted => "🟠",
        ChannelState::ExpiredNotAdmitted => "🔴",
    }
}

pub fn fmt_user_name(user: &User) -> String {
    escape(&user.name.to_string())
}

pub fn fmt_handle(user: &User) -> String {
    user.name
        .tg_user_name
        .as_ref()
        .map(|n| escape(&format!("@{}", n)))
        .unwrap_or_else(|| "не указан".to_owned())
}

/// One line of a user list.
pub fn user_row(user: &User, now: DateTime<Utc>) -> String {
    format!(
        "{} {} `{}`\n",
        fmt_channel_state(user.channel_state(now)),
        fmt_user_name(user),
        user.tg_id
    )
}

pub fn user_base_info(user: &User, now: DateTime<Utc>) -> String {
    format!(
        "🆔 ID: `{}`\n👤 Имя: {}\n📝 Username: {}\n📅 Регистрация: _{}_\n\n\
         📺 Подписка: {}\n📍 Статус в канале: {}\n{}\n",
        user.tg_id,
        escape(&user.name.first_name),
        fmt_handle(user),
        fmt_utc_dt(&user.created_at),
        fmt_subscription_status(&user.subscription(now), now),
        fmt_channel_status(user),
        tg_link(user.tg_id),
    )
}

pub fn tg_link(tg: i64) -> String {
    format!("[🔗Профиль](tg://user?id={})", tg)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use model::user::UserName;

    use super::*;

    fn user() -> User {
        User::new(
            7,
            UserName {
                tg_user_name: Some("john_doe".to_owned()),
                first_name: "John".to_owned(),
                last_name: Some("Doe".to_owned()),
            },
        )
    }

    #[test]
    fn test_fmt_handle_is_escaped() {
        assert_eq!(fmt_handle(&user()), "@john\\_doe");
    }

    #[test]
    fn test_subscription_status() {
        let now = Utc::now();
        let mut user = user();
        let status = |user: &User| fmt_subscription_status(&user.subscription(now), now);
        assert_eq!(status(&user), "❌ Нет активной подписки");
        user.subscription_until = Some(now + Duration::days(2) + Duration::hours(1));
        assert!(status(&user).contains("осталось 2 дн\\."));
        user.subscription_until = Some(now - Duration::days(1));
        assert!(status(&user).starts_with("❌ Истекла"));
        user.subscription_until = Some(now);
        assert!(status(&user).starts_with("❌ Истекла"));
    }

    #[test]
    fn test_fmt_actor() {
        assert_eq!(fmt_actor(SYSTEM_ACTOR), "система");
        assert_eq!(fmt_actor(7), "`7`");
    }

    #[test]
    fn test_user_row() {
        let now = Utc::now();
        let mut user = user();
        user.subscription_until = Some(now + Duration::days(1));
        user.is_in_channel = true;
        assert_eq!(user_row(&user, now), "🟢 John Doe \\(@john\\_doe\\) `7`\n");
    }
}
