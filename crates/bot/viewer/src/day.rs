use chrono::{
    format::{DelayedFormat, StrftimeItems},
    DateTime, Local, Utc,
};
use model::subscription::SubscriptionView;

pub fn fmt_date(day: &DateTime<Local>) -> DelayedFormat<StrftimeItems> {
    day.format("%d\\.%m\\.%Y")
}

pub fn fmt_dt(day: &DateTime<Local>) -> DelayedFormat<StrftimeItems> {
    day.format("%d\\.%m\\.%Y %H:%M")
}

pub fn fmt_utc_dt(day: &DateTime<Utc>) -> String {
    fmt_dt(&day.with_timezone(&Local)).to_string()
}

pub fn fmt_utc_date(day: &DateTime<Utc>) -> String {
    fmt_date(&day.with_timezone(&Local)).to_string()
}

/// Time left on a subscription in whole days: "5 дн." or "меньше дня".
pub fn fmt_days_left(sub: &SubscriptionView, now: DateTime<Utc>) -> String {
    if !sub.active {
        return "истекла".to_owned();
    }
    match sub.days_left(now) {
        0 => "меньше дня".to_owned(),
        days => format!("{} дн\\.", days),
    }
}
