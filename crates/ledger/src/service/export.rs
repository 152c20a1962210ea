use std::{
    io::{Cursor, Write as _},
    sync::Arc,
};

use eyre::Result;
use model::{purchase::Purchase, session::Session, user::User};
use storage::{purchase::PurchaseStore, user::UserStore};
use zip::{write::SimpleFileOptions, ZipWriter};

const USERS_HEADER: &[&str] = &[
    "tg_id",
    "username",
    "first_name",
    "last_name",
    "subscription_until",
    "is_in_channel",
    "created_at",
];

const PURCHASES_HEADER: &[&str] = &[
    "user_id",
    "product_id",
    "product_title",
    "amount",
    "telegram_payment_charge_id",
    "provider_payment_charge_id",
    "created_at",
];

#[derive(Clone)]
pub struct Export {
    users: Arc<UserStore>,
    purchases: Arc<PurchaseStore>,
}

impl Export {
    pub(crate) fn new(users: Arc<UserStore>, purchases: Arc<PurchaseStore>) -> Self {
        Export { users, purchases }
    }

    /// Zip archive with `users.csv` and `purchases.csv`.
    pub async fn make_archive(&self, session: &mut Session) -> Result<Vec<u8>> {
        let users = self.users.find_all(session).await?;
        let purchases = self.purchases.find_all(session).await?;
        archive(&users, &purchases)
    }
}

pub fn archive(users: &[User], purchases: &[Purchase]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    zip.start_file("users.csv", options)?;
    zip.write_all(users_csv(users).as_bytes())?;
    zip.start_file("purchases.csv", options)?;
    zip.write_all(purchases_csv(purchases).as_bytes())?;

    Ok(zip.finish()?.into_inner())
}

pub fn users_csv(users: &[User]) -> String {
    let mut out = row(USERS_HEADER.iter().map(|h| h.to_string()));
    for user in users {
        out.push_str(&row([
            user.tg_id.to_string(),
            user.name.tg_user_name.clone().unwrap_or_default(),
            user.name.first_name.clone(),
            user.name.last_name.clone().unwrap_or_default(),
            user.subscription_until
                .map(|until| until.to_rfc3339())
                .unwrap_or_default(),
            user.is_in_channel.to_string(),
            user.created_at.to_rfc3339(),
        ]));
    }
    out
}

pub fn purchases_csv(purchases: &[Purchase]) -> String {
    let mut out = row(PURCHASES_HEADER.iter().map(|h| h.to_string()));
    for purchase in purchases {
        out.push_str(&row([
            purchase.user_id.to_string(),
            purchase.product_id.clone(),
            purchase.product_title.clone(),
            purchase.amount.to_string(),
            purchase.telegram_payment_charge_id.clone(),
            purchase
                .provider_payment_charge_id
                .clone()
                .unwrap_or_default(),
            purchase.created_at.to_rfc3339(),
        ]));
    }
    out
}

fn row<I: IntoIterator<Item = String>>(fields: I) -> String {
    let mut line = fields
        .into_iter()
        .map(|field| escape(&field))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone as _, Utc};
    use model::{product::Product, user::UserName};
    use std::io::Read as _;

    use super::*;

    fn user() -> User {
        let mut user = User::new(
            42,
            UserName {
                tg_user_name: Some("neo".to_owned()),
                first_name: "Thomas, \"Neo\"".to_owned(),
                last_name: None,
            },
        );
        user.subscription_until = Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());
        user.is_in_channel = true;
        user
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(escape("a,b"), "\"a,b\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_users_csv() {
        let csv = users_csv(&[user()]);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(USERS_HEADER.join(",").as_str()));
        let line = lines.next().unwrap();
        assert!(line.starts_with("42,neo,\"Thomas, \"\"Neo\"\"\",,2024-05-01T00:00:00+00:00,true,"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_archive_contains_both_files() {
        let purchase = Purchase::new(
            42,
            Product::OneMonth,
            Product::OneMonth.price(),
            "charge-1".to_owned(),
            Some(String::new()),
            Utc::now(),
        );
        let bytes = archive(&[user()], &[purchase]).unwrap();
        let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(zip.len(), 2);

        let mut purchases = String::new();
        zip.by_name("purchases.csv")
            .unwrap()
            .read_to_string(&mut purchases)
            .unwrap();
        let row = purchases.lines().nth(1).unwrap();
        assert!(row.starts_with("42,1_month,"));
        assert!(row.contains(",100,charge-1,,"));
        assert!(zip.by_name("users.csv").is_ok());
    }
}
