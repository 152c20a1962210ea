use std::{env::var, sync::Arc};

use dotenv::dotenv;
use eyre::{Context, Error};
use log::info;

#[derive(Clone)]
pub struct Env(Arc<EnvInner>);

struct EnvInner {
    tg_token: String,
    mongo_url: String,
    channel_id: i64,
    channel_invite_link: Option<String>,
    admin_ids: Vec<i64>,
    payment_provider_token: String,
}

impl Env {
    pub fn tg_token(&self) -> &str {
        &self.0.tg_token
    }

    pub fn mongo_url(&self) -> &str {
        &self.0.mongo_url
    }

    pub fn channel_id(&self) -> i64 {
        self.0.channel_id
    }

    /// Public join link shown as a button next to the channel description.
    pub fn channel_invite_link(&self) -> Option<&str> {
        self.0.channel_invite_link.as_deref()
    }

    pub fn admin_ids(&self) -> &[i64] {
        &self.0.admin_ids
    }

    pub fn is_admin(&self, tg_id: i64) -> bool {
        self.0.admin_ids.contains(&tg_id)
    }

    /// Empty for payments in Telegram Stars.
    pub fn payment_provider_token(&self) -> &str {
        &self.0.payment_provider_token
    }

    pub fn load() -> Result<Env, Error> {
        if let Err(err) = dotenv() {
            info!("Failed to load .env file: {}", err);
        }

        let channel_id = var("CHANNEL_ID").context("CHANNEL_ID is not set")?;
        let channel_id = channel_id
            .trim()
            .parse::<i64>()
            .with_context(|| format!("CHANNEL_ID is not a number: {}", channel_id))?;

        Ok(Env(Arc::new(EnvInner {
            tg_token: var("TG_TOKEN").context("TG_TOKEN is not set")?,
            mongo_url: var("MONGO_URL").context("MONGO_URL is not set")?,
            channel_id,
            channel_invite_link: var("CHANNEL_INVITE_LINK")
                .ok()
                .filter(|link| !link.trim().is_empty()),
            admin_ids: parse_admin_ids(&var("ADMIN_IDS").unwrap_or_default()),
            payment_provider_token: var("PAYMENT_PROVIDER_TOKEN").unwrap_or_default(),
        })))
    }

    pub fn new(
        tg_token: String,
        mongo_url: String,
        channel_id: i64,
        channel_invite_link: Option<String>,
        admin_ids: Vec<i64>,
        payment_provider_token: String,
    ) -> Env {
        Env(Arc::new(EnvInner {
            tg_token,
            mongo_url,
            channel_id,
            channel_invite_link,
            admin_ids,
            payment_provider_token,
        }))
    }
}

pub fn parse_admin_ids(raw: &str) -> Vec<i64> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .filter_map(|id| id.parse::<i64>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_admin_ids() {
        assert_eq!(parse_admin_ids("1, 2,3"), vec![1, 2, 3]);
    }

    #[test]
    fn test_parse_admin_ids_skips_garbage() {
        assert_eq!(parse_admin_ids("12,abc,,  ,-5, 7x"), vec![12, -5]);
    }

    #[test]
    fn test_parse_admin_ids_empty() {
        assert!(parse_admin_ids("").is_empty());
    }

    #[test]
    fn test_is_admin() {
        let env = Env::new(
            "token".to_owned(),
            "mongodb://localhost".to_owned(),
            -100,
            None,
            vec![42],
            String::new(),
        );
        assert!(env.is_admin(42));
        assert!(!env.is_admin(43));
    }
}
