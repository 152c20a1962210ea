use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::product::Product;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Purchase {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    /// Telegram id of the buyer.
    pub user_id: i64,
    pub product_id: String,
    pub product_title: String,
    pub amount: u32,
    pub telegram_payment_charge_id: String,
    #[serde(default)]
    pub provider_payment_charge_id: Option<String>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Purchase {
    pub fn new(
        user_id: i64,
        product: Product,
        amount: u32,
        telegram_payment_charge_id: String,
        provider_payment_charge_id: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Purchase {
        Purchase {
            id: ObjectId::new(),
            user_id,
            product_id: product.id().to_owned(),
            product_title: product.title().to_owned(),
            amount,
            telegram_payment_charge_id,
            provider_payment_charge_id: provider_payment_charge_id.filter(|id| !id.is_empty()),
            created_at,
        }
    }
}

/// Result of writing a payment into the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Applied { until: DateTime<Utc> },
    Duplicate,
}

/// Revenue summary over a period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Revenue {
    pub amount: i64,
    pub count: u64,
}
