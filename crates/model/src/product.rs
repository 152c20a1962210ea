use strum::{EnumIter, IntoEnumIterator as _};

const PAYLOAD_PREFIX: &str = "subscription_";

/// Currency code of Telegram Stars.
pub const CURRENCY: &str = "XTR";

#[derive(EnumIter, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Product {
    OneMonth,
    ThreeMonths,
    SixMonths,
    TwelveMonths,
}

impl Product {
    pub fn list() -> Vec<Product> {
        Product::iter().collect()
    }

    pub fn id(&self) -> &'static str {
        match self {
            Product::OneMonth => "1_month",
            Product::ThreeMonths => "3_months",
            Product::SixMonths => "6_months",
            Product::TwelveMonths => "12_months",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Product::OneMonth => "Подписка на 1 месяц",
            Product::ThreeMonths => "Подписка на 3 месяца",
            Product::SixMonths => "Подписка на 6 месяцев",
            Product::TwelveMonths => "Подписка на 12 месяцев",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Product::OneMonth => "Доступ к приватному каналу на 1 месяц",
            Product::ThreeMonths => "Доступ к приватному каналу на 3 месяца",
            Product::SixMonths => "Доступ к приватному каналу на 6 месяцев",
            Product::TwelveMonths => "Доступ к приватному каналу на 12 месяцев",
        }
    }

    /// Price in stars.
    pub fn price(&self) -> u32 {
        match self {
            Product::OneMonth => 100,
            Product::ThreeMonths => 250,
            Product::SixMonths => 450,
            Product::TwelveMonths => 800,
        }
    }

    pub fn days(&self) -> u32 {
        match self {
            Product::OneMonth => 30,
            Product::ThreeMonths => 90,
            Product::SixMonths => 180,
            Product::TwelveMonths => 365,
        }
    }

    pub fn from_id(id: &str) -> Option<Product> {
        Product::iter().find(|product| product.id() == id)
    }

    pub fn payload(&self) -> String {
        format!("{}{}", PAYLOAD_PREFIX, self.id())
    }

    pub fn from_payload(payload: &str) -> Option<Product> {
        payload
            .strip_prefix(PAYLOAD_PREFIX)
            .and_then(Product::from_id)
    }
}
