use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use teloxide::types::InlineKeyboardButton;

pub fn encode_data<T>(data: &T, type_id: u32) -> String
where
    T: Serialize + ?Sized,
{
    match bincode::serialize(&(data, type_id)) {
        Ok(bytes) => hex::encode(bytes),
        Err(err) => {
            log::error!("Failed to encode callback data: {:#}", err);
            String::new()
        }
    }
}

pub fn decode_data<T>(data: &str) -> Result<(T, u32), eyre::Error>
where
    T: DeserializeOwned,
{
    Ok(bincode::deserialize(&hex::decode(data)?)?)
}

/// Typed callback payload. Telegram limits callback data to 64 bytes, so
/// payloads stay small: enums and ids only.
pub trait Calldata {
    fn to_data(&self) -> String;
    fn from_data(data: &str) -> Option<Self>
    where
        Self: Sized;

    fn button<N: Into<String>>(&self, name: N) -> InlineKeyboardButton {
        InlineKeyboardButton::callback(name, self.to_data())
    }
    fn btn_row<N: Into<String>>(&self, name: N) -> Vec<InlineKeyboardButton> {
        vec![self.button(name)]
    }
}

impl<T> Calldata for T
where
    T: Serialize + DeserializeOwned,
{
    fn to_data(&self) -> String {
        encode_data(self, type_id::<T>())
    }

    fn from_data(data: &str) -> Option<Self> {
        let (data, id) = decode_data(data).ok()?;
        if id != type_id::<T>() {
            return None;
        }
        Some(data)
    }
}

fn type_id<T>() -> u32 {
    let type_name = std::any::type_name::<T>();
    let mut hasher = DefaultHasher::new();
    type_name.hash(&mut hasher);
    (hasher.finish() % u32::MAX as u64) as u32
}

#[macro_export]
macro_rules! calldata {
    ($data:expr) => {
        if let Some(cb) = bot_core::callback_data::Calldata::from_data($data) {
            cb
        } else {
            return Ok(bot_core::widget::Jmp::None);
        }
    };
}
