pub mod channel;
pub mod history;
pub mod menu;
pub mod products;
pub mod profile;
