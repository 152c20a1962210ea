pub mod export;
pub mod purchases;
pub mod statistics;
pub mod users;
