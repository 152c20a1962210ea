use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Common error: {0}")]
    Eyre(#[from] eyre::Error),
    #[error("Mongo error: {0}")]
    MongoError(#[from] mongodb::error::Error),
    #[error("User not found: {0}")]
    UserNotFound(i64),
    #[error("Unknown product: {0}")]
    UnknownProduct(String),
    #[error("Invalid search query: {0}")]
    InvalidQuery(String),
}
