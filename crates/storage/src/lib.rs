pub mod purchase;
pub mod session;
pub mod user;

use std::sync::Arc;

use eyre::Result;
use purchase::PurchaseStore;
use session::Db;
use user::UserStore;

const DB_NAME: &str = "channel_subs_db";

#[derive(Clone)]
pub struct Storage {
    pub db: Db,
    pub users: Arc<UserStore>,
    pub purchases: Arc<PurchaseStore>,
}

impl Storage {
    pub async fn new(uri: &str) -> Result<Self> {
        let db = Db::new(uri, DB_NAME).await?;
        let users = UserStore::new(&db).await?;
        let purchases = PurchaseStore::new(&db).await?;

        Ok(Storage {
            db,
            users: Arc::new(users),
            purchases: Arc::new(purchases),
        })
    }
}
