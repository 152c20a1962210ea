use std::sync::Arc;

use chrono::{DateTime, Utc};
use eyre::Result;
use model::{
    session::Session,
    user::{User, UserName},
};
use storage::user::UserStore;

#[derive(Clone)]
pub struct Users {
    store: Arc<UserStore>,
}

impl Users {
    pub(crate) fn new(store: Arc<UserStore>) -> Self {
        Users { store }
    }

    pub async fn get(&self, session: &mut Session, tg_id: i64) -> Result<Option<User>> {
        self.store.get_by_tg_id(session, tg_id).await
    }

    pub async fn get_by_user_name(
        &self,
        session: &mut Session,
        user_name: &str,
    ) -> Result<Option<User>> {
        self.store.get_by_user_name(session, user_name).await
    }

    pub async fn upsert(&self, session: &mut Session, tg_id: i64, name: &UserName) -> Result<User> {
        self.store.upsert(session, tg_id, name, Utc::now()).await
    }

    pub async fn set_in_channel(
        &self,
        session: &mut Session,
        tg_id: i64,
        is_in_channel: bool,
    ) -> Result<bool> {
        self.store.set_in_channel(session, tg_id, is_in_channel).await
    }

    pub async fn expired_in_channel(
        &self,
        session: &mut Session,
        now: DateTime<Utc>,
    ) -> Result<Vec<User>> {
        self.store.find_expired_in_channel(session, now).await
    }

    pub async fn active(&self, session: &mut Session, now: DateTime<Utc>) -> Result<Vec<User>> {
        self.store.find_active(session, now).await
    }

    pub async fn recent(&self, session: &mut Session, limit: i64) -> Result<Vec<User>> {
        self.store.find_recent(session, limit).await
    }

    pub async fn all(&self, session: &mut Session) -> Result<Vec<User>> {
        self.store.find_all(session).await
    }
}
