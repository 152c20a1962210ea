use bson::{to_bson, Document};
use chrono::{DateTime, Utc};
use eyre::Result;
use futures_util::stream::TryStreamExt;
use log::{info, warn};
use model::session::Session;
use model::user::{User, UserName};
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{
    bson::{doc, oid::ObjectId},
    Collection, Database, IndexModel,
};

const COLLECTION: &str = "users";

pub struct UserStore {
    pub(crate) users: Collection<User>,
}

impl UserStore {
    pub(crate) async fn new(db: &Database) -> Result<Self> {
        let users = db.collection(COLLECTION);
        users
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "tg_id": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
            )
            .await?;
        users
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "name.tg_user_name": 1 })
                    .build(),
            )
            .await?;
        users
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "subscription_until": 1, "is_in_channel": 1 })
                    .build(),
            )
            .await?;
        Ok(UserStore { users })
    }

    pub async fn get_by_tg_id(&self, session: &mut Session, tg_id: i64) -> Result<Option<User>> {
        Ok(self
            .users
            .find_one(doc! { "tg_id": tg_id })
            .session(&mut *session)
            .await?)
    }

    pub async fn get_by_user_name(
        &self,
        session: &mut Session,
        user_name: &str,
    ) -> Result<Option<User>> {
        Ok(self
            .users
            .find_one(doc! { "name.tg_user_name": user_name })
            .session(&mut *session)
            .await?)
    }

    /// Creates the user on first contact, refreshes the profile afterwards.
    pub async fn upsert(
        &self,
        session: &mut Session,
        tg_id: i64,
        name: &UserName,
        now: DateTime<Utc>,
    ) -> Result<User> {
        let mut update = user_update(session.actor(), now, doc! { "name": to_bson(name)? });
        update.insert(
            "$setOnInsert",
            doc! {
                "_id": ObjectId::new(),
                "is_in_channel": false,
                "created_at": now,
            },
        );
        let user = self
            .users
            .find_one_and_update(doc! { "tg_id": tg_id }, update)
            .upsert(true)
            .return_document(ReturnDocument::After)
            .session(&mut *session)
            .await?;
        user.ok_or_else(|| eyre::eyre!("Upsert returned no document for {}", tg_id))
    }

    /// Returns false when there is no such user.
    pub async fn set_in_channel(
        &self,
        session: &mut Session,
        tg_id: i64,
        is_in_channel: bool,
    ) -> Result<bool> {
        let result = self
            .users
            .update_one(
                doc! { "tg_id": tg_id },
                user_update(
                    session.actor(),
                    Utc::now(),
                    doc! { "is_in_channel": is_in_channel },
                ),
            )
            .session(&mut *session)
            .await?;
        if result.matched_count == 0 {
            warn!("User {} not found while setting channel flag", tg_id);
            return Ok(false);
        }
        info!("Channel flag for {} set to {}", tg_id, is_in_channel);
        Ok(true)
    }

    pub async fn set_subscription_until(
        &self,
        session: &mut Session,
        tg_id: i64,
        until: DateTime<Utc>,
    ) -> Result<bool> {
        info!("Setting subscription for {} until {}", tg_id, until);
        let result = self
            .users
            .update_one(
                doc! { "tg_id": tg_id },
                user_update(
                    session.actor(),
                    Utc::now(),
                    doc! { "subscription_until": until },
                ),
            )
            .session(&mut *session)
            .await?;
        Ok(result.matched_count > 0)
    }

    pub async fn find_expired_in_channel(
        &self,
        session: &mut Session,
        now: DateTime<Utc>,
    ) -> Result<Vec<User>> {
        let mut cursor = self
            .users
            .find(expired_in_channel_filter(now))
            .session(&mut *session)
            .await?;
        Ok(cursor.stream(&mut *session).try_collect().await?)
    }

    pub async fn find_active(&self, session: &mut Session, now: DateTime<Utc>) -> Result<Vec<User>> {
        let mut cursor = self
            .users
            .find(doc! { "subscription_until": { "$gt": now } })
            .sort(doc! { "subscription_until": 1 })
            .session(&mut *session)
            .await?;
        Ok(cursor.stream(&mut *session).try_collect().await?)
    }

    /// Newest first.
    pub async fn find_all(&self, session: &mut Session) -> Result<Vec<User>> {
        let mut cursor = self
            .users
            .find(doc! {})
            .sort(doc! { "created_at": -1 })
            .session(&mut *session)
            .await?;
        Ok(cursor.stream(&mut *session).try_collect().await?)
    }

    pub async fn find_recent(&self, session: &mut Session, limit: i64) -> Result<Vec<User>> {
        let mut cursor = self
            .users
            .find(doc! {})
            .sort(doc! { "created_at": -1 })
            .limit(limit)
            .session(&mut *session)
            .await?;
        Ok(cursor.stream(&mut *session).try_collect().await?)
    }

    pub async fn count(&self, session: &mut Session) -> Result<u64> {
        Ok(self
            .users
            .count_documents(doc! {})
            .session(&mut *session)
            .await?)
    }

    pub async fn count_active(&self, session: &mut Session, now: DateTime<Utc>) -> Result<u64> {
        Ok(self
            .users
            .count_documents(doc! { "subscription_until": { "$gt": now } })
            .session(&mut *session)
            .await?)
    }

    pub async fn count_in_channel(&self, session: &mut Session) -> Result<u64> {
        Ok(self
            .users
            .count_documents(doc! { "is_in_channel": true })
            .session(&mut *session)
            .await?)
    }

    pub async fn count_expired_in_channel(
        &self,
        session: &mut Session,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        Ok(self
            .users
            .count_documents(expired_in_channel_filter(now))
            .session(&mut *session)
            .await?)
    }
}

/// `$set` of `fields` stamped with the actor and time of the change.
fn user_update(actor: i64, now: DateTime<Utc>, mut fields: Document) -> Document {
    fields.insert("updated_at", now);
    fields.insert("updated_by", actor);
    doc! {
        "$set": fields,
        "$inc": { "version": 1 },
    }
}

fn expired_in_channel_filter(now: DateTime<Utc>) -> Document {
    doc! {
        "subscription_until": { "$lte": now },
        "is_in_channel": true,
    }
}
