use bson::Document;
use chrono::{DateTime, Utc};
use eyre::{Error, Result};
use futures_util::stream::TryStreamExt;
use log::info;
use model::purchase::{Purchase, Revenue};
use model::session::Session;
use mongodb::options::IndexOptions;
use mongodb::{bson::doc, Collection, Database, IndexModel};

const COLLECTION: &str = "purchases";

pub struct PurchaseStore {
    store: Collection<Purchase>,
}

impl PurchaseStore {
    pub(crate) async fn new(db: &Database) -> Result<Self, Error> {
        let store = db.collection(COLLECTION);
        store
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "telegram_payment_charge_id": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
            )
            .await?;
        store
            .create_index(IndexModel::builder().keys(doc! { "user_id": 1 }).build())
            .await?;
        store
            .create_index(IndexModel::builder().keys(doc! { "created_at": -1 }).build())
            .await?;
        Ok(PurchaseStore { store })
    }

    pub async fn insert(&self, session: &mut Session, purchase: &Purchase) -> Result<()> {
        info!("Recording purchase: {:?}", purchase);
        self.store.insert_one(purchase).session(&mut *session).await?;
        Ok(())
    }

    pub async fn get_by_charge_id(
        &self,
        session: &mut Session,
        charge_id: &str,
    ) -> Result<Option<Purchase>> {
        Ok(self
            .store
            .find_one(doc! { "telegram_payment_charge_id": charge_id })
            .session(&mut *session)
            .await?)
    }

    /// Oldest first.
    pub async fn find_by_user(&self, session: &mut Session, user_id: i64) -> Result<Vec<Purchase>> {
        let mut cursor = self
            .store
            .find(doc! { "user_id": user_id })
            .sort(doc! { "created_at": 1 })
            .session(&mut *session)
            .await?;
        Ok(cursor.stream(&mut *session).try_collect().await?)
    }

    pub async fn find_recent(&self, session: &mut Session, limit: i64) -> Result<Vec<Purchase>> {
        let mut cursor = self
            .store
            .find(doc! {})
            .sort(doc! { "created_at": -1 })
            .limit(limit)
            .session(&mut *session)
            .await?;
        Ok(cursor.stream(&mut *session).try_collect().await?)
    }

    pub async fn find_all(&self, session: &mut Session) -> Result<Vec<Purchase>> {
        let mut cursor = self
            .store
            .find(doc! {})
            .sort(doc! { "created_at": -1 })
            .session(&mut *session)
            .await?;
        Ok(cursor.stream(&mut *session).try_collect().await?)
    }

    pub async fn count_by_user(&self, session: &mut Session, user_id: i64) -> Result<u64> {
        Ok(self
            .store
            .count_documents(doc! { "user_id": user_id })
            .session(&mut *session)
            .await?)
    }

    pub async fn revenue(&self, session: &mut Session) -> Result<Revenue> {
        self.sum(session, doc! {}).await
    }

    pub async fn revenue_between(
        &self,
        session: &mut Session,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Revenue> {
        self.sum(
            session,
            doc! { "created_at": { "$gte": from, "$lt": to } },
        )
        .await
    }

    async fn sum(&self, session: &mut Session, filter: Document) -> Result<Revenue> {
        let pipeline = vec![
            doc! { "$match": filter },
            doc! {
                "$group": {
                    "_id": null,
                    "amount": { "$sum": "$amount" },
                    "count": { "$sum": 1 },
                }
            },
        ];
        let mut cursor = self
            .store
            .aggregate(pipeline)
            .session(&mut *session)
            .await?;
        let row = match cursor.next(&mut *session).await {
            Some(row) => row?,
            None => return Ok(Revenue::default()),
        };
        Ok(Revenue {
            amount: number(&row, "amount"),
            count: number(&row, "count").max(0) as u64,
        })
    }
}

fn number(row: &Document, key: &str) -> i64 {
    match row.get(key) {
        Some(bson::Bson::Int32(value)) => *value as i64,
        Some(bson::Bson::Int64(value)) => *value,
        Some(bson::Bson::Double(value)) => *value as i64,
        _ => 0,
    }
}
