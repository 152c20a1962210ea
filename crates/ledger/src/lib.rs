use eyre::{eyre, Context as _, Result};
use model::errors::LedgerError;
use model::session::Session;
use model::user::{User, UserIdent};
use service::export::Export;
use service::purchases::Purchases;
use service::statistics::Statistics;
use service::users::Users;
use storage::session::Db;
use storage::Storage;

pub mod channel;
pub mod service;

#[derive(Clone)]
pub struct Ledger {
    pub db: Db,
    pub users: Users,
    pub purchases: Purchases,
    pub statistics: Statistics,
    pub export: Export,
}

impl Ledger {
    pub fn new(storage: Storage) -> Self {
        let users = Users::new(storage.users.clone());
        let purchases = Purchases::new(storage.purchases.clone(), storage.users.clone());
        let statistics = Statistics::new(storage.users.clone(), storage.purchases.clone());
        let export = Export::new(storage.users, storage.purchases);
        Ledger {
            db: storage.db,
            users,
            purchases,
            statistics,
            export,
        }
    }

    pub async fn get_user<ID: Into<UserIdent>>(
        &self,
        session: &mut Session,
        id: ID,
    ) -> Result<User> {
        let id: UserIdent = id.into();
        let user = match &id {
            UserIdent::TgId(tg_id) => self.users.get(session, *tg_id).await,
            UserIdent::UserName(name) => self.users.get_by_user_name(session, name).await,
        }
        .context("get_user")?;
        user.ok_or_else(|| match id {
            UserIdent::TgId(tg_id) => LedgerError::UserNotFound(tg_id).into(),
            UserIdent::UserName(name) => eyre!("User not found: @{}", name),
        })
    }

    /// Resolves an admin search query (`@handle` or numeric id).
    pub async fn find_user(&self, session: &mut Session, query: &str) -> Result<Option<User>> {
        let ident = UserIdent::parse(query)
            .ok_or_else(|| LedgerError::InvalidQuery(query.trim().to_owned()))?;
        match ident {
            UserIdent::TgId(tg_id) => self.users.get(session, tg_id).await,
            UserIdent::UserName(name) => self.users.get_by_user_name(session, &name).await,
        }
    }
}
