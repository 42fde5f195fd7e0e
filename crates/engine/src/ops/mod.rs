use sea_orm::{ConnectionTrait, DatabaseConnection, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, Wallet};

mod access;
mod recalculate;
mod statistics;
mod transactions;
mod wallets;

pub use statistics::CurrencyTotals;
pub use transactions::{LedgerEntry, LedgerEntryKind};

/// Run a block inside a DB transaction, committing on success and rolling
/// back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Entry point for every ledger operation.
///
/// Holds the injected database handle; construct it with
/// [`Engine::builder`]. The engine keeps no other state: every operation
/// reads what it needs from the store.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub(crate) async fn require_user<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &str,
    ) -> ResultEngine<crate::users::Model> {
        crate::users::Entity::find_by_id(user_id)
            .one(conn)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }

    /// Load a wallet by id, scoped to its owner.
    pub(crate) async fn require_wallet<C: ConnectionTrait>(
        &self,
        conn: &C,
        wallet_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Wallet> {
        let model = crate::wallets::Entity::find_by_id(wallet_id.to_string())
            .filter(crate::wallets::Column::UserId.eq(user_id))
            .one(conn)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("wallet not exists".to_string()))?;
        Wallet::try_from(model)
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}
