//! User management (ownership scoping only; no authentication).

use sea_orm::{ActiveValue, QueryOrder, TransactionTrait, prelude::*};

use crate::{EngineError, ResultEngine, users, util};

use super::{Engine, with_tx};

impl Engine {
    /// Creates a user. Usernames are the scoping key for wallets and ledger
    /// entries.
    pub async fn create_user(&self, username: &str) -> ResultEngine<()> {
        let username = util::normalize_required_name(username, "user")?;
        with_tx!(self, |db_tx| {
            let exists = users::Entity::find_by_id(username.clone())
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(username));
            }

            let model = users::ActiveModel {
                username: ActiveValue::Set(username),
            };
            model.insert(&db_tx).await?;
            Ok(())
        })
    }

    /// Lists all usernames, alphabetically.
    pub async fn list_users(&self) -> ResultEngine<Vec<String>> {
        let models = users::Entity::find()
            .order_by_asc(users::Column::Username)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(|m| m.username).collect())
    }
}
