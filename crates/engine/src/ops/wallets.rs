use chrono::Utc;
use uuid::Uuid;

use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr};

use crate::{
    Currency, EngineError, Income, Outcome, ResultEngine, Wallet, incomes, outcomes, util, wallets,
};

use super::{Engine, with_tx};

impl Engine {
    /// Return a wallet snapshot from DB.
    pub async fn wallet(&self, wallet_id: Uuid, user_id: &str) -> ResultEngine<Wallet> {
        with_tx!(self, |db_tx| {
            let wallet = self.require_wallet(&db_tx, wallet_id, user_id).await?;
            Ok(wallet)
        })
    }

    /// Lists the user's wallets, alphabetically. Archived wallets are
    /// included only on request.
    pub async fn list_wallets(
        &self,
        user_id: &str,
        include_archived: bool,
    ) -> ResultEngine<Vec<Wallet>> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;

            let mut query = wallets::Entity::find()
                .filter(wallets::Column::UserId.eq(user_id))
                .order_by_asc(wallets::Column::Name);
            if !include_archived {
                query = query.filter(wallets::Column::Archived.eq(false));
            }

            let models = query.all(&db_tx).await?;
            let mut out = Vec::with_capacity(models.len());
            for model in models {
                out.push(Wallet::try_from(model)?);
            }
            Ok(out)
        })
    }

    /// Add a new wallet for a user.
    ///
    /// `opening_balance_minor` is modeled as an opening ledger entry (an
    /// income when positive, an outcome when negative) so the running
    /// counter stays derivable from the ledger and recalculation preserves
    /// it. The opening entry uses `Utc::now()` as `occurred_at`.
    pub async fn new_wallet(
        &self,
        user_id: &str,
        name: &str,
        currency: Currency,
        opening_balance_minor: i64,
    ) -> ResultEngine<Uuid> {
        let occurred_at = Utc::now();
        let name = util::normalize_required_name(name, "wallet")?;
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;

            let exists = wallets::Entity::find()
                .filter(wallets::Column::UserId.eq(user_id))
                .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(name));
            }

            let wallet = Wallet::new(name.clone(), opening_balance_minor, currency);
            let wallet_id = wallet.id;
            let mut wallet_model: wallets::ActiveModel = (&wallet).into();
            wallet_model.user_id = ActiveValue::Set(user_id.to_string());
            wallet_model.insert(&db_tx).await?;

            if opening_balance_minor != 0 {
                let note = Some(format!("opening balance for wallet '{name}'"));
                if opening_balance_minor > 0 {
                    let entry = Income::new(
                        wallet_id,
                        opening_balance_minor,
                        currency,
                        occurred_at,
                        note,
                    )?;
                    let mut model: incomes::ActiveModel = (&entry).into();
                    model.user_id = ActiveValue::Set(user_id.to_string());
                    model.insert(&db_tx).await?;
                } else {
                    let entry = Outcome::new(
                        wallet_id,
                        -opening_balance_minor,
                        currency,
                        occurred_at,
                        note,
                    )?;
                    let mut model: outcomes::ActiveModel = (&entry).into();
                    model.user_id = ActiveValue::Set(user_id.to_string());
                    model.insert(&db_tx).await?;
                }
            }

            Ok(wallet_id)
        })
    }

    /// Renames an existing wallet.
    pub async fn rename_wallet(
        &self,
        wallet_id: Uuid,
        new_name: &str,
        user_id: &str,
    ) -> ResultEngine<()> {
        let new_name = util::normalize_required_name(new_name, "wallet")?;
        with_tx!(self, |db_tx| {
            self.require_wallet(&db_tx, wallet_id, user_id).await?;

            let exists = wallets::Entity::find()
                .filter(wallets::Column::UserId.eq(user_id))
                .filter(Expr::cust("LOWER(name)").eq(new_name.to_lowercase()))
                .filter(wallets::Column::Id.ne(wallet_id.to_string()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(new_name));
            }

            let active = wallets::ActiveModel {
                id: ActiveValue::Set(wallet_id.to_string()),
                name: ActiveValue::Set(new_name),
                ..Default::default()
            };
            active.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Archives/unarchives an existing wallet.
    ///
    /// Archived wallets refuse new ledger entries but keep their history and
    /// are still recalculated.
    pub async fn set_wallet_archived(
        &self,
        wallet_id: Uuid,
        archived: bool,
        user_id: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_wallet(&db_tx, wallet_id, user_id).await?;

            let active = wallets::ActiveModel {
                id: ActiveValue::Set(wallet_id.to_string()),
                archived: ActiveValue::Set(archived),
                ..Default::default()
            };
            active.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Hard-deletes a wallet.
    ///
    /// Ledger entries referencing it are intentionally left in place (the
    /// ledger has no foreign key to wallets); they surface as orphans in the
    /// next recalculation report.
    pub async fn delete_wallet(&self, wallet_id: Uuid, user_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_wallet(&db_tx, wallet_id, user_id).await?;
            wallets::Entity::delete_by_id(wallet_id.to_string())
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }
}
