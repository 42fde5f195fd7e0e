//! Ledger write ops and wallet history.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};

use crate::{
    Currency, EngineError, Income, Outcome, ResultEngine, Transfer, Wallet, incomes, outcomes,
    transfers, util, wallets,
};

use super::{Engine, with_tx};

/// How a ledger entry touched the wallet a history listing is scoped to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryKind {
    Income,
    Outcome,
    TransferIn,
    TransferOut,
}

/// One row of a wallet's history, as seen from that wallet.
///
/// `signed_amount_minor` already carries the direction: positive for income
/// and incoming transfers, negative for outcome and outgoing transfers.
#[derive(Clone, Debug, Serialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub kind: LedgerEntryKind,
    pub signed_amount_minor: i64,
    pub currency: Currency,
    pub occurred_at: DateTime<Utc>,
    pub note: Option<String>,
    /// The other wallet of a transfer; `None` for income/outcome.
    pub counterparty_wallet_id: Option<Uuid>,
}

impl Engine {
    fn writable_wallet(wallet: &Wallet) -> ResultEngine<()> {
        if wallet.archived {
            return Err(EngineError::WalletArchived(wallet.name.clone()));
        }
        Ok(())
    }

    /// Records an income and bumps the wallet's running balance, atomically.
    ///
    /// The currency of the entry is the wallet's currency.
    pub async fn income(
        &self,
        user_id: &str,
        wallet_id: Uuid,
        amount_minor: i64,
        occurred_at: DateTime<Utc>,
        note: Option<&str>,
    ) -> ResultEngine<Uuid> {
        let note = util::normalize_optional_text(note);
        with_tx!(self, |db_tx| {
            let wallet = self.require_wallet(&db_tx, wallet_id, user_id).await?;
            Self::writable_wallet(&wallet)?;

            let entry = Income::new(wallet_id, amount_minor, wallet.currency, occurred_at, note)?;
            let mut model: incomes::ActiveModel = (&entry).into();
            model.user_id = ActiveValue::Set(user_id.to_string());
            model.insert(&db_tx).await?;

            let active = wallets::ActiveModel {
                id: ActiveValue::Set(wallet_id.to_string()),
                balance: ActiveValue::Set(wallet.balance + amount_minor),
                ..Default::default()
            };
            active.update(&db_tx).await?;

            Ok(entry.id)
        })
    }

    /// Records an outcome and bumps the wallet's running balance, atomically.
    ///
    /// Wallets may go negative; no funds check is performed.
    pub async fn outcome(
        &self,
        user_id: &str,
        wallet_id: Uuid,
        amount_minor: i64,
        occurred_at: DateTime<Utc>,
        note: Option<&str>,
    ) -> ResultEngine<Uuid> {
        let note = util::normalize_optional_text(note);
        with_tx!(self, |db_tx| {
            let wallet = self.require_wallet(&db_tx, wallet_id, user_id).await?;
            Self::writable_wallet(&wallet)?;

            let entry = Outcome::new(wallet_id, amount_minor, wallet.currency, occurred_at, note)?;
            let mut model: outcomes::ActiveModel = (&entry).into();
            model.user_id = ActiveValue::Set(user_id.to_string());
            model.insert(&db_tx).await?;

            let active = wallets::ActiveModel {
                id: ActiveValue::Set(wallet_id.to_string()),
                balance: ActiveValue::Set(wallet.balance - amount_minor),
                ..Default::default()
            };
            active.update(&db_tx).await?;

            Ok(entry.id)
        })
    }

    /// Records a transfer between two wallets of the same user and updates
    /// both running balances, atomically.
    ///
    /// Both wallets must share a currency; cross-currency transfers would
    /// need an exchange rate and are not supported.
    pub async fn transfer(
        &self,
        user_id: &str,
        from_wallet_id: Uuid,
        to_wallet_id: Uuid,
        amount_minor: i64,
        occurred_at: DateTime<Utc>,
        note: Option<&str>,
    ) -> ResultEngine<Uuid> {
        if from_wallet_id == to_wallet_id {
            return Err(EngineError::InvalidAmount(
                "from_wallet_id and to_wallet_id must differ".to_string(),
            ));
        }
        let note = util::normalize_optional_text(note);
        with_tx!(self, |db_tx| {
            let from = self.require_wallet(&db_tx, from_wallet_id, user_id).await?;
            let to = self.require_wallet(&db_tx, to_wallet_id, user_id).await?;
            Self::writable_wallet(&from)?;
            Self::writable_wallet(&to)?;
            util::ensure_wallet_currency(from.currency, to.currency)?;

            let entry = Transfer::new(
                from_wallet_id,
                to_wallet_id,
                amount_minor,
                from.currency,
                occurred_at,
                note,
            )?;
            let mut model: transfers::ActiveModel = (&entry).into();
            model.user_id = ActiveValue::Set(user_id.to_string());
            model.insert(&db_tx).await?;

            let debit = wallets::ActiveModel {
                id: ActiveValue::Set(from_wallet_id.to_string()),
                balance: ActiveValue::Set(from.balance - amount_minor),
                ..Default::default()
            };
            debit.update(&db_tx).await?;

            let credit = wallets::ActiveModel {
                id: ActiveValue::Set(to_wallet_id.to_string()),
                balance: ActiveValue::Set(to.balance + amount_minor),
                ..Default::default()
            };
            credit.update(&db_tx).await?;

            Ok(entry.id)
        })
    }

    /// Lists the ledger entries touching a wallet, newest first.
    ///
    /// Transfers appear once per side they touch on this wallet, with the
    /// sign of that side.
    pub async fn list_wallet_entries(
        &self,
        user_id: &str,
        wallet_id: Uuid,
        limit: usize,
    ) -> ResultEngine<Vec<LedgerEntry>> {
        with_tx!(self, |db_tx| {
            self.require_wallet(&db_tx, wallet_id, user_id).await?;
            let wallet_id_str = wallet_id.to_string();

            let income_models = incomes::Entity::find()
                .filter(incomes::Column::UserId.eq(user_id))
                .filter(incomes::Column::WalletId.eq(wallet_id_str.clone()))
                .all(&db_tx)
                .await?;
            let outcome_models = outcomes::Entity::find()
                .filter(outcomes::Column::UserId.eq(user_id))
                .filter(outcomes::Column::WalletId.eq(wallet_id_str.clone()))
                .all(&db_tx)
                .await?;
            let transfer_models = transfers::Entity::find()
                .filter(transfers::Column::UserId.eq(user_id))
                .filter(
                    transfers::Column::FromWalletId
                        .eq(wallet_id_str.clone())
                        .or(transfers::Column::ToWalletId.eq(wallet_id_str)),
                )
                .all(&db_tx)
                .await?;

            let mut out = Vec::new();
            for model in income_models {
                let entry = Income::try_from(model)?;
                out.push(LedgerEntry {
                    id: entry.id,
                    kind: LedgerEntryKind::Income,
                    signed_amount_minor: entry.amount_minor,
                    currency: entry.currency,
                    occurred_at: entry.occurred_at,
                    note: entry.note,
                    counterparty_wallet_id: None,
                });
            }
            for model in outcome_models {
                let entry = Outcome::try_from(model)?;
                out.push(LedgerEntry {
                    id: entry.id,
                    kind: LedgerEntryKind::Outcome,
                    signed_amount_minor: -entry.amount_minor,
                    currency: entry.currency,
                    occurred_at: entry.occurred_at,
                    note: entry.note,
                    counterparty_wallet_id: None,
                });
            }
            for model in transfer_models {
                let entry = Transfer::try_from(model)?;
                if entry.from_wallet_id == wallet_id {
                    out.push(LedgerEntry {
                        id: entry.id,
                        kind: LedgerEntryKind::TransferOut,
                        signed_amount_minor: -entry.amount_minor,
                        currency: entry.currency,
                        occurred_at: entry.occurred_at,
                        note: entry.note.clone(),
                        counterparty_wallet_id: Some(entry.to_wallet_id),
                    });
                }
                if entry.to_wallet_id == wallet_id {
                    out.push(LedgerEntry {
                        id: entry.id,
                        kind: LedgerEntryKind::TransferIn,
                        signed_amount_minor: entry.amount_minor,
                        currency: entry.currency,
                        occurred_at: entry.occurred_at,
                        note: entry.note,
                        counterparty_wallet_id: Some(entry.from_wallet_id),
                    });
                }
            }

            out.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
            out.truncate(limit);
            Ok(out)
        })
    }
}
