//! Ledger-derived balance reconciliation.
//!
//! Every wallet carries a denormalized running balance maintained by the
//! write ops. This module rebuilds those balances from scratch out of the
//! full ledger (incomes + outcomes + transfers) and patches the corrected
//! values back, so a drifted or corrupted counter never survives a run.

use std::collections::HashMap;

use sea_orm::{ActiveValue, DbErr, QueryFilter, prelude::*};
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::{
    EngineError, Income, Outcome, ResultEngine, Transfer,
    incomes, outcomes,
    report::{InvalidRecord, OrphanReport, RecalculationReport, WriteFailure},
    transfers, util, wallets,
};

use super::Engine;

/// Scoped acquisition/release for a caller-supplied loading flag.
///
/// Flips the flag on when constructed and off when dropped, so the flag is
/// cleared on every exit path, early `?` returns included.
struct LoadingGuard<'a, F: FnMut(bool)> {
    set_loading: &'a mut F,
}

impl<'a, F: FnMut(bool)> LoadingGuard<'a, F> {
    fn acquire(set_loading: &'a mut F) -> Self {
        set_loading(true);
        Self { set_loading }
    }
}

impl<F: FnMut(bool)> Drop for LoadingGuard<'_, F> {
    fn drop(&mut self) {
        (self.set_loading)(false);
    }
}

impl Engine {
    /// Rebuilds the balance of every wallet owned by `user_id` from the full
    /// ledger and writes the corrected values back.
    ///
    /// The previously stored balances are overwritten, never merged: a
    /// wallet with no ledger entries ends at 0 regardless of its counter.
    /// Re-running against an unchanged ledger yields identical balances.
    ///
    /// Ledger rows referencing unknown wallets are collected as orphans and
    /// rows failing boundary validation are quarantined; neither affects any
    /// computed balance. See [`RecalculationReport`].
    ///
    /// Errors: an unknown `user_id` is rejected before anything is fetched.
    /// A failed fetch of any of the four collections aborts the run
    /// before any write. A failed balance write does not cancel the others;
    /// failures are reported per wallet in
    /// [`RecalculationReport::write_failures`]. No retries are performed.
    pub async fn recalculate(&self, user_id: &str) -> ResultEngine<RecalculationReport> {
        self.recalculate_with_progress(user_id, |_| {}).await
    }

    /// Same as [`Engine::recalculate`], with a loading callback for UI
    /// callers: invoked with `true` before the fetch phase and with `false`
    /// once the run finishes, on success and failure alike.
    pub async fn recalculate_with_progress<F>(
        &self,
        user_id: &str,
        mut set_loading: F,
    ) -> ResultEngine<RecalculationReport>
    where
        F: FnMut(bool),
    {
        let _loading = LoadingGuard::acquire(&mut set_loading);

        self.require_user(&self.database, user_id).await?;

        // All four collections are fetched concurrently; aggregation starts
        // only once every fetch has resolved.
        let (wallet_models, income_models, outcome_models, transfer_models) = tokio::try_join!(
            wallets::Entity::find()
                .filter(wallets::Column::UserId.eq(user_id))
                .all(&self.database),
            incomes::Entity::find()
                .filter(incomes::Column::UserId.eq(user_id))
                .all(&self.database),
            outcomes::Entity::find()
                .filter(outcomes::Column::UserId.eq(user_id))
                .all(&self.database),
            transfers::Entity::find()
                .filter(transfers::Column::UserId.eq(user_id))
                .all(&self.database),
        )?;

        let mut invalid: Vec<InvalidRecord> = Vec::new();

        // Seed 0 for every wallet known at this point, archived ones
        // included. The key set doubles as the authoritative wallet-id set
        // against which orphans are detected.
        let mut balances: HashMap<Uuid, i64> = HashMap::with_capacity(wallet_models.len());
        for model in &wallet_models {
            match util::parse_uuid(&model.id, "wallet") {
                Ok(id) => {
                    balances.insert(id, 0);
                }
                Err(err) => invalid.push(InvalidRecord::new("wallets", &model.id, &err)),
            }
        }

        let mut orphans = OrphanReport::default();

        for model in income_models {
            let row_id = model.id.clone();
            match Income::try_from(model) {
                Ok(entry) => match balances.get_mut(&entry.wallet_id) {
                    Some(total) => *total += entry.amount_minor,
                    None => orphans.incomes.push(entry),
                },
                Err(err) => invalid.push(InvalidRecord::new("incomes", &row_id, &err)),
            }
        }

        for model in outcome_models {
            let row_id = model.id.clone();
            match Outcome::try_from(model) {
                Ok(entry) => match balances.get_mut(&entry.wallet_id) {
                    Some(total) => *total -= entry.amount_minor,
                    None => orphans.outcomes.push(entry),
                },
                Err(err) => invalid.push(InvalidRecord::new("outcomes", &row_id, &err)),
            }
        }

        for model in transfer_models {
            let row_id = model.id.clone();
            match Transfer::try_from(model) {
                Ok(entry) => {
                    // Each endpoint stands on its own: a transfer with one
                    // dangling side still applies on the valid side.
                    match balances.get_mut(&entry.from_wallet_id) {
                        Some(total) => *total -= entry.amount_minor,
                        None => orphans.transfer_sources.push(entry.clone()),
                    }
                    match balances.get_mut(&entry.to_wallet_id) {
                        Some(total) => *total += entry.amount_minor,
                        None => orphans.transfer_destinations.push(entry),
                    }
                }
                Err(err) => invalid.push(InvalidRecord::new("transfers", &row_id, &err)),
            }
        }

        // Patch corrected balances back, one concurrent write per wallet.
        // A failed write leaves the remaining writes running; the run waits
        // for all of them to settle either way.
        let mut writes: JoinSet<(Uuid, Result<wallets::Model, DbErr>)> = JoinSet::new();
        for (&wallet_id, &balance) in &balances {
            let database = self.database.clone();
            writes.spawn(async move {
                let model = wallets::ActiveModel {
                    id: ActiveValue::Set(wallet_id.to_string()),
                    balance: ActiveValue::Set(balance),
                    ..Default::default()
                };
                (wallet_id, model.update(&database).await)
            });
        }

        let mut write_failures: Vec<WriteFailure> = Vec::new();
        while let Some(joined) = writes.join_next().await {
            match joined {
                Ok((_, Ok(_))) => {}
                Ok((wallet_id, Err(err))) => write_failures.push(WriteFailure {
                    wallet_id,
                    reason: err.to_string(),
                }),
                Err(join_err) => {
                    return Err(EngineError::Database(DbErr::Custom(format!(
                        "balance write task failed: {join_err}"
                    ))));
                }
            }
        }

        if !orphans.is_empty() || !invalid.is_empty() {
            tracing::warn!(
                user_id,
                income_orphans = orphans.incomes.len(),
                outcome_orphans = orphans.outcomes.len(),
                transfer_source_orphans = orphans.transfer_sources.len(),
                transfer_destination_orphans = orphans.transfer_destinations.len(),
                invalid_rows = invalid.len(),
                "ledger rows reference unknown wallets or failed validation; balances unaffected"
            );
        }

        Ok(RecalculationReport {
            balances,
            orphans,
            invalid,
            write_failures,
        })
    }
}
