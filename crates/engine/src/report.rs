//! Result types for a recalculation run.

use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::{EngineError, Income, Outcome, Transfer};

/// Outcome of one [`Engine::recalculate`](crate::Engine::recalculate) run.
///
/// `balances` maps every wallet id known at the start of the run to its
/// corrected balance in minor units. The remaining fields are diagnostics:
/// they never alter the computed balances.
#[derive(Debug, Default, Serialize)]
pub struct RecalculationReport {
    pub balances: HashMap<Uuid, i64>,
    pub orphans: OrphanReport,
    /// Rows that failed validation at the store boundary and were excluded
    /// from aggregation (unparseable id, unknown currency, non-positive
    /// amount). Their wallets keep the balance derived from the valid rows.
    pub invalid: Vec<InvalidRecord>,
    /// Per-wallet balance writes that failed. Other writes are not cancelled
    /// by a failure; the caller decides how severe a partial write is.
    pub write_failures: Vec<WriteFailure>,
}

impl RecalculationReport {
    /// `true` when every ledger row aggregated cleanly and every balance was
    /// persisted.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.orphans.is_empty() && self.invalid.is_empty() && self.write_failures.is_empty()
    }
}

/// Ledger entries referencing a wallet id that is not in the current wallet
/// set. Transfers can appear on either side (or both): each endpoint is
/// judged on its own.
#[derive(Debug, Default, Serialize)]
pub struct OrphanReport {
    pub incomes: Vec<Income>,
    pub outcomes: Vec<Outcome>,
    pub transfer_sources: Vec<Transfer>,
    pub transfer_destinations: Vec<Transfer>,
}

impl OrphanReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.incomes.is_empty()
            && self.outcomes.is_empty()
            && self.transfer_sources.is_empty()
            && self.transfer_destinations.is_empty()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.incomes.len()
            + self.outcomes.len()
            + self.transfer_sources.len()
            + self.transfer_destinations.len()
    }
}

/// A stored row quarantined during boundary validation.
#[derive(Debug, Serialize)]
pub struct InvalidRecord {
    /// Logical collection the row came from (`wallets`, `incomes`,
    /// `outcomes`, `transfers`).
    pub collection: &'static str,
    /// Raw primary key of the row, as stored.
    pub id: String,
    pub reason: String,
}

impl InvalidRecord {
    pub(crate) fn new(collection: &'static str, id: &str, reason: &EngineError) -> Self {
        Self {
            collection,
            id: id.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// A wallet whose corrected balance could not be written back.
#[derive(Debug, Serialize)]
pub struct WriteFailure {
    pub wallet_id: Uuid,
    pub reason: String,
}
