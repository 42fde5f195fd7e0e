//! Ledger engine for Saldo.
//!
//! The engine owns the typed data model (wallets plus the income / outcome /
//! transfer ledger) and every operation on it. The centerpiece is
//! [`Engine::recalculate`], which rebuilds each wallet balance of a user from
//! the full ledger instead of trusting the denormalized running counter, and
//! reports dangling references ("orphans") as diagnostics.

pub use currency::Currency;
pub use error::EngineError;
pub use incomes::Income;
pub use money::Money;
pub use ops::{CurrencyTotals, Engine, EngineBuilder, LedgerEntry, LedgerEntryKind};
pub use outcomes::Outcome;
pub use report::{InvalidRecord, OrphanReport, RecalculationReport, WriteFailure};
pub use transfers::Transfer;
pub use wallets::Wallet;

mod currency;
mod error;
mod incomes;
mod money;
mod ops;
mod outcomes;
mod report;
mod transfers;
mod users;
mod util;
mod wallets;

pub(crate) type ResultEngine<T> = Result<T, EngineError>;
