//! Collaborator contracts consumed and produced by the engine
//!
//! This module defines the trait abstractions at the engine's seams: the
//! external ledger backend the engine mutates, and the audit sink it reports
//! terminal outcomes to. Implementations plug in via dependency injection on
//! [`Transaction`](crate::core::Transaction) construction.

use crate::types::{AccountId, LedgerError, TransferRecord};
use rust_decimal::Decimal;

/// External account-balance store
///
/// The ledger is not transactional: each call either fully applies or fails,
/// and there is no locking across calls. Failures are reported as ordinary
/// [`LedgerError`] values carrying the backend's own description; a backend
/// fault must never unwind through the engine.
///
/// Implementations are expected to serialize concurrent mutations to the
/// same account themselves; the engine provides no mutual exclusion.
pub trait Ledger: Send + Sync {
    /// Backend name for logging and diagnostics
    fn name(&self) -> &str;

    /// Current balance of an account under a partition and currency
    fn balance(
        &self,
        account: AccountId,
        partition: &str,
        currency: Option<&str>,
    ) -> Result<Decimal, LedgerError>;

    /// Debit an account
    fn withdraw(
        &self,
        account: AccountId,
        amount: Decimal,
        partition: &str,
        currency: Option<&str>,
    ) -> Result<(), LedgerError>;

    /// Credit an account
    fn deposit(
        &self,
        account: AccountId,
        amount: Decimal,
        partition: &str,
        currency: Option<&str>,
    ) -> Result<(), LedgerError>;

    /// Pre-warm any balance cache the backend keeps for this account
    ///
    /// Some backends cache balances and only refresh on read; warming the
    /// cache before and after a transfer works around stale reads. The
    /// default implementation does nothing and backends may ignore the hint.
    fn warm_cache(&self, account: AccountId, partition: &str, currency: Option<&str>) {
        let _ = (account, partition, currency);
    }
}

/// Destination for structured transfer records
///
/// The engine emits one [`TransferRecord`] per terminal outcome (success,
/// failure, tax-failure). Durability and delivery guarantees are the sink's
/// responsibility, not the engine's.
pub trait AuditSink: Send + Sync {
    /// Accept one terminal-outcome record
    fn record(&self, record: TransferRecord);
}

/// Sink that discards every record
///
/// Useful for embedders that do their own reporting through the outcome
/// handler and for tests that don't assert on audit output.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _record: TransferRecord) {}
}
