//! Blocking-offload transfer facade
//!
//! This module provides the `TransferEngine`, an execution context that runs
//! transactions off the caller's critical path. The [`Transaction`] itself is
//! synchronous and blocks on however long the ledger backend takes; game
//! loops and other latency-sensitive callers should not pay that cost, so
//! the engine hands each fail-safe commit to tokio's blocking thread pool.
//!
//! # Architecture
//!
//! ```text
//! TransferEngine
//!     ├── Arc<dyn Ledger>     (shared account-balance backend)
//!     ├── Arc<dyn AuditSink>  (shared terminal-outcome sink)
//!     └── TransferConfig
//! ```
//!
//! # Thread Safety
//!
//! The engine is cloneable and safe to share across tasks. Transfers spawned
//! concurrently are independent transactions; the engine adds no
//! coordination between them beyond what the ledger backend provides.

use crate::core::traits::{AuditSink, Ledger};
use crate::core::transaction::{Transaction, TransferConfig};
use crate::types::{TransferError, TransferRecord, TransferSpec};
use std::sync::Arc;

/// Runs fail-safe commits on a blocking-tolerant execution context
#[derive(Clone)]
pub struct TransferEngine {
    ledger: Arc<dyn Ledger>,
    sink: Arc<dyn AuditSink>,
    config: TransferConfig,
}

impl TransferEngine {
    /// Create a new TransferEngine
    ///
    /// # Arguments
    ///
    /// * `ledger` - The account-balance backend all transfers mutate
    /// * `sink` - Receiver of terminal-outcome records
    /// * `config` - Flags applied to every transaction
    pub fn new(
        ledger: Arc<dyn Ledger>,
        sink: Arc<dyn AuditSink>,
        config: TransferConfig,
    ) -> Self {
        Self {
            ledger,
            sink,
            config,
        }
    }

    /// Construct a transaction for callers that drive commit themselves
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransaction` for a spec the engine cannot accept; see
    /// [`Transaction::new`].
    pub fn transaction(&self, spec: TransferSpec) -> Result<Transaction, TransferError> {
        Transaction::new(
            spec,
            self.ledger.clone(),
            self.sink.clone(),
            self.config,
        )
    }

    /// Run one fail-safe transfer off the caller's thread
    ///
    /// Validates the spec, then executes `fail_safe_commit` on tokio's
    /// blocking pool: on any commit failure, every committed leg is rolled
    /// back best-effort before the error is returned.
    ///
    /// # Returns
    ///
    /// The success audit record for the completed transfer, mirroring what
    /// the sink received.
    ///
    /// # Errors
    ///
    /// Returns the construction or commit error. The rollback a failure
    /// triggers is best-effort and already reflected in the ledger by the
    /// time this returns.
    pub async fn transfer(&self, spec: TransferSpec) -> Result<TransferRecord, TransferError> {
        let mut transaction = self.transaction(spec)?;

        let task = tokio::task::spawn_blocking(move || {
            let result = transaction.fail_safe_commit();
            (transaction, result)
        });

        match task.await {
            Ok((transaction, result)) => result.map(|()| TransferRecord {
                success: true,
                from: transaction.source(),
                to: transaction.destination(),
                currency: transaction.currency().map(str::to_string),
                tax: transaction.tax(),
                tax_account: transaction.tax_account(),
                amount: transaction.amount(),
                error: transaction.last_error().map(str::to_string),
            }),
            // The transfer closure only unwinds on a programming error
            // (e.g. an operation committed twice); resurface it unchanged.
            Err(join_error) => std::panic::resume_unwind(join_error.into_panic()),
        }
    }
}
