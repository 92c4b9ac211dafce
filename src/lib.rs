//! Economy Transfer Engine Library
//! # Overview
//!
//! This library moves currency between two accounts with an optional tax cut
//! to a third account, on top of an external ledger that offers no native
//! transactions. Atomicity is approximated with a compensating-action log:
//! each operation that actually mutated the ledger is recorded, and a failed
//! commit unwinds the recorded effects in reverse order (fail-safe commit).
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (parties, transfer spec, audit record, errors)
//! - [`core`] - Business logic components:
//!   - [`core::transaction`] - Commit/rollback orchestration
//!   - [`core::operation`] - Reversible ledger mutations
//!   - [`core::traits`] - Ledger backend and audit sink contracts
//!   - [`core::engine`] - Blocking-offload facade over tokio
//!   - [`core::memory`] - In-memory collaborators for tests and embedders
//!
//! # Commit Protocol
//!
//! A commit runs up to three legs, strictly in order:
//!
//! - **Withdraw**: debit the gross amount from the source
//! - **Deposit**: credit the after-tax amount to the destination
//! - **Tax deposit**: credit the tax cut to the tax account (best-effort;
//!   its failure never reverses the primary transfer)
//!
//! A pre-commit policy hook can veto the transaction before any leg runs,
//! and a balance check rejects transfers the source cannot cover unless
//! loans are allowed. On a primary-leg failure, `fail_safe_commit` rolls the
//! committed legs back most-recent-first.

// Module declarations
pub mod core;
pub mod types;

pub use crate::core::{
    AuditSink, Ledger, MemoryAuditSink, MemoryLedger, NullAuditSink, Operation, OperationKind,
    RollbackReport, Transaction, TransferConfig, TransferEngine, TransferOutcome,
};
pub use crate::types::{
    split_tax, AccountId, Currency, LedgerError, Parties, Partition, TransferError,
    TransferRecord, TransferSpec,
};
