//! Core business logic module
//!
//! This module contains the transaction engine components:
//! - `traits` - Collaborator contracts (ledger backend, audit sink)
//! - `operation` - Reversible ledger mutations with idempotency guards
//! - `transaction` - Commit/rollback orchestration over the operation log
//! - `engine` - Blocking-offload facade for latency-sensitive callers
//! - `memory` - In-memory collaborator implementations

pub mod engine;
pub mod memory;
pub mod operation;
pub mod traits;
pub mod transaction;

pub use engine::TransferEngine;
pub use memory::{MemoryAuditSink, MemoryLedger};
pub use operation::{Operation, OperationKind};
pub use traits::{AuditSink, Ledger, NullAuditSink};
pub use transaction::{RollbackReport, Transaction, TransferConfig, TransferOutcome};
