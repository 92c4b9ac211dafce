//! Structured audit record
//!
//! One record is emitted to the audit sink on every terminal outcome of a
//! transaction: success, failure, and tax-failure. Persistence and delivery
//! of records is the sink's concern, so the record is a plain serializable
//! value.

use crate::types::account::{AccountId, Currency};
use rust_decimal::Decimal;
use serde::Serialize;

/// Snapshot of a transaction's terminal outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferRecord {
    /// Whether the transaction as a whole succeeded
    pub success: bool,
    /// The debited account, if the transfer had a debit leg
    pub from: Option<AccountId>,
    /// The credited account, if the transfer had a credit leg
    pub to: Option<AccountId>,
    /// Currency the transfer was scoped to
    pub currency: Currency,
    /// Tax cut computed for this transfer
    pub tax: Decimal,
    /// Account the tax cut was destined for
    pub tax_account: Option<AccountId>,
    /// Gross amount requested
    pub amount: Decimal,
    /// Human-readable description of the most recent failure, if any
    pub error: Option<String>,
}
