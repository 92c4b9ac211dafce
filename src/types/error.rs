//! Error types for the economy transfer engine
//!
//! This module defines the error values returned by transaction commit and by
//! the ledger backend contract.
//!
//! # Error Categories
//!
//! - **Construction Errors**: invalid parties, amounts, or tax rates;
//!   caller bugs surfaced before the ledger is ever touched.
//! - **Policy Errors**: a pre-commit hook declined the transaction.
//! - **Business Failures**: insufficient balance, a ledger leg that failed.
//!
//! Double-commit and rollback-before-commit are deliberately *not*
//! represented here: they are programming errors and panic instead of being
//! returned as recoverable values.

use crate::types::account::AccountId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Failure description from the ledger backend
///
/// The ledger contract reports failures as ordinary values carrying the
/// backend's own human-readable description; backend faults never unwind
/// through the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct LedgerError {
    /// The backend's description of what went wrong
    pub message: String,
}

impl LedgerError {
    /// Create a new LedgerError from any printable description
    pub fn new(message: impl Into<String>) -> Self {
        LedgerError {
            message: message.into(),
        }
    }
}

/// Main error type for transaction construction and commit
///
/// Each variant includes the context an operator needs to diagnose the
/// failure. Commit failures leave already-committed legs in the owning
/// transaction's operation log, ready for rollback.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransferError {
    /// The transaction could not be constructed
    ///
    /// This is a caller bug (e.g. a non-positive amount or an out-of-range
    /// tax rate), surfaced immediately rather than deferred to commit time.
    #[error("Invalid transaction: {reason}")]
    InvalidTransaction {
        /// Why the construction was rejected
        reason: String,
    },

    /// The pre-commit policy hook declined the transaction
    ///
    /// The ledger was never touched.
    #[error("Transaction cancelled by policy")]
    VetoedByPolicy,

    /// The source account cannot cover the requested amount
    ///
    /// Only raised when loans are disallowed. No operations were attempted.
    #[error(
        "Insufficient balance for account {account}: available {available}, requested {requested}"
    )]
    InsufficientBalance {
        /// The source account that was checked
        account: AccountId,
        /// Balance reported by the ledger
        available: Decimal,
        /// Gross amount the transaction needs
        requested: Decimal,
    },

    /// The ledger could not report a balance during the pre-commit check
    ///
    /// No operations were attempted; an unreadable balance is reported as
    /// its own condition rather than as "insufficient".
    #[error("Failed to read balance of account {account}: {message}")]
    BalanceUnavailable {
        /// The account whose balance was requested
        account: AccountId,
        /// The backend's last-error description
        message: String,
    },

    /// A ledger leg failed at the backend
    ///
    /// For a failed withdraw no other legs were attempted; for a failed
    /// deposit the withdraw leg remains committed in the operation log.
    #[error("Failed to {kind} {amount} for account {account}: {message}")]
    OperationFailed {
        /// "withdraw" or "deposit"
        kind: &'static str,
        /// The account the leg targeted
        account: AccountId,
        /// The leg amount
        amount: Decimal,
        /// The backend's last-error description
        message: String,
    },
}

// Helper functions for creating common errors

impl TransferError {
    /// Create an InvalidTransaction error
    pub fn invalid(reason: impl Into<String>) -> Self {
        TransferError::InvalidTransaction {
            reason: reason.into(),
        }
    }

    /// Create an InsufficientBalance error
    pub fn insufficient_balance(
        account: AccountId,
        available: Decimal,
        requested: Decimal,
    ) -> Self {
        TransferError::InsufficientBalance {
            account,
            available,
            requested,
        }
    }

    /// Create a BalanceUnavailable error from a ledger failure
    pub fn balance_unavailable(account: AccountId, cause: LedgerError) -> Self {
        TransferError::BalanceUnavailable {
            account,
            message: cause.message,
        }
    }

    /// Create an OperationFailed error from a ledger failure
    pub fn operation_failed(
        kind: &'static str,
        account: AccountId,
        amount: Decimal,
        cause: LedgerError,
    ) -> Self {
        TransferError::OperationFailed {
            kind,
            account,
            amount,
            message: cause.message,
        }
    }
}
