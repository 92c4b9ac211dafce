//! Transfer shape and tax arithmetic
//!
//! This module defines the input side of a transfer: which parties are
//! involved, how much money moves, and how the gross amount is split between
//! the destination and the tax account.

use crate::types::account::{AccountId, Currency, Partition};
use crate::types::error::TransferError;
use rust_decimal::Decimal;

/// The parties of a transfer
///
/// At least one of source and destination must be present; the missing side
/// means "no debit leg" / "no credit leg" respectively. Encoding this as a
/// tagged variant makes the invalid both-absent state unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parties {
    /// Money leaves `source` and goes nowhere (a pure sink, e.g. a fee burn)
    SourceOnly {
        /// The account to debit
        source: AccountId,
    },
    /// Money appears in `destination` from nowhere (a pure faucet)
    DestinationOnly {
        /// The account to credit
        destination: AccountId,
    },
    /// A regular two-party transfer
    Both {
        /// The account to debit
        source: AccountId,
        /// The account to credit
        destination: AccountId,
    },
}

impl Parties {
    /// Build parties from a pair of optional accounts
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransaction` when both accounts are absent. That is a
    /// caller bug and is surfaced here rather than at commit time.
    pub fn from_options(
        source: Option<AccountId>,
        destination: Option<AccountId>,
    ) -> Result<Self, TransferError> {
        match (source, destination) {
            (Some(source), Some(destination)) => Ok(Parties::Both {
                source,
                destination,
            }),
            (Some(source), None) => Ok(Parties::SourceOnly { source }),
            (None, Some(destination)) => Ok(Parties::DestinationOnly { destination }),
            (None, None) => Err(TransferError::invalid(
                "source and destination cannot both be absent",
            )),
        }
    }

    /// The account to debit, if any
    pub fn source(&self) -> Option<AccountId> {
        match self {
            Parties::SourceOnly { source } | Parties::Both { source, .. } => Some(*source),
            Parties::DestinationOnly { .. } => None,
        }
    }

    /// The account to credit, if any
    pub fn destination(&self) -> Option<AccountId> {
        match self {
            Parties::DestinationOnly { destination } | Parties::Both { destination, .. } => {
                Some(*destination)
            }
            Parties::SourceOnly { .. } => None,
        }
    }
}

/// Input for one transfer
///
/// A plain value describing what should move where. Validation of the amount
/// and tax rate happens when a [`Transaction`](crate::core::Transaction) is
/// constructed from the spec.
#[derive(Debug, Clone)]
pub struct TransferSpec {
    /// Who is debited and credited
    pub parties: Parties,
    /// Gross amount requested (must be positive)
    pub amount: Decimal,
    /// Tax rate in `[0, 1)`; zero means no tax
    pub tax_rate: Decimal,
    /// Account receiving the tax cut, if any
    pub tax_account: Option<AccountId>,
    /// Named currency; `None` selects the ledger default
    pub currency: Currency,
    /// Partition scoping all balance lookups
    pub partition: Partition,
    /// Skip the balance check and permit overdraft
    pub allow_loan: bool,
}

/// Split a gross amount into the after-tax amount and the tax cut
///
/// Computed with exact decimal arithmetic so that
/// `amount_after_tax + tax == amount` holds without rounding drift.
///
/// # Errors
///
/// Returns `InvalidTransaction` if the amount is not positive or the tax
/// rate is outside `[0, 1)`.
pub fn split_tax(amount: Decimal, tax_rate: Decimal) -> Result<(Decimal, Decimal), TransferError> {
    if amount <= Decimal::ZERO {
        return Err(TransferError::invalid(format!(
            "amount must be positive, got {amount}"
        )));
    }
    if tax_rate < Decimal::ZERO || tax_rate >= Decimal::ONE {
        return Err(TransferError::invalid(format!(
            "tax rate must be in [0, 1), got {tax_rate}"
        )));
    }

    let amount_after_tax = if tax_rate.is_zero() {
        amount
    } else {
        (Decimal::ONE - tax_rate) * amount
    };
    let tax = amount - amount_after_tax;
    Ok((amount_after_tax, tax))
}
