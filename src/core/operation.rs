//! Reversible ledger operations
//!
//! An [`Operation`] is a single ledger mutation (withdraw or deposit) that
//! knows how to undo itself. Operations are created immediately before
//! execution, pushed onto the owning transaction's operation log once they
//! have actually mutated the ledger, and compensated in reverse order during
//! rollback.

use crate::core::traits::Ledger;
use crate::types::{AccountId, Currency, LedgerError, Partition};
use rust_decimal::Decimal;

/// Direction of a ledger mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Debit the account; compensated by a deposit
    Withdraw,
    /// Credit the account; compensated by a withdraw
    Deposit,
}

impl OperationKind {
    /// Lowercase verb for error messages and logs
    pub fn verb(self) -> &'static str {
        match self {
            OperationKind::Withdraw => "withdraw",
            OperationKind::Deposit => "deposit",
        }
    }
}

/// One reversible ledger mutation with commit/rollback state
///
/// Each operation is single-use: commit may run once, and rollback may run
/// once after a successful commit. Violating either order is a programming
/// error and panics; a second commit would move money twice, so it must
/// never be silently tolerated.
#[derive(Debug, Clone)]
pub struct Operation {
    kind: OperationKind,
    account: AccountId,
    amount: Decimal,
    currency: Currency,
    partition: Partition,
    committed: bool,
    rolled_back: bool,
}

impl Operation {
    /// Create a withdraw operation
    pub fn withdraw(
        account: AccountId,
        amount: Decimal,
        partition: Partition,
        currency: Currency,
    ) -> Self {
        Self::new(OperationKind::Withdraw, account, amount, partition, currency)
    }

    /// Create a deposit operation
    pub fn deposit(
        account: AccountId,
        amount: Decimal,
        partition: Partition,
        currency: Currency,
    ) -> Self {
        Self::new(OperationKind::Deposit, account, amount, partition, currency)
    }

    fn new(
        kind: OperationKind,
        account: AccountId,
        amount: Decimal,
        partition: Partition,
        currency: Currency,
    ) -> Self {
        Operation {
            kind,
            account,
            amount,
            currency,
            partition,
            committed: false,
            rolled_back: false,
        }
    }

    /// The direction of this operation
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// The account this operation targets
    pub fn account(&self) -> AccountId {
        self.account
    }

    /// The amount this operation moves
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Whether this operation has mutated the ledger
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Whether this operation's mutation has been compensated
    pub fn is_rolled_back(&self) -> bool {
        self.rolled_back
    }

    /// Apply this operation's mutation to the ledger
    ///
    /// On success the operation is marked committed; on failure it stays
    /// uncommitted and must be discarded, never retried.
    ///
    /// # Errors
    ///
    /// Returns the backend's failure description when the mutation did not
    /// take effect.
    ///
    /// # Panics
    ///
    /// Panics if the operation was already committed or already rolled back.
    pub fn commit(&mut self, ledger: &dyn Ledger) -> Result<(), LedgerError> {
        assert!(!self.committed, "operation already committed");
        assert!(
            !self.rolled_back,
            "operation already rolled back, create a new operation instead"
        );

        self.apply(ledger, self.kind)?;
        self.committed = true;
        Ok(())
    }

    /// Apply the compensating mutation, undoing a successful commit
    ///
    /// A withdraw is compensated by a deposit and vice versa. On success the
    /// operation is marked rolled back; on failure the flag stays clear so a
    /// later rollback attempt can retry the compensation.
    ///
    /// # Errors
    ///
    /// Returns the backend's failure description when the compensation did
    /// not take effect.
    ///
    /// # Panics
    ///
    /// Panics if the operation never committed or was already rolled back.
    pub fn rollback(&mut self, ledger: &dyn Ledger) -> Result<(), LedgerError> {
        assert!(self.committed, "cannot roll back an uncommitted operation");
        assert!(!self.rolled_back, "operation already rolled back");

        let inverse = match self.kind {
            OperationKind::Withdraw => OperationKind::Deposit,
            OperationKind::Deposit => OperationKind::Withdraw,
        };
        self.apply(ledger, inverse)?;
        self.rolled_back = true;
        Ok(())
    }

    fn apply(&self, ledger: &dyn Ledger, kind: OperationKind) -> Result<(), LedgerError> {
        match kind {
            OperationKind::Withdraw => ledger.withdraw(
                self.account,
                self.amount,
                &self.partition,
                self.currency.as_deref(),
            ),
            OperationKind::Deposit => ledger.deposit(
                self.account,
                self.amount,
                &self.partition,
                self.currency.as_deref(),
            ),
        }
    }
}
