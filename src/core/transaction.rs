//! Transaction orchestration
//!
//! This module provides the [`Transaction`] that sequences withdraw/deposit
//! operations against a non-transactional ledger and can unwind them on
//! failure. The ledger offers no native transactions, so atomicity is
//! approximated with a compensating-action log: every operation that truly
//! mutated the ledger is pushed onto the transaction-owned operation log,
//! and rollback pops the log and undoes each effect in reverse order.
//!
//! The engine enforces:
//! - Legs execute strictly in the order withdraw → deposit → tax-deposit
//! - A failed primary leg aborts the commit; committed legs stay in the log
//! - The tax leg is best-effort and never reverses the primary transfer
//! - Rollback compensates most-recent-first

use crate::core::operation::Operation;
use crate::core::traits::{AuditSink, Ledger};
use crate::types::{
    AccountId, Currency, Parties, Partition, TransferError, TransferRecord, TransferSpec,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, warn};

/// Engine configuration flags
#[derive(Debug, Clone, Copy, Default)]
pub struct TransferConfig {
    /// Re-read balances through the ledger's cache-warming hook at
    /// construction and after a successful commit
    ///
    /// Works around backends that cache balances and only refresh on read.
    pub warm_balance_cache: bool,
}

/// Terminal outcome of a commit attempt, dispatched to the caller's handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The pre-commit policy declined; the ledger was never touched
    Vetoed,
    /// All primary legs committed
    Committed,
    /// A balance check or primary leg failed
    Failed,
    /// The best-effort tax leg failed; the transaction still commits
    TaxFailed,
}

/// Result of one rollback pass over the operation log
///
/// `processed` lists every operation the pass attempted, in compensation
/// order, up to and including a failed compensation in stop-early mode.
/// Each entry reports its own result via [`Operation::is_rolled_back`].
/// Operations never attempted stay in the transaction's log, so `rollback`
/// can be invoked again.
#[derive(Debug)]
pub struct RollbackReport {
    processed: Vec<Operation>,
    remaining: usize,
}

impl RollbackReport {
    /// Operations attempted by this pass, most recently committed first
    pub fn processed(&self) -> &[Operation] {
        &self.processed
    }

    /// Consume the report, yielding the attempted operations
    pub fn into_processed(self) -> Vec<Operation> {
        self.processed
    }

    /// How many attempted operations were actually compensated
    pub fn compensated_count(&self) -> usize {
        self.processed
            .iter()
            .filter(|op| op.is_rolled_back())
            .count()
    }

    /// Operations left uncompensated in the log by a stop-early pass
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Whether every logged effect has been compensated
    pub fn is_complete(&self) -> bool {
        self.remaining == 0 && self.compensated_count() == self.processed.len()
    }
}

/// A single money transfer with fail-safe commit and rollback
///
/// Orchestrates validation, tax computation, sequential operation execution
/// against the injected [`Ledger`], and compensation of committed effects on
/// failure. Terminal outcomes are reported to the injected [`AuditSink`] as
/// structured [`TransferRecord`]s.
///
/// A transaction is short-lived and single-use: it is created per transfer
/// request, committed (or rolled back) once, and discarded. It has no
/// internal locking; `commit` and `rollback` run to completion on the
/// calling thread, blocking for as long as the ledger backend takes. Run it
/// somewhere that tolerates blocking calls, such as
/// [`TransferEngine`](crate::core::TransferEngine).
pub struct Transaction {
    parties: Parties,
    amount: Decimal,
    amount_after_tax: Decimal,
    tax: Decimal,
    tax_account: Option<AccountId>,
    currency: Currency,
    partition: Partition,
    allow_loan: bool,
    last_error: Option<String>,
    operation_log: Vec<Operation>,
    committed: bool,
    ledger: Arc<dyn Ledger>,
    sink: Arc<dyn AuditSink>,
    config: TransferConfig,
}

impl Transaction {
    /// Create a transaction from a transfer spec
    ///
    /// Computes the tax split with exact decimal arithmetic and, when
    /// configured, pre-warms the ledger's balance cache for both parties.
    ///
    /// # Arguments
    ///
    /// * `spec` - What should move where
    /// * `ledger` - The account-balance backend to mutate
    /// * `sink` - Receiver of terminal-outcome records
    /// * `config` - Engine flags
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransaction` if the amount is not positive or the tax
    /// rate is outside `[0, 1)`. (A spec with both parties absent is already
    /// unrepresentable; see [`Parties::from_options`].)
    pub fn new(
        spec: TransferSpec,
        ledger: Arc<dyn Ledger>,
        sink: Arc<dyn AuditSink>,
        config: TransferConfig,
    ) -> Result<Self, TransferError> {
        let (amount_after_tax, tax) = crate::types::split_tax(spec.amount, spec.tax_rate)?;

        let transaction = Transaction {
            parties: spec.parties,
            amount: spec.amount,
            amount_after_tax,
            tax,
            tax_account: spec.tax_account,
            currency: spec.currency,
            partition: spec.partition,
            allow_loan: spec.allow_loan,
            last_error: None,
            operation_log: Vec::new(),
            committed: false,
            ledger,
            sink,
            config,
        };

        if transaction.config.warm_balance_cache {
            transaction.warm_caches();
        }

        Ok(transaction)
    }

    /// The account to debit, if any
    pub fn source(&self) -> Option<AccountId> {
        self.parties.source()
    }

    /// The account to credit, if any
    pub fn destination(&self) -> Option<AccountId> {
        self.parties.destination()
    }

    /// Gross amount requested
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Amount the destination receives
    pub fn amount_after_tax(&self) -> Decimal {
        self.amount_after_tax
    }

    /// Tax cut destined for the tax account
    pub fn tax(&self) -> Decimal {
        self.tax
    }

    /// Account receiving the tax cut, if any
    pub fn tax_account(&self) -> Option<AccountId> {
        self.tax_account
    }

    /// Currency this transfer is scoped to
    pub fn currency(&self) -> Option<&str> {
        self.currency.as_deref()
    }

    /// Partition this transfer is scoped to
    pub fn partition(&self) -> &str {
        &self.partition
    }

    /// Description of the most recent failure, if any
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Number of committed operations awaiting potential rollback
    pub fn operation_log_len(&self) -> usize {
        self.operation_log.len()
    }

    /// Commit the transaction by the fail-safe way
    ///
    /// Runs [`commit`](Self::commit) and automatically rolls back every
    /// committed leg (best-effort, full drain) when the commit fails. This
    /// is the recommended entry point; use `commit` + `rollback` directly
    /// only for custom rollback timing.
    ///
    /// # Errors
    ///
    /// Returns the commit error; the rollback triggered by it is
    /// best-effort and does not change the returned value.
    pub fn fail_safe_commit(&mut self) -> Result<(), TransferError> {
        self.fail_safe_commit_with(|_| true, |_, _| {})
    }

    /// Fail-safe commit with a veto policy and an outcome handler
    pub fn fail_safe_commit_with<P, H>(
        &mut self,
        policy: P,
        handler: H,
    ) -> Result<(), TransferError>
    where
        P: FnOnce(&Transaction) -> bool,
        H: FnMut(TransferOutcome, &Transaction),
    {
        let result = self.commit_with(policy, handler);
        if let Err(ref error) = result {
            warn!("fail-safe commit failed, starting rollback: {error}");
            self.rollback(true);
        }
        result
    }

    /// Commit the transaction with default hooks
    ///
    /// Equivalent to [`commit_with`](Self::commit_with) with an approve-all
    /// policy and a no-op handler. The audit sink is notified either way.
    pub fn commit(&mut self) -> Result<(), TransferError> {
        self.commit_with(|_| true, |_, _| {})
    }

    /// Commit the transaction
    ///
    /// Protocol:
    /// 1. Ask `policy` for approval; a veto fails the commit without
    ///    touching the ledger.
    /// 2. Check the source balance (skipped when loans are allowed or there
    ///    is no debit leg).
    /// 3. Withdraw the gross amount from the source.
    /// 4. Deposit the after-tax amount to the destination.
    /// 5. Deposit the tax cut to the tax account, best-effort: its failure
    ///    is reported but never aborts or reverses the transfer.
    ///
    /// Every operation that mutated the ledger is pushed onto the operation
    /// log; on failure the committed legs stay there, ready for
    /// [`rollback`](Self::rollback).
    ///
    /// # Errors
    ///
    /// * `VetoedByPolicy` - the policy declined
    /// * `BalanceUnavailable` - the source balance could not be read
    /// * `InsufficientBalance` - the source cannot cover the gross amount
    /// * `OperationFailed` - a primary leg failed at the backend
    ///
    /// # Panics
    ///
    /// Panics if this transaction was already committed; transactions are
    /// single-use.
    pub fn commit_with<P, H>(&mut self, policy: P, mut handler: H) -> Result<(), TransferError>
    where
        P: FnOnce(&Transaction) -> bool,
        H: FnMut(TransferOutcome, &Transaction),
    {
        assert!(
            !self.committed,
            "transaction already committed; create a new transaction per transfer"
        );
        self.committed = true;

        debug!(
            "transaction begin: {:?} => {:?}; amount {} (after tax {}, tax {}), ledger: {}",
            self.source(),
            self.destination(),
            self.amount,
            self.amount_after_tax,
            self.tax,
            self.ledger.name()
        );

        if !policy(self) {
            return self.fail(
                TransferError::VetoedByPolicy,
                TransferOutcome::Vetoed,
                &mut handler,
            );
        }

        if let Err(error) = self.check_balance() {
            return self.fail(error, TransferOutcome::Failed, &mut handler);
        }

        if let Some(source) = self.parties.source() {
            let operation =
                Operation::withdraw(source, self.amount, self.partition.clone(), self.currency.clone());
            if let Err(cause) = self.execute(operation) {
                let error =
                    TransferError::operation_failed("withdraw", source, self.amount, cause);
                return self.fail(error, TransferOutcome::Failed, &mut handler);
            }
        }

        if let Some(destination) = self.parties.destination() {
            let operation = Operation::deposit(
                destination,
                self.amount_after_tax,
                self.partition.clone(),
                self.currency.clone(),
            );
            if let Err(cause) = self.execute(operation) {
                let error = TransferError::operation_failed(
                    "deposit",
                    destination,
                    self.amount_after_tax,
                    cause,
                );
                return self.fail(error, TransferOutcome::Failed, &mut handler);
            }
        }

        if self.tax > Decimal::ZERO {
            if let Some(tax_account) = self.tax_account {
                let operation = Operation::deposit(
                    tax_account,
                    self.tax,
                    self.partition.clone(),
                    self.currency.clone(),
                );
                if let Err(cause) = self.execute(operation) {
                    // Tax collection failing never reverses the transfer
                    // between the primary parties.
                    let error = TransferError::operation_failed(
                        "deposit",
                        tax_account,
                        self.tax,
                        cause,
                    );
                    self.last_error = Some(error.to_string());
                    warn!("tax leg failed: {error}");
                    handler(TransferOutcome::TaxFailed, self);
                    self.sink.record(self.audit_record(false));
                }
            }
        }

        handler(TransferOutcome::Committed, self);
        self.sink.record(self.audit_record(true));
        if self.config.warm_balance_cache {
            self.warm_caches();
        }
        debug!(
            "transaction committed: {:?} => {:?}; amount {}",
            self.source(),
            self.destination(),
            self.amount
        );
        Ok(())
    }

    /// Roll back committed operations in reverse order
    ///
    /// Pops the operation log most-recent-first and applies each entry's
    /// compensating action. When a compensation fails:
    ///
    /// * `continue_when_failed == true` - the entry is recorded as failed
    ///   and the pass continues to the next (older) entry, draining the
    ///   whole log best-effort.
    /// * `continue_when_failed == false` - the pass stops immediately. The
    ///   failed entry is the last element of the report; entries never
    ///   attempted stay in the log, so `rollback` can be invoked again.
    ///
    /// Entries that never committed or were already compensated are skipped
    /// defensively; the log discipline in `commit` means they should not
    /// occur.
    pub fn rollback(&mut self, continue_when_failed: bool) -> RollbackReport {
        let mut processed = Vec::new();

        while let Some(mut operation) = self.operation_log.pop() {
            if !operation.is_committed() || operation.is_rolled_back() {
                continue;
            }
            match operation.rollback(self.ledger.as_ref()) {
                Ok(()) => processed.push(operation),
                Err(cause) => {
                    warn!(
                        "failed to roll back {} of {} for account {}: {}; ledger: {}",
                        operation.kind().verb(),
                        operation.amount(),
                        operation.account(),
                        cause,
                        self.ledger.name()
                    );
                    processed.push(operation);
                    if !continue_when_failed {
                        break;
                    }
                }
            }
        }

        let remaining = self.operation_log.len();
        if remaining > 0 {
            warn!("rollback stopped early, {remaining} operation(s) left uncompensated");
        }
        RollbackReport {
            processed,
            remaining,
        }
    }

    /// Whether the source can cover the gross amount
    fn check_balance(&self) -> Result<(), TransferError> {
        let Some(source) = self.parties.source() else {
            return Ok(());
        };
        if self.allow_loan {
            return Ok(());
        }
        let available = self
            .ledger
            .balance(source, &self.partition, self.currency.as_deref())
            .map_err(|cause| TransferError::balance_unavailable(source, cause))?;
        if available < self.amount {
            return Err(TransferError::insufficient_balance(
                source,
                available,
                self.amount,
            ));
        }
        Ok(())
    }

    /// Execute one operation, logging it only if it mutated the ledger
    ///
    /// A failed operation is discarded, never pushed, so rollback only ever
    /// sees operations that truly took effect.
    fn execute(&mut self, mut operation: Operation) -> Result<(), crate::types::LedgerError> {
        operation.commit(self.ledger.as_ref())?;
        self.operation_log.push(operation);
        Ok(())
    }

    /// Record a failure, notify the handler and sink, and return the error
    fn fail<H>(
        &mut self,
        error: TransferError,
        outcome: TransferOutcome,
        handler: &mut H,
    ) -> Result<(), TransferError>
    where
        H: FnMut(TransferOutcome, &Transaction),
    {
        self.last_error = Some(error.to_string());
        warn!("transaction failed: {error}; ledger: {}", self.ledger.name());
        handler(outcome, self);
        self.sink.record(self.audit_record(false));
        Err(error)
    }

    fn audit_record(&self, success: bool) -> TransferRecord {
        TransferRecord {
            success,
            from: self.source(),
            to: self.destination(),
            currency: self.currency.clone(),
            tax: self.tax,
            tax_account: self.tax_account,
            amount: self.amount,
            error: self.last_error.clone(),
        }
    }

    fn warm_caches(&self) {
        for account in [self.parties.source(), self.parties.destination()]
            .into_iter()
            .flatten()
        {
            self.ledger
                .warm_cache(account, &self.partition, self.currency.as_deref());
        }
    }
}
