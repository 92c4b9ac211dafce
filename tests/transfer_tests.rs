//! End-to-end transfer scenarios
//!
//! These tests drive full commit/rollback cycles through the public API
//! against an in-memory ledger, including backend failures injected at
//! specific legs. They cover:
//! - Fail-safe commit restoring the ledger after a failed deposit leg
//! - The best-effort tax leg (failure reported, transfer still succeeds)
//! - Rollback in continue and stop-early modes
//! - The audit record contract for every terminal outcome
//! - The async transfer facade

#[cfg(test)]
mod tests {
    use economy_transfer_engine::{
        AccountId, AuditSink, Ledger, LedgerError, MemoryAuditSink, MemoryLedger, Parties,
        Transaction, TransferConfig, TransferEngine, TransferError, TransferOutcome, TransferSpec,
    };
    use rstest::rstest;
    use rust_decimal::Decimal;
    use std::collections::HashSet;
    use std::sync::Arc;
    use uuid::Uuid;

    const WORLD: &str = "overworld";

    fn alice() -> AccountId {
        Uuid::from_u128(0xA11CE)
    }

    fn bob() -> AccountId {
        Uuid::from_u128(0xB0B)
    }

    fn treasury() -> AccountId {
        Uuid::from_u128(0x7AE5)
    }

    /// Ledger wrapper that refuses configured mutations
    ///
    /// Deposits to and withdrawals from the listed accounts fail with a
    /// backend error; everything else is delegated to the wrapped
    /// `MemoryLedger`.
    struct FlakyLedger {
        inner: MemoryLedger,
        fail_deposits_to: HashSet<AccountId>,
        fail_withdrawals_from: HashSet<AccountId>,
    }

    impl FlakyLedger {
        fn new() -> Self {
            FlakyLedger {
                inner: MemoryLedger::new(),
                fail_deposits_to: HashSet::new(),
                fail_withdrawals_from: HashSet::new(),
            }
        }

        fn fail_deposits_to(mut self, account: AccountId) -> Self {
            self.fail_deposits_to.insert(account);
            self
        }

        fn fail_withdrawals_from(mut self, account: AccountId) -> Self {
            self.fail_withdrawals_from.insert(account);
            self
        }
    }

    impl Ledger for FlakyLedger {
        fn name(&self) -> &str {
            "flaky"
        }

        fn balance(
            &self,
            account: AccountId,
            partition: &str,
            currency: Option<&str>,
        ) -> Result<Decimal, LedgerError> {
            self.inner.balance(account, partition, currency)
        }

        fn withdraw(
            &self,
            account: AccountId,
            amount: Decimal,
            partition: &str,
            currency: Option<&str>,
        ) -> Result<(), LedgerError> {
            if self.fail_withdrawals_from.contains(&account) {
                return Err(LedgerError::new("injected withdrawal failure"));
            }
            self.inner.withdraw(account, amount, partition, currency)
        }

        fn deposit(
            &self,
            account: AccountId,
            amount: Decimal,
            partition: &str,
            currency: Option<&str>,
        ) -> Result<(), LedgerError> {
            if self.fail_deposits_to.contains(&account) {
                return Err(LedgerError::new("injected deposit failure"));
            }
            self.inner.deposit(account, amount, partition, currency)
        }
    }

    fn spec(amount: Decimal, tax_rate: Decimal, tax_account: Option<AccountId>) -> TransferSpec {
        TransferSpec {
            parties: Parties::Both {
                source: alice(),
                destination: bob(),
            },
            amount,
            tax_rate,
            tax_account,
            currency: None,
            partition: WORLD.to_string(),
            allow_loan: false,
        }
    }

    fn transaction(
        ledger: &Arc<FlakyLedger>,
        sink: &Arc<MemoryAuditSink>,
        spec: TransferSpec,
    ) -> Transaction {
        let ledger: Arc<dyn Ledger> = ledger.clone();
        let sink: Arc<dyn AuditSink> = sink.clone();
        Transaction::new(spec, ledger, sink, TransferConfig::default()).expect("valid spec")
    }

    fn balance(ledger: &FlakyLedger, account: AccountId) -> Decimal {
        ledger.balance(account, WORLD, None).unwrap()
    }

    #[test]
    fn test_fail_safe_commit_restores_source_after_deposit_failure() {
        // Source A holds 100, the deposit to B is made to fail: the withdraw
        // commits, the deposit aborts the transaction, and the automatic
        // rollback refunds A.
        let ledger = Arc::new(FlakyLedger::new().fail_deposits_to(bob()));
        ledger
            .inner
            .set_balance(alice(), WORLD, None, Decimal::new(100, 0));
        let sink = Arc::new(MemoryAuditSink::new());

        let mut tx = transaction(&ledger, &sink, spec(Decimal::new(100, 0), Decimal::ZERO, None));
        let result = tx.fail_safe_commit();

        assert!(matches!(
            result.unwrap_err(),
            TransferError::OperationFailed { kind: "deposit", .. }
        ));
        assert_eq!(balance(&ledger, alice()), Decimal::new(100, 0));
        assert_eq!(balance(&ledger, bob()), Decimal::ZERO);
        assert_eq!(tx.operation_log_len(), 0);
        assert!(tx.last_error().unwrap().contains("injected deposit failure"));
    }

    #[test]
    fn test_manual_rollback_after_deposit_failure_reports_one_compensation() {
        let ledger = Arc::new(FlakyLedger::new().fail_deposits_to(bob()));
        ledger
            .inner
            .set_balance(alice(), WORLD, None, Decimal::new(100, 0));
        let sink = Arc::new(MemoryAuditSink::new());

        let mut tx = transaction(&ledger, &sink, spec(Decimal::new(100, 0), Decimal::ZERO, None));
        assert!(tx.commit().is_err());

        // Only the withdraw leg reached the ledger.
        assert_eq!(tx.operation_log_len(), 1);
        let report = tx.rollback(true);

        assert_eq!(report.processed().len(), 1);
        assert_eq!(report.compensated_count(), 1);
        assert!(report.is_complete());
        assert_eq!(balance(&ledger, alice()), Decimal::new(100, 0));
    }

    #[test]
    fn test_failed_withdraw_attempts_no_further_legs() {
        let ledger = Arc::new(FlakyLedger::new().fail_withdrawals_from(alice()));
        ledger
            .inner
            .set_balance(alice(), WORLD, None, Decimal::new(100, 0));
        let sink = Arc::new(MemoryAuditSink::new());

        let mut tx = transaction(
            &ledger,
            &sink,
            spec(Decimal::new(50, 0), Decimal::new(10, 2), Some(treasury())),
        );
        let result = tx.fail_safe_commit();

        assert!(matches!(
            result.unwrap_err(),
            TransferError::OperationFailed { kind: "withdraw", .. }
        ));
        assert_eq!(balance(&ledger, alice()), Decimal::new(100, 0));
        assert_eq!(balance(&ledger, bob()), Decimal::ZERO);
        assert_eq!(balance(&ledger, treasury()), Decimal::ZERO);
    }

    #[test]
    fn test_tax_failure_keeps_primary_transfer_committed() {
        // Tax collection failing must not reverse an otherwise-successful
        // transfer between the primary parties.
        let ledger = Arc::new(FlakyLedger::new().fail_deposits_to(treasury()));
        ledger
            .inner
            .set_balance(alice(), WORLD, None, Decimal::new(100, 0));
        let sink = Arc::new(MemoryAuditSink::new());

        let mut tx = transaction(
            &ledger,
            &sink,
            spec(Decimal::new(100, 0), Decimal::new(10, 2), Some(treasury())),
        );
        let mut outcomes = Vec::new();
        let result = tx.fail_safe_commit_with(|_| true, |outcome, _| outcomes.push(outcome));

        assert!(result.is_ok());
        assert_eq!(
            outcomes,
            vec![TransferOutcome::TaxFailed, TransferOutcome::Committed]
        );
        assert_eq!(balance(&ledger, alice()), Decimal::ZERO);
        assert_eq!(balance(&ledger, bob()), Decimal::new(9000, 2));
        assert_eq!(balance(&ledger, treasury()), Decimal::ZERO);

        // Two records: the tax failure, then the overall success whose error
        // field still carries the tax failure description.
        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert!(!records[0].success);
        assert!(records[1].success);
        assert!(records[1]
            .error
            .as_deref()
            .unwrap()
            .contains("injected deposit failure"));
    }

    #[rstest]
    #[case::veto(true)]
    #[case::insufficient(false)]
    fn test_fail_safe_commit_without_executed_legs_changes_nothing(#[case] vetoed: bool) {
        let ledger = Arc::new(FlakyLedger::new());
        ledger
            .inner
            .set_balance(alice(), WORLD, None, Decimal::new(30, 0));
        let sink = Arc::new(MemoryAuditSink::new());

        // Either the policy vetoes an affordable transfer, or the policy
        // approves one the source cannot cover; neither may touch balances.
        let amount = if vetoed {
            Decimal::new(10, 0)
        } else {
            Decimal::new(100, 0)
        };
        let mut tx = transaction(&ledger, &sink, spec(amount, Decimal::ZERO, None));
        let result = tx.fail_safe_commit_with(|_| !vetoed, |_, _| {});

        assert!(result.is_err());
        assert_eq!(tx.operation_log_len(), 0);
        assert_eq!(balance(&ledger, alice()), Decimal::new(30, 0));
        assert_eq!(balance(&ledger, bob()), Decimal::ZERO);

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert!(!records[0].success);
    }

    #[test]
    fn test_rollback_continue_mode_drains_whole_log() {
        // Commit succeeds, then the compensation of the deposit leg (a
        // withdrawal from B) is made to fail. Continue mode still attempts
        // the older withdraw leg's compensation.
        let ledger = Arc::new(FlakyLedger::new().fail_withdrawals_from(bob()));
        ledger
            .inner
            .set_balance(alice(), WORLD, None, Decimal::new(100, 0));
        let sink = Arc::new(MemoryAuditSink::new());

        let mut tx = transaction(&ledger, &sink, spec(Decimal::new(100, 0), Decimal::ZERO, None));
        tx.commit().unwrap();

        let report = tx.rollback(true);

        assert_eq!(report.processed().len(), 2);
        assert_eq!(report.compensated_count(), 1);
        assert_eq!(report.remaining(), 0);
        assert!(!report.is_complete());

        // B kept the deposit (its compensation failed), A was refunded.
        assert_eq!(balance(&ledger, alice()), Decimal::new(100, 0));
        assert_eq!(balance(&ledger, bob()), Decimal::new(100, 0));
    }

    #[test]
    fn test_rollback_stop_mode_halts_at_first_failure() {
        let ledger = Arc::new(FlakyLedger::new().fail_withdrawals_from(bob()));
        ledger
            .inner
            .set_balance(alice(), WORLD, None, Decimal::new(100, 0));
        let sink = Arc::new(MemoryAuditSink::new());

        let mut tx = transaction(&ledger, &sink, spec(Decimal::new(100, 0), Decimal::ZERO, None));
        tx.commit().unwrap();

        let report = tx.rollback(false);

        // The failing compensation is the last processed entry; the older
        // withdraw leg was never attempted and stays in the log.
        assert_eq!(report.processed().len(), 1);
        assert_eq!(report.compensated_count(), 0);
        assert_eq!(report.remaining(), 1);
        assert!(!report.is_complete());
        assert_eq!(balance(&ledger, alice()), Decimal::ZERO);

        // A later pass picks up where the first one stopped.
        let retry = tx.rollback(true);
        assert_eq!(retry.processed().len(), 1);
        assert_eq!(retry.compensated_count(), 1);
        assert_eq!(balance(&ledger, alice()), Decimal::new(100, 0));
    }

    #[test]
    fn test_both_parties_absent_is_rejected_at_construction() {
        let result = Parties::from_options(None, None);
        assert!(matches!(
            result.unwrap_err(),
            TransferError::InvalidTransaction { .. }
        ));
    }

    #[test]
    fn test_failure_record_matches_audit_contract() {
        let ledger = Arc::new(FlakyLedger::new());
        let sink = Arc::new(MemoryAuditSink::new());

        let mut tx = transaction(
            &ledger,
            &sink,
            spec(Decimal::new(100, 0), Decimal::new(10, 2), Some(treasury())),
        );
        assert!(tx.fail_safe_commit().is_err());

        let records = sink.records();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert!(!record.success);
        assert_eq!(record.from, Some(alice()));
        assert_eq!(record.to, Some(bob()));
        assert_eq!(record.amount, Decimal::new(100, 0));
        assert_eq!(record.tax, Decimal::new(1000, 2));
        assert_eq!(record.tax_account, Some(treasury()));
        assert!(record.error.is_some());
    }

    #[tokio::test]
    async fn test_engine_transfer_rolls_back_on_failure() {
        let ledger = Arc::new(FlakyLedger::new().fail_deposits_to(bob()));
        ledger
            .inner
            .set_balance(alice(), WORLD, None, Decimal::new(100, 0));
        let sink = Arc::new(MemoryAuditSink::new());
        let shared_ledger: Arc<dyn Ledger> = ledger.clone();
        let shared_sink: Arc<dyn AuditSink> = sink.clone();
        let engine = TransferEngine::new(shared_ledger, shared_sink, TransferConfig::default());

        let result = engine
            .transfer(spec(Decimal::new(100, 0), Decimal::ZERO, None))
            .await;

        assert!(matches!(
            result.unwrap_err(),
            TransferError::OperationFailed { kind: "deposit", .. }
        ));
        assert_eq!(balance(&ledger, alice()), Decimal::new(100, 0));
        assert_eq!(balance(&ledger, bob()), Decimal::ZERO);
    }
}
