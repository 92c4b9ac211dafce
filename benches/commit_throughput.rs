//! Benchmark suite for transaction commit and rollback
//!
//! Measures the engine overhead per transfer against the in-memory ledger
//! using the divan benchmarking framework. Ledger backend latency dominates
//! real deployments; these numbers isolate the orchestration cost.
//!
//! # Running Benchmarks
//!
//! ```bash
//! cargo bench
//! ```

use economy_transfer_engine::{
    MemoryLedger, NullAuditSink, Parties, Transaction, TransferConfig, TransferSpec,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

fn main() {
    divan::main();
}

fn funded_fixture() -> (Arc<MemoryLedger>, Uuid, Uuid, Uuid) {
    let ledger = Arc::new(MemoryLedger::new());
    let source = Uuid::from_u128(1);
    let destination = Uuid::from_u128(2);
    let treasury = Uuid::from_u128(3);
    ledger.set_balance(source, "world", None, Decimal::new(1_000_000, 2));
    (ledger, source, destination, treasury)
}

fn transaction(
    ledger: Arc<MemoryLedger>,
    parties: Parties,
    tax_rate: Decimal,
    tax_account: Option<Uuid>,
) -> Transaction {
    Transaction::new(
        TransferSpec {
            parties,
            amount: Decimal::new(100, 2),
            tax_rate,
            tax_account,
            currency: None,
            partition: "world".to_string(),
            allow_loan: false,
        },
        ledger,
        Arc::new(NullAuditSink),
        TransferConfig::default(),
    )
    .expect("valid spec")
}

/// Two-leg transfer: withdraw + deposit, no tax
#[divan::bench]
fn commit_two_legs() {
    let (ledger, source, destination, _) = funded_fixture();
    let mut tx = transaction(
        ledger,
        Parties::Both {
            source,
            destination,
        },
        Decimal::ZERO,
        None,
    );
    tx.fail_safe_commit().expect("commit failed");
}

/// Three-leg transfer: withdraw + deposit + tax deposit
#[divan::bench]
fn commit_three_legs() {
    let (ledger, source, destination, treasury) = funded_fixture();
    let mut tx = transaction(
        ledger,
        Parties::Both {
            source,
            destination,
        },
        Decimal::new(10, 2),
        Some(treasury),
    );
    tx.fail_safe_commit().expect("commit failed");
}

/// Commit followed by a full best-effort rollback
#[divan::bench]
fn commit_then_rollback() {
    let (ledger, source, destination, treasury) = funded_fixture();
    let mut tx = transaction(
        ledger,
        Parties::Both {
            source,
            destination,
        },
        Decimal::new(10, 2),
        Some(treasury),
    );
    tx.commit().expect("commit failed");
    let report = tx.rollback(true);
    assert!(report.is_complete());
}
