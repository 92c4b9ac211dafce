//! In-memory collaborator implementations
//!
//! This module provides thread-safe in-memory implementations of the engine's
//! collaborator contracts: a [`MemoryLedger`] balance store and a
//! [`MemoryAuditSink`] that records every emitted transfer record.
//!
//! # Design
//!
//! `MemoryLedger` uses `DashMap` (a concurrent HashMap) so multiple
//! transactions can mutate balances concurrently with fine-grained locking:
//! operations on different accounts don't block each other, while check and
//! mutate on one balance happen under that entry's lock.
//!
//! Both types are intended for tests, benchmarks, and embedders that don't
//! bridge to an external economy backend.

use crate::core::traits::{AuditSink, Ledger};
use crate::types::{AccountId, LedgerError, TransferRecord};
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::Mutex;

/// Balance key: account scoped by partition and currency
type BalanceKey = (AccountId, String, Option<String>);

/// Thread-safe in-memory ledger
///
/// Unknown accounts read as zero balance. Withdrawals never overdraw; a
/// withdrawal exceeding the balance fails with a [`LedgerError`] and leaves
/// the balance untouched.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    balances: DashMap<BalanceKey, Decimal>,
}

impl MemoryLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an account's balance directly (fixture helper)
    pub fn set_balance(
        &self,
        account: AccountId,
        partition: &str,
        currency: Option<&str>,
        amount: Decimal,
    ) {
        self.balances
            .insert(key(account, partition, currency), amount);
    }
}

fn key(account: AccountId, partition: &str, currency: Option<&str>) -> BalanceKey {
    (
        account,
        partition.to_string(),
        currency.map(str::to_string),
    )
}

impl Ledger for MemoryLedger {
    fn name(&self) -> &str {
        "memory"
    }

    fn balance(
        &self,
        account: AccountId,
        partition: &str,
        currency: Option<&str>,
    ) -> Result<Decimal, LedgerError> {
        Ok(self
            .balances
            .get(&key(account, partition, currency))
            .map(|entry| *entry.value())
            .unwrap_or(Decimal::ZERO))
    }

    fn withdraw(
        &self,
        account: AccountId,
        amount: Decimal,
        partition: &str,
        currency: Option<&str>,
    ) -> Result<(), LedgerError> {
        let mut entry = self
            .balances
            .entry(key(account, partition, currency))
            .or_insert(Decimal::ZERO);
        let balance = entry.value_mut();
        if *balance < amount {
            return Err(LedgerError::new(format!(
                "insufficient funds: balance {balance}, requested {amount}"
            )));
        }
        *balance -= amount;
        Ok(())
    }

    fn deposit(
        &self,
        account: AccountId,
        amount: Decimal,
        partition: &str,
        currency: Option<&str>,
    ) -> Result<(), LedgerError> {
        let mut entry = self
            .balances
            .entry(key(account, partition, currency))
            .or_insert(Decimal::ZERO);
        let balance = entry.value_mut();
        *balance = balance.checked_add(amount).ok_or_else(|| {
            LedgerError::new(format!("balance overflow depositing {amount}"))
        })?;
        Ok(())
    }
}

/// Audit sink that stores every record in memory
///
/// Tests use this to assert on the exact sequence of terminal-outcome
/// records a transaction emitted.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<TransferRecord>>,
}

impl MemoryAuditSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// All records received so far, in emission order
    pub fn records(&self) -> Vec<TransferRecord> {
        self.records
            .lock()
            .expect("audit record lock poisoned")
            .clone()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, record: TransferRecord) {
        self.records
            .lock()
            .expect("audit record lock poisoned")
            .push(record);
    }
}
