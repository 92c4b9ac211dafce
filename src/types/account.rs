//! Account identity and ledger scoping types
//!
//! This module defines the identifier types used to address balances in the
//! external ledger. Every lookup is scoped by a partition (e.g. a world or
//! region) and an optional named currency.

use uuid::Uuid;

/// Account identifier
///
/// Accounts are keyed by UUID in the external ledger.
pub type AccountId = Uuid;

/// Partition under which balances are looked up (e.g. a world or region)
pub type Partition = String;

/// Optional named currency
///
/// `None` selects the ledger backend's default currency.
pub type Currency = Option<String>;
