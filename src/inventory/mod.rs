pub mod ledger;
pub mod reconciliation;

pub use ledger::InventoryLedger;
pub use reconciliation::{InventoryReconciler, InventorySource, Reconciled};
