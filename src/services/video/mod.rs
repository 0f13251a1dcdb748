//! Video processing services

pub mod reconcile;

pub use reconcile::{plan_reconciliation, ReconciliationMode, ReconciliationPlan};
