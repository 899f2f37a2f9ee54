//! Built-in job handler implementations.

pub mod reconcile;

pub use reconcile::{RECONCILE_JOB, ReconcileJobHandler};
