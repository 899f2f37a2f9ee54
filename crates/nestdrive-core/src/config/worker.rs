//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Background worker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the reconciliation sweep runs at all.
    #[serde(default = "default_true")]
    pub reconcile_enabled: bool,
    /// Seconds between reconciliation sweeps.
    #[serde(default = "default_interval")]
    pub reconcile_interval_seconds: u64,
    /// Objects younger than this are never treated as orphans, since their
    /// metadata write may still be in flight.
    #[serde(default = "default_grace")]
    pub orphan_grace_seconds: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            reconcile_enabled: true,
            reconcile_interval_seconds: default_interval(),
            orphan_grace_seconds: default_grace(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_interval() -> u64 {
    900
}

fn default_grace() -> u64 {
    300
}
