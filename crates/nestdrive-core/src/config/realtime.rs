//! Live query engine configuration.

use serde::{Deserialize, Serialize};

/// Live query (snapshot subscription) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Maximum concurrent live subscriptions per owner.
    #[serde(default = "default_max_subscriptions")]
    pub max_subscriptions_per_owner: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            max_subscriptions_per_owner: default_max_subscriptions(),
        }
    }
}

fn default_max_subscriptions() -> usize {
    64
}
