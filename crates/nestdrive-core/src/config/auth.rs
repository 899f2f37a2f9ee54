//! Local identity provider configuration.

use serde::{Deserialize, Serialize};

/// Settings for the bundled identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// JSON file holding accounts and the current session.
    #[serde(default = "default_state_path")]
    pub state_path: String,
    /// Minimum password length accepted at sign-up.
    #[serde(default = "default_password_min_length")]
    pub password_min_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
            password_min_length: default_password_min_length(),
        }
    }
}

fn default_state_path() -> String {
    "./data/identity.json".to_string()
}

fn default_password_min_length() -> usize {
    6
}
