//! Process-wide configuration.
//!
//! Configuration only selects transfer strategies; it never changes
//! the values an operation produces.

use serde::Deserialize;
use serde::Serialize;

/// Environment variable controlling [`Config::bulk_transfer`]. Accepts
/// `1`/`true` and `0`/`false`.
pub const BULK_TRANSFER_ENV: &str = "NDBUFFER_BULK_TRANSFER";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Move contiguous runs of fixed-width values with one buffer
    /// operation per run. When disabled, every transfer is element-wise.
    pub bulk_transfer: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bulk_transfer: true,
        }
    }
}

impl Config {
    /// The default configuration, overridden by any recognized
    /// environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(value) = std::env::var(BULK_TRANSFER_ENV) {
            match parse_bool(&value) {
                Some(enabled) => config.bulk_transfer = enabled,
                None => tracing::warn!(
                    "ignoring invalid value {:?} for {}",
                    value,
                    BULK_TRANSFER_ENV
                ),
            }
        }
        config
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

/// The global configuration.
pub mod global {
    use std::sync::LazyLock;
    use std::sync::RwLock;

    use super::Config;

    static CONFIG: LazyLock<RwLock<Config>> = LazyLock::new(|| RwLock::new(Config::from_env()));

    /// A copy of the current configuration.
    pub fn get() -> Config {
        match CONFIG.read() {
            Ok(config) => config.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replaces the current configuration.
    pub fn set(config: Config) {
        match CONFIG.write() {
            Ok(mut current) => *current = config,
            Err(poisoned) => *poisoned.into_inner() = config,
        }
    }

    /// Reloads the configuration from the environment.
    pub fn init_from_env() {
        set(Config::from_env());
    }

    /// Restores the default configuration.
    pub fn reset() {
        set(Config::default());
    }
}
