//! Manager configuration.
//!
//! [`ManagerConfig`] is a plain serde structure. It can be constructed in code,
//! taken from [`Default`], or loaded from TOML text or a `.toml` file.
//!
//! ```toml
//! pending_capacity = 256
//! initialize_systems_on_sync = true
//! log_sync_summary = false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::error::ConfigError;


/// Tunables for a [`Manager`](crate::Manager).
///
/// Missing keys fall back to their [`Default`] values when deserializing.

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Initial capacity reserved for each deferred entity queue.
    pub pending_capacity: usize,

    /// Call `System::initialize` on systems as they become live during
    /// synchronization.
    ///
    /// When `false`, the driver is expected to call
    /// [`Manager::initialize_systems`](crate::Manager::initialize_systems);
    /// dispatch skips systems that have not been initialized.
    pub initialize_systems_on_sync: bool,

    /// Emit a `debug` summary for every synchronization point that applied
    /// at least one change.
    pub log_sync_summary: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            pending_capacity: 64,
            initialize_systems_on_sync: true,
            log_sync_summary: true,
        }
    }
}

impl ManagerConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Loads a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Serializes this configuration to TOML text.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}
