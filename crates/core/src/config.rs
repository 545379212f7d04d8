//! Probe configuration via `ssiprobe.toml`
//!
//! A flat TOML file controls which scenarios run, at which isolation level,
//! how often, and with which seed rows. Every field has a default, so an empty
//! file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::IsolationLevel;

/// Config file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "ssiprobe.toml";

/// Probe configuration loaded from `ssiprobe.toml`.
///
/// # Example
///
/// ```toml
/// isolation = "serializable"
/// barrier_timeout_ms = 5000
/// repeat = 3
/// scenarios = ["dirty-read", "write-skew"]
/// seed = ["Alice", "Bob"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProbeConfig {
    /// Isolation level both roles run under.
    #[serde(default = "default_isolation_str")]
    pub isolation: String,
    /// Upper bound on how long the orchestrator waits for both arrivals at a
    /// barrier. Unset means wait indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barrier_timeout_ms: Option<u64>,
    /// Runs per scenario; the table is reseeded before each run.
    #[serde(default = "default_repeat")]
    pub repeat: u32,
    /// Scenario names to run, in catalog order. Empty runs the whole catalog.
    #[serde(default)]
    pub scenarios: Vec<String>,
    /// Names inserted by the seeding transaction.
    #[serde(default = "default_seed")]
    pub seed: Vec<String>,
}

fn default_isolation_str() -> String {
    "serializable".to_string()
}

fn default_repeat() -> u32 {
    1
}

fn default_seed() -> Vec<String> {
    vec!["Alice".to_string(), "Bob".to_string()]
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            isolation: default_isolation_str(),
            barrier_timeout_ms: None,
            repeat: default_repeat(),
            scenarios: Vec::new(),
            seed: default_seed(),
        }
    }
}

impl ProbeConfig {
    /// Parse the isolation string into an `IsolationLevel`.
    ///
    /// # Errors
    ///
    /// Returns an error if the string names no known level.
    pub fn isolation_level(&self) -> Result<IsolationLevel> {
        self.isolation.parse()
    }

    /// Barrier timeout as a `Duration`, if configured.
    pub fn barrier_timeout(&self) -> Option<Duration> {
        self.barrier_timeout_ms.map(Duration::from_millis)
    }

    /// Check every field eagerly.
    pub fn validate(&self) -> Result<()> {
        self.isolation_level()?;
        if self.repeat == 0 {
            return Err(Error::InvalidConfig(
                "repeat must be at least 1".to_string(),
            ));
        }
        if self.barrier_timeout_ms == Some(0) {
            return Err(Error::InvalidConfig(
                "barrier_timeout_ms must be positive; omit it to wait indefinitely".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# ssiprobe configuration
#
# Isolation level for both roles: "read-committed", "repeatable-read"
# or "serializable" (default). Anything below serializable is expected
# to let both roles commit.
isolation = "serializable"

# Maximum time (ms) the orchestrator waits for both roles to reach a
# barrier. A role that has not arrived by then is treated as abandoned.
# Unset = wait indefinitely.
# barrier_timeout_ms = 5000

# Runs per scenario. The table is reseeded before every run.
repeat = 1

# Scenarios to run, in catalog order. Empty = all of
# "dirty-read", "phantom-read", "write-skew".
scenarios = []

# Rows inserted before every run.
seed = ["Alice", "Bob"]
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ProbeConfig = toml::from_str(&content).map_err(|e| {
            Error::InvalidConfig(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::InvalidConfig(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
