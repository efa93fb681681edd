//! Supervisor configuration loaded from a JSON document.
//!
//! A representative document is:
//!
//! ```json
//! {
//!   "dry_run": false,
//!   "probe_interval_millis": 500,
//!   "services": [
//!     { "name": "db", "command": "postgres", "args": ["-D", "/tmp/pg"], "port": 5432 },
//!     { "name": "worker", "command": "worker", "grace_period_secs": 2 },
//!     { "name": "cache", "command": "redis-server", "health_timeout_millis": 1500 }
//!   ]
//! }
//! ```
//!
//! Budgets given in milliseconds take precedence over their seconds fields.

use crate::supervision::{
    adapters::DEFAULT_CONNECT_TIMEOUT,
    domain::{ServiceName, ServiceSpec},
    services::DEFAULT_PROBE_INTERVAL,
};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

/// Environment variable that forces dry-run mode when set to a truthy value.
pub const DRY_RUN_ENV: &str = "FOREMAN_DRY_RUN";

/// Errors raised while loading supervisor configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// Path that was read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid configuration JSON.
    #[error("failed to parse config: {0}")]
    Parse(#[source] serde_json::Error),

    /// Two services share a name.
    #[error("service name '{0}' is declared more than once")]
    DuplicateServiceName(ServiceName),
}

const fn default_probe_interval_millis() -> u64 {
    millis(DEFAULT_PROBE_INTERVAL)
}

const fn default_probe_connect_timeout_millis() -> u64 {
    millis(DEFAULT_CONNECT_TIMEOUT)
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "default intervals are a few hundred milliseconds"
)]
const fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

/// Settings for one supervision run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SupervisorConfig {
    #[serde(default)]
    dry_run: bool,
    #[serde(default = "default_probe_interval_millis")]
    probe_interval_millis: u64,
    #[serde(default = "default_probe_connect_timeout_millis")]
    probe_connect_timeout_millis: u64,
    #[serde(default)]
    services: Vec<ServiceSpec>,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            probe_interval_millis: default_probe_interval_millis(),
            probe_connect_timeout_millis: default_probe_connect_timeout_millis(),
            services: Vec::new(),
        }
    }
}

impl SupervisorConfig {
    /// Reads and validates the configuration at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read, does not parse,
    /// or declares a service name twice.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Parses and validates configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the document does not parse or declares a
    /// service name twice.
    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(contents).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides read through `lookup`, typically [`std::env::var`].
    ///
    /// `FOREMAN_DRY_RUN` set to `1`, `true`, or `yes` enables dry run; `0`,
    /// `false`, or `no` disables it. Other values are ignored.
    #[must_use]
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(flag) = lookup(DRY_RUN_ENV).as_deref().and_then(parse_flag) {
            self.dry_run = flag;
        }
        self
    }

    /// Returns whether services are simulated instead of spawned.
    #[must_use]
    pub const fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Returns the pause between health probes.
    #[must_use]
    pub const fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_millis)
    }

    /// Returns the timeout for a single port probe.
    #[must_use]
    pub const fn probe_connect_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_connect_timeout_millis)
    }

    /// Returns the services in start order.
    #[must_use]
    pub fn services(&self) -> &[ServiceSpec] {
        &self.services
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for spec in &self.services {
            if !seen.insert(spec.name()) {
                return Err(ConfigError::DuplicateServiceName(spec.name().clone()));
            }
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}
