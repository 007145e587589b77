//! TOML configuration file support

use std::path::Path;
use std::time::Duration;

use doclink_core::{DocLinkError, Result};
use serde::{Deserialize, Serialize};

use super::{LinkOptions, LinkOptionsBuilder};

/// On-disk form of the link configuration
///
/// Durations are whole seconds, the retry window whole minutes. Every key is
/// optional except `connection_target`, which may also be supplied later
/// through [`LinkOptionsBuilder::with_connection_target`].
///
/// ```toml
/// application_name = "billing-worker"
/// connection_target = "mongodb://db1:27017/billing"
/// connect_timeout_secs = 30
/// operation_timeout_secs = 10
/// retry_interval_secs = 5
/// max_attempts = 3
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinkConfigFile {
    pub application_name: Option<String>,
    pub connection_target: Option<String>,
    pub connect_timeout_secs: u64,
    pub operation_timeout_secs: u64,
    pub retry_forever: bool,
    pub retry_interval_secs: u64,
    pub max_attempts: u32,
    pub max_retry_window_minutes: u64,
    pub verbose_logging: bool,
}

impl LinkConfigFile {
    /// Parse a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| {
            DocLinkError::InvalidConfiguration(format!("Invalid link configuration: {}", e))
        })
    }

    /// Read and parse a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            DocLinkError::InvalidConfiguration(format!(
                "Failed to read link configuration {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&source)
    }

    /// Convert into a builder so callers can layer overrides before building
    pub fn into_builder(self) -> LinkOptionsBuilder {
        let mut builder = LinkOptionsBuilder::new(self.connection_target.unwrap_or_default())
            .with_connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .with_operation_timeout(Duration::from_secs(self.operation_timeout_secs))
            .with_retry_forever(self.retry_forever)
            .with_retry_interval(Duration::from_secs(self.retry_interval_secs))
            .with_max_attempts(self.max_attempts)
            .with_max_retry_window(Duration::from_secs(
                self.max_retry_window_minutes.saturating_mul(60),
            ))
            .with_verbose_logging(self.verbose_logging);
        if let Some(name) = self.application_name {
            builder = builder.with_application_name(name);
        }
        builder
    }

    /// Build options directly from the file contents
    pub fn build(self) -> Result<LinkOptions> {
        self.into_builder().build()
    }
}
