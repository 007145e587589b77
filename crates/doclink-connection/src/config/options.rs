//! Link configuration types

use std::time::Duration;

use doclink_core::{
    ClientSettings, DocLinkError, MAX_IDLE_TIME_DEFAULT, MIN_POOL_SIZE_DEFAULT, Result,
    redact_target,
};
use serde::Serialize;

use crate::retry::RetryPolicy;

/// Smallest accepted connect timeout
pub const CONNECT_TIMEOUT_MIN: Duration = Duration::from_secs(3);
/// Connect timeout used when the requested one is unset or below the floor
pub const CONNECT_TIMEOUT_DEFAULT: Duration = Duration::from_secs(30);
/// Smallest accepted operation timeout
pub const OPERATION_TIMEOUT_MIN: Duration = Duration::from_secs(1);
/// Operation timeout used when the requested one is unset or below the floor
pub const OPERATION_TIMEOUT_DEFAULT: Duration = Duration::from_secs(10);
/// Smallest accepted sleep between connect attempts
pub const RETRY_INTERVAL_MIN: Duration = Duration::from_secs(5);
/// Retry interval used when the requested one is unset or below the floor
pub const RETRY_INTERVAL_DEFAULT: Duration = Duration::from_secs(5);
/// Application name reported when none is given
pub const APPLICATION_NAME_DEFAULT: &str = "doclink";

/// A tunable that was replaced by its default during [`LinkOptionsBuilder::build`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Substitution {
    /// Name of the tunable
    pub field: &'static str,
    /// Value the caller asked for
    pub requested: Duration,
    /// Value that was applied instead
    pub applied: Duration,
}

/// Immutable link configuration
///
/// Only obtainable through [`LinkOptionsBuilder::build`], so every instance
/// has already been normalized and validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkOptions {
    application_name: String,
    connection_target: String,
    connect_timeout: Duration,
    operation_timeout: Duration,
    retry_forever: bool,
    retry_interval: Duration,
    max_attempts: u32,
    max_retry_window: Duration,
    verbose_logging: bool,
    substitutions: Vec<Substitution>,
}

impl LinkOptions {
    /// Start building options for the given connection target
    pub fn builder(connection_target: impl Into<String>) -> LinkOptionsBuilder {
        LinkOptionsBuilder::new(connection_target)
    }

    /// Name reported to the server
    pub fn application_name(&self) -> &str {
        &self.application_name
    }

    /// Connection URI, credentials included
    pub fn connection_target(&self) -> &str {
        &self.connection_target
    }

    /// Connection URI with the password masked, for logs
    pub fn redacted_target(&self) -> String {
        redact_target(&self.connection_target)
    }

    /// Bound on a single connect attempt (connect plus health probe)
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Bound on a single data operation
    pub fn operation_timeout(&self) -> Duration {
        self.operation_timeout
    }

    pub fn retry_forever(&self) -> bool {
        self.retry_forever
    }

    /// Sleep between connect attempts
    pub fn retry_interval(&self) -> Duration {
        self.retry_interval
    }

    /// Cap on failed attempts since the last successful connect; 0 means unlimited
    ///
    /// The count carries over between `connect` calls until one succeeds.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Window after the last success during which retries are allowed; zero means unlimited
    pub fn max_retry_window(&self) -> Duration {
        self.max_retry_window
    }

    pub fn verbose_logging(&self) -> bool {
        self.verbose_logging
    }

    /// Tunables that were replaced by their defaults
    pub fn substitutions(&self) -> &[Substitution] {
        &self.substitutions
    }

    /// The retry policy these options describe
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_forever,
            self.max_attempts,
            self.max_retry_window,
            self.retry_interval,
        )
    }

    /// Driver-level options for a connect attempt
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            app_name: Some(self.application_name.clone()),
            connect_timeout: self.connect_timeout,
            operation_timeout: self.operation_timeout,
            min_pool_size: MIN_POOL_SIZE_DEFAULT,
            max_idle_time: MAX_IDLE_TIME_DEFAULT,
        }
    }
}

/// Builder collecting raw tunables for [`LinkOptions`]
#[derive(Debug, Clone, Default)]
pub struct LinkOptionsBuilder {
    application_name: Option<String>,
    connection_target: String,
    connect_timeout: Duration,
    operation_timeout: Duration,
    retry_forever: bool,
    retry_interval: Duration,
    max_attempts: u32,
    max_retry_window: Duration,
    verbose_logging: bool,
}

impl LinkOptionsBuilder {
    /// Create a builder with every tunable unset
    pub fn new(connection_target: impl Into<String>) -> Self {
        Self {
            connection_target: connection_target.into(),
            ..Self::default()
        }
    }

    /// Set the advisory application name
    pub fn with_application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = Some(name.into());
        self
    }

    /// Replace the connection target
    pub fn with_connection_target(mut self, target: impl Into<String>) -> Self {
        self.connection_target = target.into();
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Retry connect without limit when no attempt or window limit is set
    pub fn with_retry_forever(mut self, retry_forever: bool) -> Self {
        self.retry_forever = retry_forever;
        self
    }

    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Cap connect attempts (0 = unlimited)
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Limit retries to a window after the last success (zero = unlimited)
    pub fn with_max_retry_window(mut self, window: Duration) -> Self {
        self.max_retry_window = window;
        self
    }

    pub fn with_verbose_logging(mut self, verbose: bool) -> Self {
        self.verbose_logging = verbose;
        self
    }

    /// Normalize and validate the tunables.
    ///
    /// Fails with [`DocLinkError::InvalidConfiguration`] when the connection
    /// target is empty. Timeouts and the retry interval below their floor are
    /// replaced by their defaults.
    pub fn build(self) -> Result<LinkOptions> {
        let connection_target = self.connection_target.trim().to_string();
        if connection_target.is_empty() {
            return Err(DocLinkError::InvalidConfiguration(
                "connection target must not be empty".to_string(),
            ));
        }

        let mut substitutions = Vec::new();
        let connect_timeout = floor_or_default(
            "connect_timeout",
            self.connect_timeout,
            CONNECT_TIMEOUT_MIN,
            CONNECT_TIMEOUT_DEFAULT,
            &mut substitutions,
        );
        let operation_timeout = floor_or_default(
            "operation_timeout",
            self.operation_timeout,
            OPERATION_TIMEOUT_MIN,
            OPERATION_TIMEOUT_DEFAULT,
            &mut substitutions,
        );
        let retry_interval = floor_or_default(
            "retry_interval",
            self.retry_interval,
            RETRY_INTERVAL_MIN,
            RETRY_INTERVAL_DEFAULT,
            &mut substitutions,
        );

        let application_name = self
            .application_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| APPLICATION_NAME_DEFAULT.to_string());

        Ok(LinkOptions {
            application_name,
            connection_target,
            connect_timeout,
            operation_timeout,
            retry_forever: self.retry_forever,
            retry_interval,
            max_attempts: self.max_attempts,
            max_retry_window: self.max_retry_window,
            verbose_logging: self.verbose_logging,
            substitutions,
        })
    }
}

/// Raise `requested` to `default` when it is below `floor`.
///
/// An unset (zero) value takes the default silently; an explicit value below
/// the floor is recorded as a substitution.
fn floor_or_default(
    field: &'static str,
    requested: Duration,
    floor: Duration,
    default: Duration,
    substitutions: &mut Vec<Substitution>,
) -> Duration {
    if requested >= floor {
        return requested;
    }
    if !requested.is_zero() {
        substitutions.push(Substitution {
            field,
            requested,
            applied: default,
        });
    }
    default
}
