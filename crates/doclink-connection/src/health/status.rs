//! Health classification
//!
//! A link is judged on what one health check saw: whether the ping got through,
//! how long it took, and whether the link was replacing its handle meanwhile.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Ping latency above which a link counts as degraded, unless overridden
pub const SLOW_PING_DEFAULT: Duration = Duration::from_millis(100);

/// Health of a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// The ping went through quickly on a settled handle
    Healthy,
    /// The ping went through, but slowly or across a reconnect
    Degraded,
    /// The ping failed; operations will fail too
    Unhealthy,
}

/// What a single health check observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthObservation {
    /// Round-trip time, if the ping succeeded
    pub latency: Option<Duration>,
    /// A connect loop was running when the check started
    pub reconnecting: bool,
    /// The handle was replaced while the check ran
    pub reconnected: bool,
}

impl HealthStatus {
    /// Classify an observation.
    ///
    /// ```
    /// use doclink_connection::health::{HealthStatus, HealthObservation};
    /// use std::time::Duration;
    ///
    /// let quick = HealthObservation {
    ///     latency: Some(Duration::from_millis(4)),
    ///     reconnecting: false,
    ///     reconnected: false,
    /// };
    /// let slow_ping = Duration::from_millis(100);
    /// assert_eq!(HealthStatus::classify(&quick, slow_ping), HealthStatus::Healthy);
    ///
    /// let after_reconnect = HealthObservation { reconnected: true, ..quick };
    /// assert_eq!(HealthStatus::classify(&after_reconnect, slow_ping), HealthStatus::Degraded);
    /// ```
    pub fn classify(observation: &HealthObservation, slow_ping: Duration) -> Self {
        match observation.latency {
            None => HealthStatus::Unhealthy,
            Some(_) if observation.reconnecting || observation.reconnected => {
                HealthStatus::Degraded
            }
            Some(latency) if latency > slow_ping => HealthStatus::Degraded,
            Some(_) => HealthStatus::Healthy,
        }
    }

    /// Whether guarded operations can be expected to succeed
    pub fn serves_operations(&self) -> bool {
        !matches!(self, HealthStatus::Unhealthy)
    }
}
