//! Guarded ping and health check

use std::time::Duration;

use chrono::{DateTime, Utc};
use doclink_core::Result;
use serde::Serialize;
use tokio::time::Instant;

use super::status::{HealthStatus, HealthObservation, SLOW_PING_DEFAULT};
use crate::link::{Link, LinkState};

/// Outcome of [`Link::check_health`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthCheckResult {
    pub status: HealthStatus,
    /// Link state once the check finished
    pub state: LinkState,
    /// Round-trip time, if the ping succeeded
    pub latency: Option<Duration>,
    /// The check went through a reconnect
    pub reconnected: bool,
    /// Error message, if the ping failed
    pub error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl Link {
    /// Ping the server through the operation guard, returning the round-trip time
    pub async fn ping(&self) -> Result<Duration> {
        self.guarded("link.ping", |client| async move {
            let started = Instant::now();
            client.ping().await?;
            Ok(started.elapsed())
        })
        .await
    }

    /// Ping the link, counting pings slower than 100ms as degraded
    pub async fn check_health(&self) -> HealthCheckResult {
        self.check_health_with(SLOW_PING_DEFAULT).await
    }

    pub async fn check_health_with(&self, slow_ping: Duration) -> HealthCheckResult {
        let reconnecting = self.state() == LinkState::Connecting;
        let generation = self.generation();

        let outcome = self.ping().await;
        let reconnected = self.generation() != generation;
        let observation = HealthObservation {
            latency: outcome.as_ref().ok().copied(),
            reconnecting,
            reconnected,
        };
        let error = outcome.err().map(|err| {
            tracing::debug!(error = %err, "health check failed");
            err.to_string()
        });

        HealthCheckResult {
            status: HealthStatus::classify(&observation, slow_ping),
            state: self.state(),
            latency: observation.latency,
            reconnected,
            error,
            checked_at: Utc::now(),
        }
    }
}
