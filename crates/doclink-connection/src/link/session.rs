//! Connect, reconnect and disconnect

use std::sync::Arc;

use doclink_core::{ClientSettings, DocLinkError, DocumentClient, Result};
use tokio::time::{Instant, timeout};

use super::{Link, LinkState};
use crate::retry::RetryState;

impl Link {
    /// Connect, retrying per the link's retry policy
    ///
    /// Each attempt opens a client and probes it with a ping, both bounded
    /// by the connect timeout. A successful attempt replaces the current
    /// handle. When the policy is exhausted the handle is dropped and the
    /// last attempt's error is returned as [`DocLinkError::ConnectionFailed`].
    ///
    /// Concurrent calls are serialized.
    #[tracing::instrument(
        skip(self),
        fields(uri = %self.options.redacted_target(), driver = self.driver.name())
    )]
    pub async fn connect(&self) -> Result<()> {
        let mut retry = self.retry.lock().await;
        self.establish(&mut retry).await
    }

    /// Reconnect on behalf of an operation that saw a disconnect on the
    /// handle of `observed` generation.
    ///
    /// If another caller replaced or dropped that handle while this one
    /// waited, its outcome is reused instead of connecting again.
    pub(super) async fn reconnect_after(&self, observed: u64) -> Result<()> {
        let mut retry = self.retry.lock().await;
        {
            let slot = self.slot.read();
            if slot.generation != observed {
                if slot.client.is_some() {
                    tracing::debug!(generation = slot.generation, "handle already replaced");
                    return Ok(());
                }
                return Err(slot.failure.clone().unwrap_or_else(|| {
                    DocLinkError::NotConnected("link was disconnected".to_string())
                }));
            }
        }
        self.diagnostics.emit(
            "link.reconnect",
            format_args!("reconnecting to {}", self.options.redacted_target()),
        );
        self.establish(&mut retry).await
    }

    /// The connect loop; the caller holds the retry lock
    async fn establish(&self, retry: &mut RetryState) -> Result<()> {
        let settings = self.options.client_settings();
        let redacted = self.options.redacted_target();
        self.slot.write().state = LinkState::Connecting;
        let _restore = ConnectingScope { link: self };

        let mut attempts: u32 = 0;
        loop {
            attempts = attempts.saturating_add(1);
            tracing::debug!(attempt = attempts, "connect attempt");
            self.diagnostics.emit(
                "link.connect",
                format_args!("attempt {} to {}", attempts, redacted),
            );

            let outcome = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(DocLinkError::Cancelled),
                result = self.attempt(&settings) => result,
            };

            let err = match outcome {
                Ok(client) => {
                    self.policy.record_success(retry, Instant::now());
                    self.install(client);
                    tracing::debug!(attempts, "connected");
                    self.diagnostics.emit(
                        "link.connect",
                        format_args!("connected to {} after {} attempt(s)", redacted, attempts),
                    );
                    return Ok(());
                }
                Err(err) => err,
            };

            if err.is_fatal_for_connect() {
                self.diagnostics
                    .emit("link.connect", format_args!("giving up: {}", err));
                self.abandon(err.clone());
                return Err(err);
            }

            self.policy.record_failure(retry);
            if !self.policy.can_retry(retry, Instant::now()) {
                let failure = DocLinkError::ConnectionFailed {
                    attempts,
                    message: err.to_string(),
                };
                tracing::warn!(attempts, error = %err, "retry policy exhausted");
                self.diagnostics
                    .emit("link.connect", format_args!("giving up: {}", failure));
                self.abandon(failure.clone());
                return Err(failure);
            }

            let interval = self.policy.retry_interval();
            tracing::debug!(attempt = attempts, error = %err, ?interval, "connect failed, retrying");
            self.diagnostics.emit(
                "link.connect",
                format_args!("attempt {} failed: {}; retrying in {:?}", attempts, err, interval),
            );

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    self.diagnostics.emit("link.connect", "cancelled while waiting to retry");
                    self.abandon(DocLinkError::Cancelled);
                    return Err(DocLinkError::Cancelled);
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }

    /// One connect plus health probe, each with a fresh connect-timeout budget
    async fn attempt(&self, settings: &ClientSettings) -> Result<Arc<dyn DocumentClient>> {
        let budget = self.options.connect_timeout();
        let client = timeout(
            budget,
            self.driver.connect(self.options.connection_target(), settings),
        )
        .await
        .map_err(|_| {
            DocLinkError::OperationFailed(format!("connect timed out after {:?}", budget))
        })??;

        let probe = match timeout(budget, client.ping()).await {
            Ok(result) => result,
            Err(_) => Err(DocLinkError::OperationFailed(format!(
                "ping timed out after {:?}",
                budget
            ))),
        };
        if let Err(err) = probe {
            self.close_in_background(client);
            return Err(err);
        }
        Ok(client)
    }

    fn install(&self, client: Arc<dyn DocumentClient>) {
        let previous = {
            let mut slot = self.slot.write();
            slot.generation += 1;
            slot.state = LinkState::Connected;
            slot.failure = None;
            slot.client.replace(client)
        };
        if let Some(previous) = previous {
            self.close_in_background(previous);
        }
    }

    /// Drop the handle after a failed connect
    fn abandon(&self, failure: DocLinkError) {
        let previous = {
            let mut slot = self.slot.write();
            slot.generation += 1;
            slot.state = LinkState::Disconnected;
            slot.failure = Some(failure);
            slot.client.take()
        };
        if let Some(previous) = previous {
            self.close_in_background(previous);
        }
    }

    fn close_in_background(&self, client: Arc<dyn DocumentClient>) {
        let budget = self.options.connect_timeout();
        tokio::spawn(async move {
            match timeout(budget, client.disconnect()).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => tracing::debug!(error = %err, "closing stale handle failed"),
                Err(_) => tracing::debug!("closing stale handle timed out"),
            }
        });
    }

    /// Release the handle
    ///
    /// Close errors and timeouts are logged, never returned. Calling this on
    /// a disconnected link does nothing.
    #[tracing::instrument(skip(self), fields(uri = %self.options.redacted_target()))]
    pub async fn disconnect(&self) {
        let previous = {
            let mut slot = self.slot.write();
            slot.generation += 1;
            slot.state = LinkState::Disconnected;
            slot.failure = None;
            slot.client.take()
        };
        let Some(client) = previous else {
            tracing::debug!("already disconnected");
            return;
        };

        let budget = self.options.connect_timeout();
        match timeout(budget, client.disconnect()).await {
            Ok(Ok(())) => {
                tracing::debug!("disconnected");
                self.diagnostics.emit(
                    "link.disconnect",
                    format_args!("disconnected from {}", self.options.redacted_target()),
                );
            }
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "disconnect failed");
                self.diagnostics
                    .emit("link.disconnect", format_args!("disconnect failed: {}", err));
            }
            Err(_) => {
                tracing::warn!(?budget, "disconnect timed out");
                self.diagnostics.emit(
                    "link.disconnect",
                    format_args!("disconnect timed out after {:?}", budget),
                );
            }
        }
    }
}

/// Settles a `Connecting` state left behind when the connect future is
/// dropped before the loop returns
struct ConnectingScope<'a> {
    link: &'a Link,
}

impl Drop for ConnectingScope<'_> {
    fn drop(&mut self) {
        let mut slot = self.link.slot.write();
        if slot.state == LinkState::Connecting {
            slot.state = if slot.client.is_some() {
                LinkState::Connected
            } else {
                LinkState::Disconnected
            };
        }
    }
}
