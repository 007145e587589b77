//! The connection session
//!
//! A [`Link`] owns one logical connection to a document store. It connects
//! through a [`DocumentDriver`], keeps the live client handle, and runs every
//! data operation through a guard that reconnects once when the driver
//! reports that its connection was dropped.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use doclink_connection::{Link, LinkOptions};
//! use doclink_driver_mongodb::MongoDbDriver;
//!
//! let options = LinkOptions::builder("mongodb://127.0.0.1:27017")
//!     .with_max_attempts(3)
//!     .build()?;
//! let link = Link::new(options, Arc::new(MongoDbDriver::new())).await?;
//!
//! let total = link.count_documents("shop", "orders", bson::doc! {}).await?;
//! ```

mod collection;
mod guard;
mod session;


use std::fmt;
use std::sync::Arc;

use doclink_core::{DocLinkError, DocumentClient, DocumentDriver, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::LinkOptions;
use crate::diagnostics::{Diagnostics, DiagnosticsSink, NoopSink};
use crate::retry::{RetryPolicy, RetryState};

pub use collection::LinkCollection;

/// Lifecycle state of a [`Link`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkState {
    /// No live handle
    Disconnected,
    /// A connect loop is running; a previous handle, if any, stays in use
    Connecting,
    /// A handle passed its health probe and is installed
    Connected,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkState::Disconnected => write!(f, "disconnected"),
            LinkState::Connecting => write!(f, "connecting"),
            LinkState::Connected => write!(f, "connected"),
        }
    }
}

/// The handle and what operations need to know about it
struct Slot {
    state: LinkState,
    client: Option<Arc<dyn DocumentClient>>,
    /// Bumped whenever the handle is installed or dropped
    generation: u64,
    /// Error that dropped the handle, handed to operations that were waiting on it
    failure: Option<DocLinkError>,
}

/// A single logical connection to a document store
///
/// `Link` is shared by reference (typically behind an `Arc`) between
/// concurrent callers. Data operations only take a read lock to borrow the
/// current handle; connect and reconnect are serialized by a separate mutex
/// that also guards the retry counters.
pub struct Link {
    options: LinkOptions,
    policy: RetryPolicy,
    driver: Arc<dyn DocumentDriver>,
    slot: RwLock<Slot>,
    retry: Mutex<RetryState>,
    cancel: CancellationToken,
    diagnostics: Diagnostics,
}

impl Link {
    /// Create a link without connecting it
    ///
    /// The retry window is anchored at this moment until the first
    /// successful connect.
    pub fn detached(options: LinkOptions, driver: Arc<dyn DocumentDriver>) -> Self {
        let policy = options.retry_policy();
        let diagnostics = Diagnostics::new(Arc::new(NoopSink), options.verbose_logging());
        Self {
            options,
            policy,
            driver,
            slot: RwLock::new(Slot {
                state: LinkState::Disconnected,
                client: None,
                generation: 0,
                failure: None,
            }),
            retry: Mutex::new(RetryState::new(Instant::now())),
            cancel: CancellationToken::new(),
            diagnostics,
        }
    }

    /// Create a link and connect it
    ///
    /// Fails with [`DocLinkError::ConnectionFailed`] when the retry policy is
    /// exhausted, or [`DocLinkError::InvalidConfiguration`] when the driver
    /// rejects the target.
    pub async fn new(options: LinkOptions, driver: Arc<dyn DocumentDriver>) -> Result<Self> {
        let link = Self::detached(options, driver);
        link.connect().await?;
        Ok(link)
    }

    /// Send lifecycle diagnostics to `sink`
    ///
    /// Events are only produced when verbose logging is enabled. Any
    /// configuration substitutions are reported to the new sink right away.
    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = self.diagnostics.with_sink(sink);
        for substitution in self.options.substitutions() {
            self.diagnostics.emit(
                "options.build",
                format_args!(
                    "{} {:?} is below the minimum, using {:?}",
                    substitution.field, substitution.requested, substitution.applied
                ),
            );
        }
        self
    }

    /// Abort connect loops and operations when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn options(&self) -> &LinkOptions {
        &self.options
    }

    pub fn state(&self) -> LinkState {
        self.slot.read().state
    }

    /// Counter bumped each time the handle is installed or dropped
    pub(crate) fn generation(&self) -> u64 {
        self.slot.read().generation
    }

    /// Whether a live handle is installed
    pub fn is_connected(&self) -> bool {
        self.slot.read().client.is_some()
    }

    /// Snapshot of the retry counters
    ///
    /// Waits for an in-flight connect to finish.
    pub async fn retry_state(&self) -> RetryState {
        *self.retry.lock().await
    }

    /// Cancel in-flight connect loops and operations
    ///
    /// Cancellation is permanent for this link's token.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Cancel, then release the handle
    pub async fn close(&self) {
        self.cancel();
        self.disconnect().await;
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.slot.read();
        f.debug_struct("Link")
            .field("target", &self.options.redacted_target())
            .field("driver", &self.driver.name())
            .field("state", &slot.state)
            .field("generation", &slot.generation)
            .finish_non_exhaustive()
    }
}
