//! DocLink Connection - connection lifecycle for document stores
//!
//! This crate keeps one logical connection to a document-store cluster
//! alive and runs data operations through it:
//!
//! - [`config`] - Normalized link options, built in code or loaded from TOML
//! - [`retry`] - Decides whether another connect attempt is permitted
//! - [`Link`] - Connects, reconnects on demand and guards every operation
//! - [`diagnostics`] - Optional one-line lifecycle events
//! - [`health`] - Ping latency and health classification
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use doclink_connection::{Link, LinkOptions, TracingSink};
//!
//! let options = LinkOptions::builder("mongodb://127.0.0.1:27017")
//!     .with_max_attempts(3)
//!     .with_verbose_logging(true)
//!     .build()?;
//!
//! let link = Link::detached(options, driver).with_diagnostics(Arc::new(TracingSink));
//! link.connect().await?;
//!
//! let orders = link.collection("shop", "orders");
//! let open: u64 = orders.count_documents(bson::doc! { "status": "open" }).await?;
//! ```

pub mod config;
pub mod diagnostics;
pub mod health;
pub mod retry;

mod link;

#[cfg(test)]
mod mock;

pub use config::{LinkConfigFile, LinkOptions, LinkOptionsBuilder};
pub use diagnostics::{Diagnostic, DiagnosticsSink, MemorySink, NoopSink, TracingSink};
pub use health::{HealthCheckResult, HealthStatus};
pub use link::{Link, LinkCollection, LinkState};
pub use retry::{RetryPolicy, RetryState};
