//! Driver collaborator traits
//!
//! The link never speaks a wire protocol itself. A driver establishes client
//! handles; a client handle exposes health checks and the collection-scoped
//! primitives the link sequences and times.

use crate::{ClientSettings, Namespace, Result, UpdateOutcome};
use async_trait::async_trait;
use bson::{Bson, Document};
use std::sync::Arc;

/// Establishes client handles to a document store
#[async_trait]
pub trait DocumentDriver: Send + Sync {
    /// Driver identifier (e.g., "mongodb")
    fn name(&self) -> &'static str;

    /// Open a client handle for `target`.
    ///
    /// Implementations return [`crate::DocLinkError::InvalidConfiguration`]
    /// when the target or settings can never be accepted, so the caller does
    /// not retry them.
    async fn connect(
        &self,
        target: &str,
        settings: &ClientSettings,
    ) -> Result<Arc<dyn DocumentClient>>;
}

/// A live client handle
///
/// Handles must be safe for concurrent use. Once `disconnect` has been called
/// every further call fails with [`crate::DocLinkError::Disconnected`].
#[async_trait]
pub trait DocumentClient: Send + Sync {
    /// Round-trip health probe against the primary
    async fn ping(&self) -> Result<()>;

    /// Release the handle and its pooled connections
    async fn disconnect(&self) -> Result<()>;

    /// All documents matching `filter`, in cursor order
    async fn find(&self, ns: &Namespace, filter: Document) -> Result<Vec<Document>>;

    /// One document matching `filter`, if any
    async fn find_one(&self, ns: &Namespace, filter: Document) -> Result<Option<Document>>;

    /// Insert one document, returning its identifier
    async fn insert_one(&self, ns: &Namespace, document: Document) -> Result<Bson>;

    /// Insert documents, returning their identifiers in input order
    async fn insert_many(&self, ns: &Namespace, documents: Vec<Document>) -> Result<Vec<Bson>>;

    async fn update_one(
        &self,
        ns: &Namespace,
        filter: Document,
        update: Document,
    ) -> Result<UpdateOutcome>;

    async fn update_many(
        &self,
        ns: &Namespace,
        filter: Document,
        update: Document,
    ) -> Result<UpdateOutcome>;

    /// Delete at most one document, returning the number deleted
    async fn delete_one(&self, ns: &Namespace, filter: Document) -> Result<u64>;

    /// Delete all matching documents, returning the number deleted
    async fn delete_many(&self, ns: &Namespace, filter: Document) -> Result<u64>;

    /// Count matching documents; an empty filter counts the collection
    async fn count_documents(&self, ns: &Namespace, filter: Document) -> Result<u64>;
}
