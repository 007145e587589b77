//! Guarded data operations
//!
//! Every operation borrows the current handle, runs bounded by the
//! operation timeout, and on the driver's disconnect signature reconnects
//! once and runs once more. Other errors are returned as they are.

use std::future::Future;
use std::sync::Arc;

use bson::{Bson, Document};
use doclink_core::{DocLinkError, DocumentClient, Namespace, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{Link, LinkCollection};

impl Link {
    /// Handle bound to one collection
    pub fn collection(
        &self,
        database: impl Into<String>,
        collection: impl Into<String>,
    ) -> LinkCollection<'_> {
        LinkCollection::new(self, Namespace::new(database, collection))
    }

    /// All documents matching `filter`, decoded as `T`
    pub async fn find<T: DeserializeOwned>(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
    ) -> Result<Vec<T>> {
        self.find_in(&Namespace::new(database, collection), filter)
            .await
    }

    /// One document matching `filter`, or [`DocLinkError::NotFound`]
    pub async fn find_one<T: DeserializeOwned>(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
    ) -> Result<T> {
        self.find_one_in(&Namespace::new(database, collection), filter)
            .await
    }

    /// Insert one document, returning its identifier
    pub async fn insert_one<T: Serialize>(
        &self,
        database: &str,
        collection: &str,
        document: &T,
    ) -> Result<Bson> {
        self.insert_one_in(&Namespace::new(database, collection), document)
            .await
    }

    /// Insert documents, returning their identifiers in input order
    pub async fn insert_many<T: Serialize>(
        &self,
        database: &str,
        collection: &str,
        documents: &[T],
    ) -> Result<Vec<Bson>> {
        self.insert_many_in(&Namespace::new(database, collection), documents)
            .await
    }

    /// Update the first matching document, returning the matched count
    pub async fn update_one(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> Result<u64> {
        self.update_one_in(&Namespace::new(database, collection), filter, update)
            .await
    }

    /// Update every matching document, returning the matched count
    ///
    /// Documents the update leaves unchanged still count as matched.
    pub async fn update_many(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> Result<u64> {
        self.update_many_in(&Namespace::new(database, collection), filter, update)
            .await
    }

    pub async fn delete_one(&self, database: &str, collection: &str, filter: Document) -> Result<u64> {
        self.delete_one_in(&Namespace::new(database, collection), filter)
            .await
    }

    pub async fn delete_many(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
    ) -> Result<u64> {
        self.delete_many_in(&Namespace::new(database, collection), filter)
            .await
    }

    /// Count documents matching `filter`; an empty filter counts the collection
    pub async fn count_documents(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
    ) -> Result<u64> {
        self.count_documents_in(&Namespace::new(database, collection), filter)
            .await
    }

    pub(crate) async fn find_in<T: DeserializeOwned>(
        &self,
        ns: &Namespace,
        filter: Document,
    ) -> Result<Vec<T>> {
        let documents = self
            .guarded("link.find", |client| {
                let filter = filter.clone();
                async move { client.find(ns, filter).await }
            })
            .await?;
        documents
            .into_iter()
            .map(|document| bson::from_document(document).map_err(DocLinkError::from))
            .collect()
    }

    pub(crate) async fn find_one_in<T: DeserializeOwned>(
        &self,
        ns: &Namespace,
        filter: Document,
    ) -> Result<T> {
        let found = self
            .guarded("link.find_one", |client| {
                let filter = filter.clone();
                async move { client.find_one(ns, filter).await }
            })
            .await?;
        match found {
            Some(document) => Ok(bson::from_document(document)?),
            None => Err(DocLinkError::NotFound(format!(
                "no document in {} matches {}",
                ns, filter
            ))),
        }
    }

    pub(crate) async fn insert_one_in<T: Serialize>(
        &self,
        ns: &Namespace,
        document: &T,
    ) -> Result<Bson> {
        let document = bson::to_document(document)?;
        self.guarded("link.insert_one", |client| {
            let document = document.clone();
            async move { client.insert_one(ns, document).await }
        })
        .await
    }

    pub(crate) async fn insert_many_in<T: Serialize>(
        &self,
        ns: &Namespace,
        documents: &[T],
    ) -> Result<Vec<Bson>> {
        if documents.is_empty() {
            return Err(DocLinkError::OperationFailed(
                "insert_many requires at least one document".to_string(),
            ));
        }
        let documents = documents
            .iter()
            .map(bson::to_document)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.guarded("link.insert_many", |client| {
            let documents = documents.clone();
            async move { client.insert_many(ns, documents).await }
        })
        .await
    }

    pub(crate) async fn update_one_in(
        &self,
        ns: &Namespace,
        filter: Document,
        update: Document,
    ) -> Result<u64> {
        let outcome = self
            .guarded("link.update_one", |client| {
                let (filter, update) = (filter.clone(), update.clone());
                async move { client.update_one(ns, filter, update).await }
            })
            .await?;
        Ok(outcome.matched)
    }

    pub(crate) async fn update_many_in(
        &self,
        ns: &Namespace,
        filter: Document,
        update: Document,
    ) -> Result<u64> {
        let outcome = self
            .guarded("link.update_many", |client| {
                let (filter, update) = (filter.clone(), update.clone());
                async move { client.update_many(ns, filter, update).await }
            })
            .await?;
        Ok(outcome.matched)
    }

    pub(crate) async fn delete_one_in(&self, ns: &Namespace, filter: Document) -> Result<u64> {
        self.guarded("link.delete_one", |client| {
            let filter = filter.clone();
            async move { client.delete_one(ns, filter).await }
        })
        .await
    }

    pub(crate) async fn delete_many_in(&self, ns: &Namespace, filter: Document) -> Result<u64> {
        self.guarded("link.delete_many", |client| {
            let filter = filter.clone();
            async move { client.delete_many(ns, filter).await }
        })
        .await
    }

    pub(crate) async fn count_documents_in(
        &self,
        ns: &Namespace,
        filter: Document,
    ) -> Result<u64> {
        self.guarded("link.count_documents", |client| {
            let filter = filter.clone();
            async move { client.count_documents(ns, filter).await }
        })
        .await
    }

    /// Run `operation` against the live handle, reconnecting once on a
    /// disconnect
    ///
    /// The handle is re-read after the reconnect; the retried call gets a
    /// fresh timeout budget.
    pub(crate) async fn guarded<T, F, Fut>(&self, routine: &'static str, operation: F) -> Result<T>
    where
        F: Fn(Arc<dyn DocumentClient>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let (client, generation) = self.live_client(routine)?;
        match self.bounded(routine, operation(client)).await {
            Err(err) if err.is_disconnect() => {
                tracing::debug!(routine, error = %err, "disconnect detected, reconnecting once");
                self.diagnostics
                    .emit(routine, format_args!("{}; reconnecting", err));
                self.reconnect_after(generation).await?;
                let (client, _) = self.live_client(routine)?;
                self.bounded(routine, operation(client)).await
            }
            outcome => outcome,
        }
    }

    /// Current handle and its generation
    fn live_client(&self, routine: &'static str) -> Result<(Arc<dyn DocumentClient>, u64)> {
        let slot = self.slot.read();
        match &slot.client {
            Some(client) => Ok((client.clone(), slot.generation)),
            None => Err(DocLinkError::NotConnected(format!(
                "{}: link has no live connection",
                routine
            ))),
        }
    }

    /// Bound `operation` by the operation timeout and the link's cancellation
    async fn bounded<T>(
        &self,
        routine: &'static str,
        operation: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let budget = self.options.operation_timeout();
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(DocLinkError::Cancelled),
            result = tokio::time::timeout(budget, operation) => match result {
                Ok(outcome) => outcome,
                Err(_) => Err(DocLinkError::OperationFailed(format!(
                    "{} timed out after {:?}",
                    routine, budget
                ))),
            },
        }
    }
}
