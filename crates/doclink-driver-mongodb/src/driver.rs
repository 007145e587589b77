//! MongoDB driver implementation

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bson::{Bson, Document, doc};
use doclink_core::{
    ClientSettings, DocLinkError, DocumentClient, DocumentDriver, Namespace, Result,
    UpdateOutcome,
};
use futures::TryStreamExt;
use mongodb::options::{ClientOptions, ReadPreference, SelectionCriteria};
use mongodb::{Client, Collection};

use crate::errors::classify;

/// MongoDB document driver
pub struct MongoDbDriver;

impl MongoDbDriver {
    pub fn new() -> Self {
        tracing::debug!("MongoDB driver initialized");
        Self
    }
}

impl Default for MongoDbDriver {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply link-derived settings on top of parsed connection string options
pub fn apply_settings(options: &mut ClientOptions, settings: &ClientSettings) {
    if let Some(app_name) = &settings.app_name {
        options.app_name = Some(app_name.clone());
    }
    options.connect_timeout = Some(settings.connect_timeout);
    options.server_selection_timeout = Some(settings.connect_timeout);
    options.min_pool_size = Some(settings.min_pool_size);
    options.max_idle_time = Some(settings.max_idle_time);
}

#[async_trait]
impl DocumentDriver for MongoDbDriver {
    fn name(&self) -> &'static str {
        "mongodb"
    }

    #[tracing::instrument(skip(self, target, settings), fields(app = settings.app_name.as_deref()))]
    async fn connect(
        &self,
        target: &str,
        settings: &ClientSettings,
    ) -> Result<Arc<dyn DocumentClient>> {
        tracing::debug!("connecting to MongoDB");

        let mut options = ClientOptions::parse(target).await.map_err(|e| match classify(e) {
            DocLinkError::InvalidConfiguration(message) => DocLinkError::InvalidConfiguration(
                format!("Failed to parse MongoDB options: {}", message),
            ),
            other => other,
        })?;
        apply_settings(&mut options, settings);

        let client = Client::with_options(options).map_err(|e| match classify(e) {
            DocLinkError::InvalidConfiguration(message) => DocLinkError::InvalidConfiguration(
                format!("Failed to create MongoDB client: {}", message),
            ),
            other => other,
        })?;

        Ok(Arc::new(MongoDbClient::new(client)))
    }
}

/// A MongoDB client handle
pub struct MongoDbClient {
    client: Client,
    closed: AtomicBool,
}

impl MongoDbClient {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            closed: AtomicBool::new(false),
        }
    }

    /// Get the MongoDB client
    pub fn client(&self) -> &Client {
        &self.client
    }

    fn ensure_not_closed(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DocLinkError::Disconnected(
                "MongoDB client has been shut down".to_string(),
            ));
        }
        Ok(())
    }

    fn collection(&self, ns: &Namespace) -> Result<Collection<Document>> {
        self.ensure_not_closed()?;
        Ok(self
            .client
            .database(&ns.database)
            .collection::<Document>(&ns.collection))
    }
}

#[async_trait]
impl DocumentClient for MongoDbClient {
    async fn ping(&self) -> Result<()> {
        self.ensure_not_closed()?;
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .selection_criteria(SelectionCriteria::ReadPreference(ReadPreference::Primary))
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        tracing::debug!("shutting down MongoDB client");
        self.client.clone().shutdown().await;
        Ok(())
    }

    async fn find(&self, ns: &Namespace, filter: Document) -> Result<Vec<Document>> {
        let cursor = self.collection(ns)?.find(filter).await.map_err(classify)?;
        cursor.try_collect().await.map_err(classify)
    }

    async fn find_one(&self, ns: &Namespace, filter: Document) -> Result<Option<Document>> {
        self.collection(ns)?
            .find_one(filter)
            .await
            .map_err(classify)
    }

    async fn insert_one(&self, ns: &Namespace, document: Document) -> Result<Bson> {
        let result = self
            .collection(ns)?
            .insert_one(document)
            .await
            .map_err(classify)?;
        Ok(result.inserted_id)
    }

    async fn insert_many(&self, ns: &Namespace, documents: Vec<Document>) -> Result<Vec<Bson>> {
        let result = self
            .collection(ns)?
            .insert_many(documents)
            .await
            .map_err(classify)?;
        let mut ids: Vec<(usize, Bson)> = result.inserted_ids.into_iter().collect();
        ids.sort_by_key(|(index, _)| *index);
        Ok(ids.into_iter().map(|(_, id)| id).collect())
    }

    async fn update_one(
        &self,
        ns: &Namespace,
        filter: Document,
        update: Document,
    ) -> Result<UpdateOutcome> {
        let result = self
            .collection(ns)?
            .update_one(filter, update)
            .await
            .map_err(classify)?;
        Ok(UpdateOutcome::new(result.matched_count, result.modified_count))
    }

    async fn update_many(
        &self,
        ns: &Namespace,
        filter: Document,
        update: Document,
    ) -> Result<UpdateOutcome> {
        let result = self
            .collection(ns)?
            .update_many(filter, update)
            .await
            .map_err(classify)?;
        Ok(UpdateOutcome::new(result.matched_count, result.modified_count))
    }

    async fn delete_one(&self, ns: &Namespace, filter: Document) -> Result<u64> {
        let result = self
            .collection(ns)?
            .delete_one(filter)
            .await
            .map_err(classify)?;
        Ok(result.deleted_count)
    }

    async fn delete_many(&self, ns: &Namespace, filter: Document) -> Result<u64> {
        let result = self
            .collection(ns)?
            .delete_many(filter)
            .await
            .map_err(classify)?;
        Ok(result.deleted_count)
    }

    async fn count_documents(&self, ns: &Namespace, filter: Document) -> Result<u64> {
        self.collection(ns)?
            .count_documents(filter)
            .await
            .map_err(classify)
    }
}
