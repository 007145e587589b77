//! In-memory driver for tests
//!
//! Collections live in a [`MockStore`] shared by every client the driver
//! hands out, so data survives reconnects. Failures are injected through
//! counters that are consumed one call at a time.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{Bson, Document};
use doclink_core::{
    ClientSettings, DocLinkError, DocumentClient, DocumentDriver, Namespace, Result,
    UpdateOutcome,
};
use parking_lot::Mutex;

/// Take one unit from `counter` if it is non-zero
fn consume(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[derive(Default)]
pub(crate) struct MockStore {
    collections: Mutex<HashMap<Namespace, Vec<Document>>>,
    disconnect_next: AtomicU32,
    fail_next: Mutex<Option<DocLinkError>>,
    op_delay: Mutex<Duration>,
    ping_delay: Mutex<Duration>,
    ops: AtomicU32,
}

impl MockStore {
    /// Make the next `n` operations fail with the disconnect signature
    pub(crate) fn disconnect_next(&self, n: u32) {
        self.disconnect_next.store(n, Ordering::SeqCst);
    }

    /// Make the next operation fail with `err`
    pub(crate) fn fail_next(&self, err: DocLinkError) {
        *self.fail_next.lock() = Some(err);
    }

    pub(crate) fn set_op_delay(&self, delay: Duration) {
        *self.op_delay.lock() = delay;
    }

    pub(crate) fn set_ping_delay(&self, delay: Duration) {
        *self.ping_delay.lock() = delay;
    }

    /// Operations that reached the store, failed ones included
    pub(crate) fn op_count(&self) -> u32 {
        self.ops.load(Ordering::SeqCst)
    }

    pub(crate) fn documents(&self, ns: &Namespace) -> Vec<Document> {
        self.collections.lock().get(ns).cloned().unwrap_or_default()
    }

    async fn enter(&self) -> Result<()> {
        self.ops.fetch_add(1, Ordering::SeqCst);
        if consume(&self.disconnect_next) {
            return Err(DocLinkError::Disconnected("connection reset by peer".into()));
        }
        let injected = self.fail_next.lock().take();
        if let Some(err) = injected {
            return Err(err);
        }
        let delay = *self.op_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }
}

fn matches(document: &Document, filter: &Document) -> bool {
    filter
        .iter()
        .all(|(key, value)| document.get(key) == Some(value))
}

/// Apply a `$set` update, returning whether anything changed
fn apply_update(document: &mut Document, update: &Document) -> Result<bool> {
    let mut changed = false;
    for (operator, fields) in update {
        let Bson::Document(fields) = fields else {
            return Err(DocLinkError::OperationFailed(format!(
                "{} expects a document",
                operator
            )));
        };
        if operator != "$set" {
            return Err(DocLinkError::OperationFailed(format!(
                "unsupported update operator {}",
                operator
            )));
        }
        for (key, value) in fields {
            if document.get(key) != Some(value) {
                document.insert(key.clone(), value.clone());
                changed = true;
            }
        }
    }
    Ok(changed)
}

pub(crate) struct MockClient {
    store: Arc<MockStore>,
    fail_pings: Arc<AtomicU32>,
    closed: AtomicBool,
}

impl MockClient {
    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn enter(&self) -> Result<()> {
        if self.is_closed() {
            return Err(DocLinkError::Disconnected("client is disconnected".into()));
        }
        self.store.enter().await
    }

    fn update(&self, ns: &Namespace, filter: &Document, update: &Document, many: bool) -> Result<UpdateOutcome> {
        let mut collections = self.store.collections.lock();
        let mut outcome = UpdateOutcome::default();
        if let Some(documents) = collections.get_mut(ns) {
            for document in documents.iter_mut().filter(|d| matches(d, filter)) {
                outcome.matched += 1;
                if apply_update(document, update)? {
                    outcome.modified += 1;
                }
                if !many {
                    break;
                }
            }
        }
        Ok(outcome)
    }

    fn delete(&self, ns: &Namespace, filter: &Document, many: bool) -> u64 {
        let mut collections = self.store.collections.lock();
        let Some(documents) = collections.get_mut(ns) else {
            return 0;
        };
        let mut deleted = 0;
        documents.retain(|d| {
            if (many || deleted == 0) && matches(d, filter) {
                deleted += 1;
                false
            } else {
                true
            }
        });
        deleted
    }

    fn insert(&self, ns: &Namespace, mut document: Document) -> Bson {
        let id = match document.get("_id") {
            Some(id) => id.clone(),
            None => {
                let id = Bson::ObjectId(ObjectId::new());
                document.insert("_id", id.clone());
                id
            }
        };
        self.store
            .collections
            .lock()
            .entry(ns.clone())
            .or_default()
            .push(document);
        id
    }
}

#[async_trait]
impl DocumentClient for MockClient {
    async fn ping(&self) -> Result<()> {
        if self.is_closed() {
            return Err(DocLinkError::Disconnected("client is disconnected".into()));
        }
        if consume(&self.fail_pings) {
            return Err(DocLinkError::OperationFailed("ping: no primary available".into()));
        }
        let delay = *self.store.ping_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn find(&self, ns: &Namespace, filter: Document) -> Result<Vec<Document>> {
        self.enter().await?;
        Ok(self
            .store
            .documents(ns)
            .into_iter()
            .filter(|d| matches(d, &filter))
            .collect())
    }

    async fn find_one(&self, ns: &Namespace, filter: Document) -> Result<Option<Document>> {
        self.enter().await?;
        Ok(self
            .store
            .documents(ns)
            .into_iter()
            .find(|d| matches(d, &filter)))
    }

    async fn insert_one(&self, ns: &Namespace, document: Document) -> Result<Bson> {
        self.enter().await?;
        Ok(self.insert(ns, document))
    }

    async fn insert_many(&self, ns: &Namespace, documents: Vec<Document>) -> Result<Vec<Bson>> {
        self.enter().await?;
        Ok(documents
            .into_iter()
            .map(|document| self.insert(ns, document))
            .collect())
    }

    async fn update_one(&self, ns: &Namespace, filter: Document, update: Document) -> Result<UpdateOutcome> {
        self.enter().await?;
        self.update(ns, &filter, &update, false)
    }

    async fn update_many(&self, ns: &Namespace, filter: Document, update: Document) -> Result<UpdateOutcome> {
        self.enter().await?;
        self.update(ns, &filter, &update, true)
    }

    async fn delete_one(&self, ns: &Namespace, filter: Document) -> Result<u64> {
        self.enter().await?;
        Ok(self.delete(ns, &filter, false))
    }

    async fn delete_many(&self, ns: &Namespace, filter: Document) -> Result<u64> {
        self.enter().await?;
        Ok(self.delete(ns, &filter, true))
    }

    async fn count_documents(&self, ns: &Namespace, filter: Document) -> Result<u64> {
        self.enter().await?;
        Ok(self
            .store
            .documents(ns)
            .iter()
            .filter(|d| matches(d, &filter))
            .count() as u64)
    }
}

#[derive(Default)]
pub(crate) struct MockDriver {
    store: Arc<MockStore>,
    connects: AtomicU32,
    fail_connects: AtomicU32,
    refuse_all: AtomicBool,
    reject_target: AtomicBool,
    fail_pings: Arc<AtomicU32>,
    connect_delay: Mutex<Duration>,
    clients: Mutex<Vec<Arc<MockClient>>>,
}

impl MockDriver {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn store(&self) -> &Arc<MockStore> {
        &self.store
    }

    /// Connect calls so far
    pub(crate) fn connect_count(&self) -> u32 {
        self.connects.load(Ordering::SeqCst)
    }

    /// Fail the next `n` connects
    pub(crate) fn fail_connects(&self, n: u32) {
        self.fail_connects.store(n, Ordering::SeqCst);
    }

    /// Fail every connect until reset
    pub(crate) fn refuse_all(&self, refuse: bool) {
        self.refuse_all.store(refuse, Ordering::SeqCst);
    }

    /// Reject the target as malformed
    pub(crate) fn reject_target(&self, reject: bool) {
        self.reject_target.store(reject, Ordering::SeqCst);
    }

    /// Fail the next `n` pings
    pub(crate) fn fail_pings(&self, n: u32) {
        self.fail_pings.store(n, Ordering::SeqCst);
    }

    pub(crate) fn set_connect_delay(&self, delay: Duration) {
        *self.connect_delay.lock() = delay;
    }

    /// Every client handed out, oldest first
    pub(crate) fn clients(&self) -> Vec<Arc<MockClient>> {
        self.clients.lock().clone()
    }
}

#[async_trait]
impl DocumentDriver for MockDriver {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn connect(&self, target: &str, _settings: &ClientSettings) -> Result<Arc<dyn DocumentClient>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let delay = *self.connect_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.reject_target.load(Ordering::SeqCst) {
            return Err(DocLinkError::InvalidConfiguration(format!(
                "unparseable target ({} bytes)",
                target.len()
            )));
        }
        if self.refuse_all.load(Ordering::SeqCst) || consume(&self.fail_connects) {
            return Err(DocLinkError::OperationFailed(
                "server selection timed out".to_string(),
            ));
        }

        let client = Arc::new(MockClient {
            store: self.store.clone(),
            fail_pings: self.fail_pings.clone(),
            closed: AtomicBool::new(false),
        });
        self.clients.lock().push(client.clone());
        Ok(client)
    }
}
