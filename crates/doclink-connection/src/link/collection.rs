//! Collection-scoped handle

use bson::{Bson, Document};
use doclink_core::{Namespace, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::Link;

/// A [`Link`] bound to one collection
///
/// Operations go through the same guard as the link's own; the handle only
/// saves repeating the database and collection names.
#[derive(Debug, Clone)]
pub struct LinkCollection<'a> {
    link: &'a Link,
    namespace: Namespace,
}

impl<'a> LinkCollection<'a> {
    pub(super) fn new(link: &'a Link, namespace: Namespace) -> Self {
        Self { link, namespace }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub async fn find<T: DeserializeOwned>(&self, filter: Document) -> Result<Vec<T>> {
        self.link.find_in(&self.namespace, filter).await
    }

    pub async fn find_one<T: DeserializeOwned>(&self, filter: Document) -> Result<T> {
        self.link.find_one_in(&self.namespace, filter).await
    }

    pub async fn insert_one<T: Serialize>(&self, document: &T) -> Result<Bson> {
        self.link.insert_one_in(&self.namespace, document).await
    }

    pub async fn insert_many<T: Serialize>(&self, documents: &[T]) -> Result<Vec<Bson>> {
        self.link.insert_many_in(&self.namespace, documents).await
    }

    pub async fn update_one(&self, filter: Document, update: Document) -> Result<u64> {
        self.link.update_one_in(&self.namespace, filter, update).await
    }

    pub async fn update_many(&self, filter: Document, update: Document) -> Result<u64> {
        self.link.update_many_in(&self.namespace, filter, update).await
    }

    pub async fn delete_one(&self, filter: Document) -> Result<u64> {
        self.link.delete_one_in(&self.namespace, filter).await
    }

    pub async fn delete_many(&self, filter: Document) -> Result<u64> {
        self.link.delete_many_in(&self.namespace, filter).await
    }

    pub async fn count_documents(&self, filter: Document) -> Result<u64> {
        self.link.count_documents_in(&self.namespace, filter).await
    }
}
