use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;

use bson::oid::ObjectId;

use super::models::Resource;
use super::query::{Filter, Update};
use super::store::DocumentStore;
use crate::errors::StoreError;

/// Typed access to one resource's collection.
///
/// Every call is bounded by `timeout`; on expiry the operation fails with
/// `StoreError::Timeout` instead of waiting on the store.
pub struct Repo<'a, R> {
    store: &'a dyn DocumentStore,
    timeout: Duration,
    _resource: PhantomData<R>,
}

impl<'a, R: Resource> Repo<'a, R> {
    pub fn new(store: &'a dyn DocumentStore, timeout: Duration) -> Self {
        Self {
            store,
            timeout,
            _resource: PhantomData,
        }
    }

    async fn bounded<T>(
        &self,
        op: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        tokio::time::timeout(self.timeout, op)
            .await
            .map_err(|_| StoreError::Timeout(self.timeout))?
    }

    pub async fn list(&self, filter: &Filter) -> Result<Vec<R>, StoreError> {
        let documents = self.bounded(self.store.find(R::COLLECTION, filter)).await?;
        documents.into_iter().map(R::from_document).collect()
    }

    pub async fn get(&self, id: ObjectId) -> Result<Option<R>, StoreError> {
        self.bounded(self.store.find_one(R::COLLECTION, &Filter::by_id(id)))
            .await?
            .map(R::from_document)
            .transpose()
    }

    pub async fn insert(&self, record: &R) -> Result<(), StoreError> {
        self.bounded(self.store.insert_one(R::COLLECTION, record.to_document()))
            .await
    }

    /// Apply `update` and re-read the document. `None` when nothing matched.
    pub async fn update(&self, id: ObjectId, update: &Update) -> Result<Option<R>, StoreError> {
        let filter = Filter::by_id(id);
        let document = self
            .bounded(async {
                let matched = self.store.update_one(R::COLLECTION, &filter, update).await?;
                if matched == 0 {
                    return Ok(None);
                }
                self.store.find_one(R::COLLECTION, &filter).await
            })
            .await?;
        document.map(R::from_document).transpose()
    }

    /// `true` when a document was removed.
    pub async fn delete(&self, id: ObjectId) -> Result<bool, StoreError> {
        let deleted = self
            .bounded(self.store.delete_one(R::COLLECTION, &Filter::by_id(id)))
            .await?;
        Ok(deleted > 0)
    }
}
