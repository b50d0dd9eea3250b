use std::time::Duration;

use async_trait::async_trait;
use bson::{Document, doc};
use futures_util::TryStreamExt;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};

use super::query::{Collection, Filter, Update};
use crate::errors::{StartupError, StoreError};

/// Abstraction over the document database for testability.
/// Real implementation: `MongoStore`. Test double: `MemoryStore`.
///
/// Implementations must be safe for concurrent use; handlers share one
/// instance behind an `Arc`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<Document>, StoreError>;

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError>;

    async fn insert_one(
        &self,
        collection: Collection,
        document: Document,
    ) -> Result<(), StoreError>;

    /// Returns the number of documents matched by `filter`.
    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        update: &Update,
    ) -> Result<u64, StoreError>;

    /// Returns the number of documents removed.
    async fn delete_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<u64, StoreError>;

    /// Release connections. Called once after the server stops.
    async fn shutdown(&self);
}

/// MongoDB-backed store bound to a single logical database.
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    /// Connect, verify liveness with a ping and select `database`.
    ///
    /// `timeout` bounds connection establishment, server selection and the
    /// ping itself. Any failure here is fatal to startup.
    pub async fn connect(url: &str, database: &str, timeout: Duration) -> Result<Self, StartupError> {
        let mut options = ClientOptions::parse(url)
            .await
            .map_err(StartupError::InvalidConnectionString)?;
        options.connect_timeout = Some(timeout);
        options.server_selection_timeout = Some(timeout);
        options
            .app_name
            .get_or_insert_with(|| env!("CARGO_PKG_NAME").to_string());

        let client = Client::with_options(options).map_err(StartupError::Connect)?;
        let db = client.database(database);

        match tokio::time::timeout(timeout, db.run_command(doc! { "ping": 1 })).await {
            Err(_) => return Err(StartupError::PingTimeout { timeout }),
            Ok(Err(e)) => return Err(StartupError::Ping(e)),
            Ok(Ok(_)) => {}
        }

        tracing::info!(database, "Connected to document store");
        Ok(Self { client, db })
    }

    fn collection(&self, collection: Collection) -> mongodb::Collection<Document> {
        self.db.collection(collection.as_str())
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<Document>, StoreError> {
        let cursor = self.collection(collection).find(filter.to_document()).await?;
        let documents: Vec<Document> = cursor.try_collect().await?;
        Ok(documents)
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError> {
        Ok(self
            .collection(collection)
            .find_one(filter.to_document())
            .await?)
    }

    async fn insert_one(
        &self,
        collection: Collection,
        document: Document,
    ) -> Result<(), StoreError> {
        self.collection(collection).insert_one(document).await?;
        Ok(())
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        update: &Update,
    ) -> Result<u64, StoreError> {
        let result = self
            .collection(collection)
            .update_one(filter.to_document(), update.to_document())
            .await?;
        Ok(result.matched_count)
    }

    async fn delete_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<u64, StoreError> {
        let result = self
            .collection(collection)
            .delete_one(filter.to_document())
            .await?;
        Ok(result.deleted_count)
    }

    async fn shutdown(&self) {
        self.client.clone().shutdown().await;
        tracing::info!("Document store connection closed");
    }
}
