use crate::error::RemoteError;
use crate::feed::ChangeFeed;
use async_trait::async_trait;
use catalog_sync_models::{Collection, ItemId, RawRecord};

/// CRUD plus change notifications over the two remote collections.
///
/// Implementations never retry; callers decide how to degrade.
#[async_trait]
pub trait RemoteCatalog: Send + Sync {
    fn backend_name(&self) -> &str;

    /// Every row of the collection, newest first by creation order
    async fn list_all(&self, collection: Collection) -> Result<Vec<RawRecord>, RemoteError>;

    /// Create a row; the returned record carries the service-assigned id
    async fn insert(&self, collection: Collection, record: &RawRecord) -> Result<RawRecord, RemoteError>;

    /// Apply the columns set in `patch` and return the full updated row
    async fn update(
        &self,
        collection: Collection,
        id: ItemId,
        patch: &RawRecord,
    ) -> Result<RawRecord, RemoteError>;

    /// Delete a row. Removing an id that does not exist succeeds.
    async fn remove(&self, collection: Collection, id: ItemId) -> Result<(), RemoteError>;

    /// Open a change feed for one collection. Dropping the feed unsubscribes.
    async fn subscribe(&self, collection: Collection) -> Result<ChangeFeed, RemoteError>;
}
