use crate::error::RemoteError;
use crate::feed::{ChangeFeed, FeedSender};
use crate::traits::RemoteCatalog;
use async_trait::async_trait;
use catalog_sync_models::{ChangeEvent, Collection, ItemId, RawRecord};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Default)]
struct MemoryState {
    rows: HashMap<Collection, Vec<RawRecord>>,
    provisioned: HashSet<Collection>,
    offline: bool,
    next_id: i64,
    subscribers: HashMap<Collection, Vec<FeedSender>>,
}

impl MemoryState {
    fn check(&self, collection: Collection) -> Result<(), RemoteError> {
        if self.offline {
            return Err(RemoteError::Connectivity("memory catalog is offline".to_string()));
        }
        if !self.provisioned.contains(&collection) {
            return Err(RemoteError::SchemaMissing(collection.name().to_string()));
        }
        Ok(())
    }

    fn broadcast(&mut self, event: ChangeEvent) {
        if let Some(senders) = self.subscribers.get_mut(&event.collection) {
            senders.retain(|s| s.send(event.clone()));
        }
    }
}

/// In-process catalog with the same observable behavior as the hosted
/// service: rows newest first, service-assigned ids, change broadcast to
/// every subscriber. Used for offline demos and tests.
pub struct MemoryCatalog {
    state: Mutex<MemoryState>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        let state = MemoryState {
            provisioned: Collection::ALL.into_iter().collect(),
            next_id: 1,
            ..MemoryState::default()
        };
        Self {
            state: Mutex::new(state),
        }
    }

    /// Seed a collection, given newest first. Ids continue after the
    /// largest seeded id.
    pub async fn with_rows(self, collection: Collection, rows: Vec<RawRecord>) -> Self {
        {
            let mut state = self.state.lock().await;
            let max_id = rows.iter().filter_map(|r| r.id).map(|id| id.0).max().unwrap_or(0);
            state.next_id = state.next_id.max(max_id + 1);
            state.rows.insert(collection, rows);
        }
        self
    }

    pub async fn set_offline(&self, offline: bool) {
        self.state.lock().await.offline = offline;
    }

    pub async fn unprovision(&self, collection: Collection) {
        let mut state = self.state.lock().await;
        state.provisioned.remove(&collection);
        state.rows.remove(&collection);
    }

    pub async fn provision(&self, collection: Collection) {
        self.state.lock().await.provisioned.insert(collection);
    }

    /// Push an event to subscribers without touching the stored rows, as
    /// another client writing to the service would.
    pub async fn publish(&self, event: ChangeEvent) {
        self.state.lock().await.broadcast(event);
    }

    pub async fn subscriber_count(&self, collection: Collection) -> usize {
        let mut state = self.state.lock().await;
        match state.subscribers.get_mut(&collection) {
            Some(senders) => {
                senders.retain(|s| !s.is_closed());
                senders.len()
            }
            None => 0,
        }
    }

    pub async fn row_count(&self, collection: Collection) -> usize {
        self.state.lock().await.rows.get(&collection).map(Vec::len).unwrap_or(0)
    }
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(|v| v.trim().is_empty()).unwrap_or(true)
}

#[async_trait]
impl RemoteCatalog for MemoryCatalog {
    fn backend_name(&self) -> &str {
        "memory"
    }

    async fn list_all(&self, collection: Collection) -> Result<Vec<RawRecord>, RemoteError> {
        let state = self.state.lock().await;
        state.check(collection)?;
        Ok(state.rows.get(&collection).cloned().unwrap_or_default())
    }

    async fn insert(&self, collection: Collection, record: &RawRecord) -> Result<RawRecord, RemoteError> {
        let mut state = self.state.lock().await;
        state.check(collection)?;

        if is_blank(&record.title) && is_blank(&record.title_ar) {
            return Err(RemoteError::Validation("title is required".to_string()));
        }

        let id = ItemId(state.next_id);
        state.next_id += 1;

        let now = Utc::now().to_rfc3339();
        let mut row = record.clone();
        row.id = Some(id);
        row.created_at = Some(now.clone());
        row.updated_at = Some(now);

        state.rows.entry(collection).or_default().insert(0, row.clone());
        debug!("Memory catalog inserted {} into {}", id, collection);
        state.broadcast(ChangeEvent::insert(collection, row.clone()));
        Ok(row)
    }

    async fn update(
        &self,
        collection: Collection,
        id: ItemId,
        patch: &RawRecord,
    ) -> Result<RawRecord, RemoteError> {
        let mut state = self.state.lock().await;
        state.check(collection)?;

        let row = state
            .rows
            .get_mut(&collection)
            .and_then(|rows| rows.iter_mut().find(|r| r.id == Some(id)))
            .ok_or(RemoteError::NotFound(id))?;
        row.overlay(patch);
        row.updated_at = Some(Utc::now().to_rfc3339());
        let updated = row.clone();

        state.broadcast(ChangeEvent::update(collection, updated.clone()));
        Ok(updated)
    }

    async fn remove(&self, collection: Collection, id: ItemId) -> Result<(), RemoteError> {
        let mut state = self.state.lock().await;
        state.check(collection)?;

        let removed = match state.rows.get_mut(&collection) {
            Some(rows) => {
                let before = rows.len();
                rows.retain(|r| r.id != Some(id));
                rows.len() != before
            }
            None => false,
        };

        if removed {
            state.broadcast(ChangeEvent::delete(collection, id));
        }
        Ok(())
    }

    async fn subscribe(&self, collection: Collection) -> Result<ChangeFeed, RemoteError> {
        let mut state = self.state.lock().await;
        if state.offline {
            return Err(RemoteError::Connectivity("memory catalog is offline".to_string()));
        }
        let (sender, feed) = ChangeFeed::channel(collection);
        state.subscribers.entry(collection).or_default().push(sender);
        Ok(feed)
    }
}
