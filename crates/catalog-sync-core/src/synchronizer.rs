use crate::fallback::{load_bucket, save_bucket, FallbackStore};
use crate::ids::LocalIdGenerator;
use crate::normalize::{item_from_draft, item_from_raw, normalize_item, raw_from_draft, raw_from_patch};
use crate::seed::seed_items;
use crate::state::{CatalogSnapshot, CatalogState, EventOutcome};
use catalog_sync_config::SyncOptions;
use catalog_sync_models::{CatalogItem, ChangeEvent, Collection, ItemDraft, ItemId, ItemPatch};
use catalog_sync_remote::{ChangeFeed, RemoteCatalog, RemoteError};
use futures::StreamExt;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Which path a write took.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "written", content = "value", rename_all = "snake_case")]
pub enum Written<T> {
    /// The catalog service accepted the write
    Remote(T),
    /// The service call failed; only the in-memory catalog changed
    LocalOnly(T),
}

impl<T> Written<T> {
    pub fn value(&self) -> &T {
        match self {
            Written::Remote(v) | Written::LocalOnly(v) => v,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Written::Remote(v) | Written::LocalOnly(v) => v,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Written::Remote(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Written<U> {
        match self {
            Written::Remote(v) => Written::Remote(f(v)),
            Written::LocalOnly(v) => Written::LocalOnly(f(v)),
        }
    }
}

/// Published after a change event has been merged.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedChange {
    pub collection: Collection,
    pub kind: &'static str,
    pub outcome: EventOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadMode {
    Initial,
    Refresh,
}

struct Subscription {
    collection: Collection,
    feed_cancel: CancellationToken,
    task: JoinHandle<()>,
}

struct Shared {
    state: RwLock<CatalogState>,
    remote: Arc<dyn RemoteCatalog>,
    fallback: Arc<dyn FallbackStore>,
    options: SyncOptions,
    ids: LocalIdGenerator,
    in_flight: AtomicUsize,
    closed: CancellationToken,
    subscriptions: Mutex<Vec<Subscription>>,
    applied: broadcast::Sender<AppliedChange>,
}

impl Shared {
    fn release_subscriptions(&self) -> usize {
        let drained: Vec<Subscription> = {
            let mut subs = self.subscriptions.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            subs.drain(..).collect()
        };
        let count = drained.len();
        for sub in drained {
            debug!("Releasing {} change feed", sub.collection);
            sub.feed_cancel.cancel();
            sub.task.abort();
        }
        count
    }

    /// Apply `f` under the write lock unless the synchronizer was torn down.
    async fn mutate<R>(&self, f: impl FnOnce(&mut CatalogState) -> R) -> Option<R> {
        let mut state = self.state.write().await;
        if self.closed.is_cancelled() {
            debug!("Synchronizer torn down, discarding completion");
            return None;
        }
        Some(f(&mut state))
    }

    async fn apply_event(&self, event: &ChangeEvent) -> EventOutcome {
        let outcome = self
            .mutate(|state| state.apply_event(event))
            .await
            .unwrap_or(EventOutcome::Dropped);
        debug!("{} event on {}: {:?}", event.kind(), event.collection, outcome);
        // Nobody listening is fine
        let _ = self.applied.send(AppliedChange {
            collection: event.collection,
            kind: event.kind(),
            outcome,
        });
        outcome
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.closed.cancel();
        self.release_subscriptions();
    }
}

/// Decrements the in-flight counter when the guarded call completes or is
/// dropped.
struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Owns the in-memory movie and show lists and keeps them consistent across
/// bulk loads, local writes with remote fallback, and remote change events.
///
/// Handles are cheap to clone and share one catalog. The catalog lives
/// until [`CatalogSynchronizer::teardown`] is called or the last handle is
/// dropped; after teardown every pending completion is discarded.
#[derive(Clone)]
pub struct CatalogSynchronizer {
    inner: Arc<Shared>,
}

impl CatalogSynchronizer {
    pub fn create(
        remote: Arc<dyn RemoteCatalog>,
        fallback: Arc<dyn FallbackStore>,
        options: SyncOptions,
    ) -> Self {
        let (applied, _) = broadcast::channel(256);
        info!("Creating catalog synchronizer ({} backend)", remote.backend_name());
        Self {
            inner: Arc::new(Shared {
                state: RwLock::new(CatalogState::default()),
                remote,
                fallback,
                options,
                ids: LocalIdGenerator::new(),
                in_flight: AtomicUsize::new(0),
                closed: CancellationToken::new(),
                subscriptions: Mutex::new(Vec::new()),
                applied,
            }),
        }
    }

    pub fn backend_name(&self) -> &str {
        self.inner.remote.backend_name()
    }

    // Loading

    /// Load both collections. Afterwards each list holds live data, the
    /// last local snapshot, or the built-in sample catalog.
    #[instrument(skip(self))]
    pub async fn initial_load(&self) {
        self.load(LoadMode::Initial).await;
    }

    /// Reload both collections. A successful fetch replaces the list (even
    /// with nothing); a failed fetch keeps whatever the list already holds.
    #[instrument(skip(self))]
    pub async fn refresh(&self) {
        self.load(LoadMode::Refresh).await;
    }

    async fn load(&self, mode: LoadMode) {
        let _loading = LoadingGuard::new(&self.inner.in_flight);

        let (movies, shows) = futures::join!(
            self.fetch(Collection::Movies),
            self.fetch(Collection::Shows)
        );

        let mut failures = Vec::new();
        for (collection, result) in [(Collection::Movies, movies), (Collection::Shows, shows)] {
            if let Err(ref e) = result {
                failures.push(format!("{}: {}", collection, e));
            }
            self.install(collection, result, mode).await;
        }

        let error = if failures.is_empty() { None } else { Some(failures.join("; ")) };
        self.inner.mutate(|state| state.last_error = error).await;
    }

    async fn fetch(&self, collection: Collection) -> Result<Vec<CatalogItem>, RemoteError> {
        let rows = self.inner.remote.list_all(collection).await?;
        let total = rows.len();
        let items: Vec<CatalogItem> = rows
            .iter()
            .filter_map(|row| match item_from_raw(collection, row) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!("Skipping {} row: {}", collection, e);
                    None
                }
            })
            .collect();
        info!("Fetched {} {} ({} rows)", items.len(), collection, total);
        Ok(items)
    }

    async fn install(&self, collection: Collection, result: Result<Vec<CatalogItem>, RemoteError>, mode: LoadMode) {
        match (mode, result) {
            (LoadMode::Initial, Ok(items)) if !items.is_empty() => {
                self.replace_and_persist(collection, items).await;
            }
            (LoadMode::Refresh, Ok(items)) => {
                self.replace_and_persist(collection, items).await;
            }
            (mode, result) => {
                if let Err(e) = result {
                    warn!("Loading {} failed: {}", collection, e);
                }
                let populated = self.inner.state.read().await.is_populated(collection);
                if mode == LoadMode::Refresh && populated {
                    debug!("Keeping current {} after failed refresh", collection);
                    return;
                }
                let items = self.fallback_items(collection);
                self.inner.mutate(|state| state.replace_all(collection, items)).await;
            }
        }
    }

    async fn replace_and_persist(&self, collection: Collection, items: Vec<CatalogItem>) {
        let applied = self.inner.mutate(|state| state.replace_all(collection, items)).await;
        if applied.is_some() {
            self.persist(collection).await;
        }
    }

    /// Last local snapshot, else the sample catalog.
    fn fallback_items(&self, collection: Collection) -> Vec<CatalogItem> {
        let bucket = collection.name();
        if let Some(items) = load_bucket::<Vec<CatalogItem>>(self.inner.fallback.as_ref(), bucket) {
            let items: Vec<CatalogItem> = items
                .into_iter()
                .filter(|item| item.collection() == collection)
                .map(normalize_item)
                .collect();
            if !items.is_empty() {
                info!("Using {} {} from local snapshot", items.len(), collection);
                return items;
            }
        }
        if self.inner.options.seed_when_empty {
            info!("Using sample {}", collection);
            seed_items(collection)
        } else {
            Vec::new()
        }
    }

    async fn persist(&self, collection: Collection) {
        if !self.inner.options.persist_snapshots || self.inner.closed.is_cancelled() {
            return;
        }
        let items = self.inner.state.read().await.list(collection).to_vec();
        if let Err(e) = save_bucket(self.inner.fallback.as_ref(), collection.name(), &items) {
            warn!("Failed to save {} snapshot: {}", collection, e);
        }
    }

    // Writes

    /// Create an item. Never fails: when the service call does not succeed
    /// the item is kept locally under a generated id.
    #[instrument(skip(self, draft), fields(title = %draft.title_primary))]
    pub async fn add(&self, draft: ItemDraft, collection: Collection) -> Written<CatalogItem> {
        let _loading = LoadingGuard::new(&self.inner.in_flight);

        let raw = raw_from_draft(collection, &draft);
        let remote = match self.inner.remote.insert(collection, &raw).await {
            Ok(row) => item_from_raw(collection, &row).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        let written = match remote {
            Ok(item) => {
                info!("Added {} {} remotely", collection, item.id);
                Written::Remote(item)
            }
            Err(message) => {
                warn!("Remote add to {} failed, keeping it locally: {}", collection, message);
                let id = self.inner.ids.next();
                Written::LocalOnly(item_from_draft(collection, id, &draft))
            }
        };

        // A change event may already have delivered the row; replace it
        let item = written.value().clone();
        if self.inner.mutate(|state| state.upsert_front(item)).await.is_some() {
            self.persist(collection).await;
        }
        written
    }

    /// Shallow-merge `patch` over the item. Returns `None` without touching
    /// anything when the id is not in the collection.
    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: ItemId, patch: ItemPatch, collection: Collection) -> Option<Written<CatalogItem>> {
        let current = self.inner.state.read().await.find(collection, id).cloned()?;
        let _loading = LoadingGuard::new(&self.inner.in_flight);

        let raw = raw_from_patch(&current, &patch);
        let remote = match self.inner.remote.update(collection, id, &raw).await {
            Ok(row) => item_from_raw(collection, &row)
                .map_err(|e| e.to_string())
                .and_then(|item| {
                    if item.id == id {
                        Ok(item)
                    } else {
                        Err(format!("service returned {} for update of {}", item.id, id))
                    }
                }),
            Err(e) => Err(e.to_string()),
        };

        let written = match remote {
            Ok(item) => {
                self.inner.mutate(|state| state.replace(item.clone())).await;
                Written::Remote(item)
            }
            Err(message) => {
                warn!("Remote update of {} {} failed, applying locally: {}", collection, id, message);
                let merged = self
                    .inner
                    .mutate(|state| {
                        let base = state.find(collection, id).cloned().unwrap_or_else(|| current.clone());
                        let merged = normalize_item(base.merged_with(&patch));
                        state.replace(merged.clone());
                        merged
                    })
                    .await
                    .unwrap_or_else(|| normalize_item(current.merged_with(&patch)));
                Written::LocalOnly(merged)
            }
        };

        self.persist(collection).await;
        Some(written)
    }

    /// Remove the item locally and ask the service to remove it too. The
    /// local removal happens whatever the service answers; removing an id
    /// that is not present changes nothing.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: ItemId, collection: Collection) -> Written<Option<CatalogItem>> {
        let removed = self
            .inner
            .mutate(|state| state.remove(collection, id))
            .await
            .flatten();
        if removed.is_some() {
            self.persist(collection).await;
        }

        let _loading = LoadingGuard::new(&self.inner.in_flight);
        match self.inner.remote.remove(collection, id).await {
            Ok(()) => Written::Remote(removed),
            Err(e) => {
                warn!("Remote delete of {} {} failed: {}", collection, id, e);
                Written::LocalOnly(removed)
            }
        }
    }

    /// Merge one remote change into the in-memory lists.
    pub async fn apply_remote_event(&self, event: ChangeEvent) -> EventOutcome {
        self.inner.apply_event(&event).await
    }

    // Change feeds

    /// Subscribe to both collections' change feeds, replacing any earlier
    /// subscriptions. Returns how many feeds are now attached.
    pub async fn attach(&self) -> usize {
        self.detach();
        if self.inner.closed.is_cancelled() {
            return 0;
        }

        let mut attached = Vec::new();
        for collection in Collection::ALL {
            match self.inner.remote.subscribe(collection).await {
                Ok(feed) => attached.push(self.spawn_pump(feed)),
                Err(e) => {
                    warn!("Could not subscribe to {} changes: {}", collection, e);
                }
            }
        }

        let count = attached.len();
        let mut subs = self
            .inner
            .subscriptions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if self.inner.closed.is_cancelled() {
            // Torn down while subscribing
            drop(subs);
            for sub in attached {
                sub.feed_cancel.cancel();
                sub.task.abort();
            }
            return 0;
        }
        subs.extend(attached);
        info!("Attached {} change feeds", count);
        count
    }

    fn spawn_pump(&self, mut feed: ChangeFeed) -> Subscription {
        let collection = feed.collection();
        let feed_cancel = feed.cancel_token();
        let closed = self.inner.closed.clone();
        let shared: Weak<Shared> = Arc::downgrade(&self.inner);

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = closed.cancelled() => break,
                    next = feed.next() => {
                        let Some(event) = next else { break };
                        let Some(shared) = shared.upgrade() else { break };
                        if event.collection != collection {
                            warn!("Ignoring {} event delivered on the {} feed", event.collection, collection);
                            continue;
                        }
                        shared.apply_event(&event).await;
                    }
                }
            }
            debug!("{} change pump stopped", collection);
        });

        Subscription {
            collection,
            feed_cancel,
            task,
        }
    }

    /// Release every change feed. Returns how many were released.
    pub fn detach(&self) -> usize {
        self.inner.release_subscriptions()
    }

    pub fn attached_count(&self) -> usize {
        self.inner
            .subscriptions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Notifications for every change event merged from now on.
    pub fn watch_changes(&self) -> broadcast::Receiver<AppliedChange> {
        self.inner.applied.subscribe()
    }

    /// End the lifecycle: release the change feeds and discard every
    /// completion that arrives afterwards. Reads keep returning the last
    /// state.
    pub fn teardown(&self) {
        if self.inner.closed.is_cancelled() {
            return;
        }
        self.inner.closed.cancel();
        let released = self.detach();
        info!("Catalog synchronizer torn down ({} feeds released)", released);
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.closed.is_cancelled()
    }

    // Reads

    pub async fn movies(&self) -> Vec<CatalogItem> {
        self.items(Collection::Movies).await
    }

    pub async fn shows(&self) -> Vec<CatalogItem> {
        self.items(Collection::Shows).await
    }

    pub async fn items(&self, collection: Collection) -> Vec<CatalogItem> {
        self.inner.state.read().await.list(collection).to_vec()
    }

    pub async fn find(&self, collection: Collection, id: ItemId) -> Option<CatalogItem> {
        self.inner.state.read().await.find(collection, id).cloned()
    }

    pub async fn snapshot(&self) -> CatalogSnapshot {
        self.inner.state.read().await.snapshot()
    }

    /// True while any load or write is waiting on the service
    pub fn loading(&self) -> bool {
        self.inner.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Failures of the most recent load. Writes and subscriptions only log.
    pub async fn last_error(&self) -> Option<String> {
        self.inner.state.read().await.last_error.clone()
    }
}

#[cfg(test)]
mod tests;
