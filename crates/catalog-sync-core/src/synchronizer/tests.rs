use super::*;
use crate::fallback::MemoryStore;
use async_trait::async_trait;
use catalog_sync_models::RawRecord;
use catalog_sync_remote::MemoryCatalog;
use serde_json::json;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::Notify;

fn row(id: i64, title: &str) -> RawRecord {
    RawRecord {
        title: Some(title.to_string()),
        ..RawRecord::with_id(ItemId(id))
    }
}

fn titles(items: &[CatalogItem]) -> Vec<String> {
    items.iter().map(|i| i.title_primary.clone()).collect()
}

fn create(remote: Arc<dyn RemoteCatalog>) -> (CatalogSynchronizer, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let sync = CatalogSynchronizer::create(remote, store.clone(), SyncOptions::default());
    (sync, store)
}

async fn next_applied(rx: &mut broadcast::Receiver<AppliedChange>) -> AppliedChange {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("no change applied in time")
        .unwrap()
}

/// Holds inserts and list calls until released, to observe in-flight state.
struct GatedCatalog {
    inner: MemoryCatalog,
    entered: Notify,
    release: Notify,
}

impl GatedCatalog {
    fn new(inner: MemoryCatalog) -> Self {
        Self {
            inner,
            entered: Notify::new(),
            release: Notify::new(),
        }
    }

    async fn gate(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

#[async_trait]
impl RemoteCatalog for GatedCatalog {
    fn backend_name(&self) -> &str {
        "gated"
    }

    async fn list_all(&self, collection: Collection) -> Result<Vec<RawRecord>, RemoteError> {
        self.gate().await;
        self.inner.list_all(collection).await
    }

    async fn insert(&self, collection: Collection, record: &RawRecord) -> Result<RawRecord, RemoteError> {
        self.gate().await;
        self.inner.insert(collection, record).await
    }

    async fn update(&self, collection: Collection, id: ItemId, patch: &RawRecord) -> Result<RawRecord, RemoteError> {
        self.inner.update(collection, id, patch).await
    }

    async fn remove(&self, collection: Collection, id: ItemId) -> Result<(), RemoteError> {
        self.inner.remove(collection, id).await
    }

    async fn subscribe(&self, collection: Collection) -> Result<ChangeFeed, RemoteError> {
        self.inner.subscribe(collection).await
    }
}

// initial_load

#[tokio::test]
async fn test_initial_load_uses_remote_rows_in_order() {
    let remote = MemoryCatalog::new()
        .with_rows(Collection::Movies, vec![row(3, "Newest"), row(2, "Middle"), row(1, "Oldest")])
        .await
        .with_rows(Collection::Shows, vec![row(1, "Dark")])
        .await;
    let (sync, store) = create(Arc::new(remote));

    sync.initial_load().await;

    assert_eq!(titles(&sync.movies().await), vec!["Newest", "Middle", "Oldest"]);
    assert_eq!(titles(&sync.shows().await), vec!["Dark"]);
    assert!(!sync.loading());
    assert!(sync.last_error().await.is_none());
    // Successful loads are snapshotted
    assert!(store.contains("movies"));
    assert!(store.contains("shows"));
}

#[tokio::test]
async fn test_initial_load_offline_falls_back_to_seed() {
    let remote = MemoryCatalog::new();
    remote.set_offline(true).await;
    let (sync, store) = create(Arc::new(remote));

    sync.initial_load().await;

    assert_eq!(sync.movies().await, seed_items(Collection::Movies));
    assert_eq!(sync.shows().await, seed_items(Collection::Shows));
    assert!(!sync.loading());
    assert!(sync.last_error().await.is_some());
    // Seed data is never written back as a snapshot
    assert!(!store.contains("movies"));
}

#[tokio::test]
async fn test_initial_load_missing_collection_and_empty_collection_use_seed() {
    let remote = MemoryCatalog::new()
        .with_rows(Collection::Movies, vec![])
        .await;
    remote.unprovision(Collection::Shows).await;
    let (sync, _) = create(Arc::new(remote));

    sync.initial_load().await;

    assert_eq!(sync.movies().await, seed_items(Collection::Movies));
    assert_eq!(sync.shows().await, seed_items(Collection::Shows));
}

#[tokio::test]
async fn test_initial_load_prefers_local_snapshot_over_seed() {
    let online = MemoryCatalog::new()
        .with_rows(Collection::Movies, vec![row(10, "Heat")])
        .await;
    let store = Arc::new(MemoryStore::new());

    let first = CatalogSynchronizer::create(Arc::new(online), store.clone(), SyncOptions::default());
    first.initial_load().await;
    first.teardown();

    let offline = MemoryCatalog::new();
    offline.set_offline(true).await;
    let second = CatalogSynchronizer::create(Arc::new(offline), store, SyncOptions::default());
    second.initial_load().await;

    assert_eq!(titles(&second.movies().await), vec!["Heat"]);
    // Nothing was snapshotted for shows
    assert_eq!(second.shows().await, seed_items(Collection::Shows));
}

#[tokio::test]
async fn test_initial_load_without_seed_leaves_empty_lists() {
    let remote = MemoryCatalog::new();
    remote.set_offline(true).await;
    let options = SyncOptions {
        seed_when_empty: false,
        ..SyncOptions::default()
    };
    let sync = CatalogSynchronizer::create(Arc::new(remote), Arc::new(MemoryStore::new()), options);

    sync.initial_load().await;
    assert!(sync.movies().await.is_empty());
}

#[tokio::test]
async fn test_loading_is_true_while_call_outstanding() {
    let remote = Arc::new(GatedCatalog::new(MemoryCatalog::new()));
    let (sync, _) = create(remote.clone());
    assert!(!sync.loading());

    let task = tokio::spawn({
        let sync = sync.clone();
        async move { sync.initial_load().await }
    });

    remote.entered.notified().await;
    assert!(sync.loading());

    // One release per collection
    remote.release.notify_one();
    remote.entered.notified().await;
    remote.release.notify_one();
    task.await.unwrap();

    assert!(!sync.loading());
}

// refresh

#[tokio::test]
async fn test_refresh_keeps_failed_collection_and_overwrites_empty_success() {
    let remote = Arc::new(
        MemoryCatalog::new()
            .with_rows(Collection::Movies, vec![row(1, "Heat")])
            .await
            .with_rows(Collection::Shows, vec![row(1, "Dark"), row(2, "Lost")])
            .await,
    );
    let (sync, _) = create(remote.clone());
    sync.initial_load().await;
    let shows_before = sync.shows().await;

    remote.remove(Collection::Movies, ItemId(1)).await.unwrap();
    remote.unprovision(Collection::Shows).await;
    sync.refresh().await;

    assert!(sync.movies().await.is_empty());
    assert_eq!(sync.shows().await, shows_before);
    assert!(sync.last_error().await.unwrap().contains("shows"));
}

#[tokio::test]
async fn test_refresh_before_any_load_uses_fallback_chain() {
    let remote = MemoryCatalog::new();
    remote.set_offline(true).await;
    let (sync, _) = create(Arc::new(remote));

    sync.refresh().await;

    assert_eq!(sync.movies().await, seed_items(Collection::Movies));
    assert_eq!(sync.shows().await, seed_items(Collection::Shows));
}

#[tokio::test]
async fn test_refresh_picks_up_remote_changes() {
    let remote = Arc::new(MemoryCatalog::new().with_rows(Collection::Shows, vec![row(1, "Dark")]).await);
    let (sync, _) = create(remote.clone());
    sync.initial_load().await;

    remote
        .insert(Collection::Shows, &RawRecord { title: Some("Lost".to_string()), ..RawRecord::default() })
        .await
        .unwrap();
    sync.refresh().await;

    assert_eq!(titles(&sync.shows().await), vec!["Lost", "Dark"]);
}

// add

#[tokio::test]
async fn test_add_offline_synthesizes_local_item() {
    let remote = MemoryCatalog::new();
    remote.set_offline(true).await;
    let (sync, _) = create(Arc::new(remote));
    assert!(sync.movies().await.is_empty());

    let draft: ItemDraft = serde_json::from_value(json!({ "title": "X", "year": 2020, "rating": "7.5" })).unwrap();
    let written = sync.add(draft, Collection::Movies).await;

    assert!(!written.is_remote());
    let movies = sync.movies().await;
    assert_eq!(movies.len(), 1);
    let item = &movies[0];
    assert_eq!(item, written.value());
    assert!(item.id.0 > 0);
    assert_eq!(item.title_primary, "X");
    assert_eq!(item.release_year, Some(2020));
    assert_eq!(item.rating_score, 7.5);
    assert!(item.genre_tags.is_empty());
    assert!(item.cast_names.is_empty());
    assert!(!sync.loading());
}

#[tokio::test]
async fn test_add_offline_ids_are_unique() {
    let remote = MemoryCatalog::new();
    remote.set_offline(true).await;
    let (sync, _) = create(Arc::new(remote));

    let mut ids = HashSet::new();
    for i in 0..20 {
        let written = sync.add(ItemDraft::titled(&format!("Local {}", i)), Collection::Shows).await;
        ids.insert(written.value().id);
    }
    assert_eq!(ids.len(), 20);
    assert_eq!(sync.shows().await.len(), 20);
}

#[tokio::test]
async fn test_add_remote_prepends_service_record() {
    let remote = Arc::new(MemoryCatalog::new().with_rows(Collection::Movies, vec![row(4, "Heat")]).await);
    let (sync, store) = create(remote.clone());
    sync.initial_load().await;

    let draft = ItemDraft {
        title_primary: "فضائي".to_string(),
        title_secondary: "Alien".to_string(),
        rating_score: 8.5,
        ..ItemDraft::default()
    };
    let written = sync.add(draft, Collection::Movies).await;

    match &written {
        Written::Remote(item) => {
            assert_eq!(item.id, ItemId(5));
            assert_eq!(item.title_primary, "فضائي");
            assert_eq!(item.title_secondary, "Alien");
        }
        other => panic!("expected a remote write, got {:?}", other),
    }
    assert_eq!(titles(&sync.movies().await), vec!["فضائي", "Heat"]);
    assert_eq!(remote.row_count(Collection::Movies).await, 2);

    let snapshot: Vec<CatalogItem> = load_bucket(store.as_ref(), "movies").unwrap();
    assert_eq!(snapshot.len(), 2);
}

#[tokio::test]
async fn test_add_rejected_by_service_is_kept_locally() {
    let (sync, _) = create(Arc::new(MemoryCatalog::new()));

    // The service requires a title
    let written = sync.add(ItemDraft::default(), Collection::Shows).await;

    assert!(matches!(written, Written::LocalOnly(_)));
    assert_eq!(sync.shows().await.len(), 1);
    assert_eq!(sync.shows().await[0].season_count(), Some(1));
}

#[tokio::test]
async fn test_insert_redelivery_after_remote_add_is_not_duplicated() {
    let remote = Arc::new(MemoryCatalog::new().with_rows(Collection::Movies, vec![row(10, "Alien")]).await);
    let (sync, _) = create(remote.clone());
    sync.initial_load().await;
    let seeded = sync.movies().await.len();

    let mut applied = sync.watch_changes();
    assert_eq!(sync.attach().await, 2);

    let written = sync.add(ItemDraft::titled("Heat"), Collection::Movies).await;
    assert!(written.is_remote());

    let change = next_applied(&mut applied).await;
    assert_eq!(change.kind, "INSERT");
    let id = written.value().id;
    let movies = sync.movies().await;
    assert_eq!(movies.iter().filter(|m| m.id == id).count(), 1);
    assert_eq!(movies.len(), seeded + 1);
}

#[tokio::test]
async fn test_insert_event_for_locally_added_id_is_dropped() {
    let remote = MemoryCatalog::new();
    remote.set_offline(true).await;
    let (sync, _) = create(Arc::new(remote));

    let local = sync.add(ItemDraft::titled("X"), Collection::Movies).await.into_inner();
    let outcome = sync
        .apply_remote_event(ChangeEvent::insert(Collection::Movies, row(local.id.0, "X (remote)")))
        .await;

    assert_eq!(outcome, EventOutcome::Dropped);
    let movies = sync.movies().await;
    assert_eq!(movies.len(), 1);
    assert_eq!(movies[0].title_primary, "X");
}

// update

#[tokio::test]
async fn test_update_absent_id_is_noop() {
    let remote = Arc::new(MemoryCatalog::new().with_rows(Collection::Movies, vec![row(1, "Heat")]).await);
    let (sync, _) = create(remote.clone());
    sync.initial_load().await;
    let before = sync.snapshot().await;

    let patch = ItemPatch {
        title_primary: Some("Ghost".to_string()),
        ..ItemPatch::default()
    };
    assert!(sync.update(ItemId(99), patch, Collection::Movies).await.is_none());
    assert_eq!(sync.snapshot().await, before);
}

#[tokio::test]
async fn test_update_remote_replaces_with_service_record() {
    let remote = Arc::new(
        MemoryCatalog::new()
            .with_rows(Collection::Movies, vec![row(2, "Alien"), row(1, "Heat")])
            .await,
    );
    let (sync, _) = create(remote.clone());
    sync.initial_load().await;

    let patch = ItemPatch {
        rating_score: Some(8.3),
        ..ItemPatch::default()
    };
    let written = sync.update(ItemId(1), patch, Collection::Movies).await.unwrap();

    assert!(written.is_remote());
    assert_eq!(written.value().rating_score, 8.3);
    assert_eq!(written.value().title_primary, "Heat");
    let movies = sync.movies().await;
    assert_eq!(movies.len(), 2);
    assert_eq!(movies[1], *written.value());
}

#[tokio::test]
async fn test_update_offline_merges_locally() {
    let remote = Arc::new(MemoryCatalog::new().with_rows(Collection::Shows, vec![row(7, "Dark")]).await);
    let (sync, _) = create(remote.clone());
    sync.initial_load().await;
    remote.set_offline(true).await;

    let patch = ItemPatch {
        season_count: Some(3),
        genre_tags: Some(vec!["Sci-Fi".to_string()]),
        ..ItemPatch::default()
    };
    let written = sync.update(ItemId(7), patch, Collection::Shows).await.unwrap();

    assert!(!written.is_remote());
    let shows = sync.shows().await;
    assert_eq!(shows.len(), 1);
    assert_eq!(shows[0].title_primary, "Dark");
    assert_eq!(shows[0].season_count(), Some(3));
    assert_eq!(shows[0].genre_tags, vec!["Sci-Fi".to_string()]);
}

#[tokio::test]
async fn test_update_of_local_only_item_falls_back_when_service_lacks_it() {
    let remote = Arc::new(MemoryCatalog::new());
    let (sync, _) = create(remote.clone());

    remote.set_offline(true).await;
    let local = sync.add(ItemDraft::titled("Draft"), Collection::Movies).await.into_inner();
    remote.set_offline(false).await;

    let patch = ItemPatch {
        title_primary: Some("Final".to_string()),
        ..ItemPatch::default()
    };
    let written = sync.update(local.id, patch, Collection::Movies).await.unwrap();

    assert!(matches!(written, Written::LocalOnly(_)));
    assert_eq!(titles(&sync.movies().await), vec!["Final"]);
}

#[tokio::test]
async fn test_update_of_display_title_keeps_english_title() {
    let godfather = RawRecord {
        title: Some("The Godfather".to_string()),
        title_ar: Some("العراب".to_string()),
        ..RawRecord::with_id(ItemId(1))
    };
    let remote = Arc::new(MemoryCatalog::new().with_rows(Collection::Movies, vec![godfather]).await);
    let (sync, _) = create(remote.clone());
    sync.initial_load().await;

    let patch = ItemPatch {
        title_primary: Some("العراب 2".to_string()),
        ..ItemPatch::default()
    };
    let written = sync.update(ItemId(1), patch, Collection::Movies).await.unwrap();
    assert!(written.is_remote());
    assert_eq!(written.value().title_primary, "العراب 2");
    assert_eq!(written.value().title_secondary, "The Godfather");

    remote.set_offline(true).await;
    let patch = ItemPatch {
        title_primary: Some("العراب 3".to_string()),
        ..ItemPatch::default()
    };
    let written = sync.update(ItemId(1), patch, Collection::Movies).await.unwrap();
    assert!(!written.is_remote());
    assert_eq!(written.value().title_primary, "العراب 3");
    assert_eq!(written.value().title_secondary, "The Godfather");
}

#[tokio::test]
async fn test_failed_writes_leave_last_error_clear() {
    let remote = Arc::new(MemoryCatalog::new().with_rows(Collection::Movies, vec![row(1, "Heat")]).await);
    let (sync, _) = create(remote.clone());
    sync.initial_load().await;
    assert!(sync.last_error().await.is_none());

    remote.set_offline(true).await;
    assert!(!sync.add(ItemDraft::titled("Draft"), Collection::Movies).await.is_remote());
    let patch = ItemPatch {
        rating_score: Some(7.0),
        ..ItemPatch::default()
    };
    assert!(!sync.update(ItemId(1), patch, Collection::Movies).await.unwrap().is_remote());
    assert!(!sync.delete(ItemId(1), Collection::Movies).await.is_remote());

    assert!(sync.last_error().await.is_none());
}

// delete

#[tokio::test]
async fn test_delete_removes_locally_and_remotely() {
    let remote = Arc::new(MemoryCatalog::new().with_rows(Collection::Movies, vec![row(1, "Heat")]).await);
    let (sync, _) = create(remote.clone());
    sync.initial_load().await;

    let written = sync.delete(ItemId(1), Collection::Movies).await;

    assert!(written.is_remote());
    assert_eq!(written.value().as_ref().map(|i| i.id), Some(ItemId(1)));
    assert!(sync.movies().await.is_empty());
    assert_eq!(remote.row_count(Collection::Movies).await, 0);
}

#[tokio::test]
async fn test_delete_offline_still_removes_locally() {
    let remote = Arc::new(MemoryCatalog::new().with_rows(Collection::Movies, vec![row(1, "Heat")]).await);
    let (sync, _) = create(remote.clone());
    sync.initial_load().await;
    remote.set_offline(true).await;

    let written = sync.delete(ItemId(1), Collection::Movies).await;

    assert!(matches!(written, Written::LocalOnly(Some(_))));
    assert!(sync.movies().await.is_empty());
    // No retry queue: the service still has the row
    assert_eq!(remote.row_count(Collection::Movies).await, 1);
}

#[tokio::test]
async fn test_delete_absent_id_is_idempotent() {
    let remote = Arc::new(MemoryCatalog::new().with_rows(Collection::Movies, vec![row(1, "Heat")]).await);
    let (sync, _) = create(remote.clone());
    sync.initial_load().await;
    let before = sync.snapshot().await;

    let first = sync.delete(ItemId(42), Collection::Movies).await;
    let second = sync.delete(ItemId(42), Collection::Movies).await;

    assert_eq!(first, Written::Remote(None));
    assert_eq!(second, Written::Remote(None));
    assert_eq!(sync.snapshot().await, before);
}

// applyRemoteEvent

#[tokio::test]
async fn test_delete_event_for_unknown_id_leaves_list_unchanged() {
    let remote = Arc::new(MemoryCatalog::new().with_rows(Collection::Movies, vec![row(1, "Heat")]).await);
    let (sync, _) = create(remote);
    sync.initial_load().await;
    let before = sync.movies().await;

    let outcome = sync
        .apply_remote_event(ChangeEvent::delete(Collection::Movies, ItemId(42)))
        .await;

    assert_eq!(outcome, EventOutcome::Dropped);
    assert_eq!(sync.movies().await, before);
}

#[tokio::test]
async fn test_update_event_for_unknown_id_is_not_inserted() {
    let (sync, _) = create(Arc::new(MemoryCatalog::new()));
    sync.initial_load().await;
    let before = sync.snapshot().await;

    let outcome = sync
        .apply_remote_event(ChangeEvent::update(Collection::Shows, row(999, "Ghost")))
        .await;

    assert_eq!(outcome, EventOutcome::Dropped);
    assert_eq!(sync.snapshot().await, before);
}

#[tokio::test]
async fn test_late_update_event_overwrites_newer_local_edit() {
    let remote = Arc::new(MemoryCatalog::new().with_rows(Collection::Movies, vec![row(1, "Heat")]).await);
    let (sync, _) = create(remote.clone());
    sync.initial_load().await;

    remote.set_offline(true).await;
    let patch = ItemPatch {
        title_primary: Some("Local edit".to_string()),
        ..ItemPatch::default()
    };
    sync.update(ItemId(1), patch, Collection::Movies).await.unwrap();

    // An older remote state arrives afterwards and wins
    let outcome = sync
        .apply_remote_event(ChangeEvent::update(Collection::Movies, row(1, "Heat")))
        .await;

    assert_eq!(outcome, EventOutcome::Replaced(ItemId(1)));
    assert_eq!(titles(&sync.movies().await), vec!["Heat"]);
}

#[tokio::test]
async fn test_mixed_operations_keep_one_entry_per_id() {
    let remote = Arc::new(MemoryCatalog::new().with_rows(Collection::Movies, vec![row(100, "Z")]).await);
    let (sync, _) = create(remote.clone());
    sync.initial_load().await;

    let a = sync.add(ItemDraft::titled("A"), Collection::Movies).await.into_inner();
    remote.set_offline(true).await;
    let b = sync.add(ItemDraft::titled("B"), Collection::Movies).await.into_inner();
    sync.update(
        a.id,
        ItemPatch {
            title_primary: Some("A2".to_string()),
            ..ItemPatch::default()
        },
        Collection::Movies,
    )
    .await;
    remote.set_offline(false).await;
    sync.apply_remote_event(ChangeEvent::insert(Collection::Movies, row(a.id.0, "A"))).await;
    sync.delete(b.id, Collection::Movies).await;
    sync.delete(b.id, Collection::Movies).await;

    let movies = sync.movies().await;
    let ids: HashSet<ItemId> = movies.iter().map(|m| m.id).collect();
    assert_eq!(ids.len(), movies.len());
    assert!(!ids.contains(&b.id));
    assert_eq!(sync.find(Collection::Movies, a.id).await.unwrap().title_primary, "A2");
}

// attach / detach / teardown

#[tokio::test]
async fn test_attached_feeds_merge_remote_changes() {
    let remote = Arc::new(MemoryCatalog::new().with_rows(Collection::Shows, vec![row(1, "Dark")]).await);
    let (sync, _) = create(remote.clone());
    sync.initial_load().await;
    let mut applied = sync.watch_changes();
    sync.attach().await;

    remote.publish(ChangeEvent::insert(Collection::Shows, row(2, "Lost"))).await;
    assert_eq!(next_applied(&mut applied).await.outcome, EventOutcome::Inserted(ItemId(2)));

    remote.publish(ChangeEvent::update(Collection::Shows, row(1, "Dark (2017)"))).await;
    assert_eq!(next_applied(&mut applied).await.outcome, EventOutcome::Replaced(ItemId(1)));

    remote.publish(ChangeEvent::delete(Collection::Shows, ItemId(2))).await;
    assert_eq!(next_applied(&mut applied).await.outcome, EventOutcome::Removed(ItemId(2)));

    assert_eq!(titles(&sync.shows().await), vec!["Dark (2017)"]);
}

#[tokio::test]
async fn test_reattach_does_not_accumulate_subscriptions() {
    let remote = Arc::new(MemoryCatalog::new());
    let (sync, _) = create(remote.clone());

    for _ in 0..3 {
        assert_eq!(sync.attach().await, 2);
    }
    assert_eq!(sync.attached_count(), 2);
    assert_eq!(remote.subscriber_count(Collection::Movies).await, 1);
    assert_eq!(remote.subscriber_count(Collection::Shows).await, 1);

    assert_eq!(sync.detach(), 2);
    assert_eq!(remote.subscriber_count(Collection::Movies).await, 0);
    assert_eq!(remote.subscriber_count(Collection::Shows).await, 0);
}

#[tokio::test]
async fn test_attach_offline_degrades_silently() {
    let remote = MemoryCatalog::new();
    remote.set_offline(true).await;
    let (sync, _) = create(Arc::new(remote));

    assert_eq!(sync.attach().await, 0);
    assert!(sync.last_error().await.is_none());
}

#[tokio::test]
async fn test_teardown_releases_feeds_and_ignores_events() {
    let remote = Arc::new(MemoryCatalog::new().with_rows(Collection::Movies, vec![row(1, "Heat")]).await);
    let (sync, _) = create(remote.clone());
    sync.initial_load().await;
    sync.attach().await;

    sync.teardown();

    assert!(sync.is_torn_down());
    assert_eq!(remote.subscriber_count(Collection::Movies).await, 0);
    assert_eq!(sync.attach().await, 0);
    let outcome = sync
        .apply_remote_event(ChangeEvent::delete(Collection::Movies, ItemId(1)))
        .await;
    assert_eq!(outcome, EventOutcome::Dropped);
    // Reads still see the last state
    assert_eq!(titles(&sync.movies().await), vec!["Heat"]);
}

#[tokio::test]
async fn test_teardown_discards_pending_completion() {
    let remote = Arc::new(GatedCatalog::new(MemoryCatalog::new()));
    let (sync, store) = create(remote.clone());

    let task = tokio::spawn({
        let sync = sync.clone();
        async move { sync.add(ItemDraft::titled("Late"), Collection::Movies).await }
    });

    remote.entered.notified().await;
    assert!(sync.loading());
    sync.teardown();
    remote.release.notify_one();

    let written = task.await.unwrap();
    assert!(written.is_remote());
    assert!(sync.movies().await.is_empty());
    assert!(!store.contains("movies"));
    assert!(!sync.loading());
}

#[tokio::test]
async fn test_dropping_last_handle_releases_feeds() {
    let remote = Arc::new(MemoryCatalog::new());
    let (sync, _) = create(remote.clone());
    sync.attach().await;
    assert_eq!(remote.subscriber_count(Collection::Shows).await, 1);

    drop(sync);
    assert_eq!(remote.subscriber_count(Collection::Shows).await, 0);
}
