use crate::normalize::item_from_raw;
use catalog_sync_models::{CatalogItem, Change, ChangeEvent, Collection, ItemId};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Result of merging one change event into the in-memory lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Inserted(ItemId),
    Replaced(ItemId),
    Removed(ItemId),
    /// Duplicate insert, update or delete of an unknown id, malformed
    /// payload, or the synchronizer was torn down
    Dropped,
}

impl EventOutcome {
    pub fn is_applied(&self) -> bool {
        !matches!(self, EventOutcome::Dropped)
    }
}

/// Point-in-time copy of both collections.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CatalogSnapshot {
    pub movies: Vec<CatalogItem>,
    pub shows: Vec<CatalogItem>,
}

/// The canonical in-memory catalog. Every mutation is applied whole while
/// the caller holds the lock, so readers never observe a partial write.
#[derive(Debug, Default)]
pub struct CatalogState {
    movies: Vec<CatalogItem>,
    shows: Vec<CatalogItem>,
    populated: HashSet<Collection>,
    pub(crate) last_error: Option<String>,
}

impl CatalogState {
    pub fn list(&self, collection: Collection) -> &[CatalogItem] {
        match collection {
            Collection::Movies => &self.movies,
            Collection::Shows => &self.shows,
        }
    }

    fn list_mut(&mut self, collection: Collection) -> &mut Vec<CatalogItem> {
        match collection {
            Collection::Movies => &mut self.movies,
            Collection::Shows => &mut self.shows,
        }
    }

    /// Whether the collection has ever been filled by a load
    pub fn is_populated(&self, collection: Collection) -> bool {
        self.populated.contains(&collection)
    }

    pub fn position(&self, collection: Collection, id: ItemId) -> Option<usize> {
        self.list(collection).iter().position(|item| item.id == id)
    }

    pub fn find(&self, collection: Collection, id: ItemId) -> Option<&CatalogItem> {
        self.list(collection).iter().find(|item| item.id == id)
    }

    pub fn replace_all(&mut self, collection: Collection, items: Vec<CatalogItem>) {
        *self.list_mut(collection) = items;
        self.populated.insert(collection);
    }

    /// Prepend `item`; an entry with the same id is removed first.
    pub fn upsert_front(&mut self, item: CatalogItem) {
        let list = self.list_mut(item.collection());
        list.retain(|existing| existing.id != item.id);
        list.insert(0, item);
    }

    /// Replace in place. Returns false when no entry has the id.
    pub fn replace(&mut self, item: CatalogItem) -> bool {
        let list = self.list_mut(item.collection());
        match list.iter_mut().find(|existing| existing.id == item.id) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, collection: Collection, id: ItemId) -> Option<CatalogItem> {
        let list = self.list_mut(collection);
        let index = list.iter().position(|item| item.id == id)?;
        Some(list.remove(index))
    }

    pub fn snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot {
            movies: self.movies.clone(),
            shows: self.shows.clone(),
        }
    }

    /// Merge a remote change. Inserts never duplicate, updates never
    /// insert, deletes of unknown ids are no-ops. There is no version
    /// check: the last event applied wins.
    pub fn apply_event(&mut self, event: &ChangeEvent) -> EventOutcome {
        let collection = event.collection;
        match &event.change {
            Change::Insert { record } => {
                let item = match item_from_raw(collection, record) {
                    Ok(item) => item,
                    Err(e) => {
                        warn!("Dropping INSERT event: {}", e);
                        return EventOutcome::Dropped;
                    }
                };
                if self.position(collection, item.id).is_some() {
                    debug!("{} {} already present, INSERT dropped", collection, item.id);
                    return EventOutcome::Dropped;
                }
                let id = item.id;
                self.list_mut(collection).insert(0, item);
                EventOutcome::Inserted(id)
            }
            Change::Update { record } => {
                let item = match item_from_raw(collection, record) {
                    Ok(item) => item,
                    Err(e) => {
                        warn!("Dropping UPDATE event: {}", e);
                        return EventOutcome::Dropped;
                    }
                };
                let id = item.id;
                if self.replace(item) {
                    EventOutcome::Replaced(id)
                } else {
                    debug!("{} {} not present, UPDATE dropped", collection, id);
                    EventOutcome::Dropped
                }
            }
            Change::Delete { id } => match self.remove(collection, *id) {
                Some(_) => EventOutcome::Removed(*id),
                None => EventOutcome::Dropped,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_sync_models::RawRecord;

    fn row(id: i64, title: &str) -> RawRecord {
        RawRecord {
            title: Some(title.to_string()),
            ..RawRecord::with_id(ItemId(id))
        }
    }

    #[test]
    fn test_insert_event_is_deduplicated() {
        let mut state = CatalogState::default();
        let event = ChangeEvent::insert(Collection::Movies, row(7, "Heat"));

        assert_eq!(state.apply_event(&event), EventOutcome::Inserted(ItemId(7)));
        assert_eq!(state.apply_event(&event), EventOutcome::Dropped);
        assert_eq!(state.list(Collection::Movies).len(), 1);
    }

    #[test]
    fn test_insert_prepends() {
        let mut state = CatalogState::default();
        state.apply_event(&ChangeEvent::insert(Collection::Shows, row(1, "Dark")));
        state.apply_event(&ChangeEvent::insert(Collection::Shows, row(2, "Lost")));

        let titles: Vec<&str> = state.list(Collection::Shows).iter().map(|i| i.display_title()).collect();
        assert_eq!(titles, vec!["Lost", "Dark"]);
        assert!(state.list(Collection::Movies).is_empty());
    }

    #[test]
    fn test_update_event_on_absent_id_is_dropped() {
        let mut state = CatalogState::default();
        state.apply_event(&ChangeEvent::insert(Collection::Movies, row(1, "Heat")));

        let outcome = state.apply_event(&ChangeEvent::update(Collection::Movies, row(2, "Alien")));
        assert_eq!(outcome, EventOutcome::Dropped);
        assert_eq!(state.list(Collection::Movies).len(), 1);
        assert!(state.find(Collection::Movies, ItemId(2)).is_none());
    }

    #[test]
    fn test_update_event_replaces_in_place() {
        let mut state = CatalogState::default();
        state.apply_event(&ChangeEvent::insert(Collection::Movies, row(1, "Heat")));
        state.apply_event(&ChangeEvent::insert(Collection::Movies, row(2, "Alien")));

        let outcome = state.apply_event(&ChangeEvent::update(Collection::Movies, row(1, "Heat (1995)")));
        assert_eq!(outcome, EventOutcome::Replaced(ItemId(1)));
        assert_eq!(state.list(Collection::Movies)[1].title_primary, "Heat (1995)");
    }

    #[test]
    fn test_delete_event_for_unknown_id_is_noop() {
        let mut state = CatalogState::default();
        state.apply_event(&ChangeEvent::insert(Collection::Movies, row(1, "Heat")));
        let before = state.snapshot();

        let outcome = state.apply_event(&ChangeEvent::delete(Collection::Movies, ItemId(42)));
        assert_eq!(outcome, EventOutcome::Dropped);
        assert_eq!(state.snapshot(), before);
    }

    #[test]
    fn test_event_without_id_is_dropped() {
        let mut state = CatalogState::default();
        let event = ChangeEvent::insert(Collection::Movies, RawRecord::default());
        assert!(!state.apply_event(&event).is_applied());
    }

    #[test]
    fn test_collections_are_separate_namespaces() {
        let mut state = CatalogState::default();
        state.apply_event(&ChangeEvent::insert(Collection::Movies, row(1, "Heat")));
        state.apply_event(&ChangeEvent::insert(Collection::Shows, row(1, "Dark")));

        assert_eq!(state.list(Collection::Movies).len(), 1);
        assert_eq!(state.list(Collection::Shows).len(), 1);
        state.apply_event(&ChangeEvent::delete(Collection::Shows, ItemId(1)));
        assert_eq!(state.list(Collection::Movies).len(), 1);
    }
}
