//! The item list and its create/update/delete/undo lifecycle.
//!
//! Every mutation builds a fresh list and swaps it in whole, then writes the
//! full list to the [`ListSink`]. Snapshots returned by [`ItemStore::list`]
//! never observe later changes.

use std::sync::Arc;

use time::Duration;

use crate::storage::ListSink;
use crate::undo::{Clock, ExpiryHandle, UndoBuffer};

mod item;
pub mod validate;

pub use item::{Item, ItemId};
pub use validate::{validate, Field, FieldError, ItemDraft, ValidationError};

pub const DEFAULT_UNDO_WINDOW: Duration = Duration::seconds(5);

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("item {0} not found")]
    NotFound(ItemId),
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("no item matches id '{0}'")]
    UnknownPrefix(String),
    #[error("id '{prefix}' matches {matches} items")]
    AmbiguousPrefix { prefix: String, matches: usize },
    #[error("formatting creation timestamp")]
    Timestamp(#[from] time::error::Format),
}

pub struct ItemStore {
    items: Arc<Vec<Item>>,
    sink: ListSink,
    clock: Arc<dyn Clock>,
    undo: UndoBuffer,
    undo_window: Duration,
}

impl ItemStore {
    /// Loads whatever the sink holds; an unreadable list starts empty.
    pub fn open(sink: ListSink, clock: Arc<dyn Clock>, undo_window: Duration) -> Self {
        let items = sink.load();
        tracing::debug!(count = items.len(), key = sink.key(), "loaded items");
        Self {
            items: Arc::new(items),
            sink,
            clock,
            undo: UndoBuffer::default(),
            undo_window,
        }
    }

    pub fn list(&self) -> Arc<Vec<Item>> {
        Arc::clone(&self.items)
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &ItemId) -> Option<&Item> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Exact id first, then a unique id prefix.
    pub fn resolve(&self, prefix: &str) -> Result<&Item, StoreError> {
        let prefix = prefix.trim();
        if let Some(item) = self.items.iter().find(|item| item.id.as_str() == prefix) {
            return Ok(item);
        }
        if prefix.is_empty() {
            return Err(StoreError::UnknownPrefix(prefix.to_owned()));
        }
        let mut matches = self
            .items
            .iter()
            .filter(|item| item.id.as_str().starts_with(prefix));
        match (matches.next(), matches.count()) {
            (Some(item), 0) => Ok(item),
            (Some(_), rest) => Err(StoreError::AmbiguousPrefix {
                prefix: prefix.to_owned(),
                matches: rest + 1,
            }),
            (None, _) => Err(StoreError::UnknownPrefix(prefix.to_owned())),
        }
    }

    pub fn create(&mut self, title: &str, subtitle: &str) -> Result<Item, StoreError> {
        let draft = validate(title, subtitle)?;
        let item = Item {
            id: self.fresh_id(),
            created_at: item::format_created_at(self.clock.now())?,
            title: draft.title,
            subtitle: draft.subtitle,
        };
        let mut next = Vec::with_capacity(self.items.len() + 1);
        next.push(item.clone());
        next.extend(self.items.iter().cloned());
        self.commit(next);
        tracing::info!(id = %item.id, "created item");
        Ok(item)
    }

    pub fn update(&mut self, id: &ItemId, title: &str, subtitle: &str) -> Result<Item, StoreError> {
        let draft = validate(title, subtitle)?;
        let Some(position) = self.position(id) else {
            return Err(StoreError::NotFound(id.clone()));
        };
        let mut next = (*self.items).clone();
        let target = &mut next[position];
        target.title = draft.title;
        target.subtitle = draft.subtitle;
        let updated = target.clone();
        self.commit(next);
        tracing::info!(id = %updated.id, "updated item");
        Ok(updated)
    }

    pub fn delete(&mut self, id: &ItemId) -> Result<Item, StoreError> {
        let Some(position) = self.position(id) else {
            return Err(StoreError::NotFound(id.clone()));
        };
        let mut next = (*self.items).clone();
        let removed = next.remove(position);
        self.commit(next);

        let expiry = ExpiryHandle::arm(self.clock.now(), self.undo_window);
        if let Some(displaced) = self.undo.capture(removed.clone(), expiry) {
            tracing::debug!(id = %displaced.id, "discarded previous undo snapshot");
        }
        tracing::info!(id = %removed.id, "deleted item");
        Ok(removed)
    }

    /// Re-inserts the last deleted item at the front of the list.
    pub fn undo(&mut self) -> Result<Item, StoreError> {
        let Some(snapshot) = self.undo.restore(self.clock.now()) else {
            return Err(StoreError::NothingToUndo);
        };
        if self.position(&snapshot.id).is_some() {
            tracing::warn!(id = %snapshot.id, "refusing to restore item whose id is in use");
            return Err(StoreError::NothingToUndo);
        }
        let mut next = Vec::with_capacity(self.items.len() + 1);
        next.push(snapshot.clone());
        next.extend(self.items.iter().cloned());
        self.commit(next);
        tracing::info!(id = %snapshot.id, "restored deleted item");
        Ok(snapshot)
    }

    /// Runs the undo expiry if it is due. Returns true when a snapshot was
    /// discarded.
    pub fn tick(&mut self) -> bool {
        match self.undo.poll(self.clock.now()) {
            Some(expired) => {
                tracing::debug!(id = %expired.id, "undo window elapsed");
                true
            }
            None => false,
        }
    }

    pub fn pending_undo(&self) -> Option<&Item> {
        self.undo.live(self.clock.now())
    }

    /// Fills an empty list with `samples`, in order. Does nothing when items
    /// already exist. All samples are validated before anything is stored.
    pub fn seed(&mut self, samples: &[(&str, &str)]) -> Result<usize, StoreError> {
        if !self.items.is_empty() {
            return Ok(0);
        }
        let created_at = item::format_created_at(self.clock.now())?;
        let mut next = Vec::with_capacity(samples.len());
        for (title, subtitle) in samples {
            let draft = validate(title, subtitle)?;
            next.push(Item {
                id: self.fresh_id(),
                created_at: created_at.clone(),
                title: draft.title,
                subtitle: draft.subtitle,
            });
        }
        let count = next.len();
        self.commit(next);
        tracing::info!(count, "seeded sample items");
        Ok(count)
    }

    fn position(&self, id: &ItemId) -> Option<usize> {
        self.items.iter().position(|item| &item.id == id)
    }

    fn fresh_id(&self) -> ItemId {
        let now = self.clock.now();
        loop {
            let id = ItemId::random();
            let held = self.undo.live(now).is_some_and(|item| item.id == id);
            if !held && self.position(&id).is_none() {
                return id;
            }
        }
    }

    fn commit(&mut self, next: Vec<Item>) {
        self.items = Arc::new(next);
        self.sink.save(&self.items);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UndoOptions;
    use crate::storage::{KeyValueStore, MemoryStore};
    use crate::undo::ManualClock;
    use assert_matches::assert_matches;
    use std::collections::HashSet;
    use time::macros::datetime;

    const KEY: &str = "listkeep:list-items";

    struct Fixture {
        kv: Arc<MemoryStore>,
        clock: Arc<ManualClock>,
        store: ItemStore,
    }

    impl Fixture {
        fn new() -> Self {
            let kv = Arc::new(MemoryStore::new());
            let clock = Arc::new(ManualClock::new(datetime!(2026-10-18 09:00 UTC)));
            let store = Self::open(&kv, &clock);
            Self { kv, clock, store }
        }

        fn open(kv: &Arc<MemoryStore>, clock: &Arc<ManualClock>) -> ItemStore {
            let sink = ListSink::new(kv.clone(), KEY);
            ItemStore::open(sink, clock.clone(), DEFAULT_UNDO_WINDOW)
        }

        fn reopen(&self) -> ItemStore {
            Self::open(&self.kv, &self.clock)
        }

        fn titles(&self) -> Vec<String> {
            self.store.items().iter().map(|i| i.title.clone()).collect()
        }
    }

    #[test]
    fn create_prepends_normalized_item_with_unique_id() {
        let mut fx = Fixture::new();
        let mut ids = HashSet::new();
        for title in ["first item", "second item", "third item"] {
            let item = fx.store.create(title, "").unwrap();
            assert!(ids.insert(item.id.clone()));
            assert_eq!(fx.store.items()[0], item);
        }
        let item = fx.store.create("  spaced    out  ", " and   some detail ").unwrap();
        assert_eq!(item.title, "spaced out");
        assert_eq!(item.subtitle, "and some detail");
        assert_eq!(item.created_at, "2026-10-18T09:00:00.000Z");
        assert!(!ids.contains(&item.id));
        assert_eq!(
            fx.titles(),
            vec!["spaced out", "third item", "second item", "first item"]
        );
    }

    #[test]
    fn create_rejects_invalid_input_without_mutating() {
        let mut fx = Fixture::new();
        fx.store.create("keep me", "").unwrap();
        let before = fx.store.list();
        let err = fx.store.create("ab", "").unwrap_err();
        assert_matches!(err, StoreError::Validation(v) if v.reason_for(Field::Title).is_some());
        assert_eq!(*fx.store.list(), *before);
    }

    #[test]
    fn update_preserves_identity_and_position() {
        let mut fx = Fixture::new();
        let older = fx.store.create("older", "").unwrap();
        fx.clock.advance(Duration::minutes(1));
        fx.store.create("newer", "").unwrap();

        let updated = fx.store.update(&older.id, " renamed ", "fresh subtitle").unwrap();
        assert_eq!(updated.id, older.id);
        assert_eq!(updated.created_at, older.created_at);
        assert_eq!(updated.title, "renamed");
        assert_eq!(updated.subtitle, "fresh subtitle");
        assert_eq!(fx.titles(), vec!["newer", "renamed"]);
    }

    #[test]
    fn update_missing_id_is_not_found() {
        let mut fx = Fixture::new();
        fx.store.create("present", "").unwrap();
        let before = fx.store.list();
        let err = fx
            .store
            .update(&ItemId::from("missing"), "valid title", "")
            .unwrap_err();
        assert_matches!(err, StoreError::NotFound(id) if id.as_str() == "missing");
        assert_eq!(*fx.store.list(), *before);
    }

    #[test]
    fn delete_then_undo_restores_at_front() {
        let mut fx = Fixture::new();
        let a = fx.store.create("alpha", "").unwrap();
        let b = fx.store.create("bravo", "").unwrap();
        let c = fx.store.create("charlie", "").unwrap();
        assert_eq!(fx.titles(), vec!["charlie", "bravo", "alpha"]);

        let removed = fx.store.delete(&b.id).unwrap();
        assert_eq!(removed, b);
        assert_eq!(fx.titles(), vec!["charlie", "alpha"]);
        assert_eq!(fx.store.pending_undo(), Some(&b));

        let restored = fx.store.undo().unwrap();
        assert_eq!(restored, b);
        assert_eq!(fx.titles(), vec!["bravo", "charlie", "alpha"]);
        assert!(fx.store.pending_undo().is_none());
        assert_matches!(fx.store.undo(), Err(StoreError::NothingToUndo));

        let deleted_front = fx.store.delete(&c.id).unwrap();
        fx.store.undo().unwrap();
        assert_eq!(fx.store.items()[0], deleted_front);
        assert!(fx.store.get(&a.id).is_some());
    }

    #[test]
    fn undo_cancels_the_pending_expiry() {
        let mut fx = Fixture::new();
        let item = fx.store.create("restored in time", "").unwrap();
        fx.store.delete(&item.id).unwrap();
        fx.clock.advance(Duration::seconds(2));
        fx.store.undo().unwrap();

        fx.clock.advance(Duration::seconds(3));
        assert!(!fx.store.tick());
        assert!(fx.store.pending_undo().is_none());
        assert_eq!(fx.titles(), vec!["restored in time"]);
    }

    #[test]
    fn huge_undo_window_keeps_snapshot_without_overflow() {
        let kv = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(datetime!(2026-10-18 09:00 UTC)));
        let window = UndoOptions { window_ms: u64::MAX }.window();
        let mut store = ItemStore::open(ListSink::new(kv, KEY), clock.clone(), window);

        let item = store.create("kept a long while", "").unwrap();
        store.delete(&item.id).unwrap();
        clock.advance(Duration::days(365 * 50));
        assert!(!store.tick());
        assert_eq!(store.undo().unwrap(), item);
    }

    #[test]
    fn undo_after_window_is_empty() {
        let mut fx = Fixture::new();
        let item = fx.store.create("short lived", "").unwrap();
        fx.store.delete(&item.id).unwrap();
        fx.clock.advance(Duration::seconds(5));
        let before = fx.store.list();
        assert_matches!(fx.store.undo(), Err(StoreError::NothingToUndo));
        assert_eq!(*fx.store.list(), *before);
        assert!(fx.store.is_empty());
    }

    #[test]
    fn tick_clears_expired_snapshot_once() {
        let mut fx = Fixture::new();
        let item = fx.store.create("ticking", "").unwrap();
        fx.store.delete(&item.id).unwrap();
        fx.clock.advance(Duration::seconds(4));
        assert!(!fx.store.tick());
        assert!(fx.store.pending_undo().is_some());
        fx.clock.advance(Duration::seconds(1));
        assert!(fx.store.tick());
        assert!(!fx.store.tick());
        assert_matches!(fx.store.undo(), Err(StoreError::NothingToUndo));
    }

    #[test]
    fn second_delete_replaces_undo_snapshot() {
        let mut fx = Fixture::new();
        let first = fx.store.create("first", "").unwrap();
        let second = fx.store.create("second", "").unwrap();
        fx.store.delete(&first.id).unwrap();
        fx.clock.advance(Duration::seconds(3));
        fx.store.delete(&second.id).unwrap();

        // The second delete re-arms a full window.
        fx.clock.advance(Duration::seconds(3));
        assert_eq!(fx.store.undo().unwrap(), second);
        assert_matches!(fx.store.undo(), Err(StoreError::NothingToUndo));
        assert_eq!(fx.titles(), vec!["second"]);
    }

    #[test]
    fn delete_missing_id_is_not_found() {
        let mut fx = Fixture::new();
        let item = fx.store.create("once", "").unwrap();
        fx.store.delete(&item.id).unwrap();
        assert_matches!(fx.store.delete(&item.id), Err(StoreError::NotFound(_)));
    }

    #[test]
    fn every_mutation_persists_the_full_list() {
        let mut fx = Fixture::new();
        let a = fx.store.create("persisted", "").unwrap();
        assert_eq!(fx.reopen().items(), fx.store.items());

        fx.store.update(&a.id, "persisted again", "").unwrap();
        assert_eq!(fx.reopen().items()[0].title, "persisted again");

        fx.store.delete(&a.id).unwrap();
        assert!(fx.reopen().is_empty());

        fx.store.undo().unwrap();
        assert_eq!(fx.reopen().items(), fx.store.items());
        assert!(fx.kv.get(KEY).unwrap().is_some());
    }

    #[test]
    fn snapshots_are_not_affected_by_later_mutations() {
        let mut fx = Fixture::new();
        fx.store.create("before", "").unwrap();
        let snapshot = fx.store.list();
        fx.store.create("after", "").unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(fx.store.len(), 2);
    }

    #[test]
    fn resolve_accepts_unique_prefix() {
        let mut fx = Fixture::new();
        let item = fx.store.create("findable", "").unwrap();
        assert_eq!(fx.store.resolve(item.id.short()).unwrap().id, item.id);
        assert_eq!(fx.store.resolve(item.id.as_str()).unwrap().id, item.id);
        assert_matches!(fx.store.resolve("zzzz"), Err(StoreError::UnknownPrefix(_)));
        assert_matches!(fx.store.resolve(""), Err(StoreError::UnknownPrefix(_)));
    }

    #[test]
    fn seed_only_fills_empty_list() {
        let mut fx = Fixture::new();
        let samples = [("Welcome aboard", "First sample row"), ("Edit me", "")];
        assert_eq!(fx.store.seed(&samples).unwrap(), 2);
        assert_eq!(fx.titles(), vec!["Welcome aboard", "Edit me"]);
        assert_eq!(fx.store.seed(&samples).unwrap(), 0);
        assert_eq!(fx.store.len(), 2);
    }
}
