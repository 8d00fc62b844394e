use std::sync::Arc;

use crate::config::themes::ThemePreference;
use crate::config::{AppConfig, ThemeName};
use crate::search::{project, SearchQuery};
use crate::storage::{KeyValueStore, ListSink};
use crate::store::{Item, ItemStore, StoreError};
use crate::undo::Clock;

pub const SAMPLE_ITEMS: [(&str, &str); 2] = [
    (
        "Welcome to SavvyTech",
        "Click Create to add your first item or seed examples.",
    ),
    ("Edit me", "Try the Edit button to update this row."),
];

/// The create/edit form. Only the item under edit survives a close.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ModalState {
    #[default]
    Closed,
    OpenForCreate,
    OpenForEdit(Item),
}

impl ModalState {
    pub fn is_open(&self) -> bool {
        !matches!(self, ModalState::Closed)
    }

    pub fn heading(&self) -> Option<&'static str> {
        match self {
            ModalState::Closed => None,
            ModalState::OpenForCreate => Some("Create Item"),
            ModalState::OpenForEdit(_) => Some("Edit Item"),
        }
    }

    pub fn editing(&self) -> Option<&Item> {
        match self {
            ModalState::OpenForEdit(item) => Some(item),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("no form is open")]
    NoOpenForm,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Everything a session owns: the items, the theme, the search box and the
/// form.
pub struct AppState {
    store: ItemStore,
    theme: ThemePreference,
    query: String,
    search: SearchQuery,
    modal: ModalState,
}

impl AppState {
    pub fn init(config: &AppConfig, kv: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        let sink = ListSink::new(kv.clone(), config.storage.list_key.clone());
        let store = ItemStore::open(sink, clock, config.undo.window());
        let theme = ThemePreference::load(kv, config.storage.theme_key.clone(), config.default_theme);
        Self {
            store,
            theme,
            query: String::new(),
            search: SearchQuery::default(),
            modal: ModalState::Closed,
        }
    }

    /// Everything is already persisted after each change.
    pub fn teardown(self) {
        tracing::debug!(items = self.store.len(), "closing session");
    }

    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, raw: &str) {
        self.query = raw.to_owned();
        self.search = SearchQuery::parse(raw);
    }

    pub fn visible_items(&self) -> Vec<&Item> {
        project(self.store.items(), &self.search)
    }

    pub fn modal(&self) -> &ModalState {
        &self.modal
    }

    pub fn open_create(&mut self) {
        self.modal = ModalState::OpenForCreate;
    }

    pub fn open_edit(&mut self, id: &str) -> Result<Item, StoreError> {
        let item = self.store.resolve(id)?.clone();
        self.modal = ModalState::OpenForEdit(item.clone());
        Ok(item)
    }

    pub fn cancel(&mut self) {
        self.modal = ModalState::Closed;
    }

    /// Validation failures leave the form open; anything else closes it.
    pub fn submit(&mut self, title: &str, subtitle: &str) -> Result<Item, SubmitError> {
        let result = match &self.modal {
            ModalState::Closed => return Err(SubmitError::NoOpenForm),
            ModalState::OpenForCreate => self.store.create(title, subtitle),
            ModalState::OpenForEdit(item) => self.store.update(&item.id, title, subtitle),
        };
        if !matches!(result, Err(StoreError::Validation(_))) {
            self.modal = ModalState::Closed;
        }
        result.map_err(SubmitError::from)
    }

    pub fn delete(&mut self, id: &str) -> Result<Item, StoreError> {
        let id = self.store.resolve(id)?.id.clone();
        let removed = self.store.delete(&id)?;
        if self.modal.editing().is_some_and(|item| item.id == removed.id) {
            self.modal = ModalState::Closed;
        }
        Ok(removed)
    }

    pub fn undo(&mut self) -> Result<Item, StoreError> {
        self.store.undo()
    }

    pub fn tick(&mut self) -> bool {
        self.store.tick()
    }

    pub fn pending_undo(&self) -> Option<&Item> {
        self.store.pending_undo()
    }

    pub fn theme(&self) -> ThemeName {
        self.theme.current()
    }

    pub fn set_theme(&mut self, theme: ThemeName) {
        self.theme.set(theme);
    }

    pub fn toggle_theme(&mut self) -> ThemeName {
        self.theme.toggle()
    }

    /// Adds the sample rows when the list is empty; returns how many were added.
    pub fn seed_samples(&mut self) -> Result<usize, StoreError> {
        self.store.seed(&SAMPLE_ITEMS)
    }
}
