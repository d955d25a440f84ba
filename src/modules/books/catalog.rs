//! The authoritative in-memory catalog and its persisted slot.

use std::path::Path;
use std::sync::Arc;

use libris_db::{FileStore, KeyValueStore, MemoryStore};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{Book, NewBook};

/// Storage slot holding the JSON-encoded record list.
pub const BOOKS_SLOT: &str = "books";

/// Slot receiving an unreadable `books` value before it is first overwritten.
pub const UNREADABLE_SLOT: &str = "books_unreadable";

/// Catalog handle shared between modules.
pub type SharedCatalog = Arc<RwLock<Catalog>>;

/// Whether the catalog's store outlives the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    Durable,
    MemoryOnly,
}

/// Ordered list of records, written through to a key-value slot on every mutation.
pub struct Catalog {
    books: Vec<Book>,
    store: Arc<dyn KeyValueStore>,
    mode: StoreMode,
    persisted: bool,
    /// Raw slot value that failed to decode, kept until it has been backed up.
    unreadable: Option<String>,
}

impl Catalog {
    /// Rehydrate from the `books` slot.
    ///
    /// A missing, unreadable, or malformed slot yields an empty catalog.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let mut unreadable = None;
        let books = match store.get(BOOKS_SLOT) {
            Ok(Some(raw)) => match decode_books(&raw) {
                Ok(books) => books,
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        store = %store.describe(),
                        backup_slot = UNREADABLE_SLOT,
                        "persisted catalog is malformed; starting with an empty catalog, \
                         the stored value is copied to the backup slot before the next save"
                    );
                    unreadable = Some(raw);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    "failed to read persisted catalog; starting with an empty catalog"
                );
                Vec::new()
            }
        };

        tracing::info!(books = books.len(), store = %store.describe(), "catalog loaded");

        Self {
            books,
            store,
            mode: StoreMode::Durable,
            persisted: true,
            unreadable,
        }
    }

    /// Open the file store under `data_dir` and rehydrate from it.
    ///
    /// Falls back to a memory-only catalog when the directory is unusable.
    pub fn open(data_dir: &Path) -> Self {
        let (store, mode) = open_store(data_dir);
        Self {
            mode,
            ..Self::load(store)
        }
    }

    pub fn into_shared(self) -> SharedCatalog {
        Arc::new(RwLock::new(self))
    }

    /// Records in insertion order.
    pub fn list(&self) -> &[Book] {
        &self.books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Book> {
        self.books.iter().find(|book| book.id == id)
    }

    /// False while the most recent write to the slot has failed, or when
    /// the catalog runs without a durable store.
    pub fn is_persisted(&self) -> bool {
        self.persisted && self.is_durable()
    }

    pub fn is_durable(&self) -> bool {
        self.mode == StoreMode::Durable
    }

    /// Append a new record with a freshly assigned id.
    pub fn add(&mut self, draft: NewBook) -> Book {
        let book = draft.into_book(self.fresh_id());
        tracing::debug!(id = %book.id, title = %book.title, "adding book");
        self.books.push(book.clone());
        self.persist();
        book
    }

    /// Replace the record with the same id. Returns false when no record matched.
    pub fn update(&mut self, book: Book) -> bool {
        let Some(slot) = self.books.iter_mut().find(|b| b.id == book.id) else {
            return false;
        };
        *slot = book;
        self.persist();
        true
    }

    /// Flip the checkout status of a record.
    pub fn toggle_status(&mut self, id: &str) -> Option<Book> {
        let book = self.books.iter_mut().find(|b| b.id == id)?;
        book.status = book.status.toggled();
        let toggled = book.clone();
        self.persist();
        Some(toggled)
    }

    /// Remove a record. Returns false when no record matched.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.books.len();
        self.books.retain(|book| book.id != id);
        if self.books.len() == before {
            return false;
        }
        self.persist();
        true
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = Uuid::now_v7().to_string();
            if self.get(&id).is_none() {
                return id;
            }
        }
    }

    fn persist(&mut self) {
        if let Some(raw) = self.unreadable.take() {
            if let Err(err) = self.store.set(UNREADABLE_SLOT, &raw) {
                tracing::warn!(
                    error = %err,
                    "failed to back up the unreadable catalog; leaving the slot untouched"
                );
                self.unreadable = Some(raw);
                self.persisted = false;
                return;
            }
            tracing::info!(slot = UNREADABLE_SLOT, "unreadable catalog backed up");
        }

        let result = encode_books(&self.books)
            .map_err(|err| err.to_string())
            .and_then(|raw| {
                self.store
                    .set(BOOKS_SLOT, &raw)
                    .map_err(|err| err.to_string())
            });

        match result {
            Ok(()) => {
                if !self.persisted {
                    tracing::info!("catalog persistence recovered");
                }
                self.persisted = true;
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    books = self.books.len(),
                    "failed to persist catalog; continuing with in-memory state"
                );
                self.persisted = false;
            }
        }
    }
}

pub fn encode_books(books: &[Book]) -> serde_json::Result<String> {
    serde_json::to_string(books)
}

pub fn decode_books(raw: &str) -> serde_json::Result<Vec<Book>> {
    serde_json::from_str(raw)
}

/// Open the file store under `data_dir`, falling back to a volatile store.
pub fn open_store(data_dir: &Path) -> (Arc<dyn KeyValueStore>, StoreMode) {
    match FileStore::open(data_dir) {
        Ok(store) => (Arc::new(store), StoreMode::Durable),
        Err(err) => {
            tracing::warn!(
                error = %err,
                "storage unavailable; catalog changes will not survive a restart"
            );
            (Arc::new(MemoryStore::new()), StoreMode::MemoryOnly)
        }
    }
}
