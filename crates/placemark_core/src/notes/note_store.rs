//! Keyed remote note collection contract and an in-process implementation.
//!
//! # Invariants
//! - Records are addressed only by `NoteKey`; the encoded key is the entry
//!   name in the `placeNotes` collection.
//! - `upsert` replaces the record in place when the key exists.

use crate::model::note::{NoteKey, PlaceNote};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard};

/// Name of the remote collection holding note records.
pub const PLACE_NOTES_COLLECTION: &str = "placeNotes";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

#[derive(Debug)]
pub enum NoteStoreError {
    /// Transport or backend failure; nothing is known about the write.
    Unavailable(String),
    /// The backend answered with a non-success HTTP status.
    Rejected(u16),
    /// The configured endpoint cannot address collection entries.
    InvalidEndpoint(String),
    Serialization(serde_json::Error),
}

impl Display for NoteStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(reason) => write!(f, "note store unavailable: {reason}"),
            Self::Rejected(status) => write!(f, "note store rejected request with status {status}"),
            Self::InvalidEndpoint(reason) => write!(f, "invalid note store endpoint: {reason}"),
            Self::Serialization(err) => write!(f, "note snapshot serialization failed: {err}"),
        }
    }
}

impl Error for NoteStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unavailable(_) | Self::Rejected(_) | Self::InvalidEndpoint(_) => None,
            Self::Serialization(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for NoteStoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Remote keyed collection of `PlaceNote` records.
#[async_trait(?Send)]
pub trait NoteStore {
    async fn get(&self, key: &NoteKey) -> Result<Option<PlaceNote>, NoteStoreError>;
    /// Creates or replaces the record stored under `key`.
    async fn upsert(
        &self,
        key: &NoteKey,
        record: PlaceNote,
    ) -> Result<UpsertOutcome, NoteStoreError>;
}

/// Process-local note collection keyed by encoded `NoteKey`.
#[derive(Default)]
pub struct InMemoryNoteStore {
    entries: Mutex<BTreeMap<String, PlaceNote>>,
}

impl InMemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Serializes the collection in its wire shape:
    /// `{"placeNotes": {"<key>": {"placeId", "uid", "note"}}}`.
    pub fn snapshot_json(&self) -> Result<String, NoteStoreError> {
        let entries = self.lock();
        let mut root = BTreeMap::new();
        root.insert(PLACE_NOTES_COLLECTION, &*entries);
        Ok(serde_json::to_string(&root)?)
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, PlaceNote>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait(?Send)]
impl NoteStore for InMemoryNoteStore {
    async fn get(&self, key: &NoteKey) -> Result<Option<PlaceNote>, NoteStoreError> {
        Ok(self.lock().get(&key.encoded()).cloned())
    }

    async fn upsert(
        &self,
        key: &NoteKey,
        record: PlaceNote,
    ) -> Result<UpsertOutcome, NoteStoreError> {
        let outcome = match self.lock().insert(key.encoded(), record) {
            Some(_) => UpsertOutcome::Updated,
            None => UpsertOutcome::Created,
        };
        Ok(outcome)
    }
}
