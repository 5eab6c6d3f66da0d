//! Private per-user notes synchronized to a remote keyed collection.
//!
//! # Responsibility
//! - Resolve the anonymous identity that scopes notes.
//! - Read and upsert one note per `(place_id, uid)` through a keyed store,
//!   either the remote REST collection or an in-process map.
//!
//! # Invariants
//! - Every note operation runs with a resolved identity or fails with
//!   `NoteSyncError::IdentityUnavailable`.
//! - Lookups are keyed; no operation scans the whole collection.

pub mod http_store;
pub mod identity;
pub mod note_store;
pub mod sync_service;

pub use http_store::HttpNoteStore;
pub use identity::{IdentityError, IdentityProvider, SqliteIdentityProvider};
pub use note_store::{InMemoryNoteStore, NoteStore, NoteStoreError, UpsertOutcome};
pub use sync_service::{
    NoteSyncError, NoteSyncResult, NotesSyncService, FETCH_FAILED_PLACEHOLDER,
    NO_IDENTITY_PLACEHOLDER, NO_NOTE_PLACEHOLDER,
};
