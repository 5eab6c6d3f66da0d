//! Note use-case service over a keyed note store.
//!
//! # Responsibility
//! - Resolve the anonymous identity lazily and cache it for the service
//!   lifetime.
//! - Read and upsert the caller's note for a place.
//! - Degrade read failures into display placeholders for UI callers.
//!
//! # Invariants
//! - Writes go through `NoteStore::upsert` with the `(place_id, uid)` key, so
//!   repeated saves never create a second record.
//! - Note text is never written to logs.

use crate::model::note::NoteKey;
use crate::notes::identity::{IdentityError, IdentityProvider};
use crate::notes::note_store::{NoteStore, NoteStoreError, UpsertOutcome};
use log::{error, info, warn};
use once_cell::unsync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const NO_NOTE_PLACEHOLDER: &str = "No notes found for this place.";
pub const NO_IDENTITY_PLACEHOLDER: &str = "No user logged in";
pub const FETCH_FAILED_PLACEHOLDER: &str = "Error fetching note.";

pub type NoteSyncResult<T> = Result<T, NoteSyncError>;

#[derive(Debug)]
pub enum NoteSyncError {
    IdentityUnavailable(Option<IdentityError>),
    InvalidNote(&'static str),
    Store(NoteStoreError),
}

impl Display for NoteSyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IdentityUnavailable(Some(err)) => write!(f, "identity unavailable: {err}"),
            Self::IdentityUnavailable(None) => write!(f, "identity unavailable"),
            Self::InvalidNote(reason) => write!(f, "invalid note: {reason}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NoteSyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::IdentityUnavailable(Some(err)) => Some(err),
            Self::Store(err) => Some(err),
            Self::IdentityUnavailable(None) | Self::InvalidNote(_) => None,
        }
    }
}

impl From<NoteStoreError> for NoteSyncError {
    fn from(value: NoteStoreError) -> Self {
        Self::Store(value)
    }
}

/// Note service facade over a note store and an identity provider.
pub struct NotesSyncService<S: NoteStore, I: IdentityProvider> {
    store: S,
    identity: I,
    resolved_uid: OnceCell<String>,
}

impl<S: NoteStore, I: IdentityProvider> NotesSyncService<S, I> {
    pub fn new(store: S, identity: I) -> Self {
        Self {
            store,
            identity,
            resolved_uid: OnceCell::new(),
        }
    }

    /// Gives read access to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn identity(&self) -> &I {
        &self.identity
    }

    /// Returns the caller's uid, signing in anonymously on first use.
    pub async fn resolve_identity(&self) -> NoteSyncResult<String> {
        if let Some(uid) = self.resolved_uid.get() {
            return Ok(uid.clone());
        }

        let uid = match self.identity.current_uid().await {
            Some(uid) => uid,
            None => self.identity.sign_in_anonymously().await.map_err(|err| {
                warn!("event=identity_resolve module=notes status=error error={err}");
                NoteSyncError::IdentityUnavailable(Some(err))
            })?,
        };

        if uid.trim().is_empty() {
            warn!("event=identity_resolve module=notes status=error error_code=blank_uid");
            return Err(NoteSyncError::IdentityUnavailable(None));
        }

        Ok(self.resolved_uid.get_or_init(|| uid).clone())
    }

    /// Returns the caller's note text for `place_id`, or `None` when absent.
    pub async fn fetch_note(&self, place_id: &str) -> NoteSyncResult<Option<String>> {
        let key = self.key_for(place_id).await?;
        let record = self.store.get(&key).await.map_err(|err| {
            error!(
                "event=note_fetch module=notes status=error place_id={} error={}",
                place_id, err
            );
            NoteSyncError::from(err)
        })?;
        info!(
            "event=note_fetch module=notes status=ok place_id={} found={}",
            place_id,
            record.is_some()
        );
        Ok(record.map(|record| record.note))
    }

    /// Like [`fetch_note`](Self::fetch_note) but never fails: missing notes
    /// and errors become display placeholders.
    pub async fn fetch_note_or_placeholder(&self, place_id: &str) -> String {
        match self.fetch_note(place_id).await {
            Ok(Some(note)) => note,
            Ok(None) => NO_NOTE_PLACEHOLDER.to_string(),
            Err(NoteSyncError::IdentityUnavailable(_)) => NO_IDENTITY_PLACEHOLDER.to_string(),
            Err(_) => FETCH_FAILED_PLACEHOLDER.to_string(),
        }
    }

    /// Creates or updates the caller's note for `place_id`.
    pub async fn save_note(&self, place_id: &str, text: &str) -> NoteSyncResult<UpsertOutcome> {
        if text.trim().is_empty() {
            return Err(NoteSyncError::InvalidNote("note text cannot be blank"));
        }

        let key = self.key_for(place_id).await?;
        let outcome = self
            .store
            .upsert(&key, key.record(text))
            .await
            .map_err(|err| {
                error!(
                    "event=note_save module=notes status=error place_id={} error={}",
                    place_id, err
                );
                NoteSyncError::from(err)
            })?;

        info!(
            "event=note_save module=notes status=ok place_id={} outcome={:?}",
            place_id, outcome
        );
        Ok(outcome)
    }

    async fn key_for(&self, place_id: &str) -> NoteSyncResult<NoteKey> {
        if place_id.trim().is_empty() {
            return Err(NoteSyncError::InvalidNote("place id cannot be blank"));
        }
        let uid = self.resolve_identity().await?;
        Ok(NoteKey::new(place_id, uid))
    }
}
