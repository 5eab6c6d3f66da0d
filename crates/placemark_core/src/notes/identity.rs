//! Anonymous identity contract and the local-database implementation.
//!
//! # Invariants
//! - `SqliteIdentityProvider` issues at most one uid per database; the
//!   `anonymous_identity` table has a single fixed slot.
//! - An issued uid lives as long as the local database file.

use crate::repo::RepoError;
use async_trait::async_trait;
use log::{error, info};
use rusqlite::{Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

#[derive(Debug)]
pub enum IdentityError {
    /// The identity backend refused or failed to issue an identifier.
    Unavailable(String),
    Storage(RepoError),
}

impl Display for IdentityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(reason) => write!(f, "identity unavailable: {reason}"),
            Self::Storage(err) => write!(f, "identity storage error: {err}"),
        }
    }
}

impl Error for IdentityError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unavailable(_) => None,
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for IdentityError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(RepoError::from(value))
    }
}

/// Issues the identifier that scopes private notes.
#[async_trait(?Send)]
pub trait IdentityProvider {
    /// Returns the already signed-in uid, if any.
    async fn current_uid(&self) -> Option<String>;
    /// Signs in anonymously and returns the issued uid.
    async fn sign_in_anonymously(&self) -> Result<String, IdentityError>;
}

/// Identity provider that persists a random uid in the local database.
pub struct SqliteIdentityProvider<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteIdentityProvider<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn load_uid(&self) -> Result<Option<String>, IdentityError> {
        let uid = self
            .conn
            .query_row(
                "SELECT uid FROM anonymous_identity WHERE slot = 1;",
                [],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(uid)
    }
}

#[async_trait(?Send)]
impl IdentityProvider for SqliteIdentityProvider<'_> {
    async fn current_uid(&self) -> Option<String> {
        match self.load_uid() {
            Ok(uid) => uid,
            Err(err) => {
                error!("event=identity_load module=notes status=error error={err}");
                None
            }
        }
    }

    async fn sign_in_anonymously(&self) -> Result<String, IdentityError> {
        let candidate = Uuid::new_v4().to_string();
        let inserted = self.conn.execute(
            "INSERT INTO anonymous_identity (slot, uid, created_at)
             VALUES (1, ?1, (strftime('%s', 'now') * 1000))
             ON CONFLICT(slot) DO NOTHING;",
            [candidate.as_str()],
        )?;

        let uid = self.load_uid()?.ok_or_else(|| {
            IdentityError::Unavailable("identity slot empty after sign-in".to_string())
        })?;
        info!(
            "event=identity_sign_in module=notes status=ok issued={}",
            inserted == 1
        );
        Ok(uid)
    }
}
