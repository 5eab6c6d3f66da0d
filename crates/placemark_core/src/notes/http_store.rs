//! Note store backed by a realtime-database REST endpoint.
//!
//! # Invariants
//! - The record for a key lives at `{base}/placeNotes/{encoded key}.json`.
//! - Writes are `PUT` replacements of that single location, so a key never
//!   holds two records.
//! - Logs carry place ids and HTTP status codes only; bodies hold note text.

use crate::model::note::{NoteKey, PlaceNote};
use crate::notes::note_store::{NoteStore, NoteStoreError, UpsertOutcome, PLACE_NOTES_COLLECTION};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};

/// HTTP client for the remote `placeNotes` collection.
pub struct HttpNoteStore {
    client: Client,
    base_url: Url,
    auth_token: Option<String>,
}

impl HttpNoteStore {
    pub fn new(base_url: &str) -> Result<Self, NoteStoreError> {
        let client = Client::builder()
            .build()
            .map_err(|err| NoteStoreError::Unavailable(err.to_string()))?;
        Self::with_client(client, base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Result<Self, NoteStoreError> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|err| NoteStoreError::InvalidEndpoint(err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(NoteStoreError::InvalidEndpoint(format!(
                "`{base_url}` cannot carry a path"
            )));
        }
        Ok(Self {
            client,
            base_url,
            auth_token: None,
        })
    }

    /// Sends `token` as the `auth` query parameter on every request.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// REST location of the record stored under `key`.
    pub fn record_url(&self, key: &NoteKey) -> Result<Url, NoteStoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| NoteStoreError::InvalidEndpoint(self.base_url.to_string()))?
            .pop_if_empty()
            .push(PLACE_NOTES_COLLECTION)
            .push(&format!("{}.json", key.encoded()));
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.auth_token.as_deref() {
            Some(token) => request.query(&[("auth", token)]),
            None => request,
        }
    }

    async fn send(
        &self,
        request: RequestBuilder,
        operation: &str,
        key: &NoteKey,
    ) -> Result<Response, NoteStoreError> {
        self.authorize(request).send().await.map_err(|err| {
            warn!(
                "event=note_remote module=notes status=error op={} place_id={} error={}",
                operation,
                key.place_id(),
                err
            );
            NoteStoreError::Unavailable(err.to_string())
        })
    }
}

fn rejected(status: StatusCode, operation: &str, key: &NoteKey) -> NoteStoreError {
    warn!(
        "event=note_remote module=notes status=rejected op={} place_id={} http_status={}",
        operation,
        key.place_id(),
        status.as_u16()
    );
    NoteStoreError::Rejected(status.as_u16())
}

#[async_trait(?Send)]
impl NoteStore for HttpNoteStore {
    async fn get(&self, key: &NoteKey) -> Result<Option<PlaceNote>, NoteStoreError> {
        let url = self.record_url(key)?;
        let response = self.send(self.client.get(url), "get", key).await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(rejected(status, "get", key));
        }

        let body = response
            .text()
            .await
            .map_err(|err| NoteStoreError::Unavailable(err.to_string()))?;
        // Absent locations read back as a JSON `null`.
        let record: Option<PlaceNote> = serde_json::from_str(&body)?;
        debug!(
            "event=note_remote module=notes status=ok op=get place_id={} found={}",
            key.place_id(),
            record.is_some()
        );
        Ok(record)
    }

    async fn upsert(
        &self,
        key: &NoteKey,
        record: PlaceNote,
    ) -> Result<UpsertOutcome, NoteStoreError> {
        let existed = self.get(key).await?.is_some();

        let url = self.record_url(key)?;
        let response = self
            .send(self.client.put(url).json(&record), "put", key)
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(rejected(status, "put", key));
        }

        debug!(
            "event=note_remote module=notes status=ok op=put place_id={} existed={}",
            key.place_id(),
            existed
        );
        Ok(if existed {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Created
        })
    }
}
