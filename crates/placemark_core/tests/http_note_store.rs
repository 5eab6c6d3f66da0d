use async_trait::async_trait;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use placemark_core::notes::{FETCH_FAILED_PLACEHOLDER, NO_NOTE_PLACEHOLDER};
use placemark_core::{
    HttpNoteStore, IdentityError, IdentityProvider, NoteKey, NoteStore, NoteStoreError,
    NoteSyncError, NotesSyncService, UpsertOutcome,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Minimal realtime-database REST emulation: one JSON value per entry name.
#[derive(Clone, Default)]
struct MockDatabase {
    entries: Arc<Mutex<HashMap<String, Value>>>,
    required_auth: Option<&'static str>,
}

impl MockDatabase {
    fn requiring_auth(token: &'static str) -> Self {
        Self {
            required_auth: Some(token),
            ..Self::default()
        }
    }

    fn check_auth(&self, params: &HashMap<String, String>) -> Result<(), StatusCode> {
        match self.required_auth {
            Some(token) if params.get("auth").map(String::as_str) != Some(token) => {
                Err(StatusCode::UNAUTHORIZED)
            }
            _ => Ok(()),
        }
    }

    fn entry(&self, key: &str) -> Option<Value> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

fn entry_name(file: &str) -> Result<String, StatusCode> {
    file.strip_suffix(".json")
        .map(str::to_string)
        .ok_or(StatusCode::BAD_REQUEST)
}

async fn read_entry(
    State(db): State<MockDatabase>,
    Path(file): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    db.check_auth(&params)?;
    let name = entry_name(&file)?;
    Ok(Json(db.entry(&name).unwrap_or(Value::Null)))
}

async fn write_entry(
    State(db): State<MockDatabase>,
    Path(file): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    db.check_auth(&params)?;
    let name = entry_name(&file)?;
    db.entries.lock().unwrap().insert(name, body.clone());
    Ok(Json(body))
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

async fn serve_database(db: MockDatabase) -> String {
    let router = Router::new()
        .route("/placeNotes/:file", get(read_entry).put(write_entry))
        .with_state(db);
    serve(router).await
}

struct FixedIdentity(&'static str);

#[async_trait(?Send)]
impl IdentityProvider for FixedIdentity {
    async fn current_uid(&self) -> Option<String> {
        Some(self.0.to_string())
    }

    async fn sign_in_anonymously(&self) -> Result<String, IdentityError> {
        Ok(self.0.to_string())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn saves_and_reads_notes_through_remote_collection() {
    let db = MockDatabase::default();
    let base = serve_database(db.clone()).await;
    let service = NotesSyncService::new(HttpNoteStore::new(&base).unwrap(), FixedIdentity("u1"));

    assert_eq!(
        service.save_note("place.1", "a").await.unwrap(),
        UpsertOutcome::Created
    );
    assert_eq!(
        service.save_note("place.1", "b").await.unwrap(),
        UpsertOutcome::Updated
    );
    assert_eq!(
        service.fetch_note("place.1").await.unwrap().as_deref(),
        Some("b")
    );

    assert_eq!(db.len(), 1);
    let stored = db
        .entry(&NoteKey::new("place.1", "u1").encoded())
        .unwrap();
    assert_eq!(stored["placeId"], "place.1");
    assert_eq!(stored["uid"], "u1");
    assert_eq!(stored["note"], "b");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_remote_note_reads_as_none() {
    let base = serve_database(MockDatabase::default()).await;
    let service = NotesSyncService::new(HttpNoteStore::new(&base).unwrap(), FixedIdentity("u1"));

    assert_eq!(service.fetch_note("p1").await.unwrap(), None);
    assert_eq!(
        service.fetch_note_or_placeholder("p1").await,
        NO_NOTE_PLACEHOLDER
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn auth_token_is_sent_with_every_request() {
    let db = MockDatabase::requiring_auth("id-token");
    let base = serve_database(db.clone()).await;

    let anonymous = HttpNoteStore::new(&base).unwrap();
    let key = NoteKey::new("p1", "u1");
    assert!(matches!(
        anonymous.upsert(&key, key.record("hello")).await,
        Err(NoteStoreError::Rejected(401))
    ));
    assert_eq!(db.len(), 0);

    let authorized = HttpNoteStore::new(&base)
        .unwrap()
        .with_auth_token("id-token");
    assert_eq!(
        authorized.upsert(&key, key.record("hello")).await.unwrap(),
        UpsertOutcome::Created
    );
    assert_eq!(authorized.get(&key).await.unwrap().unwrap().note, "hello");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn server_errors_surface_as_rejections() {
    let router = Router::new().fallback(|| async { StatusCode::SERVICE_UNAVAILABLE });
    let base = serve(router).await;
    let service = NotesSyncService::new(HttpNoteStore::new(&base).unwrap(), FixedIdentity("u1"));

    assert!(matches!(
        service.save_note("p1", "hello").await,
        Err(NoteSyncError::Store(NoteStoreError::Rejected(503)))
    ));
    assert_eq!(
        service.fetch_note_or_placeholder("p1").await,
        FETCH_FAILED_PLACEHOLDER
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unreachable_endpoint_is_unavailable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let store = HttpNoteStore::new(&format!("http://{addr}")).unwrap();
    assert!(matches!(
        store.get(&NoteKey::new("p1", "u1")).await,
        Err(NoteStoreError::Unavailable(_))
    ));
}
