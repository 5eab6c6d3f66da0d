//! Core engine for PlaceMarker: saved places, geofencing and private notes.
//! This crate is the single source of truth for business invariants.

pub mod config;
pub mod db;
pub mod discovery;
pub mod geofence;
pub mod logging;
pub mod model;
pub mod notes;
pub mod repo;
pub mod store;

pub use config::{ConfigError, CoreConfig, PositionRequest};
pub use discovery::{DiscoveryError, DiscoveryService, PlaceCandidate, PlaceDiscovery};
pub use geofence::{compute_visible, distance};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::note::{NoteKey, PlaceNote};
pub use model::place::{Coordinate, Place, PlaceId, PlaceValidationError, Region};
pub use notes::{
    HttpNoteStore, IdentityError, IdentityProvider, InMemoryNoteStore, NoteStore, NoteStoreError,
    NoteSyncError, NoteSyncResult, NotesSyncService, SqliteIdentityProvider, UpsertOutcome,
};
pub use repo::marked_place_repo::{MarkedPlaceRepository, SqliteMarkedPlaceRepository};
pub use repo::{RepoError, RepoResult};
pub use store::{
    FixedLocationProvider, LocationError, LocationProvider, PermissionStatus, SpatialAction,
    SpatialState, SpatialStore, StoreError, StoreResult,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
