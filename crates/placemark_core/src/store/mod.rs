//! Reactive spatial state and its orchestration.
//!
//! # Responsibility
//! - Own user location, saved places, radius and viewport in one state value.
//! - Mirror mark/unmark actions into the durable marked-place repository.
//! - Keep the visible set derived from its inputs through a subscription.
//!
//! # Invariants
//! - State transitions are pure (`reduce`) and published atomically.
//! - Saved places never contain two entries with the same id.
//! - The visible set is never persisted.

pub mod location;
pub mod spatial_store;
pub mod state;

pub use location::{FixedLocationProvider, LocationError, LocationProvider, PermissionStatus};
pub use spatial_store::{SpatialStore, StoreError, StoreResult};
pub use state::{reduce, SpatialAction, SpatialState};
