//! Domain model for marked places, viewports and private notes.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep validation rules next to the shapes they protect.
//!
//! # Invariants
//! - A `Place` is identified by its provider-issued `id`.
//! - A `PlaceNote` is identified by the `(place_id, uid)` pair.

pub mod note;
pub mod place;
