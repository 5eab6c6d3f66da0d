//! Spatial state value and its pure transition function.
//!
//! # Responsibility
//! - Describe every piece of in-memory spatial state in one value.
//! - Express each transition as `reduce(&state, action) -> state`.
//!
//! # Invariants
//! - `saved_places` is unique by id and keeps insertion order.
//! - `inputs_revision` advances exactly when user location, saved places or
//!   radius change; viewport changes do not touch it.
//! - `visible_places` is only replaced by a `PublishVisible` computed from
//!   the current `inputs_revision`; stale publications are ignored.
//! - A user fix is applied only when its request sequence is newer than the
//!   last applied one.

use crate::model::place::{Place, PlaceId, Region};
use std::collections::HashSet;

/// Complete in-memory spatial state.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialState {
    /// Last applied device fix.
    pub user_location: Option<Region>,
    /// Last map viewport; may diverge from `user_location`.
    pub current_region: Option<Region>,
    pub saved_places: Vec<Place>,
    /// Derived: saved places within `search_radius_m` of `user_location`.
    pub visible_places: Vec<Place>,
    pub search_radius_m: f64,
    pub inputs_revision: u64,
    /// `inputs_revision` that `visible_places` was computed from.
    pub visible_revision: u64,
    /// Request sequence of the applied `user_location`.
    pub location_sequence: u64,
}

impl SpatialState {
    pub fn new(search_radius_m: f64) -> Self {
        Self {
            user_location: None,
            current_region: None,
            saved_places: Vec::new(),
            visible_places: Vec::new(),
            search_radius_m,
            inputs_revision: 0,
            visible_revision: 0,
            location_sequence: 0,
        }
    }

    pub fn is_saved(&self, place_id: &str) -> bool {
        self.saved_places.iter().any(|place| place.id == place_id)
    }

    pub fn find_saved(&self, place_id: &str) -> Option<&Place> {
        self.saved_places.iter().find(|place| place.id == place_id)
    }

    /// Whether `visible_places` reflects the current inputs.
    pub fn visible_is_current(&self) -> bool {
        self.visible_revision == self.inputs_revision
    }
}

/// State transitions understood by [`reduce`].
#[derive(Debug, Clone, PartialEq)]
pub enum SpatialAction {
    SetUserLocation { region: Region, sequence: u64 },
    SetCurrentRegion(Region),
    AddPlace(Place),
    RemovePlace(PlaceId),
    ClearPlaces,
    /// Replaces saved places with the durable copy loaded at startup.
    HydratePlaces(Vec<Place>),
    SetSearchRadius(f64),
    PublishVisible { revision: u64, places: Vec<Place> },
}

/// Pure transition function. Returns a state equal to `state` when the
/// action is a no-op.
pub fn reduce(state: &SpatialState, action: SpatialAction) -> SpatialState {
    let mut next = state.clone();
    match action {
        SpatialAction::SetUserLocation { region, sequence } => {
            if sequence <= state.location_sequence {
                return next;
            }
            next.user_location = Some(region);
            next.location_sequence = sequence;
            next.inputs_revision += 1;
        }
        SpatialAction::SetCurrentRegion(region) => {
            next.current_region = Some(region);
        }
        SpatialAction::AddPlace(place) => {
            if state.is_saved(&place.id) {
                return next;
            }
            next.saved_places.push(place);
            next.inputs_revision += 1;
        }
        SpatialAction::RemovePlace(place_id) => {
            if !state.is_saved(&place_id) {
                return next;
            }
            next.saved_places.retain(|place| place.id != place_id);
            next.visible_places.retain(|place| place.id != place_id);
            next.inputs_revision += 1;
        }
        SpatialAction::ClearPlaces => {
            if state.saved_places.is_empty() {
                return next;
            }
            next.saved_places.clear();
            next.visible_places.clear();
            next.inputs_revision += 1;
        }
        SpatialAction::HydratePlaces(places) => {
            let deduped = dedupe_by_id(places);
            if deduped == state.saved_places {
                return next;
            }
            next.saved_places = deduped;
            next.inputs_revision += 1;
        }
        SpatialAction::SetSearchRadius(radius_m) => {
            if radius_m.to_bits() == state.search_radius_m.to_bits() {
                return next;
            }
            next.search_radius_m = radius_m;
            next.inputs_revision += 1;
        }
        SpatialAction::PublishVisible { revision, places } => {
            if revision != state.inputs_revision || state.visible_is_current() {
                return next;
            }
            next.visible_places = places;
            next.visible_revision = revision;
        }
    }
    next
}

fn dedupe_by_id(places: Vec<Place>) -> Vec<Place> {
    let mut seen = HashSet::new();
    places
        .into_iter()
        .filter(|place| seen.insert(place.id.clone()))
        .collect()
}
