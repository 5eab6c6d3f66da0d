//! Spatial store: the single owner of in-memory location state.
//!
//! # Responsibility
//! - Apply user actions through the pure reducer and publish the result.
//! - Mirror mark/unmark actions into the marked-place repository.
//! - Run the visible-set worker that recomputes membership on input changes.
//!
//! # Invariants
//! - Each transition replaces the whole state in one `watch` send; readers
//!   never observe a partially applied update.
//! - Saved places change in memory only after the durable write succeeds,
//!   so a storage failure leaves memory and disk in agreement.
//! - In-memory updates are applied before a call returns; visible-set
//!   recomputation follows on the worker task.
//! - Every durable write reports its outcome through `StoreResult`.

use crate::config::{is_valid_radius, CoreConfig};
use crate::geofence;
use crate::model::place::{Coordinate, Place, PlaceValidationError, Region};
use crate::repo::marked_place_repo::MarkedPlaceRepository;
use crate::repo::RepoError;
use crate::store::location::{LocationError, LocationProvider, PermissionStatus};
use crate::store::state::{reduce, SpatialAction, SpatialState};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    /// Durable mirror write or read failed.
    Storage(RepoError),
    InvalidPlace(PlaceValidationError),
    InvalidRadius(f64),
    /// The store was constructed outside a Tokio runtime.
    RuntimeUnavailable,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "storage error: {err}"),
            Self::InvalidPlace(err) => write!(f, "invalid place: {err}"),
            Self::InvalidRadius(value) => {
                write!(f, "search radius must be finite and non-negative, got {value}")
            }
            Self::RuntimeUnavailable => write!(f, "spatial store requires a tokio runtime"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::InvalidPlace(err) => Some(err),
            Self::InvalidRadius(_) | Self::RuntimeUnavailable => None,
        }
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Storage(value)
    }
}

impl From<PlaceValidationError> for StoreError {
    fn from(value: PlaceValidationError) -> Self {
        Self::InvalidPlace(value)
    }
}

/// Reactive container for user location, saved places, radius and viewport.
pub struct SpatialStore<R: MarkedPlaceRepository, L: LocationProvider> {
    repo: R,
    locator: L,
    config: CoreConfig,
    state: Arc<watch::Sender<SpatialState>>,
    location_requests: AtomicU64,
    worker: JoinHandle<()>,
}

impl<R: MarkedPlaceRepository, L: LocationProvider> SpatialStore<R, L> {
    /// Creates a store with empty saved places and spawns the visible-set
    /// worker on the current Tokio runtime.
    ///
    /// Call [`SpatialStore::hydrate`] afterwards to load the durable copy.
    pub fn new(repo: R, locator: L, config: CoreConfig) -> StoreResult<Self> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| StoreError::RuntimeUnavailable)?;
        let (sender, _) = watch::channel(SpatialState::new(config.default_search_radius_m));
        let state = Arc::new(sender);
        let worker = runtime.spawn(run_visible_set_worker(Arc::clone(&state)));

        Ok(Self {
            repo,
            locator,
            config,
            state,
            location_requests: AtomicU64::new(0),
            worker,
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn locator(&self) -> &L {
        &self.locator
    }

    /// Loads the durable marked places into memory, replacing saved places.
    ///
    /// Returns the number of places now saved.
    pub fn hydrate(&self) -> StoreResult<usize> {
        self.repo.ensure_schema()?;
        let places = self.repo.fetch_all().map_err(|err| {
            error!("event=store_hydrate module=store status=error error={err}");
            StoreError::Storage(err)
        })?;
        self.dispatch(SpatialAction::HydratePlaces(places));
        let count = self.state.borrow().saved_places.len();
        info!("event=store_hydrate module=store status=ok saved_count={count}");
        Ok(count)
    }

    /// Requests permission and a device fix, then stores it as the user
    /// location.
    ///
    /// Returns `false` (state unchanged) on denial, timeout, hardware failure,
    /// or when a more recently issued refresh already applied its fix.
    pub async fn refresh_user_location(&self) -> bool {
        let sequence = self.location_requests.fetch_add(1, Ordering::SeqCst) + 1;
        match self.acquire_fix().await {
            Ok(position) => {
                let region = Region::around(position, self.config.user_region_delta);
                let applied = self.dispatch(SpatialAction::SetUserLocation { region, sequence });
                if applied {
                    info!("event=location_refresh module=store status=ok sequence={sequence}");
                } else {
                    info!(
                        "event=location_refresh module=store status=stale sequence={sequence}"
                    );
                }
                applied
            }
            Err(LocationError::PermissionDenied) => {
                info!("event=location_refresh module=store status=denied sequence={sequence}");
                false
            }
            Err(err) => {
                warn!(
                    "event=location_refresh module=store status=error sequence={} error={}",
                    sequence, err
                );
                false
            }
        }
    }

    /// Runs the permission + bounded fix sequence without touching state.
    pub async fn acquire_fix(&self) -> Result<Coordinate, LocationError> {
        if self.locator.request_permission().await == PermissionStatus::Denied {
            return Err(LocationError::PermissionDenied);
        }

        let request = self.config.position_request();
        let position =
            match tokio::time::timeout(request.timeout, self.locator.current_position(&request))
                .await
            {
                Ok(result) => result?,
                Err(_) => return Err(LocationError::Timeout(request.timeout)),
            };

        if !position.latitude.is_finite() || !position.longitude.is_finite() {
            return Err(LocationError::Unavailable(
                "provider returned a non-finite position".to_string(),
            ));
        }
        Ok(position)
    }

    /// Replaces the map viewport.
    pub fn set_current_region(&self, region: Region) {
        self.dispatch(SpatialAction::SetCurrentRegion(region));
    }

    /// Recenters the viewport on a saved place. Returns `false` when the id is
    /// not saved.
    pub fn view_place_on_map(&self, place_id: &str) -> bool {
        let center = match self.state.borrow().find_saved(place_id) {
            Some(place) => place.coordinate(),
            None => return false,
        };
        self.set_current_region(Region::around(center, self.config.place_focus_delta));
        true
    }

    /// Saves `place` if its id is not saved yet and mirrors it durably.
    ///
    /// The durable insert runs first; memory changes only after it succeeds.
    /// Returns whether the in-memory collection gained an entry. The insert
    /// runs even for already saved ids; the unique index makes it a no-op.
    pub fn add_restaurant(&self, place: Place) -> StoreResult<bool> {
        place.validate()?;

        if let Err(err) = self.repo.insert(&place) {
            error!(
                "event=place_add module=store status=error place_id={} error={}",
                place.id, err
            );
            return Err(err.into());
        }

        let place_id = place.id.clone();
        let inserted = self.dispatch(SpatialAction::AddPlace(place));
        if inserted {
            info!("event=place_add module=store status=ok place_id={place_id}");
        } else {
            debug!(
                "event=place_add module=store status=skipped reason=duplicate place_id={}",
                place_id
            );
        }
        Ok(inserted)
    }

    /// Unsaves `place_id` after deleting its durable row. Unknown ids are a
    /// no-op.
    ///
    /// Returns whether the in-memory collection lost an entry.
    pub fn remove_restaurant(&self, place_id: &str) -> StoreResult<bool> {
        if let Err(err) = self.repo.delete_by_place_id(place_id) {
            error!(
                "event=place_remove module=store status=error place_id={} error={}",
                place_id, err
            );
            return Err(err.into());
        }

        let removed = self.dispatch(SpatialAction::RemovePlace(place_id.to_string()));
        debug!(
            "event=place_remove module=store status=ok place_id={} removed={}",
            place_id, removed
        );
        Ok(removed)
    }

    /// Saves `place` when unsaved, removes it otherwise. Returns whether the
    /// place is saved afterwards.
    pub fn toggle_restaurant(&self, place: Place) -> StoreResult<bool> {
        if self.is_saved(&place.id) {
            self.remove_restaurant(&place.id)?;
            Ok(false)
        } else {
            self.add_restaurant(place)?;
            Ok(true)
        }
    }

    /// Unsaves every place, in memory and durably. Returns the number of
    /// durable rows removed.
    pub fn clear_all_restaurants(&self) -> StoreResult<usize> {
        let removed = self.repo.delete_all().map_err(|err| {
            error!("event=place_clear module=store status=error error={err}");
            StoreError::Storage(err)
        })?;
        self.dispatch(SpatialAction::ClearPlaces);
        info!("event=place_clear module=store status=ok removed={removed}");
        Ok(removed)
    }

    /// Replaces the search radius (meters) and triggers recomputation.
    pub fn set_search_radius(&self, radius_m: f64) -> StoreResult<()> {
        if !is_valid_radius(radius_m) {
            return Err(StoreError::InvalidRadius(radius_m));
        }
        self.dispatch(SpatialAction::SetSearchRadius(radius_m));
        Ok(())
    }

    pub fn is_saved(&self, place_id: &str) -> bool {
        self.state.borrow().is_saved(place_id)
    }

    pub fn saved_places(&self) -> Vec<Place> {
        self.state.borrow().saved_places.clone()
    }

    /// Last published visible set; may lag inputs by one scheduling cycle.
    pub fn visible_places(&self) -> Vec<Place> {
        self.state.borrow().visible_places.clone()
    }

    pub fn user_location(&self) -> Option<Region> {
        self.state.borrow().user_location
    }

    pub fn current_region(&self) -> Option<Region> {
        self.state.borrow().current_region
    }

    pub fn search_radius(&self) -> f64 {
        self.state.borrow().search_radius_m
    }

    pub fn snapshot(&self) -> SpatialState {
        self.state.borrow().clone()
    }

    /// Subscribes to every published state.
    pub fn subscribe(&self) -> watch::Receiver<SpatialState> {
        self.state.subscribe()
    }

    /// Waits until the visible set reflects the current inputs and returns
    /// that state.
    pub async fn settled(&self) -> SpatialState {
        let mut updates = self.state.subscribe();
        let settled = match updates.wait_for(SpatialState::visible_is_current).await {
            Ok(state) => state.clone(),
            Err(_) => self.snapshot(),
        };
        settled
    }

    fn dispatch(&self, action: SpatialAction) -> bool {
        self.state.send_if_modified(|current| apply(current, action))
    }
}

impl<R: MarkedPlaceRepository, L: LocationProvider> Drop for SpatialStore<R, L> {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

fn apply(current: &mut SpatialState, action: SpatialAction) -> bool {
    let next = reduce(current, action);
    if next == *current {
        return false;
    }
    *current = next;
    true
}

/// Recomputes the visible set whenever the input revision moves ahead of it.
async fn run_visible_set_worker(state: Arc<watch::Sender<SpatialState>>) {
    let mut updates = state.subscribe();
    loop {
        let pending = {
            let current = updates.borrow_and_update();
            if current.visible_is_current() {
                None
            } else {
                Some((
                    current.inputs_revision,
                    current.user_location.map(|region| region.center()),
                    current.saved_places.clone(),
                    current.search_radius_m,
                ))
            }
        };

        if let Some((revision, location, saved, radius_m)) = pending {
            let places = geofence::compute_visible_from(location, &saved, radius_m);
            let visible_count = places.len();
            let published = state
                .send_if_modified(|current| {
                    apply(current, SpatialAction::PublishVisible { revision, places })
                });
            debug!(
                "event=visible_recompute module=store status={} revision={} visible_count={}",
                if published { "ok" } else { "stale" },
                revision,
                visible_count
            );
        }

        if updates.changed().await.is_err() {
            break;
        }
    }
}
