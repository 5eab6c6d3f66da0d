//! Place discovery collaborator contract.
//!
//! # Responsibility
//! - Describe the candidate shape returned by the external search provider.
//! - Absorb provider failures into empty results at the core boundary.
//!
//! # Invariants
//! - `DiscoveryService` never propagates `DiscoveryError`; callers get an
//!   empty list or `None` and may retry explicitly.

use crate::model::place::{Coordinate, Place};
use async_trait::async_trait;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Candidate place as returned by search or details lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceCandidate {
    pub id: String,
    pub name: String,
    pub coordinate: Coordinate,
    pub address: Option<String>,
    pub rating: Option<f64>,
    pub user_ratings_total: Option<u32>,
    /// Opaque provider photo reference.
    pub photo_ref: Option<String>,
}

impl PlaceCandidate {
    /// Builds the `Place` record saved by the spatial store.
    pub fn into_place(self) -> Place {
        Place {
            id: self.id,
            name: self.name,
            latitude: self.coordinate.latitude,
            longitude: self.coordinate.longitude,
            address: self.address,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    Request(String),
    InvalidResponse(String),
}

impl Display for DiscoveryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Request(reason) => write!(f, "discovery request failed: {reason}"),
            Self::InvalidResponse(reason) => write!(f, "invalid discovery response: {reason}"),
        }
    }
}

impl Error for DiscoveryError {}

/// External place search/details provider.
#[async_trait(?Send)]
pub trait PlaceDiscovery {
    async fn search_text(&self, query: &str) -> Result<Vec<PlaceCandidate>, DiscoveryError>;
    async fn search_nearby(
        &self,
        location: Coordinate,
        radius_m: f64,
    ) -> Result<Vec<PlaceCandidate>, DiscoveryError>;
    async fn place_details(&self, place_id: &str) -> Result<PlaceCandidate, DiscoveryError>;
}

/// Error-absorbing facade over a `PlaceDiscovery` provider.
pub struct DiscoveryService<P: PlaceDiscovery> {
    provider: P,
}

impl<P: PlaceDiscovery> DiscoveryService<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub async fn search_text(&self, query: &str) -> Vec<PlaceCandidate> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        match self.provider.search_text(query).await {
            Ok(candidates) => {
                info!(
                    "event=discovery_search module=discovery status=ok mode=text result_count={}",
                    candidates.len()
                );
                candidates
            }
            Err(err) => {
                warn!("event=discovery_search module=discovery status=error mode=text error={err}");
                Vec::new()
            }
        }
    }

    /// Searches around `location`. Without a known location there is nothing
    /// to search around, so the result is empty.
    pub async fn search_nearby(
        &self,
        location: Option<Coordinate>,
        radius_m: f64,
    ) -> Vec<PlaceCandidate> {
        let Some(location) = location else {
            return Vec::new();
        };
        match self.provider.search_nearby(location, radius_m).await {
            Ok(candidates) => {
                info!(
                    "event=discovery_search module=discovery status=ok mode=nearby result_count={}",
                    candidates.len()
                );
                candidates
            }
            Err(err) => {
                warn!(
                    "event=discovery_search module=discovery status=error mode=nearby error={err}"
                );
                Vec::new()
            }
        }
    }

    pub async fn place_details(&self, place_id: &str) -> Option<PlaceCandidate> {
        match self.provider.place_details(place_id).await {
            Ok(candidate) => Some(candidate),
            Err(err) => {
                warn!(
                    "event=discovery_details module=discovery status=error place_id={} error={}",
                    place_id, err
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DiscoveryError, DiscoveryService, PlaceCandidate, PlaceDiscovery};
    use crate::model::place::Coordinate;
    use async_trait::async_trait;
    use std::cell::Cell;

    struct FlakyProvider {
        fail: bool,
        calls: Cell<u32>,
    }

    fn candidate(id: &str) -> PlaceCandidate {
        PlaceCandidate {
            id: id.to_string(),
            name: "Kitchen".to_string(),
            coordinate: Coordinate::new(43.4549, -80.4998),
            address: Some("1 King St".to_string()),
            rating: Some(4.5),
            user_ratings_total: Some(120),
            photo_ref: None,
        }
    }

    #[async_trait(?Send)]
    impl PlaceDiscovery for FlakyProvider {
        async fn search_text(&self, _query: &str) -> Result<Vec<PlaceCandidate>, DiscoveryError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(DiscoveryError::Request("offline".to_string()));
            }
            Ok(vec![candidate("c1")])
        }

        async fn search_nearby(
            &self,
            _location: Coordinate,
            _radius_m: f64,
        ) -> Result<Vec<PlaceCandidate>, DiscoveryError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(DiscoveryError::Request("offline".to_string()));
            }
            Ok(vec![candidate("c1"), candidate("c2")])
        }

        async fn place_details(&self, place_id: &str) -> Result<PlaceCandidate, DiscoveryError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(DiscoveryError::InvalidResponse("no result".to_string()));
            }
            Ok(candidate(place_id))
        }
    }

    #[tokio::test]
    async fn provider_failures_become_empty_results_without_retry() {
        let service = DiscoveryService::new(FlakyProvider {
            fail: true,
            calls: Cell::new(0),
        });
        assert!(service.search_text("ramen").await.is_empty());
        assert!(service
            .search_nearby(Some(Coordinate::new(0.0, 0.0)), 5000.0)
            .await
            .is_empty());
        assert!(service.place_details("c1").await.is_none());
        assert_eq!(service.provider.calls.get(), 3);
    }

    #[tokio::test]
    async fn nearby_without_location_skips_provider() {
        let service = DiscoveryService::new(FlakyProvider {
            fail: false,
            calls: Cell::new(0),
        });
        assert!(service.search_nearby(None, 5000.0).await.is_empty());
        assert!(service.search_text("   ").await.is_empty());
        assert_eq!(service.provider.calls.get(), 0);
    }

    #[tokio::test]
    async fn details_candidate_converts_into_place() {
        let service = DiscoveryService::new(FlakyProvider {
            fail: false,
            calls: Cell::new(0),
        });
        let place = service.place_details("c9").await.unwrap().into_place();
        assert_eq!(place.id, "c9");
        assert_eq!(place.latitude, 43.4549);
        assert_eq!(place.address.as_deref(), Some("1 King St"));
    }
}
