//! Device location collaborator contract.

use crate::config::PositionRequest;
use crate::model::place::Coordinate;
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Outcome of a platform permission prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    /// The user declined location access.
    PermissionDenied,
    /// No fix arrived within the request timeout.
    Timeout(Duration),
    /// Hardware or platform failure while acquiring a fix.
    Unavailable(String),
}

impl Display for LocationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "location permission denied"),
            Self::Timeout(limit) => {
                write!(f, "location fix timed out after {} ms", limit.as_millis())
            }
            Self::Unavailable(reason) => write!(f, "location unavailable: {reason}"),
        }
    }
}

impl Error for LocationError {}

/// Platform geolocation adapter.
///
/// Calls run on the caller's task; implementations are not required to be
/// `Send`.
#[async_trait(?Send)]
pub trait LocationProvider {
    /// Prompts for location access when required. Platforms without a
    /// permission model return `Granted`.
    async fn request_permission(&self) -> PermissionStatus;

    /// Acquires one position fix. The caller enforces `request.timeout`.
    async fn current_position(&self, request: &PositionRequest)
        -> Result<Coordinate, LocationError>;
}

/// Provider that always reports the same position. Used by the CLI and by
/// hosts without positioning hardware.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocationProvider {
    position: Coordinate,
}

impl FixedLocationProvider {
    pub fn new(position: Coordinate) -> Self {
        Self { position }
    }
}

#[async_trait(?Send)]
impl LocationProvider for FixedLocationProvider {
    async fn request_permission(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    async fn current_position(
        &self,
        _request: &PositionRequest,
    ) -> Result<Coordinate, LocationError> {
        Ok(self.position)
    }
}
