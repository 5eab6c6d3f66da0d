//! Core tunables for location acquisition and geofencing.
//!
//! # Responsibility
//! - Hold defaults for radius, fix acquisition and viewport deltas.
//! - Load partial JSON overrides on top of those defaults.
//!
//! # Invariants
//! - A `CoreConfig` returned by `from_json_str` has passed `validate()`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub const DEFAULT_SEARCH_RADIUS_M: f64 = 5000.0;
pub const DEFAULT_FIX_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_FIX_MAXIMUM_AGE_MS: u64 = 10_000;
pub const DEFAULT_USER_REGION_DELTA: f64 = 0.0922;
pub const DEFAULT_PLACE_FOCUS_DELTA: f64 = 0.01;

/// Parameters handed to the platform when asking for a device fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionRequest {
    pub high_accuracy: bool,
    /// Upper bound on fix acquisition.
    pub timeout: Duration,
    /// Oldest cached fix the platform may return instead of a fresh one.
    pub maximum_age: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub default_search_radius_m: f64,
    pub fix_timeout_ms: u64,
    pub fix_maximum_age_ms: u64,
    pub high_accuracy: bool,
    /// Viewport delta applied around a fresh user fix.
    pub user_region_delta: f64,
    /// Viewport delta used when recentering on a saved place.
    pub place_focus_delta: f64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            default_search_radius_m: DEFAULT_SEARCH_RADIUS_M,
            fix_timeout_ms: DEFAULT_FIX_TIMEOUT_MS,
            fix_maximum_age_ms: DEFAULT_FIX_MAXIMUM_AGE_MS,
            high_accuracy: true,
            user_region_delta: DEFAULT_USER_REGION_DELTA,
            place_focus_delta: DEFAULT_PLACE_FOCUS_DELTA,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    InvalidValue {
        field: &'static str,
        reason: &'static str,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid config json: {err}"),
            Self::InvalidValue { field, reason } => write!(f, "invalid `{field}`: {reason}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::InvalidValue { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

impl CoreConfig {
    /// Parses JSON overrides; absent fields keep their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_radius(self.default_search_radius_m) {
            return Err(ConfigError::InvalidValue {
                field: "default_search_radius_m",
                reason: "must be finite and non-negative",
            });
        }
        if self.fix_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "fix_timeout_ms",
                reason: "must be greater than zero",
            });
        }
        for (field, delta) in [
            ("user_region_delta", self.user_region_delta),
            ("place_focus_delta", self.place_focus_delta),
        ] {
            if !delta.is_finite() || delta <= 0.0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be finite and positive",
                });
            }
        }
        Ok(())
    }

    pub fn position_request(&self) -> PositionRequest {
        PositionRequest {
            high_accuracy: self.high_accuracy,
            timeout: Duration::from_millis(self.fix_timeout_ms),
            maximum_age: Duration::from_millis(self.fix_maximum_age_ms),
        }
    }
}

/// Radius values accepted by the geofence: finite and `>= 0`.
pub fn is_valid_radius(radius_m: f64) -> bool {
    radius_m.is_finite() && radius_m >= 0.0
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig};
    use std::time::Duration;

    #[test]
    fn defaults_match_device_fix_contract() {
        let config = CoreConfig::default();
        assert_eq!(config.default_search_radius_m, 5000.0);
        let request = config.position_request();
        assert!(request.high_accuracy);
        assert_eq!(request.timeout, Duration::from_millis(15_000));
        assert_eq!(request.maximum_age, Duration::from_millis(10_000));
        assert_eq!(config.user_region_delta, 0.0922);
    }

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let config = CoreConfig::from_json_str(r#"{"default_search_radius_m": 1200}"#).unwrap();
        assert_eq!(config.default_search_radius_m, 1200.0);
        assert_eq!(config.fix_timeout_ms, 15_000);
    }

    #[test]
    fn rejects_negative_radius_and_zero_timeout() {
        let err = CoreConfig::from_json_str(r#"{"default_search_radius_m": -1}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "default_search_radius_m",
                ..
            }
        ));

        let err = CoreConfig::from_json_str(r#"{"fix_timeout_ms": 0}"#).unwrap_err();
        assert!(err.to_string().contains("fix_timeout_ms"));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = CoreConfig::from_json_str("{radius").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
