//! Coordinates and per-source lookup results.

use serde::{Deserialize, Serialize};

/// A WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// `(0, 0)` is what several providers return when they found nothing.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_null_island(&self) -> bool {
        self.lat == 0.0 && self.lng == 0.0
    }

    /// Returns `None` for null island and for non-finite values.
    #[must_use]
    pub fn found(lat: f64, lng: f64) -> Option<Self> {
        let point = Self::new(lat, lng);
        if !lat.is_finite() || !lng.is_finite() || point.is_null_island() {
            return None;
        }
        Some(point)
    }
}

/// Outcome of one external lookup: either data or the reason it failed.
///
/// Never an `Err`: a failing source is folded into `error` and the caller
/// keeps whatever the other sources returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoResult<T> {
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> GeoResult<T> {
    #[must_use]
    pub fn found(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(error.into()),
        }
    }

    #[must_use]
    pub fn is_found(&self) -> bool {
        self.data.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_island_is_not_found() {
        assert!(Coordinates::found(0.0, 0.0).is_none());
        assert!(Coordinates::new(0.0, 0.0).is_null_island());
    }

    #[test]
    fn regular_point_is_found() {
        let point = Coordinates::found(-23.5505, -46.6333).expect("valid point");
        assert!(!point.is_null_island());
    }

    #[test]
    fn nan_is_not_found() {
        assert!(Coordinates::found(f64::NAN, 10.0).is_none());
    }

    #[test]
    fn failed_result_serializes_error_and_null_data() {
        let result: GeoResult<String> = GeoResult::failed("OSM returned status 503");
        let json = serde_json::to_value(&result).expect("serialize");
        assert!(json["data"].is_null());
        assert_eq!(json["error"], "OSM returned status 503");
    }

    #[test]
    fn found_result_omits_error() {
        let result = GeoResult::found(1_u8);
        let json = serde_json::to_value(&result).expect("serialize");
        assert_eq!(json["data"], 1);
        assert!(json.get("error").is_none());
    }
}
