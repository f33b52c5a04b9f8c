//! Reverse geocoding: one clicked point against Nominatim and IBGE at once.

use prospecto_core::{Coordinates, GeoResult};

use crate::client::{decode, GeoClient, IBGE, NOMINATIM};
use crate::error::GeoError;
use crate::types::{LocationInquiry, OsmPlace, StatsAddress};

impl GeoClient {
    /// Reverse-geocodes `coordinates` with both services concurrently.
    ///
    /// Never fails: each source's error is captured in its [`GeoResult`].
    pub async fn inspect(&self, coordinates: Coordinates) -> LocationInquiry {
        let (osm, stats) = tokio::join!(
            self.reverse_osm(coordinates),
            self.reverse_stats(coordinates)
        );

        LocationInquiry {
            coordinates,
            osm_result: fold(NOMINATIM, osm),
            stats_result: fold(IBGE, stats),
        }
    }

    async fn reverse_osm(&self, coordinates: Coordinates) -> Result<OsmPlace, GeoError> {
        let lat = coordinates.lat.to_string();
        let lon = coordinates.lng.to_string();
        let url = Self::endpoint(
            &self.nominatim_url,
            "reverse",
            &[
                ("format", "jsonv2"),
                ("lat", &lat),
                ("lon", &lon),
                ("zoom", "18"),
                ("addressdetails", "1"),
            ],
        )?;
        let body = self.request_json(NOMINATIM, &url).await?;

        if let Some(message) = body.get("error").and_then(serde_json::Value::as_str) {
            return Err(GeoError::Provider {
                service: NOMINATIM,
                message: message.to_string(),
            });
        }
        if body.is_null() {
            return Err(GeoError::NoAddressFound { service: NOMINATIM });
        }
        let place: OsmPlace = decode("Nominatim reverse", body)?;
        let coords = place.lat.as_deref().zip(place.lon.as_deref());
        if coords.is_some_and(|(lat, lon)| at_null_island(lat.parse().ok(), lon.parse().ok())) {
            return Err(GeoError::NoAddressFound { service: NOMINATIM });
        }
        Ok(place)
    }

    async fn reverse_stats(&self, coordinates: Coordinates) -> Result<StatsAddress, GeoError> {
        let lat = coordinates.lat.to_string();
        let lon = coordinates.lng.to_string();
        let url = Self::endpoint(
            &self.ibge_url,
            "api/v2/geocodigo/pontos",
            &[("lat", &lat), ("lon", &lon), ("formato", "json")],
        )?;
        let body = self.request_json(IBGE, &url).await?;

        let serde_json::Value::Array(entries) = body else {
            return Err(GeoError::NoAddressFound { service: IBGE });
        };
        let Some(first) = entries.into_iter().next() else {
            return Err(GeoError::NoAddressFound { service: IBGE });
        };
        let number = |key: &str| match first.get(key)? {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        if at_null_island(number("lat"), number("lon")) {
            return Err(GeoError::NoAddressFound { service: IBGE });
        }
        decode("IBGE pontos", first)
    }
}

/// Both parts present and the point is `(0, 0)`. Providers answer there when
/// they found nothing.
fn at_null_island(lat: Option<f64>, lng: Option<f64>) -> bool {
    matches!((lat, lng), (Some(lat), Some(lng)) if Coordinates::new(lat, lng).is_null_island())
}

fn fold<T>(service: &'static str, result: Result<T, GeoError>) -> GeoResult<T> {
    match result {
        Ok(data) => GeoResult::found(data),
        Err(err) => {
            tracing::warn!(service, error = %err, "reverse geocoding source failed");
            GeoResult::failed(err.to_string())
        }
    }
}
