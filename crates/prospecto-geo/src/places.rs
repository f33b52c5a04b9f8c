//! Nearby establishment search: Google Places first, Overpass as fallback.

use std::collections::BTreeMap;

use prospecto_core::{CandidatePlace, Coordinates, PlaceSource};

use crate::client::{decode, GeoClient, OVERPASS, PLACES};
use crate::error::GeoError;
use crate::types::{NearbyResult, OverpassResponse, PlaceDetails, PlacesEnvelope};

/// Result types that describe areas or roads rather than establishments.
pub const EXCLUDED_PLACE_TYPES: [&str; 11] = [
    "political",
    "locality",
    "sublocality",
    "neighborhood",
    "administrative_area_level_1",
    "administrative_area_level_2",
    "country",
    "postal_code",
    "route",
    "street_address",
    "plus_code",
];

const DETAILS_FIELDS: &str =
    "name,formatted_address,address_components,formatted_phone_number,website,types,business_status,vicinity";

/// User-facing message for a Places status code other than `OK`/`ZERO_RESULTS`.
#[must_use]
pub fn places_status_message(status: &str) -> String {
    match status {
        "OVER_QUERY_LIMIT" => {
            "The Google Places query limit was exceeded. Try again later.".to_string()
        }
        "REQUEST_DENIED" => {
            "The Google Places request was denied. Check that the API key is valid and the Places API is enabled."
                .to_string()
        }
        "INVALID_REQUEST" => {
            "The request to Google Places was invalid. This is likely an internal error.".to_string()
        }
        "NOT_FOUND" => "The requested place was not found in Google's records.".to_string(),
        other => format!(
            "Unexpected error while talking to Google Places (status code: {other})."
        ),
    }
}

/// Vicinity label for a community result: the amenity/shop/office value,
/// capitalised with underscores as spaces.
#[must_use]
pub fn community_vicinity(tags: &BTreeMap<String, String>) -> String {
    let kind = ["amenity", "shop", "office"]
        .iter()
        .find_map(|key| tags.get(*key).filter(|v| !v.is_empty()))
        .map_or("Place", String::as_str);

    let spaced = kind.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Overpass QL for named amenity/shop/office nodes around a point.
#[must_use]
pub fn overpass_query(coordinates: Coordinates, radius_m: u32) -> String {
    format!(
        "[out:json][timeout:25];(node[\"name\"](around:{radius_m},{lat},{lng})[~\"^(amenity|shop|office)$\"~\".\"];);out body;",
        lat = coordinates.lat,
        lng = coordinates.lng,
    )
}

fn is_establishment(result: &NearbyResult) -> bool {
    !result
        .types
        .iter()
        .any(|t| EXCLUDED_PLACE_TYPES.contains(&t.as_str()))
}

impl GeoClient {
    /// Lists establishments near `coordinates`.
    ///
    /// Falls back to Overpass once when Google errors or finds nothing. An
    /// empty list means no establishments were found by either source.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::MissingApiKey`] when no Places key is configured.
    /// Provider failures never surface as errors.
    pub async fn search_nearby(
        &self,
        coordinates: Coordinates,
    ) -> Result<Vec<CandidatePlace>, GeoError> {
        let key = self
            .places_api_key
            .as_deref()
            .ok_or(GeoError::MissingApiKey("GOOGLE_MAPS_API_KEY"))?;

        match self.google_nearby(coordinates, key).await {
            Ok(places) if !places.is_empty() => {
                tracing::info!(count = places.len(), "Google Places returned establishments");
                return Ok(places);
            }
            Ok(_) => tracing::info!("Google Places found nothing; falling back to Overpass"),
            Err(err) => {
                tracing::warn!(error = %err, "Google Places failed; falling back to Overpass");
            }
        }

        Ok(self.overpass_nearby(coordinates).await)
    }

    async fn google_nearby(
        &self,
        coordinates: Coordinates,
        key: &str,
    ) -> Result<Vec<CandidatePlace>, GeoError> {
        let location = format!("{},{}", coordinates.lat, coordinates.lng);
        let radius = self.search_radius_m.to_string();
        let url = Self::endpoint(
            &self.places_url,
            "nearbysearch/json",
            &[("location", &location), ("radius", &radius), ("key", key)],
        )?;
        let body = self.request_json(PLACES, &url).await?;
        let envelope: PlacesEnvelope<serde_json::Value> = decode("Places nearbysearch", body)?;

        match envelope.status.as_str() {
            "OK" => Ok(envelope
                .results
                .into_iter()
                .filter(is_establishment)
                .map(|r| CandidatePlace {
                    id: r.place_id,
                    name: r.name,
                    vicinity: r.vicinity,
                    source: PlaceSource::Commercial,
                    raw_tags: None,
                })
                .collect()),
            "ZERO_RESULTS" => Ok(Vec::new()),
            other => Err(places_error(other, envelope.error_message)),
        }
    }

    /// Fetches the detail fields used to seed the matrix.
    ///
    /// # Errors
    ///
    /// - [`GeoError::MissingApiKey`] when no Places key is configured.
    /// - [`GeoError::Places`] for any status other than `OK`.
    /// - [`GeoError::Http`] / [`GeoError::UnexpectedStatus`] on transport failure.
    pub async fn place_details(&self, place_id: &str) -> Result<PlaceDetails, GeoError> {
        let key = self
            .places_api_key
            .as_deref()
            .ok_or(GeoError::MissingApiKey("GOOGLE_MAPS_API_KEY"))?;

        let url = Self::endpoint(
            &self.places_url,
            "details/json",
            &[("place_id", place_id), ("fields", DETAILS_FIELDS), ("key", key)],
        )?;
        let body = self.request_json(PLACES, &url).await?;
        let envelope: PlacesEnvelope<PlaceDetails> = decode("Places details", body)?;

        match (envelope.status.as_str(), envelope.result) {
            ("OK", Some(mut details)) => {
                details.place_id.get_or_insert_with(|| place_id.to_string());
                Ok(details)
            }
            ("OK", None) => Err(places_error("NOT_FOUND", None)),
            (other, _) => Err(places_error(other, envelope.error_message)),
        }
    }

    /// Community map-data search. Failures resolve to an empty list.
    async fn overpass_nearby(&self, coordinates: Coordinates) -> Vec<CandidatePlace> {
        match self.overpass_elements(coordinates).await {
            Ok(places) => {
                tracing::info!(count = places.len(), "Overpass returned establishments");
                places
            }
            Err(err) => {
                tracing::warn!(error = %err, "Overpass search failed");
                Vec::new()
            }
        }
    }

    async fn overpass_elements(
        &self,
        coordinates: Coordinates,
    ) -> Result<Vec<CandidatePlace>, GeoError> {
        let query = overpass_query(coordinates, self.search_radius_m);
        let url = Self::endpoint(&self.overpass_url, "interpreter", &[("data", &query)])?;
        let body = self.request_json(OVERPASS, &url).await?;
        let response: OverpassResponse = decode("Overpass interpreter", body)?;

        Ok(response
            .elements
            .into_iter()
            .filter_map(|el| {
                let name = el.tags.get("name").filter(|n| !n.trim().is_empty())?.clone();
                Some(CandidatePlace {
                    id: el.id.to_string(),
                    name,
                    vicinity: community_vicinity(&el.tags),
                    source: PlaceSource::Community,
                    raw_tags: Some(el.tags),
                })
            })
            .collect())
    }
}

fn places_error(status: &str, detail: Option<String>) -> GeoError {
    if let Some(detail) = detail {
        tracing::debug!(status, detail = %detail, "Google Places error detail");
    }
    GeoError::Places {
        status: status.to_string(),
        message: places_status_message(status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn vicinity_capitalises_and_replaces_underscores() {
        let t = tags(&[("name", "Banca"), ("shop", "convenience_store")]);
        assert_eq!(community_vicinity(&t), "Convenience store");
    }

    #[test]
    fn vicinity_prefers_amenity_over_shop() {
        let t = tags(&[("amenity", "cafe"), ("shop", "bakery")]);
        assert_eq!(community_vicinity(&t), "Cafe");
    }

    #[test]
    fn vicinity_defaults_to_place() {
        assert_eq!(community_vicinity(&tags(&[("name", "X")])), "Place");
    }

    #[test]
    fn overpass_query_uses_radius_and_point() {
        let q = overpass_query(Coordinates::new(-23.5, -46.25), 50);
        assert!(q.contains("around:50,-23.5,-46.25"), "{q}");
        assert!(q.contains("amenity|shop|office"));
    }

    #[test]
    fn excluded_types_are_filtered() {
        let route = NearbyResult {
            place_id: "r".to_string(),
            name: "Rua Augusta".to_string(),
            vicinity: String::new(),
            types: vec!["route".to_string()],
        };
        let shop = NearbyResult {
            place_id: "s".to_string(),
            name: "Padaria".to_string(),
            vicinity: String::new(),
            types: vec!["bakery".to_string(), "store".to_string()],
        };
        assert!(!is_establishment(&route));
        assert!(is_establishment(&shop));
    }

    #[test]
    fn status_messages_cover_known_codes() {
        assert!(places_status_message("REQUEST_DENIED").contains("denied"));
        assert!(places_status_message("UNKNOWN_ERROR").contains("UNKNOWN_ERROR"));
    }
}
