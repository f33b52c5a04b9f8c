//! Provider response shapes and the typed values built from them.

use std::collections::BTreeMap;

use prospecto_core::{Coordinates, GeoResult};
use serde::{Deserialize, Serialize};

/// Nominatim `addressdetails` block. Only the keys the matrix uses are typed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OsmAddress {
    pub amenity: Option<String>,
    pub shop: Option<String>,
    pub office: Option<String>,
    pub road: Option<String>,
    pub house_number: Option<String>,
    pub suburb: Option<String>,
    pub city: Option<String>,
    pub town: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
    pub country: Option<String>,
}

impl OsmAddress {
    /// Name of the point of interest, if the address names one.
    #[must_use]
    pub fn poi_name(&self) -> Option<&str> {
        self.amenity
            .as_deref()
            .or(self.shop.as_deref())
            .or(self.office.as_deref())
    }

    #[must_use]
    pub fn city_or_town(&self) -> Option<&str> {
        self.city.as_deref().or(self.town.as_deref())
    }
}

/// Nominatim reverse-geocoding result (`format=jsonv2`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OsmPlace {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub lat: Option<String>,
    #[serde(default)]
    pub lon: Option<String>,
    #[serde(default)]
    pub address: OsmAddress,
}

impl OsmPlace {
    /// First `parts` comma-separated segments of the display name.
    #[must_use]
    pub fn short_label(&self, parts: usize) -> Option<String> {
        let label = self
            .display_name
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .take(parts)
            .collect::<Vec<_>>()
            .join(", ");
        (!label.is_empty()).then_some(label)
    }
}

/// One IBGE `geocodigo/pontos` entry.
///
/// The service's field set varies by region, so the object is kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatsAddress(pub serde_json::Map<String, serde_json::Value>);

impl StatsAddress {
    /// String value at `key`; numbers are rendered as text.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Both reverse-geocoding answers for one clicked point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationInquiry {
    pub coordinates: Coordinates,
    pub osm_result: GeoResult<OsmPlace>,
    pub stats_result: GeoResult<StatsAddress>,
}

impl LocationInquiry {
    #[must_use]
    pub fn osm_address(&self) -> Option<&OsmAddress> {
        self.osm_result.data.as_ref().map(|p| &p.address)
    }

    /// Label for the confirmation prompt.
    #[must_use]
    pub fn confirm_label(&self) -> String {
        self.osm_result
            .data
            .as_ref()
            .and_then(|p| p.short_label(3))
            .unwrap_or_else(|| "Selected location".to_string())
    }

    /// Label for the "analyze this location instead" action.
    #[must_use]
    pub fn alternative_label(&self) -> String {
        self.osm_result
            .data
            .as_ref()
            .and_then(|p| p.short_label(2))
            .unwrap_or_else(|| "this location".to_string())
    }
}

/// Result of the IBGE address search box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressMatch {
    pub coordinates: Coordinates,
    pub display_name: String,
}

/// One Google `address_components` entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressComponent {
    pub long_name: String,
    pub short_name: String,
    pub types: Vec<String>,
}

/// Google Place Details result, restricted to the requested fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceDetails {
    pub place_id: Option<String>,
    pub name: Option<String>,
    pub formatted_address: Option<String>,
    pub address_components: Vec<AddressComponent>,
    pub formatted_phone_number: Option<String>,
    pub website: Option<String>,
    pub types: Vec<String>,
    pub business_status: Option<String>,
    pub vicinity: Option<String>,
}

impl PlaceDetails {
    /// Long name of the first component carrying any of `types`, tried in order.
    #[must_use]
    pub fn component(&self, types: &[&str]) -> Option<&str> {
        types.iter().find_map(|wanted| {
            self.address_components
                .iter()
                .find(|c| c.types.iter().any(|t| t == wanted))
                .map(|c| c.long_name.as_str())
        })
    }
}

// --- wire envelopes ---

#[derive(Debug, Deserialize)]
pub(crate) struct NominatimSearchHit {
    pub lat: String,
    pub lon: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct StatsSearchResponse {
    pub sucesso: bool,
    pub resultados: Vec<StatsSearchResult>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatsSearchResult {
    pub coordenadas: StatsSearchPoint,
    #[serde(default)]
    pub endereco: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatsSearchPoint {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlacesEnvelope<T> {
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub results: Vec<NearbyResult>,
    pub result: Option<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NearbyResult {
    pub place_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub vicinity: String,
    #[serde(default)]
    pub types: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct OverpassResponse {
    pub elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OverpassElement {
    pub id: i64,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn osm(display_name: &str) -> OsmPlace {
        OsmPlace {
            display_name: display_name.to_string(),
            name: None,
            lat: None,
            lon: None,
            address: OsmAddress::default(),
        }
    }

    #[test]
    fn short_label_takes_leading_parts() {
        let place = osm("Padaria Central, 120, Rua Augusta, Consolação, São Paulo");
        assert_eq!(
            place.short_label(3).as_deref(),
            Some("Padaria Central, 120, Rua Augusta")
        );
        assert_eq!(place.short_label(2).as_deref(), Some("Padaria Central, 120"));
    }

    #[test]
    fn labels_fall_back_when_osm_failed() {
        let inquiry = LocationInquiry {
            coordinates: Coordinates::new(-23.5, -46.6),
            osm_result: GeoResult::failed("OSM responded with status 503"),
            stats_result: GeoResult::failed("IBGE: no address found"),
        };
        assert_eq!(inquiry.confirm_label(), "Selected location");
        assert_eq!(inquiry.alternative_label(), "this location");
    }

    #[test]
    fn poi_name_prefers_amenity() {
        let address = OsmAddress {
            shop: Some("Mercadinho".to_string()),
            amenity: Some("Café do Ponto".to_string()),
            ..OsmAddress::default()
        };
        assert_eq!(address.poi_name(), Some("Café do Ponto"));
    }

    #[test]
    fn component_lookup_respects_type_priority() {
        let details = PlaceDetails {
            address_components: vec![
                AddressComponent {
                    long_name: "Bela Vista".to_string(),
                    short_name: "Bela Vista".to_string(),
                    types: vec!["neighborhood".to_string()],
                },
                AddressComponent {
                    long_name: "Consolação".to_string(),
                    short_name: "Consolação".to_string(),
                    types: vec!["sublocality_level_1".to_string()],
                },
            ],
            ..PlaceDetails::default()
        };
        assert_eq!(
            details.component(&["sublocality_level_1", "sublocality", "neighborhood"]),
            Some("Consolação")
        );
        assert_eq!(details.component(&["postal_code"]), None);
    }

    #[test]
    fn stats_address_reads_strings_and_numbers() {
        let raw = serde_json::json!({ "municipio": "Campinas", "codigo": 3_509_502, "uf": "" });
        let address: StatsAddress = serde_json::from_value(raw).expect("object");
        assert_eq!(address.get("municipio").as_deref(), Some("Campinas"));
        assert_eq!(address.get("codigo").as_deref(), Some("3509502"));
        assert_eq!(address.get("uf"), None);
    }
}
