//! Initial matrix values, before any enrichment.

use std::collections::BTreeMap;

use prospecto_core::{FieldMap, FieldName};
use prospecto_geo::{OsmAddress, PlaceDetails};

const DISTRICT_COMPONENTS: [&str; 3] = ["sublocality_level_1", "sublocality", "neighborhood"];

/// Seeds the 14 scalar fields from Google place details, falling back to the
/// Nominatim address for anything the details leave empty.
#[must_use]
pub fn seed_from_details(details: &PlaceDetails, osm: Option<&OsmAddress>) -> FieldMap {
    let osm = osm.cloned().unwrap_or_default();
    let mut fields = blank_scalars();

    fill(&mut fields, FieldName::TradeName, [details.name.as_deref(), osm.poi_name()]);
    fill(
        &mut fields,
        FieldName::Street,
        [details.component(&["route"]), osm.road.as_deref()],
    );
    fill(
        &mut fields,
        FieldName::Number,
        [details.component(&["street_number"]), osm.house_number.as_deref()],
    );
    fill(
        &mut fields,
        FieldName::District,
        [details.component(&DISTRICT_COMPONENTS), osm.suburb.as_deref()],
    );
    fill(
        &mut fields,
        FieldName::City,
        [details.component(&["administrative_area_level_2"]), osm.city_or_town()],
    );
    fill(
        &mut fields,
        FieldName::State,
        [details.component(&["administrative_area_level_1"]), osm.state.as_deref()],
    );
    fill(
        &mut fields,
        FieldName::PostalCode,
        [details.component(&["postal_code"]), osm.postcode.as_deref()],
    );
    fill(
        &mut fields,
        FieldName::Country,
        [details.component(&["country"]), osm.country.as_deref()],
    );
    fill(&mut fields, FieldName::Phone, [details.formatted_phone_number.as_deref(), None]);
    fill(&mut fields, FieldName::Website, [details.website.as_deref(), None]);
    fields
}

/// Seeds the matrix for the "analyze this location instead" path, or for a
/// community candidate, from OSM tags and the Nominatim address.
#[must_use]
pub fn seed_from_tags(tags: Option<&BTreeMap<String, String>>, osm: Option<&OsmAddress>) -> FieldMap {
    let osm = osm.cloned().unwrap_or_default();
    let tag = |key: &str| tags.and_then(|t| t.get(key)).map(String::as_str);
    let mut fields = blank_scalars();

    fill(&mut fields, FieldName::TradeName, [tag("name"), osm.poi_name()]);
    fill(&mut fields, FieldName::Street, [osm.road.as_deref(), tag("addr:street")]);
    fill(
        &mut fields,
        FieldName::Number,
        [osm.house_number.as_deref(), tag("addr:housenumber")],
    );
    fill(&mut fields, FieldName::District, [osm.suburb.as_deref(), None]);
    fill(&mut fields, FieldName::City, [osm.city_or_town(), tag("addr:city")]);
    fill(&mut fields, FieldName::State, [osm.state.as_deref(), None]);
    fill(&mut fields, FieldName::PostalCode, [osm.postcode.as_deref(), tag("addr:postcode")]);
    fill(&mut fields, FieldName::Country, [osm.country.as_deref(), None]);
    fill(&mut fields, FieldName::Phone, [tag("phone"), tag("contact:phone")]);
    fill(&mut fields, FieldName::Website, [tag("website"), tag("contact:website")]);
    fields
}

/// Overlays non-analysis edits onto `fields`. Edits to analysis fields are
/// ignored since those are never user-editable.
pub fn apply_edits(fields: &mut FieldMap, edits: &FieldMap) {
    for (field, value) in edits {
        if field.is_analysis() {
            continue;
        }
        fields.insert(*field, value.trim().to_string());
    }
}

fn blank_scalars() -> FieldMap {
    FieldName::SCALAR
        .iter()
        .map(|f| (*f, String::new()))
        .collect()
}

fn fill(fields: &mut FieldMap, field: FieldName, candidates: [Option<&str>; 2]) {
    if let Some(value) = candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|v| !v.is_empty())
    {
        fields.insert(field, value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use prospecto_core::field_value;
    use prospecto_geo::AddressComponent;

    use super::*;

    fn component(name: &str, kind: &str) -> AddressComponent {
        AddressComponent {
            long_name: name.to_string(),
            short_name: name.to_string(),
            types: vec![kind.to_string()],
        }
    }

    fn osm() -> OsmAddress {
        OsmAddress {
            amenity: Some("Padaria OSM".to_string()),
            road: Some("Rua Augusta".to_string()),
            house_number: Some("99".to_string()),
            suburb: Some("Consolação".to_string()),
            city: Some("São Paulo".to_string()),
            state: Some("São Paulo".to_string()),
            postcode: Some("01305-000".to_string()),
            country: Some("Brasil".to_string()),
            ..OsmAddress::default()
        }
    }

    #[test]
    fn details_take_priority_and_osm_fills_gaps() {
        let details = PlaceDetails {
            name: Some("Padaria Real".to_string()),
            address_components: vec![
                component("10", "street_number"),
                component("Rua Augusta", "route"),
                component("Campinas", "administrative_area_level_2"),
            ],
            formatted_phone_number: Some("(11) 3333-4444".to_string()),
            ..PlaceDetails::default()
        };
        let fields = seed_from_details(&details, Some(&osm()));

        assert_eq!(fields.len(), 14);
        assert_eq!(field_value(&fields, FieldName::TradeName), "Padaria Real");
        assert_eq!(field_value(&fields, FieldName::Number), "10");
        assert_eq!(field_value(&fields, FieldName::City), "Campinas");
        assert_eq!(field_value(&fields, FieldName::District), "Consolação");
        assert_eq!(field_value(&fields, FieldName::PostalCode), "01305-000");
        assert_eq!(field_value(&fields, FieldName::Phone), "(11) 3333-4444");
        assert_eq!(field_value(&fields, FieldName::TaxId), "");
    }

    #[test]
    fn district_prefers_sublocality_level_1() {
        let details = PlaceDetails {
            address_components: vec![
                component("Bairro B", "neighborhood"),
                component("Bairro A", "sublocality_level_1"),
            ],
            ..PlaceDetails::default()
        };
        let fields = seed_from_details(&details, None);
        assert_eq!(field_value(&fields, FieldName::District), "Bairro A");
    }

    #[test]
    fn tags_seed_name_and_contacts() {
        let tags: BTreeMap<String, String> = [
            ("name", "Farmácia Popular"),
            ("phone", "+55 11 4000-0000"),
            ("website", "https://farmacia.example"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let fields = seed_from_tags(Some(&tags), Some(&osm()));

        assert_eq!(field_value(&fields, FieldName::TradeName), "Farmácia Popular");
        assert_eq!(field_value(&fields, FieldName::Website), "https://farmacia.example");
        assert_eq!(field_value(&fields, FieldName::Street), "Rua Augusta");
        assert_eq!(field_value(&fields, FieldName::TaxId), "");
    }

    #[test]
    fn without_tags_name_comes_from_osm() {
        let fields = seed_from_tags(None, Some(&osm()));
        assert_eq!(field_value(&fields, FieldName::TradeName), "Padaria OSM");
    }

    #[test]
    fn edits_skip_analysis_fields() {
        let mut fields = FieldMap::new();
        let edits: FieldMap = [
            (FieldName::TaxId, " 12.345.678/0001-99 ".to_string()),
            (FieldName::Activity, "made up".to_string()),
        ]
        .into_iter()
        .collect();
        apply_edits(&mut fields, &edits);
        assert_eq!(field_value(&fields, FieldName::TaxId), "12.345.678/0001-99");
        assert!(!fields.contains_key(&FieldName::Activity));
    }
}
