//! Branch/headquarters consolidation and map placement of enriched records.

use prospecto_core::{
    same_tax_id, Coordinates, EstablishmentKind, EstablishmentRecord, FieldName,
};
use prospecto_geo::{AddressQuery, LocationLookup};

/// Collapses a branch/headquarters pair that share a CNPJ into the
/// headquarters record, then orders branches before headquarters.
///
/// Only an exact pair is merged. Larger sets are kept whole.
#[must_use]
pub fn consolidate(mut records: Vec<EstablishmentRecord>) -> Vec<EstablishmentRecord> {
    if records.len() == 2 {
        let branch = records.iter().position(|r| r.kind == EstablishmentKind::Branch);
        let hq = records
            .iter()
            .position(|r| r.kind == EstablishmentKind::Headquarters);
        if let (Some(b), Some(h)) = (branch, hq) {
            if same_tax_id(
                records[b].field(FieldName::TaxId),
                records[h].field(FieldName::TaxId),
            ) {
                tracing::info!("branch and headquarters share a CNPJ; consolidating");
                let kept = records.swap_remove(h);
                return vec![kept];
            }
        }
    }

    // Stable sort keeps the assistant's order within each kind.
    records.sort_by_key(|r| match r.kind {
        EstablishmentKind::Branch => 0,
        EstablishmentKind::Headquarters => 1,
    });
    records
}

/// Address used to geocode `record`, or `None` when street or city is missing.
#[must_use]
pub fn address_query(record: &EstablishmentRecord) -> Option<AddressQuery> {
    let street = record.field(FieldName::Street).trim();
    let city = record.field(FieldName::City).trim();
    if street.is_empty() || city.is_empty() {
        return None;
    }
    Some(AddressQuery {
        street: street.to_string(),
        number: record.field(FieldName::Number).trim().to_string(),
        city: city.to_string(),
        state: record.field(FieldName::State).trim().to_string(),
    })
}

/// Gives every record a position.
///
/// The first record takes the session pin. Records still without coordinates
/// are geocoded from their address; unresolved ones are flagged and then
/// share the first record's position.
pub async fn place_records(
    records: &mut [EstablishmentRecord],
    pin: Option<Coordinates>,
    lookup: &dyn LocationLookup,
) {
    if let (Some(first), Some(pin)) = (records.first_mut(), pin) {
        if first.coordinates.is_none() {
            first.coordinates = Some(pin);
        }
    }

    for record in records.iter_mut() {
        if record.coordinates.is_some() {
            continue;
        }
        let found = match address_query(record) {
            Some(query) => lookup.geocode_address(&query).await,
            None => None,
        };
        match found {
            Some(point) => record.coordinates = Some(point),
            None => {
                tracing::info!(kind = ?record.kind, "could not geocode establishment");
                record.geocode_failed = true;
            }
        }
    }

    let fallback = records.first().and_then(|r| r.coordinates);
    if let Some(fallback) = fallback {
        for record in records.iter_mut().filter(|r| r.coordinates.is_none()) {
            record.coordinates = Some(fallback);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use prospecto_core::{FieldMap, GeoResult};
    use prospecto_geo::LocationInquiry;

    use super::*;

    fn record(kind: EstablishmentKind, pairs: &[(FieldName, &str)]) -> EstablishmentRecord {
        let fields: FieldMap = pairs.iter().map(|(f, v)| (*f, (*v).to_string())).collect();
        EstablishmentRecord::new(kind, fields)
    }

    struct FixedLookup {
        answer: Option<Coordinates>,
        queries: Mutex<Vec<AddressQuery>>,
    }

    #[async_trait]
    impl LocationLookup for FixedLookup {
        async fn inspect(&self, coordinates: Coordinates) -> LocationInquiry {
            LocationInquiry {
                coordinates,
                osm_result: GeoResult::failed("unused"),
                stats_result: GeoResult::failed("unused"),
            }
        }

        async fn geocode_address(&self, query: &AddressQuery) -> Option<Coordinates> {
            self.queries.lock().unwrap().push(query.clone());
            self.answer
        }
    }

    #[test]
    fn matching_pair_collapses_to_headquarters() {
        let records = vec![
            record(EstablishmentKind::Headquarters, &[(FieldName::TaxId, "12345678000199"), (FieldName::City, "Campinas")]),
            record(EstablishmentKind::Branch, &[(FieldName::TaxId, "12.345.678/0001-99")]),
        ];
        let out = consolidate(records);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, EstablishmentKind::Headquarters);
        assert_eq!(out[0].field(FieldName::City), "Campinas");
    }

    #[test]
    fn distinct_pair_is_ordered_branch_first() {
        let records = vec![
            record(EstablishmentKind::Headquarters, &[(FieldName::TaxId, "12.345.678/0001-91")]),
            record(EstablishmentKind::Branch, &[(FieldName::TaxId, "12.345.678/0002-10")]),
        ];
        let out = consolidate(records);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].kind, EstablishmentKind::Branch);
        assert_eq!(out[1].kind, EstablishmentKind::Headquarters);
    }

    #[test]
    fn empty_tax_ids_do_not_collapse() {
        let records = vec![
            record(EstablishmentKind::Branch, &[]),
            record(EstablishmentKind::Headquarters, &[]),
        ];
        assert_eq!(consolidate(records).len(), 2);
    }

    #[test]
    fn three_records_pass_through_in_kind_order() {
        let records = vec![
            record(EstablishmentKind::Headquarters, &[(FieldName::TradeName, "HQ")]),
            record(EstablishmentKind::Branch, &[(FieldName::TradeName, "B1")]),
            record(EstablishmentKind::Branch, &[(FieldName::TradeName, "B2")]),
        ];
        let names: Vec<_> = consolidate(records)
            .iter()
            .map(|r| r.field(FieldName::TradeName).to_string())
            .collect();
        assert_eq!(names, vec!["B1", "B2", "HQ"]);
    }

    #[test]
    fn address_query_requires_street_and_city() {
        let missing_city = record(EstablishmentKind::Branch, &[(FieldName::Street, "Rua A")]);
        assert!(address_query(&missing_city).is_none());
        let full = record(
            EstablishmentKind::Branch,
            &[(FieldName::Street, "Rua A"), (FieldName::City, "Campinas"), (FieldName::Number, "5")],
        );
        assert_eq!(address_query(&full).unwrap().number, "5");
    }

    #[tokio::test]
    async fn first_record_takes_pin_and_others_are_geocoded() {
        let lookup = FixedLookup {
            answer: Some(Coordinates::new(-22.9, -47.06)),
            queries: Mutex::new(Vec::new()),
        };
        let mut records = vec![
            record(EstablishmentKind::Branch, &[(FieldName::Street, "Rua A"), (FieldName::City, "São Paulo")]),
            record(EstablishmentKind::Headquarters, &[(FieldName::Street, "Rua B"), (FieldName::City, "Campinas")]),
        ];
        let pin = Coordinates::new(-23.5, -46.6);
        place_records(&mut records, Some(pin), &lookup).await;

        assert_eq!(records[0].coordinates, Some(pin));
        assert_eq!(records[1].coordinates, Some(Coordinates::new(-22.9, -47.06)));
        assert!(!records[1].geocode_failed);
        let queries = lookup.queries.lock().unwrap();
        assert_eq!(queries.len(), 1, "the pinned record is not geocoded");
        assert_eq!(queries[0].city, "Campinas");
    }

    #[tokio::test]
    async fn unresolved_record_is_flagged_and_backfilled() {
        let lookup = FixedLookup {
            answer: None,
            queries: Mutex::new(Vec::new()),
        };
        let mut records = vec![
            record(EstablishmentKind::Branch, &[]),
            record(EstablishmentKind::Headquarters, &[(FieldName::Street, "Rua B")]),
        ];
        let pin = Coordinates::new(-23.5, -46.6);
        place_records(&mut records, Some(pin), &lookup).await;

        assert!(records[1].geocode_failed);
        assert_eq!(records[1].coordinates, Some(pin));
        assert!(lookup.queries.lock().unwrap().is_empty(), "no city, no request");
    }
}
