//! Forward geocoding: Nominatim search for enrichment records and IBGE
//! address search for the map's search box.

use prospecto_core::Coordinates;
use serde::{Deserialize, Serialize};

use crate::client::{decode, GeoClient, IBGE, NOMINATIM};
use crate::error::GeoError;
use crate::types::{AddressMatch, NominatimSearchHit, StatsSearchResponse};

/// Address parts used to place an establishment record on the map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressQuery {
    pub street: String,
    pub number: String,
    pub city: String,
    pub state: String,
}

impl AddressQuery {
    /// `street, number, city, state` with empty parts skipped.
    #[must_use]
    pub fn full(&self) -> String {
        join_non_empty(&[&self.street, &self.number, &self.city, &self.state])
    }

    #[must_use]
    pub fn without_number(&self) -> String {
        join_non_empty(&[&self.street, &self.city, &self.state])
    }
}

fn join_non_empty(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

impl GeoClient {
    /// Resolves an address to coordinates, retrying without the street number.
    ///
    /// Provider errors are logged and treated as "not found".
    pub async fn geocode_address(&self, query: &AddressQuery) -> Option<Coordinates> {
        let full = query.full();
        if let Some(found) = self.search_nominatim(&full).await {
            return Some(found);
        }

        if !query.number.trim().is_empty() {
            let broader = query.without_number();
            tracing::debug!(query = %full, retry = %broader, "retrying geocode without street number");
            if let Some(found) = self.search_nominatim(&broader).await {
                return Some(found);
            }
        }

        tracing::info!(query = %full, "no coordinates found for address");
        None
    }

    async fn search_nominatim(&self, query: &str) -> Option<Coordinates> {
        if query.trim().is_empty() {
            return None;
        }
        match self.nominatim_first_hit(query).await {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!(query, error = %err, "Nominatim search failed");
                None
            }
        }
    }

    async fn nominatim_first_hit(&self, query: &str) -> Result<Option<Coordinates>, GeoError> {
        let url = Self::endpoint(
            &self.nominatim_url,
            "search",
            &[("format", "json"), ("q", query), ("limit", "1")],
        )?;
        let body = self.request_json(NOMINATIM, &url).await?;
        if body.is_null() {
            return Ok(None);
        }
        let hits: Vec<NominatimSearchHit> = decode("Nominatim search", body)?;
        Ok(hits.first().and_then(|hit| {
            let lat = hit.lat.parse::<f64>().ok()?;
            let lng = hit.lon.parse::<f64>().ok()?;
            Coordinates::found(lat, lng)
        }))
    }

    /// Looks up a free-form address with the IBGE address search.
    ///
    /// Blank queries are not sent. `(0, 0)` answers count as not found.
    ///
    /// # Errors
    ///
    /// - [`GeoError::Http`] or [`GeoError::UnexpectedStatus`] on transport failure.
    /// - [`GeoError::Deserialize`] if the response does not match the expected shape.
    pub async fn search_address(&self, query: &str) -> Result<Option<AddressMatch>, GeoError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(None);
        }

        let url = Self::endpoint(
            &self.ibge_url,
            "api/v2/geocodigo/enderecos",
            &[("endereco", query), ("formato", "json")],
        )?;
        let body = self.request_json(IBGE, &url).await?;
        if body.is_null() {
            return Ok(None);
        }
        let response: StatsSearchResponse = decode("IBGE enderecos", body)?;
        if !response.sucesso {
            return Ok(None);
        }

        let Some(first) = response.resultados.into_iter().next() else {
            return Ok(None);
        };
        let Some(coordinates) = Coordinates::found(first.coordenadas.lat, first.coordenadas.lon)
        else {
            tracing::info!(query, "IBGE returned null island; treating as not found");
            return Ok(None);
        };

        Ok(Some(AddressMatch {
            coordinates,
            display_name: first.endereco,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_query_skips_empty_parts() {
        let query = AddressQuery {
            street: "Avenida Paulista".to_string(),
            number: String::new(),
            city: "São Paulo".to_string(),
            state: "SP".to_string(),
        };
        assert_eq!(query.full(), "Avenida Paulista, São Paulo, SP");
    }

    #[test]
    fn without_number_drops_only_the_number() {
        let query = AddressQuery {
            street: "Rua Augusta".to_string(),
            number: "1500".to_string(),
            city: "São Paulo".to_string(),
            state: " ".to_string(),
        };
        assert_eq!(query.full(), "Rua Augusta, 1500, São Paulo");
        assert_eq!(query.without_number(), "Rua Augusta, São Paulo");
    }
}
