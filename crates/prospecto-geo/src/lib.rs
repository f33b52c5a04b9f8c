//! Geocoding and nearby-place adapters.
//!
//! [`GeoClient`] talks to Nominatim, the IBGE geocoder, Google Places, and
//! Overpass. The workflow depends on the [`LocationLookup`] and [`PlaceSearch`]
//! traits rather than the client, so tests can substitute in-memory providers.

pub mod client;
pub mod error;
pub mod forward;
pub mod places;
pub mod reverse;
pub mod types;

use async_trait::async_trait;
use prospecto_core::{CandidatePlace, Coordinates};

pub use client::{GeoClient, GeoClientOptions};
pub use error::GeoError;
pub use forward::AddressQuery;
pub use places::{community_vicinity, places_status_message, EXCLUDED_PLACE_TYPES};
pub use types::{
    AddressComponent, AddressMatch, LocationInquiry, OsmAddress, OsmPlace, PlaceDetails,
    StatsAddress,
};

/// Reverse and forward geocoding.
#[async_trait]
pub trait LocationLookup: Send + Sync {
    async fn inspect(&self, coordinates: Coordinates) -> LocationInquiry;

    async fn geocode_address(&self, query: &AddressQuery) -> Option<Coordinates>;
}

/// Free-text address search for the map's search box.
#[async_trait]
pub trait AddressSearch: Send + Sync {
    async fn search_address(&self, query: &str) -> Result<Option<AddressMatch>, GeoError>;
}

/// Nearby establishment search and detail lookup.
#[async_trait]
pub trait PlaceSearch: Send + Sync {
    async fn search_nearby(&self, coordinates: Coordinates)
        -> Result<Vec<CandidatePlace>, GeoError>;

    async fn place_details(&self, place_id: &str) -> Result<PlaceDetails, GeoError>;
}

#[async_trait]
impl LocationLookup for GeoClient {
    async fn inspect(&self, coordinates: Coordinates) -> LocationInquiry {
        GeoClient::inspect(self, coordinates).await
    }

    async fn geocode_address(&self, query: &AddressQuery) -> Option<Coordinates> {
        GeoClient::geocode_address(self, query).await
    }
}

#[async_trait]
impl AddressSearch for GeoClient {
    async fn search_address(&self, query: &str) -> Result<Option<AddressMatch>, GeoError> {
        GeoClient::search_address(self, query).await
    }
}

#[async_trait]
impl PlaceSearch for GeoClient {
    async fn search_nearby(
        &self,
        coordinates: Coordinates,
    ) -> Result<Vec<CandidatePlace>, GeoError> {
        GeoClient::search_nearby(self, coordinates).await
    }

    async fn place_details(&self, place_id: &str) -> Result<PlaceDetails, GeoError> {
        GeoClient::place_details(self, place_id).await
    }
}
