//! Shared HTTP client for the geocoding and place-search providers.
//!
//! One `reqwest` client serves every provider. Base URLs come from
//! [`ProviderEndpoints`] so tests can point each provider at a mock server.

use std::time::Duration;

use prospecto_core::{AppConfig, ProviderEndpoints};
use reqwest::{Client, Url};

use crate::error::GeoError;

pub(crate) const NOMINATIM: &str = "Nominatim";
pub(crate) const IBGE: &str = "IBGE";
pub(crate) const PLACES: &str = "Google Places";
pub(crate) const OVERPASS: &str = "Overpass";

/// Settings that are not endpoint URLs.
#[derive(Debug, Clone)]
pub struct GeoClientOptions {
    pub user_agent: String,
    pub timeout_secs: u64,
    pub search_radius_m: u32,
    pub places_api_key: Option<String>,
}

/// Client for Nominatim, IBGE, Google Places, and Overpass.
pub struct GeoClient {
    pub(crate) client: Client,
    pub(crate) nominatim_url: Url,
    pub(crate) ibge_url: Url,
    pub(crate) places_url: Url,
    pub(crate) overpass_url: Url,
    pub(crate) search_radius_m: u32,
    pub(crate) places_api_key: Option<String>,
}

impl GeoClient {
    /// Builds a client from the loaded application config.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::Http`] if the `reqwest::Client` cannot be built, or
    /// [`GeoError::InvalidBaseUrl`] if a configured endpoint is not a URL.
    pub fn from_config(config: &AppConfig) -> Result<Self, GeoError> {
        Self::with_endpoints(
            &config.endpoints,
            GeoClientOptions {
                user_agent: config.user_agent.clone(),
                timeout_secs: config.request_timeout_secs,
                search_radius_m: config.search_radius_m,
                places_api_key: config.google_maps_api_key.clone(),
            },
        )
    }

    /// Builds a client against explicit endpoints (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Same as [`GeoClient::from_config`].
    pub fn with_endpoints(
        endpoints: &ProviderEndpoints,
        options: GeoClientOptions,
    ) -> Result<Self, GeoError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(options.user_agent)
            .build()?;

        Ok(Self {
            client,
            nominatim_url: parse_base_url(&endpoints.nominatim_url)?,
            ibge_url: parse_base_url(&endpoints.ibge_url)?,
            places_url: parse_base_url(&endpoints.places_url)?,
            overpass_url: parse_base_url(&endpoints.overpass_url)?,
            search_radius_m: options.search_radius_m,
            places_api_key: options.places_api_key,
        })
    }

    /// Joins `path` onto `base` and appends percent-encoded query pairs.
    pub(crate) fn endpoint(
        base: &Url,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Url, GeoError> {
        let mut url = base.join(path).map_err(|e| GeoError::InvalidBaseUrl {
            url: format!("{base}{path}"),
            reason: e.to_string(),
        })?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    /// Sends a GET request, asserts a 2xx status, and parses the body as JSON.
    ///
    /// An empty body parses as `null`; IBGE answers some misses that way.
    pub(crate) async fn request_json(
        &self,
        service: &'static str,
        url: &Url,
    ) -> Result<serde_json::Value, GeoError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GeoError::UnexpectedStatus {
                service,
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| GeoError::Deserialize {
            context: format!("{service} {}", url.path()),
            source: e,
        })
    }
}

/// Normalises to exactly one trailing slash so `Url::join` appends rather than
/// replacing the last path segment.
fn parse_base_url(raw: &str) -> Result<Url, GeoError> {
    let normalised = format!("{}/", raw.trim_end_matches('/'));
    Url::parse(&normalised).map_err(|e| GeoError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

pub(crate) fn decode<T: serde::de::DeserializeOwned>(
    context: &str,
    body: serde_json::Value,
) -> Result<T, GeoError> {
    serde_json::from_value(body).map_err(|e| GeoError::Deserialize {
        context: context.to_string(),
        source: e,
    })
}
