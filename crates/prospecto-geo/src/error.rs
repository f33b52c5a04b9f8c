use thiserror::Error;

/// Errors returned by the geocoding and place-search adapters.
#[derive(Debug, Error)]
pub enum GeoError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-2xx status.
    #[error("{service} responded with status {status}")]
    UnexpectedStatus { service: &'static str, status: u16 },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The provider answered successfully but had nothing for the point.
    #[error("{service}: no address found")]
    NoAddressFound { service: &'static str },

    /// Nominatim returned an `{"error": ...}` body.
    #[error("{service} error: {message}")]
    Provider {
        service: &'static str,
        message: String,
    },

    /// Google Places returned a non-OK status code.
    #[error("{message}")]
    Places { status: String, message: String },

    /// A credential needed for this call is not configured.
    #[error("{0} is not configured")]
    MissingApiKey(&'static str),

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl GeoError {
    /// `true` for missing credentials, which the front end shows as a banner.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            GeoError::MissingApiKey(_) | GeoError::InvalidBaseUrl { .. }
        )
    }
}
