use prospecto_geo::GeoError;
use thiserror::Error;

/// Errors returned by the enrichment workflow and the AI client.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The AI service answered with a non-2xx status.
    #[error("AI service responded with status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The response envelope could not be deserialized.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A credential needed for this action is not configured.
    #[error("{0} is not configured")]
    MissingApiKey(&'static str),

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error(transparent)]
    Geo(#[from] GeoError),

    /// The assistant answered, but with no usable establishment.
    #[error("the assistant returned no valid analysis")]
    NoValidAnalysis,

    /// The action is not accepted in the session's current state.
    #[error("{action} is not allowed while the session is {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    /// An enrichment is already in flight for this session.
    #[error("an enrichment is already running for this session")]
    Busy,

    #[error("unknown place: {0}")]
    UnknownPlace(String),

    #[error("record {index} does not exist (the panel has {count})")]
    UnknownRecord { index: usize, count: usize },
}

impl AnalysisError {
    /// Missing or broken configuration; shown as a dismissible banner rather
    /// than inline next to the action.
    #[must_use]
    pub fn is_banner(&self) -> bool {
        match self {
            AnalysisError::MissingApiKey(_) | AnalysisError::InvalidBaseUrl { .. } => true,
            AnalysisError::Geo(geo) => geo.is_configuration(),
            _ => false,
        }
    }

    /// Rejections that leave the session untouched.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            AnalysisError::InvalidTransition { .. }
                | AnalysisError::Busy
                | AnalysisError::UnknownPlace(_)
                | AnalysisError::UnknownRecord { .. }
        )
    }
}
