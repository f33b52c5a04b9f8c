use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Base URLs of every external provider. Overridable so tests and staging
/// can point at mock servers or mirrors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoints {
    pub nominatim_url: String,
    pub ibge_url: String,
    pub places_url: String,
    pub overpass_url: String,
    pub gemini_url: String,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            nominatim_url: "https://nominatim.openstreetmap.org".to_string(),
            ibge_url: "https://servicodados.ibge.gov.br".to_string(),
            places_url: "https://maps.googleapis.com/maps/api/place".to_string(),
            overpass_url: "https://overpass-api.de/api".to_string(),
            gemini_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub search_radius_m: u32,
    pub google_maps_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub ai_max_retries: u32,
    pub ai_retry_backoff_base_ms: u64,
    /// `0` means the AI request has no transport timeout.
    pub ai_request_timeout_secs: u64,
    pub session_ttl_secs: u64,
    pub rate_limit_per_minute: usize,
    pub endpoints: ProviderEndpoints,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("user_agent", &self.user_agent)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("search_radius_m", &self.search_radius_m)
            .field(
                "google_maps_api_key",
                &self.google_maps_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("gemini_model", &self.gemini_model)
            .field("ai_max_retries", &self.ai_max_retries)
            .field("ai_retry_backoff_base_ms", &self.ai_retry_backoff_base_ms)
            .field("ai_request_timeout_secs", &self.ai_request_timeout_secs)
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("endpoints", &self.endpoints)
            .finish()
    }
}
