use crate::app_config::{AppConfig, Environment, ProviderEndpoints};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Skips `.env` loading; for callers that prepare the environment themselves.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable is optional. Credentials left unset disable the feature
/// that needs them; the failure surfaces when that feature is used.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Blank secrets are as good as missing.
    let optional_secret = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let env = parse_environment(&or_default("PROSPECTO_ENV", "development"))?;

    let bind_addr = parse_addr("PROSPECTO_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("PROSPECTO_LOG_LEVEL", "info");
    let user_agent = or_default("PROSPECTO_USER_AGENT", "prospecto/0.1 (sales-territory)");
    let request_timeout_secs = parse_u64("PROSPECTO_REQUEST_TIMEOUT_SECS", "15")?;

    let search_radius_m = parse_u32("PROSPECTO_SEARCH_RADIUS_M", "50")?;
    if search_radius_m == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "PROSPECTO_SEARCH_RADIUS_M".to_string(),
            reason: "radius must be greater than zero".to_string(),
        });
    }

    let google_maps_api_key = optional_secret("GOOGLE_MAPS_API_KEY");
    let gemini_api_key = optional_secret("GEMINI_API_KEY");
    let gemini_model = or_default("PROSPECTO_GEMINI_MODEL", "gemini-2.5-flash");

    let ai_max_retries = parse_u32("PROSPECTO_AI_MAX_RETRIES", "2")?;
    let ai_retry_backoff_base_ms = parse_u64("PROSPECTO_AI_RETRY_BACKOFF_BASE_MS", "1000")?;
    let ai_request_timeout_secs = parse_u64("PROSPECTO_AI_REQUEST_TIMEOUT_SECS", "0")?;

    let session_ttl_secs = parse_u64("PROSPECTO_SESSION_TTL_SECS", "3600")?;
    let rate_limit_per_minute = parse_usize("PROSPECTO_RATE_LIMIT_PER_MINUTE", "120")?;

    let defaults = ProviderEndpoints::default();
    let endpoints = ProviderEndpoints {
        nominatim_url: or_default("PROSPECTO_NOMINATIM_URL", &defaults.nominatim_url),
        ibge_url: or_default("PROSPECTO_IBGE_URL", &defaults.ibge_url),
        places_url: or_default("PROSPECTO_PLACES_URL", &defaults.places_url),
        overpass_url: or_default("PROSPECTO_OVERPASS_URL", &defaults.overpass_url),
        gemini_url: or_default("PROSPECTO_GEMINI_URL", &defaults.gemini_url),
    };

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        user_agent,
        request_timeout_secs,
        search_radius_m,
        google_maps_api_key,
        gemini_api_key,
        gemini_model,
        ai_max_retries,
        ai_retry_backoff_base_ms,
        ai_request_timeout_secs,
        session_ttl_secs,
        rate_limit_per_minute,
        endpoints,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "PROSPECTO_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
