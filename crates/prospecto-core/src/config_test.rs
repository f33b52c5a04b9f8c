use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn parse_environment_development() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
}

#[test]
fn parse_environment_test() {
    assert_eq!(parse_environment("test").unwrap(), Environment::Test);
}

#[test]
fn parse_environment_production() {
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("unknown").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "PROSPECTO_ENV"));
}

#[test]
fn build_app_config_succeeds_with_empty_environment() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(result.is_ok(), "expected Ok, got: {result:?}");
    let cfg = result.unwrap();
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:3000");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.user_agent, "prospecto/0.1 (sales-territory)");
    assert_eq!(cfg.request_timeout_secs, 15);
    assert_eq!(cfg.search_radius_m, 50);
    assert!(cfg.google_maps_api_key.is_none());
    assert!(cfg.gemini_api_key.is_none());
    assert_eq!(cfg.gemini_model, "gemini-2.5-flash");
    assert_eq!(cfg.ai_max_retries, 2);
    assert_eq!(cfg.ai_retry_backoff_base_ms, 1000);
    assert_eq!(cfg.ai_request_timeout_secs, 0);
    assert_eq!(cfg.session_ttl_secs, 3600);
    assert_eq!(cfg.rate_limit_per_minute, 120);
    assert_eq!(cfg.endpoints, ProviderEndpoints::default());
}

#[test]
fn build_app_config_fails_with_invalid_bind_addr() {
    let mut map = HashMap::new();
    map.insert("PROSPECTO_BIND_ADDR", "not-a-socket-addr");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PROSPECTO_BIND_ADDR"),
        "expected InvalidEnvVar(PROSPECTO_BIND_ADDR), got: {result:?}"
    );
}

#[test]
fn build_app_config_reads_api_keys() {
    let mut map = HashMap::new();
    map.insert("GOOGLE_MAPS_API_KEY", "maps-key");
    map.insert("GEMINI_API_KEY", "gemini-key");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.google_maps_api_key.as_deref(), Some("maps-key"));
    assert_eq!(cfg.gemini_api_key.as_deref(), Some("gemini-key"));
}

#[test]
fn build_app_config_treats_blank_api_key_as_missing() {
    let mut map = HashMap::new();
    map.insert("GEMINI_API_KEY", "   ");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.gemini_api_key.is_none());
}

#[test]
fn debug_output_redacts_api_keys() {
    let mut map = HashMap::new();
    map.insert("GEMINI_API_KEY", "super-secret");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("super-secret"));
    assert!(rendered.contains("[redacted]"));
}

#[test]
fn search_radius_override() {
    let mut map = HashMap::new();
    map.insert("PROSPECTO_SEARCH_RADIUS_M", "120");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.search_radius_m, 120);
}

#[test]
fn search_radius_zero_is_rejected() {
    let mut map = HashMap::new();
    map.insert("PROSPECTO_SEARCH_RADIUS_M", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PROSPECTO_SEARCH_RADIUS_M"),
        "expected InvalidEnvVar(PROSPECTO_SEARCH_RADIUS_M), got: {result:?}"
    );
}

#[test]
fn ai_max_retries_invalid() {
    let mut map = HashMap::new();
    map.insert("PROSPECTO_AI_MAX_RETRIES", "not-a-number");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PROSPECTO_AI_MAX_RETRIES"),
        "expected InvalidEnvVar(PROSPECTO_AI_MAX_RETRIES), got: {result:?}"
    );
}

#[test]
fn request_timeout_override() {
    let mut map = HashMap::new();
    map.insert("PROSPECTO_REQUEST_TIMEOUT_SECS", "30");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.request_timeout_secs, 30);
}

#[test]
fn rate_limit_invalid() {
    let mut map = HashMap::new();
    map.insert("PROSPECTO_RATE_LIMIT_PER_MINUTE", "-1");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PROSPECTO_RATE_LIMIT_PER_MINUTE"),
        "expected InvalidEnvVar(PROSPECTO_RATE_LIMIT_PER_MINUTE), got: {result:?}"
    );
}

#[test]
fn provider_urls_can_be_overridden() {
    let mut map = HashMap::new();
    map.insert("PROSPECTO_NOMINATIM_URL", "http://localhost:8080");
    map.insert("PROSPECTO_GEMINI_URL", "http://localhost:9090/v1beta");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.endpoints.nominatim_url, "http://localhost:8080");
    assert_eq!(cfg.endpoints.gemini_url, "http://localhost:9090/v1beta");
    assert_eq!(
        cfg.endpoints.overpass_url,
        ProviderEndpoints::default().overpass_url
    );
}
