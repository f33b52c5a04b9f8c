//! Shared domain types and configuration for Prospecto.

pub mod app_config;
pub mod config;
pub mod establishment;
pub mod geo;
pub mod place;
pub mod tax_id;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, ProviderEndpoints};
pub use config::{load_app_config, load_app_config_from_env};
pub use establishment::{
    field_value, is_active_registration, Citation, EstablishmentKind, EstablishmentRecord,
    FieldMap, FieldName,
};
pub use geo::{Coordinates, GeoResult};
pub use place::{CandidatePlace, PlaceSource};
pub use tax_id::{is_headquarters_tax_id, normalize_tax_id, same_tax_id};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("unknown establishment kind: {0}")]
    InvalidEstablishmentKind(String),

    #[error("unknown field name: {0}")]
    InvalidFieldName(String),
}
