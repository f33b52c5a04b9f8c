//! Establishment records produced by enrichment and shown in the analysis matrix.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::geo::Coordinates;
use crate::CoreError;

/// Canonical matrix fields, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    TradeName,
    LegalName,
    TaxId,
    RegistrationStatus,
    Street,
    Number,
    District,
    City,
    State,
    PostalCode,
    Country,
    Phone,
    Website,
    Email,
    Activity,
    Customers,
}

impl FieldName {
    pub const ALL: [FieldName; 16] = [
        FieldName::TradeName,
        FieldName::LegalName,
        FieldName::TaxId,
        FieldName::RegistrationStatus,
        FieldName::Street,
        FieldName::Number,
        FieldName::District,
        FieldName::City,
        FieldName::State,
        FieldName::PostalCode,
        FieldName::Country,
        FieldName::Phone,
        FieldName::Website,
        FieldName::Email,
        FieldName::Activity,
        FieldName::Customers,
    ];

    /// Fields of the pre-enrichment matrix (no free-text analysis fields).
    pub const SCALAR: [FieldName; 14] = [
        FieldName::TradeName,
        FieldName::LegalName,
        FieldName::TaxId,
        FieldName::RegistrationStatus,
        FieldName::Street,
        FieldName::Number,
        FieldName::District,
        FieldName::City,
        FieldName::State,
        FieldName::PostalCode,
        FieldName::Country,
        FieldName::Phone,
        FieldName::Website,
        FieldName::Email,
    ];

    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            FieldName::TradeName => "trade_name",
            FieldName::LegalName => "legal_name",
            FieldName::TaxId => "tax_id",
            FieldName::RegistrationStatus => "registration_status",
            FieldName::Street => "street",
            FieldName::Number => "number",
            FieldName::District => "district",
            FieldName::City => "city",
            FieldName::State => "state",
            FieldName::PostalCode => "postal_code",
            FieldName::Country => "country",
            FieldName::Phone => "phone",
            FieldName::Website => "website",
            FieldName::Email => "email",
            FieldName::Activity => "activity",
            FieldName::Customers => "customers",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            FieldName::TradeName => "Trade name",
            FieldName::LegalName => "Legal name",
            FieldName::TaxId => "CNPJ",
            FieldName::RegistrationStatus => "Registration status",
            FieldName::Street => "Street",
            FieldName::Number => "Number",
            FieldName::District => "District",
            FieldName::City => "City",
            FieldName::State => "State",
            FieldName::PostalCode => "Postal code",
            FieldName::Country => "Country",
            FieldName::Phone => "Phone",
            FieldName::Website => "Website",
            FieldName::Email => "Email",
            FieldName::Activity => "Activity",
            FieldName::Customers => "Customers",
        }
    }

    /// Free-text fields written by the assistant; they may carry `[n]` citations.
    #[must_use]
    pub fn is_analysis(self) -> bool {
        matches!(self, FieldName::Activity | FieldName::Customers)
    }

    /// Never shown in the enriched matrix.
    #[must_use]
    pub fn is_always_hidden(self) -> bool {
        matches!(self, FieldName::PostalCode | FieldName::Country)
    }

    /// Locality rows only tell branch and headquarters apart; a lone record
    /// never shows them.
    #[must_use]
    pub fn is_locality(self) -> bool {
        matches!(self, FieldName::District | FieldName::City | FieldName::State)
    }

    /// Collapsed in the seeded matrix until enrichment fills them in.
    #[must_use]
    pub fn is_hidden_before_enrichment(self) -> bool {
        matches!(
            self,
            FieldName::District
                | FieldName::City
                | FieldName::State
                | FieldName::PostalCode
                | FieldName::Country
                | FieldName::RegistrationStatus
        )
    }
}

impl std::fmt::Display for FieldName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for FieldName {
    type Err = CoreError;

    /// Accepts the snake-case key or the display label, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        FieldName::ALL
            .into_iter()
            .find(|f| f.key().eq_ignore_ascii_case(wanted) || f.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CoreError::InvalidFieldName(s.to_string()))
    }
}

pub type FieldMap = BTreeMap<FieldName, String>;

/// Value of `field`, or `""` when absent.
#[must_use]
pub fn field_value(fields: &FieldMap, field: FieldName) -> &str {
    fields.get(&field).map_or("", String::as_str)
}

/// `true` when the registration status denotes an active company.
#[must_use]
pub fn is_active_registration(status: &str) -> bool {
    let status = status.trim();
    status.eq_ignore_ascii_case("ACTIVE") || status.eq_ignore_ascii_case("ATIVA")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EstablishmentKind {
    Branch,
    Headquarters,
}

impl EstablishmentKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            EstablishmentKind::Branch => "Branch",
            EstablishmentKind::Headquarters => "Headquarters (main office)",
        }
    }
}

impl FromStr for EstablishmentKind {
    type Err = CoreError;

    /// Also accepts the Portuguese terms (`filial`, `matriz`) the assistant
    /// sometimes answers with.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "branch" | "filial" => Ok(EstablishmentKind::Branch),
            "headquarters" | "hq" | "head office" | "matriz" => Ok(EstablishmentKind::Headquarters),
            _ => Err(CoreError::InvalidEstablishmentKind(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for EstablishmentKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One legal establishment (branch or headquarters) as shown in the matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstablishmentRecord {
    pub kind: EstablishmentKind,
    pub fields: FieldMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub geocode_failed: bool,
}

impl EstablishmentRecord {
    #[must_use]
    pub fn new(kind: EstablishmentKind, fields: FieldMap) -> Self {
        Self {
            kind,
            fields,
            coordinates: None,
            geocode_failed: false,
        }
    }

    #[must_use]
    pub fn field(&self, field: FieldName) -> &str {
        field_value(&self.fields, field)
    }
}

/// A grounding source returned alongside an enrichment answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub uri: String,
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_name_parses_key_and_label() {
        assert_eq!("tax_id".parse::<FieldName>().unwrap(), FieldName::TaxId);
        assert_eq!("CNPJ".parse::<FieldName>().unwrap(), FieldName::TaxId);
        assert_eq!(
            "Registration Status".parse::<FieldName>().unwrap(),
            FieldName::RegistrationStatus
        );
        assert!("nickname".parse::<FieldName>().is_err());
    }

    #[test]
    fn field_map_serializes_with_snake_case_keys() {
        let mut fields = FieldMap::new();
        fields.insert(FieldName::PostalCode, "01310-100".to_string());
        let json = serde_json::to_value(&fields).expect("serialize");
        assert_eq!(json["postal_code"], "01310-100");
    }

    #[test]
    fn kind_accepts_portuguese_and_mixed_case() {
        assert_eq!(
            "Matriz".parse::<EstablishmentKind>().unwrap(),
            EstablishmentKind::Headquarters
        );
        assert_eq!(
            " FILIAL ".parse::<EstablishmentKind>().unwrap(),
            EstablishmentKind::Branch
        );
        let kind: EstablishmentKind = serde_json::from_str("\"Headquarters\"").unwrap();
        assert_eq!(kind, EstablishmentKind::Headquarters);
    }

    #[test]
    fn kind_rejects_unknown_value() {
        let result = serde_json::from_str::<EstablishmentKind>("\"warehouse\"");
        assert!(result.is_err());
    }

    #[test]
    fn active_registration_matches_both_languages() {
        assert!(is_active_registration("ACTIVE"));
        assert!(is_active_registration("ativa"));
        assert!(!is_active_registration("BAIXADA"));
        assert!(!is_active_registration(""));
    }

    #[test]
    fn scalar_fields_exclude_analysis_fields() {
        assert!(FieldName::SCALAR.iter().all(|f| !f.is_analysis()));
        assert_eq!(
            FieldName::ALL.iter().filter(|f| f.is_analysis()).count(),
            2
        );
    }
}
