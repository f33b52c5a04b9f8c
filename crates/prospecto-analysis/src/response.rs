//! Parsing the assistant's JSON answer into establishment records.
//!
//! The parser is lenient: fenced or prefixed text, malformed JSON, and
//! entries with an unknown kind all degrade to fewer records, never an error.

use std::sync::LazyLock;

use prospecto_core::{EstablishmentKind, EstablishmentRecord, FieldMap, FieldName};
use regex::Regex;
use serde_json::Value;

static FENCED_JSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("valid fenced-json regex")
});

/// Field labels the assistant sometimes echoes in Portuguese.
const PORTUGUESE_LABELS: [(&str, FieldName); 16] = [
    ("nome fantasia", FieldName::TradeName),
    ("razão social", FieldName::LegalName),
    ("razao social", FieldName::LegalName),
    ("situação cadastral", FieldName::RegistrationStatus),
    ("situacao cadastral", FieldName::RegistrationStatus),
    ("logradouro", FieldName::Street),
    ("número", FieldName::Number),
    ("numero", FieldName::Number),
    ("bairro", FieldName::District),
    ("cidade", FieldName::City),
    ("estado", FieldName::State),
    ("cep", FieldName::PostalCode),
    ("país", FieldName::Country),
    ("telefone", FieldName::Phone),
    ("site", FieldName::Website),
    ("e-mail", FieldName::Email),
];

/// Records and note extracted from one assistant answer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedEnrichment {
    pub establishments: Vec<EstablishmentRecord>,
    pub assistant_note: Option<String>,
}

/// Returns the body of the first fenced block, or the trimmed text.
#[must_use]
pub fn strip_code_fences(text: &str) -> &str {
    FENCED_JSON
        .captures(text)
        .and_then(|c| c.get(1))
        .map_or(text, |m| m.as_str())
        .trim()
}

/// Parses an assistant answer. Anything that is not a JSON object yields an
/// empty result.
#[must_use]
pub fn parse_enrichment(text: &str) -> ParsedEnrichment {
    let body = strip_code_fences(text);
    if !body.starts_with('{') {
        tracing::warn!(preview = %preview(body), "assistant reply is not a JSON object");
        return ParsedEnrichment::default();
    }

    let root: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(err) => {
            tracing::warn!(error = %err, "assistant reply is not valid JSON");
            return ParsedEnrichment::default();
        }
    };

    let establishments: Vec<EstablishmentRecord> =
        first_key(&root, &["establishments", "estabelecimentos"])
        .and_then(Value::as_array)
        .map(|entries| entries.iter().filter_map(parse_record).collect())
        .unwrap_or_default();

    let assistant_note = first_key(&root, &["assistant_note", "NotaDoAssistente", "note"])
        .and_then(value_to_text)
        .filter(|n| !n.trim().is_empty());

    ParsedEnrichment {
        establishments,
        assistant_note,
    }
}

fn parse_record(entry: &Value) -> Option<EstablishmentRecord> {
    let kind_raw = first_key(entry, &["kind", "tipo", "type"])?.as_str()?;
    let kind: EstablishmentKind = match kind_raw.parse() {
        Ok(kind) => kind,
        Err(err) => {
            tracing::warn!(error = %err, "skipping establishment with unknown kind");
            return None;
        }
    };

    let mut fields = FieldMap::new();
    if let Some(Value::Object(map)) = first_key(entry, &["fields", "dados"]) {
        for (key, raw) in map {
            let Some(field) = field_from_key(key) else {
                tracing::debug!(key = %key, "ignoring unknown establishment field");
                continue;
            };
            if let Some(text) = value_to_text(raw) {
                fields.insert(field, text.trim().to_string());
            }
        }
    }

    Some(EstablishmentRecord::new(kind, fields))
}

fn field_from_key(key: &str) -> Option<FieldName> {
    if let Ok(field) = key.parse::<FieldName>() {
        return Some(field);
    }
    let lowered = key.trim().to_lowercase();
    PORTUGUESE_LABELS
        .iter()
        .find(|(label, _)| *label == lowered)
        .map(|(_, field)| *field)
        .or(match lowered.as_str() {
            "atividade" => Some(FieldName::Activity),
            "clientes" => Some(FieldName::Customers),
            _ => None,
        })
}

fn first_key<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| value.get(*k))
}

fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn preview(text: &str) -> &str {
    match text.char_indices().nth(120) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
