//! View-model for the analysis panel.
//!
//! Rendering is pure: the session stores a [`PanelContent`] and every read
//! turns it into a fresh [`PanelView`] for the browser.

use prospecto_core::{
    is_active_registration, Citation, Coordinates, EstablishmentRecord, FieldMap, FieldName,
};
use serde::Serialize;

use crate::citations::linkify_citations;

pub const GEOCODE_WARNING: &str = "geocoding unavailable";

/// What the panel currently holds.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelContent {
    /// Matrix seeded from place data, awaiting enrichment.
    Seeded {
        fields: FieldMap,
        pin: Option<Coordinates>,
    },
    /// Records returned by the assistant; `active` indexes `records`.
    Enriched {
        records: Vec<EstablishmentRecord>,
        active: usize,
        citations: Vec<Citation>,
        assistant_note: Option<String>,
    },
}

impl PanelContent {
    /// Fields of the record being shown.
    #[must_use]
    pub fn active_fields(&self) -> FieldMap {
        match self {
            PanelContent::Seeded { fields, .. } => fields.clone(),
            PanelContent::Enriched {
                records, active, ..
            } => records
                .get(*active)
                .map(|r| r.fields.clone())
                .unwrap_or_default(),
        }
    }

    /// Where the map pin sits for the record being shown.
    #[must_use]
    pub fn pin(&self) -> Option<Coordinates> {
        match self {
            PanelContent::Seeded { pin, .. } => *pin,
            PanelContent::Enriched {
                records, active, ..
            } => records.get(*active).and_then(|r| r.coordinates),
        }
    }

    #[must_use]
    pub fn render(&self) -> PanelView {
        match self {
            PanelContent::Seeded { fields, pin } => render_seeded(fields, *pin),
            PanelContent::Enriched {
                records,
                active,
                citations,
                assistant_note,
            } => render_enriched(records, *active, citations, assistant_note.as_deref()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelMode {
    Seeded,
    Enriched,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelView {
    pub mode: PanelMode,
    pub rows: Vec<PanelRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switcher: Option<Switcher>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assistant_note_html: Option<String>,
    pub sources: Vec<SourceItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pin: Option<Coordinates>,
}

impl PanelView {
    #[must_use]
    pub fn row(&self, field: FieldName) -> Option<&PanelRow> {
        self.rows.iter().find(|r| r.field == field)
    }

    /// Rows the browser should display.
    pub fn visible_rows(&self) -> impl Iterator<Item = &PanelRow> {
        self.rows.iter().filter(|r| !r.hidden)
    }
}

/// One matrix line.
///
/// Editable rows carry the raw `value` for an input box. Analysis rows are
/// read-only and carry pre-rendered `html` with citation links.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelRow {
    pub field: FieldName,
    pub label: &'static str,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    pub editable: bool,
    pub hidden: bool,
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Switcher {
    pub buttons: Vec<SwitchButton>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwitchButton {
    pub index: usize,
    pub label: &'static str,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceItem {
    pub number: usize,
    pub uri: String,
    pub title: String,
}

/// Renders the pre-enrichment matrix: every scalar editable, location
/// details and status folded away.
#[must_use]
pub fn render_seeded(fields: &FieldMap, pin: Option<Coordinates>) -> PanelView {
    let rows = FieldName::SCALAR
        .iter()
        .map(|&field| PanelRow {
            field,
            label: field.label(),
            value: fields.get(&field).cloned().unwrap_or_default(),
            html: None,
            editable: true,
            hidden: field.is_hidden_before_enrichment(),
            highlighted: false,
        })
        .collect();

    PanelView {
        mode: PanelMode::Seeded,
        rows,
        switcher: None,
        assistant_note_html: None,
        sources: Vec::new(),
        pin,
    }
}

/// Renders the enriched matrix for `records[active]`.
///
/// An out-of-range `active` falls back to the first record.
#[must_use]
pub fn render_enriched(
    records: &[EstablishmentRecord],
    active: usize,
    citations: &[Citation],
    assistant_note: Option<&str>,
) -> PanelView {
    let active = if active < records.len() { active } else { 0 };
    let Some(current) = records.get(active) else {
        return PanelView {
            mode: PanelMode::Enriched,
            rows: Vec::new(),
            switcher: None,
            assistant_note_html: None,
            sources: Vec::new(),
            pin: None,
        };
    };

    let rows = FieldName::ALL
        .iter()
        .map(|&field| {
            let value = current.field(field).trim().to_string();
            let hidden = is_hidden(field, &value, records, active);
            let highlighted = field == FieldName::RegistrationStatus
                && !value.is_empty()
                && !is_active_registration(&value);
            let html = field
                .is_analysis()
                .then(|| linkify_citations(&value, citations));
            PanelRow {
                field,
                label: field.label(),
                editable: !field.is_analysis(),
                html,
                value,
                hidden,
                highlighted,
            }
        })
        .collect();

    let switcher = (records.len() >= 2).then(|| Switcher {
        buttons: records
            .iter()
            .enumerate()
            .map(|(index, record)| SwitchButton {
                index,
                label: record.kind.label(),
                active: index == active,
                warning: (index == active && record.geocode_failed).then_some(GEOCODE_WARNING),
            })
            .collect(),
    });

    let assistant_note_html = assistant_note
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(|n| linkify_citations(n, citations));

    let sources = citations
        .iter()
        .enumerate()
        .map(|(i, c)| SourceItem {
            number: i + 1,
            uri: c.uri.clone(),
            title: c.title.clone(),
        })
        .collect();

    PanelView {
        mode: PanelMode::Enriched,
        rows,
        switcher,
        assistant_note_html,
        sources,
        pin: current.coordinates,
    }
}

fn is_hidden(field: FieldName, value: &str, records: &[EstablishmentRecord], active: usize) -> bool {
    if field.is_always_hidden() || value.is_empty() {
        return true;
    }
    if field == FieldName::RegistrationStatus && is_active_registration(value) {
        return true;
    }
    if records.len() < 2 {
        return field.is_locality();
    }
    records
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != active)
        .all(|(_, other)| other.field(field).trim() == value)
}

#[cfg(test)]
#[path = "panel_test.rs"]
mod tests;
