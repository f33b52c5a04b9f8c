//! The enrichment pipeline: prompt, model call, parse, consolidate, place.

use prospecto_core::{Citation, Coordinates, EstablishmentRecord, FieldMap};
use prospecto_geo::LocationLookup;

use crate::citations::dedupe_citations;
use crate::client::EnrichmentModel;
use crate::consolidate::{consolidate, place_records};
use crate::error::AnalysisError;
use crate::prompt::{build_prompt, PromptVariant};
use crate::response::parse_enrichment;

/// A successful enrichment, ready to become the panel's record set.
#[derive(Debug, Clone, PartialEq)]
pub struct Enrichment {
    pub records: Vec<EstablishmentRecord>,
    pub citations: Vec<Citation>,
    pub assistant_note: Option<String>,
}

/// Runs one enrichment for the `known` fields.
///
/// # Errors
///
/// - Any error from the model (missing key, transport, status).
/// - [`AnalysisError::NoValidAnalysis`] when the answer holds no usable record.
pub async fn enrich(
    model: &dyn EnrichmentModel,
    lookup: &dyn LocationLookup,
    known: &FieldMap,
    pin: Option<Coordinates>,
) -> Result<Enrichment, AnalysisError> {
    let variant = PromptVariant::for_fields(known);
    tracing::info!(?variant, "requesting enrichment");

    let reply = model.complete(&build_prompt(known)).await?;
    let parsed = parse_enrichment(&reply.text);
    if parsed.establishments.is_empty() {
        return Err(AnalysisError::NoValidAnalysis);
    }

    let returned = parsed.establishments.len();
    let mut records = consolidate(parsed.establishments);
    place_records(&mut records, pin, lookup).await;

    tracing::info!(
        returned,
        kept = records.len(),
        sources = reply.citations.len(),
        "enrichment complete"
    );

    Ok(Enrichment {
        records,
        citations: dedupe_citations(reply.citations),
        assistant_note: parsed.assistant_note,
    })
}
