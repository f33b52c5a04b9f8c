//! AI-assisted establishment enrichment and the analysis session workflow.

pub mod citations;
pub mod client;
pub mod consolidate;
pub mod enrich;
pub mod error;
pub mod panel;
pub mod prompt;
pub mod response;
pub(crate) mod retry;
pub mod seed;
pub mod session;
pub mod types;

pub use citations::{dedupe_citations, escape_html, linkify_citations};
pub use client::{EnrichmentModel, GeminiClient};
pub use consolidate::{consolidate, place_records};
pub use enrich::{enrich, Enrichment};
pub use error::AnalysisError;
pub use panel::{
    render_enriched, render_seeded, PanelContent, PanelMode, PanelRow, PanelView, SourceItem,
    SwitchButton, Switcher,
};
pub use prompt::{build_prompt, PromptVariant};
pub use response::{parse_enrichment, ParsedEnrichment};
pub use session::{
    AnalysisSession, Analyzer, Begun, Outcome, SessionAction, SessionError, SessionSnapshot,
    SessionState, Step, Ticket,
};
pub use types::ModelReply;
