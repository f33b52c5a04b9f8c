//! The analysis session: an explicit state machine driven by user actions.
//!
//! A step that needs I/O is split in two. [`AnalysisSession::begin`] validates
//! the action against the transition table and hands out a [`Ticket`];
//! [`AnalysisSession::complete`] applies the result only if no newer step has
//! begun since. [`Analyzer::dispatch`] runs both halves around the provider
//! calls, holding the session lock only for the transitions.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use prospecto_core::{CandidatePlace, Coordinates, FieldMap, PlaceSource};
use prospecto_geo::{LocationInquiry, LocationLookup, OsmAddress, PlaceSearch};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::client::EnrichmentModel;
use crate::enrich::{enrich, Enrichment};
use crate::error::AnalysisError;
use crate::panel::{PanelContent, PanelView};
use crate::seed::{apply_edits, seed_from_details, seed_from_tags};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    ConfirmingLocation,
    AwaitingPlacePick,
    Rendered,
    Enriching,
}

impl SessionState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::ConfirmingLocation => "confirming_location",
            SessionState::AwaitingPlacePick => "awaiting_place_pick",
            SessionState::Rendered => "rendered",
            SessionState::Enriching => "enriching",
        }
    }
}

/// A user action, as posted by the browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SessionAction {
    /// The user clicked or dragged the pin.
    Inspect { lat: f64, lng: f64 },
    /// The user confirmed the reverse-geocoded location.
    Confirm,
    PickPlace { place_id: String },
    /// Analyze the clicked point itself instead of a listed place.
    AnalyzeAlternative {
        #[serde(default)]
        tags: Option<BTreeMap<String, String>>,
    },
    /// Run the enrichment with the user's edits overlaid.
    SearchDetails {
        #[serde(default)]
        edits: FieldMap,
    },
    SwitchRecord { index: usize },
    Cancel,
    Close,
}

impl SessionAction {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            SessionAction::Inspect { .. } => "inspect",
            SessionAction::Confirm => "confirm",
            SessionAction::PickPlace { .. } => "pick_place",
            SessionAction::AnalyzeAlternative { .. } => "analyze_alternative",
            SessionAction::SearchDetails { .. } => "search_details",
            SessionAction::SwitchRecord { .. } => "switch_record",
            SessionAction::Cancel => "cancel",
            SessionAction::Close => "close",
        }
    }

    /// The transition table.
    #[must_use]
    pub fn accepted_in(&self, state: SessionState) -> bool {
        use SessionState as S;
        match self {
            SessionAction::Inspect { .. } | SessionAction::Close => true,
            SessionAction::Confirm => state == S::ConfirmingLocation,
            SessionAction::PickPlace { .. } | SessionAction::AnalyzeAlternative { .. } => {
                state == S::AwaitingPlacePick
            }
            SessionAction::SearchDetails { .. } | SessionAction::SwitchRecord { .. } => {
                state == S::Rendered
            }
            SessionAction::Cancel => {
                matches!(state, S::ConfirmingLocation | S::AwaitingPlacePick)
            }
        }
    }
}

/// The provider work a begun action still needs.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Inspect(Coordinates),
    SearchNearby(Coordinates),
    PlaceDetails {
        place_id: String,
        osm: Option<OsmAddress>,
    },
    Enrich {
        known: FieldMap,
        pin: Option<Coordinates>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub generation: u64,
    pub step: Step,
}

/// Result of running a [`Step`].
#[derive(Debug)]
pub enum Outcome {
    Inspected(LocationInquiry),
    Candidates(Vec<CandidatePlace>),
    Seeded(FieldMap),
    Enriched(Enrichment),
    Failed(AnalysisError),
}

#[derive(Debug)]
pub enum Begun {
    /// The action was applied without I/O.
    Done,
    Pending(Ticket),
}

/// An error shown to the user: inline next to the action, or as a banner
/// for configuration problems.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionError {
    pub message: String,
    pub banner: bool,
}

impl From<&AnalysisError> for SessionError {
    fn from(err: &AnalysisError) -> Self {
        Self {
            message: err.to_string(),
            banner: err.is_banner(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InquirySummary {
    #[serde(flatten)]
    pub inquiry: LocationInquiry,
    pub confirm_label: String,
    pub alternative_label: String,
}

/// Read model returned after every action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub generation: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inquiry: Option<InquirySummary>,
    pub candidates: Vec<CandidatePlace>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub panel: Option<PanelView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<SessionError>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct AnalysisSession {
    state: SessionState,
    generation: u64,
    pending: Option<&'static str>,
    inquiry: Option<LocationInquiry>,
    candidates: Vec<CandidatePlace>,
    panel: Option<PanelContent>,
    last_error: Option<SessionError>,
    updated_at: DateTime<Utc>,
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisSession {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            generation: 0,
            pending: None,
            inquiry: None,
            candidates: Vec::new(),
            panel: None,
            last_error: None,
            updated_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    #[must_use]
    pub fn panel(&self) -> Option<&PanelContent> {
        self.panel.as_ref()
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            generation: self.generation,
            pending: self.pending,
            inquiry: self.inquiry.as_ref().map(|inquiry| InquirySummary {
                confirm_label: inquiry.confirm_label(),
                alternative_label: inquiry.alternative_label(),
                inquiry: inquiry.clone(),
            }),
            candidates: self.candidates.clone(),
            panel: self.panel.as_ref().map(PanelContent::render),
            last_error: self.last_error.clone(),
            updated_at: self.updated_at,
        }
    }

    /// Validates `action` and applies whatever needs no I/O.
    ///
    /// A rejected action leaves the session exactly as it was.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::Busy`] for a second enrichment while one runs.
    /// - [`AnalysisError::InvalidTransition`] when the transition table
    ///   rejects the action.
    /// - [`AnalysisError::UnknownPlace`] / [`AnalysisError::UnknownRecord`]
    ///   for indices the session does not hold.
    pub fn begin(&mut self, action: SessionAction) -> Result<Begun, AnalysisError> {
        let name = action.name();
        if matches!(action, SessionAction::SearchDetails { .. })
            && self.state == SessionState::Enriching
        {
            return Err(AnalysisError::Busy);
        }
        if !action.accepted_in(self.state) {
            tracing::debug!(action = name, state = self.state.as_str(), "action rejected");
            return Err(AnalysisError::InvalidTransition {
                action: name,
                state: self.state.as_str(),
            });
        }

        let begun = match action {
            SessionAction::Inspect { lat, lng } => {
                self.reset(SessionState::Idle);
                self.issue(name, Step::Inspect(Coordinates::new(lat, lng)))
            }
            SessionAction::Confirm => {
                let Some(point) = self.inquiry.as_ref().map(|i| i.coordinates) else {
                    return Err(AnalysisError::InvalidTransition {
                        action: name,
                        state: self.state.as_str(),
                    });
                };
                self.issue(name, Step::SearchNearby(point))
            }
            SessionAction::PickPlace { place_id } => {
                let (source, raw_tags) = self
                    .candidates
                    .iter()
                    .find(|c| c.id == place_id)
                    .map(|c| (c.source, c.raw_tags.clone()))
                    .ok_or_else(|| AnalysisError::UnknownPlace(place_id.clone()))?;
                match source {
                    PlaceSource::Community => {
                        let fields = seed_from_tags(raw_tags.as_ref(), self.osm_address());
                        self.show_seeded(fields);
                        self.bump();
                        Begun::Done
                    }
                    PlaceSource::Commercial => {
                        let osm = self.osm_address().cloned();
                        self.issue(name, Step::PlaceDetails { place_id, osm })
                    }
                }
            }
            SessionAction::AnalyzeAlternative { tags } => {
                let fields = seed_from_tags(tags.as_ref(), self.osm_address());
                self.show_seeded(fields);
                self.bump();
                Begun::Done
            }
            SessionAction::SearchDetails { edits } => {
                let known = self.apply_panel_edits(&edits);
                let pin = self
                    .inquiry
                    .as_ref()
                    .map(|i| i.coordinates)
                    .or_else(|| self.panel.as_ref().and_then(PanelContent::pin));
                self.state = SessionState::Enriching;
                self.issue(name, Step::Enrich { known, pin })
            }
            SessionAction::SwitchRecord { index } => {
                self.switch_record(index)?;
                Begun::Done
            }
            SessionAction::Cancel => {
                let panel = self.panel.take();
                self.reset(SessionState::Idle);
                self.panel = panel;
                self.bump();
                Begun::Done
            }
            SessionAction::Close => {
                self.reset(SessionState::Idle);
                self.bump();
                Begun::Done
            }
        };

        self.last_error = None;
        self.touch();
        tracing::info!(
            action = name,
            state = self.state.as_str(),
            generation = self.generation,
            "session action accepted"
        );
        Ok(begun)
    }

    /// Applies the result of `ticket`'s step. Returns `false` and changes
    /// nothing when a newer step has begun since the ticket was issued.
    pub fn complete(&mut self, ticket: &Ticket, outcome: Outcome) -> bool {
        if ticket.generation != self.generation {
            tracing::info!(
                ticket = ticket.generation,
                current = self.generation,
                "dropping stale step result"
            );
            return false;
        }
        self.pending = None;

        match outcome {
            Outcome::Inspected(inquiry) => {
                self.inquiry = Some(inquiry);
                self.state = SessionState::ConfirmingLocation;
            }
            Outcome::Candidates(candidates) => {
                self.candidates = candidates;
                self.state = SessionState::AwaitingPlacePick;
            }
            Outcome::Seeded(fields) => self.show_seeded(fields),
            Outcome::Enriched(enrichment) => {
                self.panel = Some(PanelContent::Enriched {
                    records: enrichment.records,
                    active: 0,
                    citations: enrichment.citations,
                    assistant_note: enrichment.assistant_note,
                });
                self.state = SessionState::Rendered;
            }
            Outcome::Failed(err) => {
                tracing::warn!(error = %err, banner = err.is_banner(), "session step failed");
                self.last_error = Some(SessionError::from(&err));
                self.state = if self.panel.is_some() {
                    SessionState::Rendered
                } else {
                    SessionState::Idle
                };
            }
        }
        self.touch();
        true
    }

    fn issue(&mut self, name: &'static str, step: Step) -> Begun {
        self.bump();
        self.pending = Some(name);
        Begun::Pending(Ticket {
            generation: self.generation,
            step,
        })
    }

    fn bump(&mut self) {
        self.generation += 1;
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn reset(&mut self, state: SessionState) {
        self.state = state;
        self.pending = None;
        self.inquiry = None;
        self.candidates.clear();
        self.panel = None;
    }

    fn osm_address(&self) -> Option<&OsmAddress> {
        self.inquiry.as_ref().and_then(LocationInquiry::osm_address)
    }

    fn show_seeded(&mut self, fields: FieldMap) {
        self.panel = Some(PanelContent::Seeded {
            fields,
            pin: self.inquiry.as_ref().map(|i| i.coordinates),
        });
        self.state = SessionState::Rendered;
    }

    /// Writes `edits` into the shown record and returns its full field set.
    fn apply_panel_edits(&mut self, edits: &FieldMap) -> FieldMap {
        match self.panel.as_mut() {
            Some(PanelContent::Seeded { fields, .. }) => {
                apply_edits(fields, edits);
                fields.clone()
            }
            Some(PanelContent::Enriched {
                records, active, ..
            }) => match records.get_mut(*active) {
                Some(record) => {
                    apply_edits(&mut record.fields, edits);
                    record.fields.clone()
                }
                None => edits.clone(),
            },
            None => {
                let mut fields = FieldMap::new();
                apply_edits(&mut fields, edits);
                fields
            }
        }
    }

    fn switch_record(&mut self, index: usize) -> Result<(), AnalysisError> {
        match self.panel.as_mut() {
            Some(PanelContent::Enriched {
                records, active, ..
            }) => {
                if index >= records.len() {
                    return Err(AnalysisError::UnknownRecord {
                        index,
                        count: records.len(),
                    });
                }
                *active = index;
                Ok(())
            }
            Some(PanelContent::Seeded { .. }) if index == 0 => Ok(()),
            Some(PanelContent::Seeded { .. }) => {
                Err(AnalysisError::UnknownRecord { index, count: 1 })
            }
            None => Err(AnalysisError::UnknownRecord { index, count: 0 }),
        }
    }
}

/// Runs session steps against the configured providers.
#[derive(Clone)]
pub struct Analyzer {
    lookup: Arc<dyn LocationLookup>,
    places: Arc<dyn PlaceSearch>,
    model: Arc<dyn EnrichmentModel>,
}

impl Analyzer {
    #[must_use]
    pub fn new(
        lookup: Arc<dyn LocationLookup>,
        places: Arc<dyn PlaceSearch>,
        model: Arc<dyn EnrichmentModel>,
    ) -> Self {
        Self {
            lookup,
            places,
            model,
        }
    }

    /// Applies `action` to `session`, running any provider work outside the lock.
    ///
    /// Step failures are not returned as `Err`; they land in the snapshot's
    /// `last_error` and the session falls back to a stable state.
    ///
    /// # Errors
    ///
    /// Only the rejections from [`AnalysisSession::begin`].
    pub async fn dispatch(
        &self,
        session: &Mutex<AnalysisSession>,
        action: SessionAction,
    ) -> Result<SessionSnapshot, AnalysisError> {
        let begun = session.lock().await.begin(action)?;
        let ticket = match begun {
            Begun::Done => return Ok(session.lock().await.snapshot()),
            Begun::Pending(ticket) => ticket,
        };

        let outcome = self.run(&ticket.step).await;

        let mut guard = session.lock().await;
        guard.complete(&ticket, outcome);
        Ok(guard.snapshot())
    }

    /// Performs the provider calls for one step.
    pub async fn run(&self, step: &Step) -> Outcome {
        match step {
            Step::Inspect(point) => Outcome::Inspected(self.lookup.inspect(*point).await),
            Step::SearchNearby(point) => match self.places.search_nearby(*point).await {
                Ok(candidates) => Outcome::Candidates(candidates),
                Err(err) => Outcome::Failed(err.into()),
            },
            Step::PlaceDetails { place_id, osm } => {
                match self.places.place_details(place_id).await {
                    Ok(details) => Outcome::Seeded(seed_from_details(&details, osm.as_ref())),
                    Err(err) => Outcome::Failed(err.into()),
                }
            }
            Step::Enrich { known, pin } => {
                match enrich(self.model.as_ref(), self.lookup.as_ref(), known, *pin).await {
                    Ok(enrichment) => Outcome::Enriched(enrichment),
                    Err(err) => Outcome::Failed(err),
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
