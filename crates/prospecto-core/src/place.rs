use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Which provider produced a [`CandidatePlace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceSource {
    /// Google Places.
    Commercial,
    /// OpenStreetMap via Overpass.
    Community,
}

/// A nearby establishment offered to the user for selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidatePlace {
    pub id: String,
    pub name: String,
    pub vicinity: String,
    pub source: PlaceSource,
    /// Full OSM tag set for community results; used to seed the matrix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_tags: Option<BTreeMap<String, String>>,
}
