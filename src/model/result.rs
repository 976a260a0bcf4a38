//! §3.8 SearchResult.

use super::place::Place;
use super::request::Coordinate;
use serde::{Deserialize, Serialize};

pub const CONTRACTS_VERSION: &str = "search_contracts_v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssistantKind {
    #[serde(rename = "CLARIFY")]
    Clarify,
    #[serde(rename = "SUMMARY")]
    Summary,
    #[serde(rename = "GATE_FAIL")]
    GateFail,
    #[serde(rename = "NUDGE_REFINE")]
    NudgeRefine,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantMessage {
    pub kind: AssistantKind,
    pub text: String,
    pub blocks_search: bool,
}

impl AssistantMessage {
    /// Enforces spec.md §4.6 stage 9: SUMMARY must carry `blocksSearch=false`.
    /// Violations are corrected and logged as `severity: PROMPT_VIOLATION`.
    pub fn enforce_summary_invariant(mut self) -> Self {
        if self.kind == AssistantKind::Summary && self.blocks_search {
            tracing::warn!(severity = "PROMPT_VIOLATION", kind = ?self.kind, "summary_blocks_search_corrected");
            self.blocks_search = false;
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceOrigin {
    #[serde(rename = "CITY_CENTER")]
    CityCenter,
    #[serde(rename = "USER_LOCATION")]
    UserLocation,
    #[serde(rename = "NONE")]
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMeta {
    pub fetched_count: usize,
    pub returned_count: usize,
    pub ranking_profile: String,
    pub distance_origin: DistanceOrigin,
    pub distance_ref: Option<Coordinate>,
    pub contracts_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub places: Vec<Place>,
    pub assistant: AssistantMessage,
    pub meta: ResultMeta,
}
