//! §3.1 SearchRequest.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

/// Inbound `POST /api/v1/search` body plus server-attached metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(rename = "userLocation")]
    pub user_location: Option<Coordinate>,
    /// Advisory only — never feeds `searchLanguage` (spec.md §3.4 invariant 1).
    #[serde(rename = "uiLanguage")]
    pub ui_language: Option<String>,
    #[serde(rename = "regionCode")]
    pub region_code: String,
    pub session_id: String,
    pub user_id: Option<String>,
    pub submitted_at_ms: i64,
}
