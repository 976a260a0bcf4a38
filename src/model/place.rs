//! §3.7 Place.

use super::request::Coordinate;
use serde::{Deserialize, Serialize};

/// Provider-returned record. Immutable once fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: String,
    pub name: String,
    pub rating: Option<f32>,
    pub user_rating_count: Option<u32>,
    pub address: Option<String>,
    pub types: Vec<String>,
    pub coordinate: Option<Coordinate>,
    pub price_level: Option<u8>,
    pub open_now: Option<bool>,
}
