//! §3.5 IntentDecision.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentDecision {
    pub reason: String,
    pub city_text: Option<String>,
    #[serde(default)]
    pub blocks_search: bool,
}

impl IntentDecision {
    pub const EXPLICIT_CITY_MENTIONED: &'static str = "explicit_city_mentioned";
    pub const DEFAULT_TEXTSEARCH: &'static str = "default_textsearch";

    pub fn is_explicit_city(&self) -> bool {
        self.reason == Self::EXPLICIT_CITY_MENTIONED && self.city_text.is_some()
    }
}
