//! §3.4 LanguageContext.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchLanguage {
    #[serde(rename = "he")]
    He,
    #[serde(rename = "en")]
    En,
}

impl SearchLanguage {
    pub fn as_code(self) -> &'static str {
        match self {
            SearchLanguage::He => "he",
            SearchLanguage::En => "en",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageContext {
    pub search_language: SearchLanguage,
    pub search_language_source: String,
    pub assistant_language: String,
    pub assistant_language_source: String,
}

/// Construction-time validator per spec.md §3.4 invariant 1: the search
/// language's source tag must never leak assistant/query/ui provenance.
#[derive(Debug, thiserror::Error)]
#[error("invalid LanguageContext: searchLanguage.source={0:?} must not reference assistant/query/ui")]
pub struct LanguageContextInvariantViolation(pub String);

impl LanguageContext {
    pub fn new(
        search_language: SearchLanguage,
        search_language_source: impl Into<String>,
        assistant_language: impl Into<String>,
        assistant_language_source: impl Into<String>,
    ) -> Result<Self, LanguageContextInvariantViolation> {
        let search_language_source = search_language_source.into();
        let lowered = search_language_source.to_ascii_lowercase();
        if lowered.contains("assistant") || lowered.contains("query") || lowered.contains("ui") {
            return Err(LanguageContextInvariantViolation(search_language_source));
        }
        Ok(Self {
            search_language,
            search_language_source,
            assistant_language: assistant_language.into(),
            assistant_language_source: assistant_language_source.into(),
        })
    }
}
