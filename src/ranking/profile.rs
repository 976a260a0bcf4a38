//! Ranking profile selection (spec.md §4.5): a closed set of weight presets
//! chosen by an LLM call, with a GOOGLE order-preserving fallback.

use crate::config::{RankingConfig, RankingDefaultMode};
use crate::llm::schema::ranking_profile_schema;
use crate::llm::{InvokeOpts, LlmClient, LlmError, Purpose};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProfileName {
    QualityFocused,
    DistanceFocused,
    Balanced,
    Google,
}

#[derive(Debug, Clone, Copy)]
pub struct RankingProfile {
    pub name: ProfileName,
    pub rating: f64,
    pub reviews: f64,
    pub distance: f64,
    pub open_boost: f64,
}

impl RankingProfile {
    pub fn quality_focused() -> Self {
        Self { name: ProfileName::QualityFocused, rating: 0.55, reviews: 0.3, distance: 0.1, open_boost: 0.05 }
    }

    pub fn distance_focused() -> Self {
        Self { name: ProfileName::DistanceFocused, rating: 0.2, reviews: 0.15, distance: 0.6, open_boost: 0.05 }
    }

    pub fn balanced() -> Self {
        Self { name: ProfileName::Balanced, rating: 0.35, reviews: 0.25, distance: 0.3, open_boost: 0.1 }
    }

    /// GOOGLE mode: distance/reviews/open carry zero weight and rating alone
    /// reflects input order closely enough to act as a pass-through, since
    /// the deterministic tie-break on input index preserves provider order
    /// whenever every place scores identically (spec.md §4.5).
    pub fn google() -> Self {
        Self { name: ProfileName::Google, rating: 0.0, reviews: 0.0, distance: 0.0, open_boost: 0.0 }
    }
}

#[derive(Debug, Deserialize)]
struct ProfileSelection {
    mode: ProfileName,
}

fn resolve_default(mode: RankingDefaultMode) -> RankingProfile {
    match mode {
        RankingDefaultMode::Google => RankingProfile::google(),
        RankingDefaultMode::LlmScore => RankingProfile::balanced(),
    }
}

/// Selects a ranking profile: asks the `rankingProfile` LLM purpose when
/// enabled, falling back to the configured default mode on disable or
/// failure (spec.md §4.5).
pub async fn select_profile(llm: &LlmClient, config: &RankingConfig, query: &str) -> RankingProfile {
    if !config.llm_enabled {
        return resolve_default(config.default_mode);
    }

    let prompt = format!(
        "Choose a ranking profile (QUALITY_FOCUSED, DISTANCE_FOCUSED, or BALANCED) for this search query: {query}"
    );
    let schema = ranking_profile_schema();
    let result: Result<ProfileSelection, LlmError> = llm
        .invoke(Purpose::RankingProfile, &prompt, &schema, InvokeOpts::default())
        .await;

    match result {
        Ok(ProfileSelection { mode: ProfileName::QualityFocused }) => RankingProfile::quality_focused(),
        Ok(ProfileSelection { mode: ProfileName::DistanceFocused }) => RankingProfile::distance_focused(),
        Ok(ProfileSelection { mode: ProfileName::Balanced }) => RankingProfile::balanced(),
        Ok(ProfileSelection { mode: ProfileName::Google }) => RankingProfile::google(),
        Err(e) => {
            tracing::warn!(error = %e, "ranking_profile_selection_failed_using_default");
            resolve_default(config.default_mode)
        }
    }
}
