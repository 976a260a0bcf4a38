//! Base-filter extraction (spec.md §4.6 stage 3) and local post-constraint
//! filtering (stage 7).

use crate::errors::StageOutcome;
use crate::llm::schema::base_filters_schema;
use crate::llm::{InvokeOpts, LlmClient, Purpose};
use crate::model::place::Place;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenState {
    Any,
    OpenNow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceIntent {
    Any,
    Cheap,
    Mid,
    Expensive,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseFilters {
    pub open_state: OpenState,
    #[allow(dead_code)]
    pub language: String,
    pub price_intent: PriceIntent,
    pub min_rating_bucket: f32,
}

impl BaseFilters {
    /// Safe defaults used when the `baseFilters` LLM call fails — this stage
    /// never fails the pipeline (spec.md §4.6 stage 3).
    pub fn defaults() -> Self {
        Self { open_state: OpenState::Any, language: "en".into(), price_intent: PriceIntent::Any, min_rating_bucket: 0.0 }
    }
}

/// Extracts base filters. Never terminal — an LLM failure here falls back to
/// defaults rather than ending the pipeline (spec.md §4.6 stage 3).
pub async fn extract_base_filters(llm: &LlmClient, query: &str) -> StageOutcome<BaseFilters> {
    let prompt = format!("Extract open-state, language, price intent, and minimum rating bucket from: {query}");
    let schema = base_filters_schema();
    match llm.invoke::<BaseFilters>(Purpose::BaseFilters, &prompt, &schema, InvokeOpts::default()).await {
        Ok(filters) => StageOutcome::Success(filters),
        Err(_) => StageOutcome::FallbackUsed(BaseFilters::defaults(), "llm_error"),
    }
}

fn price_level_matches(intent: PriceIntent, price_level: Option<u8>) -> bool {
    match (intent, price_level) {
        (PriceIntent::Any, _) => true,
        (_, None) => true,
        (PriceIntent::Cheap, Some(l)) => l <= 1,
        (PriceIntent::Mid, Some(l)) => (1..=2).contains(&l),
        (PriceIntent::Expensive, Some(l)) => l >= 3,
    }
}

/// Local post-constraint filtering: openNow, rating, price (spec.md §4.6 stage 7).
pub fn apply_post_constraints(places: Vec<Place>, filters: &BaseFilters) -> Vec<Place> {
    places
        .into_iter()
        .filter(|p| match filters.open_state {
            OpenState::Any => true,
            OpenState::OpenNow => p.open_now != Some(false),
        })
        .filter(|p| p.rating.map(|r| r >= filters.min_rating_bucket).unwrap_or(true))
        .filter(|p| price_level_matches(filters.price_intent, p.price_level))
        .collect()
}
