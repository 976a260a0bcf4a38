//! Stage 6 — Cuisine enforcement (spec.md §4.6). Only runs when
//! `requiredTerms[]` is non-empty. STRICT keeps only strong matches, with one
//! relaxation allowed if the kept set drops below 5. RELAX_IF_EMPTY
//! prioritizes matches but never drops places. LLM failure returns all
//! places unchanged — this stage never blocks the pipeline.

use crate::errors::StageOutcome;
use crate::llm::schema::cuisine_enforcer_schema;
use crate::llm::{InvokeOpts, LlmClient, Purpose};
use crate::model::place::Place;
use crate::model::route::{CuisineStrictness, RouteMapping};
use serde::Deserialize;
use std::collections::HashSet;

const MIN_KEPT_BEFORE_RELAXATION: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relaxation {
    FallbackPreferred,
    DropRequiredOnce,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CuisineEnforcementResult {
    kept_place_ids: Vec<String>,
    relaxation_applied: Option<Relaxation>,
}

/// Never terminal — an LLM failure here keeps all places unranked rather
/// than blocking the pipeline (spec.md §4.6 stage 6).
pub async fn enforce_cuisine(llm: &LlmClient, route: &RouteMapping, places: Vec<Place>) -> StageOutcome<Vec<Place>> {
    if route.required_terms.is_empty() {
        return StageOutcome::Success(places);
    }

    let prompt = format!(
        "Given required terms {:?} and preferred terms {:?} (strictness {:?}), decide which of these places to keep: {}",
        route.required_terms,
        route.preferred_terms,
        route.strictness,
        places.iter().map(|p| format!("{}:{}", p.id, p.name)).collect::<Vec<_>>().join(", ")
    );
    let schema = cuisine_enforcer_schema();

    let result = match llm
        .invoke::<CuisineEnforcementResult>(Purpose::CuisineEnforcer, &prompt, &schema, InvokeOpts::default())
        .await
    {
        Ok(r) => r,
        Err(_) => return StageOutcome::FallbackUsed(places, "llm_error"),
    };

    let kept = match route.strictness {
        CuisineStrictness::RelaxIfEmpty => prioritize_never_drop(places, &result.kept_place_ids),
        CuisineStrictness::Strict => apply_strict(places, result),
    };
    StageOutcome::Success(kept)
}

fn prioritize_never_drop(mut places: Vec<Place>, kept_ids: &[String]) -> Vec<Place> {
    let kept: HashSet<&str> = kept_ids.iter().map(String::as_str).collect();
    places.sort_by_key(|p| if kept.contains(p.id.as_str()) { 0 } else { 1 });
    places
}

fn apply_strict(places: Vec<Place>, result: CuisineEnforcementResult) -> Vec<Place> {
    let kept: HashSet<&str> = result.kept_place_ids.iter().map(String::as_str).collect();
    let filtered: Vec<Place> = places.iter().filter(|p| kept.contains(p.id.as_str())).cloned().collect();

    if filtered.len() >= MIN_KEPT_BEFORE_RELAXATION || result.relaxation_applied.is_some() {
        return filtered;
    }

    tracing::info!(
        kept = filtered.len(),
        floor = MIN_KEPT_BEFORE_RELAXATION,
        "cuisine_strict_kept_below_floor_no_relaxation_signaled"
    );
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(id: &str) -> Place {
        Place {
            id: id.into(),
            name: id.into(),
            rating: None,
            user_rating_count: None,
            address: None,
            types: vec![],
            coordinate: None,
            price_level: None,
            open_now: None,
        }
    }

    #[test]
    fn relax_if_empty_never_drops_places() {
        let places = vec![place("a"), place("b"), place("c")];
        let prioritized = prioritize_never_drop(places, &["b".to_string()]);
        assert_eq!(prioritized.len(), 3);
        assert_eq!(prioritized[0].id, "b");
    }

    #[test]
    fn strict_filters_to_kept_set() {
        let places = vec![place("a"), place("b"), place("c")];
        let result = CuisineEnforcementResult { kept_place_ids: vec!["a".into(), "c".into()], relaxation_applied: None };
        let filtered = apply_strict(places, result);
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|p| p.id != "b"));
    }
}
