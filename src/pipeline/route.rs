//! Stage 4 — Route mapping (spec.md §4.6): produce a RouteMapping, falling
//! back to a minimal default on schema-invalid output, and resolving a
//! missing `bias` from `cityText` via geocode.

use crate::errors::StageOutcome;
use crate::llm::schema::route_mapper_schema;
use crate::llm::{InvokeOpts, LlmClient, Purpose};
use crate::model::language::SearchLanguage;
use crate::model::route::{LocationBias, RouteMapping};
use crate::provider::PlaceProvider;

const CITY_BIAS_RADIUS_METERS: u32 = 10_000;

/// Never terminal — an LLM failure here falls back to a minimal default
/// mapping rather than ending the pipeline (spec.md §4.6 stage 4).
pub async fn run_route_mapping(
    llm: &LlmClient,
    place_provider: &PlaceProvider,
    query: &str,
    region_code: &str,
    search_language: SearchLanguage,
) -> StageOutcome<RouteMapping> {
    let prompt = format!(
        "Map this search query to a place-provider request. Query: {query}. Region: {region_code}. Language: {}",
        search_language.as_code()
    );
    let schema = route_mapper_schema();

    let (mapping, outcome_kind) = match llm
        .invoke::<RouteMapping>(Purpose::RouteMapper, &prompt, &schema, InvokeOpts::default())
        .await
    {
        Ok(m) => (m, None),
        Err(_) => (
            RouteMapping::fallback_default(query.to_string(), region_code.to_string(), search_language),
            Some("llm_error"),
        ),
    };

    let mapping = install_city_bias(mapping, place_provider, region_code).await;
    match outcome_kind {
        None => StageOutcome::Success(mapping),
        Some(reason) => StageOutcome::FallbackUsed(mapping, reason),
    }
}

/// If `cityText` is present but no `bias`, geocode it and install
/// `{center, radiusMeters=10000}`, also populating `cityCenter` for ranking.
async fn install_city_bias(mut mapping: RouteMapping, place_provider: &PlaceProvider, region_code: &str) -> RouteMapping {
    if mapping.bias.is_some() {
        return mapping;
    }
    let Some(city_text) = mapping.city_text.clone() else { return mapping };

    match place_provider.geocode(&city_text, region_code).await {
        Ok(center) => {
            mapping.bias = Some(LocationBias { center, radius_meters: CITY_BIAS_RADIUS_METERS });
            mapping.city_center = Some(center);
        }
        Err(e) => {
            tracing::warn!(error = %e, city_text, "route_mapping_city_geocode_failed");
        }
    }
    mapping
}
