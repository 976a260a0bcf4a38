//! C12 — Pipeline orchestrator (spec.md §4.6). Runs the ten search stages
//! sequentially in a task detached from the HTTP responder, writing
//! milestones/result/status to the job store (C5) and publishing progress
//! through the subscription registry (C7/C8). Every publish is wrapped in a
//! local error barrier (spec.md §4.11): a push failure is logged and never
//! interrupts the pipeline.

mod assistant;
mod cuisine;
mod filters;
mod gate;
mod intent;
mod route;

use crate::config::{RankingConfig, RegionPolicyConfig};
use crate::errors::{ErrorKind, JobError, StageOutcome};
use crate::llm::LlmClient;
use crate::model::job::JobStatus;
use crate::model::language::LanguageContext;
use crate::model::place::Place;
use crate::model::request::SearchRequest;
use crate::model::result::{AssistantKind, AssistantMessage, DistanceOrigin, ResultMeta, SearchResult};
use crate::provider::{LocationBias as ProviderLocationBias, PlaceProvider, TextSearchRequest};
use crate::pubsub::{PushEventBody, SubscriptionRegistry};
use crate::ranking::{log_ranking_events, rank, select_profile, RankingInput};
use crate::resolver::{resolve_distance_origin, resolve_language_context, LanguageResolverInput};
use crate::store::JobStore;
use std::sync::Arc;

const CHANNEL: &str = "search";
const FIELD_MASK: &str = "places.id,places.displayName,places.rating,places.userRatingCount,places.priceLevel,places.currentOpeningHours,places.location,places.formattedAddress,places.types";

/// Everything a pipeline run needs, shared across concurrently-executing jobs.
pub struct PipelineDeps {
    pub store: Arc<dyn JobStore>,
    pub llm: Arc<LlmClient>,
    pub place_provider: Arc<PlaceProvider>,
    pub registry: Arc<SubscriptionRegistry>,
    pub region_policy: RegionPolicyConfig,
    pub ranking: RankingConfig,
}

/// Runs one search end to end. Intended to be spawned with `tokio::spawn`
/// right after `createJob` succeeds; never panics, never returns an error —
/// every failure path ends in a DONE_FAILED job record.
pub async fn run(deps: Arc<PipelineDeps>, request: SearchRequest, request_id: String) {
    let language_ctx = match resolve_language_context(
        LanguageResolverInput {
            region_code: &request.region_code,
            ui_language: request.ui_language.as_deref(),
            model_detected_language: None,
            model_confidence: 0.0,
        },
        &deps.region_policy,
    ) {
        Ok(ctx) => ctx,
        Err(e) => {
            finalize_failed(&deps, &request_id, JobError::new(ErrorKind::LlmFatal, e.to_string())).await;
            return;
        }
    };

    // Stage 1 — Gate.
    let gate = match gate::run_gate(&deps.llm, &request.query).await.into_value_or_log("gate") {
        Ok(g) => g,
        Err(e) => {
            finalize_failed(&deps, &request_id, e).await;
            return;
        }
    };
    set_progress(&deps, &request_id, 25).await;
    publish_progress(&deps, &request_id, 25, "gate").await;
    if !gate.is_food_or_place_query {
        tracing::info!(request_id, reason = gate.reason, "gate_rejected_query");
        finalize_terminal(&deps, &request_id, &language_ctx, AssistantKind::GateFail).await;
        return;
    }

    // Stage 2 — Intent.
    let intent = match intent::run_intent(&deps.llm, &request.query).await.into_value_or_log("intent") {
        Ok(i) => i,
        Err(e) => {
            finalize_failed(&deps, &request_id, e).await;
            return;
        }
    };
    set_progress(&deps, &request_id, 40).await;
    publish_progress(&deps, &request_id, 40, "intent").await;
    if intent.blocks_search {
        tracing::info!(request_id, reason = intent.reason, "intent_blocks_search");
        finalize_terminal(&deps, &request_id, &language_ctx, AssistantKind::Clarify).await;
        return;
    }

    // Stage 3 — Base filters. FallbackUsed can't be terminal here, so the
    // `Err` arm is unreachable, but we still route through the common
    // dispatcher for a uniform stage-outcome story.
    let base_filters = match filters::extract_base_filters(&deps.llm, &request.query).await.into_value_or_log("base_filters") {
        Ok(f) => f,
        Err(e) => {
            finalize_failed(&deps, &request_id, e).await;
            return;
        }
    };

    // Stage 4 — Route mapping (falls back to a minimal default internally).
    let route_mapping = match route::run_route_mapping(
        &deps.llm,
        &deps.place_provider,
        &request.query,
        &request.region_code,
        language_ctx.search_language,
    )
    .await
    .into_value_or_log("route_mapping")
    {
        Ok(m) => m,
        Err(e) => {
            finalize_failed(&deps, &request_id, e).await;
            return;
        }
    };

    // Stage 5 — Provider call.
    let text_search_req = TextSearchRequest {
        text_query: route_mapping.text_query.clone(),
        region_code: route_mapping.region.clone(),
        language_code: route_mapping.language.as_code().to_string(),
        location_bias: route_mapping.bias.as_ref().map(|b| ProviderLocationBias { center: b.center, radius_meters: b.radius_meters }),
        field_mask: FIELD_MASK,
    };
    let provider_outcome = match deps.place_provider.text_search(text_search_req).await {
        Ok(places) => StageOutcome::Success(places),
        Err(e) => StageOutcome::Terminal(JobError::from_provider_error(&e)),
    };
    let fetched_places = match provider_outcome.into_value_or_log("provider") {
        Ok(places) => places,
        Err(e) => {
            finalize_failed(&deps, &request_id, e).await;
            return;
        }
    };
    let fetched_count = fetched_places.len();
    set_progress(&deps, &request_id, 60).await;
    publish_progress(&deps, &request_id, 60, "provider").await;

    // Stage 6 — Cuisine enforcement (non-blocking on LLM failure).
    let enforced_places = match cuisine::enforce_cuisine(&deps.llm, &route_mapping, fetched_places)
        .await
        .into_value_or_log("cuisine_enforcement")
    {
        Ok(places) => places,
        Err(e) => {
            finalize_failed(&deps, &request_id, e).await;
            return;
        }
    };

    // Stage 7 — Post-constraints.
    let constrained_places = filters::apply_post_constraints(enforced_places, &base_filters);
    set_progress(&deps, &request_id, 75).await;
    publish_progress(&deps, &request_id, 75, "post_constraints").await;

    // Stage 8 — Ranking.
    let distance_decision = resolve_distance_origin(&intent, request.user_location, &request.region_code, &deps.place_provider).await;
    let profile = select_profile(&deps.llm, &deps.ranking, &request.query).await;
    let ranked = rank(RankingInput {
        places: &constrained_places,
        profile: &profile,
        distance_origin: distance_decision.origin,
        ref_lat_lng: distance_decision.reference,
    });
    log_ranking_events(&constrained_places, &ranked, distance_decision.origin, distance_decision.reference, distance_decision.city_text.as_deref(), &intent.reason);
    let display_places: Vec<Place> = ranked.into_iter().take(deps.ranking.display_results_size).map(|r| r.place).collect();
    set_progress(&deps, &request_id, 90).await;
    publish_progress(&deps, &request_id, 90, "ranking").await;

    // Stage 9 — Assistant message.
    let assistant_kind = if display_places.is_empty() { AssistantKind::NudgeRefine } else { AssistantKind::Summary };
    let assistant = match assistant::compose_assistant_message(
        &deps.llm,
        &request.query,
        &language_ctx.assistant_language,
        assistant_kind,
        display_places.len(),
    )
    .await
    .into_value_or_log("assistant_message")
    {
        Ok(msg) => msg,
        Err(e) => {
            finalize_failed(&deps, &request_id, e).await;
            return;
        }
    };

    // Stage 10 — Finalize.
    let ranking_profile_name = format!("{:?}", profile.name).to_ascii_uppercase();
    finalize_with_message(
        &deps,
        &request_id,
        display_places,
        assistant,
        distance_decision.origin,
        distance_decision.reference,
        fetched_count,
        &ranking_profile_name,
    )
    .await;
}

async fn set_progress(deps: &PipelineDeps, request_id: &str, progress: u8) {
    if let Err(e) = deps.store.set_status(request_id, JobStatus::Running, Some(progress)).await {
        tracing::warn!(request_id, error = %e, "store_error");
    }
}

/// Push-isolation barrier (spec.md §4.11): publish failures never propagate.
async fn publish_progress(deps: &PipelineDeps, request_id: &str, progress: u8, stage: &str) {
    deps.registry
        .publish_to_channel(CHANNEL, request_id, PushEventBody::Progress { progress, stage: stage.to_string() })
        .await;
}

async fn publish_terminal(deps: &PipelineDeps, request_id: &str, body: PushEventBody) {
    let summary = deps.registry.publish_to_channel(CHANNEL, request_id, body).await;
    if summary.failed > 0 {
        tracing::warn!(request_id, failed = summary.failed, "ws_publish_error");
    }
}

/// Zero-result non-failure terminal (gate rejection, clarify): no places
/// were fetched, so there's nothing to rank and no distance origin applies.
async fn finalize_terminal(deps: &PipelineDeps, request_id: &str, language_ctx: &LanguageContext, kind: AssistantKind) {
    let assistant = assistant::compose_assistant_message(&deps.llm, "", &language_ctx.assistant_language, kind, 0)
        .await
        .into_value_or_log("assistant_message")
        .expect("assistant stage never returns Terminal");
    finalize_with_message(deps, request_id, vec![], assistant, DistanceOrigin::None, None, 0, "GOOGLE").await;
}

async fn finalize_with_message(
    deps: &PipelineDeps,
    request_id: &str,
    places: Vec<Place>,
    assistant: AssistantMessage,
    distance_origin: DistanceOrigin,
    distance_ref: Option<crate::model::request::Coordinate>,
    fetched_count: usize,
    ranking_profile: &str,
) {
    let result = SearchResult {
        meta: ResultMeta {
            fetched_count,
            returned_count: places.len(),
            ranking_profile: ranking_profile.to_string(),
            distance_origin,
            distance_ref,
            contracts_version: crate::model::result::CONTRACTS_VERSION.to_string(),
        },
        places,
        assistant,
    };

    if let Err(e) = deps.store.set_result(request_id, result.clone()).await {
        tracing::warn!(request_id, error = %e, "store_error");
    }
    if let Err(e) = deps.store.set_status(request_id, JobStatus::DoneSuccess, Some(100)).await {
        tracing::warn!(request_id, error = %e, "store_error");
    }
    publish_terminal(deps, request_id, PushEventBody::Done { result }).await;
}

async fn finalize_failed(deps: &PipelineDeps, request_id: &str, error: JobError) {
    let code = error.code.clone();
    let message = error.message.clone();
    if let Err(e) = deps.store.set_error(request_id, error).await {
        tracing::warn!(request_id, error = %e, "store_error");
    }
    if let Err(e) = deps.store.set_status(request_id, JobStatus::DoneFailed, None).await {
        tracing::warn!(request_id, error = %e, "store_error");
    }
    publish_terminal(deps, request_id, PushEventBody::Error { code, message }).await;
}
