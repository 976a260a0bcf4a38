//! Shared test doubles and harness wiring for the end-to-end scenarios in
//! `tests/`. Fakes implement the same `LlmTransport`/`PlaceProviderTransport`
//! boundaries the process wires an HTTP transport into at runtime (see
//! `main.rs`), so the pipeline and HTTP surface run unmodified against them.

use async_trait::async_trait;
use place_search_core::clock::{FakeClock, SharedClock};
use place_search_core::config::{DedupConfig, RankingConfig, RankingDefaultMode, RegionPolicyConfig};
use place_search_core::http::AppState;
use place_search_core::llm::{InvokeOpts, LlmClient, LlmError, LlmTransport};
use place_search_core::metrics::Metrics;
use place_search_core::model::place::Place;
use place_search_core::model::request::Coordinate;
use place_search_core::pipeline::PipelineDeps;
use place_search_core::provider::{PlaceProvider, PlaceProviderTransport, ProviderError, TextSearchRequest};
use place_search_core::pubsub::SubscriptionRegistry;
use place_search_core::store::memory::MemoryJobStore;
use place_search_core::store::JobStore;
use place_search_core::ticket_store::memory::MemoryTicketStore;
use place_search_core::ticket_store::TicketStore;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Calls recorded by [`FakePlaceProviderTransport`], kept alongside the
/// provider so a test can inspect what the pipeline actually sent it.
#[derive(Default)]
pub struct RecordedProviderCalls {
    pub text_search_requests: Mutex<Vec<TextSearchRequest>>,
    pub geocode_calls: Mutex<Vec<(String, String)>>,
}

pub struct FakePlaceProviderTransport {
    pub places: Vec<Place>,
    pub geocode_result: Coordinate,
    pub recorded: Arc<RecordedProviderCalls>,
}

#[async_trait]
impl PlaceProviderTransport for FakePlaceProviderTransport {
    async fn text_search_raw(&self, req: &TextSearchRequest) -> Result<Vec<Place>, ProviderError> {
        self.recorded.text_search_requests.lock().unwrap().push(req.clone());
        Ok(self.places.clone())
    }

    async fn geocode_raw(&self, city_text: &str, region_code: &str) -> Result<Coordinate, ProviderError> {
        self.recorded.geocode_calls.lock().unwrap().push((city_text.to_string(), region_code.to_string()));
        Ok(self.geocode_result)
    }
}

/// Scripts every LLM purpose's response by matching on the prompt text each
/// stage builds (see `pipeline::{gate,intent,filters,route,cuisine,assistant}`
/// and `ranking::profile`). Fixed happy-path answers unless overridden.
pub struct FakeLlmTransport {
    pub gate_accepts: bool,
    pub blocks_search: bool,
    pub city_text: Option<String>,
    pub required_terms: Vec<String>,
}

impl Default for FakeLlmTransport {
    fn default() -> Self {
        Self { gate_accepts: true, blocks_search: false, city_text: None, required_terms: Vec::new() }
    }
}

#[async_trait]
impl LlmTransport for FakeLlmTransport {
    async fn call_raw(&self, _model: &str, prompt: &str, _schema: &Value, _opts: &InvokeOpts) -> Result<Value, LlmError> {
        if prompt.starts_with("Is the following a food/place search query?") {
            return Ok(json!({"isFoodOrPlaceQuery": self.gate_accepts, "reason": "looks_like_food_query"}));
        }
        if prompt.starts_with("Extract the reason, any explicitly-mentioned city") {
            let reason = if self.city_text.is_some() { "explicit_city_mentioned" } else { "default_textsearch" };
            return Ok(json!({"reason": reason, "cityText": self.city_text, "blocksSearch": self.blocks_search}));
        }
        if prompt.starts_with("Extract open-state") {
            return Ok(json!({"openState": "any", "language": "en", "priceIntent": "any", "minRatingBucket": 0.0}));
        }
        if prompt.starts_with("Map this search query to a place-provider request.") {
            return Ok(json!({
                "providerMethod": "textSearch",
                "textQuery": "restaurants near me",
                "region": "US",
                "language": "en",
                "bias": null,
                "cityText": self.city_text,
                "cityCenter": null,
                "requiredTerms": self.required_terms,
                "preferredTerms": [],
                "strictness": "RELAX_IF_EMPTY",
                "typeHint": "any",
            }));
        }
        if prompt.starts_with("Given required terms") {
            return Ok(json!({"keptPlaceIds": [], "relaxationApplied": null}));
        }
        if prompt.starts_with("Choose a ranking profile") {
            return Ok(json!({"mode": "BALANCED"}));
        }
        if let Some(rest) = prompt.strip_prefix("Compose a ") {
            let kind_token = rest.split(' ').next().unwrap_or("Summary");
            let (kind, blocks) = match kind_token {
                "GateFail" => ("GATE_FAIL", true),
                "Clarify" => ("CLARIFY", true),
                "NudgeRefine" => ("NUDGE_REFINE", false),
                _ => ("SUMMARY", false),
            };
            return Ok(json!({"kind": kind, "text": format!("assistant message ({kind_token})"), "blocksSearch": blocks}));
        }
        Err(LlmError::SchemaInvalid(format!("fake llm transport has no script for prompt: {prompt}")))
    }
}

fn sample_places() -> Vec<Place> {
    vec![
        Place {
            id: "place-1".into(),
            name: "Sample Bistro".into(),
            rating: Some(4.5),
            user_rating_count: Some(120),
            address: Some("1 Example St".into()),
            types: vec!["restaurant".into()],
            coordinate: Some(Coordinate { lat: 40.71, lng: -74.0 }),
            price_level: Some(2),
            open_now: Some(true),
        },
        Place {
            id: "place-2".into(),
            name: "Second Spot".into(),
            rating: Some(4.0),
            user_rating_count: Some(80),
            address: Some("2 Example St".into()),
            types: vec!["cafe".into()],
            coordinate: Some(Coordinate { lat: 40.72, lng: -74.01 }),
            price_level: Some(1),
            open_now: Some(true),
        },
    ]
}

pub struct Harness {
    pub state: Arc<AppState>,
    pub clock: Arc<FakeClock>,
    pub provider_calls: Arc<RecordedProviderCalls>,
}

/// Wires one `AppState` against in-memory stores and the fakes above — the
/// same shape `main.rs` assembles, minus the HTTP/Redis transports.
pub fn build_harness(llm_transport: FakeLlmTransport, geocode_result: Coordinate) -> Harness {
    let fake_clock = Arc::new(FakeClock::new(1_700_000_000_000));
    let clock: SharedClock = fake_clock.clone();

    let provider_calls = Arc::new(RecordedProviderCalls::default());
    let place_transport = FakePlaceProviderTransport {
        places: sample_places(),
        geocode_result,
        recorded: provider_calls.clone(),
    };
    let place_provider = Arc::new(PlaceProvider::new(Box::new(place_transport), Duration::from_secs(3600), "v1"));

    let llm = Arc::new(LlmClient::new(Box::new(llm_transport), Default::default()));

    let store: Arc<dyn JobStore> = Arc::new(MemoryJobStore::new(clock.clone(), Duration::from_secs(86_400)));
    let ticket_store: Arc<dyn TicketStore> = Arc::new(MemoryTicketStore::new(clock.clone()));
    let registry = Arc::new(SubscriptionRegistry::new(clock.clone()));

    let region_policy = RegionPolicyConfig::default();
    let ranking = RankingConfig { llm_enabled: true, default_mode: RankingDefaultMode::Google, candidate_pool_size: 30, display_results_size: 10 };
    let dedup = DedupConfig { running_max_age: Duration::from_millis(90_000), success_fresh_window: Duration::from_millis(5_000) };

    let pipeline_deps = Arc::new(PipelineDeps {
        store: store.clone(),
        llm,
        place_provider,
        registry: registry.clone(),
        region_policy: region_policy.clone(),
        ranking,
    });

    let state = Arc::new(AppState {
        store,
        ticket_store,
        registry,
        pipeline_deps,
        dedup,
        ranking,
        region_policy,
        clock,
        metrics: Arc::new(Metrics::new()),
        ticket_ttl: Duration::from_secs(60),
    });

    Harness { state, clock: fake_clock, provider_calls }
}

/// Polls `GET`-equivalent store reads until the job reaches a terminal
/// status, or panics after a generous real-time budget. The fakes never
/// touch the network, so this normally resolves in well under a second.
pub async fn wait_for_terminal(store: &Arc<dyn JobStore>, request_id: &str) -> place_search_core::model::JobRecord {
    for _ in 0..200 {
        if let Some(job) = store.get_job(request_id).await.unwrap() {
            if job.status.is_terminal() {
                return job;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("job {request_id} did not reach a terminal status in time");
}
