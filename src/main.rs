//! Process entry point: loads configuration, wires C1-C15 together, and
//! serves the HTTP + socket surface on one axum `Router` (spec.md §5, §6).

use place_search_core::clock::{SharedClock, SystemClock};
use place_search_core::config::Config;
use place_search_core::http::{self, AppState};
use place_search_core::llm::{HttpLlmTransport, LlmClient};
use place_search_core::logging;
use place_search_core::metrics::Metrics;
use place_search_core::pipeline;
use place_search_core::provider::{HttpPlaceProviderTransport, PlaceProvider};
use place_search_core::pubsub::SubscriptionRegistry;
use place_search_core::store::memory::MemoryJobStore;
use place_search_core::store::redis_store::RedisJobStore;
use place_search_core::store::JobStore;
use place_search_core::ticket_store::memory::MemoryTicketStore;
use place_search_core::ticket_store::redis_store::RedisTicketStore;
use place_search_core::ticket_store::TicketStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let config = Config::from_env().unwrap_or_else(|e| {
        eprintln!("config error: {e}");
        std::process::exit(1);
    });
    logging::init(config.log_format);
    info!(environment = ?config.environment, port = config.port, "place_search_core_starting");

    let clock: SharedClock = Arc::new(SystemClock);
    let metrics = Arc::new(Metrics::new());

    let (store, memory_store): (Arc<dyn JobStore>, Option<Arc<MemoryJobStore>>) = match &config.store.redis_url {
        Some(url) => match RedisJobStore::connect(url, clock.clone(), config.store.job_ttl).await {
            Ok(s) => (Arc::new(s), None),
            Err(e) => {
                error!(error = %e, "redis_job_store_connect_failed");
                std::process::exit(1);
            }
        },
        None => {
            let mem = Arc::new(MemoryJobStore::new(clock.clone(), config.store.job_ttl));
            (mem.clone(), Some(mem))
        }
    };

    let ticket_store: Arc<dyn TicketStore> = match &config.store.redis_url {
        Some(url) => match RedisTicketStore::connect(url, clock.clone()).await {
            Ok(s) => Arc::new(s),
            Err(e) => {
                error!(error = %e, "redis_ticket_store_connect_failed");
                std::process::exit(1);
            }
        },
        None => Arc::new(MemoryTicketStore::new(clock.clone())),
    };

    // Startup readiness probe (spec.md §5): wait up to 8s for the store to
    // answer a ping. Production exits non-zero on failure; development
    // continues degraded (GET /ready will report not-ready).
    match tokio::time::timeout(config.store.startup_ping_timeout, store.ping()).await {
        Ok(Ok(())) => info!("store_ping_ok"),
        Ok(Err(e)) => {
            warn!(error = %e, "store_ping_failed");
            if config.environment.is_production() {
                std::process::exit(1);
            }
        }
        Err(_) => {
            warn!(timeout_ms = config.store.startup_ping_timeout.as_millis() as u64, "store_ping_timed_out");
            if config.environment.is_production() {
                std::process::exit(1);
            }
        }
    }

    if let Some(mem) = &memory_store {
        mem.spawn_eviction_task();
    }

    let llm_base_url = std::env::var("LLM_BASE_URL").unwrap_or_else(|_| "http://localhost:4000".to_string());
    let llm_api_key = std::env::var("LLM_API_KEY").unwrap_or_default();
    let llm = Arc::new(LlmClient::new(Box::new(HttpLlmTransport::new(llm_base_url, llm_api_key)), config.llm));

    let place_base_url = std::env::var("PLACE_PROVIDER_BASE_URL").unwrap_or_else(|_| "https://places.googleapis.com".to_string());
    let place_api_key = std::env::var("PLACE_PROVIDER_API_KEY").unwrap_or_default();
    let place_provider = Arc::new(PlaceProvider::new(
        Box::new(HttpPlaceProviderTransport::new(place_base_url, place_api_key)),
        config.store.geocode_ttl,
        "v1",
    ));

    let registry = Arc::new(SubscriptionRegistry::new(clock.clone()));

    let pipeline_deps = Arc::new(pipeline::PipelineDeps {
        store: store.clone(),
        llm,
        place_provider,
        registry: registry.clone(),
        region_policy: config.region_policy.clone(),
        ranking: config.ranking,
    });

    let state = Arc::new(AppState {
        store,
        ticket_store,
        registry,
        pipeline_deps,
        dedup: config.dedup,
        ranking: config.ranking,
        region_policy: config.region_policy,
        clock,
        metrics,
        ticket_ttl: config.store.ticket_ttl,
    });

    let app = http::build_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap_or_else(|e| {
        eprintln!("failed to bind {addr}: {e}");
        std::process::exit(1);
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("shutdown_signal_received");
        })
        .await
        .unwrap_or_else(|e| {
            eprintln!("server error: {e}");
            std::process::exit(1);
        });
}
