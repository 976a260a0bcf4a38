//! Typed, env-loaded configuration.
//!
//! Replaces dynamic "config objects" (spec.md §9) with explicit record
//! types per purpose. Defaults live here in code; overrides come from
//! the environment (spec.md §6.3).

use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn from_env() -> Self {
        match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_production(self) -> bool {
        matches!(self, Environment::Production)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Per-LLM-purpose timeout table (spec.md §4.1).
#[derive(Debug, Clone, Copy)]
pub struct LlmPurposeConfig {
    pub gate: Duration,
    pub intent: Duration,
    pub base_filters: Duration,
    pub route_mapper: Duration,
    pub cuisine_enforcer: Duration,
    pub ranking_profile: Duration,
    pub assistant: Duration,
    /// Duration above which a call is logged as `slow=true` (spec.md §4.1).
    pub slow_threshold: Duration,
}

impl Default for LlmPurposeConfig {
    fn default() -> Self {
        Self {
            gate: Duration::from_millis(3500),
            intent: Duration::from_millis(2500),
            base_filters: Duration::from_millis(4500),
            route_mapper: Duration::from_millis(3500),
            cuisine_enforcer: Duration::from_millis(4000),
            ranking_profile: Duration::from_millis(2500),
            assistant: Duration::from_millis(3000),
            slow_threshold: Duration::from_millis(1500),
        }
    }
}

impl LlmPurposeConfig {
    fn from_env() -> Self {
        let d = Self::default();
        Self {
            gate: env_duration_ms("GATE_TIMEOUT_MS", d.gate),
            intent: env_duration_ms("INTENT_TIMEOUT_MS", d.intent),
            base_filters: env_duration_ms("BASE_FILTERS_TIMEOUT_MS", d.base_filters),
            route_mapper: env_duration_ms("ROUTE_MAPPER_TIMEOUT_MS", d.route_mapper),
            cuisine_enforcer: env_duration_ms("FILTER_ENFORCER_TIMEOUT_MS", d.cuisine_enforcer),
            ranking_profile: env_duration_ms("RANKING_PROFILE_TIMEOUT_MS", d.ranking_profile),
            assistant: env_duration_ms("ASSISTANT_TIMEOUT_MS", d.assistant),
            slow_threshold: d.slow_threshold,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum RankingDefaultMode {
    Google,
    LlmScore,
}

#[derive(Debug, Clone, Copy)]
pub struct RankingConfig {
    pub llm_enabled: bool,
    pub default_mode: RankingDefaultMode,
    pub candidate_pool_size: usize,
    pub display_results_size: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            llm_enabled: true,
            default_mode: RankingDefaultMode::Google,
            candidate_pool_size: 30,
            display_results_size: 10,
        }
    }
}

impl RankingConfig {
    fn from_env() -> Self {
        let d = Self::default();
        let llm_enabled = env::var("RANKING_LLM_ENABLED")
            .map(|v| v != "false")
            .unwrap_or(d.llm_enabled);
        let default_mode = match env::var("RANKING_DEFAULT_MODE").as_deref() {
            Ok("LLM_SCORE") => RankingDefaultMode::LlmScore,
            _ => RankingDefaultMode::Google,
        };
        Self {
            llm_enabled,
            default_mode,
            candidate_pool_size: env_usize("CANDIDATE_POOL_SIZE", d.candidate_pool_size),
            display_results_size: env_usize("DISPLAY_RESULTS_SIZE", d.display_results_size),
        }
    }
}

/// Dedup/lifecycle TTL table (spec.md §4.9, §6.3).
#[derive(Debug, Clone, Copy)]
pub struct DedupConfig {
    pub running_max_age: Duration,
    pub success_fresh_window: Duration,
}

impl DedupConfig {
    fn from_env(env: Environment) -> Self {
        let default_running_ms: u64 = match env {
            Environment::Development => 90_000,
            Environment::Production => 300_000,
        };
        Self {
            running_max_age: env_duration_ms(
                "DEDUP_RUNNING_MAX_AGE_MS",
                Duration::from_millis(default_running_ms),
            ),
            success_fresh_window: env_duration_ms(
                "DEDUP_SUCCESS_FRESH_WINDOW_MS",
                Duration::from_millis(5_000),
            ),
        }
    }
}

/// Region → search-language policy (spec.md §4.3), closed map + global default.
#[derive(Debug, Clone)]
pub struct RegionPolicyConfig {
    entries: Vec<(String, &'static str)>,
}

impl Default for RegionPolicyConfig {
    fn default() -> Self {
        let he = ["IL", "PS"];
        let en = ["US", "GB", "CA", "AU", "NZ", "IE"];
        let mut entries = Vec::new();
        for r in he {
            entries.push((r.to_string(), "he"));
        }
        for r in en {
            entries.push((r.to_string(), "en"));
        }
        Self { entries }
    }
}

impl RegionPolicyConfig {
    /// Returns `(language, source)` per spec.md §4.4 resolver contract.
    pub fn resolve(&self, region_code: &str) -> (&'static str, &'static str) {
        let upper = region_code.to_ascii_uppercase();
        for (region, lang) in &self.entries {
            if region == &upper {
                return (*lang, leaked_source(region));
            }
        }
        ("en", "global_default")
    }
}

fn leaked_source(region: &str) -> &'static str {
    // Small closed set of sources; static strings built once per region via a
    // tiny match instead of heap-leaking, keeping this pure and allocation-free.
    match region {
        "IL" => "region_policy:IL",
        "PS" => "region_policy:PS",
        "US" => "region_policy:US",
        "GB" => "region_policy:GB",
        "CA" => "region_policy:CA",
        "AU" => "region_policy:AU",
        "NZ" => "region_policy:NZ",
        "IE" => "region_policy:IE",
        _ => "global_default",
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub redis_url: Option<String>,
    pub redis_fail_closed: bool,
    pub job_ttl: Duration,
    pub ticket_ttl: Duration,
    pub geocode_ttl: Duration,
    pub startup_ping_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            redis_fail_closed: true,
            job_ttl: Duration::from_secs(24 * 3600),
            ticket_ttl: Duration::from_secs(60),
            geocode_ttl: Duration::from_secs(3600),
            startup_ping_timeout: Duration::from_secs(8),
        }
    }
}

impl StoreConfig {
    fn from_env(env: Environment) -> Self {
        let d = Self::default();
        Self {
            redis_url: env::var("REDIS_URL").ok(),
            redis_fail_closed: env::var("REDIS_FAIL_CLOSED")
                .map(|v| v != "false")
                .unwrap_or(env.is_production()),
            ..d
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub log_format: LogFormat,
    pub port: u16,
    pub llm: LlmPurposeConfig,
    pub ranking: RankingConfig,
    pub dedup: DedupConfig,
    pub region_policy: RegionPolicyConfig,
    pub store: StoreConfig,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let environment = Environment::from_env();
        let log_format = match environment {
            Environment::Production => LogFormat::Json,
            Environment::Development => LogFormat::Pretty,
        };
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        Ok(Self {
            environment,
            log_format,
            port,
            llm: LlmPurposeConfig::from_env(),
            ranking: RankingConfig::from_env(),
            dedup: DedupConfig::from_env(environment),
            region_policy: RegionPolicyConfig::default(),
            store: StoreConfig::from_env(environment),
        })
    }
}

fn env_duration_ms(key: &str, default: Duration) -> Duration {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_policy_known_region() {
        let p = RegionPolicyConfig::default();
        assert_eq!(p.resolve("IL"), ("he", "region_policy:IL"));
        assert_eq!(p.resolve("us"), ("en", "region_policy:US"));
    }

    #[test]
    fn region_policy_unknown_region_falls_back_to_global_default() {
        let p = RegionPolicyConfig::default();
        assert_eq!(p.resolve("FR"), ("en", "global_default"));
    }

    #[test]
    fn dedup_config_running_ttl_differs_dev_vs_prod() {
        let dev = DedupConfig::from_env(Environment::Development);
        let prod = DedupConfig::from_env(Environment::Production);
        // Only valid when no explicit env override is set, which is the case in CI.
        if env::var("DEDUP_RUNNING_MAX_AGE_MS").is_err() {
            assert_eq!(dev.running_max_age, Duration::from_millis(90_000));
            assert_eq!(prod.running_max_age, Duration::from_millis(300_000));
        }
    }
}
