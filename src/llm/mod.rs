//! C3 — LLM client: timeout-bounded, schema-validated, retried calls to an
//! external model provider.

pub mod retry;
pub mod schema;

use crate::config::LlmPurposeConfig;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::{Duration, Instant};

/// Closed set of call sites (spec.md §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Purpose {
    Gate,
    Intent,
    BaseFilters,
    RouteMapper,
    CuisineEnforcer,
    RankingProfile,
    Assistant,
}

impl Purpose {
    pub fn as_str(self) -> &'static str {
        match self {
            Purpose::Gate => "gate",
            Purpose::Intent => "intent",
            Purpose::BaseFilters => "baseFilters",
            Purpose::RouteMapper => "routeMapper",
            Purpose::CuisineEnforcer => "cuisineEnforcer",
            Purpose::RankingProfile => "rankingProfile",
            Purpose::Assistant => "assistant",
        }
    }

    pub fn timeout(self, cfg: &LlmPurposeConfig) -> Duration {
        match self {
            Purpose::Gate => cfg.gate,
            Purpose::Intent => cfg.intent,
            Purpose::BaseFilters => cfg.base_filters,
            Purpose::RouteMapper => cfg.route_mapper,
            Purpose::CuisineEnforcer => cfg.cuisine_enforcer,
            Purpose::RankingProfile => cfg.ranking_profile,
            Purpose::Assistant => cfg.assistant,
        }
    }

    fn default_model(self) -> &'static str {
        match self {
            Purpose::Gate | Purpose::Intent | Purpose::BaseFilters => "fast-tier",
            Purpose::RouteMapper | Purpose::CuisineEnforcer | Purpose::RankingProfile => {
                "structured-tier"
            }
            Purpose::Assistant => "conversational-tier",
        }
    }
}

/// Error classification (spec.md §4.1).
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("abort_timeout: {purpose} exceeded {elapsed_ms}ms")]
    AbortTimeout { purpose: &'static str, elapsed_ms: u64 },
    #[error("schema_invalid: {0}")]
    SchemaInvalid(String),
    #[error("provider_5xx: {status}")]
    Provider5xx { status: u16 },
    #[error("provider_4xx_auth_or_config: {status} {message}")]
    Provider4xxFatal { status: u16, message: String },
}

impl LlmError {
    pub fn retriable(&self) -> bool {
        matches!(self, LlmError::AbortTimeout { .. } | LlmError::Provider5xx { .. })
    }
}

pub struct InvokeOpts {
    pub system_prompt: Option<String>,
    pub temperature: Option<f32>,
}

impl Default for InvokeOpts {
    fn default() -> Self {
        Self { system_prompt: None, temperature: Some(0.0) }
    }
}

/// Raw transport: one attempt, no retry/timeout bookkeeping (that lives in
/// [`invoke`]). Swappable for tests.
#[async_trait]
pub trait LlmTransport: Send + Sync {
    async fn call_raw(
        &self,
        model: &str,
        prompt: &str,
        schema: &Value,
        opts: &InvokeOpts,
    ) -> Result<Value, LlmError>;
}

/// HTTP transport over a generic chat-completions-style endpoint. Request/
/// response shape grounded on the pack's `d9d2df7f` LLM gateway
/// (`CompletionRequest`/`CompletionResponse`, Anthropic Messages API shape).
pub struct HttpLlmTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpLlmTransport {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.into(), api_key: api_key.into() }
    }
}

#[async_trait]
impl LlmTransport for HttpLlmTransport {
    async fn call_raw(
        &self,
        model: &str,
        prompt: &str,
        schema: &Value,
        opts: &InvokeOpts,
    ) -> Result<Value, LlmError> {
        let body = serde_json::json!({
            "model": model,
            "messages": [{"role": "user", "content": prompt}],
            "system": opts.system_prompt,
            "temperature": opts.temperature,
            "response_schema": schema,
        });
        let resp = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::AbortTimeout { purpose: "transport", elapsed_ms: 0 }
                } else {
                    LlmError::Provider5xx { status: 0 }
                }
            })?;

        let status = resp.status();
        if status.is_server_error() {
            return Err(LlmError::Provider5xx { status: status.as_u16() });
        }
        if status.is_client_error() {
            let message = resp.text().await.unwrap_or_default();
            return Err(LlmError::Provider4xxFatal { status: status.as_u16(), message });
        }
        resp.json::<Value>().await.map_err(|e| LlmError::SchemaInvalid(e.to_string()))
    }
}

/// The public, purpose-aware, schema-validated, retried LLM client
/// (spec.md §4.1 `invoke(purpose, prompt, jsonSchema, opts) -> parsedObject | error`).
pub struct LlmClient {
    transport: Box<dyn LlmTransport>,
    config: LlmPurposeConfig,
}

impl LlmClient {
    pub fn new(transport: Box<dyn LlmTransport>, config: LlmPurposeConfig) -> Self {
        Self { transport, config }
    }

    pub async fn invoke<T: DeserializeOwned>(
        &self,
        purpose: Purpose,
        prompt: &str,
        schema: &Value,
        opts: InvokeOpts,
    ) -> Result<T, LlmError> {
        let timeout = purpose.timeout(&self.config);
        let model = purpose.default_model();

        let mut attempt = 0u32;
        loop {
            let started = Instant::now();
            tracing::debug!(purpose = purpose.as_str(), attempt, "llm_start");

            let call = self.transport.call_raw(model, prompt, schema, &opts);
            let outcome = tokio::time::timeout(timeout, call).await;

            let elapsed = started.elapsed();
            let slow = elapsed >= self.config.slow_threshold;
            let result = match outcome {
                Ok(inner) => inner,
                Err(_) => Err(LlmError::AbortTimeout {
                    purpose: purpose.as_str(),
                    elapsed_ms: elapsed.as_millis() as u64,
                }),
            };

            match &result {
                Ok(_) => {
                    if slow {
                        tracing::info!(
                            purpose = purpose.as_str(),
                            duration_ms = elapsed.as_millis() as u64,
                            slow = true,
                            "llm_end"
                        );
                    } else {
                        tracing::debug!(
                            purpose = purpose.as_str(),
                            duration_ms = elapsed.as_millis() as u64,
                            "llm_end"
                        );
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        purpose = purpose.as_str(),
                        duration_ms = elapsed.as_millis() as u64,
                        error = %e,
                        attempt,
                        "llm_end"
                    );
                }
            }

            match result {
                Ok(value) => {
                    return serde_json::from_value(value)
                        .map_err(|e| LlmError::SchemaInvalid(e.to_string()));
                }
                Err(e) if e.retriable() && attempt < retry::MAX_EXTRA_ATTEMPTS => {
                    attempt += 1;
                    tokio::time::sleep(retry::backoff_delay(attempt)).await;
                    continue;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
