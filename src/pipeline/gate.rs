//! Stage 1 — Gate (spec.md §4.6): is this even a food/place query?

use crate::errors::{JobError, StageOutcome};
use crate::llm::schema::gate_schema;
use crate::llm::{InvokeOpts, LlmClient, Purpose};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateDecision {
    pub is_food_or_place_query: bool,
    pub reason: String,
}

pub async fn run_gate(llm: &LlmClient, query: &str) -> StageOutcome<GateDecision> {
    let prompt = format!("Is the following a food/place search query? Query: {query}");
    let schema = gate_schema();
    match llm.invoke(Purpose::Gate, &prompt, &schema, InvokeOpts::default()).await {
        Ok(decision) => StageOutcome::Success(decision),
        Err(e) => StageOutcome::Terminal(JobError::from_llm_error(&e)),
    }
}
