//! Stage 2 — Intent (spec.md §4.6): extract `{reason, cityText?, blocksSearch?}`.

use crate::errors::{JobError, StageOutcome};
use crate::llm::schema::intent_schema;
use crate::llm::{InvokeOpts, LlmClient, Purpose};
use crate::model::intent::IntentDecision;

pub async fn run_intent(llm: &LlmClient, query: &str) -> StageOutcome<IntentDecision> {
    let prompt = format!("Extract the reason, any explicitly-mentioned city, and whether this query blocks search: {query}");
    let schema = intent_schema();
    match llm.invoke(Purpose::Intent, &prompt, &schema, InvokeOpts::default()).await {
        Ok(decision) => StageOutcome::Success(decision),
        Err(e) => StageOutcome::Terminal(JobError::from_llm_error(&e)),
    }
}
