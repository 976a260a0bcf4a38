//! Stage 9 — Assistant message (spec.md §4.6): compose CLARIFY/SUMMARY/
//! GATE_FAIL/NUDGE_REFINE, enforcing the SUMMARY-never-blocks invariant.

use crate::errors::StageOutcome;
use crate::llm::schema::assistant_schema;
use crate::llm::{InvokeOpts, LlmClient, Purpose};
use crate::model::result::{AssistantKind, AssistantMessage};

/// Never terminal — an LLM failure here falls back to a templated message
/// rather than blocking the pipeline (spec.md §4.6 stage 9).
pub async fn compose_assistant_message(
    llm: &LlmClient,
    query: &str,
    assistant_language: &str,
    kind_hint: AssistantKind,
    result_count: usize,
) -> StageOutcome<AssistantMessage> {
    let prompt = format!(
        "Compose a {kind_hint:?} message in language {assistant_language} for query \"{query}\" given {result_count} results."
    );
    let schema = assistant_schema();

    match llm.invoke::<AssistantMessage>(Purpose::Assistant, &prompt, &schema, InvokeOpts::default()).await {
        Ok(msg) => StageOutcome::Success(msg.enforce_summary_invariant()),
        Err(_) => StageOutcome::FallbackUsed(default_message(kind_hint, result_count), "llm_error"),
    }
}

fn default_message(kind: AssistantKind, result_count: usize) -> AssistantMessage {
    let text = match kind {
        AssistantKind::Summary if result_count > 0 => format!("Found {result_count} places matching your search."),
        AssistantKind::Summary => "No places matched your search.".to_string(),
        AssistantKind::Clarify => "Could you clarify your search?".to_string(),
        AssistantKind::GateFail => "That doesn't look like a food or place search.".to_string(),
        AssistantKind::NudgeRefine => "Try narrowing your search for better results.".to_string(),
    };
    AssistantMessage { kind, text, blocks_search: matches!(kind, AssistantKind::Clarify | AssistantKind::GateFail) }
        .enforce_summary_invariant()
}
