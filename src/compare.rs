//! Comparison orchestrator: sequential fan-out with per-model isolation.
//!
//! Sends one prompt to every model in the lineup, strictly in order, and
//! folds each call into a result entry. A failing call is recorded on its
//! own entry and never interrupts the remaining models; only a moderation
//! rejection halts a submission before any model is queried.

use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};

use crate::openai::ChatApi;
use crate::types::{
    ChatMessage, CompareError, ComparisonRequest, ComparisonResult, GenerationParams, ModelSpec,
    Outcome,
};

/// Fan the request's prompt out across its lineup, in order.
///
/// Returns one result per model, in lineup order, regardless of which
/// calls succeed or fail.
pub async fn compare(
    client: &dyn ChatApi,
    request: &ComparisonRequest,
    params: &GenerationParams,
) -> Vec<ComparisonResult> {
    let messages = [ChatMessage::user(request.prompt.as_str())];
    let mut results = Vec::with_capacity(request.models.len());

    for (idx, model) in request.models.iter().enumerate() {
        info!(
            model = %model.id,
            position = idx + 1,
            lineup = request.models.len(),
            "Querying model"
        );
        results.push(run_one(client, model, &messages, params).await);
    }

    results
}

/// Run the moderation gate, then the comparison.
///
/// A flagged prompt short-circuits with `ModerationRejected` before any
/// model is queried; so does a moderation call that itself fails. With
/// the gate disabled, this is just `compare`.
pub async fn moderated_compare(
    client: &dyn ChatApi,
    request: &ComparisonRequest,
    params: &GenerationParams,
    moderation_enabled: bool,
) -> Result<Vec<ComparisonResult>, CompareError> {
    if moderation_enabled {
        let verdict = client.moderate(&request.prompt).await?;
        if verdict.flagged {
            warn!(
                categories = ?verdict.categories,
                "Prompt flagged by moderation - comparison aborted"
            );
            return Err(CompareError::ModerationRejected { categories: verdict.categories });
        }
    }

    Ok(compare(client, request, params).await)
}

/// Issue a single model call and fold its outcome into a result entry.
///
/// Token usage comes from the provider's usage metadata; the estimated
/// cost is derived from the model's price rates. When the response lacks
/// usage metadata the call still counts as a success, with usage and
/// cost absent rather than guessed.
pub(crate) async fn run_one(
    client: &dyn ChatApi,
    model: &ModelSpec,
    messages: &[ChatMessage],
    params: &GenerationParams,
) -> ComparisonResult {
    let started = Instant::now();

    let outcome = match client.complete(model, messages, params).await {
        Ok(completion) => {
            let cost = completion.usage.as_ref().map(|u| model.rates.estimate(u));
            match (&completion.usage, &cost) {
                (Some(usage), Some(cost)) => info!(
                    model = %model.id,
                    prompt_tokens = usage.prompt_tokens,
                    completion_tokens = usage.completion_tokens,
                    total_tokens = usage.total_tokens,
                    cost = %cost,
                    "Model responded"
                ),
                _ => warn!(model = %model.id, "Model responded without usage metadata"),
            }
            Outcome::Success { text: completion.text, usage: completion.usage, cost }
        }
        Err(e) => {
            warn!(
                model = %model.id,
                error = %e,
                "Model call failed - continuing with remaining models"
            );
            Outcome::Failure { error: e.to_string() }
        }
    };

    ComparisonResult {
        model: model.id.clone(),
        completed_at: Utc::now(),
        elapsed_ms: started.elapsed().as_millis() as u64,
        outcome,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
