//! OpenAI HTTP client: chat completions, moderation, model listing.
//!
//! Payloads are shaped per the model's capability class before dispatch.
//! Transient failures (connect errors, timeouts, HTTP 429, HTTP 5xx) are
//! retried with exponential backoff up to a configured bound; everything
//! else maps straight into the error taxonomy.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::ChatApi;
use crate::types::{
    CapabilityClass, ChatMessage, CompareError, Completion, GenerationParams, ModelSpec,
    ModerationVerdict, TokenUsage,
};

const BASE_BACKOFF_MS: u64 = 1000;

// ---------------------------------------------------------------------------
// API types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ModerationRequest<'a> {
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct ModerationResponse {
    #[serde(default)]
    results: Vec<ModerationResult>,
}

// BTreeMap keeps flagged category names in a deterministic order.
#[derive(Debug, Deserialize)]
struct ModerationResult {
    flagged: bool,
    #[serde(default)]
    categories: BTreeMap<String, bool>,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelListEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelListEntry {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

// ---------------------------------------------------------------------------
// Payload shaping
// ---------------------------------------------------------------------------

/// Build the outbound payload for a model, honoring its capability class.
///
/// Restricted models get the reduced set only: model, messages, and the
/// completion-token cap. Standard models get the full tuning parameters.
fn build_request<'a>(
    model: &'a ModelSpec,
    messages: &'a [ChatMessage],
    params: &GenerationParams,
) -> ChatRequest<'a> {
    match model.capability {
        CapabilityClass::RestrictedParameters => ChatRequest {
            model: &model.id,
            messages,
            max_tokens: None,
            max_completion_tokens: Some(params.max_tokens),
            temperature: None,
            top_p: None,
            frequency_penalty: None,
            presence_penalty: None,
            stop: None,
        },
        CapabilityClass::Standard => ChatRequest {
            model: &model.id,
            messages,
            max_tokens: Some(params.max_tokens),
            max_completion_tokens: None,
            temperature: Some(params.temperature),
            top_p: Some(params.top_p),
            frequency_penalty: Some(params.frequency_penalty),
            presence_penalty: Some(params.presence_penalty),
            stop: params.stop_sequence.as_ref().map(|s| vec![s.clone()]),
        },
    }
}

fn verdict_from(result: ModerationResult) -> ModerationVerdict {
    let categories = result
        .categories
        .into_iter()
        .filter(|(_, flagged)| *flagged)
        .map(|(name, _)| name)
        .collect();
    ModerationVerdict { flagged: result.flagged, categories }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct OpenAiClient {
    http: Client,
    api_key: SecretString,
    base_url: String,
    max_retries: u32,
}

impl OpenAiClient {
    pub fn new(
        api_key: SecretString,
        base_url: String,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, CompareError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CompareError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries,
        })
    }

    /// Send a request, retrying transient failures with exponential
    /// backoff. `build` produces a fresh request for each attempt.
    async fn send_with_retry<T, F>(&self, build: F) -> Result<T, CompareError>
    where
        T: serde::de::DeserializeOwned,
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut last_error = CompareError::Transport("request never dispatched".to_string());

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = BASE_BACKOFF_MS * 2u64.pow(attempt - 1);
                debug!(attempt, delay_ms = delay, "Backing off before retry");
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            let resp = build()
                .bearer_auth(self.api_key.expose_secret())
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return response.json::<T>().await.map_err(|e| {
                            CompareError::MalformedResponse(format!(
                                "Failed to decode response body: {e}"
                            ))
                        });
                    }

                    let message = Self::provider_message(response).await;

                    if status.as_u16() == 429 || status.is_server_error() {
                        warn!(status = %status, attempt, "Retryable provider error");
                        last_error = CompareError::Provider {
                            status: Some(status.as_u16()),
                            message,
                        };
                        continue;
                    }

                    return Err(CompareError::Provider {
                        status: Some(status.as_u16()),
                        message,
                    });
                }
                Err(e) => {
                    warn!(error = %e, attempt, "Request failed to reach provider");
                    last_error = CompareError::Transport(e.to_string());
                    continue;
                }
            }
        }

        Err(last_error)
    }

    /// Pull a human-readable message out of an error response, falling
    /// back to the raw body.
    async fn provider_message(response: reqwest::Response) -> String {
        let raw = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ErrorBody>(&raw) {
            Ok(ErrorBody { error: Some(detail) }) => detail.message,
            _ if raw.is_empty() => "no error detail".to_string(),
            _ => raw,
        }
    }
}

#[async_trait]
impl ChatApi for OpenAiClient {
    async fn complete(
        &self,
        model: &ModelSpec,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> Result<Completion, CompareError> {
        let request = build_request(model, messages, params);
        let url = format!("{}/chat/completions", self.base_url);

        debug!(
            model = %model.id,
            restricted = model.is_restricted(),
            messages = messages.len(),
            "Dispatching chat completion"
        );

        let body: ChatResponse = self
            .send_with_retry(|| self.http.post(&url).json(&request))
            .await?;

        let text = body
            .choices
            .first()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.as_deref())
            .ok_or_else(|| {
                CompareError::MalformedResponse("response contained no message content".to_string())
            })?
            .trim()
            .to_string();

        Ok(Completion { text, usage: body.usage })
    }

    async fn moderate(&self, input: &str) -> Result<ModerationVerdict, CompareError> {
        let request = ModerationRequest { input };
        let url = format!("{}/moderations", self.base_url);

        let body: ModerationResponse = self
            .send_with_retry(|| self.http.post(&url).json(&request))
            .await?;

        let result = body.results.into_iter().next().ok_or_else(|| {
            CompareError::MalformedResponse("moderation response contained no results".to_string())
        })?;

        Ok(verdict_from(result))
    }

    async fn list_models(&self) -> Result<Vec<String>, CompareError> {
        let url = format!("{}/models", self.base_url);
        let body: ModelList = self.send_with_retry(|| self.http.get(&url)).await?;
        Ok(body.data.into_iter().map(|m| m.id).collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
