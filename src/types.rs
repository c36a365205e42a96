//! Shared types for the ARENA comparison tool.
//!
//! These types form the data model used across all modules: the model
//! catalog entries, request/response shapes, per-model outcomes, and the
//! error taxonomy. They are designed to be stable so that the client,
//! orchestrator, and display modules can depend on them without circular
//! references.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Capability & pricing
// ---------------------------------------------------------------------------

/// Which request parameters a model accepts.
///
/// `RestrictedParameters` models reject the usual sampling knobs and must
/// receive a reduced payload (model, messages, and a completion-token cap
/// only). The classification lives in the static catalog, never inferred
/// at call time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CapabilityClass {
    Standard,
    RestrictedParameters,
}

impl fmt::Display for CapabilityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityClass::Standard => write!(f, "standard"),
            CapabilityClass::RestrictedParameters => write!(f, "restricted"),
        }
    }
}

/// Per-model price rates in USD per 1K tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRates {
    pub prompt_per_1k: Decimal,
    pub completion_per_1k: Decimal,
}

impl PriceRates {
    /// Estimated cost of a call:
    /// `prompt_tokens/1000 × prompt_rate + completion_tokens/1000 × completion_rate`.
    ///
    /// Decimal arithmetic keeps the result exact for any token counts.
    pub fn estimate(&self, usage: &TokenUsage) -> Decimal {
        let thousand = Decimal::from(1000);
        Decimal::from(usage.prompt_tokens) / thousand * self.prompt_per_1k
            + Decimal::from(usage.completion_tokens) / thousand * self.completion_per_1k
    }
}

impl fmt::Display for PriceRates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "${}/1K prompt, ${}/1K completion",
            self.prompt_per_1k, self.completion_per_1k
        )
    }
}

/// One comparable model: identifier, capability class, price rates, and
/// context window. Immutable; built from the static catalog at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSpec {
    pub id: String,
    pub capability: CapabilityClass,
    pub rates: PriceRates,
    /// Context window size in tokens.
    pub context_window: u32,
}

impl ModelSpec {
    /// Whether this model only accepts the reduced parameter set.
    pub fn is_restricted(&self) -> bool {
        self.capability == CapabilityClass::RestrictedParameters
    }

    /// Helper to build a test model with sensible defaults.
    #[cfg(test)]
    pub fn sample(id: &str, capability: CapabilityClass) -> Self {
        ModelSpec {
            id: id.to_string(),
            capability,
            rates: PriceRates {
                prompt_per_1k: rust_decimal_macros::dec!(0.03),
                completion_per_1k: rust_decimal_macros::dec!(0.06),
            },
            context_window: 8000,
        }
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] ctx={} ({})",
            self.id, self.capability, self.context_window, self.rates,
        )
    }
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

/// Provider-reported token counts for a single call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

impl fmt::Display for TokenUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "prompt={} completion={} total={}",
            self.prompt_tokens, self.completion_tokens, self.total_tokens,
        )
    }
}

/// One chat turn as the provider understands it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage { role: "user".to_string(), content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        ChatMessage { role: "assistant".to_string(), content: content.into() }
    }
}

/// Tunable generation parameters. Only sent in full to `Standard` models;
/// restricted models receive the completion-token cap alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    /// Per-response completion token limit.
    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
    pub frequency_penalty: f64,
    pub presence_penalty: f64,
    /// Optional stop sequence appended to standard-model payloads.
    pub stop_sequence: Option<String>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 300,
            temperature: 0.7,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            stop_sequence: None,
        }
    }
}

/// What a successful provider call yields: the response text plus usage
/// metadata when the provider included it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    /// Absent when the response carried no usage block.
    pub usage: Option<TokenUsage>,
}

/// Moderation endpoint verdict for a prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationVerdict {
    pub flagged: bool,
    /// Names of the categories that flagged, empty when clean.
    pub categories: Vec<String>,
}

// ---------------------------------------------------------------------------
// Comparison request & results
// ---------------------------------------------------------------------------

/// One prompt plus the ordered lineup of models to fan it out to.
#[derive(Debug, Clone)]
pub struct ComparisonRequest {
    pub prompt: String,
    pub models: Vec<ModelSpec>,
}

impl ComparisonRequest {
    pub fn new(prompt: impl Into<String>, models: Vec<ModelSpec>) -> Self {
        ComparisonRequest { prompt: prompt.into(), models }
    }
}

/// How a single model's call ended. The two variants are mutually
/// exclusive by construction: a result is either a response (with usage
/// and cost when the provider reported usage) or an error, never both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Outcome {
    Success {
        text: String,
        /// Absent when the response lacked usage metadata.
        usage: Option<TokenUsage>,
        /// Absent whenever `usage` is — cost is never guessed.
        cost: Option<Decimal>,
    },
    Failure {
        error: String,
    },
}

/// One entry of the comparison output, in lineup order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub model: String,
    pub completed_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub outcome: Outcome,
}

impl ComparisonResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success { .. })
    }

    /// Response text, if the call succeeded.
    pub fn text(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Success { text, .. } => Some(text),
            Outcome::Failure { .. } => None,
        }
    }

    /// Error message, if the call failed.
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Success { .. } => None,
            Outcome::Failure { error } => Some(error),
        }
    }

    pub fn usage(&self) -> Option<TokenUsage> {
        match &self.outcome {
            Outcome::Success { usage, .. } => *usage,
            Outcome::Failure { .. } => None,
        }
    }

    pub fn cost(&self) -> Option<Decimal> {
        match &self.outcome {
            Outcome::Success { cost, .. } => *cost,
            Outcome::Failure { .. } => None,
        }
    }
}

impl fmt::Display for ComparisonResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Outcome::Success { usage, cost, .. } => {
                let usage_str = usage
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| "no usage metadata".to_string());
                let cost_str = cost
                    .map(|c| format!("${c:.6}"))
                    .unwrap_or_else(|| "n/a".to_string());
                write!(
                    f,
                    "{}: ok ({usage_str} | cost={cost_str} | {}ms)",
                    self.model, self.elapsed_ms,
                )
            }
            Outcome::Failure { error } => {
                write!(f, "{}: error - {error} ({}ms)", self.model, self.elapsed_ms)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Error taxonomy
// ---------------------------------------------------------------------------

/// Domain-specific error types for ARENA.
///
/// `Transport`, `Provider`, and `MalformedResponse` are per-model: the
/// orchestrator folds them into `Outcome::Failure` entries and keeps
/// going. `ModerationRejected` is submission-level and halts before any
/// model is queried. `Config` only occurs at startup.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CompareError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Provider error{}: {message}", status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Provider { status: Option<u16>, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Prompt rejected by moderation ({})", categories.join(", "))]
    ModerationRejected { categories: Vec<String> },

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    // -- CapabilityClass tests --

    #[test]
    fn test_capability_display() {
        assert_eq!(format!("{}", CapabilityClass::Standard), "standard");
        assert_eq!(format!("{}", CapabilityClass::RestrictedParameters), "restricted");
    }

    #[test]
    fn test_capability_serialization_roundtrip() {
        for class in [CapabilityClass::Standard, CapabilityClass::RestrictedParameters] {
            let json = serde_json::to_string(&class).unwrap();
            let parsed: CapabilityClass = serde_json::from_str(&json).unwrap();
            assert_eq!(class, parsed);
        }
    }

    // -- PriceRates tests --

    #[test]
    fn test_price_estimate_exact() {
        let rates = PriceRates {
            prompt_per_1k: dec!(0.03),
            completion_per_1k: dec!(0.06),
        };
        let usage = TokenUsage {
            prompt_tokens: 1000,
            completion_tokens: 500,
            total_tokens: 1500,
        };
        // 1.0 * 0.03 + 0.5 * 0.06 = 0.06
        assert_eq!(rates.estimate(&usage), dec!(0.06));
    }

    #[test]
    fn test_price_estimate_flat_rate() {
        // Equal prompt/completion rates behave like a flat per-token price.
        let rates = PriceRates {
            prompt_per_1k: dec!(0.002),
            completion_per_1k: dec!(0.002),
        };
        let usage = TokenUsage {
            prompt_tokens: 100,
            completion_tokens: 200,
            total_tokens: 300,
        };
        assert_eq!(rates.estimate(&usage), dec!(0.0006));
    }

    #[test]
    fn test_price_estimate_zero_usage() {
        let rates = PriceRates {
            prompt_per_1k: dec!(0.03),
            completion_per_1k: dec!(0.06),
        };
        assert_eq!(rates.estimate(&TokenUsage::default()), Decimal::ZERO);
    }

    #[test]
    fn test_price_estimate_awkward_counts_stay_exact() {
        // 7/1000 * 0.03 = 0.00021, 13/1000 * 0.06 = 0.00078
        let rates = PriceRates {
            prompt_per_1k: dec!(0.03),
            completion_per_1k: dec!(0.06),
        };
        let usage = TokenUsage {
            prompt_tokens: 7,
            completion_tokens: 13,
            total_tokens: 20,
        };
        assert_eq!(rates.estimate(&usage), dec!(0.00099));
    }

    // -- ModelSpec tests --

    #[test]
    fn test_model_spec_is_restricted() {
        assert!(!ModelSpec::sample("m", CapabilityClass::Standard).is_restricted());
        assert!(ModelSpec::sample("m", CapabilityClass::RestrictedParameters).is_restricted());
    }

    #[test]
    fn test_model_spec_display() {
        let spec = ModelSpec::sample("gpt-4", CapabilityClass::Standard);
        let display = format!("{spec}");
        assert!(display.contains("gpt-4"));
        assert!(display.contains("standard"));
        assert!(display.contains("8000"));
    }

    // -- TokenUsage tests --

    #[test]
    fn test_usage_partial_deserialization_defaults() {
        // A usage block missing fields deserializes with zeros, not an error.
        let usage: TokenUsage = serde_json::from_str(r#"{"total_tokens": 42}"#).unwrap();
        assert_eq!(usage.total_tokens, 42);
        assert_eq!(usage.prompt_tokens, 0);
        assert_eq!(usage.completion_tokens, 0);
    }

    #[test]
    fn test_usage_display() {
        let usage = TokenUsage { prompt_tokens: 12, completion_tokens: 34, total_tokens: 46 };
        assert_eq!(format!("{usage}"), "prompt=12 completion=34 total=46");
    }

    // -- ChatMessage tests --

    #[test]
    fn test_chat_message_constructors() {
        assert_eq!(ChatMessage::system("s").role, "system");
        assert_eq!(ChatMessage::user("u").role, "user");
        assert_eq!(ChatMessage::assistant("a").role, "assistant");
        assert_eq!(ChatMessage::user("hello").content, "hello");
    }

    // -- GenerationParams tests --

    #[test]
    fn test_generation_params_defaults() {
        let params = GenerationParams::default();
        assert_eq!(params.max_tokens, 300);
        assert!((params.temperature - 0.7).abs() < f64::EPSILON);
        assert!((params.top_p - 1.0).abs() < f64::EPSILON);
        assert_eq!(params.frequency_penalty, 0.0);
        assert_eq!(params.presence_penalty, 0.0);
        assert!(params.stop_sequence.is_none());
    }

    // -- Outcome / ComparisonResult tests --

    fn success_result(usage: Option<TokenUsage>, cost: Option<Decimal>) -> ComparisonResult {
        ComparisonResult {
            model: "gpt-4".to_string(),
            completed_at: Utc::now(),
            elapsed_ms: 210,
            outcome: Outcome::Success { text: "hi there".to_string(), usage, cost },
        }
    }

    #[test]
    fn test_result_success_accessors() {
        let usage = TokenUsage { prompt_tokens: 10, completion_tokens: 20, total_tokens: 30 };
        let result = success_result(Some(usage), Some(dec!(0.0015)));
        assert!(result.is_success());
        assert_eq!(result.text(), Some("hi there"));
        assert!(result.error().is_none());
        assert_eq!(result.usage(), Some(usage));
        assert_eq!(result.cost(), Some(dec!(0.0015)));
    }

    #[test]
    fn test_result_failure_accessors() {
        let result = ComparisonResult {
            model: "gpt-4".to_string(),
            completed_at: Utc::now(),
            elapsed_ms: 5,
            outcome: Outcome::Failure { error: "rate limit".to_string() },
        };
        assert!(!result.is_success());
        assert!(result.text().is_none());
        assert_eq!(result.error(), Some("rate limit"));
        assert!(result.usage().is_none());
        assert!(result.cost().is_none());
    }

    #[test]
    fn test_result_success_without_usage_has_no_cost() {
        let result = success_result(None, None);
        assert!(result.is_success());
        assert_eq!(result.text(), Some("hi there"));
        assert!(result.usage().is_none());
        assert!(result.cost().is_none());
    }

    #[test]
    fn test_result_display_success() {
        let usage = TokenUsage { prompt_tokens: 10, completion_tokens: 20, total_tokens: 30 };
        let display = format!("{}", success_result(Some(usage), Some(dec!(0.0015))));
        assert!(display.contains("gpt-4"));
        assert!(display.contains("ok"));
        assert!(display.contains("total=30"));
        assert!(display.contains("$0.001500"));
    }

    #[test]
    fn test_result_display_missing_usage() {
        let display = format!("{}", success_result(None, None));
        assert!(display.contains("no usage metadata"));
        assert!(display.contains("n/a"));
    }

    #[test]
    fn test_result_serialization_roundtrip() {
        let usage = TokenUsage { prompt_tokens: 10, completion_tokens: 20, total_tokens: 30 };
        let result = success_result(Some(usage), Some(dec!(0.0015)));
        let json = serde_json::to_string(&result).unwrap();
        let parsed: ComparisonResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.model, "gpt-4");
        assert!(parsed.is_success());
    }

    // -- CompareError tests --

    #[test]
    fn test_error_display_provider_with_status() {
        let e = CompareError::Provider {
            status: Some(429),
            message: "rate limit exceeded".to_string(),
        };
        assert_eq!(format!("{e}"), "Provider error (HTTP 429): rate limit exceeded");
    }

    #[test]
    fn test_error_display_provider_without_status() {
        let e = CompareError::Provider {
            status: None,
            message: "model unavailable".to_string(),
        };
        assert_eq!(format!("{e}"), "Provider error: model unavailable");
    }

    #[test]
    fn test_error_display_moderation() {
        let e = CompareError::ModerationRejected {
            categories: vec!["violence".to_string(), "hate".to_string()],
        };
        assert_eq!(format!("{e}"), "Prompt rejected by moderation (violence, hate)");
    }

    #[test]
    fn test_error_display_transport() {
        let e = CompareError::Transport("connection refused".to_string());
        assert!(format!("{e}").contains("connection refused"));
    }
}
