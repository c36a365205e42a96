//! Provider integration for the comparison fan-out.
//!
//! Defines the `ChatApi` trait the orchestrator depends on and provides
//! the reqwest-backed implementation targeting the OpenAI HTTP API. The
//! trait seam keeps the orchestrator testable without a live network.

pub mod client;

pub use client::OpenAiClient;

use async_trait::async_trait;

use crate::types::{
    ChatMessage, CompareError, Completion, GenerationParams, ModelSpec, ModerationVerdict,
};

/// Abstraction over the inference provider.
///
/// Implementors send chat messages to a model and return the response
/// text plus whatever usage metadata the provider reported. All failures
/// arrive pre-mapped into the `CompareError` taxonomy.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Request a completion from a single model.
    async fn complete(
        &self,
        model: &ModelSpec,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> Result<Completion, CompareError>;

    /// Screen a prompt against the moderation endpoint.
    async fn moderate(&self, input: &str) -> Result<ModerationVerdict, CompareError>;

    /// List the model identifiers served to the current credentials.
    async fn list_models(&self) -> Result<Vec<String>, CompareError>;
}
