//! Multi-turn comparison sessions with running per-model totals.
//!
//! The first submitted prompt seeds the system message of every model's
//! conversation; follow-ups append as user turns. Each round fans out
//! sequentially through the same per-model call path as a one-shot
//! comparison, so a model that errors in one round stays in the lineup
//! for the next, with its transcript unchanged.

use rust_decimal::Decimal;
use std::fmt;
use tracing::info;

use crate::compare;
use crate::openai::ChatApi;
use crate::types::{ChatMessage, ComparisonResult, GenerationParams, ModelSpec};

// ---------------------------------------------------------------------------
// Per-model state
// ---------------------------------------------------------------------------

/// Running token and cost totals for one model across a session.
#[derive(Debug, Clone, Default)]
pub struct ModelTally {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    /// Cumulative estimated cost over rounds that reported usage.
    pub cost: Decimal,
    pub rounds_failed: u32,
}

impl ModelTally {
    fn absorb(&mut self, result: &ComparisonResult) {
        if let Some(usage) = result.usage() {
            self.prompt_tokens += u64::from(usage.prompt_tokens);
            self.completion_tokens += u64::from(usage.completion_tokens);
            self.total_tokens += u64::from(usage.total_tokens);
        }
        if let Some(cost) = result.cost() {
            self.cost += cost;
        }
        if !result.is_success() {
            self.rounds_failed += 1;
        }
    }
}

impl fmt::Display for ModelTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "prompt={} completion={} total={} cost=${:.6} failed_rounds={}",
            self.prompt_tokens,
            self.completion_tokens,
            self.total_tokens,
            self.cost,
            self.rounds_failed,
        )
    }
}

/// One model's conversation state within a session.
#[derive(Debug, Clone)]
pub struct ModelThread {
    pub spec: ModelSpec,
    /// Alternating user/assistant turns, excluding the system message.
    pub transcript: Vec<ChatMessage>,
    pub tally: ModelTally,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A multi-round comparison against a fixed lineup.
pub struct Session {
    threads: Vec<ModelThread>,
    params: GenerationParams,
    system_prompt: Option<String>,
    rounds: u32,
}

impl Session {
    pub fn new(lineup: Vec<ModelSpec>, params: GenerationParams) -> Self {
        let threads = lineup
            .into_iter()
            .map(|spec| ModelThread {
                spec,
                transcript: Vec::new(),
                tally: ModelTally::default(),
            })
            .collect();
        Session { threads, params, system_prompt: None, rounds: 0 }
    }

    pub fn threads(&self) -> &[ModelThread] {
        &self.threads
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Whether no prompt has been submitted since creation or reset.
    pub fn is_fresh(&self) -> bool {
        self.system_prompt.is_none()
    }

    /// Fan one prompt out across the lineup, updating transcripts and
    /// tallies. Returns the per-model results of this round, in lineup
    /// order.
    pub async fn submit(&mut self, client: &dyn ChatApi, prompt: &str) -> Vec<ComparisonResult> {
        let first_round = self.system_prompt.is_none();
        let system = self
            .system_prompt
            .get_or_insert_with(|| prompt.to_string())
            .clone();
        self.rounds += 1;

        info!(round = self.rounds, first_round, "Submitting round to lineup");

        let mut results = Vec::with_capacity(self.threads.len());
        for thread in &mut self.threads {
            let mut messages = Vec::with_capacity(thread.transcript.len() + 2);
            messages.push(ChatMessage::system(system.as_str()));
            messages.extend(thread.transcript.iter().cloned());
            if !first_round {
                messages.push(ChatMessage::user(prompt));
            }

            let result = compare::run_one(client, &thread.spec, &messages, &self.params).await;

            // A failed round leaves the transcript untouched.
            if let Some(text) = result.text() {
                if !first_round {
                    thread.transcript.push(ChatMessage::user(prompt));
                }
                thread.transcript.push(ChatMessage::assistant(text));
            }
            thread.tally.absorb(&result);
            results.push(result);
        }

        results
    }

    /// Start over: clear transcripts, totals, and the system prompt.
    /// The lineup and generation parameters stay.
    pub fn reset(&mut self) {
        self.system_prompt = None;
        self.rounds = 0;
        for thread in &mut self.threads {
            thread.transcript.clear();
            thread.tally = ModelTally::default();
        }
    }

    /// Combined estimated cost across the whole lineup.
    pub fn total_cost(&self) -> Decimal {
        self.threads.iter().map(|t| t.tally.cost).sum()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
