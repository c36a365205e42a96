//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs. A
//! missing file falls back to the built-in defaults; a present but
//! invalid file is an error. Secrets (the API key) are referenced by
//! env-var name in the config and resolved at runtime via
//! `std::env::var`.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::catalog;
use crate::types::{GenerationParams, ModelSpec};

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Model identifiers to compare, in fan-out order.
    /// Empty means the full catalog lineup.
    pub models: Vec<String>,
    pub api: ApiConfig,
    pub generation: GenerationParams,
    pub moderation: ModerationConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    /// Env-var name holding the API key.
    pub api_key_env: String,
    pub base_url: String,
    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
    /// Retry attempts for transient failures, on top of the first try.
    pub max_retries: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout_secs: 120,
            max_retries: 3,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ModerationConfig {
    pub enabled: bool,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, or defaults if it is absent.
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }

    /// Resolve the configured model identifiers against the catalog, in
    /// order. An identifier the catalog does not know is a configuration
    /// error, reported up front rather than at call time.
    pub fn lineup(&self) -> Result<Vec<ModelSpec>> {
        if self.models.is_empty() {
            return Ok(catalog::default_lineup());
        }
        let mut lineup = Vec::with_capacity(self.models.len());
        for id in &self.models {
            match catalog::lookup(id) {
                Some(spec) => lineup.push(spec),
                None => bail!(
                    "Unknown model in config: {id} (supported: {})",
                    catalog::known_ids().join(", ")
                ),
            }
        }
        Ok(lineup)
    }
}
