//! Engine configuration.
//!
//! All tunables live in one flat TOML table so a deployment can override
//! any of them; unset fields fall back to the defaults below. The API key
//! is additionally read from the `GROQ_API_KEY` environment variable so it
//! never has to be written to disk.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::errors::EngineError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// API key for the text-generation service.
    pub api_key: String,
    /// OpenAI-compatible base URL of the text-generation service.
    pub base_url: String,
    /// Model tried first for every completion.
    pub primary_model: String,
    /// Model tried only after the primary exhausts its retry budget.
    pub fallback_model: String,
    /// Retries per model on retryable errors (attempts = retries + 1).
    pub max_retries: u32,
    /// Backoff base in seconds; attempt `n` sleeps `base * 2^n`.
    pub base_delay_secs: f64,
    /// Default sampling temperature for answer generation.
    pub temperature: f64,
    /// Default completion token budget.
    pub max_tokens: u32,
    /// Passages retrieved per query.
    pub top_k: usize,
    /// Candidate pool size for the reranking strategy (must exceed top_k).
    pub rerank_candidates: usize,
    /// Number of alternative phrasings for the multi-query strategy.
    pub multi_query_variants: usize,
    /// Estimated-token threshold above which source text is map-reduced.
    pub summary_token_threshold: usize,
    /// Character window size for map-reduce summarization.
    pub summary_window_chars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.groq.com/openai/v1".to_string(),
            primary_model: "llama-3.1-70b-versatile".to_string(),
            fallback_model: "llama-3.1-8b-instant".to_string(),
            max_retries: 3,
            base_delay_secs: 1.0,
            temperature: 0.7,
            max_tokens: 1024,
            top_k: 5,
            rerank_candidates: 10,
            multi_query_variants: 3,
            summary_token_threshold: 6000,
            summary_window_chars: 12000,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file, then apply env overrides.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("cannot read {}: {e}", path.display())))?;
        let mut config: EngineConfig = toml::from_str(&raw)
            .map_err(|e| EngineError::Config(format!("cannot parse {}: {e}", path.display())))?;
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("GROQ_API_KEY") {
            if !key.is_empty() {
                self.api_key = key;
            }
        }
    }
}
