//! RAG Orchestrator — the public entry point of the query engine.
//!
//! Resolves the technique, runs retrieval, assembles citations and the
//! source-grounded system prompt, and invokes the LLM layer. An
//! `Unavailable` error from the LLM layer propagates uncaught; the chat
//! collaborator converts it into a user-visible message.

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::core::errors::EngineError;
use crate::llm::LlmClient;

use super::citations::build_citations;
use super::models::{RagResponse, RetrievedPassage, Technique};
use super::retrieval;
use super::store::VectorStore;

/// Canned answer for a notebook with no ingested documents; the LLM is
/// never invoked in that case.
pub const NO_SOURCES_ANSWER: &str = "No documents have been added to this notebook yet.";

pub struct RagEngine {
    store: Arc<dyn VectorStore>,
    llm: LlmClient,
    config: EngineConfig,
}

impl RagEngine {
    pub fn new(store: Arc<dyn VectorStore>, llm: LlmClient, config: EngineConfig) -> Self {
        Self { store, llm, config }
    }

    /// Answer `question` over the notebook's documents using the named
    /// retrieval technique. Unknown technique names fall back to naive.
    pub async fn query(&self, question: &str, technique: &str) -> Result<RagResponse, EngineError> {
        let technique = Technique::from_name(technique).unwrap_or_else(|| {
            tracing::warn!(requested = technique, "unknown retrieval technique, using naive");
            Technique::Naive
        });
        tracing::debug!(%technique, "running RAG query");

        let passages = retrieval::retrieve(
            technique,
            self.store.as_ref(),
            &self.llm,
            &self.config,
            question,
        )
        .await?;

        if passages.is_empty() {
            return Ok(RagResponse {
                answer: NO_SOURCES_ANSWER.to_string(),
                citations: Vec::new(),
                technique,
                chunks_considered: 0,
            });
        }

        let citations = build_citations(&passages);
        let system_prompt = answer_system_prompt(&passages);
        let llm_response = self
            .llm
            .complete(
                question,
                Some(&system_prompt),
                Some(self.config.temperature),
                Some(self.config.max_tokens),
            )
            .await?;

        Ok(RagResponse {
            answer: llm_response.text,
            citations,
            technique,
            chunks_considered: passages.len(),
        })
    }
}

/// System prompt listing each passage as a numbered, source-attributed
/// block, with instructions to answer only from those sources and cite
/// them as `[n]`.
fn answer_system_prompt(passages: &[RetrievedPassage]) -> String {
    let mut sources = String::new();
    for (i, passage) in passages.iter().enumerate() {
        sources.push_str(&format!(
            "[{}] (Source: {})\n{}\n\n",
            i + 1,
            passage.chunk.source_name,
            passage.chunk.text
        ));
    }

    format!(
        "You answer questions using only the numbered sources below. Cite every claim \
         with the matching [n] marker. If the sources do not contain the answer, say so.\n\n\
         Sources:\n{}",
        sources.trim_end()
    )
}
