//! Retrieval Strategy Set.
//!
//! Four interchangeable strategies turn a question into a ranked passage
//! list:
//! - `Naive`: raw question straight to the vector store
//! - `Hyde`: retrieve with an LLM-written hypothetical answer
//! - `Reranking`: over-fetch, LLM-score candidates 1..=5, keep the best
//! - `MultiQuery`: LLM phrasing variants fused with reciprocal rank fusion
//!
//! An unreachable model (`Unavailable`) propagates; malformed model
//! *output* never does — it degrades to documented defaults.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt::Write as _;

use crate::config::EngineConfig;
use crate::core::errors::EngineError;
use crate::llm::LlmClient;

use super::models::{RetrievedPassage, Technique};
use super::store::VectorStore;

const HYDE_SYSTEM_PROMPT: &str = "You write a short passage that plausibly answers the \
     user's question, as if quoted from a reference document. Respond with the passage only.";

const RERANK_SYSTEM_PROMPT: &str = "You rate how relevant each passage is to a question. \
     Respond with a JSON array of integers only, no prose.";

const MULTI_QUERY_SYSTEM_PROMPT: &str = "You rephrase search queries. \
     Respond with a JSON array of strings only, no prose.";

/// Score assigned to a candidate when the reranking model's output is
/// missing, malformed or not an integer.
const DEFAULT_RERANK_SCORE: i64 = 3;

/// Reciprocal rank fusion constant: rank `r` contributes `1 / (r + 60)`.
const RRF_K: f64 = 60.0;

/// Run the selected strategy and return a ranked passage list of at most
/// `config.top_k` entries.
pub async fn retrieve(
    technique: Technique,
    store: &dyn VectorStore,
    llm: &LlmClient,
    config: &EngineConfig,
    question: &str,
) -> Result<Vec<RetrievedPassage>, EngineError> {
    match technique {
        Technique::Naive => naive(store, config, question).await,
        Technique::Hyde => hyde(store, llm, config, question).await,
        Technique::Reranking => rerank(store, llm, config, question).await,
        Technique::MultiQuery => multi_query(store, llm, config, question).await,
    }
}

/// Baseline: one store query with the raw question. No LLM call.
async fn naive(
    store: &dyn VectorStore,
    config: &EngineConfig,
    question: &str,
) -> Result<Vec<RetrievedPassage>, EngineError> {
    Ok(store.query(question, config.top_k).await?.into_passages())
}

/// Hypothetical-document embedding: retrieve with a model-written answer
/// paragraph instead of the question itself.
async fn hyde(
    store: &dyn VectorStore,
    llm: &LlmClient,
    config: &EngineConfig,
    question: &str,
) -> Result<Vec<RetrievedPassage>, EngineError> {
    let hypothesis = llm
        .complete(question, Some(HYDE_SYSTEM_PROMPT), Some(0.7), None)
        .await?;
    tracing::debug!(chars = hypothesis.text.len(), "hyde hypothesis generated");
    Ok(store
        .query(&hypothesis.text, config.top_k)
        .await?
        .into_passages())
}

/// Over-fetch `rerank_candidates`, have the model score each candidate
/// 1..=5, stable-sort by score descending and keep the top `top_k`.
/// Kept passages get a pseudo-distance of `1 - score/5` so the citation
/// relevance formula still applies.
async fn rerank(
    store: &dyn VectorStore,
    llm: &LlmClient,
    config: &EngineConfig,
    question: &str,
) -> Result<Vec<RetrievedPassage>, EngineError> {
    let candidates = store
        .query(question, config.rerank_candidates)
        .await?
        .into_passages();
    if candidates.is_empty() {
        return Ok(candidates);
    }

    let mut prompt = format!("Question: {question}\n\nPassages:\n");
    for (i, candidate) in candidates.iter().enumerate() {
        let _ = writeln!(prompt, "[{}] {}", i + 1, candidate.chunk.text);
    }
    let _ = write!(
        prompt,
        "\nRate each passage's relevance to the question from 1 (irrelevant) to 5 \
         (highly relevant). Respond with a JSON array of exactly {} integers, in passage order.",
        candidates.len()
    );

    let response = llm
        .complete(&prompt, Some(RERANK_SYSTEM_PROMPT), Some(0.0), None)
        .await?;
    let scores = parse_rerank_scores(&response.text, candidates.len());

    let mut ranked: Vec<(i64, RetrievedPassage)> = scores.into_iter().zip(candidates).collect();
    // Stable sort: ties keep the store's original order.
    ranked.sort_by_key(|(score, _)| std::cmp::Reverse(*score));
    ranked.truncate(config.top_k);

    Ok(ranked
        .into_iter()
        .map(|(score, mut passage)| {
            passage.distance = 1.0 - score as f64 / 5.0;
            passage
        })
        .collect())
}

/// Parse the model's score array, repairing it to exactly `expected`
/// entries: non-array or unparsable output becomes all defaults, each
/// non-integer element becomes the default, and the array is padded or
/// truncated to length.
fn parse_rerank_scores(raw: &str, expected: usize) -> Vec<i64> {
    let mut scores: Vec<i64> = match serde_json::from_str::<serde_json::Value>(strip_code_fences(raw))
    {
        Ok(serde_json::Value::Array(items)) => items
            .iter()
            .map(|v| v.as_i64().unwrap_or(DEFAULT_RERANK_SCORE))
            .collect(),
        _ => {
            tracing::warn!("rerank scores did not parse as a JSON array, using defaults");
            Vec::new()
        }
    };
    scores.resize(expected, DEFAULT_RERANK_SCORE);
    scores
}

/// Multi-query fusion: query once per LLM-generated phrasing plus once
/// for the original question, then merge with reciprocal rank fusion on
/// the `(source_name, chunk_index)` identity. The first appearance of an
/// identity keeps its text; pseudo-distance is `1 - fused_score`.
async fn multi_query(
    store: &dyn VectorStore,
    llm: &LlmClient,
    config: &EngineConfig,
    question: &str,
) -> Result<Vec<RetrievedPassage>, EngineError> {
    let mut queries = vec![question.to_string()];
    queries.extend(generate_variants(llm, config, question).await?);

    // Fused entries in first-seen order so the final sort is
    // deterministic under ties.
    let mut index: HashMap<(String, usize), usize> = HashMap::new();
    let mut fused: Vec<(RetrievedPassage, f64)> = Vec::new();

    for query in &queries {
        let passages = store.query(query, config.top_k).await?.into_passages();
        for (rank, passage) in passages.into_iter().enumerate() {
            let key = (passage.chunk.source_name.clone(), passage.chunk.chunk_index);
            let increment = 1.0 / (rank as f64 + RRF_K);
            match index.entry(key) {
                Entry::Occupied(slot) => fused[*slot.get()].1 += increment,
                Entry::Vacant(slot) => {
                    slot.insert(fused.len());
                    fused.push((passage, increment));
                }
            }
        }
    }

    fused.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    fused.truncate(config.top_k);

    Ok(fused
        .into_iter()
        .map(|(mut passage, score)| {
            passage.distance = 1.0 - score;
            passage
        })
        .collect())
}

/// Ask the model for alternative phrasings. Malformed output degrades to
/// an empty list, leaving only the original question.
async fn generate_variants(
    llm: &LlmClient,
    config: &EngineConfig,
    question: &str,
) -> Result<Vec<String>, EngineError> {
    let prompt = format!(
        "Rewrite the following question in {} different ways that could surface different \
         relevant passages. Respond with a JSON array of {} strings.\n\nQuestion: {question}",
        config.multi_query_variants, config.multi_query_variants
    );
    let response = llm
        .complete(&prompt, Some(MULTI_QUERY_SYSTEM_PROMPT), Some(0.7), None)
        .await?;

    match serde_json::from_str::<Vec<String>>(strip_code_fences(&response.text)) {
        Ok(variants) => Ok(variants),
        Err(_) => {
            tracing::warn!("query variants did not parse as a JSON string array, using none");
            Ok(Vec::new())
        }
    }
}

/// Models often wrap JSON in Markdown code fences; strip them before
/// parsing.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}
