use std::fmt;

use serde::{Deserialize, Serialize};

/// A bounded unit of source text with a stable `(source, index)` identity.
/// Produced by the ingestion collaborator; immutable once stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub source_name: String,
    pub chunk_index: usize,
}

/// A chunk returned by one vector store query, with its similarity-space
/// distance (lower = more similar). Transient, never persisted.
#[derive(Debug, Clone)]
pub struct RetrievedPassage {
    pub chunk: Chunk,
    pub distance: f64,
}

/// A user-facing record linking an answer to the source chunk it was
/// grounded in. `relevance_score = clamp(1 - distance, 0, 1)`, rounded
/// to 4 decimal places.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    pub source_name: String,
    pub chunk_text: String,
    pub chunk_index: usize,
    pub relevance_score: f64,
}

/// The closed set of retrieval strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Technique {
    Naive,
    Hyde,
    Reranking,
    MultiQuery,
}

impl Technique {
    /// Resolve a technique name. Unknown names are not valid selections;
    /// the orchestrator substitutes `Naive` for them.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "naive" => Some(Technique::Naive),
            "hyde" => Some(Technique::Hyde),
            "reranking" => Some(Technique::Reranking),
            "multi_query" => Some(Technique::MultiQuery),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Technique::Naive => "naive",
            Technique::Hyde => "hyde",
            Technique::Reranking => "reranking",
            Technique::MultiQuery => "multi_query",
        }
    }
}

impl fmt::Display for Technique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete response from a RAG query, consumed by the chat-persistence
/// and presentation collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagResponse {
    pub answer: String,
    pub citations: Vec<Citation>,
    pub technique: Technique,
    pub chunks_considered: usize,
}
