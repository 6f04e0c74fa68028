//! VectorStore trait — the seam to the external vector database.
//!
//! Ingestion, embedding and index persistence all live behind this trait;
//! the query engine only ever reads from it. A store handle is scoped to
//! one notebook's collection and must tolerate concurrent queries from
//! multiple in-flight requests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::models::{Chunk, RetrievedPassage};
use crate::core::errors::EngineError;

/// Metadata stored alongside each chunk's embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source_name: String,
    pub chunk_index: usize,
}

/// Raw result of a similarity query: three parallel lists of equal
/// length, at most `n_results` long, all empty when the collection is
/// empty.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    pub documents: Vec<String>,
    pub metadatas: Vec<ChunkMetadata>,
    pub distances: Vec<f64>,
}

impl QueryResult {
    /// Zip the parallel lists into passages, in store order.
    pub fn into_passages(self) -> Vec<RetrievedPassage> {
        self.documents
            .into_iter()
            .zip(self.metadatas)
            .zip(self.distances)
            .map(|((text, meta), distance)| RetrievedPassage {
                chunk: Chunk {
                    text,
                    source_name: meta.source_name,
                    chunk_index: meta.chunk_index,
                },
                distance,
            })
            .collect()
    }
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Query the collection by similarity. Implementations cap
    /// `n_results` at the collection's current size.
    async fn query(&self, query_text: &str, n_results: usize) -> Result<QueryResult, EngineError>;
}
