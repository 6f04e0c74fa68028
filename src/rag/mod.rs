//! Retrieval-augmented generation.
//!
//! This module provides:
//! - `RagEngine`: the query orchestrator (technique dispatch, prompt
//!   assembly, response packaging)
//! - the retrieval strategy set (naive, HyDE, reranking, multi-query)
//! - the `VectorStore` seam to the external vector database
//! - citation assembly and map-reduce summarization

pub mod citations;
pub mod engine;
pub mod models;
pub mod retrieval;
pub mod store;
pub mod summarize;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::{RagEngine, NO_SOURCES_ANSWER};
pub use models::{Chunk, Citation, RagResponse, RetrievedPassage, Technique};
pub use store::{ChunkMetadata, QueryResult, VectorStore};
