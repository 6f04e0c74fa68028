//! Retrieval-augmented query engine for private document notebooks.
//!
//! Answers natural-language questions over a user's ingested documents:
//! a retrieval strategy picks passages from the vector store, the
//! citation assembler records where they came from, and a resilient LLM
//! client (retry, backoff, model fallback) composes the cited answer.
//!
//! Document extraction, chunking, embedding persistence and the HTTP
//! presentation layer are external collaborators; they reach this crate
//! through `VectorStore` and `RagEngine`.

pub mod config;
pub mod core;
pub mod llm;
pub mod logging;
pub mod rag;

pub use crate::core::errors::EngineError;
pub use config::EngineConfig;
pub use llm::{ChatProvider, GroqProvider, LlmClient, LlmResponse};
pub use rag::{RagEngine, RagResponse, Technique, VectorStore};
