//! Scripted `VectorStore` for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::store::{QueryResult, VectorStore};
use crate::core::errors::EngineError;

pub(crate) struct MockStore {
    results: Mutex<VecDeque<QueryResult>>,
    queries: Mutex<Vec<(String, usize)>>,
}

impl MockStore {
    /// Results are handed out one per query, in order; once the script is
    /// exhausted every query returns an empty result.
    pub fn new(results: Vec<QueryResult>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// `(query_text, n_results)` pairs in call order.
    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorStore for MockStore {
    async fn query(&self, query_text: &str, n_results: usize) -> Result<QueryResult, EngineError> {
        self.queries
            .lock()
            .unwrap()
            .push((query_text.to_string(), n_results));
        Ok(self
            .results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }
}
