use async_trait::async_trait;
use tokio::sync::mpsc;

use super::types::{ChatCompletion, ChatRequest};
use crate::core::errors::EngineError;

/// A remote text-generation backend.
///
/// `LlmClient` layers retry, backoff and model fallback on top of this
/// trait; implementations only translate one request into one network
/// call and map the error surface onto `EngineError`.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Chat completion (non-streaming).
    async fn chat(
        &self,
        request: &ChatRequest,
        model_id: &str,
    ) -> Result<ChatCompletion, EngineError>;

    /// Chat completion (streaming). Yields text fragments in arrival
    /// order; a mid-stream failure is delivered as an `Err` item and
    /// ends the stream.
    async fn stream_chat(
        &self,
        request: &ChatRequest,
        model_id: &str,
    ) -> Result<mpsc::Receiver<Result<String, EngineError>>, EngineError>;
}
