//! Resilient LLM invocation.
//!
//! `LlmClient` is the single point of contact with the text-generation
//! service. It owns the retry / backoff / fallback policy:
//! - primary model first, fallback model second, in that fixed order
//! - per model, retryable errors back off `base_delay * 2^attempt` seconds
//!   for up to `max_retries` retries
//! - a client error aborts the primary's attempt sequence and falls
//!   through to the fallback; on the fallback it propagates
//! - both models exhausted raises `EngineError::Unavailable`

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use super::provider::ChatProvider;
use super::types::{ChatCompletion, ChatMessage, ChatRequest, LlmResponse};
use crate::config::EngineConfig;
use crate::core::errors::EngineError;

#[derive(Clone)]
pub struct LlmClient {
    provider: Arc<dyn ChatProvider>,
    config: EngineConfig,
}

impl LlmClient {
    pub fn new(provider: Arc<dyn ChatProvider>, config: EngineConfig) -> Self {
        Self { provider, config }
    }

    /// Run a completion through the retry/fallback state machine.
    ///
    /// `temperature` and `max_tokens` default to the configured values
    /// when not given.
    pub async fn complete(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        temperature: Option<f64>,
        max_tokens: Option<u32>,
    ) -> Result<LlmResponse, EngineError> {
        let request = self.build_request(prompt, system_prompt, temperature, max_tokens);

        let models = [
            (self.config.primary_model.as_str(), false),
            (self.config.fallback_model.as_str(), true),
        ];

        for (model_id, is_fallback) in models {
            match self.attempt_model(&request, model_id).await {
                Ok(completion) => {
                    return Ok(LlmResponse {
                        text: completion.text,
                        model_id: completion.model,
                        usage: completion.usage,
                        fallback_used: is_fallback,
                    });
                }
                Err(err) => {
                    if is_fallback && !err.is_retryable() {
                        return Err(err);
                    }
                    tracing::warn!(model = model_id, error = %err, "model attempt sequence failed");
                }
            }
        }

        Err(EngineError::Unavailable)
    }

    /// Open a streaming completion on the primary model.
    ///
    /// The stream is a pull-based, single-pass sequence of text fragments.
    /// It carries no retry or fallback logic: a mid-stream failure arrives
    /// as an `Err` item and ends the stream. Cancellation is "stop
    /// pulling" — no signal is sent upstream.
    pub async fn stream(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
    ) -> Result<mpsc::Receiver<Result<String, EngineError>>, EngineError> {
        let request = self.build_request(prompt, system_prompt, None, None);
        self.provider
            .stream_chat(&request, &self.config.primary_model)
            .await
    }

    fn build_request(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        temperature: Option<f64>,
        max_tokens: Option<u32>,
    ) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system_prompt {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(prompt));

        ChatRequest {
            messages,
            temperature: temperature.unwrap_or(self.config.temperature),
            max_tokens: max_tokens.unwrap_or(self.config.max_tokens),
        }
    }

    /// One model's full attempt sequence: up to `max_retries + 1` calls
    /// with exponential backoff on retryable errors. Client errors abort
    /// the sequence immediately.
    async fn attempt_model(
        &self,
        request: &ChatRequest,
        model_id: &str,
    ) -> Result<ChatCompletion, EngineError> {
        let mut attempt: u32 = 0;
        loop {
            match self.provider.chat(request, model_id).await {
                Ok(completion) => {
                    if completion.text.is_empty() {
                        // Empty completions happen; retry once on the same
                        // model without backoff, then accept what we got.
                        tracing::debug!(model = model_id, "empty completion text, retrying once");
                        if let Ok(retry) = self.provider.chat(request, model_id).await {
                            return Ok(retry);
                        }
                    }
                    return Ok(completion);
                }
                Err(err) if err.is_retryable() && attempt < self.config.max_retries => {
                    let delay = self.config.base_delay_secs * f64::from(1u32 << attempt);
                    tracing::warn!(
                        model = model_id,
                        attempt,
                        delay_secs = delay,
                        error = %err,
                        "retryable LLM error, backing off"
                    );
                    tokio::time::sleep(Duration::from_secs_f64(delay)).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedProvider;
    use crate::llm::types::TokenUsage;

    fn test_config() -> EngineConfig {
        EngineConfig {
            base_delay_secs: 0.0,
            max_retries: 3,
            ..EngineConfig::default()
        }
    }

    fn ok(text: &str, model: &str) -> Result<ChatCompletion, EngineError> {
        Ok(ChatCompletion {
            text: text.to_string(),
            model: model.to_string(),
            usage: TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            },
        })
    }

    fn rate_limited() -> Result<ChatCompletion, EngineError> {
        Err(EngineError::RateLimited("rate limit exceeded".into()))
    }

    fn client_err(status: u16) -> Result<ChatCompletion, EngineError> {
        Err(EngineError::Client {
            status,
            message: "bad request".into(),
        })
    }

    #[tokio::test]
    async fn test_complete_returns_llm_response() {
        let provider = Arc::new(ScriptedProvider::new(vec![ok(
            "Hello!",
            "llama-3.1-70b-versatile",
        )]));
        let client = LlmClient::new(provider.clone(), test_config());

        let response = client.complete("Say hello", None, None, None).await.unwrap();
        assert_eq!(response.text, "Hello!");
        assert_eq!(response.model_id, "llama-3.1-70b-versatile");
        assert!(!response.fallback_used);
        assert_eq!(response.usage.total_tokens, 15);
        assert_eq!(provider.calls(), vec!["llama-3.1-70b-versatile"]);
    }

    #[tokio::test]
    async fn test_system_prompt_becomes_first_message() {
        let provider = Arc::new(ScriptedProvider::new(vec![ok("ack", "m")]));
        let client = LlmClient::new(provider.clone(), test_config());

        client
            .complete("question", Some("you are terse"), None, None)
            .await
            .unwrap();

        let request = provider.last_request().unwrap();
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "system");
        assert_eq!(request.messages[0].content, "you are terse");
        assert_eq!(request.messages[1].role, "user");
        assert_eq!(request.messages[1].content, "question");
    }

    #[tokio::test]
    async fn test_retry_on_rate_limit_then_success() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            rate_limited(),
            ok("Hello!", "llama-3.1-70b-versatile"),
        ]));
        let client = LlmClient::new(provider.clone(), test_config());

        let response = client.complete("Say hello", None, None, None).await.unwrap();
        assert_eq!(response.text, "Hello!");
        assert!(!response.fallback_used);
        assert_eq!(provider.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_fallback_after_primary_exhausts_retries() {
        // Primary fails 4 times (initial + 3 retries), fallback succeeds.
        let provider = Arc::new(ScriptedProvider::new(vec![
            rate_limited(),
            rate_limited(),
            rate_limited(),
            rate_limited(),
            ok("Fallback hello", "llama-3.1-8b-instant"),
        ]));
        let client = LlmClient::new(provider.clone(), test_config());

        let response = client.complete("Say hello", None, None, None).await.unwrap();
        assert_eq!(response.text, "Fallback hello");
        assert!(response.fallback_used);

        let calls = provider.calls();
        assert_eq!(calls.len(), 5);
        assert!(calls[..4].iter().all(|m| m == "llama-3.1-70b-versatile"));
        assert_eq!(calls[4], "llama-3.1-8b-instant");
    }

    #[tokio::test]
    async fn test_both_models_exhausted_is_unavailable() {
        let provider = Arc::new(ScriptedProvider::new(
            (0..8).map(|_| rate_limited()).collect(),
        ));
        let client = LlmClient::new(provider.clone(), test_config());

        let err = client.complete("Say hello", None, None, None).await.unwrap_err();
        assert!(matches!(err, EngineError::Unavailable));
        assert_eq!(provider.calls().len(), 8);
    }

    #[tokio::test]
    async fn test_client_error_on_primary_falls_through_to_fallback() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            client_err(400),
            ok("from fallback", "llama-3.1-8b-instant"),
        ]));
        let client = LlmClient::new(provider.clone(), test_config());

        let response = client.complete("q", None, None, None).await.unwrap();
        assert_eq!(response.text, "from fallback");
        assert!(response.fallback_used);
        // No retries before falling through.
        assert_eq!(provider.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_client_error_on_fallback_propagates() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            client_err(400),
            client_err(404),
        ]));
        let client = LlmClient::new(provider.clone(), test_config());

        let err = client.complete("q", None, None, None).await.unwrap_err();
        assert!(matches!(err, EngineError::Client { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_empty_text_retried_once_without_backoff() {
        let provider = Arc::new(ScriptedProvider::new(vec![ok("", "m"), ok("second try", "m")]));
        let client = LlmClient::new(provider.clone(), test_config());

        let response = client.complete("q", None, None, None).await.unwrap();
        assert_eq!(response.text, "second try");
        assert_eq!(provider.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_text_accepted_after_single_retry() {
        let provider = Arc::new(ScriptedProvider::new(vec![ok("", "m"), ok("", "m")]));
        let client = LlmClient::new(provider.clone(), test_config());

        let response = client.complete("q", None, None, None).await.unwrap();
        assert_eq!(response.text, "");
        assert_eq!(provider.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_streaming_yields_fragments_in_order() {
        let provider = Arc::new(ScriptedProvider::with_stream(vec![
            "Hello".to_string(),
            " world".to_string(),
            "!".to_string(),
        ]));
        let client = LlmClient::new(provider, test_config());

        let mut rx = client.stream("Say hello", None).await.unwrap();
        let mut fragments = Vec::new();
        while let Some(item) = rx.recv().await {
            fragments.push(item.unwrap());
        }
        assert_eq!(fragments, vec!["Hello", " world", "!"]);
    }
}
