use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use super::provider::ChatProvider;
use super::types::{ChatCompletion, ChatRequest, TokenUsage};
use crate::config::EngineConfig;
use crate::core::errors::EngineError;

/// Groq chat-completion provider (OpenAI-compatible API).
#[derive(Clone)]
pub struct GroqProvider {
    base_url: String,
    api_key: String,
    client: Client,
}

impl GroqProvider {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client: Client::new(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.base_url.clone(), config.api_key.clone())
    }

    fn request_body(request: &ChatRequest, model_id: &str, stream: bool) -> Value {
        json!({
            "model": model_id,
            "messages": request.messages,
            "stream": stream,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        })
    }

    /// Map a non-success HTTP response onto the engine error taxonomy.
    async fn error_from_response(res: reqwest::Response) -> EngineError {
        let status = res.status().as_u16();
        let message = res.text().await.unwrap_or_default();
        if status == 429 {
            EngineError::RateLimited(message)
        } else if status >= 500 {
            EngineError::Server { status, message }
        } else {
            EngineError::Client { status, message }
        }
    }
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
    model: String,
    #[serde(default)]
    usage: TokenUsage,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: String,
}

#[async_trait]
impl ChatProvider for GroqProvider {
    async fn chat(
        &self,
        request: &ChatRequest,
        model_id: &str,
    ) -> Result<ChatCompletion, EngineError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::request_body(request, model_id, false);

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(EngineError::transport)?;

        if !res.status().is_success() {
            return Err(Self::error_from_response(res).await);
        }

        let payload: CompletionResponse = res.json().await.map_err(EngineError::transport)?;
        let text = payload
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        Ok(ChatCompletion {
            text,
            model: payload.model,
            usage: payload.usage,
        })
    }

    async fn stream_chat(
        &self,
        request: &ChatRequest,
        model_id: &str,
    ) -> Result<mpsc::Receiver<Result<String, EngineError>>, EngineError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::request_body(request, model_id, true);

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(EngineError::transport)?;

        if !res.status().is_success() {
            return Err(Self::error_from_response(res).await);
        }

        let (tx, rx) = mpsc::channel(32);
        let mut stream = res.bytes_stream();

        tokio::spawn(async move {
            while let Some(item) = stream.next().await {
                match item {
                    Ok(bytes) => {
                        let chunk_str = String::from_utf8_lossy(&bytes);
                        for line in chunk_str.lines() {
                            let line = line.trim();
                            if line.is_empty() {
                                continue;
                            }
                            if line == "data: [DONE]" {
                                return;
                            }

                            if let Some(data) = line.strip_prefix("data: ") {
                                if let Ok(json) = serde_json::from_str::<Value>(data) {
                                    if let Some(content) =
                                        json["choices"][0]["delta"]["content"].as_str()
                                    {
                                        if !content.is_empty()
                                            && tx.send(Ok(content.to_string())).await.is_err()
                                        {
                                            return;
                                        }
                                    }
                                }
                            }
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(EngineError::transport(e))).await;
                        return;
                    }
                }
            }
        });

        Ok(rx)
    }
}
