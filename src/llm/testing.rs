//! Scripted `ChatProvider` for unit tests. No network, no API key.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::provider::ChatProvider;
use super::types::{ChatCompletion, ChatRequest};
use crate::core::errors::EngineError;

pub(crate) struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<ChatCompletion, EngineError>>>,
    stream_fragments: Vec<String>,
    calls: Mutex<Vec<String>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<ChatCompletion, EngineError>>) -> Self {
        Self {
            responses: Mutex::new(script.into()),
            stream_fragments: Vec::new(),
            calls: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_stream(fragments: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            stream_fragments: fragments,
            calls: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Model ids in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    async fn chat(
        &self,
        request: &ChatRequest,
        model_id: &str,
    ) -> Result<ChatCompletion, EngineError> {
        self.calls.lock().unwrap().push(model_id.to_string());
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(EngineError::Transport("script exhausted".into())))
    }

    async fn stream_chat(
        &self,
        _request: &ChatRequest,
        model_id: &str,
    ) -> Result<mpsc::Receiver<Result<String, EngineError>>, EngineError> {
        self.calls.lock().unwrap().push(model_id.to_string());
        let (tx, rx) = mpsc::channel(32);
        let fragments = self.stream_fragments.clone();
        tokio::spawn(async move {
            for fragment in fragments {
                if tx.send(Ok(fragment)).await.is_err() {
                    return;
                }
            }
        });
        Ok(rx)
    }
}
