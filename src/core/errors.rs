use thiserror::Error;

/// Error surface of the query engine.
///
/// The taxonomy is deliberately narrow: callers only ever need to
/// distinguish retryable failures (handled inside `LlmClient`), client
/// errors (propagated immediately) and the terminal `Unavailable` state.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
    #[error("client error ({status}): {message}")]
    Client { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("language model unavailable after exhausting retries on all models")]
    Unavailable,
    #[error("vector store error: {0}")]
    Store(String),
    #[error("config error: {0}")]
    Config(String),
}

impl EngineError {
    pub fn transport<E: std::fmt::Display>(err: E) -> Self {
        EngineError::Transport(err.to_string())
    }

    /// Rate limits, 5xx responses and transport failures are retried with
    /// backoff; everything else is not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::RateLimited(_) | EngineError::Server { .. } | EngineError::Transport(_)
        )
    }
}
