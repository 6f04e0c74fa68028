pub mod client;
pub mod groq;
pub mod provider;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use client::LlmClient;
pub use groq::GroqProvider;
pub use provider::ChatProvider;
pub use types::{ChatMessage, ChatRequest, LlmResponse, TokenUsage};
