// src/provider/backend.rs — Uniform generate() over any provider

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{ChatRequest, Message, ModelProvider, ModelRef};
use crate::core::types::Draft;

/// One backend call: the reply text (or failure) plus its cost.
#[derive(Debug, Clone)]
pub struct Generation {
    pub outcome: Draft,
    pub latency: Duration,
    pub tokens: u32,
}

enum BackendState {
    Ready(Arc<dyn ModelProvider>),
    Unavailable { reason: String },
}

/// A model bound to its provider and sampling settings.
pub struct Backend {
    model: ModelRef,
    state: BackendState,
    temperature: f32,
    max_tokens: u32,
}

impl Backend {
    pub fn new(model: ModelRef, provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            model,
            state: BackendState::Ready(provider),
            temperature: 0.1,
            max_tokens: 2048,
        }
    }

    /// A backend that failed its startup check. Every call short-circuits.
    pub fn unavailable(model: ModelRef, reason: impl Into<String>) -> Self {
        Self {
            model,
            state: BackendState::Unavailable {
                reason: reason.into(),
            },
            temperature: 0.1,
            max_tokens: 2048,
        }
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    pub fn is_available(&self) -> bool {
        matches!(self.state, BackendState::Ready(_))
    }

    /// Send one system+user exchange. Never returns an error: failures are
    /// carried in the outcome with the elapsed latency.
    pub async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Generation {
        let provider = match &self.state {
            BackendState::Ready(p) => p,
            BackendState::Unavailable { reason } => {
                return Generation {
                    outcome: Draft::failed(format!("{} unavailable: {}", self.model, reason)),
                    latency: Duration::ZERO,
                    tokens: 0,
                };
            }
        };

        let request = ChatRequest {
            model: self.model.model.clone(),
            messages: vec![Message::user(user_prompt)],
            max_tokens: Some(self.max_tokens),
            temperature: Some(self.temperature),
            system: Some(system_prompt.to_string()),
        };

        let start = Instant::now();
        let result = provider.chat(request).await;
        let latency = start.elapsed();

        match result {
            Ok(response) => {
                let mut tokens = response.usage.total();
                if tokens == 0 && !response.content.is_empty() {
                    tokens = approximate_tokens(system_prompt, user_prompt, &response.content);
                    tracing::debug!(
                        "{} reported no usage, approximated {} tokens",
                        self.model,
                        tokens
                    );
                }
                Generation {
                    outcome: Draft::Code(response.content),
                    latency,
                    tokens,
                }
            }
            Err(e) => {
                tracing::warn!(
                    "{} call failed after {:?} (transient: {}): {}",
                    self.model,
                    latency,
                    e.is_transient(),
                    e
                );
                Generation {
                    outcome: Draft::failed(e.to_string()),
                    latency,
                    tokens: 0,
                }
            }
        }
    }
}

/// Whitespace word count of everything exchanged.
fn approximate_tokens(system_prompt: &str, user_prompt: &str, reply: &str) -> u32 {
    [system_prompt, user_prompt, reply]
        .iter()
        .map(|s| s.split_whitespace().count() as u32)
        .sum()
}
