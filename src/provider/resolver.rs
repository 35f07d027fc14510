// src/provider/resolver.rs — Provider discovery from env vars and config

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use super::anthropic::AnthropicProvider;
use super::backend::Backend;
use super::google::GoogleProvider;
use super::ollama::{has_model, OllamaProvider};
use super::openai_compat::OpenAICompatProvider;
use super::{ModelProvider, ModelRef};
use crate::infra::config::BackendsConfig;
use crate::infra::errors::BenchError;

/// Provider ids understood in `provider/model` references.
pub const KNOWN_PROVIDERS: &[&str] = &["ollama", "openai", "anthropic", "google", "compat"];

enum Slot {
    Ready(Arc<dyn ModelProvider>),
    Unavailable(String),
}

/// Providers resolved once at startup, keyed by id.
#[derive(Default)]
pub struct ProviderSet {
    slots: BTreeMap<String, Slot>,
}

/// Availability line for the `backends` report.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderStatus {
    pub id: String,
    pub unavailable: Option<String>,
}

impl ProviderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect every provider the given model references need. Providers that
    /// cannot be used are recorded as unavailable and logged once.
    pub async fn discover(config: &BackendsConfig, model_refs: &[&str]) -> Self {
        let mut set = Self::new();
        let timeout = Duration::from_secs(config.request_timeout_secs);

        let mut wanted: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for raw in model_refs {
            match ModelRef::parse(raw) {
                Some(m) => wanted.entry(m.provider).or_default().push(m.model),
                None => tracing::warn!("Ignoring malformed model reference '{}'", raw),
            }
        }

        for (id, models) in &wanted {
            match connect(id, models, config, timeout).await {
                Ok(provider) => {
                    tracing::info!("Provider '{}' ready", id);
                    set.insert(provider);
                }
                Err(e) => {
                    tracing::warn!("{}", e);
                    let reason = match e {
                        BenchError::BackendUnavailable { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    set.mark_unavailable(id, reason);
                }
            }
        }
        set
    }

    pub fn insert(&mut self, provider: Arc<dyn ModelProvider>) {
        self.slots
            .insert(provider.id().to_string(), Slot::Ready(provider));
    }

    pub fn mark_unavailable(&mut self, id: &str, reason: impl Into<String>) {
        self.slots
            .insert(id.to_string(), Slot::Unavailable(reason.into()));
    }

    /// Bind a `provider/model` reference to a backend. Unknown or unavailable
    /// providers yield a backend that fails every call.
    pub fn backend(&self, model_ref: &str, config: &BackendsConfig) -> Backend {
        let Some(model) = ModelRef::parse(model_ref) else {
            return Backend::unavailable(
                ModelRef::new("invalid", model_ref),
                "expected 'provider/model'",
            );
        };
        let backend = match self.slots.get(&model.provider) {
            Some(Slot::Ready(p)) => Backend::new(model, p.clone()),
            Some(Slot::Unavailable(reason)) => {
                let reason = reason.clone();
                Backend::unavailable(model, reason)
            }
            None => {
                let reason = format!("provider '{}' was not configured", model.provider);
                Backend::unavailable(model, reason)
            }
        };
        backend.with_sampling(config.temperature, config.max_tokens)
    }

    pub fn status(&self) -> Vec<ProviderStatus> {
        self.slots
            .iter()
            .map(|(id, slot)| ProviderStatus {
                id: id.clone(),
                unavailable: match slot {
                    Slot::Ready(_) => None,
                    Slot::Unavailable(reason) => Some(reason.clone()),
                },
            })
            .collect()
    }
}

async fn connect(
    id: &str,
    models: &[String],
    config: &BackendsConfig,
    timeout: Duration,
) -> Result<Arc<dyn ModelProvider>, BenchError> {
    match id {
        "ollama" => {
            let url = config
                .ollama_url
                .clone()
                .or_else(|| env_value("OLLAMA_HOST").map(normalize_host));
            let provider = OllamaProvider::new(url, timeout);
            let available = provider.list_models().await?;
            for model in models {
                if !has_model(&available, model) {
                    tracing::warn!(
                        "Ollama at {} has no model '{}' (run: ollama pull {})",
                        provider.base_url(),
                        model,
                        model
                    );
                }
            }
            Ok(Arc::new(provider))
        }
        "openai" => {
            let key = require_key(id, "OPENAI_API_KEY")?;
            Ok(Arc::new(OpenAICompatProvider::openai(key, timeout)))
        }
        "anthropic" => {
            let key = require_key(id, "ANTHROPIC_API_KEY")?;
            Ok(Arc::new(AnthropicProvider::new(key, timeout)))
        }
        "google" => {
            let key = require_key(id, "GOOGLE_API_KEY")?;
            Ok(Arc::new(GoogleProvider::new(key, timeout)))
        }
        "compat" => {
            let base_url = config.compat_base_url.clone().ok_or_else(|| {
                unavailable(id, "backends.compat_base_url is not set".to_string())
            })?;
            let key = env_value("COMPAT_API_KEY").unwrap_or_else(|| "none".into());
            Ok(Arc::new(OpenAICompatProvider::new(
                "compat",
                "OpenAI-compatible",
                key,
                base_url,
                timeout,
            )))
        }
        other => Err(unavailable(
            other,
            format!("unknown provider (known: {})", KNOWN_PROVIDERS.join(", ")),
        )),
    }
}

fn env_value(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn unavailable(id: &str, reason: String) -> BenchError {
    BenchError::BackendUnavailable {
        provider: id.to_string(),
        reason,
    }
}

fn require_key(id: &str, var: &str) -> Result<String, BenchError> {
    env_value(var).ok_or_else(|| unavailable(id, format!("{} not set", var)))
}

/// `OLLAMA_HOST` is often a bare `host:port`.
fn normalize_host(host: String) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        host
    } else {
        format!("http://{}", host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ChatRequest, ChatResponse};
    use async_trait::async_trait;

    struct Dummy;

    #[async_trait]
    impl ModelProvider for Dummy {
        fn id(&self) -> &str {
            "ollama"
        }
        fn name(&self) -> &str {
            "Dummy"
        }
        async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse, BenchError> {
            unreachable!()
        }
    }

    #[test]
    fn test_backend_binding() {
        let mut set = ProviderSet::new();
        set.insert(Arc::new(Dummy));
        set.mark_unavailable("openai", "OPENAI_API_KEY not set");
        let cfg = BackendsConfig::default();

        assert!(set.backend("ollama/llama3:8b", &cfg).is_available());
        assert!(!set.backend("openai/gpt-4o", &cfg).is_available());
        assert!(!set.backend("google/gemini-pro", &cfg).is_available());
        assert!(!set.backend("no-slash", &cfg).is_available());
    }

    #[test]
    fn test_status_lists_every_provider() {
        let mut set = ProviderSet::new();
        set.insert(Arc::new(Dummy));
        set.mark_unavailable("anthropic", "ANTHROPIC_API_KEY not set");
        let status = set.status();
        assert_eq!(status.len(), 2);
        assert_eq!(status[0].id, "anthropic");
        assert!(status[0].unavailable.is_some());
        assert_eq!(status[1].id, "ollama");
        assert!(status[1].unavailable.is_none());
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("localhost:11434".into()), "http://localhost:11434");
        assert_eq!(normalize_host("https://gpu:11434".into()), "https://gpu:11434");
    }

    #[tokio::test]
    async fn test_discover_unknown_and_compat_without_url() {
        let cfg = BackendsConfig::default();
        let set = ProviderSet::discover(&cfg, &["mystery/model", "compat/qwen"]).await;
        let status = set.status();
        assert_eq!(status.len(), 2);
        assert!(status.iter().all(|s| s.unavailable.is_some()));
    }
}
