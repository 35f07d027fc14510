// src/provider/ollama.rs — Ollama local model provider

use async_trait::async_trait;
use std::time::Duration;

use super::{http_client, openai_style_messages};
use super::{ChatRequest, ChatResponse, ModelProvider, StopReason, TokenUsage};
use crate::infra::errors::BenchError;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

pub struct OllamaProvider {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(base_url: Option<String>, request_timeout: Duration) -> Self {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_OLLAMA_URL.into());
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: http_client(request_timeout),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List locally pulled models via `/api/tags`.
    pub async fn list_models(&self) -> Result<Vec<String>, BenchError> {
        let resp = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .map_err(|e| BenchError::Provider {
                provider: "ollama".into(),
                message: format!("Cannot reach Ollama at {}: {}", self.base_url, e),
                retriable: false,
            })?;

        let body: serde_json::Value = resp.json().await.map_err(|e| BenchError::Provider {
            provider: "ollama".into(),
            message: format!("Invalid Ollama response: {}", e),
            retriable: false,
        })?;

        Ok(parse_tags(&body))
    }
}

fn parse_tags(body: &serde_json::Value) -> Vec<String> {
    body["models"]
        .as_array()
        .map(|models| {
            models
                .iter()
                .filter_map(|m| m["name"].as_str().map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

/// Ollama reports `llama3:latest` for a model pulled as `llama3`.
pub fn has_model(available: &[String], wanted: &str) -> bool {
    available
        .iter()
        .any(|m| m == wanted || m.strip_suffix(":latest") == Some(wanted))
}

#[async_trait]
impl ModelProvider for OllamaProvider {
    fn id(&self) -> &str {
        "ollama"
    }

    fn name(&self) -> &str {
        "Ollama"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, BenchError> {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": openai_style_messages(&request),
            "stream": false,
        });

        let mut options = serde_json::json!({});
        if let Some(temp) = request.temperature {
            options["temperature"] = serde_json::json!(temp);
        }
        if let Some(max_tokens) = request.max_tokens {
            options["num_predict"] = serde_json::json!(max_tokens);
        }
        if options != serde_json::json!({}) {
            body["options"] = options;
        }

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| BenchError::Provider {
                provider: "ollama".into(),
                message: e.to_string(),
                retriable: e.is_timeout() || e.is_connect(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            return Err(BenchError::Provider {
                provider: "ollama".into(),
                message: format!("HTTP {}: {}", status, error_body),
                retriable: status.is_server_error(),
            });
        }

        let resp: serde_json::Value =
            response.json().await.map_err(|e| BenchError::Provider {
                provider: "ollama".into(),
                message: format!("Failed to parse response: {}", e),
                retriable: false,
            })?;

        Ok(parse_chat_response(&resp))
    }
}

fn parse_chat_response(resp: &serde_json::Value) -> ChatResponse {
    let content = resp["message"]["content"]
        .as_str()
        .unwrap_or("")
        .to_string();

    let usage = TokenUsage {
        input_tokens: resp["prompt_eval_count"].as_u64().unwrap_or(0) as u32,
        output_tokens: resp["eval_count"].as_u64().unwrap_or(0) as u32,
    };

    let stop_reason = match resp["done_reason"].as_str() {
        Some("stop") => StopReason::EndTurn,
        Some("length") => StopReason::MaxTokens,
        _ => StopReason::Unknown,
    };

    ChatResponse {
        content,
        usage,
        stop_reason,
    }
}
