// src/provider/openai_compat.rs — Generic OpenAI-compatible provider
//
// Used for OpenAI itself and for any endpoint speaking `/chat/completions`
// (vLLM, LM Studio, Together, Groq, Ollama's `/v1` shim, ...).

use async_trait::async_trait;
use std::time::Duration;

use super::{http_client, openai_style_messages};
use super::{ChatRequest, ChatResponse, ModelProvider, StopReason, TokenUsage};
use crate::infra::errors::BenchError;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAICompatProvider {
    id_str: String,
    name_str: String,
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAICompatProvider {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        api_key: String,
        base_url: String,
        request_timeout: Duration,
    ) -> Self {
        Self {
            id_str: id.into(),
            name_str: name.into(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            client: http_client(request_timeout),
        }
    }

    pub fn openai(api_key: String, request_timeout: Duration) -> Self {
        Self::new(
            "openai",
            "OpenAI",
            api_key,
            OPENAI_BASE_URL.into(),
            request_timeout,
        )
    }

    fn build_request_body(&self, request: &ChatRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": openai_style_messages(request),
        });
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }
        if let Some(temp) = request.temperature {
            body["temperature"] = serde_json::json!(temp);
        }
        body
    }
}

#[async_trait]
impl ModelProvider for OpenAICompatProvider {
    fn id(&self) -> &str {
        &self.id_str
    }

    fn name(&self) -> &str {
        &self.name_str
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, BenchError> {
        let body = self.build_request_body(&request);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| BenchError::Provider {
                provider: self.id_str.clone(),
                message: e.to_string(),
                retriable: e.is_timeout() || e.is_connect(),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5);
            return Err(BenchError::RateLimited {
                provider: self.id_str.clone(),
                retry_after_ms: retry_after * 1000,
            });
        }

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(BenchError::Provider {
                provider: self.id_str.clone(),
                message: format!("HTTP {}: {}", status, error_body),
                retriable: status.is_server_error(),
            });
        }

        let resp: serde_json::Value =
            response.json().await.map_err(|e| BenchError::Provider {
                provider: self.id_str.clone(),
                message: e.to_string(),
                retriable: false,
            })?;

        Ok(parse_chat_response(&resp))
    }
}

fn parse_chat_response(resp: &serde_json::Value) -> ChatResponse {
    let content = resp["choices"][0]["message"]["content"]
        .as_str()
        .unwrap_or("")
        .to_string();

    let usage = TokenUsage {
        input_tokens: resp["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32,
        output_tokens: resp["usage"]["completion_tokens"].as_u64().unwrap_or(0) as u32,
    };

    let stop_reason = match resp["choices"][0]["finish_reason"].as_str() {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Message;

    #[test]
    fn test_build_request_body() {
        let p = OpenAICompatProvider::openai("sk-test".into(), Duration::from_secs(5));
        let req = ChatRequest {
            model: "gpt-4o".into(),
            messages: vec![Message::user("Problem:\nadd two numbers")],
            max_tokens: Some(2048),
            temperature: Some(0.1),
            system: Some("You are an expert Python programmer.".into()),
        };
        let body = p.build_request_body(&req);
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["messages"].as_array().unwrap().len(), 2);
        assert_eq!(body["max_tokens"], 2048);
        assert!(body["temperature"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn test_parse_chat_response() {
        let resp = serde_json::json!({
            "choices": [{
                "message": {"role": "assistant", "content": "```python\nprint(1)\n```"},
                "finish_reason": "length"
            }],
            "usage": {"prompt_tokens": 30, "completion_tokens": 12, "total_tokens": 42}
        });
        let parsed = parse_chat_response(&resp);
        assert_eq!(parsed.content, "```python\nprint(1)\n```");
        assert_eq!(parsed.usage.total(), 42);
        assert!(matches!(parsed.stop_reason, StopReason::MaxTokens));
    }

    #[test]
    fn test_parse_chat_response_missing_fields() {
        let parsed = parse_chat_response(&serde_json::json!({}));
        assert_eq!(parsed.content, "");
        assert_eq!(parsed.usage.total(), 0);
    }

    #[test]
    fn test_custom_identity() {
        let p = OpenAICompatProvider::new(
            "compat",
            "vLLM",
            "none".into(),
            "http://localhost:8000/v1/".into(),
            Duration::from_secs(5),
        );
        assert_eq!(p.id(), "compat");
        assert_eq!(p.name(), "vLLM");
        assert_eq!(p.base_url, "http://localhost:8000/v1");
    }
}
