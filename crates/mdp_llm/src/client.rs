//! A minimal OpenAI-compatible chat completion client, shared by the
//! detector (small model, strict-JSON plans) and the fixer (larger model,
//! free-text polish) stages.

use crate::error::LlmError;
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system", content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user", content: content.into() }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
    top_p: f64,
    max_tokens: u32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

pub struct ChatClientConfig {
    pub api_base: String,
    pub model: String,
    pub timeout: Duration,
    pub retries: u32,
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
    pub seed: Option<u64>,
}

pub struct ChatClient {
    http: reqwest::Client,
    config: ChatClientConfig,
    retry_policy: RetryPolicy,
}

impl ChatClient {
    pub fn new(config: ChatClientConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("failed to build HTTP client");
        let retry_policy = RetryPolicy::from_config(config.retries);
        Self { http, config, retry_policy }
    }

    /// Sends one chat-completion request, retrying transient failures under
    /// `retry_policy`. Returns the raw response content, not yet parsed as
    /// a plan or validated in any way.
    pub async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, LlmError> {
        self.retry_policy
            .execute(|| self.complete_once(messages.clone()))
            .await
    }

    async fn complete_once(&self, messages: Vec<ChatMessage>) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'));
        let body = ChatRequest {
            model: self.config.model.clone(),
            messages,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            max_tokens: self.config.max_tokens,
            stream: false,
            seed: self.config.seed,
        };

        let response = self.http.post(&url).json(&body).send().await.map_err(classify_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Http { status: status.as_u16(), url, body });
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();
        Ok(content)
    }
}

fn classify_reqwest_error(err: reqwest::Error) -> LlmError {
    if err.is_timeout() {
        LlmError::Timeout(Duration::from_secs(0))
    } else if err.is_connect() {
        LlmError::Connection(err.to_string())
    } else {
        LlmError::Network(err)
    }
}

/// Extracts the first balanced JSON array from `text`. The detector's
/// model sometimes wraps its array in prose; this recovers the array
/// without requiring the whole response to be valid JSON.
pub fn extract_json_array(text: &str) -> Result<serde_json::Value, LlmError> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(text) {
        if value.is_array() {
            return Ok(value);
        }
    }
    let start = text.find('[').ok_or(LlmError::NoJsonArray)?;
    let mut depth = 0i32;
    for (offset, ch) in text[start..].char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return serde_json::from_str(&text[start..end]).map_err(LlmError::from);
                }
            }
            _ => {}
        }
    }
    Err(LlmError::NoJsonArray)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn complete_posts_body_and_returns_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "[]"}}]
            })))
            .mount(&server)
            .await;

        let client = ChatClient::new(ChatClientConfig {
            api_base: format!("{}/v1", server.uri()),
            model: "local-small".into(),
            timeout: Duration::from_secs(2),
            retries: 0,
            temperature: 0.2,
            top_p: 0.9,
            max_tokens: 128,
            seed: None,
        });

        let result = client.complete(vec![ChatMessage::user("hi")]).await.unwrap();
        assert_eq!(result, "[]");
    }

    #[tokio::test]
    async fn complete_surfaces_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = ChatClient::new(ChatClientConfig {
            api_base: format!("{}/v1", server.uri()),
            model: "local-small".into(),
            timeout: Duration::from_secs(2),
            retries: 0,
            temperature: 0.2,
            top_p: 0.9,
            max_tokens: 128,
            seed: None,
        });

        let err = client.complete(vec![ChatMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, LlmError::Http { status: 500, .. }));
    }

    #[test]
    fn extract_json_array_recovers_array_wrapped_in_prose() {
        let text = "Sure, here is the plan:\n[{\"find\":\"a\",\"replace\":\"b\"}]\nDone.";
        let value = extract_json_array(text).unwrap();
        assert!(value.is_array());
        assert_eq!(value.as_array().unwrap().len(), 1);
    }

    #[test]
    fn extract_json_array_fails_without_brackets() {
        assert!(matches!(extract_json_array("no array here"), Err(LlmError::NoJsonArray)));
    }
}
