//! Text generation backend.
//!
//! The extractor only needs `generate(prompt) -> raw text`. The production
//! implementation talks to any OpenAI-compatible `/chat/completions` endpoint.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// Longest provider error body kept in logs.
const ERROR_BODY_LOG_CHARS: usize = 500;

/// Two-part prompt: a fixed system directive and the user payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPrompt {
    pub system: String,
    pub user: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("request to model provider failed: {0}")]
    Transport(String),

    /// Provider answered with a non-success status. The body is logged, not kept.
    #[error("model provider returned {status}")]
    Status { status: StatusCode },

    #[error("model provider response was malformed: {0}")]
    Malformed(String),
}

/// Single-shot text generation with no structural guarantees on the output.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &ChatPrompt) -> Result<String, GenerationError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// OpenAI-compatible chat completion client.
pub struct OpenAiChatGenerator {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiChatGenerator {
    /// `api_url` is the API root, e.g. `https://api.openai.com/v1`.
    pub fn new(
        client: reqwest::Client,
        api_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: format!("{}/chat/completions", api_url.trim_end_matches('/')),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for OpenAiChatGenerator {
    async fn generate(&self, prompt: &ChatPrompt) -> Result<String, GenerationError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: 0.2,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(ERROR_BODY_LOG_CHARS).collect();
            tracing::error!("Model provider returned {}: {}", status, body);
            return Err(GenerationError::Status { status });
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Malformed(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| GenerationError::Malformed("no message content in response".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::HeaderMap, response::IntoResponse, routing::post};
    use serde_json::{Value, json};

    async fn completions(headers: HeaderMap, Json(body): Json<Value>) -> axum::response::Response {
        if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer sk-test") {
            return (StatusCode::UNAUTHORIZED, "bad key").into_response();
        }
        let user = body["messages"][1]["content"].as_str().unwrap_or_default();
        match user {
            "empty" => Json(json!({ "choices": [] })).into_response(),
            "boom" => (StatusCode::INTERNAL_SERVER_ERROR, "overloaded").into_response(),
            _ => {
                // Echo the request back so the test can inspect what was sent
                let content = format!(
                    "{}|{}|{}|{}",
                    body["model"].as_str().unwrap_or_default(),
                    body["messages"][0]["role"].as_str().unwrap_or_default(),
                    body["messages"][0]["content"].as_str().unwrap_or_default(),
                    user
                );
                Json(json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] }))
                    .into_response()
            }
        }
    }

    async fn spawn_provider() -> String {
        let app = Router::new().route("/v1/chat/completions", post(completions));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/v1/")
    }

    fn prompt(user: &str) -> ChatPrompt {
        ChatPrompt {
            system: "be terse".to_string(),
            user: user.to_string(),
        }
    }

    #[tokio::test]
    async fn sends_system_and_user_messages() {
        let base = spawn_provider().await;
        let generator = OpenAiChatGenerator::new(reqwest::Client::new(), &base, "sk-test", "gpt-test");

        let text = generator.generate(&prompt("hello")).await.unwrap();
        assert_eq!(text, "gpt-test|system|be terse|hello");
    }

    #[tokio::test]
    async fn provider_errors_keep_status_only() {
        let base = spawn_provider().await;
        let generator = OpenAiChatGenerator::new(reqwest::Client::new(), &base, "sk-test", "gpt-test");

        let err = generator.generate(&prompt("boom")).await.unwrap_err();
        assert!(matches!(
            err,
            GenerationError::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR
            }
        ));
        assert!(!err.to_string().contains("overloaded"));

        let wrong_key = OpenAiChatGenerator::new(reqwest::Client::new(), &base, "sk-other", "gpt-test");
        let err = wrong_key.generate(&prompt("hello")).await.unwrap_err();
        assert!(matches!(
            err,
            GenerationError::Status {
                status: StatusCode::UNAUTHORIZED
            }
        ));
    }

    #[tokio::test]
    async fn empty_choices_are_malformed() {
        let base = spawn_provider().await;
        let generator = OpenAiChatGenerator::new(reqwest::Client::new(), &base, "sk-test", "gpt-test");

        let err = generator.generate(&prompt("empty")).await.unwrap_err();
        assert!(matches!(err, GenerationError::Malformed(_)));
    }
}
