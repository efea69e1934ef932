// Chat-completion client for playlist generation
//
// Implements the single outbound generation call: fixed model, system
// instruction plus one user message, token limit. One attempt per
// invocation — a failing call surfaces immediately rather than retrying
// against an already-loaded endpoint.

use std::time::Duration;

use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::ai::prompt_builder::Prompt;
use crate::ai::system_prompt::SYSTEM_PROMPT;
use crate::error::Error;

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const OPENAI_MODEL: &str = "gpt-3.5-turbo";
const MAX_TOKENS: u32 = 4096;
const VERIFY_MAX_TOKENS: u32 = 50;

/// Message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String, // "system" or "user"
    pub content: String,
}

/// Request to the chat-completion endpoint
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

/// Response envelope from the chat-completion endpoint
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

pub struct OpenAiClient {
    api_key: String,
    endpoint: String,
    http: Client,
}

impl OpenAiClient {
    /// Create a client for the default endpoint with the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self, Error> {
        Self::with_endpoint(api_key, OPENAI_API_URL)
    }

    /// Create a client against an OpenAI-compatible gateway instead of
    /// the default endpoint.
    pub fn with_endpoint(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Result<Self, Error> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::Auth("no API key configured".to_string()));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| Error::Network(format!("failed to create HTTP client: {}", e)))?;

        Ok(OpenAiClient {
            api_key,
            endpoint: endpoint.into(),
            http,
        })
    }

    /// Send the compiled prompt and return the model's raw reply text.
    pub async fn generate(&self, prompt: &Prompt) -> Result<String, Error> {
        self.chat(
            Message {
                role: "user".to_string(),
                content: prompt.text.clone(),
            },
            MAX_TOKENS,
        )
        .await
    }

    /// Cheap round-trip to check that the key is accepted.
    pub async fn verify_key(&self) -> Result<(), Error> {
        self.chat(
            Message {
                role: "user".to_string(),
                content: "Hello! Please respond with a brief greeting.".to_string(),
            },
            VERIFY_MAX_TOKENS,
        )
        .await
        .map(|_| ())
    }

    async fn chat(&self, user_message: Message, max_tokens: u32) -> Result<String, Error> {
        let request = ChatRequest {
            model: OPENAI_MODEL.to_string(),
            max_tokens,
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                user_message,
            ],
        };

        let response = self
            .http
            .post(&self.endpoint)
            .header(header::CONTENT_TYPE, "application/json")
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Network(format!("generation request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Auth(format!("API key rejected: {}", body)));
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(Error::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Protocol(format!("failed to parse generation response: {}", e)))?;

        if let Some(usage) = &parsed.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "generation complete"
            );
        }

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::Protocol("generation response contained no choices".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::{IntoResponse, Response};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[derive(Clone)]
    struct MockChat {
        reply: String,
        fail_status: Option<u16>,
        seen_request: Arc<Mutex<Option<serde_json::Value>>>,
    }

    async fn chat_handler(
        State(state): State<MockChat>,
        headers: HeaderMap,
        Json(body): Json<serde_json::Value>,
    ) -> Response {
        *state.seen_request.lock().unwrap() = Some(body);

        let authorized = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(|v| v == "Bearer sk-good")
            .unwrap_or(false);
        if !authorized {
            return (StatusCode::UNAUTHORIZED, "invalid api key").into_response();
        }

        if let Some(status) = state.fail_status {
            return (
                StatusCode::from_u16(status).unwrap(),
                "upstream is overloaded",
            )
                .into_response();
        }

        Json(json!({
            "choices": [ { "message": { "role": "assistant", "content": state.reply } } ],
            "usage": { "prompt_tokens": 12, "completion_tokens": 5, "total_tokens": 17 }
        }))
        .into_response()
    }

    async fn spawn_server(state: MockChat) -> String {
        let app = Router::new()
            .route("/v1/chat/completions", post(chat_handler))
            .with_state(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/v1/chat/completions", addr)
    }

    fn mock_state(reply: &str, fail_status: Option<u16>) -> MockChat {
        MockChat {
            reply: reply.to_string(),
            fail_status,
            seen_request: Arc::new(Mutex::new(None)),
        }
    }

    #[test]
    fn test_empty_key_rejected_on_construction() {
        assert!(matches!(OpenAiClient::new("  "), Err(Error::Auth(_))));
    }

    #[tokio::test]
    async fn test_generate_returns_reply_content() {
        let state = mock_state(r#"["a","b"]"#, None);
        let seen = state.seen_request.clone();
        let endpoint = spawn_server(state).await;

        let client = OpenAiClient::with_endpoint("sk-good", endpoint).unwrap();
        let prompt = Prompt {
            text: "pick two songs".to_string(),
        };
        let reply = client.generate(&prompt).await.unwrap();
        assert_eq!(reply, r#"["a","b"]"#);

        // The request carries the fixed model, the system instruction and
        // the compiled prompt as the user message.
        let request = seen.lock().unwrap().clone().unwrap();
        assert_eq!(request["model"], "gpt-3.5-turbo");
        assert_eq!(request["messages"][0]["role"], "system");
        assert_eq!(request["messages"][1]["role"], "user");
        assert_eq!(request["messages"][1]["content"], "pick two songs");
        assert!(request["max_tokens"].is_u64());
    }

    #[tokio::test]
    async fn test_rejected_key_maps_to_auth_error() {
        let endpoint = spawn_server(mock_state("", None)).await;

        let client = OpenAiClient::with_endpoint("sk-wrong", endpoint).unwrap();
        let result = client.verify_key().await;
        assert!(matches!(result, Err(Error::Auth(_))));
    }

    #[tokio::test]
    async fn test_upstream_error_carries_body() {
        let endpoint = spawn_server(mock_state("", Some(503))).await;

        let client = OpenAiClient::with_endpoint("sk-good", endpoint).unwrap();
        let prompt = Prompt {
            text: "anything".to_string(),
        };
        match client.generate(&prompt).await {
            Err(Error::Upstream { status, body }) => {
                assert_eq!(status, 503);
                assert!(body.contains("overloaded"));
            }
            other => panic!("expected upstream error, got {:?}", other.map(|_| ())),
        }
    }
}
