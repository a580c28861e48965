/// LLM Client: the single point of entry for all vision model calls in RoomFit.
///
/// ARCHITECTURAL RULE: No other module may call the provider API directly.
/// All model interactions MUST go through this module.
///
/// Speaks the OpenAI-compatible chat completions protocol. One request per call:
/// no retries, and no timeout beyond the HTTP client's defaults.
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod prompts;

/// Upper bound on the model's output for a single analysis.
pub const MAX_OUTPUT_TOKENS: u32 = 4000;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    response_format: ResponseFormat,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Debug, Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content of the first choice.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// The single LLM client used by all services in RoomFit.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    model: String,
    completions_url: String,
}

impl LlmClient {
    pub fn new(api_key: String, model: String, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
            completions_url: format!("{}/chat/completions", base_url.trim_end_matches('/')),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends one user turn made of `prompt` plus an image (as a `data:` URL) and asks for a
    /// JSON-object response. Returns the full response object.
    pub async fn call_with_image(
        &self,
        prompt: &str,
        system: &str,
        image_data_url: &str,
    ) -> Result<LlmResponse, LlmError> {
        let request_body = ChatRequest {
            model: &self.model,
            max_tokens: MAX_OUTPUT_TOKENS,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: vec![ContentPart::Text { text: system }],
                },
                ChatMessage {
                    role: "user",
                    content: vec![
                        ContentPart::Text { text: prompt },
                        ContentPart::ImageUrl {
                            image_url: ImageUrl {
                                url: image_data_url,
                            },
                        },
                    ],
                },
            ],
        };

        let response = self
            .client
            .post(&self.completions_url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Try to parse error message
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let llm_response: LlmResponse = response.json().await?;

        if let Some(usage) = &llm_response.usage {
            debug!(
                "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        Ok(llm_response)
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    /// Captured (authorization header, request body) of the last call.
    pub(crate) type Captured = Arc<Mutex<Option<(String, Value)>>>;

    /// Spawns a local chat-completions stub that answers every call with `reply`
    /// and `status`. Returns its base URL.
    pub(crate) async fn spawn_provider_stub(
        status: u16,
        reply: Value,
        captured: Captured,
    ) -> String {
        let app = Router::new()
            .route(
                "/v1/chat/completions",
                post(
                    move |State(captured): State<Captured>,
                          headers: HeaderMap,
                          Json(body): Json<Value>| {
                        let reply = reply.clone();
                        async move {
                            let auth = headers
                                .get("authorization")
                                .and_then(|v| v.to_str().ok())
                                .unwrap_or_default()
                                .to_string();
                            *captured.lock().unwrap() = Some((auth, body));
                            (
                                axum::http::StatusCode::from_u16(status).unwrap(),
                                Json(reply),
                            )
                        }
                    },
                ),
            )
            .with_state(captured);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/v1")
    }

    pub(crate) fn completion(content: &str) -> Value {
        json!({
            "choices": [{"message": {"role": "assistant", "content": content}}],
            "usage": {"prompt_tokens": 1200, "completion_tokens": 300}
        })
    }

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_completions_url_ignores_trailing_slash() {
        let client = LlmClient::new("k".into(), "m".into(), "https://example.test/v1/");
        assert_eq!(
            client.completions_url,
            "https://example.test/v1/chat/completions"
        );
    }

    #[tokio::test]
    async fn test_request_carries_image_and_json_format() {
        let captured: Captured = Arc::default();
        let base = spawn_provider_stub(200, completion("{}"), captured.clone()).await;
        let client = LlmClient::new("sk-test".into(), "vision-model".into(), &base);

        let response = client
            .call_with_image("describe", "system text", "data:image/png;base64,AAAA")
            .await
            .unwrap();
        assert_eq!(response.text(), Some("{}"));

        let (auth, body) = captured.lock().unwrap().clone().unwrap();
        assert_eq!(auth, "Bearer sk-test");
        assert_eq!(body["model"], "vision-model");
        assert_eq!(body["max_tokens"], MAX_OUTPUT_TOKENS);
        assert_eq!(body["response_format"]["type"], "json_object");
        let user = &body["messages"][1];
        assert_eq!(user["role"], "user");
        assert_eq!(user["content"][0]["type"], "text");
        assert_eq!(user["content"][0]["text"], "describe");
        assert_eq!(user["content"][1]["type"], "image_url");
        assert_eq!(
            user["content"][1]["image_url"]["url"],
            "data:image/png;base64,AAAA"
        );
    }

    #[tokio::test]
    async fn test_partial_usage_does_not_fail_the_call() {
        let base = spawn_provider_stub(
            200,
            json!({
                "choices": [{"message": {"content": "{}"}}],
                "usage": {"total_tokens": 5}
            }),
            Arc::default(),
        )
        .await;
        let client = LlmClient::new("k".into(), "m".into(), &base);

        let response = client
            .call_with_image("p", "s", "data:image/png;base64,AAAA")
            .await
            .unwrap();
        assert_eq!(response.text(), Some("{}"));
        let usage = response.usage.unwrap();
        assert_eq!(usage.prompt_tokens, 0);
        assert_eq!(usage.completion_tokens, 0);
    }

    #[tokio::test]
    async fn test_error_status_surfaces_provider_message() {
        let captured: Captured = Arc::default();
        let base = spawn_provider_stub(
            401,
            json!({"error": {"message": "Incorrect API key provided"}}),
            captured,
        )
        .await;
        let client = LlmClient::new("bad".into(), "m".into(), &base);

        let err = client
            .call_with_image("p", "s", "data:image/png;base64,AAAA")
            .await
            .unwrap_err();
        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Incorrect API key provided");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
