//! A client for OpenAI-compatible chat completion endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// The endpoint used when none is configured.
pub const DEFAULT_COMPLETION_URL: &str = "https://api.openai.com/v1/chat/completions";
/// The model used when none is configured.
pub const DEFAULT_COMPLETION_MODEL: &str = "gpt-3.5-turbo";
/// How long to wait for a completion before giving up.
pub const DEFAULT_COMPLETION_TIMEOUT: Duration = Duration::from_secs(30);

const MAX_TOKENS: u32 = 400;
const TEMPERATURE: f64 = 0.7;

/// The reasons a completion could not be produced.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    /// No API key was configured, so no request was sent.
    #[error("no API key has been configured for the completion endpoint")]
    MissingApiKey,

    /// The request could not be sent or the response could not be read.
    #[error("could not reach the completion endpoint: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint responded with a non-success status code.
    #[error("the completion endpoint responded with status {status}: {body}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The response body, useful for debugging.
        body: String,
    },

    /// The response body was not the expected JSON.
    #[error("could not decode the completion response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The response did not contain any choices.
    #[error("the completion response did not contain any choices")]
    EmptyResponse,
}

/// Something that can turn a prompt into a completion.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send `prompt` as a single user message and return the trimmed text of
    /// the first choice.
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

/// Where and how to request completions.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// The URL of the chat completions endpoint.
    pub url: String,
    /// The bearer token sent with each request.
    pub api_key: Option<String>,
    /// The model identifier sent with each request.
    pub model: String,
    /// The request timeout.
    pub timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_COMPLETION_URL.to_owned(),
            api_key: None,
            model: DEFAULT_COMPLETION_MODEL.to_owned(),
            timeout: DEFAULT_COMPLETION_TIMEOUT,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Requests completions over HTTP with [reqwest].
#[derive(Debug, Clone)]
pub struct ChatCompletionClient {
    http: Client,
    config: CompletionConfig,
}

impl ChatCompletionClient {
    /// Create a client that sends requests according to `config`.
    ///
    /// # Errors
    /// Returns [CompletionError::Transport] if the HTTP client could not be built.
    pub fn new(config: CompletionConfig) -> Result<Self, CompletionError> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { http, config })
    }
}

#[async_trait]
impl CompletionClient for ChatCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(CompletionError::MissingApiKey)?;

        let request = ChatCompletionRequest {
            model: &self.config.model,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .http
            .post(&self.config.url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletionResponse = serde_json::from_str(&body)?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_owned())
            .ok_or(CompletionError::EmptyResponse)
    }
}

#[cfg(test)]
mod chat_completion_client_tests {
    use std::{
        net::SocketAddr,
        sync::{Arc, Mutex},
        time::Duration,
    };

    use axum::{Json, Router, extract::State, http::HeaderMap, http::StatusCode, routing::post};
    use serde_json::{Value, json};

    use super::{ChatCompletionClient, CompletionClient, CompletionConfig, CompletionError};

    #[derive(Clone, Default)]
    struct Captured {
        requests: Arc<Mutex<Vec<(Option<String>, Value)>>>,
    }

    async fn spawn_server(status: StatusCode, body: Value) -> (SocketAddr, Captured) {
        let captured = Captured::default();
        let app = Router::new()
            .route(
                "/v1/chat/completions",
                post(
                    move |State(captured): State<Captured>,
                          headers: HeaderMap,
                          Json(request): Json<Value>| {
                        let body = body.clone();
                        async move {
                            let authorization = headers
                                .get("authorization")
                                .and_then(|value| value.to_str().ok())
                                .map(str::to_owned);
                            captured.requests.lock().unwrap().push((authorization, request));

                            (status, Json(body))
                        }
                    },
                ),
            )
            .with_state(captured.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (address, captured)
    }

    fn client_for(address: SocketAddr, api_key: Option<&str>) -> ChatCompletionClient {
        ChatCompletionClient::new(CompletionConfig {
            url: format!("http://{address}/v1/chat/completions"),
            api_key: api_key.map(str::to_owned),
            model: "test-model".to_owned(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn sends_prompt_and_returns_trimmed_first_choice() {
        let (address, captured) = spawn_server(
            StatusCode::OK,
            json!({
                "choices": [
                    { "message": { "role": "assistant", "content": "  Spend less.\n" } },
                    { "message": { "role": "assistant", "content": "Ignored" } }
                ]
            }),
        )
        .await;
        let client = client_for(address, Some("secret-key"));

        let completion = client.complete("How am I doing?").await.unwrap();

        assert_eq!(completion, "Spend less.");
        let requests = captured.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let (authorization, request) = &requests[0];
        assert_eq!(authorization.as_deref(), Some("Bearer secret-key"));
        assert_eq!(
            request,
            &json!({
                "model": "test-model",
                "max_tokens": 400,
                "temperature": 0.7,
                "messages": [{ "role": "user", "content": "How am I doing?" }]
            })
        );
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let (address, _) =
            spawn_server(StatusCode::UNAUTHORIZED, json!({ "error": "bad key" })).await;
        let client = client_for(address, Some("wrong-key"));

        let result = client.complete("Hello").await;

        assert!(
            matches!(result, Err(CompletionError::Status { status: 401, .. })),
            "got {result:?}"
        );
    }

    #[tokio::test]
    async fn empty_choices_are_reported() {
        let (address, _) = spawn_server(StatusCode::OK, json!({ "choices": [] })).await;
        let client = client_for(address, Some("key"));

        let result = client.complete("Hello").await;

        assert!(matches!(result, Err(CompletionError::EmptyResponse)));
    }

    #[tokio::test]
    async fn unexpected_body_is_a_decode_error() {
        let (address, _) = spawn_server(StatusCode::OK, json!({ "text": "hi" })).await;
        let client = client_for(address, Some("key"));

        let result = client.complete("Hello").await;

        assert!(matches!(result, Err(CompletionError::Decode(_))));
    }

    #[tokio::test]
    async fn missing_api_key_skips_the_request() {
        let (address, captured) = spawn_server(StatusCode::OK, json!({ "choices": [] })).await;
        let client = client_for(address, None);

        let result = client.complete("Hello").await;

        assert!(matches!(result, Err(CompletionError::MissingApiKey)));
        assert!(captured.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);
        let client = client_for(address, Some("key"));

        let result = client.complete("Hello").await;

        assert!(matches!(result, Err(CompletionError::Transport(_))));
    }
}
