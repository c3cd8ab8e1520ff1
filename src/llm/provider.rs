//! Model clients for the supported backend families

use anyhow::Result;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{Config, RouterType};
use crate::error::QueryError;
use crate::llm::events::QueryObserver;
use crate::llm::types::{Message, ModelResult};

/// Longest error body kept in diagnostics
const MAX_ERROR_BODY: usize = 500;

/// One request/response cycle against one backend for one model.
///
/// Implementations never fail: every error is reported to an observer and
/// turned into `None`.
#[async_trait::async_trait]
pub trait ModelClient: Send + Sync {
    /// Query `model` with `conversation`, using the client's default timeout
    /// when `timeout` is `None`
    async fn query(
        &self,
        model: &str,
        conversation: &[Message],
        timeout: Option<Duration>,
    ) -> Option<ModelResult>;

    fn name(&self) -> &str;
}

/// Wire request shared by both backends
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
}

impl<'a> ChatRequest<'a> {
    fn new(model: &'a str, messages: &'a [Message]) -> Self {
        Self {
            model,
            messages,
            stream: false,
        }
    }
}

/// Send a JSON request and decode a JSON response, classifying every failure
async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
    endpoint: &str,
    timeout: Duration,
) -> Result<T, QueryError> {
    let response = request
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| QueryError::from_transport(e, endpoint, timeout))?;

    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|e| QueryError::from_transport(e, endpoint, timeout))?;

    if !status.is_success() {
        let text = String::from_utf8_lossy(&body);
        return Err(QueryError::Status {
            status: status.as_u16(),
            body: truncate(&text, MAX_ERROR_BODY).to_string(),
        });
    }

    serde_json::from_slice(&body).map_err(|e| QueryError::Decode(e.to_string()))
}

/// Run one query and report the outcome to the observer
async fn observe<F>(observer: &dyn QueryObserver, model: &str, query: F) -> Option<ModelResult>
where
    F: std::future::Future<Output = Result<ModelResult, QueryError>>,
{
    let started = Instant::now();
    match query.await {
        Ok(result) => {
            observer.on_success(model, started.elapsed());
            Some(result)
        }
        Err(e) => {
            observer.on_failure(model, &e);
            None
        }
    }
}

/// OpenRouter provider (cloud aggregator, OpenAI-compatible API)
pub struct OpenRouterClient {
    client: Client,
    api_url: String,
    api_key: String,
    default_timeout: Duration,
    observer: Arc<dyn QueryObserver>,
}

#[derive(Deserialize)]
struct OpenRouterResponse {
    choices: Vec<OpenRouterChoice>,
}

#[derive(Deserialize)]
struct OpenRouterChoice {
    message: OpenRouterMessage,
}

#[derive(Deserialize)]
struct OpenRouterMessage {
    content: Option<String>,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    reasoning_details: Option<serde_json::Value>,
}

impl OpenRouterResponse {
    fn into_result(self) -> Result<ModelResult, QueryError> {
        let message = self
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| QueryError::Decode("response has no choices".to_string()))?;

        let content = message
            .content
            .ok_or_else(|| QueryError::Decode("message has no content".to_string()))?;

        let reasoning = message.reasoning.filter(|r| !r.is_empty()).or_else(|| {
            message
                .reasoning_details
                .filter(|d| !d.is_null())
                .map(|d| d.to_string())
        });

        Ok(ModelResult {
            content: Some(content),
            reasoning,
        })
    }
}

impl OpenRouterClient {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        default_timeout: Duration,
        observer: Arc<dyn QueryObserver>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.into(),
            api_key: api_key.into(),
            default_timeout,
            observer,
        }
    }

    async fn try_query(
        &self,
        model: &str,
        conversation: &[Message],
        timeout: Duration,
    ) -> Result<ModelResult, QueryError> {
        let request = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&ChatRequest::new(model, conversation));

        let response: OpenRouterResponse = send_json(request, &self.api_url, timeout).await?;
        response.into_result()
    }
}

#[async_trait::async_trait]
impl ModelClient for OpenRouterClient {
    async fn query(
        &self,
        model: &str,
        conversation: &[Message],
        timeout: Option<Duration>,
    ) -> Option<ModelResult> {
        let timeout = timeout.unwrap_or(self.default_timeout);
        observe(
            self.observer.as_ref(),
            model,
            self.try_query(model, conversation, timeout),
        )
        .await
    }

    fn name(&self) -> &str {
        "OpenRouter"
    }
}

/// Ollama provider (local)
pub struct OllamaClient {
    client: Client,
    url: String,
    default_timeout: Duration,
    observer: Arc<dyn QueryObserver>,
}

#[derive(Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
}

#[derive(Deserialize)]
struct OllamaMessage {
    content: Option<String>,
    #[serde(default)]
    thinking: Option<String>,
}

impl OllamaResponse {
    fn into_result(self) -> Result<ModelResult, QueryError> {
        let content = self
            .message
            .content
            .ok_or_else(|| QueryError::Decode("message has no content".to_string()))?;

        Ok(ModelResult {
            content: Some(content),
            reasoning: self.message.thinking.filter(|t| !t.is_empty()),
        })
    }
}

impl OllamaClient {
    /// `host` is `host:port` or a full base URL
    pub fn new(host: &str, default_timeout: Duration, observer: Arc<dyn QueryObserver>) -> Self {
        let base = if host.starts_with("http://") || host.starts_with("https://") {
            host.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", host.trim_end_matches('/'))
        };

        Self {
            client: Client::new(),
            url: format!("{}/api/chat", base),
            default_timeout,
            observer,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn try_query(
        &self,
        model: &str,
        conversation: &[Message],
        timeout: Duration,
    ) -> Result<ModelResult, QueryError> {
        let request = self
            .client
            .post(&self.url)
            .json(&ChatRequest::new(model, conversation));

        let response: OllamaResponse = send_json(request, &self.url, timeout).await?;
        response.into_result()
    }
}

#[async_trait::async_trait]
impl ModelClient for OllamaClient {
    async fn query(
        &self,
        model: &str,
        conversation: &[Message],
        timeout: Option<Duration>,
    ) -> Option<ModelResult> {
        let timeout = timeout.unwrap_or(self.default_timeout);
        observe(
            self.observer.as_ref(),
            model,
            self.try_query(model, conversation, timeout),
        )
        .await
    }

    fn name(&self) -> &str {
        "Ollama"
    }
}

/// Factory function to create the configured client
pub fn create_client(
    config: &Config,
    observer: Arc<dyn QueryObserver>,
) -> Result<Arc<dyn ModelClient>> {
    let timeout = config.default_timeout();
    match config.router {
        RouterType::Ollama => Ok(Arc::new(OllamaClient::new(
            &config.ollama.host,
            timeout,
            observer,
        ))),
        RouterType::OpenRouter => {
            let key = config
                .resolve_api_key()
                .ok_or_else(|| anyhow::anyhow!("OpenRouter API key required"))?;
            Ok(Arc::new(OpenRouterClient::new(
                config.openrouter.api_url.clone(),
                key,
                timeout,
                observer,
            )))
        }
    }
}

/// Truncate to at most `max_len` bytes on a char boundary
fn truncate(text: &str, max_len: usize) -> &str {
    if text.len() <= max_len {
        return text;
    }
    let mut end = max_len;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::events::TracingObserver;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_request_passes_messages_through() {
        let conversation = vec![
            Message::system("You are terse."),
            Message::user("Hi"),
            Message::assistant("Hello."),
            Message::user("What is 2+2?"),
        ];

        let value = serde_json::to_value(ChatRequest::new("m/x", &conversation)).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "model": "m/x",
                "messages": [
                    {"role": "system", "content": "You are terse."},
                    {"role": "user", "content": "Hi"},
                    {"role": "assistant", "content": "Hello."},
                    {"role": "user", "content": "What is 2+2?"},
                ],
                "stream": false,
            })
        );
    }

    #[test]
    fn test_openrouter_response_with_reasoning() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"4","reasoning":"2+2=4"}}]}"#;
        let response: OpenRouterResponse = serde_json::from_str(body).unwrap();

        assert_eq!(
            response.into_result().unwrap(),
            ModelResult::new("4").with_reasoning("2+2=4")
        );
    }

    #[test]
    fn test_openrouter_reasoning_details_fallback() {
        let body = r#"{"choices":[{"message":{"content":"4","reasoning_details":[{"type":"reasoning.text","text":"add"}]}}]}"#;
        let response: OpenRouterResponse = serde_json::from_str(body).unwrap();
        let result = response.into_result().unwrap();

        assert_eq!(result.content.as_deref(), Some("4"));
        assert_eq!(
            result.reasoning.as_deref(),
            Some(r#"[{"text":"add","type":"reasoning.text"}]"#)
        );
    }

    #[test]
    fn test_openrouter_without_reasoning() {
        let body = r#"{"choices":[{"message":{"content":"4","reasoning_details":null}}]}"#;
        let response: OpenRouterResponse = serde_json::from_str(body).unwrap();

        assert_eq!(response.into_result().unwrap(), ModelResult::new("4"));
    }

    #[test]
    fn test_openrouter_empty_choices_is_decode_error() {
        let response: OpenRouterResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(response.into_result(), Err(QueryError::Decode(_))));
    }

    #[test]
    fn test_ollama_response() {
        let body = r#"{"model":"gemma3","message":{"role":"assistant","content":"hi"},"done":true}"#;
        let response: OllamaResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.into_result().unwrap(), ModelResult::new("hi"));

        let body = r#"{"message":{"role":"assistant","content":"hi","thinking":"hmm"}}"#;
        let response: OllamaResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            response.into_result().unwrap(),
            ModelResult::new("hi").with_reasoning("hmm")
        );
    }

    #[test]
    fn test_ollama_null_content_is_decode_error() {
        let body = r#"{"message":{"role":"assistant","content":null}}"#;
        let response: OllamaResponse = serde_json::from_str(body).unwrap();
        assert!(matches!(response.into_result(), Err(QueryError::Decode(_))));
    }

    #[test]
    fn test_ollama_url_from_host() {
        let observer: Arc<dyn QueryObserver> = Arc::new(TracingObserver);
        let timeout = Duration::from_secs(1);

        let client = OllamaClient::new("localhost:11434", timeout, observer.clone());
        assert_eq!(client.url(), "http://localhost:11434/api/chat");

        let client = OllamaClient::new("https://gpu.example.com/", timeout, observer);
        assert_eq!(client.url(), "https://gpu.example.com/api/chat");
    }

    #[test]
    fn test_create_client_by_router() {
        let observer: Arc<dyn QueryObserver> = Arc::new(TracingObserver);

        let config = Config::for_router(RouterType::Ollama);
        let client = create_client(&config, observer.clone()).unwrap();
        assert_eq!(client.name(), "Ollama");

        let mut config = Config::for_router(RouterType::OpenRouter);
        config.openrouter.api_key = "sk-test".to_string();
        let client = create_client(&config, observer.clone()).unwrap();
        assert_eq!(client.name(), "OpenRouter");

        config.openrouter.api_key = String::new();
        assert!(create_client(&config, observer).is_err());
    }

    #[test]
    fn test_truncate_on_char_boundary() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello", 3), "hel");
        assert_eq!(truncate("héllo", 2), "h");
    }
}
