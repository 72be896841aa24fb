//! OpenRouter chat-completions client.
//!
//! OpenRouter exposes many model families behind one OpenAI-compatible
//! `/chat/completions` endpoint, so every backend share in a generation run
//! can go through a single provider instance.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::llm::types::{
    Choice, GenerationRequest, GenerationResponse, LlmProvider, Message, ResponseFormat, Usage,
};

/// Public OpenRouter endpoint.
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

// ============================================================================
// Connection Settings
// ============================================================================

/// Where and how the provider talks to OpenRouter.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenRouterSettings {
    /// Endpoint root without a trailing slash.
    pub base_url: String,
    /// Used when a request leaves `model` empty.
    pub fallback_model: String,
    pub timeout: Duration,
    /// Sent as `X-Title` for OpenRouter's app attribution.
    pub app_title: String,
}

impl Default for OpenRouterSettings {
    fn default() -> Self {
        Self {
            base_url: OPENROUTER_BASE_URL.to_string(),
            fallback_model: "openai/gpt-4.1".to_string(),
            timeout: Duration::from_secs(120),
            app_title: "forkgen".to_string(),
        }
    }
}

impl OpenRouterSettings {
    /// Point at an OpenRouter-compatible proxy.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_fallback_model(mut self, model: impl Into<String>) -> Self {
        self.fallback_model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

// ============================================================================
// Provider
// ============================================================================

/// Single-attempt OpenRouter client.
///
/// Retries live in [`RetryingBackend`](crate::llm::RetryingBackend); this
/// type maps one HTTP exchange onto `LlmError` variants the retry policy can
/// classify.
pub struct OpenRouterProvider {
    http: Client,
    api_key: String,
    settings: OpenRouterSettings,
}

impl OpenRouterProvider {
    /// Provider against the public endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_settings(api_key, OpenRouterSettings::default())
    }

    /// Provider reading its key from `OPENROUTER_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::MissingApiKey` if the variable is unset or blank.
    pub fn from_env() -> Result<Self, LlmError> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(Self::new)
            .ok_or(LlmError::MissingApiKey)
    }

    pub fn with_settings(api_key: impl Into<String>, settings: OpenRouterSettings) -> Self {
        let http = Client::builder()
            .timeout(settings.timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "HTTP client builder failed, falling back to defaults");
                Client::new()
            });

        Self {
            http,
            api_key: api_key.into(),
            settings,
        }
    }

    pub fn settings(&self) -> &OpenRouterSettings {
        &self.settings
    }

    /// Key safe for logs: first and last four characters only.
    pub fn api_key_masked(&self) -> String {
        let key = &self.api_key;
        match key.char_indices().nth(4) {
            Some((head, _)) if key.chars().count() > 8 => {
                let tail = key
                    .char_indices()
                    .rev()
                    .nth(3)
                    .map(|(i, _)| i)
                    .unwrap_or(head);
                format!("{}...{}", &key[..head], &key[tail..])
            }
            _ => "*".repeat(key.chars().count()),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenRouterProvider {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        let body = ChatBody::from_request(request, &self.settings.fallback_model);

        let response = self
            .http
            .post(self.settings.completions_url())
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", "https://forkgen.local")
            .header("X-Title", &self.settings.app_title)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(e.to_string())
                } else {
                    LlmError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(format!("Malformed completion body: {}", e)))?;

        Ok(completion.into())
    }
}

/// Map a non-success status and its body onto an `LlmError`.
fn status_error(status: StatusCode, body: &str) -> LlmError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| {
            if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("no body").to_string()
            } else {
                body.to_string()
            }
        });

    if status == StatusCode::TOO_MANY_REQUESTS {
        LlmError::RateLimited(message)
    } else {
        LlmError::ApiError {
            code: status.as_u16(),
            message,
        }
    }
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatBody {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

impl ChatBody {
    fn from_request(request: GenerationRequest, fallback_model: &str) -> Self {
        let model = if request.model.trim().is_empty() {
            fallback_model.to_string()
        } else {
            request.model
        };
        Self {
            model,
            messages: request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request.response_format,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    index: u32,
    message: CompletionMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

/// `content` is null when the model refuses or only calls tools.
#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default = "assistant_role")]
    role: String,
    #[serde(default)]
    content: Option<String>,
}

fn assistant_role() -> String {
    "assistant".to_string()
}

impl From<ChatCompletion> for GenerationResponse {
    fn from(completion: ChatCompletion) -> Self {
        Self {
            id: completion.id,
            model: completion.model,
            choices: completion
                .choices
                .into_iter()
                .map(|choice| Choice {
                    index: choice.index,
                    message: Message {
                        role: choice.message.role,
                        content: choice.message.content.unwrap_or_default(),
                    },
                    finish_reason: choice.finish_reason.unwrap_or_else(|| "stop".to_string()),
                })
                .collect(),
            usage: completion.usage.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let provider = OpenRouterProvider::new("sk-or-v1-0123456789");

        assert_eq!(provider.settings().base_url, OPENROUTER_BASE_URL);
        assert_eq!(provider.settings().fallback_model, "openai/gpt-4.1");
        assert_eq!(
            provider.settings().completions_url(),
            "https://openrouter.ai/api/v1/chat/completions"
        );
    }

    #[test]
    fn test_proxy_url_is_normalized() {
        let settings = OpenRouterSettings::default().with_base_url("https://proxy.internal/v1/");
        assert_eq!(settings.base_url, "https://proxy.internal/v1");
    }

    #[test]
    fn test_masking() {
        assert_eq!(OpenRouterProvider::new("abc").api_key_masked(), "***");
        assert_eq!(OpenRouterProvider::new("12345678").api_key_masked(), "********");
        assert_eq!(
            OpenRouterProvider::new("sk-or-v1-0123456789").api_key_masked(),
            "sk-o...6789"
        );
    }

    #[test]
    fn test_empty_model_uses_fallback() {
        let request = GenerationRequest::new("", vec![Message::user("hi")])
            .with_temperature(0.9)
            .with_response_format(ResponseFormat::json_object());
        let body = ChatBody::from_request(request, "openai/gpt-4.1");
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["model"], "openai/gpt-4.1");
        assert_eq!(json["temperature"], 0.9);
        assert_eq!(json["response_format"]["type"], "json_object");
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn test_completion_with_null_content() {
        let body = r#"{"id":"gen-1","model":"m","choices":[{"message":{"role":"assistant","content":null}}]}"#;
        let completion: ChatCompletion = serde_json::from_str(body).unwrap();
        let response = GenerationResponse::from(completion);

        assert_eq!(response.choices[0].message.content, "");
        assert_eq!(response.choices[0].finish_reason, "stop");
        assert_eq!(response.usage, Usage::default());
    }

    #[test]
    fn test_status_errors() {
        let limited = status_error(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"message":"slow down","code":429}}"#,
        );
        assert!(matches!(limited, LlmError::RateLimited(ref message) if message == "slow down"));

        let gateway = status_error(StatusCode::BAD_GATEWAY, "");
        assert!(matches!(gateway, LlmError::ApiError { code: 502, ref message } if message == "Bad Gateway"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let provider = OpenRouterProvider::with_settings(
            "test-key",
            OpenRouterSettings::default()
                .with_base_url("http://127.0.0.1:1")
                .with_timeout(Duration::from_secs(5)),
        );

        let result = provider
            .generate(GenerationRequest::new("m", vec![Message::user("ping")]))
            .await;

        assert!(matches!(result, Err(LlmError::RequestFailed(_))));
    }
}
