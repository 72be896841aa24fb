//! Text backends: one envelope in, raw model text out.
//!
//! [`TextBackend`] is the seam the category aggregator talks to. The
//! production implementation, [`RetryingBackend`], converts an envelope into a
//! chat-completion request, drives a [`RetryPolicy`] loop over an
//! [`LlmProvider`], and folds the final error into a typed [`BackendFailure`].

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use thiserror::Error;

use super::retry::RetryPolicy;
use super::types::{GenerationRequest, LlmProvider, Message, ResponseFormat};
use crate::error::LlmError;
use crate::metrics::{MetricsCollector, TokenUsage};
use crate::prompts::RequestEnvelope;

/// Category of a backend failure after retries are exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Timeout,
    RateLimited,
    MalformedContent,
    Other,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::RateLimited => "rate_limited",
            FailureKind::MalformedContent => "malformed_content",
            FailureKind::Other => "other",
        }
    }

    /// Classify a provider error.
    pub fn classify(error: &LlmError) -> Self {
        match error {
            LlmError::Timeout(_) => FailureKind::Timeout,
            LlmError::RateLimited(_) | LlmError::ApiError { code: 429, .. } => {
                FailureKind::RateLimited
            }
            LlmError::ParseError(_) => FailureKind::MalformedContent,
            LlmError::RequestFailed(msg) if msg.to_lowercase().contains("timed out") => {
                FailureKind::Timeout
            }
            _ => FailureKind::Other,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failure of a backend call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("backend call failed ({kind}) after {attempts} attempt(s): {message}")]
pub struct BackendFailure {
    pub kind: FailureKind,
    pub attempts: u32,
    pub message: String,
}

impl BackendFailure {
    pub fn new(kind: FailureKind, attempts: u32, message: impl Into<String>) -> Self {
        Self {
            kind,
            attempts,
            message: message.into(),
        }
    }
}

/// Produces raw text for a request envelope.
#[async_trait]
pub trait TextBackend: Send + Sync {
    /// Generate raw text for `envelope` using the backend identified by
    /// `backend_id`.
    ///
    /// An empty successful response is `Ok("")`, not a failure.
    async fn generate(
        &self,
        envelope: &RequestEnvelope,
        backend_id: &str,
    ) -> Result<String, BackendFailure>;
}

/// [`TextBackend`] over an [`LlmProvider`] with bounded retries.
#[derive(Clone)]
pub struct RetryingBackend {
    provider: Arc<dyn LlmProvider>,
    policy: RetryPolicy,
    metrics: MetricsCollector,
}

impl RetryingBackend {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            policy: RetryPolicy::default(),
            metrics: MetricsCollector::new(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    fn to_request(envelope: &RequestEnvelope, backend_id: &str) -> GenerationRequest {
        let request = GenerationRequest::new(
            backend_id,
            vec![
                Message::system(envelope.system.clone()),
                Message::user(envelope.user.clone()),
            ],
        )
        .with_temperature(envelope.temperature)
        .with_max_tokens(envelope.max_tokens);

        if envelope.json_output {
            request.with_response_format(ResponseFormat::json_object())
        } else {
            request
        }
    }
}

impl fmt::Debug for RetryingBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryingBackend")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TextBackend for RetryingBackend {
    async fn generate(
        &self,
        envelope: &RequestEnvelope,
        backend_id: &str,
    ) -> Result<String, BackendFailure> {
        let request = Self::to_request(envelope, backend_id);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let started = Instant::now();
            let result = self.provider.generate(request.clone()).await;
            let latency = started.elapsed().as_secs_f64();

            let error = match result {
                Ok(response) => {
                    let tokens = TokenUsage::new(
                        response.usage.prompt_tokens as u64,
                        response.usage.completion_tokens as u64,
                    );
                    let Some(content) = response.first_content() else {
                        self.metrics.record_backend_request(
                            backend_id,
                            FailureKind::MalformedContent.as_str(),
                            latency,
                            tokens,
                        );
                        return Err(BackendFailure::new(
                            FailureKind::MalformedContent,
                            attempt,
                            "response contained no choices",
                        ));
                    };
                    self.metrics
                        .record_backend_request(backend_id, "success", latency, tokens);
                    tracing::debug!(
                        model = backend_id,
                        category = %envelope.category,
                        variant = %envelope.variant,
                        attempt = attempt,
                        chars = content.len(),
                        "Backend call succeeded"
                    );
                    return Ok(content.to_string());
                }
                Err(err) => err,
            };

            let kind = FailureKind::classify(&error);
            self.metrics
                .record_backend_request(backend_id, kind.as_str(), latency, TokenUsage::default());

            if !self.policy.should_retry(attempt, &error) {
                tracing::warn!(
                    model = backend_id,
                    category = %envelope.category,
                    attempts = attempt,
                    kind = %kind,
                    error = %error,
                    "Backend call failed"
                );
                return Err(BackendFailure::new(kind, attempt, error.to_string()));
            }

            let delay = self.policy.delay_for(attempt);
            tracing::warn!(
                model = backend_id,
                attempt = attempt,
                max_attempts = self.policy.max_attempts(),
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Transient backend error, will retry"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::Category;
    use crate::dataset::VariantKind;
    use crate::llm::types::{Choice, GenerationResponse, Usage};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Fails with the queued errors, then answers with `content`.
    struct ScriptedProvider {
        failures: Mutex<Vec<LlmError>>,
        content: Option<String>,
        calls: AtomicU32,
        last_request: Mutex<Option<GenerationRequest>>,
    }

    impl ScriptedProvider {
        fn new(failures: Vec<LlmError>, content: Option<&str>) -> Self {
            Self {
                failures: Mutex::new(failures),
                content: content.map(str::to_string),
                calls: AtomicU32::new(0),
                last_request: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn generate(
            &self,
            request: GenerationRequest,
        ) -> Result<GenerationResponse, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());

            let mut failures = self.failures.lock().unwrap();
            if !failures.is_empty() {
                return Err(failures.remove(0));
            }

            let choices = self
                .content
                .iter()
                .map(|content| Choice {
                    index: 0,
                    message: Message::assistant(content.clone()),
                    finish_reason: "stop".to_string(),
                })
                .collect();

            Ok(GenerationResponse {
                id: "resp".to_string(),
                model: request.model,
                choices,
                usage: Usage::default(),
            })
        }
    }

    fn envelope(json_output: bool) -> RequestEnvelope {
        RequestEnvelope {
            category: Category::FactualRecall,
            variant: VariantKind::Traditional,
            model: "openai/gpt-4.1".to_string(),
            system: "system".to_string(),
            user: "user".to_string(),
            temperature: 0.9,
            max_tokens: 2048,
            json_output,
            requested: 4,
        }
    }

    #[tokio::test]
    async fn test_transient_failures_then_success() {
        let provider = Arc::new(ScriptedProvider::new(
            vec![
                LlmError::Timeout("slow".to_string()),
                LlmError::RateLimited("busy".to_string()),
            ],
            Some("{\"results\": []}"),
        ));
        let backend = RetryingBackend::new(provider.clone()).with_policy(RetryPolicy::immediate(3));

        let text = backend
            .generate(&envelope(true), "openai/gpt-4.1")
            .await
            .expect("third attempt succeeds");

        assert_eq!(text, "{\"results\": []}");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_reports_last_kind_and_attempts() {
        let provider = Arc::new(ScriptedProvider::new(
            vec![
                LlmError::RateLimited("busy".to_string()),
                LlmError::Timeout("slow".to_string()),
            ],
            Some("never reached"),
        ));
        let backend = RetryingBackend::new(provider.clone()).with_policy(RetryPolicy::immediate(2));

        let failure = backend
            .generate(&envelope(true), "m")
            .await
            .expect_err("attempts exhausted");

        assert_eq!(failure.kind, FailureKind::Timeout);
        assert_eq!(failure.attempts, 2);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_transient_error_is_not_retried() {
        let provider = Arc::new(ScriptedProvider::new(
            vec![LlmError::ApiError {
                code: 401,
                message: "unauthorized".to_string(),
            }],
            Some("unused"),
        ));
        let backend = RetryingBackend::new(provider.clone()).with_policy(RetryPolicy::immediate(5));

        let failure = backend.generate(&envelope(true), "m").await.unwrap_err();

        assert_eq!(failure.kind, FailureKind::Other);
        assert_eq!(failure.attempts, 1);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_content_is_success() {
        let provider = Arc::new(ScriptedProvider::new(vec![], Some("")));
        let backend = RetryingBackend::new(provider).with_policy(RetryPolicy::immediate(1));

        assert_eq!(backend.generate(&envelope(true), "m").await, Ok(String::new()));
    }

    #[tokio::test]
    async fn test_no_choices_is_malformed_content() {
        let provider = Arc::new(ScriptedProvider::new(vec![], None));
        let backend = RetryingBackend::new(provider).with_policy(RetryPolicy::immediate(3));

        let failure = backend.generate(&envelope(true), "m").await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::MalformedContent);
        assert_eq!(failure.attempts, 1);
    }

    #[tokio::test]
    async fn test_request_carries_envelope_fields() {
        let provider = Arc::new(ScriptedProvider::new(vec![], Some("ok")));
        let backend = RetryingBackend::new(provider.clone()).with_policy(RetryPolicy::immediate(1));

        backend
            .generate(&envelope(false), "openai/gpt-4.5-preview")
            .await
            .unwrap();

        let request = provider.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.model, "openai/gpt-4.5-preview");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "system");
        assert_eq!(request.temperature, Some(0.9));
        assert_eq!(request.max_tokens, Some(2048));
        assert!(request.response_format.is_none());
    }

    #[test]
    fn test_failure_kind_classification() {
        assert_eq!(
            FailureKind::classify(&LlmError::ApiError {
                code: 429,
                message: String::new()
            }),
            FailureKind::RateLimited
        );
        assert_eq!(
            FailureKind::classify(&LlmError::ParseError("bad".to_string())),
            FailureKind::MalformedContent
        );
        assert_eq!(
            FailureKind::classify(&LlmError::ApiError {
                code: 502,
                message: String::new()
            }),
            FailureKind::Other
        );
    }
}
