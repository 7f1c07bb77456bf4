//! Gemini `generateContent` backend for duty-rate interpretation.
//!
//! Transient failures (connection errors, HTTP 429 and 5xx) are retried with
//! exponential backoff; everything else fails the call immediately.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};

use crate::domain::interpreter::{DutyRateInterpreter, DutyRateRequest, InterpreterError};

/// Public Generative Language API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: usize = 2;

// Backoff delays: 250ms, 500ms, 1s, ... capped at 4s.
const BACKOFF_BASE: u64 = 2;
const BACKOFF_FACTOR_MS: u64 = 125;
const BACKOFF_MAX: Duration = Duration::from_secs(4);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate.
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

/// Duty-rate interpreter backed by a Gemini model.
pub struct GeminiInterpreter {
    endpoint: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
    max_retries: usize,
}

impl GeminiInterpreter {
    /// Creates an interpreter for `model` at `endpoint`.
    ///
    /// `request_timeout` bounds each HTTP attempt.
    ///
    /// # Errors
    ///
    /// Returns [`InterpreterError::NotConfigured`] if the API key is blank or
    /// the HTTP client cannot be built.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, InterpreterError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(InterpreterError::NotConfigured(
                "GEMINI_API_KEY is empty".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| InterpreterError::NotConfigured(e.to_string()))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            client,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Sets the number of retries after the first attempt.
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn model_url(&self) -> String {
        format!("{}/v1beta/models/{}", self.endpoint, self.model)
    }

    async fn generate_once(&self, prompt: &str) -> Result<String, InterpreterError> {
        let body = GenerateRequest {
            contents: [Content {
                role: "user",
                parts: [Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                temperature: 0.1,
            },
        };

        let response = self
            .client
            .post(format!("{}:generateContent", self.model_url()))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| InterpreterError::Communication(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(InterpreterError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| InterpreterError::InvalidResponse(format!("Failed to parse response: {e}")))?;

        parsed
            .into_text()
            .ok_or_else(|| InterpreterError::InvalidResponse("Response has no text".to_string()))
    }
}

#[async_trait]
impl DutyRateInterpreter for GeminiInterpreter {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn interpret(&self, request: &DutyRateRequest) -> Result<String, InterpreterError> {
        let prompt = request.prompt();
        let strategy = ExponentialBackoff::from_millis(BACKOFF_BASE)
            .factor(BACKOFF_FACTOR_MS)
            .max_delay(BACKOFF_MAX)
            .map(jitter)
            .take(self.max_retries);

        RetryIf::spawn(
            strategy,
            || self.generate_once(&prompt),
            |e: &InterpreterError| {
                let retry = e.is_transient();
                if retry {
                    tracing::warn!(model = %self.model, error = %e, "Gemini call failed, retrying");
                }
                retry
            },
        )
        .await
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(self.model_url())
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::warn!(error = %e, "Gemini health check failed");
                false
            }
        }
    }
}
