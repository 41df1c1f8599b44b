//! Ollama `/api/generate` client.

use super::prompt::PromptStyle;
use super::sanitize::ResponseSanitizer;
use crate::config::OllamaConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_TEMPERATURE: f64 = 0.3;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Read timeout for generation; local inference can take a while.
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const CONNECT_TIMEOUT_SECS: u64 = 5;
/// The health probe must answer quickly or it counts as down.
const HEALTH_TIMEOUT_SECS: u64 = 5;

// ── Request / response types ─────────────────────────────────────

/// A validated rewrite request.
#[derive(Debug, Clone, PartialEq)]
pub struct ImprovementRequest {
    original_text: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
}

impl ImprovementRequest {
    /// `None` when `text` is empty after trimming.
    pub fn new(text: &str, model: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(Self {
            original_text: text.to_string(),
            model: model.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        })
    }

    pub fn with_sampling(mut self, temperature: f64, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}

/// Outcome of one rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImprovementResponse {
    /// Model output as received; `None` when no request was made.
    pub raw_text: Option<String>,
    /// Preamble stripped and trimmed.
    pub sanitized_text: String,
}

impl ImprovementResponse {
    /// The no-op response for blank input.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.sanitized_text.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ImprovementError {
    #[error("Ollama request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Ollama returned an unexpected body: {0}")]
    Decode(String),
}

/// Native Ollama generate request (not the OpenAI-compatible one).
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f64,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

// ── Client ───────────────────────────────────────────────────────

/// Sends text to the local model and returns the cleaned-up rewrite.
pub struct ImprovementClient {
    base_url: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
    style: PromptStyle,
    sanitizer: ResponseSanitizer,
    client: reqwest::Client,
    probe: reqwest::Client,
}

impl ImprovementClient {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self::build(
            base_url,
            model,
            DEFAULT_TEMPERATURE,
            DEFAULT_MAX_TOKENS,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            Duration::from_secs(CONNECT_TIMEOUT_SECS),
        )
    }

    pub fn from_config(config: &OllamaConfig) -> Self {
        Self::build(
            &config.url,
            &config.model,
            config.temperature,
            config.max_tokens,
            Duration::from_secs(config.timeout_secs),
            Duration::from_secs(config.connect_timeout_secs),
        )
    }

    fn build(
        base_url: &str,
        model: &str,
        temperature: f64,
        max_tokens: u32,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            model: model.to_string(),
            temperature,
            max_tokens,
            style: PromptStyle::Standard,
            sanitizer: ResponseSanitizer::Standard,
            client: reqwest::Client::builder()
                .timeout(timeout)
                .connect_timeout(connect_timeout)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            probe: reqwest::Client::builder()
                .timeout(Duration::from_secs(HEALTH_TIMEOUT_SECS))
                .connect_timeout(connect_timeout)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    /// Switch prompt style; the casual style pairs with lenient cleanup.
    pub fn with_style(mut self, style: PromptStyle) -> Self {
        self.style = style;
        self.sanitizer = match style {
            PromptStyle::Standard => ResponseSanitizer::Standard,
            PromptStyle::Casual => ResponseSanitizer::Lenient,
        };
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn style(&self) -> PromptStyle {
        self.style
    }

    /// Build a request for `text`, or `None` if it is blank.
    pub fn request_for(&self, text: &str) -> Option<ImprovementRequest> {
        ImprovementRequest::new(text, &self.model)
            .map(|r| r.with_sampling(self.temperature, self.max_tokens))
    }

    /// Rewrite `text`.
    ///
    /// Blank input returns [`ImprovementResponse::empty`] without touching
    /// the network. Errors are not retried.
    pub async fn improve(&self, text: &str) -> Result<ImprovementResponse, ImprovementError> {
        let Some(request) = self.request_for(text) else {
            return Ok(ImprovementResponse::empty());
        };
        let raw = self.generate(&request).await?;
        let sanitized_text = self.sanitizer.sanitize(Some(&raw), request.original_text());
        Ok(ImprovementResponse {
            raw_text: Some(raw),
            sanitized_text,
        })
    }

    /// One `POST /api/generate`; returns the raw `response` field.
    pub async fn generate(&self, request: &ImprovementRequest) -> Result<String, ImprovementError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model: request.model(),
            prompt: self.style.build(request.original_text()),
            stream: false,
            options: GenerateOptions {
                temperature: request.temperature(),
                num_predict: request.max_tokens(),
            },
        };

        tracing::debug!(
            model = %request.model(),
            chars = request.original_text().len(),
            "Sending rewrite request"
        );
        let resp = self.client.post(&url).json(&body).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if status != reqwest::StatusCode::OK {
            return Err(ImprovementError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&text).map_err(|e| ImprovementError::Decode(e.to_string()))?;
        Ok(parsed.response)
    }

    /// `GET /api/tags` answers 200.
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self.probe.get(&url).send().await {
            Ok(resp) => resp.status() == reqwest::StatusCode::OK,
            Err(e) => {
                tracing::debug!("Health probe failed: {e}");
                false
            }
        }
    }

    /// Probe every `interval` until the endpoint answers.
    ///
    /// There is no attempt limit. Returns `false` only if `cancel` fires.
    pub async fn wait_until_ready(&self, interval: Duration, cancel: &CancellationToken) -> bool {
        tracing::info!(url = %self.base_url, "Connecting to Ollama");
        let mut attempts: u64 = 0;
        loop {
            if cancel.is_cancelled() {
                return false;
            }
            attempts += 1;
            if self.health_check().await {
                tracing::info!(attempts, "Ollama is reachable");
                return true;
            }
            tracing::debug!(attempts, "Ollama not reachable yet, retrying");
            tokio::select! {
                _ = cancel.cancelled() => return false,
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }
}

/// Drop trailing slashes and an OpenAI-style `/v1` suffix.
fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    trimmed
        .strip_suffix("/v1")
        .unwrap_or(trimmed)
        .to_string()
}
