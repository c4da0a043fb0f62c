//! Text generation providers
//!
//! The summarizer only sees [`TextGenerator`]; [`GeminiProvider`] is the one
//! hosted implementation. Tests substitute a scripted fake.

use crate::config::{ProviderConfig, ProviderKind};
use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// API keys starting with this are unedited sample values.
const PLACEHOLDER_KEY_PREFIX: &str = "your_";
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub max_output_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider not configured")]
    NotConfigured,
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("provider returned no text")]
    EmptyResponse,
    #[error("could not parse provider response: {0}")]
    Parse(String),
}

impl ProviderError {
    pub fn is_quota(&self) -> bool {
        match self {
            ProviderError::QuotaExceeded(_) => true,
            ProviderError::Api { status, message } => *status == 429 || mentions_quota(message),
            _ => false,
        }
    }
}

fn mentions_quota(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("quota") || lower.contains("rate_limit") || lower.contains("too many requests")
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError>;

    fn name(&self) -> &str;
}

/// Build the configured provider, or `None` when summaries must use fallbacks.
pub fn build_provider(config: &ProviderConfig) -> Option<Arc<dyn TextGenerator>> {
    match config.kind {
        ProviderKind::None => {
            log::info!("No summary provider configured, using fallback summaries");
            None
        }
        ProviderKind::Gemini => match GeminiProvider::from_config(config) {
            Ok(provider) => {
                log::info!("Using Gemini model {}", provider.model);
                Some(Arc::new(provider) as Arc<dyn TextGenerator>)
            }
            Err(ProviderError::NotConfigured) => {
                log::warn!(
                    "Gemini API key not set (checked config and ${}), using fallback summaries",
                    config.api_key_env
                );
                None
            }
            Err(e) => {
                log::warn!("Failed to initialize Gemini provider: {}", e);
                None
            }
        },
    }
}

pub struct GeminiProvider {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiProvider {
    pub fn new(config: &ProviderConfig, api_key: String) -> Result<Self, ProviderError> {
        if !is_usable_key(&api_key) {
            return Err(ProviderError::NotConfigured);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("mail-briefing/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    /// Key from the config file first, then from the configured environment variable.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let key = config
            .api_key
            .clone()
            .filter(|k| is_usable_key(k))
            .or_else(|| std::env::var(&config.api_key_env).ok())
            .ok_or(ProviderError::NotConfigured)?;
        Self::new(config, key)
    }

    /// The key travels in a header so it never appears in URLs or error text.
    fn request_url(&self) -> Result<Url, ProviderError> {
        Url::parse(&format!(
            "{}/models/{}:generateContent",
            self.endpoint, self.model
        ))
        .map_err(|e| ProviderError::Parse(format!("invalid endpoint: {}", e)))
    }

    fn api_key_header(&self) -> Result<HeaderValue, ProviderError> {
        let mut value = HeaderValue::from_str(self.api_key.trim())
            .map_err(|_| ProviderError::Parse("API key is not a valid header value".to_string()))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

fn transport_error(error: reqwest::Error) -> ProviderError {
    ProviderError::Http(error.without_url())
}

fn is_usable_key(key: &str) -> bool {
    let key = key.trim();
    !key.is_empty() && !key.starts_with(PLACEHOLDER_KEY_PREFIX)
}

#[async_trait]
impl TextGenerator for GeminiProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": request.prompt }] }],
            "generationConfig": {
                "temperature": request.temperature,
                "maxOutputTokens": request.max_output_tokens,
                "topP": 0.8,
                "topK": 40
            }
        });

        log::debug!(
            "Calling Gemini {} ({} prompt chars)",
            self.model,
            request.prompt.len()
        );

        let response = self
            .client
            .post(self.request_url()?)
            .header(CONTENT_TYPE, "application/json")
            .header(API_KEY_HEADER, self.api_key_header()?)
            .body(body.to_string())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            let message = api_error_message(&text);
            if status.as_u16() == 429 || mentions_quota(&message) {
                return Err(ProviderError::QuotaExceeded(message));
            }
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        parse_generate_response(&text)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Join the text parts of the first candidate.
pub(crate) fn parse_generate_response(body: &str) -> Result<String, ProviderError> {
    let response: GenerateResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    let text = text.trim();
    if text.is_empty() {
        return Err(ProviderError::EmptyResponse);
    }
    Ok(text.to_string())
}

fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => envelope.error.message,
        _ => body.chars().take(200).collect(),
    }
}
