//! Summaries
//!
//! [`Summarizer`] turns an email (or the inbox digest) into a short prose
//! summary. Results are cached per identifier and fingerprint, provider calls
//! are spaced by a shared [`Throttle`], and only one generation per identifier
//! runs at a time. When the provider is missing, over quota or failing, a
//! deterministic fallback is produced instead, so callers always get text
//! unless the input itself is blank.

pub mod cache;
pub mod fallback;
pub mod fingerprint;
pub mod prompts;
pub mod provider;
pub mod throttle;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{SummaryCache, SummaryCacheEntry, OVERALL_KEY};
pub use fingerprint::Fingerprint;
pub use provider::{build_provider, GenerationRequest, ProviderError, TextGenerator};
pub use throttle::Throttle;

use crate::config::Config;
use crate::email::ClassifiedEmail;
use crate::text::{limit_words, word_count};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryKind {
    Email,
    Overall,
}

/// Why a summary was produced without the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FallbackReason {
    NotConfigured,
    QuotaExceeded,
    ProviderFailed(String),
}

impl From<&ProviderError> for FallbackReason {
    fn from(error: &ProviderError) -> Self {
        if error.is_quota() {
            FallbackReason::QuotaExceeded
        } else if matches!(error, ProviderError::NotConfigured) {
            FallbackReason::NotConfigured
        } else {
            FallbackReason::ProviderFailed(error.to_string())
        }
    }
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::NotConfigured => write!(f, "no provider configured"),
            FallbackReason::QuotaExceeded => write!(f, "provider quota exceeded"),
            FallbackReason::ProviderFailed(detail) => write!(f, "provider failed: {}", detail),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub identifier: String,
    pub text: String,
    pub generated_with_ai: bool,
    pub from_cache: bool,
    pub fallback_reason: Option<FallbackReason>,
}

impl Summary {
    fn from_entry(entry: SummaryCacheEntry, from_cache: bool) -> Self {
        Self {
            identifier: entry.key,
            text: entry.text,
            generated_with_ai: entry.generated_with_ai,
            from_cache,
            fallback_reason: entry.fallback_reason,
        }
    }

    pub fn word_count(&self) -> usize {
        word_count(&self.text)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    #[error("nothing to summarize for {0}")]
    Unavailable(String),
}

/// One unit of work for [`Summarizer::run`].
#[derive(Debug, Clone)]
pub struct SummaryJob {
    pub identifier: String,
    pub fingerprint: Fingerprint,
    pub prompt: String,
    pub kind: SummaryKind,
}

#[derive(Debug, Clone)]
pub struct SummarizerSettings {
    pub max_words: usize,
    pub body_excerpt_chars: usize,
    pub temperature: f32,
    pub email_max_output_tokens: u32,
    pub overall_max_output_tokens: u32,
}

impl SummarizerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_words: config.summarizer.max_words,
            body_excerpt_chars: config.summarizer.body_excerpt_chars,
            temperature: config.provider.temperature,
            email_max_output_tokens: config.provider.email_max_output_tokens,
            overall_max_output_tokens: config.provider.overall_max_output_tokens,
        }
    }

    fn max_output_tokens(&self, kind: SummaryKind) -> u32 {
        match kind {
            SummaryKind::Email => self.email_max_output_tokens,
            SummaryKind::Overall => self.overall_max_output_tokens,
        }
    }
}

impl Default for SummarizerSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

type GateMap = Mutex<HashMap<String, Arc<AsyncMutex<()>>>>;

/// Registration in the per-identifier gate map; unregisters on drop when last.
struct InFlight<'a> {
    gates: &'a GateMap,
    key: String,
    gate: Arc<AsyncMutex<()>>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut gates = self.gates.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(current) = gates.get(&self.key) {
            // map + this lease
            if Arc::ptr_eq(current, &self.gate) && Arc::strong_count(&self.gate) == 2 {
                gates.remove(&self.key);
            }
        }
    }
}

pub struct Summarizer {
    provider: Option<Arc<dyn TextGenerator>>,
    settings: SummarizerSettings,
    cache: SummaryCache,
    throttle: Throttle,
    in_flight: GateMap,
}

impl Summarizer {
    pub fn new(
        provider: Option<Arc<dyn TextGenerator>>,
        settings: SummarizerSettings,
        cache: SummaryCache,
        throttle: Throttle,
    ) -> Self {
        Self {
            provider,
            settings,
            cache,
            throttle,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &Config, provider: Option<Arc<dyn TextGenerator>>) -> Self {
        Self::new(
            provider,
            SummarizerSettings::from_config(config),
            SummaryCache::new(config.summarizer.cache_capacity),
            Throttle::new(Duration::from_millis(config.summarizer.min_interval_ms)),
        )
    }

    pub fn settings(&self) -> &SummarizerSettings {
        &self.settings
    }

    pub fn provider_name(&self) -> Option<&str> {
        self.provider.as_deref().map(|p| p.name())
    }

    pub fn cache(&self) -> &SummaryCache {
        &self.cache
    }

    pub fn clear_cache(&self) -> usize {
        let removed = self.cache.clear();
        log::info!("Cleared {} cached summaries", removed);
        removed
    }

    /// Summarize arbitrary text under `identifier`.
    ///
    /// `fallback` is only invoked when the provider cannot produce text.
    pub async fn summarize<F>(
        &self,
        identifier: &str,
        text: &str,
        kind: SummaryKind,
        fallback: F,
    ) -> Result<Summary, SummaryError>
    where
        F: FnOnce() -> Option<String>,
    {
        let prompt = match kind {
            SummaryKind::Email => prompts::text_prompt(text, self.settings.max_words),
            SummaryKind::Overall => prompts::overall_prompt(text, self.settings.max_words),
        };
        let job = SummaryJob {
            identifier: identifier.to_string(),
            fingerprint: Fingerprint::of(text),
            prompt,
            kind,
        };
        self.run(job, fallback, false).await
    }

    pub async fn summarize_email(&self, email: &ClassifiedEmail) -> Result<Summary, SummaryError> {
        self.email_job(email, false).await
    }

    /// Like [`summarize_email`](Self::summarize_email) but ignores any cached entry.
    pub async fn regenerate_email(&self, email: &ClassifiedEmail) -> Result<Summary, SummaryError> {
        self.email_job(email, true).await
    }

    async fn email_job(&self, email: &ClassifiedEmail, force: bool) -> Result<Summary, SummaryError> {
        if email.email.is_blank() {
            return Err(SummaryError::Unavailable(email.id().to_string()));
        }

        let job = SummaryJob {
            identifier: email.id().to_string(),
            fingerprint: email.fingerprint(),
            prompt: prompts::email_prompt(
                email,
                self.settings.max_words,
                self.settings.body_excerpt_chars,
            ),
            kind: SummaryKind::Email,
        };
        let max_words = self.settings.max_words;
        self.run(job, || fallback::email_fallback(email, max_words), force)
            .await
    }

    fn enter(&self, key: &str) -> InFlight<'_> {
        let mut gates = self.in_flight.lock().unwrap_or_else(|p| p.into_inner());
        let gate = gates
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone();
        InFlight {
            gates: &self.in_flight,
            key: key.to_string(),
            gate,
        }
    }

    /// Serve from cache or generate, storing whatever is produced.
    pub async fn run<F>(&self, job: SummaryJob, fallback: F, force: bool) -> Result<Summary, SummaryError>
    where
        F: FnOnce() -> Option<String>,
    {
        let key = job.identifier.as_str();

        if !force {
            if let Some(entry) = self.cache.get(key, &job.fingerprint) {
                log::info!("Using cached summary for {}", key);
                return Ok(Summary::from_entry(entry, true));
            }
        }

        let seen = self.cache.stamp(key);
        let lease = self.enter(key);
        let _permit = lease.gate.lock().await;

        // Another caller may have stored a result while we waited.
        if let Some((entry, stamp)) = self.cache.get_stamped(key, &job.fingerprint) {
            if !force || Some(stamp) != seen {
                log::debug!("Reusing summary for {} produced by a concurrent request", key);
                return Ok(Summary::from_entry(entry, true));
            }
        }

        let outcome = match &self.provider {
            None => Err(FallbackReason::NotConfigured),
            Some(provider) => {
                let request = GenerationRequest {
                    prompt: job.prompt.clone(),
                    max_output_tokens: self.settings.max_output_tokens(job.kind),
                    temperature: self.settings.temperature,
                };
                match self.throttle.run(provider.generate(&request)).await {
                    Ok(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
                    Ok(_) => Err(FallbackReason::from(&ProviderError::EmptyResponse)),
                    Err(e) => {
                        if e.is_quota() {
                            log::warn!("Provider quota exceeded while summarizing {}", key);
                        } else {
                            log::error!("Provider failed while summarizing {}: {}", key, e);
                        }
                        Err(FallbackReason::from(&e))
                    }
                }
            }
        };

        let entry = match outcome {
            Ok(text) => {
                log::info!(
                    "Generated summary for {} ({} words)",
                    key,
                    word_count(&text)
                );
                SummaryCacheEntry {
                    key: key.to_string(),
                    fingerprint: job.fingerprint,
                    text,
                    generated_with_ai: true,
                    fallback_reason: None,
                }
            }
            Err(reason) => {
                let text = fallback()
                    .map(|t| limit_words(&t, self.settings.max_words))
                    .filter(|t| !t.is_empty())
                    .ok_or_else(|| SummaryError::Unavailable(key.to_string()))?;
                log::info!(
                    "Using fallback summary for {} ({}, {} words)",
                    key,
                    reason,
                    word_count(&text)
                );
                SummaryCacheEntry {
                    key: key.to_string(),
                    fingerprint: job.fingerprint,
                    text,
                    generated_with_ai: false,
                    fallback_reason: Some(reason),
                }
            }
        };

        self.cache.insert(entry.clone());
        Ok(Summary::from_entry(entry, false))
    }
}
