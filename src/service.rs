//! Classification / summary API
//!
//! [`Assistant`] owns the rule engine, summarizer and briefing aggregator and
//! keeps the most recently classified batch so summaries can be requested by
//! email id.

use crate::briefing::{Briefing, BriefingAggregator};
use crate::config::Config;
use crate::email::{ClassifiedEmail, EmailRecord, TaskCandidate};
use crate::mailbox::Mailbox;
use crate::rules::scoring::ScoreBreakdown;
use crate::rules::RuleEngine;
use crate::statistics::InboxStats;
use crate::summary::{build_provider, Summarizer, Summary, SummaryError, TextGenerator};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, RwLock};

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("email not found: {0}")]
    EmailNotFound(String),
    #[error(transparent)]
    Summary(#[from] SummaryError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub provider: Option<String>,
    pub provider_configured: bool,
    pub classified_emails: usize,
    pub cached_summaries: usize,
    pub cache_capacity: usize,
}

pub struct Assistant {
    engine: RuleEngine,
    summarizer: Summarizer,
    briefing: BriefingAggregator,
    emails: RwLock<Vec<ClassifiedEmail>>,
}

impl Assistant {
    pub fn new(config: &Config, provider: Option<Arc<dyn TextGenerator>>) -> Result<Self> {
        Ok(Self {
            engine: RuleEngine::new(&config.classification)?,
            summarizer: Summarizer::from_config(config, provider),
            briefing: BriefingAggregator::new(config.briefing.clone()),
            emails: RwLock::new(Vec::new()),
        })
    }

    /// Build with the provider named in `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config, build_provider(&config.provider))
    }

    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    pub fn summarizer(&self) -> &Summarizer {
        &self.summarizer
    }

    /// Classify a batch, remember it, and return it in display order.
    pub fn classify_batch(&self, emails: Vec<EmailRecord>) -> Vec<ClassifiedEmail> {
        let classified = self.engine.classify_batch(emails);
        log::info!(
            "Classified {} emails ({} with tasks)",
            classified.len(),
            classified.iter().filter(|e| e.classification.has_tasks).count()
        );
        *self.emails.write().unwrap_or_else(|p| p.into_inner()) = classified.clone();
        classified
    }

    /// Pull recent mail from `mailbox` and classify it.
    pub fn refresh(&self, mailbox: &dyn Mailbox, now: DateTime<Utc>) -> Result<Vec<ClassifiedEmail>> {
        let records = mailbox.fetch_recent(now)?;
        Ok(self.classify_batch(records))
    }

    pub fn emails(&self) -> Vec<ClassifiedEmail> {
        self.emails.read().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn email(&self, id: &str) -> Option<ClassifiedEmail> {
        self.emails
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .iter()
            .find(|e| e.id() == id)
            .cloned()
    }

    fn require(&self, id: &str) -> Result<ClassifiedEmail, AssistantError> {
        self.email(id)
            .ok_or_else(|| AssistantError::EmailNotFound(id.to_string()))
    }

    pub fn tasks_for(&self, id: &str) -> Result<Vec<TaskCandidate>, AssistantError> {
        Ok(self.require(id)?.tasks)
    }

    /// Per-term score contributions; `None` for a blank email.
    pub fn explain(&self, id: &str) -> Result<Option<ScoreBreakdown>, AssistantError> {
        Ok(self.engine.explain(&self.require(id)?.email))
    }

    pub async fn email_summary(&self, id: &str) -> Result<Summary, AssistantError> {
        let email = self.require(id)?;
        Ok(self.summarizer.summarize_email(&email).await?)
    }

    pub async fn regenerate_summary(&self, id: &str) -> Result<Summary, AssistantError> {
        let email = self.require(id)?;
        log::info!("Regenerating summary for {}", id);
        Ok(self.summarizer.regenerate_email(&email).await?)
    }

    /// Overall summary and statistics for the current batch.
    pub async fn briefing(&self) -> Result<Briefing, AssistantError> {
        let emails = self.emails();
        Ok(self.briefing.briefing(&self.summarizer, &emails, false).await?)
    }

    pub async fn regenerate_briefing(&self) -> Result<Briefing, AssistantError> {
        let emails = self.emails();
        Ok(self.briefing.briefing(&self.summarizer, &emails, true).await?)
    }

    pub fn statistics(&self) -> InboxStats {
        self.briefing.statistics(&self.emails())
    }

    pub fn clear_summary_cache(&self) -> usize {
        self.summarizer.clear_cache()
    }

    pub fn health(&self) -> HealthReport {
        let provider = self.summarizer.provider_name().map(str::to_string);
        HealthReport {
            provider_configured: provider.is_some(),
            provider,
            classified_emails: self.emails.read().unwrap_or_else(|p| p.into_inner()).len(),
            cached_summaries: self.summarizer.cache().len(),
            cache_capacity: self.summarizer.cache().capacity(),
        }
    }
}
