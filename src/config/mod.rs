pub mod loader;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub classification: ClassificationConfig,
    pub summarizer: SummarizerConfig,
    pub provider: ProviderConfig,
    pub briefing: BriefingConfig,
    pub mailbox: MailboxConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Addresses (`boss@corp.com`) or domains (`@corp.com`, `corp.com`)
    pub important_senders: Vec<String>,
    /// Extra phrases that mark an email as important
    pub importance_markers: Vec<String>,
    /// Extra trigger phrases per label, merged with the built-in vocabulary
    pub extra_label_keywords: BTreeMap<String, Vec<String>>,
    pub weights: PriorityWeights,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            important_senders: Vec::new(),
            importance_markers: Vec::new(),
            extra_label_keywords: BTreeMap::new(),
            weights: PriorityWeights::default(),
        }
    }
}

/// Weights for the priority score. Every term is in [0, 1] before weighting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityWeights {
    pub base: f64,
    pub keyword_density: f64,
    /// Number of urgency keyword hits at which the density term saturates
    pub density_saturation: f64,
    pub task_bonus: f64,
    pub importance_bonus: f64,
    pub label_adjustments: BTreeMap<String, f64>,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        let mut label_adjustments = BTreeMap::new();
        label_adjustments.insert("finance".to_string(), 0.05);
        label_adjustments.insert("work".to_string(), 0.05);
        label_adjustments.insert("meeting".to_string(), 0.05);
        label_adjustments.insert("urgent".to_string(), 0.05);
        label_adjustments.insert("newsletter".to_string(), -0.2);

        Self {
            base: 0.3,
            keyword_density: 0.3,
            density_saturation: 3.0,
            task_bonus: 0.2,
            importance_bonus: 0.15,
            label_adjustments,
        }
    }
}

impl PriorityWeights {
    pub fn label_adjustment(&self, label: &str) -> f64 {
        self.label_adjustments.get(label).copied().unwrap_or(0.0)
    }

    /// Highest unclamped score an email without tasks can reach.
    pub fn ceiling_without_tasks(&self) -> f64 {
        let positive_labels: f64 = self
            .label_adjustments
            .values()
            .filter(|v| **v > 0.0)
            .sum();
        self.base + self.keyword_density + self.importance_bonus + positive_labels
    }

    /// The score must keep its ordering guarantees under clamping: tasks always
    /// add something, newsletters always take something away.
    pub fn validate(&self) -> anyhow::Result<()> {
        let scalars = [
            ("base", self.base),
            ("keyword_density", self.keyword_density),
            ("density_saturation", self.density_saturation),
            ("task_bonus", self.task_bonus),
            ("importance_bonus", self.importance_bonus),
        ];
        for (name, value) in scalars {
            if !value.is_finite() {
                bail!("priority weight {name} must be a finite number, got {value}");
            }
        }
        for (label, value) in &self.label_adjustments {
            if !value.is_finite() {
                bail!("label adjustment for {label} must be a finite number, got {value}");
            }
        }
        if self.base <= 0.0 {
            bail!("priority base weight must be positive, got {}", self.base);
        }
        if self.task_bonus <= 0.0 {
            bail!("task bonus must be positive, got {}", self.task_bonus);
        }
        if self.keyword_density < 0.0 || self.importance_bonus < 0.0 {
            bail!("keyword density and importance weights must not be negative");
        }
        if self.density_saturation < 1.0 {
            bail!(
                "density saturation must be at least one keyword hit, got {}",
                self.density_saturation
            );
        }
        if self.label_adjustment("newsletter") >= 0.0 {
            bail!("newsletter adjustment must be negative");
        }
        let ceiling = self.ceiling_without_tasks();
        if ceiling >= 1.0 {
            bail!(
                "weights allow {:.2} without tasks; must stay below 1.0 so the task bonus is never clamped away",
                ceiling
            );
        }
        let unlabeled = self.base + self.keyword_density + self.task_bonus + self.importance_bonus;
        if unlabeled >= 1.0 {
            bail!(
                "weights allow {:.2} for an unlabeled email; must stay below 1.0 so the newsletter penalty always applies",
                unlabeled
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    /// Minimum spacing between provider calls
    pub min_interval_ms: u64,
    pub cache_capacity: usize,
    /// Word target passed to the provider and used to bound fallback text
    pub max_words: usize,
    /// Characters of the body included in a single-email prompt
    pub body_excerpt_chars: usize,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 1000,
            cache_capacity: 256,
            max_words: 150,
            body_excerpt_chars: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub model: String,
    /// Inline key; takes precedence over `api_key_env`
    pub api_key: Option<String>,
    pub api_key_env: String,
    pub endpoint: String,
    pub timeout_seconds: u64,
    pub temperature: f32,
    pub email_max_output_tokens: u32,
    pub overall_max_output_tokens: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Gemini,
            model: "gemini-1.5-flash".to_string(),
            api_key: None,
            api_key_env: "GEMINI_API_KEY".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_seconds: 30,
            temperature: 0.3,
            email_max_output_tokens: 200,
            overall_max_output_tokens: 250,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BriefingConfig {
    /// Emails listed individually in the briefing digest
    pub digest_limit: usize,
    pub top_labels: usize,
    pub preview_chars: usize,
}

impl Default for BriefingConfig {
    fn default() -> Self {
        Self {
            digest_limit: 10,
            top_labels: 8,
            preview_chars: 200,
        }
    }
}

/// Longest recency window a mailbox may be asked for.
pub const MAX_WINDOW_DAYS: i64 = 365;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailboxConfig {
    pub window_days: i64,
    pub max_messages: usize,
    /// Newest messages taken when nothing falls inside the window
    pub fallback_messages: usize,
    pub body_limit_chars: usize,
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            window_days: 3,
            max_messages: 15,
            fallback_messages: 10,
            body_limit_chars: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML config: {path}"))?;
        Ok(config)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {path}"))?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.classification
            .weights
            .validate()
            .context("Invalid classification weights")?;

        for label in self.classification.extra_label_keywords.keys() {
            if !crate::rules::labels::is_known_label(label) {
                bail!("Unknown label in extra_label_keywords: {label}");
            }
        }
        if self.summarizer.cache_capacity == 0 {
            bail!("summarizer.cache_capacity must be at least 1");
        }
        if self.summarizer.max_words == 0 {
            bail!("summarizer.max_words must be at least 1");
        }
        if self.briefing.digest_limit == 0 {
            bail!("briefing.digest_limit must be at least 1");
        }
        if self.mailbox.window_days <= 0 || self.mailbox.window_days > MAX_WINDOW_DAYS {
            bail!(
                "mailbox.window_days must be between 1 and {MAX_WINDOW_DAYS}, got {}",
                self.mailbox.window_days
            );
        }
        Ok(())
    }
}
