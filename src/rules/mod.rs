//! Rule engine
//!
//! Maps one [`EmailRecord`] to a [`Classification`]: keyword-driven labels, an
//! importance flag, task detection and a clamped priority score. The engine
//! holds only compiled patterns and weights, so one instance can classify
//! from many threads at once.

pub mod importance;
pub mod labels;
pub mod scoring;

use crate::config::ClassificationConfig;
use crate::email::{sort_by_priority, Classification, ClassifiedEmail, EmailRecord};
use crate::tasks::TaskExtractor;
use crate::text::truncate_chars;
use importance::ImportancePolicy;
use labels::LabelMatcher;
use scoring::{PriorityScorer, ScoreBreakdown};
use std::collections::BTreeSet;

pub struct RuleEngine {
    labels: LabelMatcher,
    importance: ImportancePolicy,
    scorer: PriorityScorer,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(&ClassificationConfig::default())
            .expect("built-in classification patterns compile")
    }
}

impl RuleEngine {
    pub fn new(config: &ClassificationConfig) -> anyhow::Result<Self> {
        Ok(Self {
            labels: LabelMatcher::new(&config.extra_label_keywords)?,
            importance: ImportancePolicy::new(
                &config.important_senders,
                &config.importance_markers,
            )?,
            scorer: PriorityScorer::new(config.weights.clone())?,
        })
    }

    pub fn classify(&self, email: &EmailRecord) -> Classification {
        self.evaluate(email).0.classification
    }

    /// Classify and keep the task candidates that justified `has_tasks`.
    pub fn classify_email(&self, email: EmailRecord) -> ClassifiedEmail {
        let (classified, breakdown) = self.evaluate_owned(email);
        if let Some(breakdown) = breakdown {
            log::debug!(
                "Classified {} ({}): {}",
                classified.email.id,
                truncate_chars(&classified.email.subject, 40),
                breakdown.evidence()
            );
        }
        classified
    }

    /// Classify a batch and return it in display order.
    pub fn classify_batch(&self, emails: Vec<EmailRecord>) -> Vec<ClassifiedEmail> {
        let mut classified: Vec<ClassifiedEmail> =
            emails.into_iter().map(|e| self.classify_email(e)).collect();
        sort_by_priority(&mut classified);
        classified
    }

    pub fn explain(&self, email: &EmailRecord) -> Option<ScoreBreakdown> {
        self.evaluate(email).1
    }

    fn evaluate(&self, email: &EmailRecord) -> (ClassifiedEmail, Option<ScoreBreakdown>) {
        self.evaluate_owned(email.clone())
    }

    fn evaluate_owned(&self, email: EmailRecord) -> (ClassifiedEmail, Option<ScoreBreakdown>) {
        if email.is_blank() {
            return (
                ClassifiedEmail {
                    email,
                    classification: Classification::neutral(),
                    tasks: Vec::new(),
                },
                None,
            );
        }

        let has_body = !email.body.trim().is_empty();
        let text = format!("{} {}", email.subject, email.body);
        let signal_text = if has_body { text.as_str() } else { email.subject.as_str() };

        // Labels and tasks need body content; without it only sender/subject signals apply.
        let labels: BTreeSet<String> = if has_body {
            self.labels.labels_for(&text)
        } else {
            BTreeSet::new()
        };
        let tasks = if has_body {
            TaskExtractor::extract(&email.body)
        } else {
            Vec::new()
        };
        let has_tasks = !tasks.is_empty();

        let is_important = self
            .importance
            .evaluate(&email.sender, signal_text, labels.contains(labels::URGENT))
            .is_some();

        let keyword_hits = self.scorer.keyword_hits(signal_text);
        let breakdown = self
            .scorer
            .score(keyword_hits, has_tasks, is_important, &labels);

        let classification = Classification {
            priority_score: breakdown.total,
            labels,
            has_tasks,
            is_important,
        };

        (
            ClassifiedEmail {
                email,
                classification,
                tasks,
            },
            Some(breakdown),
        )
    }
}
