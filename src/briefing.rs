//! Inbox briefing
//!
//! Builds the digest the overall summary is generated from, and the counts
//! shown next to it. The overall summary is cached under [`OVERALL_KEY`] and
//! its fingerprint covers every email in the batch, so any change to the
//! batch produces a fresh briefing.

use crate::config::BriefingConfig;
use crate::email::{priority_order, ClassifiedEmail};
use crate::statistics::InboxStats;
use crate::summary::fallback::overall_fallback;
use crate::summary::{
    prompts, Fingerprint, Summarizer, Summary, SummaryError, SummaryJob, SummaryKind, OVERALL_KEY,
};
use crate::text::{collapse_whitespace, truncate_chars};
use serde::Serialize;
use std::fmt::Write;

pub const EMPTY_BRIEFING: &str = "No emails to summarize.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Briefing {
    pub summary: Summary,
    pub stats: InboxStats,
}

pub struct BriefingAggregator {
    config: BriefingConfig,
}

impl BriefingAggregator {
    pub fn new(config: BriefingConfig) -> Self {
        Self { config }
    }

    pub fn statistics(&self, emails: &[ClassifiedEmail]) -> InboxStats {
        InboxStats::from_emails(emails, self.config.top_labels)
    }

    /// Plain-text digest of the batch, highest priority first.
    pub fn digest(&self, emails: &[ClassifiedEmail], stats: &InboxStats) -> String {
        let mut ordered: Vec<&ClassifiedEmail> = emails.iter().collect();
        ordered.sort_by(|a, b| priority_order(a, b));

        let mut out = String::new();
        let _ = writeln!(
            out,
            "Inbox: {} emails, {} high priority, {} with tasks, {} important.",
            stats.total, stats.high_priority, stats.with_tasks, stats.important
        );
        if !stats.top_labels.is_empty() {
            let labels: Vec<String> = stats
                .top_labels
                .iter()
                .map(|l| format!("{} ({})", l.label, l.count))
                .collect();
            let _ = writeln!(out, "Top labels: {}.", labels.join(", "));
        }

        for (i, email) in ordered.iter().take(self.config.digest_limit).enumerate() {
            let c = &email.classification;
            let _ = write!(
                out,
                "{}. [{} {:.2}] From: {} | Subject: {}",
                i + 1,
                c.band().as_str(),
                c.priority_score,
                email.email.sender_name(),
                truncate_chars(email.email.subject.trim(), 80)
            );
            if !c.labels.is_empty() {
                let labels: Vec<&str> = c.labels.iter().map(String::as_str).collect();
                let _ = write!(out, " | Labels: {}", labels.join(", "));
            }
            if let Some(task) = email.tasks.first() {
                let _ = write!(out, " | Task: {}", truncate_chars(&task.description, 80));
                if let Some(hint) = &task.time_hint {
                    let _ = write!(out, " ({})", hint);
                }
            }
            out.push('\n');

            let preview = collapse_whitespace(&email.email.body);
            if !preview.is_empty() {
                let _ = writeln!(
                    out,
                    "   Preview: {}",
                    truncate_chars(&preview, self.config.preview_chars)
                );
            }
        }

        if ordered.len() > self.config.digest_limit {
            let _ = writeln!(
                out,
                "({} more emails not listed)",
                ordered.len() - self.config.digest_limit
            );
        }
        out
    }

    /// Fingerprint over the digest and every email in the batch.
    pub fn fingerprint(digest: &str, emails: &[ClassifiedEmail]) -> Fingerprint {
        let mut ordered: Vec<&ClassifiedEmail> = emails.iter().collect();
        ordered.sort_by(|a, b| a.id().cmp(b.id()));

        let email_parts: Vec<String> = ordered
            .iter()
            .map(|e| format!("{}:{}", e.id(), e.fingerprint()))
            .collect();
        let mut parts: Vec<&str> = vec![digest];
        parts.extend(email_parts.iter().map(String::as_str));
        Fingerprint::of_parts(&parts)
    }

    pub async fn overall_summary(
        &self,
        summarizer: &Summarizer,
        emails: &[ClassifiedEmail],
    ) -> Result<Summary, SummaryError> {
        let stats = self.statistics(emails);
        self.summarize_with_stats(summarizer, emails, &stats, false)
            .await
    }

    pub async fn briefing(
        &self,
        summarizer: &Summarizer,
        emails: &[ClassifiedEmail],
        force: bool,
    ) -> Result<Briefing, SummaryError> {
        let stats = self.statistics(emails);
        let summary = self
            .summarize_with_stats(summarizer, emails, &stats, force)
            .await?;
        Ok(Briefing { summary, stats })
    }

    async fn summarize_with_stats(
        &self,
        summarizer: &Summarizer,
        emails: &[ClassifiedEmail],
        stats: &InboxStats,
        force: bool,
    ) -> Result<Summary, SummaryError> {
        if emails.is_empty() {
            return Ok(Summary {
                identifier: OVERALL_KEY.to_string(),
                text: EMPTY_BRIEFING.to_string(),
                generated_with_ai: false,
                from_cache: false,
                fallback_reason: None,
            });
        }

        let digest = self.digest(emails, stats);
        let max_words = summarizer.settings().max_words;
        let job = SummaryJob {
            identifier: OVERALL_KEY.to_string(),
            fingerprint: Self::fingerprint(&digest, emails),
            prompt: prompts::overall_prompt(&digest, max_words),
            kind: SummaryKind::Overall,
        };

        summarizer
            .run(job, || overall_fallback(emails, stats, max_words), force)
            .await
    }
}
