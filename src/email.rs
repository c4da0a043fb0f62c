use crate::domain_utils::DomainUtils;
use crate::summary::Fingerprint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Priority above which an email counts as "high" in briefings and summaries.
pub const HIGH_PRIORITY_THRESHOLD: f64 = 0.7;
/// Priority above which an email counts as "medium".
pub const MEDIUM_PRIORITY_THRESHOLD: f64 = 0.5;

/// A message as supplied by the mailbox collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailRecord {
    pub id: String,
    pub sender: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
    pub received_at: DateTime<Utc>,
}

impl EmailRecord {
    /// Content fingerprint over the fields the classification depends on.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of_parts(&[&self.sender, &self.subject, &self.body])
    }

    pub fn sender_name(&self) -> String {
        DomainUtils::display_name(&self.sender)
    }

    /// True when there is nothing at all to classify or summarize.
    pub fn is_blank(&self) -> bool {
        self.sender.trim().is_empty() && self.subject.trim().is_empty() && self.body.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub priority_score: f64,
    pub labels: BTreeSet<String>,
    pub has_tasks: bool,
    pub is_important: bool,
}

impl Classification {
    /// Classification used when there is nothing to go on.
    pub fn neutral() -> Self {
        Self {
            priority_score: 0.0,
            labels: BTreeSet::new(),
            has_tasks: false,
            is_important: false,
        }
    }

    pub fn band(&self) -> PriorityBand {
        PriorityBand::from_score(self.priority_score)
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityBand {
    High,
    Medium,
    Low,
}

impl PriorityBand {
    pub fn from_score(score: f64) -> Self {
        if score > HIGH_PRIORITY_THRESHOLD {
            PriorityBand::High
        } else if score > MEDIUM_PRIORITY_THRESHOLD {
            PriorityBand::Medium
        } else {
            PriorityBand::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityBand::High => "high",
            PriorityBand::Medium => "medium",
            PriorityBand::Low => "low",
        }
    }
}

/// A scheduling-relevant excerpt found in an email body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCandidate {
    pub description: String,
    pub time_hint: Option<String>,
}

/// An email together with its classification and the tasks behind `has_tasks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedEmail {
    #[serde(flatten)]
    pub email: EmailRecord,
    #[serde(flatten)]
    pub classification: Classification,
    #[serde(default)]
    pub tasks: Vec<TaskCandidate>,
}

impl ClassifiedEmail {
    pub fn id(&self) -> &str {
        &self.email.id
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.email.fingerprint()
    }
}

/// Ordering used for every list shown to the user.
///
/// Task-bearing emails first, then descending priority, then newest first.
/// The id is the last tie-breaker so distinct emails never compare equal.
pub fn priority_order(a: &ClassifiedEmail, b: &ClassifiedEmail) -> Ordering {
    b.classification
        .has_tasks
        .cmp(&a.classification.has_tasks)
        .then_with(|| {
            b.classification
                .priority_score
                .total_cmp(&a.classification.priority_score)
        })
        .then_with(|| b.email.received_at.cmp(&a.email.received_at))
        .then_with(|| a.email.id.cmp(&b.email.id))
}

pub fn sort_by_priority(emails: &mut [ClassifiedEmail]) {
    emails.sort_by(priority_order);
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub(crate) fn record(id: &str, sender: &str, subject: &str, body: &str) -> EmailRecord {
        EmailRecord {
            id: id.to_string(),
            sender: sender.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            received_at: Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap(),
        }
    }

    pub(crate) fn classified(id: &str, score: f64, has_tasks: bool, hour: u32) -> ClassifiedEmail {
        let mut email = record(id, "Someone <s@x.com>", id, "body");
        email.received_at = Utc.with_ymd_and_hms(2024, 5, 6, hour, 0, 0).unwrap();
        ClassifiedEmail {
            email,
            classification: Classification {
                priority_score: score,
                labels: BTreeSet::new(),
                has_tasks,
                is_important: false,
            },
            tasks: Vec::new(),
        }
    }

    fn ids(emails: &[ClassifiedEmail]) -> Vec<&str> {
        emails.iter().map(|e| e.id()).collect()
    }

    #[test]
    fn test_task_presence_outranks_score() {
        let mut batch = vec![
            classified("plain-high", 0.9, false, 9),
            classified("plain-low", 0.3, false, 9),
            classified("task", 0.6, true, 9),
        ];
        sort_by_priority(&mut batch);
        assert_eq!(ids(&batch), vec!["task", "plain-high", "plain-low"]);
    }

    #[test]
    fn test_ties_broken_by_recency_then_id() {
        let mut batch = vec![
            classified("b", 0.5, false, 8),
            classified("a", 0.5, false, 8),
            classified("newest", 0.5, false, 11),
        ];
        sort_by_priority(&mut batch);
        assert_eq!(ids(&batch), vec!["newest", "a", "b"]);
    }

    #[test]
    fn test_sort_independent_of_input_order() {
        let batch = vec![
            classified("a", 0.4, true, 7),
            classified("b", 0.4, true, 7),
            classified("c", 0.8, false, 10),
            classified("d", 0.8, false, 12),
            classified("e", 0.1, false, 12),
        ];
        let mut forward = batch.clone();
        let mut backward: Vec<_> = batch.into_iter().rev().collect();
        sort_by_priority(&mut forward);
        sort_by_priority(&mut backward);
        assert_eq!(ids(&forward), ids(&backward));

        let once = ids(&forward).join(",");
        sort_by_priority(&mut forward);
        assert_eq!(ids(&forward).join(","), once);
    }

    #[test]
    fn test_priority_band() {
        assert_eq!(PriorityBand::from_score(0.71), PriorityBand::High);
        assert_eq!(PriorityBand::from_score(0.7), PriorityBand::Medium);
        assert_eq!(PriorityBand::from_score(0.5), PriorityBand::Low);
    }

    #[test]
    fn test_fingerprint_tracks_body() {
        let a = record("1", "x@y.com", "Hi", "first");
        let mut b = a.clone();
        assert_eq!(a.fingerprint(), b.fingerprint());
        b.body.push_str(" edit");
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
