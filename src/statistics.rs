//! Inbox statistics
//!
//! Aggregate counts over one classified batch. Everything here is a pure
//! function of its input; ordering ties are broken by name so output is
//! reproducible.

use crate::email::{ClassifiedEmail, HIGH_PRIORITY_THRESHOLD};
use serde::Serialize;
use std::collections::HashMap;

/// Score above which a subject is called out in the overall summary.
pub const URGENT_SUBJECT_THRESHOLD: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SenderCount {
    pub sender: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InboxStats {
    pub total: usize,
    pub high_priority: usize,
    pub with_tasks: usize,
    pub important: usize,
    /// Most frequent labels, by descending count then label name
    pub top_labels: Vec<LabelCount>,
}

impl InboxStats {
    pub fn from_emails(emails: &[ClassifiedEmail], top_n: usize) -> Self {
        let mut label_counts: HashMap<&str, usize> = HashMap::new();
        for email in emails {
            for label in &email.classification.labels {
                *label_counts.entry(label.as_str()).or_insert(0) += 1;
            }
        }

        let mut top_labels: Vec<LabelCount> = label_counts
            .into_iter()
            .map(|(label, count)| LabelCount {
                label: label.to_string(),
                count,
            })
            .collect();
        top_labels.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
        top_labels.truncate(top_n);

        Self {
            total: emails.len(),
            high_priority: emails
                .iter()
                .filter(|e| e.classification.priority_score > HIGH_PRIORITY_THRESHOLD)
                .count(),
            with_tasks: emails.iter().filter(|e| e.classification.has_tasks).count(),
            important: emails.iter().filter(|e| e.classification.is_important).count(),
            top_labels,
        }
    }
}

/// Most frequent senders by display name.
pub fn top_senders(emails: &[ClassifiedEmail], n: usize) -> Vec<SenderCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for email in emails {
        if email.email.sender.trim().is_empty() {
            continue;
        }
        *counts.entry(email.email.sender_name()).or_insert(0) += 1;
    }

    let mut senders: Vec<SenderCount> = counts
        .into_iter()
        .map(|(sender, count)| SenderCount { sender, count })
        .collect();
    senders.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.sender.cmp(&b.sender)));
    senders.truncate(n);
    senders
}

/// Subjects of the highest-scoring emails above [`URGENT_SUBJECT_THRESHOLD`].
pub fn urgent_subjects(emails: &[ClassifiedEmail], n: usize) -> Vec<String> {
    let mut urgent: Vec<&ClassifiedEmail> = emails
        .iter()
        .filter(|e| e.classification.priority_score > URGENT_SUBJECT_THRESHOLD)
        .filter(|e| !e.email.subject.trim().is_empty())
        .collect();
    urgent.sort_by(|a, b| {
        b.classification
            .priority_score
            .total_cmp(&a.classification.priority_score)
            .then_with(|| a.email.id.cmp(&b.email.id))
    });
    urgent
        .into_iter()
        .take(n)
        .map(|e| e.email.subject.trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::tests::classified;

    fn with_labels(id: &str, score: f64, labels: &[&str]) -> ClassifiedEmail {
        let mut email = classified(id, score, false, 9);
        email.classification.labels = labels.iter().map(|s| s.to_string()).collect();
        email
    }

    #[test]
    fn test_ten_email_batch() {
        let mut emails = Vec::new();
        for i in 0..10 {
            let labels: &[&str] = match i {
                0 | 1 => &["work", "finance"],
                2 | 3 => &["work"],
                _ => &[],
            };
            let score = if i < 3 { 0.9 } else { 0.4 };
            let mut email = with_labels(&i.to_string(), score, labels);
            email.classification.has_tasks = i % 2 == 0;
            email.classification.is_important = i == 0;
            emails.push(email);
        }

        let stats = InboxStats::from_emails(&emails, 8);
        assert_eq!(stats.total, 10);
        assert_eq!(stats.high_priority, 3);
        assert_eq!(stats.with_tasks, 5);
        assert_eq!(stats.important, 1);
        assert_eq!(
            stats.top_labels,
            vec![
                LabelCount { label: "work".into(), count: 4 },
                LabelCount { label: "finance".into(), count: 2 },
            ]
        );
    }

    #[test]
    fn test_threshold_is_strict() {
        let emails = vec![with_labels("a", 0.7, &[]), with_labels("b", 0.71, &[])];
        assert_eq!(InboxStats::from_emails(&emails, 8).high_priority, 1);
    }

    #[test]
    fn test_label_ties_break_by_name_and_truncate() {
        let emails = vec![
            with_labels("a", 0.5, &["travel", "meeting", "finance"]),
            with_labels("b", 0.5, &["travel", "meeting", "finance"]),
        ];
        let stats = InboxStats::from_emails(&emails, 2);
        let names: Vec<&str> = stats.top_labels.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(names, vec!["finance", "meeting"]);
    }

    #[test]
    fn test_empty_batch() {
        let stats = InboxStats::from_emails(&[], 8);
        assert_eq!(stats.total, 0);
        assert!(stats.top_labels.is_empty());
    }

    #[test]
    fn test_top_senders_and_urgent_subjects() {
        let mut emails = vec![
            classified("1", 0.95, false, 9),
            classified("2", 0.85, false, 9),
            classified("3", 0.5, false, 9),
        ];
        emails[0].email.sender = "Boss <boss@corp.com>".into();
        emails[1].email.sender = "Boss <boss@corp.com>".into();
        emails[2].email.sender = "ana@corp.com".into();
        emails[0].email.subject = "Server down".into();
        emails[1].email.subject = "Budget sign-off".into();
        emails[2].email.subject = "Lunch".into();

        let senders = top_senders(&emails, 3);
        assert_eq!(senders[0], SenderCount { sender: "Boss".into(), count: 2 });
        assert_eq!(senders[1], SenderCount { sender: "ana".into(), count: 1 });

        assert_eq!(urgent_subjects(&emails, 3), vec!["Server down", "Budget sign-off"]);
    }
}
