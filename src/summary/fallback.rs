//! Deterministic summaries used whenever the provider cannot answer.
//!
//! Built only from the email fields and the classification, and always cut
//! to the configured word limit.

use crate::email::{ClassifiedEmail, PriorityBand};
use crate::statistics::{top_senders, urgent_subjects, InboxStats};
use crate::text::{collapse_whitespace, join_natural, limit_words, truncate_chars};

const SUBJECT_WORDS: usize = 12;
const TASK_WORDS: usize = 15;
const PREVIEW_WORDS: usize = 25;
const OVERALL_MENTIONS: usize = 3;

/// `None` only when the email has nothing at all to describe.
pub fn email_fallback(email: &ClassifiedEmail, max_words: usize) -> Option<String> {
    if email.email.is_blank() {
        return None;
    }

    let c = &email.classification;
    let sender = if email.email.sender.trim().is_empty() {
        "an unknown sender".to_string()
    } else {
        email.email.sender_name()
    };

    let mut parts = Vec::new();

    let subject = email.email.subject.trim();
    if subject.is_empty() {
        parts.push(format!("This email from {} has no subject.", sender));
    } else {
        parts.push(format!(
            "This email from {} is about \"{}\".",
            sender,
            limit_words(subject, SUBJECT_WORDS)
        ));
    }

    if c.has_tasks {
        parts.push("It contains actionable tasks or meeting requests.".to_string());
    }

    let band = match c.band() {
        PriorityBand::High => "This is a high-priority email that requires immediate attention",
        PriorityBand::Medium => "This is a medium-priority email",
        PriorityBand::Low => "This is a low-priority email",
    };
    if c.is_important {
        parts.push(format!("{} and it is flagged as important.", band));
    } else {
        parts.push(format!("{}.", band));
    }

    if !c.labels.is_empty() {
        let labels: Vec<String> = c.labels.iter().cloned().collect();
        parts.push(format!("Topics: {}.", join_natural(&labels)));
    }

    if let Some(task) = email.tasks.first() {
        let description = limit_words(&task.description, TASK_WORDS);
        match &task.time_hint {
            Some(hint) => parts.push(format!("Next step: {} ({}).", description, hint)),
            None => parts.push(format!("Next step: {}.", description)),
        }
    }

    let body = collapse_whitespace(&email.email.body);
    if !body.is_empty() {
        parts.push(format!("Preview: {}", limit_words(&body, PREVIEW_WORDS)));
    }

    Some(limit_words(&parts.join(" "), max_words))
}

/// `None` for an empty batch.
pub fn overall_fallback(
    emails: &[ClassifiedEmail],
    stats: &InboxStats,
    max_words: usize,
) -> Option<String> {
    if emails.is_empty() {
        return None;
    }

    let mut parts = vec![format!(
        "You have {} {} with {} high-priority {} requiring attention.",
        stats.total,
        plural(stats.total, "email", "emails"),
        stats.high_priority,
        plural(stats.high_priority, "item", "items"),
    )];

    parts.push(format!(
        "{} contain tasks or meeting requests and {} {} flagged as important.",
        stats.with_tasks,
        stats.important,
        plural(stats.important, "is", "are"),
    ));

    if stats.top_labels.is_empty() {
        parts.push("No particular themes stand out.".to_string());
    } else {
        let themes: Vec<String> = stats
            .top_labels
            .iter()
            .take(OVERALL_MENTIONS)
            .map(|l| format!("{} ({})", l.label, l.count))
            .collect();
        parts.push(format!("Main themes: {}.", join_natural(&themes)));
    }

    let senders: Vec<String> = top_senders(emails, OVERALL_MENTIONS)
        .into_iter()
        .map(|s| format!("{} ({})", truncate_chars(&s.sender, 30), s.count))
        .collect();
    if !senders.is_empty() {
        parts.push(format!("Top senders: {}.", join_natural(&senders)));
    }

    let urgent: Vec<String> = urgent_subjects(emails, OVERALL_MENTIONS)
        .iter()
        .map(|s| format!("\"{}\"", truncate_chars(s, 40)))
        .collect();
    if urgent.is_empty() {
        parts.push("Nothing is marked urgent.".to_string());
    } else {
        parts.push(format!("Most urgent: {}.", join_natural(&urgent)));
    }

    if stats.high_priority == 0 && stats.with_tasks == 0 {
        parts.push("Your inbox looks manageable today.".to_string());
    }

    Some(limit_words(&parts.join(" "), max_words))
}

fn plural<'a>(n: usize, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 {
        one
    } else {
        many
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::tests::{classified, record};
    use crate::email::TaskCandidate;
    use crate::text::word_count;

    #[test]
    fn test_email_fallback_describes_classification() {
        let mut email = classified("1", 0.9, true, 9);
        email.email.sender = "Boss <b@x.com>".into();
        email.email.subject = "Urgent: meeting tomorrow".into();
        email.email.body = "Can we meet tomorrow at 3pm to discuss the budget?".into();
        email.classification.is_important = true;
        email.classification.labels = ["meeting", "urgent"].iter().map(|s| s.to_string()).collect();
        email.tasks = vec![TaskCandidate {
            description: "Can we meet tomorrow at 3pm to discuss the budget?".into(),
            time_hint: Some("tomorrow at 3pm".into()),
        }];

        let text = email_fallback(&email, 150).unwrap();
        assert!(text.starts_with("This email from Boss is about \"Urgent: meeting tomorrow\"."));
        assert!(text.contains("actionable tasks"));
        assert!(text.contains("high-priority"));
        assert!(text.contains("flagged as important"));
        assert!(text.contains("Topics: meeting and urgent."));
        assert!(text.contains("(tomorrow at 3pm)"));
        assert!(word_count(&text) <= 150);
    }

    #[test]
    fn test_email_fallback_is_bounded() {
        let mut email = classified("1", 0.2, false, 9);
        email.email.subject = "long ".repeat(500);
        email.email.body = "body ".repeat(5000);
        let text = email_fallback(&email, 40).unwrap();
        assert!(word_count(&text) <= 40);
    }

    #[test]
    fn test_email_fallback_for_sparse_emails() {
        let mut email = classified("1", 0.1, false, 9);
        email.email = record("1", "", "", "just a body");
        let text = email_fallback(&email, 150).unwrap();
        assert!(text.starts_with("This email from an unknown sender has no subject."));
        assert!(text.contains("Preview: just a body"));

        email.email = record("1", " ", "", "");
        assert!(email_fallback(&email, 150).is_none());
    }

    #[test]
    fn test_overall_fallback_mentions_counts_senders_and_urgent_items() {
        let mut emails = vec![
            classified("1", 0.95, true, 9),
            classified("2", 0.6, false, 10),
            classified("3", 0.3, false, 11),
        ];
        emails[0].email.subject = "Server down".into();
        emails[0].email.sender = "Ops <ops@corp.com>".into();
        emails[0].classification.labels.insert("urgent".into());
        emails[1].classification.labels.insert("work".into());
        emails[2].classification.labels.insert("work".into());

        let stats = InboxStats::from_emails(&emails, 8);
        let text = overall_fallback(&emails, &stats, 150).unwrap();

        assert!(text.starts_with("You have 3 emails with 1 high-priority item requiring attention."));
        assert!(text.contains("Main themes: work (2) and urgent (1)."));
        assert!(text.contains("Top senders: Someone (2) and Ops (1)."));
        assert!(text.contains("Most urgent: \"Server down\"."));
        assert!(word_count(&text) <= 150);
    }

    #[test]
    fn test_overall_fallback_quiet_inbox_and_empty_batch() {
        let emails = vec![classified("1", 0.3, false, 9)];
        let stats = InboxStats::from_emails(&emails, 8);
        let text = overall_fallback(&emails, &stats, 150).unwrap();
        assert!(text.contains("Nothing is marked urgent."));
        assert!(text.contains("manageable"));

        let empty = InboxStats::from_emails(&[], 8);
        assert!(overall_fallback(&[], &empty, 150).is_none());
    }
}
