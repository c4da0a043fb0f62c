use crate::email::ClassifiedEmail;
use crate::text::{collapse_whitespace, truncate_chars};

pub fn email_prompt(email: &ClassifiedEmail, max_words: usize, body_chars: usize) -> String {
    let labels: Vec<&str> = email.classification.labels.iter().map(String::as_str).collect();
    let body = truncate_chars(&collapse_whitespace(&email.email.body), body_chars);

    format!(
        "Summarize this individual email in at most {max_words} words. Use plain, conversational prose, \
no bullet points or markup. Mention who sent it, what it is about, and any action, deadline or meeting time it asks for.\n\n\
From: {sender}\n\
Subject: {subject}\n\
Priority: {score:.2} ({band})\n\
Labels: {labels}\n\
Body:\n{body}\n",
        max_words = max_words,
        sender = email.email.sender.trim(),
        subject = email.email.subject.trim(),
        score = email.classification.priority_score,
        band = email.classification.band().as_str(),
        labels = if labels.is_empty() {
            "none".to_string()
        } else {
            labels.join(", ")
        },
        body = if body.is_empty() { "(empty)".to_string() } else { body },
    )
}

pub fn overall_prompt(digest: &str, max_words: usize) -> String {
    format!(
        "Give an inbox-wide briefing to a busy person. In at most {max_words} words of plain, \
conversational prose with no markup, say what needs attention first, which meetings or deadlines are coming up, and what can wait. \
Do not list every email.\n\n{digest}\n",
        max_words = max_words,
        digest = digest.trim_end(),
    )
}

/// Prompt for free-form text handed to `Summarizer::summarize`.
pub fn text_prompt(text: &str, max_words: usize) -> String {
    format!(
        "Summarize the following in at most {max_words} words of plain, conversational prose.\n\n{text}\n",
        max_words = max_words,
        text = text.trim_end(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::tests::classified;

    #[test]
    fn test_email_prompt_includes_fields_and_bounds_body() {
        let mut email = classified("1", 0.85, true, 9);
        email.email.sender = "Boss <b@x.com>".into();
        email.email.subject = "Urgent: meeting tomorrow".into();
        email.email.body = "word ".repeat(1000);
        email.classification.labels.insert("meeting".into());

        let prompt = email_prompt(&email, 150, 100);
        assert!(prompt.contains("at most 150 words"));
        assert!(prompt.contains("individual email"));
        assert!(prompt.contains("conversational"));
        assert!(prompt.contains("From: Boss <b@x.com>"));
        assert!(prompt.contains("Subject: Urgent: meeting tomorrow"));
        assert!(prompt.contains("Priority: 0.85 (high)"));
        assert!(prompt.contains("Labels: meeting"));
        assert!(prompt.len() < 600);
    }

    #[test]
    fn test_overall_prompt_frames_inbox_briefing() {
        let prompt = overall_prompt("1. Boss: Budget review\n", 120);
        assert!(prompt.contains("inbox-wide briefing"));
        assert!(prompt.contains("conversational"));
        assert!(prompt.contains("at most 120 words"));
        assert!(prompt.ends_with("Budget review\n"));
    }

    #[test]
    fn test_empty_body_is_marked() {
        let mut email = classified("1", 0.3, false, 9);
        email.email.body = "   ".into();
        assert!(email_prompt(&email, 150, 100).contains("(empty)"));
    }
}
