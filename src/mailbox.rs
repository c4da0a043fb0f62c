//! Mailbox collaborator
//!
//! The core only needs a recent, bounded batch of [`EmailRecord`]s. The JSON
//! mailbox reads an exported message list from disk and applies the same
//! window, limits and body clean-up a live mailbox would.

use crate::config::{MailboxConfig, MAX_WINDOW_DAYS};
use crate::email::EmailRecord;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};

lazy_static! {
    static ref HTML_HINT: Regex =
        Regex::new(r"(?i)<(?:html|body|div|p|br|table|span|a|font|td)\b[^>]*>").unwrap();
    static ref SCRIPT_BLOCK: Regex = Regex::new(r"(?is)<script\b.*?</script\s*>").unwrap();
    static ref STYLE_BLOCK: Regex = Regex::new(r"(?is)<style\b.*?</style\s*>").unwrap();
    static ref LINE_BREAK_TAG: Regex =
        Regex::new(r"(?i)<br\s*/?>|</p\s*>|</div\s*>|</tr\s*>|</li\s*>").unwrap();
    static ref ANY_TAG: Regex = Regex::new(r"<[^>]*>").unwrap();
}

pub trait Mailbox: Send + Sync {
    /// Messages received shortly before `now`, newest first.
    fn fetch_recent(&self, now: DateTime<Utc>) -> Result<Vec<EmailRecord>>;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MailboxExport {
    List(Vec<EmailRecord>),
    Wrapped { messages: Vec<EmailRecord> },
}

pub struct JsonMailbox {
    path: PathBuf,
    config: MailboxConfig,
}

impl JsonMailbox {
    pub fn new<P: AsRef<Path>>(path: P, config: MailboxConfig) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            config,
        }
    }

    pub fn load_all(&self) -> Result<Vec<EmailRecord>> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read mailbox file: {}", self.path.display()))?;
        let export: MailboxExport = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse mailbox file: {}", self.path.display()))?;
        Ok(match export {
            MailboxExport::List(records) => records,
            MailboxExport::Wrapped { messages } => messages,
        })
    }
}

impl Mailbox for JsonMailbox {
    fn fetch_recent(&self, now: DateTime<Utc>) -> Result<Vec<EmailRecord>> {
        let records = self.load_all()?;
        let total = records.len();
        let selected = select_recent(records, now, &self.config);
        log::info!(
            "Loaded {} of {} messages from {}",
            selected.len(),
            total,
            self.path.display()
        );
        Ok(selected)
    }
}

/// Apply the recency window and message limits, then clean up bodies.
///
/// When nothing falls inside the window the newest `fallback_messages` are
/// returned instead, so a stale export still yields something to review.
pub fn select_recent(
    mut records: Vec<EmailRecord>,
    now: DateTime<Utc>,
    config: &MailboxConfig,
) -> Vec<EmailRecord> {
    records.sort_by(|a, b| {
        b.received_at
            .cmp(&a.received_at)
            .then_with(|| a.id.cmp(&b.id))
    });

    let window_days = config.window_days.clamp(1, MAX_WINDOW_DAYS);
    let cutoff = Duration::try_days(window_days)
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let in_window = records
        .iter()
        .filter(|r| r.received_at >= cutoff && r.received_at <= now)
        .count();

    let selected: Vec<EmailRecord> = if in_window == 0 {
        log::warn!(
            "No messages in the last {} days, using the newest {}",
            config.window_days,
            config.fallback_messages
        );
        records.into_iter().take(config.fallback_messages).collect()
    } else {
        records
            .into_iter()
            .filter(|r| r.received_at >= cutoff && r.received_at <= now)
            .take(config.max_messages)
            .collect()
    };

    selected
        .into_iter()
        .map(|mut record| {
            record.body = normalize_body(&record.body, config.body_limit_chars);
            record
        })
        .collect()
}

pub fn looks_like_html(body: &str) -> bool {
    HTML_HINT.is_match(body)
}

/// Strip markup, tidy whitespace and bound the length of a message body.
///
/// A body with no text stays empty so classification treats it as missing.
pub fn normalize_body(body: &str, limit_chars: usize) -> String {
    let text = if looks_like_html(body) {
        strip_html(body)
    } else {
        body.to_string()
    };

    let mut lines: Vec<String> = Vec::new();
    for line in text.lines() {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() && lines.last().map_or(true, |l| l.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    let cleaned = lines.join("\n");
    let cleaned: String = cleaned.trim().chars().take(limit_chars).collect();
    cleaned.trim_end().to_string()
}

fn strip_html(html: &str) -> String {
    let text = SCRIPT_BLOCK.replace_all(html, "");
    let text = STYLE_BLOCK.replace_all(&text, "");
    let text = LINE_BREAK_TAG.replace_all(&text, "\n");
    let text = ANY_TAG.replace_all(&text, " ");
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleEngine;
    use chrono::TimeZone;
    use std::io::Write;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap()
    }

    fn message(id: &str, received_at: DateTime<Utc>, body: &str) -> EmailRecord {
        EmailRecord {
            id: id.to_string(),
            sender: "a@b.com".to_string(),
            subject: format!("Subject {}", id),
            body: body.to_string(),
            received_at,
        }
    }

    #[test]
    fn test_window_and_limit() {
        let now = at(10, 12);
        let mut records = Vec::new();
        for i in 0..20 {
            records.push(message(&format!("m{:02}", i), now - Duration::hours(i), "hi"));
        }
        records.push(message("old", at(1, 9), "hi"));

        let selected = select_recent(records, now, &MailboxConfig::default());
        assert_eq!(selected.len(), 15);
        assert_eq!(selected[0].id, "m00");
        assert!(selected.iter().all(|r| r.id != "old"));
    }

    #[test]
    fn test_falls_back_to_newest_when_window_is_empty() {
        let now = at(30, 12);
        let records: Vec<EmailRecord> = (0..12)
            .map(|i| message(&format!("m{:02}", i), at(1, i), "hi"))
            .collect();

        let selected = select_recent(records, now, &MailboxConfig::default());
        assert_eq!(selected.len(), 10);
        assert_eq!(selected[0].id, "m11");
    }

    #[test]
    fn test_oversized_window_does_not_panic() {
        let now = at(10, 12);
        let config = MailboxConfig {
            window_days: i64::MAX,
            ..MailboxConfig::default()
        };
        let records = vec![message("recent", now - Duration::hours(2), "hi")];
        let selected = select_recent(records, now, &config);
        assert_eq!(selected.len(), 1);
    }

    #[test]
    fn test_html_is_stripped() {
        let html = "<html><head><style>p { color: red; }</style></head>\
                    <body><p>Hello&nbsp;team,</p><p>Meeting at <b>3pm</b> &amp; lunch after.</p>\
                    <script>alert('x')</script></body></html>";
        let body = normalize_body(html, 1000);
        assert_eq!(body, "Hello team,\nMeeting at 3pm & lunch after.");
    }

    #[test]
    fn test_plain_text_kept_and_limited() {
        assert_eq!(normalize_body("  a < b and c > d  ", 1000), "a < b and c > d");
        assert_eq!(normalize_body(&"x".repeat(1500), 1000).chars().count(), 1000);
        assert_eq!(normalize_body("  \n\n ", 1000), "");
        assert_eq!(normalize_body("<div><br></div>", 1000), "");
    }

    #[test]
    fn test_empty_body_still_classifies_as_missing() {
        let now = at(10, 12);
        let mut record = message("1", now - Duration::hours(1), "");
        record.subject = "Urgent: meeting about the budget".to_string();

        let selected = select_recent(vec![record], now, &MailboxConfig::default());
        assert_eq!(selected[0].body, "");

        let classification = RuleEngine::default().classify(&selected[0]);
        assert!(classification.labels.is_empty());
        assert!(!classification.has_tasks);
    }

    #[test]
    fn test_json_mailbox_reads_both_layouts() {
        let dir = std::env::temp_dir();
        let list_path = dir.join(format!("mail-briefing-list-{}.json", std::process::id()));
        let wrapped_path = dir.join(format!("mail-briefing-wrapped-{}.json", std::process::id()));

        let record = r#"{"id":"1","sender":"Boss <b@x.com>","subject":"Hi","body":"<p>Hello</p>","received_at":"2024-05-10T09:00:00Z"}"#;
        std::fs::File::create(&list_path)
            .unwrap()
            .write_all(format!("[{}]", record).as_bytes())
            .unwrap();
        std::fs::File::create(&wrapped_path)
            .unwrap()
            .write_all(format!(r#"{{"messages":[{}]}}"#, record).as_bytes())
            .unwrap();

        for path in [&list_path, &wrapped_path] {
            let mailbox = JsonMailbox::new(path, MailboxConfig::default());
            let records = mailbox.fetch_recent(at(10, 12)).unwrap();
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].body, "Hello");
            std::fs::remove_file(path).unwrap();
        }
    }

    #[test]
    fn test_missing_file_has_context() {
        let mailbox = JsonMailbox::new("/nonexistent/mail.json", MailboxConfig::default());
        let err = mailbox.fetch_recent(at(10, 12)).unwrap_err();
        assert!(err.to_string().contains("Failed to read mailbox file"));
    }
}
