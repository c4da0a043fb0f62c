//! Task extraction
//!
//! Scans free text for scheduling language (meeting and call verbs, deadline
//! phrases, explicit clock times and calendar dates) and returns one
//! [`TaskCandidate`] per sentence that carries such a cue. Relative phrases
//! like "tomorrow" or "next week" are picked up as time hints but do not
//! create a candidate on their own.

use crate::email::TaskCandidate;
use crate::text::{collapse_whitespace, truncate_chars};
use lazy_static::lazy_static;
use regex::Regex;

/// Longest description kept for a candidate, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 160;

lazy_static! {
    static ref SCHEDULING_CUES: Vec<Regex> = vec![
        Regex::new(r"(?i)\b(meet|meets|meeting|meetings|call|calls|appointment|appointments|schedule|scheduled|rescheduled?|sync|catch up|conference|interview|webinar)\b").unwrap(),
        Regex::new(r"(?i)\b(deadline|due date|due (by|on|tomorrow|today|next|this)|follow[- ]up|action items?|reminder|remind me|rsvp|submit by|respond by|by (end of day|eod|cob))\b").unwrap(),
        Regex::new(r"(?i)\b(1[0-2]|0?[1-9])(:[0-5]\d)?\s?(am|pm)\b").unwrap(),
        Regex::new(r"\b([01]?\d|2[0-3]):[0-5]\d\b").unwrap(),
        Regex::new(r"\b\d{4}-\d{2}-\d{2}\b").unwrap(),
        Regex::new(r"\b\d{1,2}/\d{1,2}(/\d{2,4})?\b").unwrap(),
        Regex::new(r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*\.?\s+\d{1,2}(st|nd|rd|th)?\b").unwrap(),
    ];
    static ref TIME_HINT: Regex = Regex::new(
        r"(?i)\b(?:(?:today|tonight|tomorrow|this (?:morning|afternoon|evening|week)|next (?:week|month|monday|tuesday|wednesday|thursday|friday|saturday|sunday)|(?:on )?(?:monday|tuesday|wednesday|thursday|friday|saturday|sunday))(?:\s+(?:at|by|@)\s+\d{1,2}(?::[0-5]\d)?\s?(?:am|pm)?)?|(?:1[0-2]|0?[1-9])(?::[0-5]\d)?\s?(?:am|pm)|(?:[01]?\d|2[0-3]):[0-5]\d|\d{4}-\d{2}-\d{2}|\d{1,2}/\d{1,2}(?:/\d{2,4})?|(?:jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*\.?\s+\d{1,2}(?:st|nd|rd|th)?|end of (?:day|week|month)|eod|cob)\b"
    )
    .unwrap();
}

pub struct TaskExtractor;

impl TaskExtractor {
    /// Extract task candidates in order of appearance.
    pub fn extract(text: &str) -> Vec<TaskCandidate> {
        let mut candidates: Vec<TaskCandidate> = Vec::new();

        for sentence in split_sentences(text) {
            if !SCHEDULING_CUES.iter().any(|cue| cue.is_match(sentence)) {
                continue;
            }

            let description = excerpt(sentence);
            if candidates.iter().any(|c| c.description == description) {
                continue;
            }

            let time_hint = TIME_HINT
                .find(sentence)
                .map(|m| m.as_str().trim().to_string());

            candidates.push(TaskCandidate {
                description,
                time_hint,
            });
        }

        candidates
    }

    pub fn has_tasks(text: &str) -> bool {
        split_sentences(text)
            .any(|sentence| SCHEDULING_CUES.iter().any(|cue| cue.is_match(sentence)))
    }
}

/// Convenience wrapper around [`TaskExtractor::extract`].
pub fn extract_tasks(text: &str) -> Vec<TaskCandidate> {
    TaskExtractor::extract(text)
}

/// Split on sentence terminators that are followed by whitespace or end of text.
///
/// "3.30" and "e.g." mid-token stay intact; blank sentences are skipped.
fn split_sentences(text: &str) -> impl Iterator<Item = &str> {
    let mut spans = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        let boundary = match ch {
            '\n' | '\r' => true,
            '.' | '!' | '?' => chars
                .peek()
                .map(|(_, next)| next.is_whitespace())
                .unwrap_or(true),
            _ => false,
        };
        if boundary {
            let end = idx + ch.len_utf8();
            spans.push(&text[start..end]);
            start = end;
        }
    }
    if start < text.len() {
        spans.push(&text[start..]);
    }

    spans
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.trim_matches(|c: char| c.is_ascii_punctuation()).is_empty())
}

fn excerpt(sentence: &str) -> String {
    truncate_chars(&collapse_whitespace(sentence), MAX_DESCRIPTION_CHARS)
}
