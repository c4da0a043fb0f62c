//! Label vocabulary
//!
//! Each label is assigned when any of its trigger phrases appears as a whole
//! word or phrase, case-insensitively, in the subject or body.

use anyhow::Context;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

pub const MEETING: &str = "meeting";
pub const URGENT: &str = "urgent";
pub const WORK: &str = "work";
pub const PERSONAL: &str = "personal";
pub const NEWSLETTER: &str = "newsletter";
pub const FINANCE: &str = "finance";
pub const TRAVEL: &str = "travel";

pub const LABEL_VOCABULARY: &[(&str, &[&str])] = &[
    (
        MEETING,
        &[
            "meeting",
            "meetings",
            "meet",
            "call",
            "calls",
            "appointment",
            "conference",
            "schedule",
            "calendar invite",
            "invite",
            "zoom",
            "catch up",
            "sync",
            "standup",
        ],
    ),
    (
        URGENT,
        &[
            "urgent",
            "asap",
            "as soon as possible",
            "immediately",
            "emergency",
            "critical",
            "time-sensitive",
            "time sensitive",
            "right away",
            "action required",
        ],
    ),
    (
        WORK,
        &[
            "project",
            "client",
            "customer",
            "proposal",
            "contract",
            "report",
            "deliverable",
            "deadline",
            "team",
            "interview",
            "quarterly",
            "roadmap",
            "budget",
            "presentation",
        ],
    ),
    (
        PERSONAL,
        &[
            "family",
            "birthday",
            "dinner",
            "party",
            "friend",
            "friends",
            "wedding",
            "vacation",
            "weekend",
            "mom",
            "dad",
            "kids",
        ],
    ),
    (
        NEWSLETTER,
        &[
            "newsletter",
            "unsubscribe",
            "digest",
            "top stories",
            "this week's",
            "promotion",
            "promotional",
            "sale",
            "offer",
            "deal",
            "marketing",
            "advertisement",
            "view in browser",
        ],
    ),
    (
        FINANCE,
        &[
            "invoice",
            "payment",
            "budget",
            "revenue",
            "bank",
            "receipt",
            "billing",
            "tax",
            "expense",
            "expenses",
            "salary",
            "refund",
            "transaction",
            "payroll",
        ],
    ),
    (
        TRAVEL,
        &[
            "flight",
            "hotel",
            "booking",
            "itinerary",
            "reservation",
            "airport",
            "boarding pass",
            "trip",
            "check-in",
            "train",
            "visa",
        ],
    ),
];

pub fn is_known_label(label: &str) -> bool {
    LABEL_VOCABULARY.iter().any(|(name, _)| *name == label)
}

/// Compile a case-insensitive whole-phrase alternation.
pub fn phrase_regex<S: AsRef<str>>(phrases: &[S]) -> anyhow::Result<Regex> {
    let alternation = phrases
        .iter()
        .map(|p| regex::escape(p.as_ref().trim()))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(r"(?i)\b(?:{})\b", alternation);
    Regex::new(&pattern).with_context(|| format!("Failed to compile phrase pattern: {pattern}"))
}

pub struct LabelMatcher {
    patterns: Vec<(&'static str, Regex)>,
}

impl LabelMatcher {
    pub fn new(extra_keywords: &BTreeMap<String, Vec<String>>) -> anyhow::Result<Self> {
        let mut patterns = Vec::with_capacity(LABEL_VOCABULARY.len());

        for (label, phrases) in LABEL_VOCABULARY {
            let mut all: Vec<String> = phrases.iter().map(|p| p.to_string()).collect();
            if let Some(extra) = extra_keywords.get(*label) {
                all.extend(extra.iter().cloned());
            }
            patterns.push((*label, phrase_regex(&all)?));
        }

        for label in extra_keywords.keys() {
            if !is_known_label(label) {
                log::warn!("Ignoring keywords for unknown label: {}", label);
            }
        }

        Ok(Self { patterns })
    }

    pub fn labels_for(&self, text: &str) -> BTreeSet<String> {
        self.patterns
            .iter()
            .filter(|(_, pattern)| pattern.is_match(text))
            .map(|(label, _)| label.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> LabelMatcher {
        LabelMatcher::new(&BTreeMap::new()).unwrap()
    }

    #[test]
    fn test_every_vocabulary_phrase_triggers_its_label() {
        let matcher = matcher();
        for (label, phrases) in LABEL_VOCABULARY {
            for phrase in *phrases {
                let text = format!("Note: {} here", phrase.to_uppercase());
                assert!(
                    matcher.labels_for(&text).contains(*label),
                    "'{}' should trigger '{}'",
                    phrase,
                    label
                );
            }
        }
    }

    #[test]
    fn test_word_boundaries() {
        let matcher = matcher();
        assert!(matcher.labels_for("The taxonomy is updated").is_empty());
        assert!(matcher.labels_for("Our salesforce export").is_empty());
        assert!(matcher.labels_for("Please pay the tax").contains(FINANCE));
    }

    #[test]
    fn test_multiple_labels() {
        let labels = matcher().labels_for("Urgent: meeting about the budget");
        let expected: BTreeSet<String> = [MEETING, URGENT, WORK, FINANCE]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(labels, expected);
    }

    #[test]
    fn test_extra_keywords_extend_vocabulary() {
        let mut extra = BTreeMap::new();
        extra.insert(TRAVEL.to_string(), vec!["layover".to_string()]);
        let matcher = LabelMatcher::new(&extra).unwrap();
        assert!(matcher.labels_for("Short layover in Denver").contains(TRAVEL));
    }

    #[test]
    fn test_phrase_regex_escapes_metacharacters() {
        let regex = phrase_regex(&["c++ review"]).unwrap();
        assert!(regex.is_match("Need a C++ review today"));
        assert!(!regex.is_match("Need a cxx review"));
    }
}
