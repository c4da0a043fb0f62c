use super::labels::phrase_regex;
use crate::domain_utils::DomainUtils;
use regex::Regex;

const DEFAULT_IMPORTANCE_MARKERS: &[&str] = &[
    "urgent",
    "asap",
    "important",
    "high priority",
    "action required",
    "time-sensitive",
    "time sensitive",
    "immediate attention",
    "critical",
];

/// Which independent signal made an email important.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportanceSignal {
    Sender,
    UrgentLabel,
    Marker,
}

/// Important-sender policy plus explicit urgency wording.
pub struct ImportancePolicy {
    addresses: Vec<String>,
    domains: Vec<String>,
    markers: Regex,
}

impl ImportancePolicy {
    pub fn new(important_senders: &[String], extra_markers: &[String]) -> anyhow::Result<Self> {
        let mut addresses = Vec::new();
        let mut domains = Vec::new();

        for entry in important_senders {
            let entry = entry.trim().to_lowercase();
            if entry.is_empty() {
                continue;
            }
            match entry.find('@') {
                Some(0) => domains.push(entry[1..].to_string()),
                Some(_) => addresses.push(entry),
                None => domains.push(entry),
            }
        }

        let mut markers: Vec<String> = DEFAULT_IMPORTANCE_MARKERS
            .iter()
            .map(|m| m.to_string())
            .collect();
        markers.extend(extra_markers.iter().cloned());

        Ok(Self {
            addresses,
            domains,
            markers: phrase_regex(&markers)?,
        })
    }

    pub fn is_important_sender(&self, sender: &str) -> bool {
        let Some(address) = DomainUtils::extract_address(sender) else {
            return false;
        };
        if self.addresses.iter().any(|a| *a == address) {
            return true;
        }
        DomainUtils::extract_domain(&address)
            .map(|domain| DomainUtils::matches_domain_list(&domain, &self.domains))
            .unwrap_or(false)
    }

    pub fn has_marker(&self, text: &str) -> bool {
        self.markers.is_match(text)
    }

    /// First signal that fires, checked in a fixed order. Any one suffices.
    pub fn evaluate(&self, sender: &str, text: &str, urgent_label: bool) -> Option<ImportanceSignal> {
        if self.is_important_sender(sender) {
            Some(ImportanceSignal::Sender)
        } else if urgent_label {
            Some(ImportanceSignal::UrgentLabel)
        } else if self.has_marker(text) {
            Some(ImportanceSignal::Marker)
        } else {
            None
        }
    }
}
