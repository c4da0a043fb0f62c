pub mod briefing;
pub mod config;
pub mod domain_utils;
pub mod email;
pub mod mailbox;
pub mod rules;
pub mod scheduling;
pub mod service;
pub mod statistics;
pub mod summary;
pub mod tasks;
pub mod text;

pub use briefing::{Briefing, BriefingAggregator};
pub use config::Config;
pub use email::{Classification, ClassifiedEmail, EmailRecord, PriorityBand, TaskCandidate};
pub use mailbox::{JsonMailbox, Mailbox};
pub use rules::RuleEngine;
pub use service::{Assistant, AssistantError, HealthReport};
pub use statistics::InboxStats;
pub use summary::{Summarizer, Summary, SummaryError, TextGenerator};
pub use tasks::extract_tasks;
