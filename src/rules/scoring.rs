use super::labels::phrase_regex;
use crate::config::PriorityWeights;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;

const URGENCY_KEYWORDS: &[&str] = &[
    "urgent",
    "asap",
    "as soon as possible",
    "immediately",
    "deadline",
    "critical",
    "emergency",
    "time-sensitive",
    "time sensitive",
    "action required",
    "important",
    "priority",
    "right away",
    "overdue",
];

/// Per-term contributions to a priority score, for logging and `--verbose` output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub keyword_hits: usize,
    pub base: f64,
    pub density: f64,
    pub tasks: f64,
    pub importance: f64,
    pub labels: f64,
    pub total: f64,
}

impl ScoreBreakdown {
    pub fn evidence(&self) -> String {
        format!(
            "base {:.2}, density {:.2} ({} hits), tasks {:.2}, importance {:.2}, labels {:+.2} => {:.2}",
            self.base,
            self.density,
            self.keyword_hits,
            self.tasks,
            self.importance,
            self.labels,
            self.total
        )
    }
}

pub struct PriorityScorer {
    weights: PriorityWeights,
    urgency: Regex,
}

impl PriorityScorer {
    pub fn new(weights: PriorityWeights) -> anyhow::Result<Self> {
        Ok(Self {
            weights,
            urgency: phrase_regex(URGENCY_KEYWORDS)?,
        })
    }

    pub fn weights(&self) -> &PriorityWeights {
        &self.weights
    }

    pub fn keyword_hits(&self, text: &str) -> usize {
        self.urgency.find_iter(text).count()
    }

    /// Density term in [0, 1], saturating at `density_saturation` hits.
    pub fn density(&self, hits: usize) -> f64 {
        let saturation = self.weights.density_saturation.max(1.0);
        (hits as f64 / saturation).clamp(0.0, 1.0)
    }

    pub fn score(
        &self,
        keyword_hits: usize,
        has_tasks: bool,
        is_important: bool,
        labels: &BTreeSet<String>,
    ) -> ScoreBreakdown {
        let w = &self.weights;
        let base = w.base;
        let density = w.keyword_density * self.density(keyword_hits);
        let tasks = if has_tasks { w.task_bonus } else { 0.0 };
        let importance = if is_important { w.importance_bonus } else { 0.0 };
        let labels: f64 = labels.iter().map(|l| w.label_adjustment(l)).sum();

        let total = (base + density + tasks + importance + labels).clamp(0.0, 1.0);

        ScoreBreakdown {
            keyword_hits,
            base,
            density,
            tasks,
            importance,
            labels,
            total,
        }
    }
}
