//! Milestone history: per-category issue counts over a project's recent
//! development milestones, chartable oldest-first.

use serde::Serialize;

use crate::models::issue::Issue;
use crate::models::project::MilestoneRef;

/// Only milestones named with this prefix participate in history.
pub const HISTORY_TITLE_PREFIX: &str = "Development";

/// How many recency-sorted milestones are fetched before filtering.
pub const HISTORY_FETCH_WINDOW: usize = 20;

/// How many qualifying milestones a history covers by default.
pub const HISTORY_DEFAULT_LIMIT: usize = 5;

/// Per-category issue counts for one milestone. `Other` is intentionally
/// absent from history charts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    #[serde(rename = "Req::Feature")]
    pub feature: u32,
    #[serde(rename = "Req::Enhancement")]
    pub enhancement: u32,
    #[serde(rename = "Req::Bug")]
    pub bug: u32,
}

impl CategoryCounts {
    fn add(&mut self, other: CategoryCounts) {
        self.feature += other.feature;
        self.enhancement += other.enhancement;
        self.bug += other.bug;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub milestone: String,
    pub due_date: Option<String>,
    pub counts: CategoryCounts,
}

/// Keeps the first `limit` `Development*` milestones out of a recency-sorted
/// listing. Input order (due date descending) is preserved.
pub fn select_history_milestones(milestones: &[MilestoneRef], limit: usize) -> Vec<MilestoneRef> {
    milestones
        .iter()
        .filter(|m| m.title.starts_with(HISTORY_TITLE_PREFIX))
        .take(limit)
        .cloned()
        .collect()
}

/// Counts tracked category label occurrences across a milestone's issues.
/// An issue carrying several tracked labels counts once per label.
pub fn count_categories(issues: &[Issue]) -> CategoryCounts {
    let mut counts = CategoryCounts::default();
    for issue in issues {
        for label in &issue.labels {
            match label.as_str() {
                "Req::Feature" => counts.feature += 1,
                "Req::Enhancement" => counts.enhancement += 1,
                "Req::Bug" => counts.bug += 1,
                _ => {}
            }
        }
    }
    counts
}

/// Merges per-project histories by milestone title: counts are summed and
/// the first-seen due date wins. The result is sorted by due date ascending,
/// missing dates first.
pub fn merge_histories(per_project: Vec<Vec<HistoryEntry>>) -> Vec<HistoryEntry> {
    let mut merged: Vec<HistoryEntry> = Vec::new();
    for history in per_project {
        for entry in history {
            if let Some(existing) = merged.iter_mut().find(|e| e.milestone == entry.milestone) {
                existing.counts.add(entry.counts);
            } else {
                merged.push(entry);
            }
        }
    }
    merged.sort_by(|a, b| due_sort_key(a).cmp(due_sort_key(b)));
    merged
}

fn due_sort_key(entry: &HistoryEntry) -> &str {
    entry.due_date.as_deref().unwrap_or("")
}
