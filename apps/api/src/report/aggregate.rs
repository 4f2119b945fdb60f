//! Fold of classified issues into the report's category, assignee, and
//! unassigned views.

use chrono::NaiveDate;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::models::issue::{Issue, IssueState, Note};
use crate::report::classify::{classify_category, classify_status, CanonicalStatus, Category};
use crate::report::compliance::{evaluate_compliance, ComplianceFlags};
use crate::report::overdue::evaluate_overdue;

/// The per-issue record shown under each assignee.
#[derive(Debug, Clone, Serialize)]
pub struct IssueDetail {
    pub title: String,
    pub web_url: String,
    pub state: IssueState,
    pub labels: Vec<String>,
    pub status: CanonicalStatus,
    pub has_time_stats: bool,
    pub is_daily_compliant: bool,
    pub is_overdue: bool,
    pub due_date: Option<String>,
    /// Present only in multi-project reports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

/// An issue with every derived field resolved. A snapshot living only for
/// the duration of one report build.
#[derive(Debug, Clone)]
pub struct ClassifiedIssue {
    pub category: Category,
    pub assignees: Vec<String>,
    pub detail: IssueDetail,
}

impl ClassifiedIssue {
    /// Runs the classifier and both evaluators over one issue. `notes` are
    /// whatever the tracker delivered (possibly empty after a swallowed fetch
    /// failure) and `today` is the report-generation date.
    pub fn derive(issue: &Issue, notes: &[Note], today: NaiveDate) -> Self {
        let category = classify_category(&issue.labels);
        let status = classify_status(&issue.labels);
        let ComplianceFlags {
            has_time_stats,
            is_daily_compliant,
        } = evaluate_compliance(&status, issue.total_time_spent, notes, today);
        let is_overdue = evaluate_overdue(issue.due_date.as_deref(), issue.state, &status, today);

        ClassifiedIssue {
            category,
            assignees: issue.assignees.iter().map(|a| a.name.clone()).collect(),
            detail: IssueDetail {
                title: issue.title.clone(),
                web_url: issue.web_url.clone(),
                state: issue.state,
                labels: issue.labels.clone(),
                status,
                has_time_stats,
                is_daily_compliant,
                is_overdue,
                due_date: issue.due_date.clone(),
                project: None,
            },
        }
    }
}

/// Ordered category line lists, keyed by the tracker's label text on the wire.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryBuckets {
    #[serde(rename = "Req::Feature")]
    pub feature: Vec<String>,
    #[serde(rename = "Req::Enhancement")]
    pub enhancement: Vec<String>,
    #[serde(rename = "Req::Bug")]
    pub bug: Vec<String>,
    #[serde(rename = "Other")]
    pub other: Vec<String>,
}

impl CategoryBuckets {
    fn lines_mut(&mut self, category: Category) -> &mut Vec<String> {
        match category {
            Category::Feature => &mut self.feature,
            Category::Enhancement => &mut self.enhancement,
            Category::Bug => &mut self.bug,
            Category::Other => &mut self.other,
        }
    }
}

/// Per-assignee issue lists. Keys keep first-seen order, which a BTreeMap
/// would destroy, so this is a small ordered map over a Vec. Serializes as a
/// JSON object.
#[derive(Debug, Clone, Default)]
pub struct AssigneeBoard {
    entries: Vec<(String, Vec<IssueDetail>)>,
}

impl AssigneeBoard {
    pub fn push(&mut self, name: &str, detail: IssueDetail) {
        if let Some((_, issues)) = self.entries.iter_mut().find(|(n, _)| n == name) {
            issues.push(detail);
        } else {
            self.entries.push((name.to_string(), vec![detail]));
        }
    }

    pub fn get(&self, name: &str) -> Option<&[IssueDetail]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, issues)| issues.as_slice())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for AssigneeBoard {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, issues) in &self.entries {
            map.serialize_entry(name, issues)?;
        }
        map.end()
    }
}

/// Fold accumulator for one report. Multi-project builds keep folding into
/// the same rollup, so the counters and boards merge naturally.
#[derive(Debug, Clone, Default)]
pub struct MilestoneRollup {
    pub categories: CategoryBuckets,
    pub assignees: AssigneeBoard,
    pub unassigned: u32,
}

impl MilestoneRollup {
    /// Folds one classified issue in. `project` switches the multi-project
    /// presentation: prefixed category lines and a `project` field on each
    /// detail record.
    pub fn fold(&mut self, classified: ClassifiedIssue, project: Option<&str>) {
        let line = match project {
            Some(name) => format!(
                "- [{name}] {} (State: {})",
                classified.detail.title,
                classified.detail.state.as_str()
            ),
            None => format!(
                "- {} (State: {})",
                classified.detail.title,
                classified.detail.state.as_str()
            ),
        };
        self.categories.lines_mut(classified.category).push(line);

        let mut detail = classified.detail;
        detail.project = project.map(str::to_string);

        if classified.assignees.is_empty() {
            self.unassigned += 1;
        } else {
            for name in &classified.assignees {
                self.assignees.push(name, detail.clone());
            }
        }
    }
}
