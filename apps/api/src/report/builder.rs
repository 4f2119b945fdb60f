//! Report assembly: drives the tracker collaborator, runs the pure fold, and
//! attaches the narrative (or its unavailable marker).

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::models::issue::Issue;
use crate::narrative::{NarrativeGenerator, SUMMARY_UNAVAILABLE};
use crate::report::aggregate::{AssigneeBoard, CategoryBuckets, ClassifiedIssue, MilestoneRollup};
use crate::report::classify::{classify_status, CanonicalStatus};
use crate::report::compliance::NOTE_SCAN_LIMIT;
use crate::report::history::{
    count_categories, merge_histories, select_history_milestones, HistoryEntry,
    HISTORY_DEFAULT_LIMIT, HISTORY_FETCH_WINDOW,
};
use crate::tracker::{IssueTracker, TrackerError};

/// The serializable milestone report returned to callers.
#[derive(Debug, Clone, Serialize)]
pub struct MilestoneReport {
    pub milestone: String,
    pub summary: String,
    pub issues: CategoryBuckets,
    pub history: Vec<HistoryEntry>,
    pub assignees: AssigneeBoard,
    pub unassigned: u32,
}

pub struct ReportBuilder<'a> {
    tracker: &'a dyn IssueTracker,
    narrator: Option<&'a dyn NarrativeGenerator>,
    today: NaiveDate,
}

impl<'a> ReportBuilder<'a> {
    pub fn new(tracker: &'a dyn IssueTracker, narrator: Option<&'a dyn NarrativeGenerator>) -> Self {
        Self::at(tracker, narrator, Utc::now().date_naive())
    }

    /// Pins the evaluation date. Compliance and overdue checks compare
    /// against this date, so tests stay deterministic.
    pub fn at(
        tracker: &'a dyn IssueTracker,
        narrator: Option<&'a dyn NarrativeGenerator>,
        today: NaiveDate,
    ) -> Self {
        Self {
            tracker,
            narrator,
            today,
        }
    }

    /// Builds the report for one milestone of one project. A milestone absent
    /// from the project and all its ancestor groups is the only propagated
    /// failure besides tracker transport errors.
    pub async fn single_project(
        &self,
        project_id: i64,
        milestone_id: i64,
    ) -> Result<MilestoneReport, TrackerError> {
        let milestone = self
            .tracker
            .find_milestone(project_id, milestone_id)
            .await?
            .ok_or_else(|| {
                TrackerError::NotFound(format!(
                    "milestone {milestone_id} in project {project_id} or its ancestors"
                ))
            })?;

        let issues = self
            .tracker
            .issues_for_milestone(project_id, &milestone.title)
            .await?;

        let mut rollup = MilestoneRollup::default();
        for issue in &issues {
            rollup.fold(self.classify(project_id, issue).await, None);
        }

        let history = self.project_history(project_id, HISTORY_DEFAULT_LIMIT).await;
        let summary = self
            .narrative(&milestone.title, &[], &rollup.categories)
            .await;

        Ok(MilestoneReport {
            milestone: milestone.title,
            summary,
            issues: rollup.categories,
            history,
            assignees: rollup.assignees,
            unassigned: rollup.unassigned,
        })
    }

    /// Builds one merged report for the same milestone title across several
    /// projects. A project whose fetch fails is logged and skipped so partial
    /// results still ship.
    pub async fn multi_project(
        &self,
        project_ids: &[i64],
        milestone_title: &str,
    ) -> Result<MilestoneReport, TrackerError> {
        let mut rollup = MilestoneRollup::default();
        let mut project_names = Vec::new();

        for &project_id in project_ids {
            if let Err(e) = self
                .fold_project(project_id, milestone_title, &mut rollup, &mut project_names)
                .await
            {
                warn!(project_id, "skipping project after fetch failure: {e}");
            }
        }

        let history = self
            .multi_project_history(project_ids, HISTORY_DEFAULT_LIMIT)
            .await;
        let summary = self
            .narrative(milestone_title, &project_names, &rollup.categories)
            .await;

        Ok(MilestoneReport {
            milestone: milestone_title.to_string(),
            summary,
            issues: rollup.categories,
            history,
            assignees: rollup.assignees,
            unassigned: rollup.unassigned,
        })
    }

    async fn fold_project(
        &self,
        project_id: i64,
        milestone_title: &str,
        rollup: &mut MilestoneRollup,
        project_names: &mut Vec<String>,
    ) -> Result<(), TrackerError> {
        let project = self.tracker.project(project_id).await?;
        project_names.push(project.name.clone());

        // First milestone match by title; duplicates within a project keep
        // the first one.
        let Some(milestone) = self
            .tracker
            .find_milestone_by_title(project_id, milestone_title)
            .await?
        else {
            debug!(project = project.name.as_str(), "milestone not present in project");
            return Ok(());
        };

        let issues = self
            .tracker
            .issues_for_milestone(project_id, &milestone.title)
            .await?;
        for issue in &issues {
            rollup.fold(
                self.classify(project_id, issue).await,
                Some(&project.name),
            );
        }

        Ok(())
    }

    /// Classifies one issue. Notes are fetched only for the progress lane;
    /// a failed fetch degrades to an empty list instead of failing the
    /// report.
    async fn classify(&self, project_id: i64, issue: &Issue) -> ClassifiedIssue {
        let notes = if classify_status(&issue.labels) == CanonicalStatus::Progress {
            match self
                .tracker
                .notes(project_id, issue.iid, NOTE_SCAN_LIMIT)
                .await
            {
                Ok(notes) => notes,
                Err(e) => {
                    warn!(issue = issue.iid, "note fetch failed: {e}");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        ClassifiedIssue::derive(issue, &notes, self.today)
    }

    /// One project's history. Any failure degrades to an empty history; the
    /// rest of the report is unaffected.
    async fn project_history(&self, project_id: i64, limit: usize) -> Vec<HistoryEntry> {
        match self.try_project_history(project_id, limit).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(project_id, "history fetch failed: {e}");
                Vec::new()
            }
        }
    }

    async fn try_project_history(
        &self,
        project_id: i64,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, TrackerError> {
        let recent = self
            .tracker
            .recent_milestones(project_id, HISTORY_FETCH_WINDOW)
            .await?;

        let mut entries = Vec::new();
        for milestone in select_history_milestones(&recent, limit) {
            let issues = self
                .tracker
                .issues_for_milestone(project_id, &milestone.title)
                .await?;
            entries.push(HistoryEntry {
                milestone: milestone.title,
                due_date: milestone.due_date,
                counts: count_categories(&issues),
            });
        }

        // The selection is newest-first; charts want oldest-first
        entries.reverse();
        Ok(entries)
    }

    async fn multi_project_history(
        &self,
        project_ids: &[i64],
        limit: usize,
    ) -> Vec<HistoryEntry> {
        let mut per_project = Vec::new();
        for &project_id in project_ids {
            per_project.push(self.project_history(project_id, limit).await);
        }
        merge_histories(per_project)
    }

    async fn narrative(
        &self,
        milestone_title: &str,
        projects: &[String],
        categories: &CategoryBuckets,
    ) -> String {
        let Some(narrator) = self.narrator else {
            return SUMMARY_UNAVAILABLE.to_string();
        };

        match narrator.summarize(milestone_title, projects, categories).await {
            Ok(text) => text,
            Err(e) => {
                warn!("narrative generation failed: {e}");
                SUMMARY_UNAVAILABLE.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;

    use crate::llm_client::LlmError;
    use crate::models::issue::{Assignee, IssueState, Note};
    use crate::models::project::{MilestoneRef, ProjectRef};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[derive(Default)]
    struct StubTracker {
        projects: HashMap<i64, ProjectRef>,
        /// Recency-sorted (due date descending), as the real client delivers.
        milestones: HashMap<i64, Vec<MilestoneRef>>,
        issues: HashMap<(i64, String), Vec<Issue>>,
        notes: HashMap<(i64, i64), Vec<Note>>,
    }

    impl StubTracker {
        fn with_project(mut self, id: i64, name: &str) -> Self {
            self.projects.insert(
                id,
                ProjectRef {
                    id,
                    name: name.to_string(),
                    path_with_namespace: format!("group/{name}"),
                },
            );
            self
        }

        fn with_milestone(mut self, project_id: i64, id: i64, title: &str, due: Option<&str>) -> Self {
            self.milestones.entry(project_id).or_default().push(MilestoneRef {
                id,
                title: title.to_string(),
                due_date: due.map(str::to_string),
            });
            self
        }

        fn with_issues(mut self, project_id: i64, milestone: &str, issues: Vec<Issue>) -> Self {
            self.issues.insert((project_id, milestone.to_string()), issues);
            self
        }

        fn with_notes(mut self, project_id: i64, iid: i64, notes: Vec<Note>) -> Self {
            self.notes.insert((project_id, iid), notes);
            self
        }
    }

    #[async_trait]
    impl IssueTracker for StubTracker {
        async fn project(&self, project_id: i64) -> Result<ProjectRef, TrackerError> {
            self.projects
                .get(&project_id)
                .cloned()
                .ok_or_else(|| TrackerError::NotFound(format!("project {project_id}")))
        }

        async fn list_projects(&self) -> Result<Vec<ProjectRef>, TrackerError> {
            Ok(self.projects.values().cloned().collect())
        }

        async fn list_active_milestones(
            &self,
            project_id: i64,
        ) -> Result<Vec<MilestoneRef>, TrackerError> {
            Ok(self.milestones.get(&project_id).cloned().unwrap_or_default())
        }

        async fn find_milestone(
            &self,
            project_id: i64,
            milestone_id: i64,
        ) -> Result<Option<MilestoneRef>, TrackerError> {
            Ok(self
                .milestones
                .get(&project_id)
                .and_then(|ms| ms.iter().find(|m| m.id == milestone_id).cloned()))
        }

        async fn find_milestone_by_title(
            &self,
            project_id: i64,
            title: &str,
        ) -> Result<Option<MilestoneRef>, TrackerError> {
            Ok(self
                .milestones
                .get(&project_id)
                .and_then(|ms| ms.iter().find(|m| m.title == title).cloned()))
        }

        async fn issues_for_milestone(
            &self,
            project_id: i64,
            milestone_title: &str,
        ) -> Result<Vec<Issue>, TrackerError> {
            Ok(self
                .issues
                .get(&(project_id, milestone_title.to_string()))
                .cloned()
                .unwrap_or_default())
        }

        async fn recent_milestones(
            &self,
            project_id: i64,
            max: usize,
        ) -> Result<Vec<MilestoneRef>, TrackerError> {
            let mut milestones = self.milestones.get(&project_id).cloned().unwrap_or_default();
            milestones.truncate(max);
            Ok(milestones)
        }

        async fn notes(
            &self,
            project_id: i64,
            issue_iid: i64,
            max: usize,
        ) -> Result<Vec<Note>, TrackerError> {
            let mut notes = self
                .notes
                .get(&(project_id, issue_iid))
                .cloned()
                .unwrap_or_default();
            notes.truncate(max);
            Ok(notes)
        }
    }

    struct StubNarrator {
        fail: bool,
    }

    #[async_trait]
    impl NarrativeGenerator for StubNarrator {
        async fn summarize(
            &self,
            _milestone_title: &str,
            _projects: &[String],
            _categories: &CategoryBuckets,
        ) -> Result<String, LlmError> {
            if self.fail {
                Err(LlmError::EmptyContent)
            } else {
                Ok("All on track.".to_string())
            }
        }
    }

    fn make_issue(iid: i64, title: &str, labels: &[&str], assignees: &[&str]) -> Issue {
        Issue {
            iid,
            title: title.to_string(),
            web_url: format!("https://gitlab.example.com/-/issues/{iid}"),
            state: IssueState::Opened,
            labels: labels.iter().map(|l| l.to_string()).collect(),
            due_date: None,
            assignees: assignees
                .iter()
                .map(|name| Assignee {
                    name: name.to_string(),
                })
                .collect(),
            total_time_spent: 0,
        }
    }

    fn time_log_note(body: &str, created_at: &str) -> Note {
        Note {
            system: true,
            body: body.to_string(),
            created_at: created_at.to_string(),
        }
    }

    /// Project 1 with milestone "Development 3" plus two past development
    /// milestones and an unrelated release milestone.
    fn single_project_tracker() -> StubTracker {
        let mut progress_issue = make_issue(2, "Ship exporter", &["Status::Progress"], &["Asha", "Bruno"]);
        progress_issue.due_date = Some("2024-06-01".to_string());
        progress_issue.total_time_spent = 7200;

        StubTracker::default()
            .with_project(1, "atlas")
            .with_milestone(1, 30, "Development 3", Some("2024-06-10"))
            .with_milestone(1, 31, "Release", Some("2024-03-01"))
            .with_milestone(1, 32, "Development 2", Some("2024-02-01"))
            .with_milestone(1, 33, "Development 1", Some("2024-01-01"))
            .with_issues(
                1,
                "Development 3",
                vec![
                    make_issue(1, "Add exporter", &["Req::Feature", "Status::Closed"], &["Asha"]),
                    progress_issue,
                    make_issue(3, "Tidy docs", &[], &[]),
                ],
            )
            .with_notes(
                1,
                2,
                vec![time_log_note(
                    "added 2h of time spent at 2024-06-01",
                    "2024-06-01T17:00:00Z",
                )],
            )
            .with_issues(
                1,
                "Development 2",
                vec![make_issue(10, "Old feature", &["Req::Feature"], &[])],
            )
            .with_issues(
                1,
                "Development 1",
                vec![make_issue(11, "Old bug", &["Req::Bug"], &[])],
            )
    }

    #[tokio::test]
    async fn test_single_project_report_structure() {
        let tracker = single_project_tracker();
        let builder = ReportBuilder::at(&tracker, None, day(2024, 6, 2));

        let report = builder.single_project(1, 30).await.unwrap();

        assert_eq!(report.milestone, "Development 3");
        assert_eq!(report.summary, SUMMARY_UNAVAILABLE);
        assert_eq!(report.issues.feature, vec!["- Add exporter (State: opened)"]);
        assert_eq!(report.issues.other.len(), 2);
        assert_eq!(report.unassigned, 1);

        // The progress issue fans out to both assignees
        assert_eq!(report.assignees.get("Asha").unwrap().len(), 2);
        assert_eq!(report.assignees.get("Bruno").unwrap().len(), 1);

        let ship = &report.assignees.get("Bruno").unwrap()[0];
        assert_eq!(ship.status, CanonicalStatus::Progress);
        assert!(ship.is_overdue);
        assert!(ship.has_time_stats);
        assert!(ship.is_daily_compliant);
    }

    #[tokio::test]
    async fn test_single_project_history_is_oldest_first() {
        let tracker = single_project_tracker();
        let builder = ReportBuilder::at(&tracker, None, day(2024, 6, 2));

        let report = builder.single_project(1, 30).await.unwrap();

        let titles: Vec<&str> = report.history.iter().map(|e| e.milestone.as_str()).collect();
        assert_eq!(titles, vec!["Development 1", "Development 2", "Development 3"]);
        assert_eq!(report.history[0].counts.bug, 1);
        assert_eq!(report.history[1].counts.feature, 1);
    }

    #[tokio::test]
    async fn test_single_project_missing_milestone_is_not_found() {
        let tracker = single_project_tracker();
        let builder = ReportBuilder::at(&tracker, None, day(2024, 6, 2));

        let err = builder.single_project(1, 99).await.unwrap_err();
        assert!(matches!(err, TrackerError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_multi_project_skips_failed_project() {
        // Project 2 exists nowhere; its fetch failure must not abort project 1
        let tracker = single_project_tracker();
        let builder = ReportBuilder::at(&tracker, None, day(2024, 6, 2));

        let report = builder.multi_project(&[1, 2], "Development 3").await.unwrap();

        assert_eq!(
            report.issues.feature,
            vec!["- [atlas] Add exporter (State: opened)"]
        );
        assert_eq!(report.unassigned, 1);
        let detail = &report.assignees.get("Asha").unwrap()[0];
        assert_eq!(detail.project.as_deref(), Some("atlas"));
    }

    #[tokio::test]
    async fn test_multi_project_history_merges_by_title() {
        let tracker = single_project_tracker()
            .with_project(2, "hermes")
            .with_milestone(2, 40, "Development 2", Some("2024-02-03"))
            .with_issues(
                2,
                "Development 2",
                vec![make_issue(20, "Another feature", &["Req::Feature"], &[])],
            );
        let builder = ReportBuilder::at(&tracker, None, day(2024, 6, 2));

        let report = builder.multi_project(&[1, 2], "Development 3").await.unwrap();

        let dev2 = report
            .history
            .iter()
            .find(|e| e.milestone == "Development 2")
            .unwrap();
        assert_eq!(dev2.counts.feature, 2);
        // First-seen due date (project 1's) wins
        assert_eq!(dev2.due_date.as_deref(), Some("2024-02-01"));
    }

    #[tokio::test]
    async fn test_narrator_text_lands_in_summary() {
        let tracker = single_project_tracker();
        let narrator = StubNarrator { fail: false };
        let builder = ReportBuilder::at(&tracker, Some(&narrator), day(2024, 6, 2));

        let report = builder.single_project(1, 30).await.unwrap();
        assert_eq!(report.summary, "All on track.");
    }

    #[tokio::test]
    async fn test_narrator_failure_degrades_to_marker() {
        let tracker = single_project_tracker();
        let narrator = StubNarrator { fail: true };
        let builder = ReportBuilder::at(&tracker, Some(&narrator), day(2024, 6, 2));

        let report = builder.single_project(1, 30).await.unwrap();
        assert_eq!(report.summary, SUMMARY_UNAVAILABLE);
        // Structural fields survive the narrative failure
        assert_eq!(report.issues.feature.len(), 1);
    }

    #[tokio::test]
    async fn test_report_serializes_with_label_keys() {
        let tracker = single_project_tracker();
        let builder = ReportBuilder::at(&tracker, None, day(2024, 6, 2));

        let report = builder.single_project(1, 30).await.unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert!(json["issues"]["Req::Feature"].is_array());
        assert!(json["history"][0]["counts"]["Req::Bug"].is_u64());
        assert_eq!(json["assignees"]["Bruno"][0]["status"], "Status::Progress");
        assert_eq!(json["unassigned"], 1);
    }
}
