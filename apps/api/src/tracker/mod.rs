//! Issue tracker boundary: the trait the report engine consumes, plus the
//! GitLab REST implementation.

pub mod gitlab;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::issue::{Issue, Note};
use crate::models::project::{MilestoneRef, ProjectRef};

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("tracker request failed: {0}")]
    Connect(#[from] reqwest::Error),

    #[error("tracker returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("{0} not found")]
    NotFound(String),

    #[error("could not decode tracker response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Read-only view of the tracker used by the report engine.
///
/// Implementations hand the core fully normalized records: labels as plain
/// strings, assignees always a list, time spent defaulted to zero. The
/// dict-or-object ambiguity of the upstream API stays behind this trait.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    async fn project(&self, project_id: i64) -> Result<ProjectRef, TrackerError>;

    /// Whitelist-filtered project listing for the report UI.
    async fn list_projects(&self) -> Result<Vec<ProjectRef>, TrackerError>;

    /// Active milestones, including those inherited from ancestor groups.
    async fn list_active_milestones(
        &self,
        project_id: i64,
    ) -> Result<Vec<MilestoneRef>, TrackerError>;

    /// Milestone by id, searching the project first and then its ancestor
    /// groups. `None` means truly absent everywhere.
    async fn find_milestone(
        &self,
        project_id: i64,
        milestone_id: i64,
    ) -> Result<Option<MilestoneRef>, TrackerError>;

    /// First milestone whose title matches exactly.
    async fn find_milestone_by_title(
        &self,
        project_id: i64,
        title: &str,
    ) -> Result<Option<MilestoneRef>, TrackerError>;

    /// All issues (open and closed) assigned to the milestone.
    async fn issues_for_milestone(
        &self,
        project_id: i64,
        milestone_title: &str,
    ) -> Result<Vec<Issue>, TrackerError>;

    /// Up to `max` milestones sorted by due date descending.
    async fn recent_milestones(
        &self,
        project_id: i64,
        max: usize,
    ) -> Result<Vec<MilestoneRef>, TrackerError>;

    /// Up to `max` activity notes for one issue, most recent first.
    async fn notes(
        &self,
        project_id: i64,
        issue_iid: i64,
        max: usize,
    ) -> Result<Vec<Note>, TrackerError>;
}
