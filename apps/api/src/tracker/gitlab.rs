//! GitLab REST v4 implementation of the tracker boundary.
//!
//! All normalization happens here: GitLab delivers assignees as a list, a
//! single object, or nothing at all, and omits time stats entirely on some
//! endpoints. The report engine only ever sees the flattened shapes from
//! `crate::models`.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{IssueTracker, TrackerError};
use crate::models::issue::{Assignee, Issue, IssueState, Note};
use crate::models::project::{MilestoneRef, ProjectRef};

// ── Wire shapes ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawProject {
    id: i64,
    name: String,
    #[serde(default)]
    path_with_namespace: String,
    namespace: Option<RawNamespace>,
}

impl RawProject {
    fn into_ref(self) -> ProjectRef {
        ProjectRef {
            id: self.id,
            name: self.name,
            path_with_namespace: self.path_with_namespace,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawNamespace {
    id: i64,
    kind: String,
}

#[derive(Debug, Deserialize)]
struct RawGroup {
    parent_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawMilestone {
    id: i64,
    title: String,
    due_date: Option<String>,
}

impl From<RawMilestone> for MilestoneRef {
    fn from(raw: RawMilestone) -> Self {
        MilestoneRef {
            id: raw.id,
            title: raw.title,
            due_date: raw.due_date,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawAssignee {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTimeStats {
    #[serde(default)]
    total_time_spent: i64,
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    iid: i64,
    title: String,
    #[serde(default)]
    web_url: String,
    state: String,
    #[serde(default)]
    labels: Vec<String>,
    due_date: Option<String>,
    #[serde(default)]
    assignees: Vec<RawAssignee>,
    assignee: Option<RawAssignee>,
    time_stats: Option<RawTimeStats>,
}

impl RawIssue {
    fn normalize(self) -> Issue {
        // Prefer the plural form; fall back to wrapping the singular one
        let assignees = if self.assignees.is_empty() {
            self.assignee.into_iter().collect()
        } else {
            self.assignees
        };

        Issue {
            iid: self.iid,
            title: self.title,
            web_url: self.web_url,
            state: if self.state == "closed" {
                IssueState::Closed
            } else {
                IssueState::Opened
            },
            labels: self.labels,
            due_date: self.due_date,
            assignees: assignees
                .into_iter()
                .map(|a| Assignee {
                    name: a.name.unwrap_or_else(|| "Unknown".to_string()),
                })
                .collect(),
            total_time_spent: self.time_stats.map(|t| t.total_time_spent).unwrap_or(0),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawNote {
    #[serde(default)]
    system: bool,
    body: String,
    created_at: String,
}

impl From<RawNote> for Note {
    fn from(raw: RawNote) -> Self {
        Note {
            system: raw.system,
            body: raw.body,
            created_at: raw.created_at,
        }
    }
}

// ── Client ──────────────────────────────────────────────────────────────────

pub struct GitLabClient {
    http: Client,
    base_url: String,
    token: String,
    whitelist: Vec<String>,
}

impl GitLabClient {
    pub fn new(base_url: String, token: String, whitelist: Vec<String>) -> Self {
        Self {
            http: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            whitelist,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, TrackerError> {
        let url = format!("{}/api/v4/{path}", self.base_url);
        debug!("GET {url}");

        let response = self
            .http
            .get(&url)
            .header("PRIVATE-TOKEN", &self.token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(TrackerError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TrackerError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl IssueTracker for GitLabClient {
    async fn project(&self, project_id: i64) -> Result<ProjectRef, TrackerError> {
        let raw: RawProject = self.get_json(&format!("projects/{project_id}"), &[]).await?;
        Ok(raw.into_ref())
    }

    async fn list_projects(&self) -> Result<Vec<ProjectRef>, TrackerError> {
        let mut found = Vec::new();
        let mut seen = HashSet::new();

        for name in &self.whitelist {
            let matches: Vec<RawProject> = match self
                .get_json(
                    "projects",
                    &[("search", name.as_str()), ("simple", "true"), ("per_page", "20")],
                )
                .await
            {
                Ok(projects) => projects,
                Err(e) => {
                    warn!(project = name.as_str(), "project search failed: {e}");
                    continue;
                }
            };

            for project in matches {
                if project.name.eq_ignore_ascii_case(name) && seen.insert(project.id) {
                    found.push(project.into_ref());
                }
            }
        }

        Ok(found)
    }

    async fn list_active_milestones(
        &self,
        project_id: i64,
    ) -> Result<Vec<MilestoneRef>, TrackerError> {
        let raw: Vec<RawMilestone> = self
            .get_json(
                &format!("projects/{project_id}/milestones"),
                &[
                    ("state", "active"),
                    ("per_page", "100"),
                    ("include_ancestors", "true"),
                ],
            )
            .await?;
        Ok(raw.into_iter().map(MilestoneRef::from).collect())
    }

    async fn find_milestone(
        &self,
        project_id: i64,
        milestone_id: i64,
    ) -> Result<Option<MilestoneRef>, TrackerError> {
        // Project-level milestone first
        match self
            .get_json::<RawMilestone>(
                &format!("projects/{project_id}/milestones/{milestone_id}"),
                &[],
            )
            .await
        {
            Ok(m) => return Ok(Some(m.into())),
            Err(TrackerError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        // Then walk the ancestor group chain
        let project: RawProject = self.get_json(&format!("projects/{project_id}"), &[]).await?;
        let Some(namespace) = project.namespace.filter(|n| n.kind == "group") else {
            return Ok(None);
        };

        let mut group_id = Some(namespace.id);
        while let Some(id) = group_id {
            match self
                .get_json::<RawMilestone>(&format!("groups/{id}/milestones/{milestone_id}"), &[])
                .await
            {
                Ok(m) => return Ok(Some(m.into())),
                Err(TrackerError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }

            group_id = match self.get_json::<RawGroup>(&format!("groups/{id}"), &[]).await {
                Ok(group) => group.parent_id,
                Err(e) => {
                    warn!(group = id, "group traversal stopped: {e}");
                    None
                }
            };
        }

        Ok(None)
    }

    async fn find_milestone_by_title(
        &self,
        project_id: i64,
        title: &str,
    ) -> Result<Option<MilestoneRef>, TrackerError> {
        let raw: Vec<RawMilestone> = self
            .get_json(
                &format!("projects/{project_id}/milestones"),
                &[
                    ("title", title),
                    ("state", "all"),
                    ("include_ancestors", "true"),
                ],
            )
            .await?;
        Ok(raw.into_iter().next().map(MilestoneRef::from))
    }

    async fn issues_for_milestone(
        &self,
        project_id: i64,
        milestone_title: &str,
    ) -> Result<Vec<Issue>, TrackerError> {
        let raw: Vec<RawIssue> = self
            .get_json(
                &format!("projects/{project_id}/issues"),
                &[
                    ("milestone", milestone_title),
                    ("state", "all"),
                    ("per_page", "100"),
                ],
            )
            .await?;
        Ok(raw.into_iter().map(RawIssue::normalize).collect())
    }

    async fn recent_milestones(
        &self,
        project_id: i64,
        max: usize,
    ) -> Result<Vec<MilestoneRef>, TrackerError> {
        let per_page = max.to_string();
        let raw: Vec<RawMilestone> = self
            .get_json(
                &format!("projects/{project_id}/milestones"),
                &[
                    ("state", "all"),
                    ("per_page", per_page.as_str()),
                    ("include_ancestors", "true"),
                    ("order_by", "due_date"),
                    ("sort", "desc"),
                ],
            )
            .await?;
        Ok(raw.into_iter().map(MilestoneRef::from).collect())
    }

    async fn notes(
        &self,
        project_id: i64,
        issue_iid: i64,
        max: usize,
    ) -> Result<Vec<Note>, TrackerError> {
        let per_page = max.to_string();
        let raw: Vec<RawNote> = self
            .get_json(
                &format!("projects/{project_id}/issues/{issue_iid}/notes"),
                &[("per_page", per_page.as_str())],
            )
            .await?;
        Ok(raw.into_iter().map(Note::from).collect())
    }
}
