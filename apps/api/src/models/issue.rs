use serde::{Deserialize, Serialize};

/// Issue open/closed state as reported by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Opened,
    Closed,
}

impl IssueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueState::Opened => "opened",
            IssueState::Closed => "closed",
        }
    }
}

/// One issue assignee. The tracker client flattens GitLab's singular
/// `assignee` / plural `assignees` split into this list form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignee {
    pub name: String,
}

/// An activity note on an issue. Only system-generated notes matter to the
/// compliance scan; bodies and timestamps stay raw.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub system: bool,
    pub body: String,
    pub created_at: String,
}

/// A normalized tracker issue. Labels are always a plain string list,
/// assignees always a list, and `total_time_spent` is already defaulted to
/// zero when the tracker omits it. The report engine never sees raw tracker
/// JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub iid: i64,
    pub title: String,
    pub web_url: String,
    pub state: IssueState,
    pub labels: Vec<String>,
    pub due_date: Option<String>,
    pub assignees: Vec<Assignee>,
    /// Total logged time in seconds.
    pub total_time_spent: i64,
}
