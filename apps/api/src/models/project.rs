use serde::{Deserialize, Serialize};

/// A tracker project, normalized at the client boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRef {
    pub id: i64,
    pub name: String,
    pub path_with_namespace: String,
}

/// A milestone reference: enough identity to list, select, and match by title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MilestoneRef {
    pub id: i64,
    pub title: String,
    /// `YYYY-MM-DD` as delivered by the tracker. Kept as text: a malformed
    /// value must flow through as "absent", not fail deserialization.
    pub due_date: Option<String>,
}
