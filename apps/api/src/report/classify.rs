//! Label classification: an issue's label set maps to exactly one category
//! and one canonical status, via fixed priority tables.

use serde::{Serialize, Serializer};

/// Requirement category of an issue, derived from its labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Feature,
    Enhancement,
    Bug,
    Other,
}

impl Category {
    /// The tracker label text this category is keyed by on the wire.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Feature => "Req::Feature",
            Category::Enhancement => "Req::Enhancement",
            Category::Bug => "Req::Bug",
            Category::Other => "Other",
        }
    }
}

/// The single status an issue is reported under.
///
/// Boards label issues with one or more `Status::`/`Signoff::` labels; the
/// classifier collapses them to the most advanced one. `Custom` carries any
/// prefixed label the team invents beyond the known lanes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalStatus {
    Closed,
    QaTesting,
    MergeRequest,
    Progress,
    SignoffDevelopment,
    SignoffSolutions,
    DiscussionRequired,
    Open,
    Custom(String),
}

impl CanonicalStatus {
    pub fn as_label(&self) -> &str {
        match self {
            CanonicalStatus::Closed => "Status::Closed",
            CanonicalStatus::QaTesting => "Status::QA Testing",
            CanonicalStatus::MergeRequest => "Status::Merge Request",
            CanonicalStatus::Progress => "Status::Progress",
            CanonicalStatus::SignoffDevelopment => "Signoff::Development",
            CanonicalStatus::SignoffSolutions => "Signoff::Solutions",
            CanonicalStatus::DiscussionRequired => "Status::Discussion required",
            CanonicalStatus::Open => "Status::Open",
            CanonicalStatus::Custom(label) => label,
        }
    }
}

impl Serialize for CanonicalStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_label())
    }
}

/// Classifies an issue into a category. The category labels are tested in
/// declared order and the first one present wins, so an issue carrying both
/// `Req::Feature` and `Req::Bug` is a Feature.
pub fn classify_category(labels: &[String]) -> Category {
    const ORDERED: [Category; 3] = [Category::Feature, Category::Enhancement, Category::Bug];
    ORDERED
        .into_iter()
        .find(|category| labels.iter().any(|l| l == category.label()))
        .unwrap_or(Category::Other)
}

/// Derives the canonical status from a label set. Total over any label set,
/// including the empty one.
///
/// Known statuses are tested most-advanced first. When none match, the first
/// label (in the issue's original label order) with a `Status::` or
/// `Signoff::` prefix is kept verbatim; failing that, the issue counts as
/// `Status::Open`.
pub fn classify_status(labels: &[String]) -> CanonicalStatus {
    const PRIORITY: [CanonicalStatus; 8] = [
        CanonicalStatus::Closed,
        CanonicalStatus::QaTesting,
        CanonicalStatus::MergeRequest,
        CanonicalStatus::Progress,
        CanonicalStatus::SignoffDevelopment,
        CanonicalStatus::SignoffSolutions,
        CanonicalStatus::DiscussionRequired,
        CanonicalStatus::Open,
    ];

    for status in PRIORITY {
        if labels.iter().any(|l| l == status.as_label()) {
            return status;
        }
    }

    labels
        .iter()
        .find(|l| l.starts_with("Status::") || l.starts_with("Signoff::"))
        .map(|l| CanonicalStatus::Custom(l.clone()))
        .unwrap_or(CanonicalStatus::Open)
}
