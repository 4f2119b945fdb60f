use std::sync::Arc;

use crate::config::Config;
use crate::narrative::NarrativeGenerator;
use crate::tracker::IssueTracker;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The tracker collaborator. Report building never talks to GitLab
    /// except through this trait object.
    pub tracker: Arc<dyn IssueTracker>,
    /// Present only when an LLM API key is configured; reports fall back to
    /// the unavailable marker otherwise.
    pub narrator: Option<Arc<dyn NarrativeGenerator>>,
    pub config: Config,
}
