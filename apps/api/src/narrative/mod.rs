//! Narrative generation: turns the categorized issue lists into a short
//! project-manager style progress summary.
//!
//! The generator is optional by design: when it is missing or errors, the
//! report ships with `SUMMARY_UNAVAILABLE` in the summary field and every
//! structural field intact.

use async_trait::async_trait;

use crate::llm_client::{LlmClient, LlmError};
use crate::report::aggregate::CategoryBuckets;

pub mod prompts;

/// Marker used in place of a narrative whenever the generator is missing or
/// fails.
pub const SUMMARY_UNAVAILABLE: &str = "No AI summary available";

/// Pluggable narrative backend, carried in `AppState` as an
/// `Option<Arc<dyn NarrativeGenerator>>`.
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    /// `projects` is empty for single-project reports; multi-project reports
    /// pass the names of every project that answered.
    async fn summarize(
        &self,
        milestone_title: &str,
        projects: &[String],
        categories: &CategoryBuckets,
    ) -> Result<String, LlmError>;
}

/// Claude-backed narrator.
pub struct LlmNarrator {
    llm: LlmClient,
}

impl LlmNarrator {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl NarrativeGenerator for LlmNarrator {
    async fn summarize(
        &self,
        milestone_title: &str,
        projects: &[String],
        categories: &CategoryBuckets,
    ) -> Result<String, LlmError> {
        let prompt = prompts::build_milestone_prompt(milestone_title, projects, categories);
        self.llm.call(&prompt, prompts::NARRATIVE_SYSTEM).await
    }
}
