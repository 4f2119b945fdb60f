// Narrative prompt templates. All report-summary prompts live here.

use crate::report::aggregate::CategoryBuckets;

/// System prompt for milestone narratives.
pub const NARRATIVE_SYSTEM: &str = "You are a helpful project manager assistant.";

/// Builds the milestone-summary prompt. An empty `projects` slice produces
/// the single-project phrasing.
pub fn build_milestone_prompt(
    milestone_title: &str,
    projects: &[String],
    categories: &CategoryBuckets,
) -> String {
    let scope = if projects.is_empty() {
        format!("the following milestone: \"{milestone_title}\"")
    } else {
        format!(
            "the milestone \"{milestone_title}\" across these projects: {}",
            projects.join(", ")
        )
    };

    format!(
        "You are a Project Manager. Summarize the progress of {scope}.\n\
         \n\
         Issues by Category:\n\
         \n\
         **Features (Req::Feature):**\n{}\n\
         \n\
         **Enhancements (Req::Enhancement):**\n{}\n\
         \n\
         **Bugs (Req::Bug):**\n{}\n\
         \n\
         **Other Tasks:**\n{}\n\
         \n\
         Task:\n\
         1. Provide a high-level summary of what is being delivered.\n\
         2. Highlight key features and enhancements.\n\
         3. Mention any critical bugs being addressed.\n\
         4. Assess the overall status based on issue states (Open/Closed).\n\
         \n\
         Return a concise markdown summary.",
        lines_or_none(&categories.feature),
        lines_or_none(&categories.enhancement),
        lines_or_none(&categories.bug),
        lines_or_none(&categories.other),
    )
}

fn lines_or_none(lines: &[String]) -> String {
    if lines.is_empty() {
        "None".to_string()
    } else {
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_categories_render_as_none() {
        let prompt = build_milestone_prompt("Development 3", &[], &CategoryBuckets::default());
        assert!(prompt.contains("the following milestone: \"Development 3\""));
        assert!(prompt.contains("**Features (Req::Feature):**\nNone"));
    }

    #[test]
    fn test_multi_project_phrasing_lists_projects() {
        let projects = vec!["atlas".to_string(), "hermes".to_string()];
        let mut categories = CategoryBuckets::default();
        categories
            .bug
            .push("- [atlas] Fix login (State: opened)".to_string());

        let prompt = build_milestone_prompt("Development 3", &projects, &categories);
        assert!(prompt.contains("across these projects: atlas, hermes"));
        assert!(prompt.contains("- [atlas] Fix login (State: opened)"));
    }
}
