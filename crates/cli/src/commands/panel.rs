//! Terminal rendering of the knowledge panel and profile summary.

use datasynth_agent::ProfileSummary;
use datasynth_core::knowledge::{Completeness, KnowledgeState};

const UNDERSTANDING_PLACEHOLDERS: &[&str] = &[
    "Information extracted from conversation",
    "Important details and context",
    "Another point",
];
const OBJECTIVE_PLACEHOLDERS: &[&str] = &[
    "Outcome desired by user",
    "Another thing that the user wants to know",
    "Another point",
];
const CONSTRAINT_PLACEHOLDERS: &[&str] = &["Constraint 1", "Constraint 2"];
const SUMMARY_PLACEHOLDER: &str =
    "A short summary that clearly shows the agent's understanding of the user problem statement and requirements.";

/// Render every section, using placeholder bullets for empty ones.
pub fn render(knowledge: &KnowledgeState, completeness: &Completeness) -> String {
    let mut out = String::new();
    out.push_str("  ── Knowledge Base ──\n\n");
    section(&mut out, "Business Understanding", &knowledge.business_understanding, UNDERSTANDING_PLACEHOLDERS);
    section(&mut out, "Objectives", &knowledge.objectives, OBJECTIVE_PLACEHOLDERS);
    section(&mut out, "Constraints", &knowledge.constraints, CONSTRAINT_PLACEHOLDERS);

    out.push_str("  Summary:\n");
    let summary = if knowledge.summary.is_empty() {
        SUMMARY_PLACEHOLDER
    } else {
        &knowledge.summary
    };
    out.push_str(&format!("    {summary}\n\n"));

    out.push_str(&format!(
        "  Completeness: {}/{} ({:.0}%)\n",
        completeness.met,
        completeness.total,
        completeness.score * 100.0
    ));
    out
}

/// Render a [`ProfileSummary`], skipping empty lists.
pub fn render_summary(summary: &ProfileSummary) -> String {
    let mut out = String::new();
    out.push_str("  ── Business Profile ──\n\n");

    let overview = if summary.business_overview.is_empty() {
        "Not known yet"
    } else {
        &summary.business_overview
    };
    out.push_str(&format!("  Business: {overview}\n"));
    if let Some(workflow) = &summary.workflow {
        out.push_str(&format!("  Step:     {}/{}\n", workflow.current_step, workflow.total_steps));
    }
    out.push('\n');

    for (title, items) in [
        ("Key Insights", &summary.key_insights),
        ("Objectives", &summary.main_objectives),
        ("Challenges", &summary.constraints),
    ] {
        if !items.is_empty() {
            out.push_str(&format!("  {title}:\n"));
            for item in items {
                out.push_str(&format!("    • {item}\n"));
            }
            out.push('\n');
        }
    }

    out.push_str(&format!(
        "  Completeness: {}/{} ({:.0}%){}\n",
        summary.completeness.met,
        summary.completeness.total,
        summary.completeness.score * 100.0,
        if summary.complete { ", complete" } else { "" }
    ));
    out.push_str(&format!("  Conversations: {}\n", summary.total_conversations));
    out
}

fn section(out: &mut String, title: &str, items: &[String], placeholders: &[&str]) {
    out.push_str(&format!("  {title}:\n"));
    if items.is_empty() {
        for item in placeholders {
            out.push_str(&format!("    • {item}\n"));
        }
    } else {
        for item in items {
            out.push_str(&format!("    • {item}\n"));
        }
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_state_shows_placeholders() {
        let state = KnowledgeState::new();
        let text = render(&state, &state.completeness(0));
        assert!(text.contains("• Information extracted from conversation"));
        assert!(text.contains("• Constraint 2"));
        assert!(text.contains(SUMMARY_PLACEHOLDER));
        assert!(text.contains("Completeness: 0/5 (0%)"));
    }

    #[test]
    fn filled_sections_replace_placeholders() {
        let state = KnowledgeState {
            objectives: vec!["expand eco packaging".into()],
            summary: "Eco box maker".into(),
            ..KnowledgeState::default()
        };
        let text = render(&state, &state.completeness(1));
        assert!(text.contains("• expand eco packaging"));
        assert!(!text.contains("Outcome desired by user"));
        assert!(text.contains("    Eco box maker\n"));
        assert!(!text.contains(SUMMARY_PLACEHOLDER));
        assert!(text.contains("• Another point"));
    }

    #[test]
    fn summary_lists_only_filled_sections() {
        let state = KnowledgeState {
            business_understanding: vec!["Business: boxes".into()],
            constraints: vec!["cash flow".into()],
            ..KnowledgeState::default()
        };
        let summary = ProfileSummary {
            business_overview: "boxes".into(),
            key_insights: state.business_understanding.clone(),
            main_objectives: Vec::new(),
            constraints: state.constraints.clone(),
            completeness: state.completeness(2),
            complete: false,
            total_conversations: 2,
            workflow: None,
        };

        let text = render_summary(&summary);
        assert!(text.contains("  Business: boxes\n"));
        assert!(text.contains("    • Business: boxes\n"));
        assert!(text.contains("  Challenges:\n    • cash flow\n"));
        assert!(!text.contains("Objectives:"));
        assert!(!text.contains("Step:"));
        assert!(text.contains("Completeness: 2/5 (40%)\n"));
        assert!(text.contains("Conversations: 2"));
    }
}
