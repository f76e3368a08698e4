//! Guided discovery: a fixed questionnaire that builds the business profile
//! one answer at a time.
//!
//! The flow asks what the business sells, walks through [`CORE_QUESTIONS`],
//! then checks the profile. A thin profile loops back for follow-ups; a full
//! one is summarized and later turns go to the regular orchestrator. A URL
//! pasted at any point is scraped and folded into the profile without
//! moving the questionnaire forward.

use datasynth_core::error::FetchError;
use datasynth_core::knowledge::{KnowledgeDelta, KnowledgeState};
use datasynth_core::message::ConversationTurn;
use serde::Serialize;
use tracing::{info, warn};

use crate::orchestrator::{Orchestrator, TurnOutcome, find_url};

/// Opening line of a guided session.
pub const GUIDED_GREETING: &str = "Hi! 👋 What do you sell? (You can also paste a URL to scrape your business website)";

/// Asked in order once the business is known.
pub const CORE_QUESTIONS: [&str; 5] = [
    "Tell me more about your product. What makes it special?",
    "What are your main business goals?",
    "What challenges are you currently facing?",
    "Who is your target audience?",
    "What would success look like for you?",
];

/// Where each answer to [`CORE_QUESTIONS`] lands, and its label.
const ANSWER_SECTIONS: [(Section, &str); 5] = [
    (Section::Understanding, "Special features: "),
    (Section::Objectives, ""),
    (Section::Constraints, ""),
    (Section::Understanding, "Target audience: "),
    (Section::Objectives, "Success metric: "),
];

/// Steps shown to the user: the opening question, five core questions,
/// the profile check and free conversation.
pub const TOTAL_STEPS: u8 = 8;

/// URLs containing one of these are treated as plain text.
const SKIPPED_HOSTS: [&str; 3] = ["localhost", "127.0.0.1", "example.com"];
const MIN_URL_LEN: usize = 10;

const PAGE_EXCERPT_CHARS: usize = 800;
const INSIGHT_PREVIEW_CHARS: usize = 100;
const ERROR_PREVIEW_CHARS: usize = 50;

/// Profile thresholds checked after the last core question.
const MIN_UNDERSTANDING: usize = 2;
const MIN_OBJECTIVES: usize = 1;
const MIN_CONSTRAINTS: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Understanding,
    Objectives,
    Constraints,
}

impl Section {
    fn label(self) -> &'static str {
        match self {
            Self::Understanding => "Business Details",
            Self::Objectives => "Objectives",
            Self::Constraints => "Challenges",
        }
    }

    fn follow_up(self) -> &'static str {
        match self {
            Self::Understanding => "What makes your business unique compared to others?",
            Self::Objectives => "What are your main business goals for the next 6 months?",
            Self::Constraints => "What is the biggest challenge you're facing right now?",
        }
    }

    fn delta(self, item: String) -> KnowledgeDelta {
        let items = Some(vec![item]);
        match self {
            Self::Understanding => KnowledgeDelta {
                business_understanding: items,
                ..KnowledgeDelta::default()
            },
            Self::Objectives => KnowledgeDelta {
                objectives: items,
                ..KnowledgeDelta::default()
            },
            Self::Constraints => KnowledgeDelta {
                constraints: items,
                ..KnowledgeDelta::default()
            },
        }
    }
}

/// Sections that are still below their threshold, in asking order.
fn missing_sections(knowledge: &KnowledgeState) -> Vec<Section> {
    let mut missing = Vec::new();
    if knowledge.business_understanding.len() < MIN_UNDERSTANDING {
        missing.push(Section::Understanding);
    }
    if knowledge.objectives.len() < MIN_OBJECTIVES {
        missing.push(Section::Objectives);
    }
    if knowledge.constraints.len() < MIN_CONSTRAINTS {
        missing.push(Section::Constraints);
    }
    missing
}

/// Position in the questionnaire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GuidedStep {
    /// Waiting for what the business sells.
    #[default]
    Business,
    /// Waiting for the answer to `CORE_QUESTIONS[i]`.
    Question(usize),
    /// The profile check failed; waiting for more detail.
    FollowUp,
    /// The profile is summarized; turns go to the orchestrator.
    Complete,
}

impl GuidedStep {
    /// 1-based step number out of [`TOTAL_STEPS`].
    pub fn number(self) -> u8 {
        match self {
            Self::Business => 1,
            Self::Question(i) => 2 + i as u8,
            Self::FollowUp => 7,
            Self::Complete => TOTAL_STEPS,
        }
    }
}

/// Progress report for a guided session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStatus {
    pub current_step: u8,
    pub total_steps: u8,
    pub business: Option<String>,
    pub complete: bool,
}

/// Questionnaire state for one session.
#[derive(Debug, Clone, Default)]
pub struct GuidedWorkflow {
    step: GuidedStep,
    business: Option<String>,
    websites: usize,
}

impl GuidedWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> GuidedStep {
        self.step
    }

    /// What the business sells, once the user has said so.
    pub fn business(&self) -> Option<&str> {
        self.business.as_deref()
    }

    pub fn status(&self) -> WorkflowStatus {
        WorkflowStatus {
            current_step: self.step.number(),
            total_steps: TOTAL_STEPS,
            business: self.business.clone(),
            complete: self.step == GuidedStep::Complete,
        }
    }

    /// Handle one user turn. `knowledge` is the session state before this
    /// turn; the returned delta is merged by the caller.
    pub async fn advance(
        &mut self,
        orchestrator: &Orchestrator,
        input: &str,
        history: &[ConversationTurn],
        knowledge: &KnowledgeState,
    ) -> TurnOutcome {
        if self.step != GuidedStep::Complete {
            if let Some(url) = find_url(input).filter(|url| is_scrapable(url)) {
                return self.scrape(orchestrator, url).await;
            }
        }

        let answer = input.trim();
        match self.step {
            GuidedStep::Business => {
                self.business = Some(answer.to_string());
                self.step = GuidedStep::Question(0);
                info!(business = answer, "Guided profile started");
                outcome(
                    format!(
                        "Great! You make **{answer}**. I've created your business profile.\n\nNext question: {}",
                        CORE_QUESTIONS[0]
                    ),
                    Section::Understanding.delta(format!("Business: {answer}")),
                )
            }
            GuidedStep::Question(i) => {
                let (section, label) = ANSWER_SECTIONS[i];
                let delta = section.delta(format!("{label}{answer}"));
                match CORE_QUESTIONS.get(i + 1) {
                    Some(next) => {
                        self.step = GuidedStep::Question(i + 1);
                        outcome(format!("💾 Response recorded! Next question: {next}"), delta)
                    }
                    None => self.check_profile(knowledge, delta),
                }
            }
            GuidedStep::FollowUp => {
                let section = missing_sections(knowledge)
                    .first()
                    .copied()
                    .unwrap_or(Section::Understanding);
                let delta = section.delta(answer.to_string());
                self.check_profile(knowledge, delta)
            }
            GuidedStep::Complete => orchestrator.process_user_input(input, history).await,
        }
    }

    /// Decide between summarizing and asking for more.
    fn check_profile(&mut self, knowledge: &KnowledgeState, delta: KnowledgeDelta) -> TurnOutcome {
        let mut profile = knowledge.clone();
        profile.merge(&delta);

        let missing = missing_sections(&profile);
        if let Some(first) = missing.first() {
            self.step = GuidedStep::FollowUp;
            let labels: Vec<&str> = missing.iter().map(|s| s.label()).collect();
            return outcome(
                format!(
                    "📋 I need more information to complete your business profile.\n\nMissing: {}\n\n**Next Question:** {}",
                    labels.join(", "),
                    first.follow_up()
                ),
                delta,
            );
        }

        let summary = self.summary_line(&profile);
        profile.summary = summary.clone();
        self.step = GuidedStep::Complete;
        info!(summary = %summary, "Guided profile complete");

        let message = format!(
            "🎉 **Your Business Profile is Complete!**\n\n**Business:** {}\n\n**Understanding:**\n{}\n\n**Objectives:**\n{}\n\n**Challenges:**\n{}\n\n**Summary:** {summary}\n\nNow I can provide targeted assistance! What would you like to focus on?",
            self.business.as_deref().unwrap_or("your business"),
            bullets(&profile.business_understanding),
            bullets(&profile.objectives),
            bullets(&profile.constraints),
        );
        let delta = delta.concat(KnowledgeDelta {
            summary: Some(summary),
            ..KnowledgeDelta::default()
        });
        outcome(message, delta)
    }

    fn summary_line(&self, profile: &KnowledgeState) -> String {
        let mut summary = format!(
            "Complete business profile with {} business insights, {} objectives, and {} challenges documented.",
            profile.business_understanding.len(),
            profile.objectives.len(),
            profile.constraints.len()
        );
        if self.websites > 0 {
            summary.push_str(&format!(" Includes website analysis from {} source(s).", self.websites));
        }
        summary
    }

    async fn scrape(&mut self, orchestrator: &Orchestrator, url: &str) -> TurnOutcome {
        info!(url, "Scraping URL in guided session");

        let page = match orchestrator.fetcher().fetch(url).await {
            Ok(page) => page,
            Err(e) => {
                warn!(url, error = %e, "Fetch failed");
                return TurnOutcome {
                    message: format!("{}\n\n{}", fetch_failure_message(&e), self.pending_question()),
                    knowledge_update: None,
                };
            }
        };
        self.websites += 1;

        let title = match page.title.trim() {
            "" => url.to_string(),
            title => title.to_string(),
        };
        let excerpt: String = page.content.chars().take(PAGE_EXCERPT_CHARS).collect();
        let prompt = format!(
            "Analyze this business website and extract key information:\n\nTitle: {title}\nContent: {excerpt}\n\nWhat does this business do? Provide a brief summary."
        );
        let insight = orchestrator.analyzer().analyze(&prompt, &[], "").await.response;

        if self.step == GuidedStep::Business {
            self.business = Some(title.clone());
            self.step = GuidedStep::Question(0);
            return outcome(
                format!(
                    "✅ **Website Analyzed: {title}**\n\n{insight}\n\nI've started your business profile from it.\n\nNext question: {}",
                    CORE_QUESTIONS[0]
                ),
                Section::Understanding.delta(format!("Website: {title}")),
            );
        }

        let preview: String = insight.chars().take(INSIGHT_PREVIEW_CHARS).collect();
        outcome(
            format!(
                "✅ **Website Information Added to Profile!**\n\n**{title}**\n\n{insight}\n\n{}",
                self.pending_question()
            ),
            Section::Understanding.delta(format!("Website insight: {preview}...")),
        )
    }

    /// Re-ask whatever the questionnaire is waiting for.
    fn pending_question(&self) -> String {
        match self.step {
            GuidedStep::Business => "What do you sell?".to_string(),
            GuidedStep::Question(i) => format!("Next question: {}", CORE_QUESTIONS[i]),
            GuidedStep::FollowUp => "Could you tell me more about your business, goals or challenges?".to_string(),
            GuidedStep::Complete => "What would you like to focus on?".to_string(),
        }
    }
}

/// Long enough to be real and not a local or placeholder host.
fn is_scrapable(url: &str) -> bool {
    let lower = url.to_lowercase();
    url.len() >= MIN_URL_LEN && !SKIPPED_HOSTS.iter().any(|host| lower.contains(host))
}

fn fetch_failure_message(error: &FetchError) -> String {
    match error {
        FetchError::Timeout { .. } => {
            "❌ **Website took too long** to respond. Let's continue with our questions instead!".to_string()
        }
        FetchError::Network(_) => {
            "❌ **Cannot connect** to that website. It might be down or restricted. Let's continue with our questions!"
                .to_string()
        }
        other => {
            let detail: String = other.to_string().chars().take(ERROR_PREVIEW_CHARS).collect();
            format!("❌ **Couldn't access that website** ({detail}). No worries, let's continue with the questions!")
        }
    }
}

fn bullets(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("• {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn outcome(message: String, delta: KnowledgeDelta) -> TurnOutcome {
    TurnOutcome {
        message,
        knowledge_update: Some(delta),
    }
}
