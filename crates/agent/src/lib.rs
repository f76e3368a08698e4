//! The Datasynth turn pipeline.
//!
//! One user turn flows through three pieces:
//!
//! 1. **Session** hands the turn and the transcript so far to a task
//! 2. **Orchestrator** routes it: a URL is scraped and summarized, anything
//!    else is matched against the knowledge store for context
//! 3. **Analyzer** renders the prompt, calls the provider and validates the
//!    JSON reply into a message plus a [`KnowledgeDelta`]
//!
//! When the task finishes the session records both turns and folds the
//! delta into its cumulative knowledge state.
//! Guided sessions put a fixed questionnaire ([`guided`]) in front of the
//! orchestrator until the profile is complete.
//! Every failure on this path degrades to a fixed message; nothing is
//! returned to the caller as an error except blank input.
//!
//! [`KnowledgeDelta`]: datasynth_core::knowledge::KnowledgeDelta

pub mod analyzer;
pub mod guided;
pub mod orchestrator;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use analyzer::{Analysis, Analyzer};
pub use guided::{GuidedWorkflow, WorkflowStatus};
pub use orchestrator::{Orchestrator, TurnOutcome};
pub use session::{ProfileSummary, Session, SessionError, SessionFactory, SessionMode, SessionSnapshot};
