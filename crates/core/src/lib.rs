//! # Datasynth Core
//!
//! Domain types, traits, and error definitions for the Datasynth business
//! discovery assistant. This crate has **zero framework dependencies**: it
//! defines the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every outbound seam (page fetching, text generation, document storage)
//! is defined as a trait here. Implementations live in their respective
//! crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod fetch;
pub mod knowledge;
pub mod memory;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use error::{AnalyzeError, FetchError, ParseError, StoreError, ValidationError};
pub use fetch::{PageFetcher, ScrapedPage};
pub use knowledge::{KnowledgeDelta, KnowledgeState};
pub use memory::{KnowledgeStore, StoredDocument};
pub use message::{ConversationTurn, Role};
pub use provider::{GenerationParams, Provider, ProviderRequest, ProviderResponse};
