//! Knowledge store implementations for Datasynth.

pub mod in_memory;

pub use in_memory::InMemoryKnowledgeStore;
