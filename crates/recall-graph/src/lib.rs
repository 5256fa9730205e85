//! recall-graph: Co-occurrence knowledge graph over shared memory files.
//!
//! Reads conversation history, project notes, reminders, and preference
//! facts; links every pair of entities that appear in the same record; keeps
//! the result as a single JSON snapshot; and answers relatedness, context,
//! and link-suggestion queries against it.

pub mod builder;
pub mod query;
pub mod report;
pub mod sources;
pub mod store;
pub mod types;

pub use builder::GraphBuilder;
pub use query::QueryEngine;
pub use sources::SourceDocuments;
pub use store::{GraphStore, StoreError};
pub use types::{BuildSummary, ContextLookup, GraphStats, RelatedEntity, Suggestion, TopicContext};
