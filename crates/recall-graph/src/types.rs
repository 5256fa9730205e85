//! Result records returned by the builder and the query engine.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use recall_core::{EntityType, Node};

/// Items contributed by each source during a build.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ItemCounts {
    pub preferences: usize,
    pub facts: usize,
    pub conversations: usize,
    pub projects: usize,
    pub notes: usize,
    pub reminders: usize,
}

impl ItemCounts {
    pub fn total(&self) -> usize {
        self.preferences + self.facts + self.conversations + self.projects + self.notes + self.reminders
    }
}

/// Outcome of a full rebuild.
#[derive(Debug, Clone, Serialize)]
pub struct BuildSummary {
    pub nodes: usize,
    pub edges: usize,
    pub items: ItemCounts,
    pub content_hash: String,
}

/// A direct neighbor of a resolved entity.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RelatedEntity {
    pub entity: String,
    pub weight: f64,
    /// `None` only for neighbors missing from a hand-edited snapshot.
    #[serde(rename = "type")]
    pub entity_type: Option<EntityType>,
}

/// An entity reachable through one of the topic's top direct neighbors.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SecondDegree {
    pub entity: String,
    /// Discounted weight of the strongest path found.
    pub weight: f64,
    #[serde(rename = "type")]
    pub entity_type: Option<EntityType>,
    /// The direct neighbor the strongest path goes through.
    pub via: String,
}

/// Everything known about a resolved topic.
#[derive(Debug, Clone, Serialize)]
pub struct TopicContext {
    /// What the caller asked for.
    pub query: String,
    /// The node key the query resolved to.
    pub topic: String,
    pub node: Node,
    pub sources: Vec<String>,
    pub related: Vec<RelatedEntity>,
    pub connected: Vec<SecondDegree>,
}

/// Lookup miss, with existing keys the caller might have meant.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NotFound {
    pub query: String,
    pub suggestions: Vec<String>,
}

/// Result of `get_context`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ContextLookup {
    Found(TopicContext),
    NotFound(NotFound),
}

/// A pair of unlinked entities that share neighbors.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Suggestion {
    pub entity1: String,
    pub entity2: String,
    pub type1: EntityType,
    pub type2: EntityType,
    pub common_connections: Vec<String>,
    pub strength: usize,
}

/// Aggregate counts over a loaded graph.
#[derive(Debug, Clone, Serialize)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub nodes_by_type: BTreeMap<EntityType, usize>,
    pub updated: Option<DateTime<Utc>>,
    pub content_hash: String,
}
