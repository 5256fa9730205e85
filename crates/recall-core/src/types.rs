//! Core domain types for the recall knowledge graph.
//!
//! A node is keyed by its lower-cased entity string; these types describe
//! what is stored under that key.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Open metadata attached to a node. Merges are last-write-wins per key.
pub type Metadata = BTreeMap<String, serde_json::Value>;

// ── Entity Types ──────────────────────────────────────────────────

/// The fixed label set every node is tagged with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Project,
    Tool,
    Concept,
    Date,
    Person,
    Feature,
    Service,
    Tag,
    Keyword,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Tool => "tool",
            Self::Concept => "concept",
            Self::Date => "date",
            Self::Person => "person",
            Self::Feature => "feature",
            Self::Service => "service",
            Self::Tag => "tag",
            Self::Keyword => "keyword",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Nodes ─────────────────────────────────────────────────────────

/// A single entity in the graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    #[serde(default)]
    pub metadata: Metadata,
    /// Set when the node is created and never touched again.
    pub first_seen: DateTime<Utc>,
}

impl Node {
    pub fn new(entity_type: EntityType, first_seen: DateTime<Utc>) -> Self {
        Self {
            entity_type,
            metadata: Metadata::new(),
            first_seen,
        }
    }

    /// Merge `incoming` into this node's metadata; incoming keys win.
    pub fn merge_metadata(&mut self, incoming: &Metadata) {
        for (key, value) in incoming {
            self.metadata.insert(key.clone(), value.clone());
        }
    }
}

/// Case-fold and trim a raw entity string into a node key.
///
/// Returns `None` for strings that are empty after trimming.
pub fn normalize_key(raw: &str) -> Option<String> {
    let key = raw.trim().to_lowercase();
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}
