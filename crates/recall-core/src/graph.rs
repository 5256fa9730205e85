//! In-memory knowledge graph: nodes, undirected weighted adjacency, and the
//! per-entity source index.
//!
//! Every map is a `BTreeMap`, so iteration is in sorted key order and
//! serialized snapshots are byte-stable across runs.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hash;
use crate::types::{EntityType, Metadata, Node};

// ── Adjacency ─────────────────────────────────────────────────────

/// Undirected weighted adjacency map.
///
/// Each edge is stored under both endpoints with the same weight.
/// A node with no edges simply has no entry; `neighbors` then yields nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Adjacency {
    edges: BTreeMap<String, BTreeMap<String, f64>>,
}

impl Adjacency {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `weight` to the edge between `a` and `b`, writing both directions.
    ///
    /// Returns `false` (and does nothing) for self-loops.
    pub fn add(&mut self, a: &str, b: &str, weight: f64) -> bool {
        if a == b {
            return false;
        }
        let updated = self.weight(a, b).unwrap_or(0.0) + weight;
        self.edges
            .entry(a.to_string())
            .or_default()
            .insert(b.to_string(), updated);
        self.edges
            .entry(b.to_string())
            .or_default()
            .insert(a.to_string(), updated);
        true
    }

    pub fn weight(&self, a: &str, b: &str) -> Option<f64> {
        self.edges.get(a).and_then(|n| n.get(b)).copied()
    }

    pub fn contains_edge(&self, a: &str, b: &str) -> bool {
        self.weight(a, b).is_some()
    }

    /// Neighbors of `key` with edge weights, in key order.
    pub fn neighbors<'a>(&'a self, key: &str) -> impl Iterator<Item = (&'a str, f64)> + 'a {
        self.edges
            .get(key)
            .into_iter()
            .flat_map(|n| n.iter().map(|(k, w)| (k.as_str(), *w)))
    }

    pub fn neighbor_set<'a>(&'a self, key: &str) -> BTreeSet<&'a str> {
        self.neighbors(key).map(|(k, _)| k).collect()
    }

    /// Number of undirected edges (each pair counted once).
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeMap::len).sum::<usize>() / 2
    }

    /// Every directed entry `(from, to, weight)`; each undirected edge appears twice.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, f64)> {
        self.edges.iter().flat_map(|(from, n)| {
            n.iter()
                .map(move |(to, w)| (from.as_str(), to.as_str(), *w))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

// ── Source Index ──────────────────────────────────────────────────

/// Entity key → distinct source-document names, in first-seen order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct SourceIndex {
    sources: BTreeMap<String, Vec<String>>,
}

impl SourceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `key` was observed in `source`. Duplicates are ignored.
    pub fn record(&mut self, key: &str, source: &str) {
        let list = self.sources.entry(key.to_string()).or_default();
        if !list.iter().any(|s| s == source) {
            list.push(source.to_string());
        }
    }

    pub fn sources(&self, key: &str) -> &[String] {
        self.sources.get(key).map_or(&[], Vec::as_slice)
    }

    /// True when no entity has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

// ── Knowledge Graph ───────────────────────────────────────────────

/// The full graph: nodes, edges, source index, and the last save time.
///
/// Serializes directly to the snapshot layout
/// `{nodes, edges, sources, updated}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeGraph {
    #[serde(default)]
    pub nodes: BTreeMap<String, Node>,
    #[serde(default)]
    pub edges: Adjacency,
    #[serde(default)]
    pub sources: SourceIndex,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node, or merge metadata into an existing one.
    ///
    /// An existing node keeps its type and `first_seen`. Returns `true` if
    /// the node was created.
    pub fn add_node(
        &mut self,
        key: &str,
        entity_type: EntityType,
        metadata: Option<&Metadata>,
        now: DateTime<Utc>,
    ) -> bool {
        match self.nodes.get_mut(key) {
            Some(node) => {
                if let Some(meta) = metadata {
                    node.merge_metadata(meta);
                }
                false
            }
            None => {
                let mut node = Node::new(entity_type, now);
                if let Some(meta) = metadata {
                    node.merge_metadata(meta);
                }
                self.nodes.insert(key.to_string(), node);
                true
            }
        }
    }

    /// Strengthen the undirected edge between two entities.
    pub fn add_edge(&mut self, a: &str, b: &str, weight: f64) -> bool {
        self.edges.add(a, b, weight)
    }

    pub fn node(&self, key: &str) -> Option<&Node> {
        self.nodes.get(key)
    }

    pub fn entity_type(&self, key: &str) -> Option<EntityType> {
        self.nodes.get(key).map(|n| n.entity_type)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.edge_count()
    }

    /// Node count per entity type.
    pub fn count_by_type(&self) -> BTreeMap<EntityType, usize> {
        let mut counts = BTreeMap::new();
        for node in self.nodes.values() {
            *counts.entry(node.entity_type).or_insert(0) += 1;
        }
        counts
    }

    /// BLAKE3 digest of the graph content, ignoring timestamps.
    pub fn content_hash(&self) -> String {
        hash::compute_graph_hash(self)
    }
}
