//! BLAKE3 content hashing for rebuild comparison.
//!
//! Hashes node types, node metadata, edges, and sources, leaving out
//! `first_seen` and `updated` so two builds from the same inputs agree.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::graph::{Adjacency, KnowledgeGraph, SourceIndex};
use crate::types::{EntityType, Metadata};

#[derive(Serialize)]
struct HashableNode<'a> {
    #[serde(rename = "type")]
    entity_type: EntityType,
    metadata: &'a Metadata,
}

#[derive(Serialize)]
struct HashableGraph<'a> {
    nodes: BTreeMap<&'a str, HashableNode<'a>>,
    edges: &'a Adjacency,
    sources: &'a SourceIndex,
}

/// Compute the BLAKE3 hash of a graph's content.
///
/// Serializes the timestamp-free view to canonical JSON (all maps are
/// sorted) and returns the hex-encoded digest.
pub fn compute_graph_hash(graph: &KnowledgeGraph) -> String {
    let hashable = HashableGraph {
        nodes: graph
            .nodes
            .iter()
            .map(|(key, node)| {
                (
                    key.as_str(),
                    HashableNode {
                        entity_type: node.entity_type,
                        metadata: &node.metadata,
                    },
                )
            })
            .collect(),
        edges: &graph.edges,
        sources: &graph.sources,
    };

    let json = serde_json::to_vec(&hashable).expect("Graph serialization should not fail");
    blake3::hash(&json).to_hex().to_string()
}
