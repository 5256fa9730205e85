//! Read-only queries over a loaded graph.
//!
//! Entity lookups are case-insensitive. A miss on the exact key falls back
//! to the first key, in sorted order, that contains the query or is
//! contained in it.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use recall_core::types::normalize_key;
use recall_core::{EntityType, KnowledgeGraph, QueryConfig};

use crate::types::{
    ContextLookup, GraphStats, NotFound, RelatedEntity, SecondDegree, Suggestion, TopicContext,
};

/// Borrowing query engine. Never mutates the graph.
pub struct QueryEngine<'g> {
    graph: &'g KnowledgeGraph,
    config: QueryConfig,
}

impl<'g> QueryEngine<'g> {
    pub fn new(graph: &'g KnowledgeGraph) -> Self {
        Self {
            graph,
            config: QueryConfig::default(),
        }
    }

    pub fn with_config(mut self, config: QueryConfig) -> Self {
        self.config = config;
        self
    }

    /// Resolve user input to a node key: exact match first, then substring.
    pub fn resolve(&self, query: &str) -> Option<&'g str> {
        let needle = normalize_key(query)?;
        if let Some((key, _)) = self.graph.nodes.get_key_value(&needle) {
            return Some(key.as_str());
        }
        self.graph
            .nodes
            .keys()
            .find(|key| key.contains(needle.as_str()) || needle.contains(key.as_str()))
            .map(String::as_str)
    }

    /// Up to `limit` neighbors of the resolved entity, strongest first.
    ///
    /// Returns an empty list when nothing resolves.
    pub fn get_related(&self, entity: &str, limit: usize) -> Vec<RelatedEntity> {
        match self.resolve(entity) {
            Some(key) => self.related_of(key, limit),
            None => Vec::new(),
        }
    }

    /// Node details, sources, direct neighbors, and inferred second-degree links.
    ///
    /// A second-degree entity reachable through several direct neighbors
    /// reports the largest discounted weight among those paths.
    pub fn get_context(&self, topic: &str) -> ContextLookup {
        let Some(key) = self.resolve(topic) else {
            return ContextLookup::NotFound(self.not_found(topic));
        };
        let Some(node) = self.graph.node(key) else {
            return ContextLookup::NotFound(self.not_found(topic));
        };

        let related = self.related_of(key, self.config.context_related_limit);
        let direct = self.graph.edges.neighbor_set(key);

        let mut inferred: BTreeMap<&str, (f64, &str)> = BTreeMap::new();
        for first in related.iter().take(self.config.context_expand) {
            for (second, weight) in self.graph.edges.neighbors(&first.entity) {
                if second == key || direct.contains(second) {
                    continue;
                }
                let discounted = weight * self.config.second_degree_discount;
                inferred
                    .entry(second)
                    .and_modify(|best| {
                        if discounted > best.0 {
                            *best = (discounted, first.entity.as_str());
                        }
                    })
                    .or_insert((discounted, first.entity.as_str()));
            }
        }

        let mut connected: Vec<SecondDegree> = inferred
            .into_iter()
            .map(|(entity, (weight, via))| SecondDegree {
                entity: entity.to_string(),
                weight,
                entity_type: self.graph.entity_type(entity),
                via: via.to_string(),
            })
            .collect();
        connected.sort_by(|a, b| by_weight_desc(a.weight, b.weight));
        connected.truncate(self.config.second_degree_limit);

        ContextLookup::Found(TopicContext {
            query: topic.to_string(),
            topic: key.to_string(),
            node: node.clone(),
            sources: self.graph.sources.sources(key).to_vec(),
            related,
            connected,
        })
    }

    /// A not-found result listing existing keys the caller could try.
    pub fn not_found(&self, query: &str) -> NotFound {
        NotFound {
            query: query.to_string(),
            suggestions: self
                .graph
                .nodes
                .keys()
                .take(self.config.not_found_suggestions)
                .cloned()
                .collect(),
        }
    }

    /// Unlinked pairs sharing at least `min_common` neighbors, most shared first.
    ///
    /// `min_common` is raised to 1: pairs with nothing in common are never
    /// suggested. Compares every pair of nodes, so cost is quadratic in the
    /// node count.
    pub fn suggest_connections(&self, min_common: usize) -> Vec<Suggestion> {
        let min_common = min_common.max(1);
        let entries: Vec<(&str, EntityType, BTreeSet<&str>)> = self
            .graph
            .nodes
            .iter()
            .map(|(key, node)| {
                (
                    key.as_str(),
                    node.entity_type,
                    self.graph.edges.neighbor_set(key),
                )
            })
            .collect();

        let mut suggestions = Vec::new();
        for (i, (key1, type1, neighbors1)) in entries.iter().enumerate() {
            if neighbors1.len() < min_common {
                continue;
            }
            for (key2, type2, neighbors2) in &entries[i + 1..] {
                if neighbors1.contains(key2) {
                    continue;
                }
                let common: Vec<String> = neighbors1
                    .intersection(neighbors2)
                    .map(|k| k.to_string())
                    .collect();
                if common.len() >= min_common {
                    suggestions.push(Suggestion {
                        entity1: key1.to_string(),
                        entity2: key2.to_string(),
                        type1: *type1,
                        type2: *type2,
                        strength: common.len(),
                        common_connections: common,
                    });
                }
            }
        }

        suggestions.sort_by(|a, b| b.strength.cmp(&a.strength));
        suggestions.truncate(self.config.suggestion_limit);
        suggestions
    }

    pub fn get_stats(&self) -> GraphStats {
        GraphStats {
            total_nodes: self.graph.node_count(),
            total_edges: self.graph.edge_count(),
            nodes_by_type: self.graph.count_by_type(),
            updated: self.graph.updated,
            content_hash: self.graph.content_hash(),
        }
    }

    /// All node keys grouped by type, each group sorted.
    pub fn entities_by_type(&self) -> BTreeMap<EntityType, Vec<String>> {
        let mut groups: BTreeMap<EntityType, Vec<String>> = BTreeMap::new();
        for (key, node) in &self.graph.nodes {
            groups.entry(node.entity_type).or_default().push(key.clone());
        }
        groups
    }

    fn related_of(&self, key: &str, limit: usize) -> Vec<RelatedEntity> {
        let mut related: Vec<RelatedEntity> = self
            .graph
            .edges
            .neighbors(key)
            .map(|(entity, weight)| RelatedEntity {
                entity: entity.to_string(),
                weight,
                entity_type: self.graph.entity_type(entity),
            })
            .collect();
        related.sort_by(|a, b| by_weight_desc(a.weight, b.weight));
        related.truncate(limit);
        related
    }
}

/// Descending weight order. Stable sorts keep key order among ties.
fn by_weight_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn graph_with(nodes: &[(&str, EntityType)], edges: &[(&str, &str, f64)]) -> KnowledgeGraph {
        let mut graph = KnowledgeGraph::new();
        let now = Utc::now();
        for (key, entity_type) in nodes {
            graph.add_node(key, *entity_type, None, now);
        }
        for (a, b, w) in edges {
            graph.add_edge(a, b, *w);
        }
        graph
    }

    /// alpha and beta share core and docs; edge hangs off core only.
    fn diamond() -> KnowledgeGraph {
        graph_with(
            &[
                ("alpha", EntityType::Keyword),
                ("beta", EntityType::Keyword),
                ("core", EntityType::Tool),
                ("docs", EntityType::Concept),
                ("edge", EntityType::Tag),
            ],
            &[
                ("alpha", "core", 1.0),
                ("alpha", "docs", 2.0),
                ("beta", "core", 1.5),
                ("beta", "docs", 0.5),
                ("core", "edge", 4.0),
            ],
        )
    }

    #[test]
    fn test_get_related_sorted_by_weight() {
        let graph = diamond();
        let engine = QueryEngine::new(&graph);
        let related = engine.get_related("Alpha", 10);

        let keys: Vec<&str> = related.iter().map(|r| r.entity.as_str()).collect();
        assert_eq!(keys, vec!["docs", "core"]);
        assert_eq!(related[0].weight, 2.0);
        assert_eq!(related[0].entity_type, Some(EntityType::Concept));
    }

    #[test]
    fn test_get_related_respects_limit() {
        let graph = diamond();
        let engine = QueryEngine::new(&graph);
        assert_eq!(engine.get_related("core", 2).len(), 2);
    }

    #[test]
    fn test_get_related_unknown_entity_is_empty() {
        let graph = diamond();
        let engine = QueryEngine::new(&graph);
        assert!(engine.get_related("nonexistent_entity_xyz", 10).is_empty());
        assert!(engine.get_related("   ", 10).is_empty());
    }

    #[test]
    fn test_query_containing_a_key_resolves_to_it() {
        let graph = diamond();
        let engine = QueryEngine::new(&graph);

        assert_eq!(engine.resolve("core dump analysis"), Some("core"));
        assert_eq!(engine.resolve("doc"), Some("docs"));

        let keys: Vec<String> = engine
            .get_related("core dump analysis", 10)
            .into_iter()
            .map(|r| r.entity)
            .collect();
        assert_eq!(keys, vec!["edge", "beta", "alpha"]);
    }

    #[test]
    fn test_resolve_substring_is_deterministic() {
        let graph = graph_with(
            &[
                ("telegram-claude-bot", EntityType::Project),
                ("telegram", EntityType::Service),
                ("claude", EntityType::Concept),
            ],
            &[],
        );
        let engine = QueryEngine::new(&graph);

        assert_eq!(engine.resolve("Telegram"), Some("telegram"));
        // "clau" is contained in "claude" and in "telegram-claude-bot"; sorted order wins.
        assert_eq!(engine.resolve("clau"), Some("claude"));
        // Query containing a key resolves to that key.
        assert_eq!(engine.resolve("my telegram setup"), Some("telegram"));
        assert_eq!(engine.resolve("zzz"), None);
    }

    #[test]
    fn test_get_context_second_degree() {
        let graph = diamond();
        let engine = QueryEngine::new(&graph);

        let ContextLookup::Found(ctx) = engine.get_context("alpha") else {
            panic!("expected topic to resolve");
        };
        assert_eq!(ctx.topic, "alpha");
        assert_eq!(ctx.related.len(), 2);

        // beta via core (1.5 * 0.5) and via docs (0.5 * 0.5): the larger wins.
        let beta = ctx.connected.iter().find(|s| s.entity == "beta").unwrap();
        assert_eq!(beta.weight, 0.75);
        assert_eq!(beta.via, "core");

        let edge = ctx.connected.iter().find(|s| s.entity == "edge").unwrap();
        assert_eq!(edge.weight, 2.0);
        assert_eq!(ctx.connected[0].entity, "edge");

        assert!(ctx.connected.iter().all(|s| s.entity != "alpha"));
        assert!(ctx.connected.iter().all(|s| s.entity != "core" && s.entity != "docs"));
    }

    #[test]
    fn test_get_context_not_found_offers_keys() {
        let graph = diamond();
        let engine = QueryEngine::new(&graph);

        match engine.get_context("nothing-like-this") {
            ContextLookup::NotFound(nf) => {
                assert_eq!(nf.query, "nothing-like-this");
                assert_eq!(nf.suggestions, vec!["alpha", "beta", "core", "docs", "edge"]);
            }
            ContextLookup::Found(_) => panic!("expected not found"),
        }
    }

    #[test]
    fn test_suggest_connections_diamond() {
        let graph = diamond();
        let engine = QueryEngine::new(&graph);
        let suggestions = engine.suggest_connections(2);

        // (alpha, beta) share core and docs; (core, docs) share alpha and beta.
        // Ties keep key order.
        assert_eq!(suggestions.len(), 2);
        let s = &suggestions[0];
        assert_eq!((s.entity1.as_str(), s.entity2.as_str()), ("alpha", "beta"));
        assert_eq!(s.common_connections, vec!["core", "docs"]);
        assert_eq!(s.strength, 2);
        assert_eq!(s.type1, EntityType::Keyword);

        let s = &suggestions[1];
        assert_eq!((s.entity1.as_str(), s.entity2.as_str()), ("core", "docs"));
        assert_eq!(s.common_connections, vec!["alpha", "beta"]);
    }

    #[test]
    fn test_suggestions_exclude_linked_pairs() {
        let graph = diamond();
        let engine = QueryEngine::new(&graph);

        for s in engine.suggest_connections(1) {
            assert!(!graph.edges.contains_edge(&s.entity1, &s.entity2));
        }
    }

    #[test]
    fn test_suggestions_ranked_and_capped() {
        let leaves: Vec<String> = (0..10).map(|i| format!("leaf{i}")).collect();
        let mut nodes = vec![("hub1", EntityType::Tag), ("hub2", EntityType::Tag)];
        for leaf in &leaves {
            nodes.push((leaf.as_str(), EntityType::Keyword));
        }
        let edges: Vec<(&str, &str, f64)> = leaves
            .iter()
            .flat_map(|l| [("hub1", l.as_str(), 1.0), ("hub2", l.as_str(), 1.0)])
            .collect();
        let graph = graph_with(&nodes, &edges);
        let engine = QueryEngine::new(&graph);

        let suggestions = engine.suggest_connections(1);
        assert_eq!(suggestions.len(), 20);
        assert_eq!(suggestions[0].strength, 10);
        assert_eq!(suggestions[0].entity1, "hub1");
        assert!(suggestions.windows(2).all(|w| w[0].strength >= w[1].strength));
    }

    #[test]
    fn test_empty_graph_degrades_to_empty_results() {
        let graph = KnowledgeGraph::new();
        let engine = QueryEngine::new(&graph);

        assert!(engine.get_related("anything", 10).is_empty());
        assert!(engine.suggest_connections(2).is_empty());
        assert!(matches!(engine.get_context("x"), ContextLookup::NotFound(_)));

        let stats = engine.get_stats();
        assert_eq!(stats.total_nodes, 0);
        assert_eq!(stats.total_edges, 0);
        assert!(stats.nodes_by_type.is_empty());
    }

    #[test]
    fn test_stats_and_grouping() {
        let graph = diamond();
        let engine = QueryEngine::new(&graph);

        let stats = engine.get_stats();
        assert_eq!(stats.total_nodes, 5);
        assert_eq!(stats.total_edges, 5);
        assert_eq!(stats.nodes_by_type[&EntityType::Keyword], 2);

        let groups = engine.entities_by_type();
        assert_eq!(groups[&EntityType::Keyword], vec!["alpha", "beta"]);
        assert_eq!(groups[&EntityType::Tag], vec!["edge"]);
    }
}
