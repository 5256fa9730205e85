//! End-to-end tests: source files on disk → build → snapshot → queries.

use std::fs;
use std::path::Path;

use recall_core::EntityType;
use recall_graph::{
    ContextLookup, GraphBuilder, GraphStore, QueryEngine, SourceDocuments, StoreError,
};

const MAX_BYTES: u64 = 1024 * 1024;

fn write_sources(dir: &Path) {
    fs::write(
        dir.join("context.json"),
        serde_json::json!({
            "user": {
                "preferences": ["Prefers python for automation scripts"]
            },
            "facts": ["Runs the telegram bot on a mac mini with launchd"]
        })
        .to_string(),
    )
    .unwrap();

    fs::write(
        dir.join("history.json"),
        serde_json::json!({
            "conversations": [
                {
                    "summary": "fixed a bug in the telegram bot",
                    "tags": ["coding", "telegram"],
                    "date": "2024-05-01"
                },
                {
                    "summary": "Added voice-input streaming to the bot",
                    "tags": ["voice"],
                    "date": "2024-05-03"
                }
            ]
        })
        .to_string(),
    )
    .unwrap();

    fs::write(
        dir.join("projects.json"),
        serde_json::json!({
            "projects": {
                "telegram-claude-bot": {
                    "description": "Telegram bot bridging claude with memory",
                    "notes": ["uses sqlite for reminders"],
                    "status": "active",
                    "path": "/code/telegram-claude-bot"
                }
            }
        })
        .to_string(),
    )
    .unwrap();

    fs::write(
        dir.join("reminders.json"),
        serde_json::json!({
            "reminders": [
                { "text": "Rotate the anthropic api key", "date": "2024-06-01" }
            ]
        })
        .to_string(),
    )
    .unwrap();
}

fn build_from(dir: &Path) -> (recall_core::KnowledgeGraph, recall_graph::BuildSummary) {
    let docs = SourceDocuments::load(dir, MAX_BYTES);
    GraphBuilder::default().build(&docs)
}

#[test]
fn build_save_load_and_query() {
    let dir = tempfile::tempdir().unwrap();
    write_sources(dir.path());

    let (mut graph, summary) = build_from(dir.path());
    assert_eq!(summary.items.conversations, 2);
    assert_eq!(summary.items.projects, 1);
    assert_eq!(summary.items.notes, 1);
    assert_eq!(summary.items.reminders, 1);
    assert_eq!(summary.items.preferences, 1);
    assert_eq!(summary.items.facts, 1);

    let store = GraphStore::new(dir.path().join("graph.json"));
    store.save(&mut graph).unwrap();
    let loaded = store.load().unwrap();
    assert_eq!(loaded, graph);

    let engine = QueryEngine::new(&loaded);
    let related = engine.get_related("Telegram", 5);
    assert!(!related.is_empty());
    assert!(related.len() <= 5);
    assert!(related.windows(2).all(|w| w[0].weight >= w[1].weight));

    assert_eq!(loaded.edges.weight("coding", "telegram"), Some(2.0));
    assert_eq!(
        loaded.sources.sources("telegram"),
        ["context.json", "history.json", "projects.json"]
    );
    assert_eq!(loaded.entity_type("telegram-claude-bot"), Some(EntityType::Project));
    assert_eq!(
        loaded.node("telegram-claude-bot").unwrap().metadata["status"],
        "active"
    );
}

#[test]
fn rebuild_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    write_sources(dir.path());

    let (first, s1) = build_from(dir.path());
    let (second, s2) = build_from(dir.path());

    assert_eq!(s1.content_hash, s2.content_hash);
    assert_eq!(first.edges, second.edges);
    assert_eq!(first.sources, second.sources);
    assert_eq!(
        first.nodes.keys().collect::<Vec<_>>(),
        second.nodes.keys().collect::<Vec<_>>()
    );
}

#[test]
fn graph_invariants_hold_after_build() {
    let dir = tempfile::tempdir().unwrap();
    write_sources(dir.path());
    let (graph, _) = build_from(dir.path());

    for (from, to, weight) in graph.edges.entries() {
        assert_ne!(from, to, "self-loop on {from}");
        assert!(weight > 0.0);
        assert_eq!(graph.edges.weight(to, from), Some(weight));
        assert!(graph.node(from).is_some());
        assert!(graph.node(to).is_some());
    }

    let engine = QueryEngine::new(&graph);
    for s in engine.suggest_connections(2) {
        assert!(!graph.edges.contains_edge(&s.entity1, &s.entity2));
        assert!(s.strength >= 2);
    }
}

#[test]
fn extra_item_never_decreases_weight() {
    let dir = tempfile::tempdir().unwrap();
    write_sources(dir.path());
    let (before, _) = build_from(dir.path());

    fs::write(
        dir.path().join("reminders.json"),
        serde_json::json!({
            "reminders": [
                { "text": "Rotate the anthropic api key", "date": "2024-06-01" },
                { "text": "telegram bot uptime check", "date": "2024-06-02" }
            ]
        })
        .to_string(),
    )
    .unwrap();
    let (after, _) = build_from(dir.path());

    for (from, to, weight) in before.edges.entries() {
        assert!(after.edges.weight(from, to).unwrap() >= weight);
    }
    assert!(after.edges.weight("telegram", "bot") > before.edges.weight("telegram", "bot"));
}

#[test]
fn context_reports_second_degree_connections() {
    let dir = tempfile::tempdir().unwrap();
    write_sources(dir.path());
    let (graph, _) = build_from(dir.path());
    let engine = QueryEngine::new(&graph);

    let ContextLookup::Found(ctx) = engine.get_context("coding") else {
        panic!("coding should resolve");
    };
    assert_eq!(ctx.topic, "coding");
    assert_eq!(ctx.node.entity_type, EntityType::Tag);
    assert_eq!(ctx.node.metadata["date"], "2024-05-01");
    assert_eq!(ctx.sources, vec!["history.json"]);
    assert!(ctx.related.len() <= 15);
    assert!(ctx.connected.len() <= 10);

    let direct: Vec<&str> = ctx.related.iter().map(|r| r.entity.as_str()).collect();
    for s in &ctx.connected {
        assert_ne!(s.entity, "coding");
        assert!(!direct.contains(&s.entity.as_str()));
    }
    // "voice" only co-occurs with the bot, never with the coding tag.
    assert!(ctx.connected.iter().any(|s| s.entity == "voice"));
}

#[test]
fn unresolvable_lookups_degrade_gracefully() {
    let dir = tempfile::tempdir().unwrap();
    write_sources(dir.path());
    let (graph, _) = build_from(dir.path());
    let engine = QueryEngine::new(&graph);

    assert!(engine.get_related("nonexistent_entity_xyz", 10).is_empty());
    match engine.get_context("nonexistent_entity_xyz") {
        ContextLookup::NotFound(nf) => assert!(!nf.suggestions.is_empty()),
        ContextLookup::Found(_) => panic!("should not resolve"),
    }
}

#[test]
fn missing_sources_build_an_empty_graph() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("history.json"), "{ not json").unwrap();

    let (graph, summary) = build_from(dir.path());
    assert_eq!(graph.node_count(), 0);
    assert_eq!(summary.edges, 0);
}

#[test]
fn corrupt_snapshot_asks_for_rebuild() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.json");
    fs::write(&path, "definitely not json").unwrap();

    let err = GraphStore::new(&path).load().unwrap_err();
    assert!(matches!(err, StoreError::Corrupt { .. }));
    assert!(err.needs_rebuild());
}
