//! Graph construction from the four source documents.
//!
//! Every record becomes an item: a text fragment, optional labels attached
//! to it by the source (conversation tags, project name and status), and
//! two weight increments. All entities of one item are linked pairwise; a
//! pair touching a label gets the label weight, a pair of text entities the
//! text weight. Increments add up across items and are never capped.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use recall_core::types::normalize_key;
use recall_core::{EntityType, KnowledgeGraph, Metadata, WeightConfig};
use recall_extract::EntityExtractor;

use crate::sources::{
    ContextDocument, HistoryDocument, ProjectsDocument, RemindersDocument, SourceDocuments,
    CONTEXT_FILE, HISTORY_FILE, PROJECTS_FILE, REMINDERS_FILE,
};
use crate::types::{BuildSummary, ItemCounts};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Text,
    Label,
}

struct Member {
    key: String,
    entity_type: EntityType,
    origin: Origin,
}

/// One logical record from a source document.
struct Item<'a> {
    source: &'static str,
    text: &'a str,
    labels: Vec<(&'a str, EntityType)>,
    metadata: Option<Metadata>,
    text_weight: f64,
    label_weight: f64,
    /// A label that also occurs in the text keeps the label weight for its pairs.
    labels_win: bool,
}

impl<'a> Item<'a> {
    fn text(source: &'static str, text: &'a str, weight: f64) -> Self {
        Self {
            source,
            text,
            labels: Vec::new(),
            metadata: None,
            text_weight: weight,
            label_weight: weight,
            labels_win: false,
        }
    }
}

/// Builds a fresh [`KnowledgeGraph`] from source documents.
pub struct GraphBuilder {
    extractor: EntityExtractor,
    weights: WeightConfig,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new(EntityExtractor::default(), WeightConfig::default())
    }
}

impl GraphBuilder {
    pub fn new(extractor: EntityExtractor, weights: WeightConfig) -> Self {
        Self { extractor, weights }
    }

    /// Build a new graph, stamping every node with the current time.
    pub fn build(&self, docs: &SourceDocuments) -> (KnowledgeGraph, BuildSummary) {
        self.build_at(docs, Utc::now())
    }

    /// Build a new graph; all nodes created in this build get `first_seen = now`.
    pub fn build_at(
        &self,
        docs: &SourceDocuments,
        now: DateTime<Utc>,
    ) -> (KnowledgeGraph, BuildSummary) {
        let mut graph = KnowledgeGraph::new();
        let mut items = ItemCounts::default();

        if let Some(context) = &docs.context {
            self.ingest_context(&mut graph, context, now, &mut items);
        }
        if let Some(history) = &docs.history {
            self.ingest_history(&mut graph, history, now, &mut items);
        }
        if let Some(projects) = &docs.projects {
            self.ingest_projects(&mut graph, projects, now, &mut items);
        }
        if let Some(reminders) = &docs.reminders {
            self.ingest_reminders(&mut graph, reminders, now, &mut items);
        }

        let summary = BuildSummary {
            nodes: graph.node_count(),
            edges: graph.edge_count(),
            items,
            content_hash: graph.content_hash(),
        };

        tracing::info!(
            nodes = summary.nodes,
            edges = summary.edges,
            items = summary.items.total(),
            "Graph built"
        );

        (graph, summary)
    }

    fn ingest_context(
        &self,
        graph: &mut KnowledgeGraph,
        context: &ContextDocument,
        now: DateTime<Utc>,
        items: &mut ItemCounts,
    ) {
        for pref in &context.user.preferences {
            self.ingest(graph, Item::text(CONTEXT_FILE, pref, self.weights.preference), now);
            items.preferences += 1;
        }
        for fact in &context.facts {
            self.ingest(graph, Item::text(CONTEXT_FILE, fact, self.weights.fact), now);
            items.facts += 1;
        }
    }

    fn ingest_history(
        &self,
        graph: &mut KnowledgeGraph,
        history: &HistoryDocument,
        now: DateTime<Utc>,
        items: &mut ItemCounts,
    ) {
        for conv in &history.conversations {
            let item = Item {
                source: HISTORY_FILE,
                text: conv.summary.as_deref().unwrap_or_default(),
                labels: conv.tags.iter().map(|t| (t.as_str(), EntityType::Tag)).collect(),
                metadata: single_entry("date", conv.date.as_deref()),
                text_weight: self.weights.conversation,
                label_weight: self.weights.conversation_tag,
                labels_win: false,
            };
            self.ingest(graph, item, now);
            items.conversations += 1;
        }
    }

    fn ingest_projects(
        &self,
        graph: &mut KnowledgeGraph,
        projects: &ProjectsDocument,
        now: DateTime<Utc>,
        items: &mut ItemCounts,
    ) {
        for (name, record) in &projects.projects {
            let Some(key) = normalize_key(name) else {
                tracing::warn!("Skipping project with an empty name");
                continue;
            };

            let mut meta = Metadata::new();
            if let Some(path) = &record.path {
                meta.insert("path".to_string(), serde_json::json!(path));
            }
            if let Some(status) = &record.status {
                meta.insert("status".to_string(), serde_json::json!(status));
            }
            graph.add_node(&key, EntityType::Project, Some(&meta), now);
            graph.sources.record(&key, PROJECTS_FILE);

            let mut labels = vec![(name.as_str(), EntityType::Project)];
            if let Some(status) = &record.status {
                labels.push((status.as_str(), EntityType::Tag));
            }
            self.ingest(
                graph,
                Item {
                    source: PROJECTS_FILE,
                    text: record.description.as_deref().unwrap_or_default(),
                    labels,
                    metadata: None,
                    text_weight: self.weights.project_text,
                    label_weight: self.weights.project_description,
                    labels_win: true,
                },
                now,
            );
            items.projects += 1;

            for note in &record.notes {
                self.ingest(
                    graph,
                    Item {
                        source: PROJECTS_FILE,
                        text: note,
                        labels: vec![(name.as_str(), EntityType::Project)],
                        metadata: None,
                        text_weight: self.weights.project_text,
                        label_weight: self.weights.project_note,
                        labels_win: true,
                    },
                    now,
                );
                items.notes += 1;
            }
        }
    }

    fn ingest_reminders(
        &self,
        graph: &mut KnowledgeGraph,
        reminders: &RemindersDocument,
        now: DateTime<Utc>,
        items: &mut ItemCounts,
    ) {
        for reminder in &reminders.reminders {
            let mut item = Item::text(
                REMINDERS_FILE,
                reminder.text.as_deref().unwrap_or_default(),
                self.weights.reminder,
            );
            item.metadata = single_entry("reminder_date", reminder.date.as_deref());
            self.ingest(graph, item, now);
            items.reminders += 1;
        }
    }

    /// Register the item's entities as nodes and link every pair once.
    ///
    /// Repeats within one item collapse to their first occurrence, so text
    /// entities come before labels. With `labels_win`, a label that repeats
    /// a text entity keeps the text entity's type but takes label origin.
    fn ingest(&self, graph: &mut KnowledgeGraph, item: Item<'_>, now: DateTime<Utc>) {
        let mut seen = HashSet::new();
        let mut members: Vec<Member> = self
            .extractor
            .extract(item.text, item.source, &mut graph.sources)
            .into_iter()
            .filter(|e| seen.insert(e.entity.clone()))
            .map(|e| Member {
                key: e.entity,
                entity_type: e.entity_type,
                origin: Origin::Text,
            })
            .collect();

        for (raw, entity_type) in &item.labels {
            let Some(key) = normalize_key(raw) else {
                continue;
            };
            graph.sources.record(&key, item.source);
            if seen.insert(key.clone()) {
                members.push(Member {
                    key,
                    entity_type: *entity_type,
                    origin: Origin::Label,
                });
            } else if item.labels_win {
                if let Some(existing) = members.iter_mut().find(|m| m.key == key) {
                    existing.origin = Origin::Label;
                }
            }
        }

        for m in &members {
            graph.add_node(&m.key, m.entity_type, item.metadata.as_ref(), now);
        }

        for (i, a) in members.iter().enumerate() {
            for b in &members[i + 1..] {
                let weight = if a.origin == Origin::Label || b.origin == Origin::Label {
                    item.label_weight
                } else {
                    item.text_weight
                };
                graph.add_edge(&a.key, &b.key, weight);
            }
        }
    }
}

fn single_entry(key: &str, value: Option<&str>) -> Option<Metadata> {
    let value = value.filter(|v| !v.is_empty())?;
    let mut meta = Metadata::new();
    meta.insert(key.to_string(), serde_json::json!(value));
    Some(meta)
}
