//! Human-readable CLI reports.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::Path;

use recall_core::EntityType;

use crate::types::{BuildSummary, GraphStats, NotFound, RelatedEntity, Suggestion, TopicContext};

/// Suggestions printed in the text report; `--json` returns all of them.
const SUGGESTIONS_SHOWN: usize = 10;
/// Shared neighbors listed per suggestion.
const COMMON_SHOWN: usize = 5;
/// Second-degree connections listed by `context`.
const CONNECTED_SHOWN: usize = 5;

fn type_label(entity_type: Option<EntityType>) -> &'static str {
    entity_type.map_or("unknown", |t| t.as_str())
}

pub fn write_build(
    out: &mut impl Write,
    summary: &BuildSummary,
    snapshot: &Path,
    previous_hash: Option<&str>,
) -> io::Result<()> {
    writeln!(out, "Graph built successfully!")?;
    writeln!(out, "  Nodes: {}", summary.nodes)?;
    writeln!(out, "  Edges: {}", summary.edges)?;
    writeln!(
        out,
        "  Items: {} conversations, {} projects ({} notes), {} reminders, {} preferences, {} facts",
        summary.items.conversations,
        summary.items.projects,
        summary.items.notes,
        summary.items.reminders,
        summary.items.preferences,
        summary.items.facts,
    )?;
    writeln!(out, "  Saved to: {}", snapshot.display())?;
    let note = match previous_hash {
        Some(prev) if prev == summary.content_hash => " (unchanged)",
        Some(_) => " (changed)",
        None => "",
    };
    writeln!(out, "  Content hash: {}{note}", summary.content_hash)
}

pub fn write_related(out: &mut impl Write, entity: &str, related: &[RelatedEntity]) -> io::Result<()> {
    writeln!(out, "\nEntities related to '{entity}':")?;
    writeln!(out, "{}", "-".repeat(50))?;
    for r in related {
        writeln!(
            out,
            "  {:<25} (weight: {:.1}, type: {})",
            r.entity,
            r.weight,
            type_label(r.entity_type)
        )?;
    }
    Ok(())
}

pub fn write_not_found(out: &mut impl Write, not_found: &NotFound) -> io::Result<()> {
    writeln!(out, "No entities found related to '{}'", not_found.query)?;
    if !not_found.suggestions.is_empty() {
        writeln!(out, "Try one of these entities: {}", not_found.suggestions.join(", "))?;
    }
    Ok(())
}

pub fn write_context(out: &mut impl Write, ctx: &TopicContext) -> io::Result<()> {
    writeln!(out, "\n=== Context for '{}' ===\n", ctx.topic)?;
    writeln!(out, "Type: {}", ctx.node.entity_type)?;
    writeln!(out, "First seen: {}", ctx.node.first_seen.to_rfc3339())?;
    if !ctx.node.metadata.is_empty() {
        let meta = serde_json::to_string_pretty(&ctx.node.metadata).map_err(io::Error::other)?;
        writeln!(out, "Metadata: {meta}")?;
    }

    if !ctx.sources.is_empty() {
        writeln!(out, "\nFound in: {}", ctx.sources.join(", "))?;
    }

    if !ctx.related.is_empty() {
        writeln!(out, "\nDirectly related ({} items):", ctx.related.len())?;
        for r in &ctx.related {
            writeln!(
                out,
                "  - {} ({}, weight: {:.1})",
                r.entity,
                type_label(r.entity_type),
                r.weight
            )?;
        }
    }

    if !ctx.connected.is_empty() {
        writeln!(out, "\nSecond-degree connections ({} items):", ctx.connected.len())?;
        for s in ctx.connected.iter().take(CONNECTED_SHOWN) {
            writeln!(
                out,
                "  - {} (inferred weight: {:.1}, via {})",
                s.entity, s.weight, s.via
            )?;
        }
    }
    Ok(())
}

pub fn write_suggestions(out: &mut impl Write, suggestions: &[Suggestion]) -> io::Result<()> {
    if suggestions.is_empty() {
        return writeln!(out, "No connection suggestions found.");
    }

    writeln!(out, "\n=== Suggested Connections ===")?;
    writeln!(out, "These items share common connections but aren't directly linked:\n")?;
    for (i, s) in suggestions.iter().take(SUGGESTIONS_SHOWN).enumerate() {
        let common: Vec<&str> = s
            .common_connections
            .iter()
            .take(COMMON_SHOWN)
            .map(String::as_str)
            .collect();
        writeln!(out, "{}. {} <-> {}", i + 1, s.entity1, s.entity2)?;
        writeln!(out, "   Types: {} / {}", s.type1, s.type2)?;
        writeln!(out, "   Common connections: {}\n", common.join(", "))?;
    }
    Ok(())
}

pub fn write_stats(out: &mut impl Write, stats: &GraphStats) -> io::Result<()> {
    writeln!(out, "\n=== Knowledge Graph Statistics ===\n")?;
    writeln!(out, "Total nodes: {}", stats.total_nodes)?;
    writeln!(out, "Total edges: {}", stats.total_edges)?;
    match stats.updated {
        Some(updated) => writeln!(out, "Last updated: {}", updated.to_rfc3339())?,
        None => writeln!(out, "Last updated: never")?,
    }
    writeln!(out, "Content hash: {}", stats.content_hash)?;

    let mut by_count: Vec<(&EntityType, &usize)> = stats.nodes_by_type.iter().collect();
    by_count.sort_by(|a, b| b.1.cmp(a.1));
    writeln!(out, "\nNodes by type:")?;
    for (entity_type, count) in by_count {
        writeln!(out, "  {entity_type}: {count}")?;
    }
    Ok(())
}

pub fn write_entity_list(
    out: &mut impl Write,
    groups: &BTreeMap<EntityType, Vec<String>>,
) -> io::Result<()> {
    writeln!(out, "\n=== All Entities ===")?;
    for (entity_type, entities) in groups {
        writeln!(out, "\n{}:", entity_type.as_str().to_uppercase())?;
        for entity in entities {
            writeln!(out, "  - {entity}")?;
        }
    }
    Ok(())
}
