//! CLI entry point for the recall knowledge graph.
//!
//! `build` rebuilds the snapshot from the memory directory; every other
//! command reads the snapshot. Reports go to stdout (text, or JSON with
//! `--json`); logs go to stderr.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

use recall_core::{KnowledgeGraph, RecallConfig};
use recall_extract::EntityExtractor;
use recall_graph::{report, ContextLookup, GraphBuilder, GraphStore, QueryEngine, SourceDocuments};

#[derive(Parser)]
#[command(name = "recall")]
#[command(about = "Co-occurrence knowledge graph over shared memory files")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file prefix (default: recall).
    #[arg(short, long, default_value = "recall", global = true)]
    config: String,

    /// Override the memory directory holding the source documents and snapshot.
    #[arg(long, global = true)]
    memory_dir: Option<PathBuf>,

    /// Print structured JSON instead of a text report.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Rebuild the graph from the source documents and save the snapshot.
    Build,
    /// Show entities related to an entity.
    Query {
        #[arg(required = true, num_args = 1..)]
        entity: Vec<String>,
        /// Maximum number of related entities.
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show everything known about a topic, including second-degree links.
    Context {
        #[arg(required = true, num_args = 1..)]
        topic: Vec<String>,
    },
    /// Suggest unlinked entities that share neighbors.
    Suggest {
        /// Minimum number of shared neighbors.
        #[arg(long)]
        min_common: Option<usize>,
    },
    /// Show node and edge counts.
    Stats,
    /// List all entities grouped by type.
    List,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(io::stderr).init();

    let cli = Cli::parse();
    let mut config = RecallConfig::load(&cli.config)?;
    if let Some(dir) = &cli.memory_dir {
        config.memory_dir = dir.clone();
    }
    let store = GraphStore::new(config.graph_path());
    let mut out = io::stdout().lock();

    match cli.command {
        Command::Build => {
            let docs = SourceDocuments::load(&config.memory_dir, config.max_source_bytes);
            tracing::info!(
                memory_dir = %config.memory_dir.display(),
                documents = docs.loaded_count(),
                "Loaded source documents"
            );

            let builder = GraphBuilder::new(
                EntityExtractor::new(config.max_fragment_chars),
                config.weights.clone(),
            );
            let (mut graph, summary) = builder.build(&docs);
            let previous_hash = store.load().ok().map(|g| g.content_hash());
            store.save(&mut graph)?;

            if cli.json {
                write_json(&mut out, &summary)?;
            } else {
                report::write_build(&mut out, &summary, store.path(), previous_hash.as_deref())?;
            }
        }
        Command::Query { entity, limit } => {
            let graph = load_snapshot(&store)?;
            let engine = QueryEngine::new(&graph).with_config(config.query.clone());
            let entity = entity.join(" ");
            let related = engine.get_related(&entity, limit.unwrap_or(config.query.related_limit));

            if cli.json {
                let payload = serde_json::json!({
                    "query": entity,
                    "resolved": engine.resolve(&entity),
                    "related": related,
                });
                write_json(&mut out, &payload)?;
            } else if related.is_empty() {
                report::write_not_found(&mut out, &engine.not_found(&entity))?;
            } else {
                report::write_related(&mut out, &entity, &related)?;
            }
        }
        Command::Context { topic } => {
            let graph = load_snapshot(&store)?;
            let engine = QueryEngine::new(&graph).with_config(config.query.clone());
            let lookup = engine.get_context(&topic.join(" "));

            if cli.json {
                write_json(&mut out, &lookup)?;
            } else {
                match &lookup {
                    ContextLookup::Found(ctx) => report::write_context(&mut out, ctx)?,
                    ContextLookup::NotFound(nf) => report::write_not_found(&mut out, nf)?,
                }
            }
        }
        Command::Suggest { min_common } => {
            let graph = load_snapshot(&store)?;
            let engine = QueryEngine::new(&graph).with_config(config.query.clone());
            let suggestions =
                engine.suggest_connections(min_common.unwrap_or(config.query.min_common));

            if cli.json {
                write_json(&mut out, &suggestions)?;
            } else {
                report::write_suggestions(&mut out, &suggestions)?;
            }
        }
        Command::Stats => {
            let graph = load_snapshot(&store)?;
            let stats = QueryEngine::new(&graph).get_stats();

            if cli.json {
                write_json(&mut out, &stats)?;
            } else {
                report::write_stats(&mut out, &stats)?;
            }
        }
        Command::List => {
            let graph = load_snapshot(&store)?;
            let groups = QueryEngine::new(&graph).entities_by_type();

            if cli.json {
                write_json(&mut out, &groups)?;
            } else {
                report::write_entity_list(&mut out, &groups)?;
            }
        }
    }

    out.flush()?;
    Ok(())
}

/// Load the snapshot, turning "missing" and "corrupt" into a rebuild hint.
fn load_snapshot(store: &GraphStore) -> anyhow::Result<KnowledgeGraph> {
    match store.load() {
        Ok(graph) => Ok(graph),
        Err(e) if e.needs_rebuild() => {
            tracing::warn!(error = %e, "No usable snapshot");
            anyhow::bail!("Graph not found. Run `recall build` first.")
        }
        Err(e) => Err(e.into()),
    }
}

fn write_json(out: &mut impl Write, value: &impl Serialize) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
