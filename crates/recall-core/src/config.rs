//! Configuration for building and querying the recall graph.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (`RECALL__` prefix, `__` separator)
//! 2. Config file (`recall.toml`)
//! 3. Defaults

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::RecallError;

/// Top-level recall configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RecallConfig {
    /// Directory holding the four source documents and the snapshot.
    #[serde(default = "default_memory_dir")]
    pub memory_dir: PathBuf,

    /// Snapshot file name, resolved relative to `memory_dir`.
    #[serde(default = "default_graph_file")]
    pub graph_file: String,

    /// Source documents larger than this are skipped.
    #[serde(default = "default_max_source_bytes")]
    pub max_source_bytes: u64,

    /// Text fragments are truncated to this many chars before extraction.
    #[serde(default = "default_max_fragment_chars")]
    pub max_fragment_chars: usize,

    #[serde(default)]
    pub weights: WeightConfig,

    #[serde(default)]
    pub query: QueryConfig,
}

/// Per-item weight increments used when linking co-occurring entities.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct WeightConfig {
    /// Pairs within one preference statement.
    pub preference: f64,
    /// Pairs within one fact.
    pub fact: f64,
    /// Pairs of text entities within one conversation summary.
    pub conversation: f64,
    /// Any pair touching a conversation tag.
    pub conversation_tag: f64,
    /// Pairs of text entities within a project description or note.
    pub project_text: f64,
    /// Project name or status linked to its description entities.
    pub project_description: f64,
    /// Project name linked to the entities of one of its notes.
    pub project_note: f64,
    /// Pairs within one reminder.
    pub reminder: f64,
}

impl WeightConfig {
    /// Reject negative or non-finite increments; edge weights only ever grow.
    pub fn validate(&self) -> Result<(), RecallError> {
        let named = [
            ("preference", self.preference),
            ("fact", self.fact),
            ("conversation", self.conversation),
            ("conversation_tag", self.conversation_tag),
            ("project_text", self.project_text),
            ("project_description", self.project_description),
            ("project_note", self.project_note),
            ("reminder", self.reminder),
        ];
        for (name, value) in named {
            if !value.is_finite() || value < 0.0 {
                return Err(RecallError::Config(format!(
                    "weights.{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            preference: 0.5,
            fact: 1.0,
            conversation: 1.5,
            conversation_tag: 2.0,
            project_text: 1.0,
            project_description: 2.0,
            project_note: 1.5,
            reminder: 1.0,
        }
    }
}

/// Result limits and discounts for the query engine.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct QueryConfig {
    /// Default number of neighbors returned by `query`.
    pub related_limit: usize,
    /// Direct neighbors reported by `context`.
    pub context_related_limit: usize,
    /// How many top direct neighbors are expanded for second-degree links.
    pub context_expand: usize,
    /// Second-degree connections reported by `context`.
    pub second_degree_limit: usize,
    /// Multiplier applied to the traversed edge weight for inferred links.
    pub second_degree_discount: f64,
    /// Maximum suggestions returned by `suggest`.
    pub suggestion_limit: usize,
    /// Default minimum number of shared neighbors for a suggestion.
    pub min_common: usize,
    /// Node keys offered when a lookup finds nothing.
    pub not_found_suggestions: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            related_limit: 10,
            context_related_limit: 15,
            context_expand: 5,
            second_degree_limit: 10,
            second_degree_discount: 0.5,
            suggestion_limit: 20,
            min_common: 2,
            not_found_suggestions: 15,
        }
    }
}

fn default_memory_dir() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".claude-shared-memory"),
        None => PathBuf::from("."),
    }
}

fn default_graph_file() -> String {
    "graph.json".to_string()
}

fn default_max_source_bytes() -> u64 {
    8 * 1024 * 1024
}

fn default_max_fragment_chars() -> usize {
    20_000
}

impl Default for RecallConfig {
    fn default() -> Self {
        Self {
            memory_dir: default_memory_dir(),
            graph_file: default_graph_file(),
            max_source_bytes: default_max_source_bytes(),
            max_fragment_chars: default_max_fragment_chars(),
            weights: WeightConfig::default(),
            query: QueryConfig::default(),
        }
    }
}

impl RecallConfig {
    /// Load from `<file_prefix>.toml` (optional) and `RECALL__*` variables.
    ///
    /// Absent keys take their defaults; a key that is present but malformed,
    /// or a negative weight, is an error. `RECALL__QUERY__MIN_COMMON=3` sets `query.min_common`.
    pub fn load(file_prefix: &str) -> Result<Self, RecallError> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("RECALL")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: RecallConfig = cfg.try_deserialize()?;
        config.weights.validate()?;

        tracing::debug!(
            file_prefix,
            memory_dir = %config.memory_dir.display(),
            graph_file = %config.graph_file,
            "Loaded configuration"
        );

        Ok(config)
    }

    /// Full path of the snapshot file.
    pub fn graph_path(&self) -> PathBuf {
        self.memory_dir.join(&self.graph_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RecallConfig::default();
        assert_eq!(config.graph_file, "graph.json");
        assert_eq!(config.max_source_bytes, 8 * 1024 * 1024);
        assert_eq!(config.weights.conversation_tag, 2.0);
        assert_eq!(config.weights.conversation, 1.5);
        assert_eq!(config.query.second_degree_discount, 0.5);
        assert_eq!(config.query.suggestion_limit, 20);
    }

    #[test]
    fn test_graph_path_joins_memory_dir() {
        let config = RecallConfig {
            memory_dir: PathBuf::from("/tmp/memory"),
            ..Default::default()
        };
        assert_eq!(config.graph_path(), PathBuf::from("/tmp/memory/graph.json"));
    }

    #[test]
    fn test_partial_weights_fill_defaults() {
        let weights: WeightConfig = serde_json::from_str(r#"{"fact": 3.0}"#).unwrap();
        assert_eq!(weights.fact, 3.0);
        assert_eq!(weights.reminder, 1.0);
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = RecallConfig::load("definitely-not-a-recall-config-file").unwrap();
        assert_eq!(config.graph_file, "graph.json");
        assert_eq!(config.query.min_common, 2);
    }

    #[test]
    fn test_file_overrides_nested_tables() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("recall");
        std::fs::write(
            dir.path().join("recall.toml"),
            "graph_file = \"custom.json\"\n\n[query]\nmin_common = 3\n",
        )
        .unwrap();

        let config = RecallConfig::load(prefix.to_str().unwrap()).unwrap();
        assert_eq!(config.graph_file, "custom.json");
        assert_eq!(config.query.min_common, 3);
        assert_eq!(config.query.related_limit, 10);
    }

    #[test]
    fn test_negative_weight_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("recall.toml"), "[weights]\nfact = -1.0\n").unwrap();

        let prefix = dir.path().join("recall");
        let err = RecallConfig::load(prefix.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, RecallError::Config(ref msg) if msg.contains("weights.fact")));
    }

    #[test]
    fn test_zero_weight_is_allowed() {
        let weights = WeightConfig {
            preference: 0.0,
            ..Default::default()
        };
        assert!(weights.validate().is_ok());
        assert!(WeightConfig {
            reminder: f64::NAN,
            ..Default::default()
        }
        .validate()
        .is_err());
    }
}
