//! Source documents consumed by the graph builder.
//!
//! Four optional JSON files live in the memory directory. Each one that is
//! missing, oversized, or unparsable contributes nothing and is logged; a
//! bad source never aborts a build.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;

pub const CONTEXT_FILE: &str = "context.json";
pub const HISTORY_FILE: &str = "history.json";
pub const PROJECTS_FILE: &str = "projects.json";
pub const REMINDERS_FILE: &str = "reminders.json";

/// Why a source document could not be read. Only ever logged.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("not found")]
    NotFound,

    #[error("{size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

// ── Document shapes ───────────────────────────────────────────────

/// `context.json`: user preferences and free-standing facts.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContextDocument {
    #[serde(default)]
    pub user: UserProfile,
    #[serde(default)]
    pub facts: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub preferences: Vec<String>,
}

/// `history.json`: conversation summaries in chronological order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryDocument {
    #[serde(default)]
    pub conversations: Vec<Conversation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Conversation {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub date: Option<String>,
}

/// `projects.json`: project name → project record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectsDocument {
    #[serde(default)]
    pub projects: BTreeMap<String, ProjectRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectRecord {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub notes: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

/// `reminders.json`: pending reminders.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemindersDocument {
    #[serde(default)]
    pub reminders: Vec<Reminder>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Reminder {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

// ── Loading ───────────────────────────────────────────────────────

/// The four inputs to a build. `None` means "no items from this source".
#[derive(Debug, Clone, Default)]
pub struct SourceDocuments {
    pub context: Option<ContextDocument>,
    pub history: Option<HistoryDocument>,
    pub projects: Option<ProjectsDocument>,
    pub reminders: Option<RemindersDocument>,
}

impl SourceDocuments {
    /// Read every source document from `dir`, degrading failures to `None`.
    pub fn load(dir: &Path, max_bytes: u64) -> Self {
        Self {
            context: load_optional(dir, CONTEXT_FILE, max_bytes),
            history: load_optional(dir, HISTORY_FILE, max_bytes),
            projects: load_optional(dir, PROJECTS_FILE, max_bytes),
            reminders: load_optional(dir, REMINDERS_FILE, max_bytes),
        }
    }

    /// Number of documents that loaded successfully.
    pub fn loaded_count(&self) -> usize {
        [
            self.context.is_some(),
            self.history.is_some(),
            self.projects.is_some(),
            self.reminders.is_some(),
        ]
        .into_iter()
        .filter(|loaded| *loaded)
        .count()
    }
}

fn load_optional<T: DeserializeOwned>(dir: &Path, file: &str, max_bytes: u64) -> Option<T> {
    let path = dir.join(file);
    match read_document(&path, max_bytes) {
        Ok(doc) => {
            tracing::debug!(path = %path.display(), "Loaded source document");
            Some(doc)
        }
        Err(SourceError::NotFound) => {
            tracing::debug!(path = %path.display(), "Source document not found, skipping");
            None
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Could not read source document, skipping");
            None
        }
    }
}

/// Read and parse one JSON document, refusing files over `max_bytes`.
pub fn read_document<T: DeserializeOwned>(path: &Path, max_bytes: u64) -> Result<T, SourceError> {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(SourceError::NotFound),
        Err(e) => return Err(e.into()),
    };
    if meta.len() > max_bytes {
        return Err(SourceError::TooLarge {
            size: meta.len(),
            limit: max_bytes,
        });
    }

    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}
