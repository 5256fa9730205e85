//! recall-extract: Entity and keyword extraction for the recall knowledge graph.
//!
//! Extraction is purely pattern-based: one regex per entity type for known
//! projects, tools, concepts, dates, people, features, and services, plus a
//! stop-word-filtered tokenizer for generic keywords. Every extracted entity
//! is recorded in the caller's [`SourceIndex`] under the given source label.

pub mod patterns;

use std::collections::HashSet;

use recall_core::{EntityType, SourceIndex};

use crate::patterns::{is_stop_word, KEYWORD_PATTERN, TYPED_PATTERNS};

/// Default cap on fragment length, in chars.
pub const DEFAULT_MAX_FRAGMENT_CHARS: usize = 20_000;

/// A lower-cased entity and the type it was extracted as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub entity: String,
    pub entity_type: EntityType,
}

impl Extracted {
    pub fn new(entity: impl Into<String>, entity_type: EntityType) -> Self {
        Self {
            entity: entity.into(),
            entity_type,
        }
    }
}

/// Pattern-based extractor.
///
/// Never fails: empty, oversized, or non-ASCII input simply yields fewer
/// (possibly zero) entities.
#[derive(Debug, Clone)]
pub struct EntityExtractor {
    max_fragment_chars: usize,
}

impl Default for EntityExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAGMENT_CHARS)
    }
}

impl EntityExtractor {
    pub fn new(max_fragment_chars: usize) -> Self {
        Self { max_fragment_chars }
    }

    /// Typed entities followed by keywords, as consumed by the graph builder.
    pub fn extract(&self, text: &str, source: &str, index: &mut SourceIndex) -> Vec<Extracted> {
        let mut all = self.extract_entities(text, source, index);
        all.extend(self.extract_keywords(text, source, index));
        all
    }

    /// Match the fragment against every typed pattern.
    ///
    /// Matches are lower-cased and deduplicated within this call; the first
    /// pattern to produce an entity decides its type.
    pub fn extract_entities(
        &self,
        text: &str,
        source: &str,
        index: &mut SourceIndex,
    ) -> Vec<Extracted> {
        let text = self.bounded(text).to_lowercase();
        let mut seen = HashSet::new();
        let mut entities = Vec::new();

        for (entity_type, pattern) in TYPED_PATTERNS.iter() {
            for m in pattern.find_iter(&text) {
                let entity = m.as_str().trim();
                if entity.is_empty() || !seen.insert(entity.to_string()) {
                    continue;
                }
                index.record(entity, source);
                entities.push(Extracted::new(entity, *entity_type));
            }
        }

        entities
    }

    /// Tokenize the fragment into stop-word-filtered keywords.
    pub fn extract_keywords(
        &self,
        text: &str,
        source: &str,
        index: &mut SourceIndex,
    ) -> Vec<Extracted> {
        let text = self.bounded(text).to_lowercase();
        let mut seen = HashSet::new();
        let mut keywords = Vec::new();

        for m in KEYWORD_PATTERN.find_iter(&text) {
            let word = m.as_str();
            if word.chars().count() <= 2 || is_stop_word(word) || !seen.insert(word) {
                continue;
            }
            index.record(word, source);
            keywords.push(Extracted::new(word, EntityType::Keyword));
        }

        keywords
    }

    fn bounded<'t>(&self, text: &'t str) -> &'t str {
        match text.char_indices().nth(self.max_fragment_chars) {
            Some((cut, _)) => {
                tracing::debug!(
                    chars = self.max_fragment_chars,
                    bytes = text.len(),
                    "Truncating oversized text fragment"
                );
                &text[..cut]
            }
            None => text,
        }
    }
}
