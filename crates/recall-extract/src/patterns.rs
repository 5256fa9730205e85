//! Static pattern tables: one regex per entity type, the keyword tokenizer,
//! and the stop-word list.

use std::collections::HashSet;
use std::sync::LazyLock;

use recall_core::EntityType;
use regex::Regex;

// ============================================================================
// Typed Entity Patterns
// ============================================================================

/// Applied in this order; an entity matched by an earlier type keeps that type.
const TYPED_SOURCES: [(EntityType, &str); 7] = [
    (
        EntityType::Project,
        r"(?i)\b(?:telegram-claude-bot|claude-chat|second-brain-data|moltbook)\b",
    ),
    (
        EntityType::Tool,
        r"(?i)\b(?:python|electron|typescript|sqlite|launchd|npm|git|docker|api)\b",
    ),
    (
        EntityType::Concept,
        r"(?i)\b(?:memory|security|automation|voice|streaming|encryption|bot|chat|ai|claude|agent|monitor|orchestrator)\b",
    ),
    (EntityType::Date, r"\b\d{4}-\d{2}-\d{2}\b"),
    (EntityType::Person, r"(?i)\b(?:user|longshot77|shredbot)\b"),
    (
        EntityType::Feature,
        r"(?i)\b(?:text-to-speech|voice-input|voice-output|reminder|surprise|speech)\b",
    ),
    (EntityType::Service, r"(?i)\b(?:telegram|anthropic|moltbook)\b"),
];

pub(crate) static TYPED_PATTERNS: LazyLock<Vec<(EntityType, Regex)>> = LazyLock::new(|| {
    TYPED_SOURCES
        .iter()
        .map(|(entity_type, pattern)| (*entity_type, Regex::new(pattern).expect("Invalid regex")))
        .collect()
});

// ============================================================================
// Keywords
// ============================================================================

/// A letter followed by at least two word characters or hyphens.
pub(crate) static KEYWORD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-z][a-z0-9_-]{2,}\b").expect("Invalid regex"));

pub(crate) static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "the", "a", "an", "is", "are", "was", "were", "be", "been", "being", "have", "has",
        "had", "do", "does", "did", "will", "would", "could", "should", "may", "might", "must",
        "shall", "can", "need", "dare", "to", "of", "in", "for", "on", "with", "at", "by",
        "from", "as", "into", "through", "during", "before", "after", "above", "below",
        "between", "under", "again", "further", "then", "once", "here", "there", "when",
        "where", "why", "how", "all", "each", "few", "more", "most", "other", "some", "such",
        "no", "nor", "not", "only", "own", "same", "so", "than", "too", "very", "just", "and",
        "but", "if", "or", "because", "until", "while", "this", "that", "these", "those", "it",
        "its", "i", "my", "me", "we", "our", "you", "your", "he", "him", "his", "she", "her",
        "they", "them", "their", "what", "which", "who", "whom", "using", "uses", "used", "via",
        "enabled", "set", "up", "now", "also", "both", "about", "across", "new", "added",
        "built", "fixed", "created", "updated", "working", "runs", "active",
    ]
    .into_iter()
    .collect()
});

pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(word)
}
