//! recall-core: Shared graph model, configuration, and error handling for recall.
//!
//! This crate provides the foundational types used across all recall components:
//! - Entity types and nodes for the co-occurrence graph
//! - The undirected adjacency map and per-entity source index
//! - Timestamp-independent content hashing of a graph
//! - Configuration management
//! - Common error types

pub mod config;
pub mod error;
pub mod graph;
pub mod hash;
pub mod types;

pub use config::{QueryConfig, RecallConfig, WeightConfig};
pub use error::RecallError;
pub use graph::{Adjacency, KnowledgeGraph, SourceIndex};
pub use types::{EntityType, Metadata, Node};
