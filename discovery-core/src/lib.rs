//! # discovery-core - Pattern and Relationship Discovery for Telemetry
//!
//! `discovery-core` looks at sampled telemetry and reports what it finds: trends,
//! seasonality, outliers, value distributions and string formats inside a single
//! attribute, and joins, temporal alignment, correlations and hierarchies between
//! event types. Every finding carries a heuristic confidence in `[0, 1]` and
//! serializes to a stable JSON shape.
//!
//! ## Quick Start
//!
//! ```rust
//! use discovery_core::prelude::*;
//!
//! # async fn example() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! // Patterns in one attribute's samples
//! let samples: Vec<RawValue> = (0..50).map(|i| RawValue::from(10.0 + 2.0 * i as f64)).collect();
//! let patterns = PatternEngine::new().detect_patterns(&samples, DataType::Numeric);
//! for pattern in &patterns {
//!     println!("{} {} ({:.2})", pattern.pattern_type, pattern.subtype, pattern.confidence);
//! }
//!
//! // Relationships between profiled schemas
//! let guid = Attribute::new("guid", DataType::String).with_semantic_type(SemanticType::Identifier);
//! let schemas = vec![
//!     Schema::new("Transaction").with_attribute(guid.clone()),
//!     Schema::new("TransactionError").with_attribute(guid),
//! ];
//! let relationships = RelationshipMiner::new().find_relationships(&schemas).await?;
//! println!("{}", serde_json::to_string_pretty(&relationships)?);
//!
//! let graph = analyze_relationship_graph(&relationships);
//! println!("{} schemas, {} edges", graph.node_count, graph.edge_count);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **`model`**: input types (`Schema`, `Attribute`, `RawValue`) supplied by an upstream profiler
//! - **`patterns`**: `PatternEngine` and the time series, distribution, format and sequence detectors
//! - **`relationships`**: `RelationshipMiner`, its four strategies, the join score cache and graph statistics
//! - **`logging`**: `tracing` configuration helpers
//! - **`error`**: `DiscoveryError`
//!
//! Pattern detection is synchronous and stateless. Relationship mining is async
//! and spreads schema pairs over a bounded pool of tokio tasks.

pub mod error;
pub mod logging;
pub mod model;
pub mod patterns;
pub mod prelude;
pub mod relationships;
