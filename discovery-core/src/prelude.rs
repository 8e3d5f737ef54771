//! Prelude for commonly used types and traits in discovery-core.

pub use crate::error::{DiscoveryError, Result};
pub use crate::logging::LogConfig;
pub use crate::model::{Attribute, Cardinality, DataType, RawValue, Schema, SemanticType};
pub use crate::patterns::{Pattern, PatternDetector, PatternEngine, PatternType};
pub use crate::relationships::{
    analyze_relationship_graph, analyze_with_schemas, ErrorPolicy, JoinType, MinerConfig,
    MiningReport, Relationship, RelationshipGraph, RelationshipMiner, RelationshipStrategy,
    RelationshipType,
};
