//! Cross-schema relationship mining.
//!
//! The [`RelationshipMiner`] evaluates every unordered schema pair with four
//! strategies:
//!
//! - **Join** (`join`): attribute pairs that look like shared keys
//! - **Temporal** (`temporal`): both schemas carry a timestamp
//! - **Correlation** (`correlation`): numeric attributes expected to move together
//! - **Semantic** (`semantic`): parent/child event types and name composition
//!
//! Each strategy contributes at most one relationship per pair. The resulting
//! set can be summarised with [`RelationshipGraph`].
//!
//! # Example
//!
//! ```rust
//! use discovery_core::model::{Attribute, DataType, Schema, SemanticType};
//! use discovery_core::relationships::{RelationshipMiner, RelationshipType};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let id = Attribute::new("id", DataType::String).with_semantic_type(SemanticType::Identifier);
//! let schemas = vec![
//!     Schema::new("Orders").with_attribute(id.clone()),
//!     Schema::new("Payments").with_attribute(id),
//! ];
//!
//! let miner = RelationshipMiner::new();
//! let relationships = miner.find_relationships(&schemas).await.unwrap();
//! assert_eq!(relationships[0].relationship_type, RelationshipType::Join);
//! # });
//! ```

pub mod cache;
pub mod correlation;
pub mod graph;
pub mod join;
pub mod miner;
pub mod semantic;
pub mod temporal;

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Value};

use crate::error::Result;
use crate::model::Schema;
use crate::patterns::clamp_confidence;

pub use cache::{CacheStats, JoinScoreCache};
pub use correlation::{CorrelationMethod, CorrelationStrategy};
pub use graph::{analyze_relationship_graph, analyze_with_schemas, RelationshipGraph};
pub use join::JoinStrategy;
pub use miner::{
    ErrorPolicy, MinerBuilder, MinerConfig, MiningReport, PairError, RelationshipMiner,
};
pub use semantic::SemanticStrategy;
pub use temporal::TemporalStrategy;

/// A way of finding a relationship between two schemas.
///
/// Strategies are evaluated once per unordered schema pair, from several
/// worker tasks at a time, and return at most one relationship.
pub trait RelationshipStrategy: Send + Sync {
    /// Evaluate one schema pair.
    fn evaluate(&self, source: &Schema, target: &Schema) -> Result<Option<Relationship>>;

    /// Name of this strategy
    fn name(&self) -> &str;
}

/// Kind of relationship between two schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    Join,
    Temporal,
    Correlation,
    Hierarchy,
    Composition,
}

impl RelationshipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::Join => "join",
            RelationshipType::Temporal => "temporal",
            RelationshipType::Correlation => "correlation",
            RelationshipType::Hierarchy => "hierarchy",
            RelationshipType::Composition => "composition",
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cardinality shape of a join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinType {
    #[serde(rename = "one-to-one")]
    OneToOne,
    #[serde(rename = "one-to-many")]
    OneToMany,
    #[serde(rename = "many-to-one")]
    ManyToOne,
    #[serde(rename = "many-to-many")]
    ManyToMany,
}

impl JoinType {
    /// Infers the join shape from each side's high-cardinality flag.
    pub fn infer(source_high: bool, target_high: bool) -> Self {
        match (source_high, target_high) {
            (true, true) => JoinType::ManyToMany,
            (true, false) => JoinType::OneToMany,
            (false, true) => JoinType::ManyToOne,
            (false, false) => JoinType::OneToOne,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JoinType::OneToOne => "one-to-one",
            JoinType::OneToMany => "one-to-many",
            JoinType::ManyToOne => "many-to-one",
            JoinType::ManyToMany => "many-to-many",
        }
    }
}

/// Attribute pair hypothesised to link two schemas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinKeys {
    pub source_key: String,
    pub target_key: String,
    pub join_type: JoinType,
}

/// Strategy-specific facts supporting a relationship.
#[derive(Debug, Clone, PartialEq)]
pub enum RelationshipEvidence {
    Join {
        same_name: bool,
        same_data_type: bool,
        both_identifiers: bool,
        candidate_count: usize,
    },
    Temporal {
        source_attribute: String,
        target_attribute: String,
    },
    Correlation {
        source_attribute: String,
        target_attribute: String,
        method: CorrelationMethod,
        estimate: f64,
        sample_size: Option<usize>,
    },
    Semantic {
        rule: String,
        parent: String,
        child: String,
    },
}

impl RelationshipEvidence {
    /// Flattens the evidence into the generic map used on the wire.
    pub fn to_map(&self) -> BTreeMap<String, Value> {
        let pairs: Vec<(&str, Value)> = match self {
            RelationshipEvidence::Join {
                same_name,
                same_data_type,
                both_identifiers,
                candidate_count,
            } => vec![
                ("same_name", json!(same_name)),
                ("same_data_type", json!(same_data_type)),
                ("both_identifiers", json!(both_identifiers)),
                ("candidate_count", json!(candidate_count)),
            ],
            RelationshipEvidence::Temporal {
                source_attribute,
                target_attribute,
            } => vec![
                ("source_attribute", json!(source_attribute)),
                ("target_attribute", json!(target_attribute)),
            ],
            RelationshipEvidence::Correlation {
                source_attribute,
                target_attribute,
                method,
                estimate,
                sample_size,
            } => {
                let mut pairs = vec![
                    ("source_attribute", json!(source_attribute)),
                    ("target_attribute", json!(target_attribute)),
                    ("method", json!(method.as_str())),
                    ("correlation", json!(estimate)),
                ];
                if let Some(n) = sample_size {
                    pairs.push(("sample_size", json!(n)));
                }
                pairs
            }
            RelationshipEvidence::Semantic {
                rule,
                parent,
                child,
            } => vec![
                ("rule", json!(rule)),
                ("parent", json!(parent)),
                ("child", json!(child)),
            ],
        };

        pairs
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect()
    }
}

/// A relationship between two schemas.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub relationship_type: RelationshipType,
    pub source_schema: String,
    pub target_schema: String,
    /// Confidence score (0.0 to 1.0)
    pub confidence: f64,
    /// Present only for join relationships
    pub join_keys: Option<JoinKeys>,
    pub evidence: RelationshipEvidence,
}

impl Relationship {
    /// Creates a relationship, clamping the confidence into `[0, 1]`. A NaN
    /// or infinite confidence becomes 0.
    pub fn new(
        relationship_type: RelationshipType,
        source_schema: impl Into<String>,
        target_schema: impl Into<String>,
        confidence: f64,
        evidence: RelationshipEvidence,
    ) -> Self {
        Self {
            relationship_type,
            source_schema: source_schema.into(),
            target_schema: target_schema.into(),
            confidence: clamp_confidence(confidence),
            join_keys: None,
            evidence,
        }
    }

    pub fn with_join_keys(mut self, join_keys: JoinKeys) -> Self {
        self.join_keys = Some(join_keys);
        self
    }

    pub fn evidence_map(&self) -> BTreeMap<String, Value> {
        self.evidence.to_map()
    }

    /// True if the relationship touches the named schema.
    pub fn involves(&self, schema: &str) -> bool {
        self.source_schema == schema || self.target_schema == schema
    }
}

impl Serialize for Relationship {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Relationship", 6)?;
        state.serialize_field("type", &self.relationship_type)?;
        state.serialize_field("source_schema", &self.source_schema)?;
        state.serialize_field("target_schema", &self.target_schema)?;
        state.serialize_field("confidence", &self.confidence)?;
        state.serialize_field("join_keys", &self.join_keys)?;
        state.serialize_field("evidence", &self.evidence_map())?;
        state.end()
    }
}

/// Sorts by confidence descending with deterministic tie-breaks.
pub(crate) fn rank_relationships(relationships: &mut [Relationship]) {
    relationships.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| a.relationship_type.cmp(&b.relationship_type))
            .then_with(|| a.source_schema.cmp(&b.source_schema))
            .then_with(|| a.target_schema.cmp(&b.target_schema))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_type_inference() {
        assert_eq!(JoinType::infer(true, true), JoinType::ManyToMany);
        assert_eq!(JoinType::infer(true, false), JoinType::OneToMany);
        assert_eq!(JoinType::infer(false, true), JoinType::ManyToOne);
        assert_eq!(JoinType::infer(false, false), JoinType::OneToOne);
    }

    #[test]
    fn test_relationship_serializes_wire_contract() {
        let relationship = Relationship::new(
            RelationshipType::Join,
            "Transaction",
            "TransactionError",
            0.9,
            RelationshipEvidence::Join {
                same_name: true,
                same_data_type: true,
                both_identifiers: false,
                candidate_count: 1,
            },
        )
        .with_join_keys(JoinKeys {
            source_key: "guid".to_string(),
            target_key: "guid".to_string(),
            join_type: JoinType::OneToMany,
        });

        let json = serde_json::to_value(&relationship).unwrap();
        assert_eq!(json["type"], "join");
        assert_eq!(json["source_schema"], "Transaction");
        assert_eq!(json["join_keys"]["join_type"], "one-to-many");
        assert_eq!(json["evidence"]["same_name"], true);
    }

    #[test]
    fn test_non_finite_confidence_becomes_zero() {
        let evidence = RelationshipEvidence::Temporal {
            source_attribute: "timestamp".to_string(),
            target_attribute: "timestamp".to_string(),
        };
        for confidence in [f64::NAN, f64::INFINITY] {
            let relationship =
                Relationship::new(RelationshipType::Temporal, "A", "B", confidence, evidence.clone());
            assert_eq!(relationship.confidence, 0.0);
        }
        let relationship = Relationship::new(RelationshipType::Temporal, "A", "B", 1.4, evidence);
        assert_eq!(relationship.confidence, 1.0);
    }

    #[test]
    fn test_non_join_serializes_null_keys() {
        let relationship = Relationship::new(
            RelationshipType::Temporal,
            "A",
            "B",
            0.9,
            RelationshipEvidence::Temporal {
                source_attribute: "timestamp".to_string(),
                target_attribute: "timestamp".to_string(),
            },
        );
        let json = serde_json::to_value(&relationship).unwrap();
        assert!(json["join_keys"].is_null());
    }

    #[test]
    fn test_rank_relationships_deterministic() {
        let evidence = RelationshipEvidence::Temporal {
            source_attribute: "t".to_string(),
            target_attribute: "t".to_string(),
        };
        let mut relationships = vec![
            Relationship::new(RelationshipType::Temporal, "B", "C", 0.9, evidence.clone()),
            Relationship::new(RelationshipType::Temporal, "A", "C", 0.9, evidence.clone()),
            Relationship::new(RelationshipType::Hierarchy, "A", "B", 0.95, evidence),
        ];
        rank_relationships(&mut relationships);

        let order: Vec<(&str, &str)> = relationships
            .iter()
            .map(|r| (r.source_schema.as_str(), r.target_schema.as_str()))
            .collect();
        assert_eq!(order, vec![("A", "B"), ("A", "C"), ("B", "C")]);
    }
}
