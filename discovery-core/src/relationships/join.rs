//! Join-key detection between two schemas.
//!
//! Every attribute pair is screened by name and semantic type. Candidates are
//! scored heuristically and the best one becomes the join relationship when it
//! reaches the miner's minimum confidence.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{
    JoinKeys, JoinScoreCache, JoinType, Relationship, RelationshipEvidence,
    RelationshipStrategy, RelationshipType,
};
use crate::error::Result;
use crate::model::{Attribute, Schema};

const BASE_CONFIDENCE: f64 = 0.5;
const SAME_NAME_BONUS: f64 = 0.3;
const SAME_TYPE_BONUS: f64 = 0.1;
const IDENTIFIER_BONUS: f64 = 0.1;

/// Matches key-like suffixes in snake, dotted, kebab or camel case names.
static KEY_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"(?:^|[_.\-])(?i:(id|key|guid|uuid|ref|fk))$|[a-z0-9](Id|Key|Guid|Uuid|Ref)$")
        .expect("key suffix regex is valid")
});

/// Returns the lowercased key suffix of an attribute name, if it has one.
pub fn key_suffix(name: &str) -> Option<String> {
    let captures = KEY_SUFFIX.captures(name)?;
    captures
        .get(1)
        .or_else(|| captures.get(2))
        .map(|m| m.as_str().to_ascii_lowercase())
}

/// Whether an attribute pair is worth scoring as a join key.
pub fn is_join_candidate(source: &Attribute, target: &Attribute) -> bool {
    if source.name.is_empty() || target.name.is_empty() {
        return false;
    }
    if source.name == target.name {
        return true;
    }
    if source.is_identifier() && target.is_identifier() {
        return true;
    }
    if let (Some(a), Some(b)) = (key_suffix(&source.name), key_suffix(&target.name)) {
        if a == b {
            return true;
        }
    }

    let source_name = source.name.to_lowercase();
    let target_name = target.name.to_lowercase();
    source_name.contains(&target_name) || target_name.contains(&source_name)
}

/// Heuristic join confidence for a candidate attribute pair.
pub fn join_confidence(source: &Attribute, target: &Attribute) -> f64 {
    let mut confidence = BASE_CONFIDENCE;

    if source.name == target.name {
        confidence += SAME_NAME_BONUS;
    }
    if source.data_type == target.data_type {
        confidence += SAME_TYPE_BONUS;
    }
    if source.is_identifier() && target.is_identifier() {
        confidence += IDENTIFIER_BONUS;
    }

    confidence.min(1.0)
}

/// Finds the strongest shared key between two schemas.
#[derive(Debug, Clone)]
pub struct JoinStrategy {
    min_confidence: f64,
    cache: Arc<JoinScoreCache>,
}

impl JoinStrategy {
    pub fn new(min_confidence: f64, cache: Arc<JoinScoreCache>) -> Self {
        Self {
            min_confidence,
            cache,
        }
    }

    fn score(&self, source: &Schema, sa: &Attribute, target: &Schema, ta: &Attribute) -> f64 {
        let key = JoinScoreCache::key(&source.name, &sa.name, &target.name, &ta.name);
        self.cache
            .get_or_insert_with(key, || join_confidence(sa, ta))
    }
}

impl RelationshipStrategy for JoinStrategy {
    fn evaluate(&self, source: &Schema, target: &Schema) -> Result<Option<Relationship>> {
        let mut best: Option<(&Attribute, &Attribute, f64)> = None;
        let mut candidate_count = 0;

        for sa in &source.attributes {
            for ta in &target.attributes {
                if !is_join_candidate(sa, ta) {
                    continue;
                }
                candidate_count += 1;

                let confidence = self.score(source, sa, target, ta);
                if best.map_or(true, |(_, _, c)| confidence > c) {
                    best = Some((sa, ta, confidence));
                }
            }
        }

        let Some((sa, ta, confidence)) = best else {
            return Ok(None);
        };
        if confidence < self.min_confidence {
            return Ok(None);
        }

        let join_type = JoinType::infer(
            sa.cardinality.is_high_cardinality,
            ta.cardinality.is_high_cardinality,
        );

        let relationship = Relationship::new(
            RelationshipType::Join,
            &source.name,
            &target.name,
            confidence,
            RelationshipEvidence::Join {
                same_name: sa.name == ta.name,
                same_data_type: sa.data_type == ta.data_type,
                both_identifiers: sa.is_identifier() && ta.is_identifier(),
                candidate_count,
            },
        )
        .with_join_keys(JoinKeys {
            source_key: sa.name.clone(),
            target_key: ta.name.clone(),
            join_type,
        });

        Ok(Some(relationship))
    }

    fn name(&self) -> &str {
        "join"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cardinality, DataType, SemanticType};

    fn strategy() -> JoinStrategy {
        JoinStrategy::new(0.7, Arc::new(JoinScoreCache::new(100)))
    }

    fn identifier(name: &str) -> Attribute {
        Attribute::new(name, DataType::String).with_semantic_type(SemanticType::Identifier)
    }

    #[test]
    fn test_key_suffix() {
        assert_eq!(key_suffix("id").as_deref(), Some("id"));
        assert_eq!(key_suffix("order_id").as_deref(), Some("id"));
        assert_eq!(key_suffix("customerId").as_deref(), Some("id"));
        assert_eq!(key_suffix("trace.guid").as_deref(), Some("guid"));
        assert_eq!(key_suffix("api-key").as_deref(), Some("key"));
        assert_eq!(key_suffix("paid"), None);
        assert_eq!(key_suffix("duration"), None);
    }

    #[test]
    fn test_candidate_rules() {
        let a = Attribute::new("order_id", DataType::String);
        let b = Attribute::new("customer_id", DataType::String);
        assert!(is_join_candidate(&a, &b));

        let a = Attribute::new("host", DataType::String);
        let b = Attribute::new("hostname", DataType::String);
        assert!(is_join_candidate(&a, &b));

        let a = Attribute::new("duration", DataType::Numeric);
        let b = Attribute::new("error", DataType::Boolean);
        assert!(!is_join_candidate(&a, &b));

        assert!(is_join_candidate(&identifier("trace"), &identifier("span")));
    }

    #[test]
    fn test_confidence_scoring() {
        assert_eq!(join_confidence(&identifier("id"), &identifier("id")), 1.0);

        let a = Attribute::new("appName", DataType::String);
        assert!((join_confidence(&a, &a.clone()) - 0.9).abs() < 1e-12);

        let a = Attribute::new("order_id", DataType::String);
        let b = Attribute::new("customer_id", DataType::Numeric);
        assert!((join_confidence(&a, &b) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_identifier_join() {
        let source = Schema::new("Orders").with_attribute(identifier("id"));
        let target = Schema::new("Payments").with_attribute(identifier("id"));

        let relationship = strategy().evaluate(&source, &target).unwrap().unwrap();
        assert_eq!(relationship.relationship_type, RelationshipType::Join);
        assert!(relationship.confidence >= 0.7);

        let keys = relationship.join_keys.unwrap();
        assert_eq!(keys.source_key, "id");
        assert_eq!(keys.target_key, "id");
        assert_eq!(keys.join_type, JoinType::OneToOne);
    }

    #[test]
    fn test_join_type_from_cardinality() {
        let high = Cardinality::from_counts(990, 1000, 0.5);
        let source = Schema::new("Transaction").with_attribute(
            Attribute::new("guid", DataType::String).with_cardinality(high),
        );
        let target = Schema::new("TransactionError")
            .with_attribute(Attribute::new("guid", DataType::String));

        let relationship = strategy().evaluate(&source, &target).unwrap().unwrap();
        assert_eq!(relationship.join_keys.unwrap().join_type, JoinType::OneToMany);
    }

    #[test]
    fn test_weak_candidates_are_dropped() {
        let source = Schema::new("A").with_attribute(Attribute::new("order_id", DataType::String));
        let target =
            Schema::new("B").with_attribute(Attribute::new("customer_id", DataType::Numeric));

        assert!(strategy().evaluate(&source, &target).unwrap().is_none());
    }

    #[test]
    fn test_best_candidate_wins() {
        let source = Schema::new("A")
            .with_attribute(Attribute::new("host", DataType::String))
            .with_attribute(identifier("entityGuid"));
        let target = Schema::new("B")
            .with_attribute(Attribute::new("hostname", DataType::String))
            .with_attribute(identifier("entityGuid"));

        let relationship = strategy().evaluate(&source, &target).unwrap().unwrap();
        assert_eq!(relationship.join_keys.unwrap().source_key, "entityGuid");
        assert_eq!(relationship.confidence, 1.0);
    }

    #[test]
    fn test_scores_are_cached() {
        let cache = Arc::new(JoinScoreCache::new(100));
        let strategy = JoinStrategy::new(0.7, Arc::clone(&cache));
        let source = Schema::new("A").with_attribute(identifier("id"));
        let target = Schema::new("B").with_attribute(identifier("id"));

        strategy.evaluate(&source, &target).unwrap();
        strategy.evaluate(&target, &source).unwrap();

        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
    }
}
