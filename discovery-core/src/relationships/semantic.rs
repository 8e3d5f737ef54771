//! Semantic relationships derived from schema names.

use super::{Relationship, RelationshipEvidence, RelationshipStrategy, RelationshipType};
use crate::error::Result;
use crate::model::Schema;

const HIERARCHY_CONFIDENCE: f64 = 0.8;
const COMPOSITION_CONFIDENCE: f64 = 0.7;

/// Known parent/child event types.
pub const HIERARCHY_VOCABULARY: &[(&str, &str)] = &[
    ("Application", "Transaction"),
    ("Application", "PageView"),
    ("Transaction", "TransactionError"),
    ("Transaction", "Span"),
    ("Service", "Span"),
    ("Host", "Process"),
    ("Host", "SystemSample"),
    ("SystemSample", "ProcessSample"),
    ("PageView", "PageAction"),
    ("PageView", "AjaxRequest"),
    ("MobileSession", "MobileCrash"),
    ("MobileSession", "MobileRequest"),
];

/// Looks up a parent/child pair in the vocabulary, in either order.
///
/// Returns `(parent, child)` as given, so callers keep the schema spelling.
pub fn hierarchy_of<'a>(a: &'a str, b: &'a str) -> Option<(&'a str, &'a str)> {
    HIERARCHY_VOCABULARY.iter().find_map(|(parent, child)| {
        if a.eq_ignore_ascii_case(parent) && b.eq_ignore_ascii_case(child) {
            Some((a, b))
        } else if b.eq_ignore_ascii_case(parent) && a.eq_ignore_ascii_case(child) {
            Some((b, a))
        } else {
            None
        }
    })
}

/// Returns `(whole, part)` when one name is a strict prefix of the other.
pub fn composition_of<'a>(a: &'a str, b: &'a str) -> Option<(&'a str, &'a str)> {
    let (shorter, longer) = if a.len() < b.len() { (a, b) } else { (b, a) };
    if shorter.is_empty() || shorter.len() == longer.len() {
        return None;
    }

    let prefix = longer.get(..shorter.len())?;
    prefix
        .eq_ignore_ascii_case(shorter)
        .then_some((shorter, longer))
}

/// Relates schemas through a parent/child vocabulary or name composition.
#[derive(Debug, Clone, Copy, Default)]
pub struct SemanticStrategy;

impl SemanticStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl RelationshipStrategy for SemanticStrategy {
    fn evaluate(&self, source: &Schema, target: &Schema) -> Result<Option<Relationship>> {
        let (relationship_type, confidence, rule, (parent, child)) =
            if let Some(pair) = hierarchy_of(&source.name, &target.name) {
                (RelationshipType::Hierarchy, HIERARCHY_CONFIDENCE, "vocabulary", pair)
            } else if let Some(pair) = composition_of(&source.name, &target.name) {
                (RelationshipType::Composition, COMPOSITION_CONFIDENCE, "name_prefix", pair)
            } else {
                return Ok(None);
            };

        Ok(Some(Relationship::new(
            relationship_type,
            parent,
            child,
            confidence,
            RelationshipEvidence::Semantic {
                rule: rule.to_string(),
                parent: parent.to_string(),
                child: child.to_string(),
            },
        )))
    }

    fn name(&self) -> &str {
        "semantic"
    }
}
