//! Temporal co-occurrence: both schemas can be aligned on a time axis.

use super::{Relationship, RelationshipEvidence, RelationshipStrategy, RelationshipType};
use crate::error::Result;
use crate::model::Schema;

const TEMPORAL_CONFIDENCE: f64 = 0.9;

/// Relates two schemas that both carry a timestamp attribute.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemporalStrategy;

impl TemporalStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl RelationshipStrategy for TemporalStrategy {
    fn evaluate(&self, source: &Schema, target: &Schema) -> Result<Option<Relationship>> {
        let (Some(sa), Some(ta)) = (source.temporal_attribute(), target.temporal_attribute())
        else {
            return Ok(None);
        };

        Ok(Some(Relationship::new(
            RelationshipType::Temporal,
            &source.name,
            &target.name,
            TEMPORAL_CONFIDENCE,
            RelationshipEvidence::Temporal {
                source_attribute: sa.name.clone(),
                target_attribute: ta.name.clone(),
            },
        )))
    }

    fn name(&self) -> &str {
        "temporal"
    }
}
