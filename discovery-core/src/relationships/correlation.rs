//! Statistical correlation between numeric attributes of two schemas.
//!
//! By default the estimate comes from attribute names alone: metric pairs that
//! usually move together in telemetry (response time and duration, error
//! counts and response time, counts and sums) get a fixed estimate.
//! [`CorrelationMethod::SampledPearson`] computes Pearson's r over aligned
//! samples instead, falling back to the names when samples are missing.

use serde::{Deserialize, Serialize};

use super::{Relationship, RelationshipEvidence, RelationshipStrategy, RelationshipType};
use crate::error::Result;
use crate::model::{Attribute, Schema};
use crate::patterns::stats;

/// Name fragments and the correlation assumed between them.
const NAME_HEURISTICS: [(&str, &str, f64); 3] = [
    ("response", "duration", 0.8),
    ("error", "response", 0.7),
    ("count", "sum", 0.9),
];

/// How correlation between two numeric attributes is estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationMethod {
    #[default]
    NameHeuristic,
    SampledPearson,
}

impl CorrelationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CorrelationMethod::NameHeuristic => "name_heuristic",
            CorrelationMethod::SampledPearson => "sampled_pearson",
        }
    }
}

/// Heuristic correlation estimate from attribute names, 0.0 when unrelated.
pub fn heuristic_correlation(source: &str, target: &str) -> f64 {
    let source = source.to_lowercase();
    let target = target.to_lowercase();

    NAME_HEURISTICS
        .iter()
        .find(|(a, b, _)| {
            (source.contains(a) && target.contains(b)) || (source.contains(b) && target.contains(a))
        })
        .map_or(0.0, |(_, _, estimate)| *estimate)
}

/// An estimate and how it was obtained.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Estimate {
    value: f64,
    method: CorrelationMethod,
    sample_size: Option<usize>,
}

/// Relates schemas whose numeric attributes are expected to correlate.
#[derive(Debug, Clone)]
pub struct CorrelationStrategy {
    min_correlation: f64,
    method: CorrelationMethod,
    min_samples: usize,
}

impl CorrelationStrategy {
    pub fn new(min_correlation: f64, method: CorrelationMethod, min_samples: usize) -> Self {
        Self {
            min_correlation,
            method,
            min_samples: min_samples.max(2),
        }
    }

    fn estimate(&self, source: &Attribute, target: &Attribute) -> Estimate {
        if self.method == CorrelationMethod::SampledPearson {
            let n = source.samples.len().min(target.samples.len());
            if n >= self.min_samples {
                if let Some(r) = stats::pearson(&source.samples[..n], &target.samples[..n]) {
                    return Estimate {
                        value: r,
                        method: CorrelationMethod::SampledPearson,
                        sample_size: Some(n),
                    };
                }
            }
        }

        Estimate {
            value: heuristic_correlation(&source.name, &target.name),
            method: CorrelationMethod::NameHeuristic,
            sample_size: None,
        }
    }
}

impl RelationshipStrategy for CorrelationStrategy {
    fn evaluate(&self, source: &Schema, target: &Schema) -> Result<Option<Relationship>> {
        let mut best: Option<(&Attribute, &Attribute, Estimate)> = None;

        for sa in source.numeric_attributes() {
            for ta in target.numeric_attributes() {
                let estimate = self.estimate(sa, ta);
                if !estimate.value.is_finite() || estimate.value.abs() < self.min_correlation {
                    continue;
                }
                if best.map_or(true, |(_, _, b)| estimate.value.abs() > b.value.abs()) {
                    best = Some((sa, ta, estimate));
                }
            }
        }

        Ok(best.map(|(sa, ta, estimate)| {
            Relationship::new(
                RelationshipType::Correlation,
                &source.name,
                &target.name,
                estimate.value.abs(),
                RelationshipEvidence::Correlation {
                    source_attribute: sa.name.clone(),
                    target_attribute: ta.name.clone(),
                    method: estimate.method,
                    estimate: estimate.value,
                    sample_size: estimate.sample_size,
                },
            )
        }))
    }

    fn name(&self) -> &str {
        "correlation"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DataType;

    fn numeric(name: &str) -> Attribute {
        Attribute::new(name, DataType::Numeric)
    }

    fn heuristic() -> CorrelationStrategy {
        CorrelationStrategy::new(0.7, CorrelationMethod::NameHeuristic, 10)
    }

    #[test]
    fn test_name_heuristics() {
        assert_eq!(heuristic_correlation("responseTime", "duration"), 0.8);
        assert_eq!(heuristic_correlation("duration", "response.time"), 0.8);
        assert_eq!(heuristic_correlation("callCount", "totalSum"), 0.9);
        assert_eq!(heuristic_correlation("errors", "responseCode"), 0.7);
        assert_eq!(heuristic_correlation("cpuPercent", "memoryBytes"), 0.0);
    }

    #[test]
    fn test_emits_best_pair() {
        let source = Schema::new("Transaction")
            .with_attribute(numeric("duration"))
            .with_attribute(numeric("callCount"));
        let target = Schema::new("Metric")
            .with_attribute(numeric("responseTime"))
            .with_attribute(numeric("sum"));

        let relationship = heuristic().evaluate(&source, &target).unwrap().unwrap();
        assert_eq!(relationship.relationship_type, RelationshipType::Correlation);
        assert_eq!(relationship.confidence, 0.9);

        let evidence = relationship.evidence_map();
        assert_eq!(evidence["source_attribute"], "callCount");
        assert_eq!(evidence["target_attribute"], "sum");
        assert_eq!(evidence["method"], "name_heuristic");
    }

    #[test]
    fn test_non_numeric_attributes_ignored() {
        let source =
            Schema::new("A").with_attribute(Attribute::new("responseTime", DataType::String));
        let target = Schema::new("B").with_attribute(numeric("duration"));

        assert!(heuristic().evaluate(&source, &target).unwrap().is_none());
    }

    #[test]
    fn test_sampled_pearson() {
        let xs: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 100.0 - 3.0 * x).collect();
        let source = Schema::new("A").with_attribute(numeric("cpu").with_samples(xs));
        let target = Schema::new("B").with_attribute(numeric("idle").with_samples(ys));

        let strategy = CorrelationStrategy::new(0.7, CorrelationMethod::SampledPearson, 10);
        let relationship = strategy.evaluate(&source, &target).unwrap().unwrap();

        assert!((relationship.confidence - 1.0).abs() < 1e-9);
        let evidence = relationship.evidence_map();
        assert_eq!(evidence["method"], "sampled_pearson");
        assert_eq!(evidence["sample_size"], 20);
        assert!(evidence["correlation"].as_f64().unwrap() < -0.99);
    }

    #[test]
    fn test_sampled_pearson_falls_back_to_names() {
        let source = Schema::new("A")
            .with_attribute(numeric("responseTime").with_samples(vec![1.0, 2.0, 3.0]));
        let target = Schema::new("B").with_attribute(numeric("duration"));

        let strategy = CorrelationStrategy::new(0.7, CorrelationMethod::SampledPearson, 10);
        let relationship = strategy.evaluate(&source, &target).unwrap().unwrap();
        assert_eq!(relationship.confidence, 0.8);
        assert_eq!(relationship.evidence_map()["method"], "name_heuristic");
    }
}
