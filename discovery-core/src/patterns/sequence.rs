//! Sequence detection: arithmetic progressions and shared string prefixes.

use super::{Pattern, PatternDetector, PatternEvidence, PatternType};
use crate::model::{numeric_values, string_values, DataType, RawValue};

const ARITHMETIC_CONFIDENCE: f64 = 0.95;
const PREFIX_CONFIDENCE: f64 = 0.8;

/// Detects ordered sequences in numeric or string samples.
#[derive(Debug, Clone)]
pub struct SequenceDetector {
    min_samples: usize,
    tolerance: f64,
    min_suffix_len: usize,
}

impl Default for SequenceDetector {
    fn default() -> Self {
        Self {
            min_samples: 3,
            tolerance: 0.001,
            min_suffix_len: 2,
        }
    }
}

impl SequenceDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum deviation between successive differences
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance.abs();
        self
    }

    fn detect_arithmetic(&self, values: &[f64]) -> Option<Pattern> {
        if values.len() < self.min_samples {
            return None;
        }

        let difference = values[1] - values[0];
        let consistent = values
            .windows(2)
            .all(|w| ((w[1] - w[0]) - difference).abs() <= self.tolerance);
        if !consistent {
            return None;
        }

        let start = values[0];
        Some(Pattern::new(
            PatternType::Sequence,
            "arithmetic",
            ARITHMETIC_CONFIDENCE,
            format!("Arithmetic sequence starting at {start} with step {difference}"),
            PatternEvidence::Arithmetic {
                difference,
                start,
                length: values.len(),
            },
        ))
    }

    fn detect_prefix(&self, values: &[&str]) -> Option<Pattern> {
        if values.len() < self.min_samples {
            return None;
        }

        let first = values[0];
        let prefix = values[1..]
            .iter()
            .fold(first, |prefix, value| common_prefix(prefix, value));

        if prefix.is_empty()
            || prefix.chars().count() + self.min_suffix_len > first.chars().count()
        {
            return None;
        }

        Some(Pattern::new(
            PatternType::Sequence,
            "prefix",
            PREFIX_CONFIDENCE,
            format!("{} values share the prefix '{prefix}'", values.len()),
            PatternEvidence::Prefix {
                prefix: prefix.to_string(),
                count: values.len(),
            },
        ))
    }
}

/// Longest common prefix, respecting char boundaries.
fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let end = a
        .char_indices()
        .zip(b.chars())
        .find(|((_, ca), cb)| ca != cb)
        .map(|((i, _), _)| i)
        .unwrap_or_else(|| a.len().min(b.len()));
    &a[..end]
}

impl PatternDetector for SequenceDetector {
    fn detect(&self, values: &[RawValue], data_type: DataType) -> Vec<Pattern> {
        let pattern = match data_type {
            DataType::Numeric => self.detect_arithmetic(&numeric_values(values)),
            DataType::String => self.detect_prefix(&string_values(values)),
            _ => None,
        };
        pattern.into_iter().collect()
    }

    fn name(&self) -> &str {
        "sequence"
    }
}
