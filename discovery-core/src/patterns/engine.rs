//! Orchestration of pattern detectors over one attribute's samples.
//!
//! The engine runs every registered detector on the same input, concatenates
//! their output and ranks it by confidence. Detectors cannot fail, so neither
//! can the engine. It holds no mutable state and may be shared freely across
//! threads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{
    DistributionDetector, FormatDetector, Pattern, PatternDetector, SequenceDetector,
    TimeSeriesDetector,
};
use crate::logging::LogConfig;
use crate::model::{DataType, RawValue};

/// Configuration for result filtering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternEngineConfig {
    /// Patterns below this confidence are dropped (default: 0.0)
    pub min_confidence: f64,
    /// Maximum number of patterns returned per call (default: unlimited)
    pub max_patterns: Option<usize>,
}

impl Default for PatternEngineConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.0,
            max_patterns: None,
        }
    }
}

/// Engine that runs pattern detectors and ranks their results.
pub struct PatternEngine {
    detectors: Vec<Box<dyn PatternDetector>>,
    config: PatternEngineConfig,
    log_config: LogConfig,
}

/// Builder for [`PatternEngine`].
pub struct PatternEngineBuilder {
    detectors: Vec<Box<dyn PatternDetector>>,
    config: PatternEngineConfig,
    log_config: LogConfig,
}

impl PatternEngineBuilder {
    /// Register a detector
    pub fn add_detector(mut self, detector: Box<dyn PatternDetector>) -> Self {
        self.detectors.push(detector);
        self
    }

    /// Register the four built-in detectors with default settings
    pub fn with_default_detectors(self) -> Self {
        self.add_detector(Box::new(TimeSeriesDetector::new()))
            .add_detector(Box::new(DistributionDetector::new()))
            .add_detector(Box::new(FormatDetector::new()))
            .add_detector(Box::new(SequenceDetector::new()))
    }

    /// Set the minimum confidence for returned patterns
    pub fn min_confidence(mut self, threshold: f64) -> Self {
        self.config.min_confidence = threshold.clamp(0.0, 1.0);
        self
    }

    /// Cap the number of returned patterns
    pub fn max_patterns(mut self, max: usize) -> Self {
        self.config.max_patterns = Some(max);
        self
    }

    pub fn config(mut self, config: PatternEngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = log_config;
        self
    }

    pub fn build(self) -> PatternEngine {
        PatternEngine {
            detectors: self.detectors,
            config: self.config,
            log_config: self.log_config,
        }
    }
}

impl PatternEngine {
    /// Create an engine with the built-in detectors
    pub fn new() -> Self {
        Self::builder().with_default_detectors().build()
    }

    /// Create a builder with no detectors registered
    pub fn builder() -> PatternEngineBuilder {
        PatternEngineBuilder {
            detectors: Vec::new(),
            config: PatternEngineConfig::default(),
            log_config: LogConfig::default(),
        }
    }

    /// Names of the registered detectors, in execution order
    pub fn detector_names(&self) -> Vec<&str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    /// Detect patterns in one attribute's sampled values.
    ///
    /// The result is sorted by confidence, highest first. Every confidence lies
    /// in `[0, 1]`.
    #[instrument(skip(self, values), fields(samples = values.len()))]
    pub fn detect_patterns(&self, values: &[RawValue], data_type: DataType) -> Vec<Pattern> {
        let mut patterns = Vec::new();

        for detector in &self.detectors {
            let detected = detector.detect(values, data_type);
            crate::log_pattern!(
                self.log_config,
                detector = %self.log_config.field(detector.name()),
                patterns_count = detected.len(),
                "Applied pattern detector"
            );
            patterns.extend(detected);
        }

        patterns.retain(|p| p.confidence.is_finite() && p.confidence >= self.config.min_confidence);
        rank_patterns(&mut patterns);

        if let Some(max) = self.config.max_patterns {
            patterns.truncate(max);
        }

        debug!(
            data_type = data_type.as_str(),
            patterns_count = patterns.len(),
            "Detected patterns"
        );

        patterns
    }

    /// Detect patterns for several attributes, keyed by attribute name.
    pub fn detect_attributes(
        &self,
        attributes: &[(String, Vec<RawValue>, DataType)],
    ) -> BTreeMap<String, Vec<Pattern>> {
        attributes
            .iter()
            .map(|(name, values, data_type)| {
                (name.clone(), self.detect_patterns(values, *data_type))
            })
            .collect()
    }
}

impl Default for PatternEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Sorts by confidence descending. The sort is stable, so equal confidences
/// keep detector registration order.
fn rank_patterns(patterns: &mut [Pattern]) {
    patterns.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::{PatternEvidence, PatternType};

    struct FixedDetector(Vec<f64>);

    impl PatternDetector for FixedDetector {
        fn detect(&self, _values: &[RawValue], _data_type: DataType) -> Vec<Pattern> {
            self.0
                .iter()
                .map(|c| {
                    Pattern::new(
                        PatternType::Format,
                        "fixed",
                        *c,
                        "fixed",
                        PatternEvidence::Prefix {
                            prefix: String::new(),
                            count: 0,
                        },
                    )
                })
                .collect()
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[test]
    fn test_default_detectors_registered() {
        let engine = PatternEngine::new();
        assert_eq!(
            engine.detector_names(),
            vec!["time_series", "distribution", "format", "sequence"]
        );
    }

    #[test]
    fn test_results_sorted_descending() {
        let engine = PatternEngine::builder()
            .add_detector(Box::new(FixedDetector(vec![0.3, 0.9])))
            .add_detector(Box::new(FixedDetector(vec![0.5, 1.0, 0.1])))
            .build();

        let confidences: Vec<f64> = engine
            .detect_patterns(&[], DataType::Unknown)
            .iter()
            .map(|p| p.confidence)
            .collect();
        assert_eq!(confidences, vec![1.0, 0.9, 0.5, 0.3, 0.1]);
    }

    #[test]
    fn test_min_confidence_and_limit() {
        let engine = PatternEngine::builder()
            .add_detector(Box::new(FixedDetector(vec![0.3, 0.9, 0.6, 0.8])))
            .min_confidence(0.5)
            .max_patterns(2)
            .build();

        let confidences: Vec<f64> = engine
            .detect_patterns(&[], DataType::Unknown)
            .iter()
            .map(|p| p.confidence)
            .collect();
        assert_eq!(confidences, vec![0.9, 0.8]);
    }

    #[test]
    fn test_arithmetic_sequence_only() {
        let values: Vec<RawValue> = [2.0, 4.0, 6.0, 8.0, 10.0]
            .into_iter()
            .map(RawValue::from)
            .collect();
        let patterns = PatternEngine::new().detect_patterns(&values, DataType::Numeric);

        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].pattern_type, PatternType::Sequence);
        assert_eq!(patterns[0].parameter_f64("difference"), Some(2.0));
        assert_eq!(patterns[0].parameter_f64("start"), Some(2.0));
    }

    #[test]
    fn test_detect_attributes() {
        let engine = PatternEngine::new();
        let attributes = vec![
            (
                "duration".to_string(),
                (1..=10).map(|i| RawValue::from(i as f64)).collect(),
                DataType::Numeric,
            ),
            ("empty".to_string(), Vec::new(), DataType::String),
        ];

        let results = engine.detect_attributes(&attributes);
        assert!(!results["duration"].is_empty());
        assert!(results["empty"].is_empty());
    }

    #[test]
    fn test_overflowing_samples_yield_no_patterns() {
        let mut values: Vec<RawValue> = std::iter::repeat(RawValue::from(1e308)).take(29).collect();
        values.push(RawValue::from(1.5e308));

        let patterns = PatternEngine::new().detect_patterns(&values, DataType::Numeric);
        assert!(patterns.is_empty(), "unexpected patterns: {patterns:?}");
    }
}
