//! Distribution shape detection for numeric samples.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::stats::{self, EPSILON};
use super::{Pattern, PatternDetector, PatternEvidence, PatternType};
use crate::model::{numeric_values, DataType, RawValue};

/// Configuration for the distribution detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionConfig {
    /// Minimum numeric samples required (default: 30)
    pub min_samples: usize,
    /// Bound on |skewness| and |excess kurtosis| for a normal shape (default: 0.5)
    pub shape_tolerance: f64,
    /// Number of equal-width buckets for the uniformity test (default: 10)
    pub buckets: usize,
    /// Chi-square critical value (default: 16.92, 95% with 9 degrees of freedom)
    pub chi_square_critical: f64,
    /// Distinct log-log points needed for the power-law heuristic (default: 5)
    pub min_log_points: usize,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            min_samples: 30,
            shape_tolerance: 0.5,
            buckets: 10,
            chi_square_critical: 16.92,
            min_log_points: 5,
        }
    }
}

const NORMAL_CONFIDENCE: f64 = 0.8;
const UNIFORM_CONFIDENCE: f64 = 0.8;
const POWER_LAW_CONFIDENCE: f64 = 0.7;

/// Tests numeric samples against normal, uniform and power-law shapes.
#[derive(Debug, Clone, Default)]
pub struct DistributionDetector {
    config: DistributionConfig,
}

impl DistributionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DistributionConfig) -> Self {
        Self { config }
    }

    fn detect_normal(&self, values: &[f64]) -> Option<Pattern> {
        let m = stats::moments(values)?;
        let tolerance = self.config.shape_tolerance;
        if m.skewness.abs() >= tolerance || m.kurtosis.abs() >= tolerance {
            return None;
        }

        Some(Pattern::new(
            PatternType::Distribution,
            "normal",
            NORMAL_CONFIDENCE,
            format!(
                "Approximately normal (mean {:.3}, std dev {:.3})",
                m.mean, m.std_dev
            ),
            PatternEvidence::NormalShape {
                mean: m.mean,
                std_dev: m.std_dev,
                skewness: m.skewness,
                kurtosis: m.kurtosis,
            },
        ))
    }

    fn detect_uniform(&self, values: &[f64]) -> Option<Pattern> {
        let chi_square = stats::chi_square_uniform(values, self.config.buckets)?;
        if chi_square >= self.config.chi_square_critical {
            return None;
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(Pattern::new(
            PatternType::Distribution,
            "uniform",
            UNIFORM_CONFIDENCE,
            format!("Approximately uniform over [{min:.3}, {max:.3}] (χ² {chi_square:.2})"),
            PatternEvidence::Uniform {
                min,
                max,
                chi_square,
                buckets: self.config.buckets,
            },
        ))
    }

    /// Coarse heuristic: enough distinct positive values to form a log-log
    /// frequency plot. No exponent is fitted for the decision.
    fn detect_power_law(&self, values: &[f64]) -> Option<Pattern> {
        // Positive f64 bit patterns sort in numeric order.
        let mut frequencies: BTreeMap<u64, usize> = BTreeMap::new();
        for value in values.iter().filter(|v| **v > 0.0) {
            *frequencies.entry(value.to_bits()).or_insert(0) += 1;
        }

        if frequencies.len() < self.config.min_log_points {
            return None;
        }

        let points: Vec<(f64, f64)> = frequencies
            .iter()
            .map(|(bits, count)| (f64::from_bits(*bits).ln(), (*count as f64).ln()))
            .collect();

        Some(Pattern::new(
            PatternType::Distribution,
            "power_law",
            POWER_LAW_CONFIDENCE,
            format!(
                "Possible power-law tail across {} distinct values",
                points.len()
            ),
            PatternEvidence::PowerLaw {
                distinct_points: points.len(),
                log_log_slope: log_log_slope(&points),
            },
        ))
    }
}

fn log_log_slope(points: &[(f64, f64)]) -> f64 {
    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;
    let (sxy, sxx) = points.iter().fold((0.0, 0.0), |(sxy, sxx), (x, y)| {
        (sxy + (x - mean_x) * (y - mean_y), sxx + (x - mean_x).powi(2))
    });
    if sxx < EPSILON {
        0.0
    } else {
        sxy / sxx
    }
}

impl PatternDetector for DistributionDetector {
    fn detect(&self, values: &[RawValue], data_type: DataType) -> Vec<Pattern> {
        if data_type != DataType::Numeric {
            return Vec::new();
        }

        let samples = numeric_values(values);
        if samples.len() < self.config.min_samples {
            return Vec::new();
        }

        [
            self.detect_normal(&samples),
            self.detect_uniform(&samples),
            self.detect_power_law(&samples),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn name(&self) -> &str {
        "distribution"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(values: &[f64]) -> Vec<RawValue> {
        values.iter().copied().map(RawValue::from).collect()
    }

    fn subtypes(patterns: &[Pattern]) -> Vec<&str> {
        patterns.iter().map(|p| p.subtype.as_str()).collect()
    }

    #[test]
    fn test_uniform_detected() {
        let values: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let patterns = DistributionDetector::new().detect(&raw(&values), DataType::Numeric);
        assert!(subtypes(&patterns).contains(&"uniform"));
    }

    #[test]
    fn test_normal_shape_detected() {
        // Binomial(12, 0.5) frequencies: skewness 0, excess kurtosis -1/6.
        let weights = [1, 12, 66, 220, 495, 792, 924, 792, 495, 220, 66, 12, 1];
        let values: Vec<f64> = weights
            .iter()
            .enumerate()
            .flat_map(|(k, &w)| std::iter::repeat(k as f64).take(w / 4 + 1))
            .collect();

        let patterns = DistributionDetector::new().detect(&raw(&values), DataType::Numeric);
        let normal = patterns
            .iter()
            .find(|p| p.subtype == "normal")
            .expect("normal");
        assert_eq!(normal.confidence, 0.8);
    }

    #[test]
    fn test_skewed_not_uniform() {
        let mut values = vec![1.0; 90];
        values.extend((0..10).map(|i| 100.0 + i as f64));
        let patterns = DistributionDetector::new().detect(&raw(&values), DataType::Numeric);
        assert!(!subtypes(&patterns).contains(&"uniform"));
        assert!(!subtypes(&patterns).contains(&"normal"));
    }

    #[test]
    fn test_power_law_requires_distinct_points() {
        let few = vec![1.0, 2.0, 3.0, 4.0].repeat(10);
        let patterns = DistributionDetector::new().detect(&raw(&few), DataType::Numeric);
        assert!(!subtypes(&patterns).contains(&"power_law"));

        let mut heavy = vec![1.0; 20];
        heavy.extend(vec![2.0; 8]);
        heavy.extend(vec![4.0; 4]);
        heavy.extend(vec![8.0; 2]);
        heavy.push(16.0);
        let patterns = DistributionDetector::new().detect(&raw(&heavy), DataType::Numeric);
        let power = patterns
            .iter()
            .find(|p| p.subtype == "power_law")
            .expect("power law");
        assert_eq!(power.confidence, 0.7);
        assert!(power.parameter_f64("log_log_slope").unwrap() < 0.0);
    }

    #[test]
    fn test_below_min_samples() {
        let values: Vec<f64> = (0..29).map(|i| i as f64).collect();
        assert!(DistributionDetector::new()
            .detect(&raw(&values), DataType::Numeric)
            .is_empty());
    }

    #[test]
    fn test_overflowing_samples_not_normal() {
        let mut values = vec![1e308; 29];
        values.push(1.5e308);

        let patterns = DistributionDetector::new().detect(&raw(&values), DataType::Numeric);
        assert!(!subtypes(&patterns).contains(&"normal"));
    }

    #[test]
    fn test_small_magnitude_normal_shape() {
        let weights = [1, 12, 66, 220, 495, 792, 924, 792, 495, 220, 66, 12, 1];
        let values: Vec<f64> = weights
            .iter()
            .enumerate()
            .flat_map(|(k, &w)| std::iter::repeat(k as f64 * 1e-12).take(w / 4 + 1))
            .collect();

        let patterns = DistributionDetector::new().detect(&raw(&values), DataType::Numeric);
        assert!(subtypes(&patterns).contains(&"normal"));
    }
}
