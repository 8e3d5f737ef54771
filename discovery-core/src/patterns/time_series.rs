//! Time-series detection: linear trend, seasonality and outliers.
//!
//! Values are treated as an evenly spaced series in sample order.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::stats;
use super::{Pattern, PatternDetector, PatternEvidence, PatternType, TrendDirection};
use crate::model::{numeric_values, DataType, RawValue};

/// Outlier detection method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyMethod {
    /// Flag values whose z-score exceeds the threshold
    ZScore,
    /// Flag values outside Tukey's fences (`q1 - k*IQR`, `q3 + k*IQR`)
    Iqr,
}

impl AnomalyMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyMethod::ZScore => "z_score",
            AnomalyMethod::Iqr => "iqr",
        }
    }
}

/// Configuration for the time-series detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeriesConfig {
    /// Minimum numeric samples required (default: 10)
    pub min_samples: usize,
    /// R² a fit must exceed to report a trend (default: 0.5)
    pub trend_r_squared: f64,
    /// Autocorrelation a lag must exceed to report seasonality (default: 0.7)
    pub seasonality_threshold: f64,
    /// Largest lag examined (default: 100)
    pub max_lag: usize,
    /// Outlier detection method (default: z-score)
    pub anomaly_method: AnomalyMethod,
    /// |z| above which a value is an outlier (default: 3.0)
    pub z_threshold: f64,
    /// IQR fence multiplier (default: 1.5)
    pub iqr_multiplier: f64,
    /// Confidence assigned to anomaly patterns (default: 0.95)
    pub anomaly_confidence: f64,
}

impl Default for TimeSeriesConfig {
    fn default() -> Self {
        Self {
            min_samples: 10,
            trend_r_squared: 0.5,
            seasonality_threshold: 0.7,
            max_lag: 100,
            anomaly_method: AnomalyMethod::ZScore,
            z_threshold: 3.0,
            iqr_multiplier: 1.5,
            anomaly_confidence: 0.95,
        }
    }
}

/// Detects trends, seasonality and anomalies in numeric series.
#[derive(Debug, Clone, Default)]
pub struct TimeSeriesDetector {
    config: TimeSeriesConfig,
}

impl TimeSeriesDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TimeSeriesConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TimeSeriesConfig {
        &self.config
    }

    fn detect_trend(&self, values: &[f64]) -> Option<Pattern> {
        let fit = stats::linear_regression(values)?;
        if fit.r_squared.abs() <= self.config.trend_r_squared || fit.slope == 0.0 {
            return None;
        }

        let direction = if fit.slope > 0.0 {
            TrendDirection::Increasing
        } else {
            TrendDirection::Decreasing
        };

        Some(Pattern::new(
            PatternType::Trend,
            "linear",
            fit.r_squared.abs(),
            format!(
                "{} linear trend (slope {:.4}, R² {:.3})",
                match direction {
                    TrendDirection::Increasing => "Increasing",
                    TrendDirection::Decreasing => "Decreasing",
                },
                fit.slope,
                fit.r_squared
            ),
            PatternEvidence::Trend {
                slope: fit.slope,
                intercept: fit.intercept,
                r_squared: fit.r_squared,
                direction,
            },
        ))
    }

    fn detect_seasonality(&self, values: &[f64]) -> Option<Pattern> {
        let max_lag = (values.len() / 3).min(self.config.max_lag);

        let mut best: Option<(usize, f64)> = None;
        for lag in 2..=max_lag {
            if let Some(acf) = stats::autocorrelation(values, lag) {
                if best.map_or(true, |(_, b)| acf > b) {
                    best = Some((lag, acf));
                }
            }
        }

        let (period, acf) = best?;
        if acf <= self.config.seasonality_threshold {
            return None;
        }

        Some(Pattern::new(
            PatternType::Seasonal,
            "periodic",
            acf,
            format!("Repeats every {period} samples (autocorrelation {acf:.3})"),
            PatternEvidence::Seasonal {
                period,
                autocorrelation: acf,
            },
        ))
    }

    fn detect_anomalies(&self, values: &[f64]) -> Option<Pattern> {
        let (lower, upper) = match self.config.anomaly_method {
            AnomalyMethod::ZScore => {
                let m = stats::moments(values)?;
                let spread = self.config.z_threshold * m.std_dev;
                (m.mean - spread, m.mean + spread)
            }
            AnomalyMethod::Iqr => {
                let mut sorted = values.to_vec();
                sorted.sort_by(f64::total_cmp);
                let q1 = stats::quantile_sorted(&sorted, 0.25)?;
                let q3 = stats::quantile_sorted(&sorted, 0.75)?;
                let iqr = q3 - q1;
                if !iqr.is_finite() || stats::is_negligible(iqr, q1.abs().max(q3.abs())) {
                    return None;
                }
                let spread = self.config.iqr_multiplier * iqr;
                (q1 - spread, q3 + spread)
            }
        };

        let (indices, flagged): (Vec<usize>, Vec<f64>) = values
            .iter()
            .enumerate()
            .filter(|(_, v)| **v < lower || **v > upper)
            .map(|(i, v)| (i, *v))
            .unzip();

        if indices.is_empty() {
            return None;
        }

        debug!(
            method = self.config.anomaly_method.as_str(),
            anomaly_count = indices.len(),
            "Flagged outliers"
        );

        Some(Pattern::new(
            PatternType::Anomaly,
            "outlier",
            self.config.anomaly_confidence,
            format!(
                "{} of {} values fall outside [{lower:.3}, {upper:.3}]",
                indices.len(),
                values.len()
            ),
            PatternEvidence::Anomaly {
                method: self.config.anomaly_method,
                indices,
                values: flagged,
                lower_bound: lower,
                upper_bound: upper,
            },
        ))
    }
}

impl PatternDetector for TimeSeriesDetector {
    fn detect(&self, values: &[RawValue], data_type: DataType) -> Vec<Pattern> {
        if data_type != DataType::Numeric {
            return Vec::new();
        }

        let series = numeric_values(values);
        if series.len() < self.config.min_samples {
            return Vec::new();
        }

        [
            self.detect_trend(&series),
            self.detect_seasonality(&series),
            self.detect_anomalies(&series),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn name(&self) -> &str {
        "time_series"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(values: &[f64]) -> Vec<RawValue> {
        values.iter().copied().map(RawValue::from).collect()
    }

    fn find(patterns: &[Pattern], pattern_type: PatternType) -> Option<&Pattern> {
        patterns.iter().find(|p| p.pattern_type == pattern_type)
    }

    #[test]
    fn test_increasing_trend() {
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        let patterns = TimeSeriesDetector::new().detect(&raw(&values), DataType::Numeric);

        let trend = find(&patterns, PatternType::Trend).expect("trend");
        assert_eq!(trend.parameters()["direction"], "increasing");
        assert!(trend.parameter_f64("r_squared").unwrap() > 0.5);
    }

    #[test]
    fn test_decreasing_trend() {
        let values: Vec<f64> = (0..20).map(|i| 100.0 - 3.0 * i as f64).collect();
        let patterns = TimeSeriesDetector::new().detect(&raw(&values), DataType::Numeric);

        let trend = find(&patterns, PatternType::Trend).expect("trend");
        assert_eq!(trend.parameters()["direction"], "decreasing");
    }

    #[test]
    fn test_below_min_samples() {
        let values: Vec<f64> = (1..=9).map(f64::from).collect();
        assert!(TimeSeriesDetector::new()
            .detect(&raw(&values), DataType::Numeric)
            .is_empty());
    }

    #[test]
    fn test_non_numeric_type_ignored() {
        let values: Vec<f64> = (1..=20).map(f64::from).collect();
        assert!(TimeSeriesDetector::new()
            .detect(&raw(&values), DataType::String)
            .is_empty());
    }

    #[test]
    fn test_constant_series_reports_nothing() {
        let patterns = TimeSeriesDetector::new().detect(&raw(&[7.0; 30]), DataType::Numeric);
        assert!(patterns.is_empty());
    }

    #[test]
    fn test_seasonality_detected() {
        let values: Vec<f64> = (0..48).map(|i| [10.0, 20.0, 30.0, 20.0][i % 4]).collect();
        let patterns = TimeSeriesDetector::new().detect(&raw(&values), DataType::Numeric);

        let seasonal = find(&patterns, PatternType::Seasonal).expect("seasonal");
        assert_eq!(seasonal.parameters()["period"], 4);
        assert!(seasonal.confidence > 0.7);
    }

    #[test]
    fn test_z_score_anomaly() {
        let mut values: Vec<f64> = (0..29).map(|i| 10.0 + 5.0 * i as f64).collect();
        values.push(500.0);
        let patterns = TimeSeriesDetector::new().detect(&raw(&values), DataType::Numeric);

        let anomaly = find(&patterns, PatternType::Anomaly).expect("anomaly");
        assert_eq!(anomaly.confidence, 0.95);
        assert_eq!(anomaly.parameters()["anomaly_indices"], serde_json::json!([29]));
    }

    #[test]
    fn test_iqr_anomaly() {
        let mut values = vec![10.0, 11.0, 12.0, 10.5, 11.5, 12.5, 10.2, 11.2, 12.2, 11.0];
        values.push(40.0);
        let detector = TimeSeriesDetector::with_config(TimeSeriesConfig {
            anomaly_method: AnomalyMethod::Iqr,
            ..TimeSeriesConfig::default()
        });

        let patterns = detector.detect(&raw(&values), DataType::Numeric);
        let anomaly = find(&patterns, PatternType::Anomaly).expect("anomaly");
        assert_eq!(anomaly.parameters()["method"], "iqr");
        assert_eq!(anomaly.parameter_f64("anomaly_count"), Some(1.0));
    }

    #[test]
    fn test_small_magnitude_trend_detected() {
        let values: Vec<f64> = (1..=20).map(|i| i as f64 * 1e-7).collect();
        let patterns = TimeSeriesDetector::new().detect(&raw(&values), DataType::Numeric);

        let trend = find(&patterns, PatternType::Trend).expect("trend");
        assert_eq!(trend.parameters()["direction"], "increasing");
        assert!(trend.confidence > 0.99);
    }

    #[test]
    fn test_overflowing_series_reports_nothing() {
        let mut values = vec![1e308; 29];
        values.push(1.5e308);

        let patterns = TimeSeriesDetector::new().detect(&raw(&values), DataType::Numeric);
        assert!(patterns.is_empty());
    }
}
