//! Statistical pattern detection over a single attribute's sampled values.
//!
//! ## Detectors
//!
//! - **Time series** (`time_series`): linear trend, autocorrelation seasonality, outliers
//! - **Distribution** (`distribution`): normal shape, uniformity, power-law heuristic
//! - **Format** (`format`): email, URL, IPv4, UUID, JSON and timestamp strings
//! - **Sequence** (`sequence`): arithmetic progressions and shared string prefixes
//!
//! Every detector is a pure function of `(values, data_type)`. Input below a
//! detector's minimum sample count produces no pattern of that kind.
//!
//! ## Example
//!
//! ```rust
//! use discovery_core::model::{DataType, RawValue};
//! use discovery_core::patterns::{PatternEngine, PatternType};
//!
//! let values: Vec<RawValue> = [2.0, 4.0, 6.0, 8.0, 10.0].into_iter().map(RawValue::from).collect();
//! let patterns = PatternEngine::new().detect_patterns(&values, DataType::Numeric);
//!
//! assert_eq!(patterns.len(), 1);
//! assert_eq!(patterns[0].pattern_type, PatternType::Sequence);
//! assert_eq!(patterns[0].subtype, "arithmetic");
//! ```

pub mod distribution;
pub mod engine;
pub mod format;
pub mod sequence;
pub mod stats;
pub mod time_series;

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Value};

use crate::model::{DataType, RawValue};

pub use distribution::{DistributionConfig, DistributionDetector};
pub use engine::{PatternEngine, PatternEngineBuilder, PatternEngineConfig};
pub use format::{FormatDetector, StringFormat};
pub use sequence::SequenceDetector;
pub use time_series::{AnomalyMethod, TimeSeriesConfig, TimeSeriesDetector};

/// Kind of pattern a detector reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    Trend,
    Seasonal,
    Anomaly,
    Distribution,
    Format,
    Sequence,
}

impl PatternType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::Trend => "trend",
            PatternType::Seasonal => "seasonal",
            PatternType::Anomaly => "anomaly",
            PatternType::Distribution => "distribution",
            PatternType::Format => "format",
            PatternType::Sequence => "sequence",
        }
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a linear trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Increasing => "increasing",
            TrendDirection::Decreasing => "decreasing",
        }
    }
}

/// Algorithm-specific evidence carried by a pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum PatternEvidence {
    Trend {
        slope: f64,
        intercept: f64,
        r_squared: f64,
        direction: TrendDirection,
    },
    Seasonal {
        period: usize,
        autocorrelation: f64,
    },
    Anomaly {
        method: AnomalyMethod,
        indices: Vec<usize>,
        values: Vec<f64>,
        lower_bound: f64,
        upper_bound: f64,
    },
    NormalShape {
        mean: f64,
        std_dev: f64,
        skewness: f64,
        kurtosis: f64,
    },
    Uniform {
        min: f64,
        max: f64,
        chi_square: f64,
        buckets: usize,
    },
    PowerLaw {
        distinct_points: usize,
        log_log_slope: f64,
    },
    Format {
        format: StringFormat,
        match_count: usize,
        total: usize,
    },
    Arithmetic {
        difference: f64,
        start: f64,
        length: usize,
    },
    Prefix {
        prefix: String,
        count: usize,
    },
}

impl PatternEvidence {
    /// Flattens the evidence into the generic parameter map used on the wire.
    pub fn parameters(&self) -> BTreeMap<String, Value> {
        let pairs: Vec<(&str, Value)> = match self {
            PatternEvidence::Trend {
                slope,
                intercept,
                r_squared,
                direction,
            } => vec![
                ("slope", json!(slope)),
                ("intercept", json!(intercept)),
                ("r_squared", json!(r_squared)),
                ("direction", json!(direction.as_str())),
            ],
            PatternEvidence::Seasonal {
                period,
                autocorrelation,
            } => vec![
                ("period", json!(period)),
                ("autocorrelation", json!(autocorrelation)),
            ],
            PatternEvidence::Anomaly {
                method,
                indices,
                values,
                lower_bound,
                upper_bound,
            } => vec![
                ("method", json!(method.as_str())),
                ("anomaly_indices", json!(indices)),
                ("anomaly_values", json!(values)),
                ("anomaly_count", json!(indices.len())),
                ("lower_bound", json!(lower_bound)),
                ("upper_bound", json!(upper_bound)),
            ],
            PatternEvidence::NormalShape {
                mean,
                std_dev,
                skewness,
                kurtosis,
            } => vec![
                ("mean", json!(mean)),
                ("std_dev", json!(std_dev)),
                ("skewness", json!(skewness)),
                ("kurtosis", json!(kurtosis)),
            ],
            PatternEvidence::Uniform {
                min,
                max,
                chi_square,
                buckets,
            } => vec![
                ("min", json!(min)),
                ("max", json!(max)),
                ("chi_square", json!(chi_square)),
                ("buckets", json!(buckets)),
            ],
            PatternEvidence::PowerLaw {
                distinct_points,
                log_log_slope,
            } => vec![
                ("distinct_points", json!(distinct_points)),
                ("log_log_slope", json!(log_log_slope)),
            ],
            PatternEvidence::Format {
                format,
                match_count,
                total,
            } => vec![
                ("format", json!(format.as_str())),
                ("match_count", json!(match_count)),
                ("total", json!(total)),
            ],
            PatternEvidence::Arithmetic {
                difference,
                start,
                length,
            } => vec![
                ("difference", json!(difference)),
                ("start", json!(start)),
                ("length", json!(length)),
            ],
            PatternEvidence::Prefix { prefix, count } => {
                vec![("prefix", json!(prefix)), ("count", json!(count))]
            }
        };

        pairs
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect()
    }
}

/// A detected pattern with its confidence and evidence.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub pattern_type: PatternType,
    /// Free-form qualifier such as "arithmetic", "email" or "normal"
    pub subtype: String,
    /// Confidence score (0.0 to 1.0)
    pub confidence: f64,
    pub description: String,
    pub evidence: PatternEvidence,
}

impl Pattern {
    /// Creates a pattern, clamping the confidence into `[0, 1]`. A NaN or
    /// infinite confidence becomes 0.
    pub fn new(
        pattern_type: PatternType,
        subtype: impl Into<String>,
        confidence: f64,
        description: impl Into<String>,
        evidence: PatternEvidence,
    ) -> Self {
        Self {
            pattern_type,
            subtype: subtype.into(),
            confidence: clamp_confidence(confidence),
            description: description.into(),
            evidence,
        }
    }

    pub fn parameters(&self) -> BTreeMap<String, Value> {
        self.evidence.parameters()
    }

    /// Looks up a single numeric parameter.
    pub fn parameter_f64(&self, key: &str) -> Option<f64> {
        self.parameters().get(key).and_then(Value::as_f64)
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Pattern", 5)?;
        state.serialize_field("type", &self.pattern_type)?;
        state.serialize_field("subtype", &self.subtype)?;
        state.serialize_field("confidence", &self.confidence)?;
        state.serialize_field("description", &self.description)?;
        state.serialize_field("parameters", &self.parameters())?;
        state.end()
    }
}

/// Clamps a confidence into `[0, 1]`, mapping NaN and infinities to 0.
pub(crate) fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_finite() {
        confidence.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// A pattern detector that can be registered with the [`PatternEngine`].
///
/// Implementations must be pure: identical input yields identical output and
/// insufficient or unusable data yields an empty vector.
pub trait PatternDetector: Send + Sync {
    /// Detect patterns in the given values
    fn detect(&self, values: &[RawValue], data_type: DataType) -> Vec<Pattern>;

    /// Get a human-readable name for this detector
    fn name(&self) -> &str;
}
