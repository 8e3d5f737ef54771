//! Input model consumed by the discovery engine.
//!
//! Schemas and attributes are produced by an upstream profiling step; the
//! engine only reads them. Sampled values arrive as [`RawValue`]s.

pub mod value;

use serde::{Deserialize, Serialize};

pub use value::{numeric_values, string_values, RawValue};

/// Declared data type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    String,
    Numeric,
    Boolean,
    Timestamp,
    Json,
    Array,
    Unknown,
}

impl DataType {
    /// Get the type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Numeric => "numeric",
            DataType::Boolean => "boolean",
            DataType::Timestamp => "timestamp",
            DataType::Json => "json",
            DataType::Array => "array",
            DataType::Unknown => "unknown",
        }
    }
}

/// Semantic meaning assigned to an attribute by the profiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    Identifier,
    Email,
    Url,
    Ip,
    Timestamp,
    Duration,
    Count,
    Currency,
    Percentage,
    Category,
    Text,
    Unknown,
}

impl Default for SemanticType {
    fn default() -> Self {
        Self::Unknown
    }
}

/// Distinct-value statistics for an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Cardinality {
    /// Number of distinct values observed
    pub unique: u64,
    /// Number of values observed
    pub total: u64,
    /// `unique / total`, 0.0 when nothing was observed
    pub ratio: f64,
    /// Whether the attribute is considered high-cardinality
    pub is_high_cardinality: bool,
}

impl Cardinality {
    /// Builds cardinality statistics from raw counts.
    ///
    /// An attribute is high-cardinality when its distinct ratio exceeds `high_ratio`.
    pub fn from_counts(unique: u64, total: u64, high_ratio: f64) -> Self {
        let ratio = if total == 0 {
            0.0
        } else {
            unique.min(total) as f64 / total as f64
        };
        Self {
            unique,
            total,
            ratio,
            is_high_cardinality: total > 0 && ratio > high_ratio,
        }
    }
}

/// A typed field of a discovered event type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub data_type: DataType,
    #[serde(default)]
    pub semantic_type: SemanticType,
    #[serde(default)]
    pub cardinality: Cardinality,
    /// Aligned numeric samples, used only by sampled correlation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub samples: Vec<f64>,
}

impl Attribute {
    /// Creates an attribute with unknown semantics and empty cardinality.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            semantic_type: SemanticType::Unknown,
            cardinality: Cardinality::default(),
            samples: Vec::new(),
        }
    }

    pub fn with_semantic_type(mut self, semantic_type: SemanticType) -> Self {
        self.semantic_type = semantic_type;
        self
    }

    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = cardinality;
        self
    }

    pub fn with_samples(mut self, samples: Vec<f64>) -> Self {
        self.samples = samples;
        self
    }

    /// True for timestamp-typed attributes or an attribute literally named "timestamp".
    pub fn is_temporal(&self) -> bool {
        self.data_type == DataType::Timestamp || self.name.eq_ignore_ascii_case("timestamp")
    }

    pub fn is_identifier(&self) -> bool {
        self.semantic_type == SemanticType::Identifier
    }
}

/// A discovered event type and its ordered attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

impl Schema {
    /// Creates a schema whose event type equals its name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            event_type: name.clone(),
            name,
            attributes: Vec::new(),
        }
    }

    pub fn with_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// First temporal attribute, if any.
    pub fn temporal_attribute(&self) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.is_temporal())
    }

    pub fn numeric_attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes
            .iter()
            .filter(|a| a.data_type == DataType::Numeric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cardinality_from_counts() {
        let high = Cardinality::from_counts(950, 1000, 0.5);
        assert!(high.is_high_cardinality);
        assert!((high.ratio - 0.95).abs() < 1e-12);

        let low = Cardinality::from_counts(3, 1000, 0.5);
        assert!(!low.is_high_cardinality);

        let empty = Cardinality::from_counts(0, 0, 0.5);
        assert_eq!(empty.ratio, 0.0);
        assert!(!empty.is_high_cardinality);
    }

    #[test]
    fn test_temporal_attribute_detection() {
        let schema = Schema::new("Transaction")
            .with_attribute(Attribute::new("duration", DataType::Numeric))
            .with_attribute(Attribute::new("timestamp", DataType::Numeric));

        assert_eq!(schema.temporal_attribute().unwrap().name, "timestamp");

        let schema = Schema::new("Span").with_attribute(Attribute::new("start", DataType::Timestamp));
        assert_eq!(schema.temporal_attribute().unwrap().name, "start");
    }

    #[test]
    fn test_schema_deserializes_with_defaults() {
        let schema: Schema = serde_json::from_str(
            r#"{"name": "Host", "attributes": [{"name": "hostname", "data_type": "string"}]}"#,
        )
        .unwrap();

        assert_eq!(schema.attributes.len(), 1);
        assert_eq!(schema.attributes[0].semantic_type, SemanticType::Unknown);
        assert!(schema.attributes[0].samples.is_empty());
    }
}
