//! String format detection.
//!
//! Each value is classified against a fixed set of cheap structural checks.
//! A format is reported when it matches at least `match_threshold` of the
//! string samples; several formats may clear the threshold together.

use serde::{Deserialize, Serialize};

use super::{Pattern, PatternDetector, PatternEvidence, PatternType};
use crate::model::{string_values, DataType, RawValue};

/// Recognised string formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StringFormat {
    Email,
    Url,
    Ipv4,
    Uuid,
    Json,
    Timestamp,
}

impl StringFormat {
    pub const ALL: [StringFormat; 6] = [
        StringFormat::Email,
        StringFormat::Url,
        StringFormat::Ipv4,
        StringFormat::Uuid,
        StringFormat::Json,
        StringFormat::Timestamp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StringFormat::Email => "email",
            StringFormat::Url => "url",
            StringFormat::Ipv4 => "ipv4",
            StringFormat::Uuid => "uuid",
            StringFormat::Json => "json",
            StringFormat::Timestamp => "timestamp",
        }
    }

    /// Tests a single value against this format.
    pub fn matches(&self, value: &str) -> bool {
        match self {
            StringFormat::Email => value.contains('@') && value.contains('.'),
            StringFormat::Url => value.starts_with("http://") || value.starts_with("https://"),
            StringFormat::Ipv4 => is_ipv4(value),
            StringFormat::Uuid => is_uuid(value),
            StringFormat::Json => {
                (value.starts_with('{') && value.ends_with('}'))
                    || (value.starts_with('[') && value.ends_with(']'))
            }
            StringFormat::Timestamp => is_timestamp(value),
        }
    }
}

fn is_ipv4(value: &str) -> bool {
    let octets: Vec<&str> = value.split('.').collect();
    octets.len() == 4
        && octets
            .iter()
            .all(|o| !o.is_empty() && o.len() <= 3 && o.bytes().all(|b| b.is_ascii_digit()))
}

fn is_uuid(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 36
        && bytes.iter().enumerate().all(|(i, b)| match i {
            8 | 13 | 18 | 23 => *b == b'-',
            _ => *b != b'-',
        })
}

/// Date-time text with both a dash and a colon, or epoch seconds/millis.
fn is_timestamp(value: &str) -> bool {
    if value.contains('-') && value.contains(':') {
        return true;
    }
    matches!(value.len(), 10 | 13) && value.bytes().all(|b| b.is_ascii_digit())
}

/// Detects well-known string formats by majority vote.
#[derive(Debug, Clone)]
pub struct FormatDetector {
    min_samples: usize,
    match_threshold: f64,
}

impl Default for FormatDetector {
    fn default() -> Self {
        Self {
            min_samples: 5,
            match_threshold: 0.8,
        }
    }
}

impl FormatDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum number of string samples
    pub fn min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples;
        self
    }

    /// Set the fraction of samples a format must match
    pub fn match_threshold(mut self, threshold: f64) -> Self {
        self.match_threshold = threshold.clamp(0.0, 1.0);
        self
    }
}

impl PatternDetector for FormatDetector {
    fn detect(&self, values: &[RawValue], data_type: DataType) -> Vec<Pattern> {
        if data_type != DataType::String {
            return Vec::new();
        }

        let samples = string_values(values);
        let total = samples.len();
        if total < self.min_samples || total == 0 {
            return Vec::new();
        }

        StringFormat::ALL
            .iter()
            .filter_map(|format| {
                let match_count = samples.iter().filter(|s| format.matches(s)).count();
                let ratio = match_count as f64 / total as f64;
                (ratio >= self.match_threshold).then(|| {
                    Pattern::new(
                        PatternType::Format,
                        format.as_str(),
                        ratio,
                        format!(
                            "{match_count} of {total} values look like {}",
                            format.as_str()
                        ),
                        PatternEvidence::Format {
                            format: *format,
                            match_count,
                            total,
                        },
                    )
                })
            })
            .collect()
    }

    fn name(&self) -> &str {
        "format"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(values: &[&str]) -> Vec<RawValue> {
        values.iter().map(|v| RawValue::from(*v)).collect()
    }

    #[test]
    fn test_email_batch() {
        let values = raw(&[
            "alice@example.com",
            "bob@example.org",
            "carol@test.io",
            "dave@corp.net",
            "erin@mail.dev",
        ]);
        let patterns = FormatDetector::new().detect(&values, DataType::String);

        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].subtype, "email");
        assert_eq!(patterns[0].confidence, 1.0);
    }

    #[test]
    fn test_mixed_batch_below_threshold() {
        let values = raw(&[
            "alice@example.com",
            "https://example.com",
            "10.0.0.1",
            "plain text",
            "{\"a\": 1}",
        ]);
        assert!(FormatDetector::new()
            .detect(&values, DataType::String)
            .is_empty());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let values = raw(&[
            "https://a.io",
            "https://b.io",
            "http://c.io",
            "https://d.io",
            "not a url",
        ]);
        let patterns = FormatDetector::new().detect(&values, DataType::String);
        let url = patterns.iter().find(|p| p.subtype == "url").expect("url");
        assert!((url.confidence - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_single_value_classifiers() {
        assert!(StringFormat::Ipv4.matches("192.168.1.10"));
        assert!(!StringFormat::Ipv4.matches("192.168.1"));
        assert!(!StringFormat::Ipv4.matches("1921.168.1.1"));

        assert!(StringFormat::Uuid.matches("123e4567-e89b-12d3-a456-426614174000"));
        assert!(!StringFormat::Uuid.matches("123e4567e89b12d3a456426614174000"));

        assert!(StringFormat::Json.matches("{\"k\": 1}"));
        assert!(StringFormat::Json.matches("[1, 2]"));

        assert!(StringFormat::Timestamp.matches("2024-01-15T10:30:00Z"));
        assert!(StringFormat::Timestamp.matches("1700000000"));
        assert!(StringFormat::Timestamp.matches("1700000000000"));
        assert!(!StringFormat::Timestamp.matches("12345"));
    }

    #[test]
    fn test_multiple_formats_reported() {
        // URLs with embedded timestamps satisfy both url and timestamp checks.
        let values = raw(&[
            "https://logs.io/2024-01-01T00:00",
            "https://logs.io/2024-01-02T00:00",
            "https://logs.io/2024-01-03T00:00",
            "https://logs.io/2024-01-04T00:00",
            "https://logs.io/2024-01-05T00:00",
        ]);
        let patterns = FormatDetector::new().detect(&values, DataType::String);
        let subtypes: Vec<&str> = patterns.iter().map(|p| p.subtype.as_str()).collect();
        assert!(subtypes.contains(&"url"));
        assert!(subtypes.contains(&"timestamp"));
    }

    #[test]
    fn test_below_min_samples() {
        let values = raw(&["a@b.com", "c@d.com", "e@f.com", "g@h.com"]);
        assert!(FormatDetector::new()
            .detect(&values, DataType::String)
            .is_empty());
    }
}
