//! Tagged sampled values and coercion into typed working sets.
//!
//! Detectors work on `f64` or `&str` slices. Values that cannot be coerced to
//! the requested type are skipped rather than treated as errors.

use arrow::array::{
    Array, BooleanArray, Float32Array, Float64Array, Int16Array, Int32Array, Int64Array,
    Int8Array, LargeStringArray, StringArray, StringViewArray, TimestampMicrosecondArray,
    TimestampMillisecondArray, TimestampNanosecondArray, TimestampSecondArray, UInt16Array,
    UInt32Array, UInt64Array, UInt8Array,
};
use arrow::datatypes::{DataType as ArrowDataType, TimeUnit};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single sampled value as delivered by the sampling layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RawValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    Json(serde_json::Value),
}

impl RawValue {
    /// Numeric view of the value. Non-finite floats yield `None`.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            RawValue::Integer(v) => *v as f64,
            RawValue::Float(v) => *v,
            RawValue::Json(serde_json::Value::Number(n)) => n.as_f64()?,
            _ => return None,
        };
        value.is_finite().then_some(value)
    }

    /// String view of the value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RawValue::String(s) => Some(s.as_str()),
            RawValue::Json(serde_json::Value::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null | RawValue::Json(serde_json::Value::Null))
    }

    /// Converts every row of an Arrow array. Unsupported column types yield `Null`s.
    pub fn from_arrow_array(array: &dyn Array) -> Vec<RawValue> {
        (0..array.len())
            .map(|row| Self::from_arrow_row(array, row))
            .collect()
    }

    fn from_arrow_row(array: &dyn Array, row: usize) -> RawValue {
        if array.is_null(row) {
            return RawValue::Null;
        }

        macro_rules! downcast {
            ($ty:ty, $variant:expr) => {
                match array.as_any().downcast_ref::<$ty>() {
                    Some(arr) => $variant(arr.value(row)),
                    None => RawValue::Null,
                }
            };
        }

        match array.data_type() {
            ArrowDataType::Boolean => downcast!(BooleanArray, RawValue::Bool),
            ArrowDataType::Int8 => downcast!(Int8Array, |v: i8| RawValue::Integer(v.into())),
            ArrowDataType::Int16 => downcast!(Int16Array, |v: i16| RawValue::Integer(v.into())),
            ArrowDataType::Int32 => downcast!(Int32Array, |v: i32| RawValue::Integer(v.into())),
            ArrowDataType::Int64 => downcast!(Int64Array, RawValue::Integer),
            ArrowDataType::UInt8 => downcast!(UInt8Array, |v: u8| RawValue::Integer(v.into())),
            ArrowDataType::UInt16 => downcast!(UInt16Array, |v: u16| RawValue::Integer(v.into())),
            ArrowDataType::UInt32 => downcast!(UInt32Array, |v: u32| RawValue::Integer(v.into())),
            ArrowDataType::UInt64 => downcast!(UInt64Array, |v: u64| match i64::try_from(v) {
                Ok(v) => RawValue::Integer(v),
                Err(_) => RawValue::Float(v as f64),
            }),
            ArrowDataType::Float32 => downcast!(Float32Array, |v: f32| RawValue::Float(v.into())),
            ArrowDataType::Float64 => downcast!(Float64Array, RawValue::Float),
            ArrowDataType::Utf8 => downcast!(StringArray, |v: &str| RawValue::String(v.to_string())),
            ArrowDataType::LargeUtf8 => {
                downcast!(LargeStringArray, |v: &str| RawValue::String(v.to_string()))
            }
            ArrowDataType::Utf8View => {
                downcast!(StringViewArray, |v: &str| RawValue::String(v.to_string()))
            }
            ArrowDataType::Timestamp(TimeUnit::Second, _) => {
                downcast!(TimestampSecondArray, |v: i64| timestamp(
                    DateTime::from_timestamp(v, 0)
                ))
            }
            ArrowDataType::Timestamp(TimeUnit::Millisecond, _) => {
                downcast!(TimestampMillisecondArray, |v: i64| timestamp(
                    DateTime::from_timestamp_millis(v)
                ))
            }
            ArrowDataType::Timestamp(TimeUnit::Microsecond, _) => {
                downcast!(TimestampMicrosecondArray, |v: i64| timestamp(
                    DateTime::from_timestamp_micros(v)
                ))
            }
            ArrowDataType::Timestamp(TimeUnit::Nanosecond, _) => {
                downcast!(TimestampNanosecondArray, |v: i64| timestamp(Some(
                    DateTime::from_timestamp_nanos(v)
                )))
            }
            _ => RawValue::Null,
        }
    }
}

fn timestamp(value: Option<DateTime<Utc>>) -> RawValue {
    value.map(RawValue::Timestamp).unwrap_or(RawValue::Null)
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Float(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Integer(value)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Bool(value)
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::String(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::String(value.to_string())
    }
}

impl From<DateTime<Utc>> for RawValue {
    fn from(value: DateTime<Utc>) -> Self {
        RawValue::Timestamp(value)
    }
}

/// Maps JSON scalars onto their native variants; objects and arrays stay `Json`.
impl From<serde_json::Value> for RawValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => RawValue::Null,
            serde_json::Value::Bool(b) => RawValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => RawValue::Integer(i),
                None => n
                    .as_f64()
                    .map(RawValue::Float)
                    .unwrap_or(RawValue::Json(serde_json::Value::Number(n))),
            },
            serde_json::Value::String(s) => RawValue::String(s),
            other => RawValue::Json(other),
        }
    }
}

/// Coerces values into a numeric working set, skipping anything unconvertible.
pub fn numeric_values(values: &[RawValue]) -> Vec<f64> {
    values.iter().filter_map(RawValue::as_f64).collect()
}

/// Coerces values into a string working set, skipping anything unconvertible.
pub fn string_values(values: &[RawValue]) -> Vec<&str> {
    values.iter().filter_map(RawValue::as_str).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_numeric_coercion_skips_unconvertible() {
        let values = vec![
            RawValue::from(1.5),
            RawValue::from(2_i64),
            RawValue::from("3"),
            RawValue::Null,
            RawValue::from(true),
            RawValue::Float(f64::NAN),
            RawValue::Float(f64::INFINITY),
            RawValue::Json(serde_json::json!(4.25)),
        ];

        assert_eq!(numeric_values(&values), vec![1.5, 2.0, 4.25]);
    }

    #[test]
    fn test_string_coercion_skips_unconvertible() {
        let values = vec![
            RawValue::from("a"),
            RawValue::from(7_i64),
            RawValue::Json(serde_json::json!("b")),
            RawValue::Json(serde_json::json!({"k": 1})),
        ];

        assert_eq!(string_values(&values), vec!["a", "b"]);
    }

    #[test]
    fn test_from_json_value() {
        assert_eq!(RawValue::from(serde_json::json!(42)), RawValue::Integer(42));
        assert_eq!(RawValue::from(serde_json::json!(0.5)), RawValue::Float(0.5));
        assert_eq!(RawValue::from(serde_json::json!(null)), RawValue::Null);
        assert!(matches!(
            RawValue::from(serde_json::json!([1, 2])),
            RawValue::Json(_)
        ));
    }

    #[test]
    fn test_from_arrow_array() {
        let ints: Arc<dyn Array> = Arc::new(Int64Array::from(vec![Some(1), None, Some(3)]));
        assert_eq!(
            RawValue::from_arrow_array(ints.as_ref()),
            vec![RawValue::Integer(1), RawValue::Null, RawValue::Integer(3)]
        );

        let strings: Arc<dyn Array> = Arc::new(StringArray::from(vec!["x", "y"]));
        assert_eq!(
            string_values(&RawValue::from_arrow_array(strings.as_ref())),
            vec!["x", "y"]
        );

        let millis: Arc<dyn Array> = Arc::new(TimestampMillisecondArray::from(vec![0_i64]));
        assert!(matches!(
            RawValue::from_arrow_array(millis.as_ref())[0],
            RawValue::Timestamp(_)
        ));
    }
}
