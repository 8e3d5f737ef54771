//! Error types for the discovery engine.
//!
//! Pattern detection is infallible by construction: insufficient samples,
//! unconvertible values and degenerate statistics all resolve to "no pattern".
//! Errors only surface from relationship mining, where schema pairs are
//! evaluated concurrently and the caller chooses how failures are aggregated.

use thiserror::Error;

/// Result type for discovery operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// Errors that can occur while mining relationships.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// Invalid configuration or parameters.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A schema handed to the miner cannot be evaluated.
    #[error("Invalid schema '{schema}': {message}")]
    InvalidSchema { schema: String, message: String },

    /// Evaluation of a single schema pair failed.
    #[error("Evaluation of '{source_schema}' and '{target_schema}' failed: {message}")]
    PairEvaluation {
        source_schema: String,
        target_schema: String,
        message: String,
    },

    /// A worker task terminated abnormally.
    #[error("Worker failure: {0}")]
    Worker(String),

    /// The run was cancelled before every pair was evaluated.
    #[error("Relationship mining cancelled after {completed} of {total} pairs")]
    Cancelled { completed: usize, total: usize },

    /// Several pair evaluations failed.
    #[error("{} schema pairs failed, first: {}", .0.len(), first_message(.0))]
    Multiple(Vec<DiscoveryError>),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

fn first_message(errors: &[DiscoveryError]) -> String {
    errors
        .first()
        .map(|e| e.to_string())
        .unwrap_or_else(|| "none".to_string())
}

impl DiscoveryError {
    /// Creates an invalid configuration error with the given message.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Creates an invalid schema error.
    pub fn invalid_schema(schema: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::InvalidSchema {
            schema: schema.into(),
            message: msg.into(),
        }
    }

    /// Creates a pair evaluation error.
    pub fn pair_evaluation(
        source_schema: impl Into<String>,
        target_schema: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::PairEvaluation {
            source_schema: source_schema.into(),
            target_schema: target_schema.into(),
            message: msg.into(),
        }
    }

    /// Creates a worker error with the given message.
    pub fn worker(msg: impl Into<String>) -> Self {
        Self::Worker(msg.into())
    }

    /// Collapses a list of errors: a single error is returned as-is.
    pub fn aggregate(mut errors: Vec<DiscoveryError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Self::Multiple(errors)),
        }
    }

    /// Returns true if this error represents a cancelled run.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Converts serde_json errors to DiscoveryError.
impl From<serde_json::Error> for DiscoveryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_empty_and_single() {
        assert!(DiscoveryError::aggregate(Vec::new()).is_none());

        let single = DiscoveryError::aggregate(vec![DiscoveryError::worker("boom")]).unwrap();
        assert!(matches!(single, DiscoveryError::Worker(_)));
    }

    #[test]
    fn test_aggregate_multiple_message() {
        let err = DiscoveryError::aggregate(vec![
            DiscoveryError::invalid_schema("Transaction", "duplicate schema name"),
            DiscoveryError::worker("panicked"),
        ])
        .unwrap();

        let message = err.to_string();
        assert!(message.starts_with("2 schema pairs failed"));
        assert!(message.contains("Transaction"));
    }

    #[test]
    fn test_cancelled_display() {
        let err = DiscoveryError::Cancelled {
            completed: 3,
            total: 10,
        };
        assert!(err.is_cancelled());
        assert_eq!(
            err.to_string(),
            "Relationship mining cancelled after 3 of 10 pairs"
        );
    }
}
