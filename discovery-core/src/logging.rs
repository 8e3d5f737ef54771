//! Logging utilities and configuration for the discovery engine.
//!
//! Detail logging inside the hot loops (per-detector and per-pair) is gated
//! by the [`LogConfig`] flags and its base level.

use tracing::Level;

/// Logging configuration for discovery components.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Base log level for discovery components
    pub base_level: Level,
    /// Whether to log each detector's output
    pub log_pattern_details: bool,
    /// Whether to log each schema pair evaluation
    pub log_pair_evaluation: bool,
    /// Maximum length for logged field values (to prevent huge logs)
    pub max_field_length: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            base_level: Level::INFO,
            log_pattern_details: false,
            log_pair_evaluation: false,
            max_field_length: 256,
        }
    }
}

impl LogConfig {
    /// Creates a verbose configuration suitable for debugging.
    pub fn verbose() -> Self {
        Self {
            base_level: Level::DEBUG,
            log_pattern_details: true,
            log_pair_evaluation: true,
            max_field_length: 1024,
        }
    }

    /// Creates a minimal configuration for production with lowest overhead.
    pub fn production() -> Self {
        Self {
            base_level: Level::WARN,
            log_pattern_details: false,
            log_pair_evaluation: false,
            max_field_length: 128,
        }
    }

    /// Creates a balanced configuration suitable for most use cases.
    pub fn balanced() -> Self {
        Self::default()
    }

    /// Per-detector logs need the flag and a base level of at least DEBUG.
    pub fn pattern_details_enabled(&self) -> bool {
        self.log_pattern_details && self.base_level >= Level::DEBUG
    }

    /// Per-pair logs need the flag and a base level of at least DEBUG.
    pub fn pair_evaluation_enabled(&self) -> bool {
        self.log_pair_evaluation && self.base_level >= Level::DEBUG
    }

    /// Truncates a logged value to `max_field_length`.
    pub fn field(&self, value: &str) -> String {
        truncate_field(value, self.max_field_length)
    }
}

/// Macro for conditional per-detector logging.
#[macro_export]
macro_rules! log_pattern {
    ($config:expr, $($arg:tt)*) => {
        if $config.pattern_details_enabled() {
            tracing::debug!($($arg)*);
        }
    };
}

/// Macro for conditional per-pair logging.
#[macro_export]
macro_rules! log_pair {
    ($config:expr, $($arg:tt)*) => {
        if $config.pair_evaluation_enabled() {
            tracing::debug!($($arg)*);
        }
    };
}

/// Truncates a string to the maximum field length if needed.
pub fn truncate_field(value: &str, max_length: usize) -> String {
    if value.len() <= max_length {
        return value.to_string();
    }
    let mut end = max_length;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...(truncated)", &value[..end])
}

/// Utilities for setting up structured logging.
pub mod setup {
    use tracing::Level;

    /// Configuration for the logging subscriber.
    #[derive(Debug, Clone)]
    pub struct LoggingConfig {
        /// Log level for the application
        pub level: Level,
        /// Log level for discovery components specifically
        pub discovery_level: Level,
        /// Whether to use JSON output format
        pub json_format: bool,
        /// Environment filter override
        pub env_filter: Option<String>,
    }

    impl Default for LoggingConfig {
        fn default() -> Self {
            Self {
                level: Level::INFO,
                discovery_level: Level::DEBUG,
                json_format: false,
                env_filter: None,
            }
        }
    }

    impl LoggingConfig {
        /// Creates a configuration for production use.
        pub fn production() -> Self {
            Self {
                level: Level::WARN,
                discovery_level: Level::INFO,
                json_format: true,
                env_filter: None,
            }
        }

        /// Creates a configuration for development use.
        pub fn development() -> Self {
            Self {
                level: Level::DEBUG,
                discovery_level: Level::DEBUG,
                json_format: false,
                env_filter: None,
            }
        }

        pub fn with_level(mut self, level: Level) -> Self {
            self.level = level;
            self
        }

        pub fn with_discovery_level(mut self, level: Level) -> Self {
            self.discovery_level = level;
            self
        }

        pub fn with_json_format(mut self, enabled: bool) -> Self {
            self.json_format = enabled;
            self
        }

        pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
            self.env_filter = Some(filter.into());
            self
        }

        /// Builds the environment filter string.
        pub fn env_filter(&self) -> String {
            if let Some(ref filter) = self.env_filter {
                filter.clone()
            } else {
                format!(
                    "{},discovery_core={}",
                    self.level.as_str().to_lowercase(),
                    self.discovery_level.as_str().to_lowercase()
                )
            }
        }
    }

    /// Initializes the global subscriber. `RUST_LOG` takes precedence over the config.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use discovery_core::logging::setup::{init_logging, LoggingConfig};
    ///
    /// init_logging(LoggingConfig::development().with_json_format(true)).unwrap();
    /// ```
    pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.env_filter()));

        let fmt_layer = if config.json_format {
            tracing_subscriber::fmt::layer().json().boxed()
        } else {
            tracing_subscriber::fmt::layer().boxed()
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;

        Ok(())
    }
}
