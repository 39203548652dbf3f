//! Runtime options and tracing setup.
//!
//! [`RuntimeOptions`] controls how the application is assembled. Every field
//! has a default, so a partial JSON document is enough:
//!
//! ```
//! use ferrous_mvc::RuntimeOptions;
//!
//! let options = RuntimeOptions::from_json_str(r#"{ "synthesize_head": true }"#).unwrap();
//! assert!(options.synthesize_head);
//! assert!(options.validate_on_build);
//! assert_eq!(options.log_filter, "info");
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use crate::error::ConfigError;

/// Application-wide switches read at build time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeOptions {
    /// Append a HEAD route for every GET route.
    pub synthesize_head: bool,
    /// Resolve every routed controller once before serving.
    pub validate_on_build: bool,
    /// Log a warning for every route shadowed by an earlier one.
    pub warn_on_route_overlap: bool,
    /// Include error messages in 500 bodies.
    pub expose_error_details: bool,
    /// `tracing` filter directive used by [`init_tracing`] when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            synthesize_head: false,
            validate_on_build: true,
            warn_on_route_overlap: true,
            expose_error_details: false,
            log_filter: "info".to_string(),
        }
    }
}

impl RuntimeOptions {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        Ok(serde_json::from_value(value)?)
    }

    /// The effective filter: `RUST_LOG` when set and valid, else `log_filter`.
    pub fn env_filter(&self) -> Result<EnvFilter, ConfigError> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        EnvFilter::try_new(&self.log_filter).map_err(|e| ConfigError::LogFilter {
            filter: self.log_filter.clone(),
            reason: e.to_string(),
        })
    }
}

/// Installs a global `fmt` subscriber filtered by [`RuntimeOptions::env_filter`].
///
/// Fails if the filter is invalid or a global subscriber is already set.
pub fn init_tracing(options: &RuntimeOptions) -> Result<(), ConfigError> {
    let filter = options.env_filter()?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| ConfigError::Subscriber(e.to_string()))
}
