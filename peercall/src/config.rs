//! Engine configuration.
//!
//! Settings can be set in code (usually through
//! [`EngineBuilder`](crate::engine::EngineBuilder)) or loaded from a JSON
//! document where durations are given in milliseconds:
//!
//! ```json
//! { "default_timeout_ms": 5000, "sweep_interval_ms": 50, "engine_path": "/root/net" }
//! ```
//!
//! Missing keys keep their default.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default deadline for requests that don't set their own.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default period of the timeout sweeper.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_millis(100);

/// Default path of the engine in the target namespace.
pub const DEFAULT_ENGINE_PATH: &str = "/root/peercall";

/// Settings of a [`CorrelationEngine`](crate::engine::CorrelationEngine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Timeout applied when a request doesn't specify one. Zero disables it.
    #[serde(rename = "default_timeout_ms", with = "millis")]
    pub default_timeout: Duration,

    /// How often overdue requests are released.
    #[serde(rename = "sweep_interval_ms", with = "millis")]
    pub sweep_interval: Duration,

    /// Path under which the engine itself would be resolved. Invocations
    /// addressed here are rejected.
    pub engine_path: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_TIMEOUT,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            engine_path: DEFAULT_ENGINE_PATH.to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the settings can drive an engine.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sweep_interval.is_zero() {
            return Err(ConfigError::ZeroSweepInterval);
        }
        if self.engine_path.is_empty() {
            return Err(ConfigError::EmptyEnginePath);
        }
        Ok(())
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
