//! Telemetry configuration that trackers and the CLI serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Master switch. When false, trackers accept events and drop them.
    pub enabled: bool,

    /// Whether `DelegationSuccessful` events are forwarded. They dominate
    /// volume on well-delegated apps, so sinks often turn them off.
    pub emit_successful: bool,

    /// Drop events whose descriptor fingerprint was already recorded.
    pub dedupe: bool,

    /// Optional cap on events a recording tracker retains.
    pub max_events: Option<usize>,

    /// Default `tracing` filter directive for the CLI (overridden by `RUST_LOG`).
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            emit_successful: true,
            dedupe: false,
            max_events: None,
            log_level: "info".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `FXDELEG_TELEMETRY_ENABLED`: `true`/`false`
    /// - `FXDELEG_EMIT_SUCCESSFUL`: `true`/`false`
    /// - `FXDELEG_DEDUPE`: `true`/`false`
    /// - `FXDELEG_MAX_EVENTS`: retained event cap
    /// - `FXDELEG_LOG_LEVEL`: default log filter
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Some(v) = env_bool("FXDELEG_TELEMETRY_ENABLED") {
            cfg.enabled = v;
        }

        if let Some(v) = env_bool("FXDELEG_EMIT_SUCCESSFUL") {
            cfg.emit_successful = v;
        }

        if let Some(v) = env_bool("FXDELEG_DEDUPE") {
            cfg.dedupe = v;
        }

        if let Ok(s) = std::env::var("FXDELEG_MAX_EVENTS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.max_events = Some(v);
            }
        }

        if let Ok(s) = std::env::var("FXDELEG_LOG_LEVEL") {
            cfg.log_level = s;
        }

        cfg
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_events == Some(0) {
            return Err(Error::Config("max_events must be positive when set".into()));
        }
        if self.log_level.trim().is_empty() {
            return Err(Error::Config("log_level must not be empty".into()));
        }
        Ok(())
    }
}

/// Partial config, as written in an event file's `config:` block. Only the
/// fields present override the base config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelemetryOverlay {
    pub enabled: Option<bool>,
    pub emit_successful: Option<bool>,
    pub dedupe: Option<bool>,
    pub max_events: Option<usize>,
    pub log_level: Option<String>,
}

impl TelemetryOverlay {
    pub fn apply(&self, cfg: &mut TelemetryConfig) {
        if let Some(v) = self.enabled {
            cfg.enabled = v;
        }
        if let Some(v) = self.emit_successful {
            cfg.emit_successful = v;
        }
        if let Some(v) = self.dedupe {
            cfg.dedupe = v;
        }
        if let Some(v) = self.max_events {
            cfg.max_events = Some(v);
        }
        if let Some(v) = &self.log_level {
            cfg.log_level = v.clone();
        }
    }

    /// Rejects values that would make any base config invalid.
    pub fn validate(&self) -> Result<()> {
        let mut cfg = TelemetryConfig::default();
        self.apply(&mut cfg);
        cfg.validate()
    }
}

fn env_bool(key: &str) -> Option<bool> {
    let s = std::env::var(key).ok()?;
    parse_bool(&s)
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
