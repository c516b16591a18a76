//! ==============================================================================
//! config.rs - Runtime Configuration Loader
//! ==============================================================================
//!
//! purpose:
//! ```text
//!     defines the schema for `dashboard.toml`.
//!     loads configuration from file or falls back to defaults.
//! ```
//!
//! structure:
//! ```text
//!     - StreamConfig: Where the appliance's /status websocket lives.
//!     - ServerConfig: Whether and where to serve the chart view.
//!     - DisplayConfig: Timezone override for display-adjusted timestamps.
//!     - LoggingConfig: Log level and console readout toggle.
//! ```
//!
//! ==============================================================================

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::decoder::DecodeOptions;
use crate::reconciler::SystemClock;

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    pub stream: StreamConfig,
    pub server: ServerConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct StreamConfig {
    pub url: String,
    /// reject messages without an explicit "update"/"snapshot" type
    pub strict_tags: bool,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,
    pub bind: SocketAddr,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    /// fixed offset from utc in minutes; unset means use the machine timezone
    pub utc_offset_minutes: Option<i32>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub show_samples: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8080/status".to_string(),
            strict_tags: false,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            show_samples: true,
        }
    }
}

impl DashboardConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse config: {}", e))
    }

    /// Load with default fallback
    ///
    /// Logging is not initialised yet when this runs, so outcomes are
    /// returned as notes for the caller to log.
    pub fn load_or_default() -> (Self, Vec<String>) {
        let paths = [
            PathBuf::from("config").join("dashboard.toml"),
            PathBuf::from("..").join("config").join("dashboard.toml"),
        ];

        let mut notes = Vec::new();
        for path in &paths {
            if path.exists() {
                match Self::load(path) {
                    Ok(config) => {
                        notes.push(format!("[CONFIG] Loaded from {}", path.display()));
                        return (config, notes);
                    }
                    Err(e) => {
                        notes.push(format!(
                            "[CONFIG] Warning: Failed to load {}: {}",
                            path.display(),
                            e
                        ));
                    }
                }
            }
        }

        notes.push("[CONFIG] Warning: No config file found - using defaults".to_string());
        (Self::default(), notes)
    }

    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            strict_tags: self.stream.strict_tags,
        }
    }

    pub fn clock(&self) -> SystemClock {
        match self.display.utc_offset_minutes {
            Some(minutes) => SystemClock::with_offset_minutes(minutes),
            None => SystemClock::local(),
        }
    }

    /// Log configuration summary
    pub fn log_summary(&self) {
        let offset = self
            .display
            .utc_offset_minutes
            .map_or_else(|| "local".to_string(), |m| format!("{m:+} min"));
        tracing::info!(
            stream = %self.stream.url,
            strict_tags = self.stream.strict_tags,
            server = self.server.enabled,
            bind = %self.server.bind,
            utc_offset = %offset,
            log_level = %self.logging.level,
            "dashboard configuration"
        );
    }
}
