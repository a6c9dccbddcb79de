//! Configuration management for loadtrend
//!
//! This module provides a centralized configuration system that supports:
//! - YAML/TOML configuration files
//! - Environment variable overrides
//! - Reasonable defaults
//! - Configuration validation

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default report location inside a build's artifacts.
pub const DEFAULT_XML_REPORT_PATH: &str = "neoload-report/report.xml";

/// Root configuration structure for loadtrend
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct LoadtrendConfig {
    #[serde(default)]
    pub report: ReportConfig,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl LoadtrendConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (highest priority)
    /// 2. Config file specified by LOADTREND_CONFIG env var
    /// 3. ./config/loadtrend.{yaml,toml}
    /// 4. /etc/loadtrend/loadtrend.{yaml,toml}
    /// 5. Hardcoded defaults (lowest priority)
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Self::set_defaults(Config::builder())?;

        if let Ok(config_path) = std::env::var("LOADTREND_CONFIG") {
            builder = builder.add_source(File::with_name(&config_path).required(false));
        }

        builder = builder
            .add_source(File::with_name("./config/loadtrend").required(false))
            .add_source(File::with_name("/etc/loadtrend/loadtrend").required(false));

        // Example: LOADTREND__RENDER__BASE_WIDTH=800
        builder = builder.add_source(
            Environment::with_prefix("LOADTREND")
                .separator("__")
                .try_parsing(true),
        );

        let config: LoadtrendConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file path, on top of the defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config: LoadtrendConfig = Self::set_defaults(Config::builder())?
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn set_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            .set_default("report.default_path", DEFAULT_XML_REPORT_PATH)?
            .set_default("render.base_width", 500)?
            .set_default("render.base_height", 200)?
            .set_default("render.per_build_width", 15)?
            .set_default("render.legend_row_height", 20)?
            .set_default("render.file_prefix", "stat")?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.report.default_path.trim().is_empty() {
            return Err(ConfigError::Message(
                "report.default_path cannot be empty".to_string(),
            ));
        }

        // Below this the plot area has no room left between title and axis labels.
        if self.render.base_width < 200 || self.render.base_height < 120 {
            return Err(ConfigError::Message(
                "render.base_width must be >= 200 and render.base_height >= 120".to_string(),
            ));
        }

        if self.render.per_build_width == 0 {
            return Err(ConfigError::Message(
                "render.per_build_width must be > 0".to_string(),
            ));
        }

        if self.render.legend_row_height < 10 {
            return Err(ConfigError::Message(
                "render.legend_row_height must be >= 10".to_string(),
            ));
        }

        let prefix = &self.render.file_prefix;
        if prefix.is_empty() || prefix.contains(['/', '\\']) {
            return Err(ConfigError::Message(format!(
                "render.file_prefix `{prefix}` must be a non-empty file name"
            )));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Message(format!(
                "logging.level must be one of {valid_levels:?}"
            )));
        }

        if !["pretty", "compact"].contains(&self.logging.format.as_str()) {
            return Err(ConfigError::Message(
                "logging.format must be `pretty` or `compact`".to_string(),
            ));
        }

        Ok(())
    }
}

/// Where reports are looked up
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportConfig {
    /// Conventional report path, tried last
    pub default_path: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            default_path: DEFAULT_XML_REPORT_PATH.to_string(),
        }
    }
}

/// Chart geometry and output naming
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RenderConfig {
    /// Minimum image width in pixels
    pub base_width: u32,

    /// Image height without legend, in pixels
    pub base_height: u32,

    /// Horizontal pixels reserved per plotted build
    pub per_build_width: u32,

    /// Height of one legend row in pixels
    pub legend_row_height: u32,

    /// Image file name prefix, followed by a two-digit index
    pub file_prefix: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            base_width: 500,
            base_height: 200,
            per_build_width: 15,
            legend_row_height: 20,
            file_prefix: "stat".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error (default: "info")
    pub level: String,

    /// Log format: pretty or compact (default: "pretty")
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
