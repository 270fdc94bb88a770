//! Configuration for header reading and writing
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (metaio.toml)
//! - Environment variables (METAIO__*)
//!
//! ## Example config file (metaio.toml):
//! ```toml
//! [io]
//! separator = "="
//! double_precision = 17
//! display_warnings = true
//!
//! [compat]
//! api_version = 0
//! file_format_version = 0
//!
//! [payload]
//! compression_level = 2
//! write_compressed_data_size = true
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::header::DEFAULT_COMPRESSION_LEVEL;
use crate::writer::DEFAULT_DOUBLE_PRECISION;

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaIoConfig {
    /// Header text settings
    #[serde(default)]
    pub io: IoConfig,

    /// Version gating
    #[serde(default)]
    pub compat: CompatConfig,

    /// Binary payload settings
    #[serde(default)]
    pub payload: PayloadConfig,
}

/// Header text settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IoConfig {
    /// Field/value separator
    #[serde(default = "default_separator")]
    pub separator: char,

    /// Significant digits for floating-point values
    #[serde(default = "default_double_precision")]
    pub double_precision: usize,

    /// Log clamping and unrecognised fields
    #[serde(default = "default_true")]
    pub display_warnings: bool,
}

/// Version gating
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompatConfig {
    /// 1 turns on warnings from deprecated accessors
    #[serde(default)]
    pub api_version: u32,

    /// Format version stamped on written headers; 0 is legacy and not written
    #[serde(default)]
    pub file_format_version: u32,
}

/// Binary payload settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadConfig {
    #[serde(default = "default_compression_level")]
    pub compression_level: i32,

    #[serde(default = "default_true")]
    pub write_compressed_data_size: bool,
}

fn default_separator() -> char {
    '='
}

fn default_double_precision() -> usize {
    DEFAULT_DOUBLE_PRECISION
}

fn default_true() -> bool {
    true
}

fn default_compression_level() -> i32 {
    DEFAULT_COMPRESSION_LEVEL
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            separator: default_separator(),
            double_precision: default_double_precision(),
            display_warnings: true,
        }
    }
}

impl Default for PayloadConfig {
    fn default() -> Self {
        Self {
            compression_level: default_compression_level(),
            write_compressed_data_size: true,
        }
    }
}

impl MetaIoConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering `config_path` (which must exist) on top
    /// of the default locations
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        for location in ["metaio.toml", ".metaio.toml", "config/metaio.toml"] {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(dirs) = directories::ProjectDirs::from("org", "metaio", "metaio") {
            let xdg_config = dirs.config_dir().join("metaio.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        // METAIO__IO__SEPARATOR and friends
        builder = builder.add_source(
            Environment::with_prefix("METAIO")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}
