//! Geobridge Configuration System
//!
//! Provides configuration management for geobridge including:
//! - Global user configuration (~/.geobridge/config.toml): where the native
//!   GDAL library lives and how verbose logging is
//! - Project configuration (geobridge.toml): which virtual file system
//!   handlers to install and default algorithm options
//! - Configuration precedence and merging
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Global config (~/.geobridge/config.toml)
//! 2. Project config (./geobridge.toml)
//! 3. Environment variables (GEOBRIDGE_*)
//! 4. CLI flags
//!
//! # Example
//!
//! ```no_run
//! use geobridge_config::ConfigLoader;
//! use std::path::Path;
//!
//! let mut loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! println!("native library: {}", config.library_name());
//! ```

pub mod global;
pub mod loader;
pub mod project;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

// Re-export main types
pub use global::{GlobalConfig, LibraryConfig, LoggingConfig};
pub use loader::{Config, ConfigLoader};
pub use project::{AlgorithmOptions, ProjectConfig, VsiConfig};
