//! Project Configuration (geobridge.toml)
//!
//! Handles project-level configuration stored in `geobridge.toml` at the project root.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Handler names accepted in `[vsi] handlers`
pub const HANDLER_NAMES: &[&str] = &["memory", "large-file", "subfile", "sparse"];

/// Algorithms that accept an option list
pub const OPTION_ALGORITHMS: &[&str] = &[
    "proximity",
    "fill_nodata",
    "polygonize",
    "fpolygonize",
    "sieve_filter",
];

/// Project configuration from geobridge.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Virtual file system setup
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vsi: Option<VsiConfig>,

    /// Default option lists, keyed by algorithm name
    #[serde(default)]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, AlgorithmOptions>,
}

/// Virtual file system configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct VsiConfig {
    /// Handlers installed when the native library is loaded
    #[serde(default)]
    pub handlers: Vec<String>,
}

/// Default options for one algorithm
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct AlgorithmOptions {
    /// Ordered "KEY=VALUE" strings passed through to the native library
    #[serde(default)]
    pub values: Vec<String>,
}

impl ProjectConfig {
    /// Load project configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the project configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(vsi) = &self.vsi {
            for handler in &vsi.handlers {
                if !HANDLER_NAMES.contains(&handler.as_str()) {
                    return Err(ConfigError::InvalidValue {
                        field: "vsi.handlers".to_string(),
                        reason: format!(
                            "unknown handler '{}' (expected one of: {})",
                            handler,
                            HANDLER_NAMES.join(", ")
                        ),
                    });
                }
            }
        }

        for (algorithm, options) in &self.options {
            if !OPTION_ALGORITHMS.contains(&algorithm.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: format!("options.{}", algorithm),
                    reason: "algorithm does not take options".to_string(),
                });
            }

            // Option strings cross into C, which cannot represent interior NULs
            if let Some(bad) = options.values.iter().find(|v| v.contains('\0')) {
                return Err(ConfigError::InvalidValue {
                    field: format!("options.{}.values", algorithm),
                    reason: format!("'{}' contains a NUL byte", bad.escape_default()),
                });
            }
        }

        Ok(())
    }

    /// Handlers requested by this project, in declaration order
    pub fn handlers(&self) -> &[String] {
        self.vsi.as_ref().map(|v| v.handlers.as_slice()).unwrap_or(&[])
    }

    /// Default options for an algorithm (empty when none configured)
    pub fn algorithm_options(&self, algorithm: &str) -> &[String] {
        self.options
            .get(algorithm)
            .map(|o| o.values.as_slice())
            .unwrap_or(&[])
    }

    /// Merge another project config into this one
    /// Other config takes precedence for non-None values
    pub fn merge(&mut self, other: &ProjectConfig) {
        if other.vsi.is_some() {
            self.vsi = other.vsi.clone();
        }
        if !other.options.is_empty() {
            self.options.extend(other.options.clone());
        }
    }
}
