//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::global::{validate_log_filter, GlobalConfig, LibraryConfig, LoggingConfig};
use crate::project::ProjectConfig;
use crate::{ConfigError, ConfigResult};
use std::env;
use std::path::{Path, PathBuf};

/// Project configuration file name
pub const PROJECT_CONFIG_FILE: &str = "geobridge.toml";

/// Default short name of the native library
pub const DEFAULT_LIBRARY_NAME: &str = "gdal";

/// Default log filter when nothing is configured
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Global config (~/.geobridge/config.toml) - lowest priority
/// 2. Project config (./geobridge.toml) - overrides global
/// 3. Environment variables (GEOBRIDGE_*) - overrides both
/// 4. CLI flags - highest priority (handled by caller)
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Project configuration
    pub project: ProjectConfig,

    /// Global configuration
    pub global: GlobalConfig,

    /// Project root directory (where geobridge.toml was found)
    pub project_root: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Use a specific global config file instead of ~/.geobridge/config.toml
    pub fn with_global_config_path(path: impl Into<PathBuf>) -> Self {
        Self {
            global_config_path: Some(path.into()),
        }
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find geobridge.toml, then loads and merges
    /// global config if it exists.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project_config) = self.find_project_config(start_dir)?;

        let global_config = self.load_global_config()?;
        let global_config = self.apply_env_overrides(global_config)?;

        Ok(Config {
            project: project_config,
            global: global_config,
            project_root,
        })
    }

    /// Load configuration from a specific project config file
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<Config> {
        let project_config = ProjectConfig::load_from_file(config_path)?;
        let global_config = self.load_global_config()?;
        let global_config = self.apply_env_overrides(global_config)?;

        let project_root = config_path.parent().map(|p| p.to_path_buf());

        Ok(Config {
            project: project_config,
            global: global_config,
            project_root,
        })
    }

    /// Find project configuration by walking up directory tree
    ///
    /// Returns (project_root, project_config); a missing file yields the default config
    fn find_project_config(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, ProjectConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(PROJECT_CONFIG_FILE);

            if config_path.exists() {
                let project_config = ProjectConfig::load_from_file(&config_path)?;
                return Ok((Some(current), project_config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, ProjectConfig::default())),
            }
        }
    }

    /// Load global configuration from ~/.geobridge/config.toml
    ///
    /// A missing file (or a missing home directory) yields the default config;
    /// a file that exists but does not parse is an error.
    fn load_global_config(&mut self) -> ConfigResult<GlobalConfig> {
        let path = match &self.global_config_path {
            Some(path) => path.clone(),
            None => match GlobalConfig::global_config_path() {
                Ok(path) => {
                    self.global_config_path = Some(path.clone());
                    path
                }
                Err(ConfigError::HomeNotFound) => return Ok(GlobalConfig::default()),
                Err(e) => return Err(e),
            },
        };

        if !path.exists() {
            return Ok(GlobalConfig::default());
        }

        GlobalConfig::load_from_file(&path)
    }

    /// Apply environment variable overrides to the global config
    ///
    /// - GEOBRIDGE_LIBRARY: explicit path to the native library
    /// - GEOBRIDGE_LOG: log filter directives
    fn apply_env_overrides(&self, mut config: GlobalConfig) -> ConfigResult<GlobalConfig> {
        if let Ok(path) = env::var("GEOBRIDGE_LIBRARY") {
            if !path.is_empty() {
                config
                    .library
                    .get_or_insert_with(LibraryConfig::default)
                    .path = Some(PathBuf::from(path));
            }
        }

        if let Ok(filter) = env::var("GEOBRIDGE_LOG") {
            validate_log_filter("GEOBRIDGE_LOG", &filter)?;
            config
                .logging
                .get_or_insert_with(LoggingConfig::default)
                .filter = Some(filter);
        }

        Ok(config)
    }

    /// Get the global configuration directory (~/.geobridge)
    pub fn global_config_dir() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".geobridge"))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Explicit library path, if configured
    pub fn library_path(&self) -> Option<&Path> {
        self.global
            .library
            .as_ref()
            .and_then(|l| l.path.as_deref())
    }

    /// Short library name (configured or "gdal")
    pub fn library_name(&self) -> &str {
        self.global
            .library
            .as_ref()
            .and_then(|l| l.name.as_deref())
            .unwrap_or(DEFAULT_LIBRARY_NAME)
    }

    /// Extra library search paths
    pub fn search_paths(&self) -> &[PathBuf] {
        self.global
            .library
            .as_ref()
            .map(|l| l.search_paths.as_slice())
            .unwrap_or(&[])
    }

    /// Effective log filter (configured or "warn")
    pub fn log_filter(&self) -> &str {
        self.global.log_filter().unwrap_or(DEFAULT_LOG_FILTER)
    }

    /// Handler names to install after loading
    pub fn handlers(&self) -> &[String] {
        self.project.handlers()
    }

    /// Default options for an algorithm
    pub fn algorithm_options(&self, algorithm: &str) -> &[String] {
        self.project.algorithm_options(algorithm)
    }

    /// Get the project root directory
    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Check if a geobridge.toml was found
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }
}
