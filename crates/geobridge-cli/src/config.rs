//! CLI configuration
//!
//! Layers the command-line flags over the configuration files and
//! environment handled by `geobridge-config`, then sets up logging.

use anyhow::{Context, Result};
use geobridge_config::{Config, ConfigLoader, LibraryConfig, LoggingConfig};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Flags that override file and environment settings
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// `--library`: a path, or a short name such as `gdal`
    pub library: Option<String>,
    /// `--log`: filter directives
    pub log: Option<String>,
}

/// Load `geobridge.toml` from `dir` upwards, then apply `overrides`
pub fn load(dir: &Path, overrides: &Overrides) -> Result<Config> {
    let mut config = ConfigLoader::new()
        .load_from_directory(dir)
        .context("Failed to load configuration")?;
    apply(&mut config, overrides)?;
    Ok(config)
}

fn apply(config: &mut Config, overrides: &Overrides) -> Result<()> {
    if let Some(library) = &overrides.library {
        let settings = config
            .global
            .library
            .get_or_insert_with(LibraryConfig::default);
        if looks_like_path(library) {
            settings.path = Some(PathBuf::from(library));
        } else {
            // A name on the command line beats a path from the files
            settings.path = None;
            settings.name = Some(library.clone());
        }
    }

    if let Some(filter) = &overrides.log {
        config
            .global
            .logging
            .get_or_insert_with(LoggingConfig::default)
            .filter = Some(filter.clone());
    }

    config
        .global
        .validate()
        .context("Invalid command-line option")
}

fn looks_like_path(library: &str) -> bool {
    library.contains(std::path::MAIN_SEPARATOR) || library.contains('/') || Path::new(library).exists()
}

/// What `--library` or the configuration asked for, for error messages
pub fn library_label(config: &Config) -> String {
    match config.library_path() {
        Some(path) => path.display().to_string(),
        None => config.library_name().to_string(),
    }
}

/// Route `tracing` output to stderr through `filter`
pub fn init_logging(filter: &str) -> Result<()> {
    let filter = EnvFilter::try_new(filter)
        .with_context(|| format!("Invalid log filter '{}'", filter))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
    Ok(())
}
