//! Dynamic loading of the native GDAL library
//!
//! Provides cross-platform library loading using `libloading`.
//! Handles platform-specific library naming conventions and search paths.

use libloading::Library;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Library loading errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    /// Library file not found in search paths
    #[error("Library not found: {0}")]
    LibraryNotFound(String),

    /// Symbol not found in library
    #[error("Symbol '{symbol}' not found in library '{library}'")]
    SymbolNotFound { library: String, symbol: String },

    /// Failed to load library
    #[error("Failed to load library: {0}")]
    LoadFailed(String),
}

/// A library handed out by [`LibraryLoader::load`]
#[derive(Clone)]
pub struct LoadedLibrary {
    /// Where the library was found (or the bare file name given to the system loader)
    pub path: PathBuf,
    pub library: Arc<Library>,
}

/// Dynamic library loader with caching and platform-specific path resolution
///
/// # Safety
///
/// Loading dynamic libraries is inherently unsafe. The loaded code runs in the
/// same process and can perform arbitrary operations.
pub struct LibraryLoader {
    /// Cache of loaded libraries by resolved path
    loaded: HashMap<PathBuf, Arc<Library>>,
    /// Platform-specific library search paths
    search_paths: Vec<PathBuf>,
}

impl LibraryLoader {
    /// Create a new library loader with default search paths
    pub fn new() -> Self {
        Self {
            loaded: HashMap::new(),
            search_paths: Self::default_search_paths(),
        }
    }

    /// Get platform-specific default library search paths
    ///
    /// - Linux: /usr/lib, /usr/local/lib, /lib, the multiarch directory
    /// - macOS: /usr/lib, /usr/local/lib, /opt/homebrew/lib
    /// - Windows: C:\OSGeo4W\bin, C:\Windows\System32
    /// - All platforms: current working directory
    fn default_search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        #[cfg(target_os = "linux")]
        {
            paths.push(PathBuf::from("/usr/lib"));
            paths.push(PathBuf::from("/usr/local/lib"));
            paths.push(PathBuf::from("/lib"));

            // Debian and Ubuntu install GDAL under the multiarch triplet
            let multiarch = format!("/usr/lib/{}-linux-gnu", std::env::consts::ARCH);
            paths.push(PathBuf::from(multiarch));

            if cfg!(target_pointer_width = "64") {
                paths.push(PathBuf::from("/usr/lib64"));
                paths.push(PathBuf::from("/lib64"));
            }
        }

        #[cfg(target_os = "macos")]
        {
            paths.push(PathBuf::from("/usr/lib"));
            paths.push(PathBuf::from("/usr/local/lib"));
            paths.push(PathBuf::from("/opt/homebrew/lib"));
        }

        #[cfg(target_os = "windows")]
        {
            paths.push(PathBuf::from("C:\\OSGeo4W\\bin"));
            paths.push(PathBuf::from("C:\\Windows\\System32"));
        }

        // Current working directory (highest priority)
        if let Ok(cwd) = std::env::current_dir() {
            paths.insert(0, cwd);
        }

        paths
    }

    /// Resolve library name to full path with platform-specific naming
    ///
    /// - Linux: lib{name}.so
    /// - macOS: lib{name}.dylib or lib{name}.so
    /// - Windows: {name}.dll
    fn resolve_library_path(&self, name: &str) -> Option<PathBuf> {
        let path = Path::new(name);
        if path.is_absolute() {
            return path.exists().then(|| path.to_path_buf());
        }

        let extensions = if cfg!(target_os = "windows") {
            vec!["dll"]
        } else if cfg!(target_os = "macos") {
            vec!["dylib", "so"]
        } else {
            vec!["so"]
        };

        let prefixes = if cfg!(target_os = "windows") {
            vec!["", "lib"]
        } else {
            vec!["lib", ""]
        };

        for search_path in &self.search_paths {
            for prefix in &prefixes {
                for ext in &extensions {
                    let full_path = search_path.join(format!("{}{}.{}", prefix, name, ext));
                    if full_path.exists() {
                        return Some(full_path);
                    }
                }
            }
        }

        None
    }

    /// Load a library by name or path
    ///
    /// Returns the cached instance when the same file was loaded before.
    /// Library name can be:
    /// - Short name: "gdal" -> lib{gdal}.{ext}
    /// - Full path: "/opt/gdal/lib/libgdal.so.34"
    ///
    /// A short name that is not in any search path is handed to the system
    /// loader as a platform file name, so `LD_LIBRARY_PATH` and friends still
    /// apply.
    ///
    /// # Safety
    ///
    /// Loading a dynamic library executes its initialization code and makes its
    /// symbols available. The caller must ensure the library is trusted.
    pub fn load(&mut self, name: &str) -> Result<LoadedLibrary, LoadError> {
        let path = match self.resolve_library_path(name) {
            Some(path) => path,
            None if Path::new(name).is_absolute() => {
                return Err(LoadError::LibraryNotFound(name.to_string()))
            }
            None => PathBuf::from(libloading::library_filename(name)),
        };

        if let Some(library) = self.loaded.get(&path) {
            return Ok(LoadedLibrary {
                path,
                library: Arc::clone(library),
            });
        }

        let searched = path.components().count() > 1;
        let library = unsafe { Library::new(&path) }.map_err(|e| {
            if searched {
                LoadError::LoadFailed(e.to_string())
            } else {
                tracing::debug!(name, error = %e, "system loader could not find library");
                LoadError::LibraryNotFound(name.to_string())
            }
        })?;

        tracing::info!(path = %path.display(), "loaded native library");

        let library = Arc::new(library);
        self.loaded.insert(path.clone(), Arc::clone(&library));
        Ok(LoadedLibrary { path, library })
    }

    /// Add a custom search path (prepended to search list)
    pub fn add_search_path(&mut self, path: PathBuf) {
        self.search_paths.insert(0, path);
    }

    /// Get the number of loaded libraries
    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }
}

impl Default for LibraryLoader {
    fn default() -> Self {
        Self::new()
    }
}
