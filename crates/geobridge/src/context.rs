//! The loaded native library and its process-wide state

use crate::error::{Error, Result};
use crate::ffi::safety::{c_string, lossy_string};
use crate::native::types::{CPLErr, CE_NONE};
use crate::native::{GdalApi, LibraryLoader, LoadedLibrary};
use crate::vsi::handler::{HandlerKind, HandlerLatches};
use geobridge_config::Config;
use libloading::Library;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Handle to a loaded native library
///
/// Cheap to clone; every wrapper object keeps one so the library stays loaded
/// for as long as anything can still call into it.
#[derive(Clone)]
pub struct Gdal {
    inner: Arc<Inner>,
}

struct Inner {
    api: GdalApi,
    origin: String,
    handlers: Mutex<HandlerLatches>,
    /// `/vsimem/` paths currently backed by a borrowed host buffer
    views: Mutex<HashSet<String>>,
    // Declared last so the function table is never outlived by a dropped library
    _library: Option<Arc<Library>>,
}

impl Gdal {
    /// Load the native library by short name or path and register all drivers
    pub fn load(name_or_path: &str) -> Result<Self> {
        let mut loader = LibraryLoader::new();
        Self::load_with(&mut loader, name_or_path)
    }

    /// Load through a caller-configured [`LibraryLoader`]
    pub fn load_with(loader: &mut LibraryLoader, name_or_path: &str) -> Result<Self> {
        let LoadedLibrary { path, library } = loader.load(name_or_path)?;
        let origin = path.display().to_string();

        // Safety: the symbols are resolved against the C ABI declared in
        // `GdalApi`, and the library handle is stored alongside the table.
        let api = unsafe { GdalApi::resolve(&library, &origin)? };
        Ok(Self::with_parts(api, origin, Some(library)))
    }

    /// Load the library described by a configuration and install its handlers
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut loader = LibraryLoader::new();
        for path in config.search_paths().iter().rev() {
            loader.add_search_path(path.clone());
        }

        let name = match config.library_path() {
            Some(path) => path.to_string_lossy().into_owned(),
            None => config.library_name().to_string(),
        };
        let gdal = Self::load_with(&mut loader, &name)?;

        for handler in config.handlers() {
            let kind: HandlerKind = handler.parse()?;
            gdal.install_handler(kind);
        }

        Ok(gdal)
    }

    /// Wrap an already-resolved function table
    ///
    /// # Safety
    ///
    /// Every pointer in `api` must stay callable for the lifetime of the
    /// returned value and all of its clones, and must implement the C ABI of
    /// the symbol it stands for.
    pub unsafe fn from_api(api: GdalApi) -> Self {
        Self::with_parts(api, "<in-process>".to_string(), None)
    }

    fn with_parts(api: GdalApi, origin: String, library: Option<Arc<Library>>) -> Self {
        unsafe { (api.gdal_all_register)() };
        tracing::debug!(origin = %origin, "registered native drivers");

        Self {
            inner: Arc::new(Inner {
                api,
                origin,
                handlers: Mutex::new(HandlerLatches::default()),
                views: Mutex::new(HashSet::new()),
                _library: library,
            }),
        }
    }

    /// Where the native library was loaded from
    pub fn origin(&self) -> &str {
        &self.inner.origin
    }

    /// Query `GDALVersionInfo` (`"RELEASE_NAME"`, `"VERSION_NUM"`, ...)
    pub fn version_info(&self, request: &str) -> Result<String> {
        let request = c_string(request)?;
        Ok(unsafe { lossy_string((self.api().gdal_version_info)(request.as_ptr())) })
    }

    /// Release name of the loaded library, such as `3.8.4`
    pub fn version(&self) -> Result<String> {
        self.version_info("RELEASE_NAME")
    }

    pub(crate) fn api(&self) -> &GdalApi {
        &self.inner.api
    }

    pub(crate) fn handler_latches(&self) -> MutexGuard<'_, HandlerLatches> {
        // A poisoned latch set is still a valid set of booleans
        self.inner
            .handlers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn views(&self) -> MutexGuard<'_, HashSet<String>> {
        self.inner
            .views
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Clear the native last-error state before a call that reports through it
    pub(crate) fn reset_error(&self) {
        unsafe { (self.api().cpl_error_reset)() };
    }

    /// Translate a `CPLErr` into a `Result`, capturing the native last error
    pub(crate) fn check_cpl(&self, function: &'static str, code: CPLErr) -> Result<()> {
        if code == CE_NONE {
            return Ok(());
        }
        let err = self.native_error(function, code);
        tracing::warn!(error = %err, "native call failed");
        Err(err)
    }

    /// Build an [`Error::Native`] from the current native last-error state
    pub(crate) fn native_error(&self, function: &'static str, code: CPLErr) -> Error {
        let api = self.api();
        let errno = unsafe { (api.cpl_get_last_error_no)() };
        let message = unsafe { lossy_string((api.cpl_get_last_error_msg)()) };
        Error::Native {
            function,
            code,
            errno,
            message,
        }
    }
}

impl fmt::Debug for Gdal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gdal")
            .field("origin", &self.inner.origin)
            .finish_non_exhaustive()
    }
}
