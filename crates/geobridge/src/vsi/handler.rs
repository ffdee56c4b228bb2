//! Virtual file system handler installation
//!
//! Handler registration is process-wide state inside the native library.
//! Each kind is installed at most once per [`Gdal`] lifetime, guarded by a
//! latch; [`Gdal::cleanup_all`] tears the native handlers down and re-arms
//! every latch.

use crate::context::Gdal;
use crate::error::Error;
use crate::native::InstallFn;
use std::fmt;
use std::str::FromStr;

/// Installable handler kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    /// `/vsimem/`
    Memory,
    /// Files larger than 2GB on the local filesystem
    LargeFile,
    /// `/vsisubfile/`
    SubFile,
    /// `/vsisparse/`
    Sparse,
}

impl HandlerKind {
    pub const ALL: [HandlerKind; 4] = [
        HandlerKind::Memory,
        HandlerKind::LargeFile,
        HandlerKind::SubFile,
        HandlerKind::Sparse,
    ];

    /// Name used in configuration files and on the command line
    pub fn name(self) -> &'static str {
        match self {
            HandlerKind::Memory => "memory",
            HandlerKind::LargeFile => "large-file",
            HandlerKind::SubFile => "subfile",
            HandlerKind::Sparse => "sparse",
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    fn symbol(self) -> &'static str {
        match self {
            HandlerKind::Memory => "VSIInstallMemFileHandler",
            HandlerKind::LargeFile => "VSIInstallLargeFileHandler",
            HandlerKind::SubFile => "VSIInstallSubFileHandler",
            HandlerKind::Sparse => "VSIInstallSparseFileHandler",
        }
    }
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HandlerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HandlerKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| Error::invalid(format!("unknown handler kind '{}'", s)))
    }
}

/// One latch per handler kind
#[derive(Debug, Default)]
pub(crate) struct HandlerLatches {
    installed: [bool; 4],
}

impl Gdal {
    /// Install a virtual file system handler once
    ///
    /// Repeated calls are no-ops until [`Gdal::cleanup_all`]. Returns `true`
    /// when this call reached the native installer. A library that does not
    /// export the installer is logged and latched like a successful install.
    pub fn install_handler(&self, kind: HandlerKind) -> bool {
        let mut latches = self.handler_latches();
        if latches.installed[kind.index()] {
            tracing::trace!(handler = %kind, "handler already installed");
            return false;
        }

        let api = self.api();
        let installer: Option<InstallFn> = match kind {
            HandlerKind::Memory => api.vsi_install_mem_file_handler,
            HandlerKind::LargeFile => api.vsi_install_large_file_handler,
            HandlerKind::SubFile => api.vsi_install_subfile_handler,
            HandlerKind::Sparse => api.vsi_install_sparse_file_handler,
        };

        latches.installed[kind.index()] = true;
        match installer {
            Some(install) => {
                unsafe { install() };
                tracing::debug!(handler = %kind, "installed VSI handler");
                true
            }
            None => {
                tracing::warn!(
                    handler = %kind,
                    symbol = kind.symbol(),
                    "native library does not export handler installer"
                );
                false
            }
        }
    }

    /// Whether the latch for `kind` is set
    pub fn is_handler_installed(&self, kind: HandlerKind) -> bool {
        self.handler_latches().installed[kind.index()]
    }

    /// Tear down every native file system handler (`VSICleanupFileManager`)
    ///
    /// Re-arms all install latches and forgets view-backed memory files.
    ///
    /// # Safety
    ///
    /// No [`VsiFile`](crate::VsiFile) or [`MemoryFile`](crate::MemoryFile)
    /// of this library may be open, on any thread: the native manager frees
    /// the state those handles point into.
    pub unsafe fn cleanup_all(&self) {
        let mut latches = self.handler_latches();
        (self.api().vsi_cleanup_file_manager)();
        *latches = HandlerLatches::default();
        self.views().clear();
        tracing::debug!("cleaned up VSI file manager");
    }
}
