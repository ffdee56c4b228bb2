//! Geobridge - runtime-loaded bindings for the GDAL C API
//!
//! This library exposes two parts of GDAL to Rust:
//! - Raster algorithms: median-cut palettes, dithering, checksums, proximity,
//!   fill-nodata, polygonization, sieve filtering and reprojection
//! - The virtual file system: file handles, path operations, memory-backed
//!   files and handler installation
//!
//! The native library is loaded at runtime, so nothing here links against
//! GDAL. All computation happens inside the native library; this crate
//! handles the boundary: option arrays, progress callbacks, buffer ownership,
//! handle validation and error translation.
//!
//! # Example
//!
//! ```no_run
//! use geobridge::{Gdal, HandlerKind, MemBuffer};
//!
//! let gdal = Gdal::load("gdal")?;
//! gdal.install_handler(HandlerKind::Memory);
//!
//! let file = gdal.create_memory_file("/vsimem/hello.txt", MemBuffer::transferred(b"hello".to_vec()))?;
//! assert_eq!(gdal.stat(file.path(), Default::default())?.map(|s| s.size), Some(5));
//! # Ok::<(), geobridge::Error>(())
//! ```

/// Geobridge version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod alg;
pub mod context;
pub mod error;
pub mod ffi;
pub mod handle;
pub mod native;
pub mod vsi;

pub use context::Gdal;
pub use error::{Error, Result};
pub use ffi::{Options, ProgressFn};
pub use handle::{Access, ColorTable, Dataset, Layer, PaletteInterp, RasterBand, WarpOptions};
pub use native::{GdalApi, LibraryLoader, LoadError};
pub use vsi::{
    BufferRelease, HandlerKind, MemBuffer, MemoryFile, Stat, StatFlags, VsiFile,
};
