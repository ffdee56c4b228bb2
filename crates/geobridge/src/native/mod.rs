//! Raw native layer
//!
//! Everything here is a direct mirror of the C library: type aliases,
//! constants, the resolved function table and the loader that finds the
//! shared object. Nothing in this module is safe to call on its own; the
//! safe surface lives in the sibling modules.

pub mod api;
pub mod loader;
pub mod types;

pub use api::{GdalApi, InstallFn};
pub use loader::{LibraryLoader, LoadError, LoadedLibrary};
