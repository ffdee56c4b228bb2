//! Virtual file system bridge
//!
//! POSIX-like file access over the native library's pluggable file systems.
//! The backing store is chosen by path prefix:
//!
//! | prefix          | store                                    |
//! |-----------------|------------------------------------------|
//! | `/vsimem/`      | memory buffers ([`MemoryFile`])          |
//! | `/vsisubfile/`  | a byte range of another file             |
//! | `/vsisparse/`   | sparse file described by an XML document |
//! | anything else   | the local file system                    |
//!
//! Handlers for these stores are installed explicitly with
//! [`Gdal::install_handler`](crate::Gdal::install_handler).

pub mod file;
pub mod fs;
pub mod handler;
pub mod mem;

pub use file::VsiFile;
pub use fs::{Stat, StatFlags};
pub use handler::HandlerKind;
pub use mem::{BufferRelease, MemBuffer, MemoryFile, ViewBuffer};

pub const MEM_PREFIX: &str = "/vsimem/";
pub const SUBFILE_PREFIX: &str = "/vsisubfile/";
pub const SPARSE_PREFIX: &str = "/vsisparse/";

/// Path of a byte range inside `filename`
///
/// Without `size` the range runs to the end of the file.
pub fn subfile_path(offset: u64, size: Option<u64>, filename: &str) -> String {
    match size {
        Some(size) => format!("{}{}_{},{}", SUBFILE_PREFIX, offset, size, filename),
        None => format!("{}{},{}", SUBFILE_PREFIX, offset, filename),
    }
}

/// Path of the sparse file described by the XML document at `xml_filename`
pub fn sparse_path(xml_filename: &str) -> String {
    format!("{}{}", SPARSE_PREFIX, xml_filename)
}
