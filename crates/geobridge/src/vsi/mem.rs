//! Memory-backed virtual files under `/vsimem/`
//!
//! Two ownership modes:
//! - a *view* lends a host buffer to the native file system without copying
//!   it; the file is unlinked when its [`MemoryFile`] guard drops, so the
//!   borrow and the file end together;
//! - a *transferred* buffer becomes native property and is released by the
//!   native side when the file is deleted, or handed back with
//!   [`BufferRelease::UnlinkAndSeize`].

use super::{StatFlags, VsiFile, MEM_PREFIX};
use crate::context::Gdal;
use crate::error::{Error, Result};
use crate::ffi::safety::c_string;
use crate::native::types::{vsi_l_offset, FALSE, TRUE};
use std::marker::PhantomData;
use std::os::raw::c_int;
use std::ptr;

/// Host memory lent to the native file system
pub struct ViewBuffer<'a> {
    data: &'a mut [u8],
}

/// Bytes for a new memory file, tagged with who owns them afterwards
pub enum MemBuffer<'a> {
    /// Caller keeps ownership; the native side reads and writes in place
    View(ViewBuffer<'a>),
    /// Ownership passes to the native file system
    Transferred(Vec<u8>),
}

impl<'a> MemBuffer<'a> {
    /// Lend `data` to the native file system for the life of the file
    ///
    /// # Safety
    ///
    /// The native side keeps a raw pointer into `data`. The [`MemoryFile`]
    /// guard unlinks the file before the borrow ends, but a [`VsiFile`]
    /// opened on the same path keeps the native file alive past the unlink.
    /// The caller must close every such handle before the guard drops.
    ///
    /// [`VsiFile`]: crate::VsiFile
    pub unsafe fn view(data: &'a mut [u8]) -> Self {
        MemBuffer::View(ViewBuffer { data })
    }

    /// Give `data` away to the native file system
    pub fn transferred(data: Vec<u8>) -> Self {
        MemBuffer::Transferred(data)
    }

    pub fn len(&self) -> usize {
        match self {
            MemBuffer::View(view) => view.data.len(),
            MemBuffer::Transferred(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// How [`Gdal::release_memory_file_buffer`] treats the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferRelease {
    /// Copy the contents; the file stays
    Snapshot,
    /// Remove the file and take its bytes
    UnlinkAndSeize,
}

/// A live memory file
///
/// Owns the handle returned on creation, positioned at the start of the
/// buffer and open for reading and writing. View-backed files are also
/// unlinked on drop, after the handle is closed.
pub struct MemoryFile<'a> {
    file: VsiFile,
    initial_len: usize,
    view: bool,
    _buffer: PhantomData<&'a mut [u8]>,
}

impl MemoryFile<'_> {
    pub fn path(&self) -> &str {
        self.file.path()
    }

    /// The handle bound to the buffer
    pub fn file(&mut self) -> &mut VsiFile {
        &mut self.file
    }

    /// Size the file was created with
    pub fn initial_len(&self) -> usize {
        self.initial_len
    }

    /// Current size, as the file system reports it after any writes
    pub fn size(&self) -> Result<u64> {
        self.file
            .gdal()
            .stat(self.path(), StatFlags::SIZE)?
            .map(|stat| stat.size)
            .ok_or_else(|| Error::vsi("stat", self.path()))
    }

    /// True when the file is backed by a borrowed host buffer
    pub fn is_view(&self) -> bool {
        self.view
    }
}

impl Drop for MemoryFile<'_> {
    fn drop(&mut self) {
        self.file.close_in_place();
        if self.view {
            let gdal = self.file.gdal().clone();
            let path = self.file.path();
            match c_string(path) {
                Ok(c_path) => {
                    if unsafe { (gdal.api().vsi_unlink)(c_path.as_ptr()) } != 0 {
                        tracing::debug!(path, "view memory file already gone");
                    }
                }
                Err(e) => tracing::warn!(path, error = %e, "cannot unlink view"),
            }
            gdal.views().remove(path);
        }
    }
}

impl std::fmt::Debug for MemoryFile<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryFile")
            .field("path", &self.path())
            .field("initial_len", &self.initial_len)
            .field("view", &self.view)
            .finish()
    }
}

fn check_mem_path(path: &str) -> Result<()> {
    if path.starts_with(MEM_PREFIX) && path.len() > MEM_PREFIX.len() {
        Ok(())
    } else {
        Err(Error::invalid(format!(
            "memory file path '{}' must start with {} and name a file",
            path, MEM_PREFIX
        )))
    }
}

impl Gdal {
    /// Create a memory file over `buffer`
    ///
    /// Replaces any existing memory file at `path`, except one backed by a
    /// live view, which is refused.
    pub fn create_memory_file<'a>(
        &self,
        path: &str,
        buffer: MemBuffer<'a>,
    ) -> Result<MemoryFile<'a>> {
        check_mem_path(path)?;
        self.ensure_not_view(path, "replace")?;
        let c_path = c_string(path)?;
        let api = self.api();

        let (data, len, take_ownership, view) = match buffer {
            MemBuffer::View(ViewBuffer { data }) => (data.as_mut_ptr(), data.len(), FALSE, true),
            MemBuffer::Transferred(bytes) => {
                // The native side frees adopted buffers with VSIFree, so they
                // must come from its own allocator
                let native = unsafe { (api.vsi_malloc)(bytes.len().max(1)) } as *mut u8;
                if native.is_null() {
                    return Err(Error::OutOfMemory(bytes.len()));
                }
                unsafe { ptr::copy_nonoverlapping(bytes.as_ptr(), native, bytes.len()) };
                (native, bytes.len(), TRUE, false)
            }
        };

        let raw = unsafe {
            (api.vsi_file_from_mem_buffer)(
                c_path.as_ptr(),
                data,
                len as vsi_l_offset,
                take_ownership,
            )
        };
        if raw.is_null() {
            if !view {
                // Whether the native side adopted the allocation before failing
                // is unknown; leaking it is the only safe choice
                tracing::warn!(path, len, "memory file creation failed, transferred buffer leaked");
            }
            return Err(Error::vsi("create memory file", path));
        }

        if view {
            self.views().insert(path.to_string());
        }
        tracing::debug!(path, len, view, "created memory file");

        Ok(MemoryFile {
            file: VsiFile::from_raw(self, raw, path),
            initial_len: len,
            view,
            _buffer: PhantomData,
        })
    }

    /// Copy out the bytes of a memory file, optionally removing it
    ///
    /// The bytes are always copied into a Rust allocation; on
    /// [`BufferRelease::UnlinkAndSeize`] the native buffer is then freed.
    /// Seizing a view-backed file is refused: its bytes belong to the caller
    /// already.
    pub fn release_memory_file_buffer(&self, path: &str, mode: BufferRelease) -> Result<Vec<u8>> {
        check_mem_path(path)?;
        let seize = mode == BufferRelease::UnlinkAndSeize;
        if seize {
            self.ensure_not_view(path, "seize")?;
        }
        if !self.exists(path)? {
            return Err(Error::vsi("release memory buffer", path));
        }

        let c_path = c_string(path)?;
        let api = self.api();
        let mut len: vsi_l_offset = 0;
        let data = unsafe {
            (api.vsi_get_mem_file_buffer)(c_path.as_ptr(), &mut len, seize as c_int)
        };
        if data.is_null() {
            return Ok(Vec::new());
        }

        let copied = match usize::try_from(len) {
            Ok(len) => Ok(unsafe { std::slice::from_raw_parts(data, len) }.to_vec()),
            Err(_) => Err(Error::OutOfMemory(usize::MAX)),
        };
        if seize {
            unsafe { (api.vsi_free)(data as *mut _) };
        }
        let copied = copied?;

        tracing::debug!(path, len = copied.len(), ?mode, "released memory file buffer");
        Ok(copied)
    }
}
