//! Open virtual files

use crate::context::Gdal;
use crate::error::{Error, Result};
use crate::ffi::safety::c_string;
use crate::native::types::{vsi_l_offset, SEEK_CUR, SEEK_END, SEEK_SET, VSILFILE};
use std::io::{self, SeekFrom};
use std::os::raw::{c_int, c_void};
use std::ptr;

/// Accept fopen-style modes: `r`, `w` or `a`, then optionally `+` and `b`
fn validate_mode(mode: &str) -> Result<()> {
    let mut chars = mode.chars();
    let valid = matches!(chars.next(), Some('r' | 'w' | 'a'))
        && matches!(chars.as_str(), "" | "b" | "+" | "+b" | "b+");
    if valid {
        Ok(())
    } else {
        Err(Error::invalid(format!("unsupported open mode '{}'", mode)))
    }
}

/// An open handle on the virtual file system
///
/// Every operation takes `&mut self`: one handle is never used from two
/// places at once. [`VsiFile::close`] consumes the handle; dropping an
/// unclosed handle closes it and logs a failure instead of reporting it.
pub struct VsiFile {
    gdal: Gdal,
    raw: *mut VSILFILE,
    path: String,
}

// The handle is exclusively owned and the native object has no thread affinity
unsafe impl Send for VsiFile {}

impl Gdal {
    /// Open a file on any installed file system with an fopen-style mode
    pub fn open(&self, path: &str, mode: &str) -> Result<VsiFile> {
        validate_mode(mode)?;
        let c_path = c_string(path)?;
        let c_mode = c_string(mode)?;

        let raw = unsafe { (self.api().vsi_fopen_l)(c_path.as_ptr(), c_mode.as_ptr()) };
        if raw.is_null() {
            tracing::debug!(path, mode, "VSIFOpenL failed");
            return Err(Error::vsi("open", path));
        }

        Ok(VsiFile::from_raw(self, raw, path))
    }
}

impl VsiFile {
    /// Wrap a non-null handle returned by the native side
    pub(crate) fn from_raw(gdal: &Gdal, raw: *mut VSILFILE, path: &str) -> Self {
        VsiFile {
            gdal: gdal.clone(),
            raw,
            path: path.to_string(),
        }
    }

    pub(crate) fn gdal(&self) -> &Gdal {
        &self.gdal
    }

    /// Path the handle was opened with
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Move the file position; returns the new absolute position
    ///
    /// The native seek only accepts non-negative offsets, so backward
    /// relative moves and non-zero end offsets are resolved to an absolute
    /// position first. Seeking clears the end-of-file flag.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let (offset, whence) = match pos {
            SeekFrom::Start(offset) => (offset, SEEK_SET),
            SeekFrom::Current(delta) if delta >= 0 => (delta as u64, SEEK_CUR),
            SeekFrom::Current(delta) => {
                let current = self.tell();
                (resolve_offset(current, delta)?, SEEK_SET)
            }
            SeekFrom::End(0) => (0, SEEK_END),
            SeekFrom::End(delta) => {
                let current = self.tell();
                self.raw_seek(0, SEEK_END)?;
                let end = self.tell();
                match resolve_offset(end, delta) {
                    Ok(target) => (target, SEEK_SET),
                    Err(e) => {
                        // A rejected seek leaves the position where it was
                        self.raw_seek(current, SEEK_SET)?;
                        return Err(e);
                    }
                }
            }
        };
        self.raw_seek(offset, whence)?;
        Ok(self.tell())
    }

    fn raw_seek(&mut self, offset: vsi_l_offset, whence: c_int) -> Result<()> {
        let rc = unsafe { (self.gdal.api().vsi_fseek_l)(self.raw, offset, whence) };
        if rc == 0 {
            Ok(())
        } else {
            Err(Error::vsi("seek", &self.path))
        }
    }

    /// Current absolute position
    pub fn tell(&mut self) -> u64 {
        unsafe { (self.gdal.api().vsi_ftell_l)(self.raw) }
    }

    /// Read up to `count` elements of `element_size` bytes into `buf`
    ///
    /// Returns the number of whole elements read; fewer than `count` at end
    /// of file is not an error.
    pub fn read_elements(
        &mut self,
        buf: &mut [u8],
        element_size: usize,
        count: usize,
    ) -> Result<usize> {
        check_extent(buf.len(), element_size, count)?;
        let read = unsafe {
            (self.gdal.api().vsi_fread_l)(
                buf.as_mut_ptr() as *mut c_void,
                element_size,
                count,
                self.raw,
            )
        };
        Ok(read)
    }

    /// Write `count` elements of `element_size` bytes from `buf`
    ///
    /// Returns the number of whole elements written.
    pub fn write_elements(&mut self, buf: &[u8], element_size: usize, count: usize) -> Result<usize> {
        check_extent(buf.len(), element_size, count)?;
        let written = unsafe {
            (self.gdal.api().vsi_fwrite_l)(
                buf.as_ptr() as *const c_void,
                element_size,
                count,
                self.raw,
            )
        };
        Ok(written)
    }

    /// True only if the preceding read hit end of file
    pub fn eof(&mut self) -> bool {
        unsafe { (self.gdal.api().vsi_feof_l)(self.raw) != 0 }
    }

    /// Shrink or extend the file
    pub fn truncate(&mut self, new_size: u64) -> Result<()> {
        let rc = unsafe { (self.gdal.api().vsi_ftruncate_l)(self.raw, new_size) };
        if rc == 0 {
            Ok(())
        } else {
            Err(Error::vsi("truncate", &self.path))
        }
    }

    /// Push buffered writes to the backing store
    pub fn flush(&mut self) -> Result<()> {
        let rc = unsafe { (self.gdal.api().vsi_fflush_l)(self.raw) };
        if rc == 0 {
            Ok(())
        } else {
            Err(Error::vsi("flush", &self.path))
        }
    }

    /// Close the handle, reporting a failed final flush
    pub fn close(mut self) -> Result<()> {
        let raw = std::mem::replace(&mut self.raw, ptr::null_mut());
        let rc = unsafe { (self.gdal.api().vsi_fclose_l)(raw) };
        if rc == 0 {
            Ok(())
        } else {
            Err(Error::vsi("close", &self.path))
        }
    }
}

fn resolve_offset(base: u64, delta: i64) -> Result<u64> {
    base.checked_add_signed(delta)
        .ok_or_else(|| Error::invalid(format!("seek to {} {:+} is outside the file", base, delta)))
}

fn check_extent(available: usize, element_size: usize, count: usize) -> Result<()> {
    if element_size == 0 {
        return Err(Error::invalid("element size must be non-zero"));
    }
    match element_size.checked_mul(count) {
        Some(needed) if needed <= available => Ok(()),
        _ => Err(Error::invalid(format!(
            "{} elements of {} bytes do not fit in a {} byte buffer",
            count, element_size, available
        ))),
    }
}

impl VsiFile {
    /// Close now, logging a failure; later drops are no-ops
    pub(crate) fn close_in_place(&mut self) {
        let raw = std::mem::replace(&mut self.raw, ptr::null_mut());
        if raw.is_null() {
            return;
        }
        let rc = unsafe { (self.gdal.api().vsi_fclose_l)(raw) };
        if rc != 0 {
            tracing::warn!(path = %self.path, "closing dropped VSI file failed");
        }
    }
}

impl Drop for VsiFile {
    fn drop(&mut self) {
        self.close_in_place();
    }
}

impl std::fmt::Debug for VsiFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VsiFile").field("path", &self.path).finish()
    }
}

fn io_error(err: Error) -> io::Error {
    match err {
        Error::InvalidArgument(_) => io::Error::new(io::ErrorKind::InvalidInput, err),
        other => io::Error::new(io::ErrorKind::Other, other),
    }
}

impl io::Read for VsiFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let len = buf.len();
        self.read_elements(buf, 1, len).map_err(io_error)
    }
}

impl io::Write for VsiFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.write_elements(buf, 1, buf.len()).map_err(io_error)? {
            0 => Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("VSI write to '{}' made no progress", self.path),
            )),
            n => Ok(n),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        VsiFile::flush(self).map_err(io_error)
    }
}

impl io::Seek for VsiFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        VsiFile::seek(self, pos).map_err(io_error)
    }
}
