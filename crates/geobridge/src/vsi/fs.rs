//! Path operations: stat, directories, unlink, rename

use crate::context::Gdal;
use crate::error::{Error, Result};
use crate::ffi::options::csl_to_vec;
use crate::ffi::safety::{c_string, lossy_string};
use crate::native::types::*;
use std::mem::MaybeUninit;
use std::ops::BitOr;
use std::os::raw::{c_char, c_int, c_long};

/// Which parts of a [`Stat`] the backend must fill in
///
/// Some backends answer partial queries far cheaper than a full stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatFlags(pub c_int);

impl StatFlags {
    pub const EXISTS: Self = StatFlags(VSI_STAT_EXISTS_FLAG);
    pub const NATURE: Self = StatFlags(VSI_STAT_NATURE_FLAG);
    pub const SIZE: Self = StatFlags(VSI_STAT_SIZE_FLAG);
    pub const SET_ERROR: Self = StatFlags(VSI_STAT_SET_ERROR_FLAG);
    pub const ALL: Self = StatFlags(VSI_STAT_EXISTS_FLAG | VSI_STAT_NATURE_FLAG | VSI_STAT_SIZE_FLAG);
}

impl Default for StatFlags {
    fn default() -> Self {
        StatFlags::ALL
    }
}

impl BitOr for StatFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        StatFlags(self.0 | rhs.0)
    }
}

/// Snapshot of a file system object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    pub size: u64,
    /// POSIX mode bits (type and permissions)
    pub mode: u32,
}

impl Stat {
    fn from_native(buf: &VSIStatBufL) -> Self {
        Self {
            size: u64::try_from(buf.st_size).unwrap_or(0),
            mode: buf.st_mode as u32,
        }
    }

    pub fn is_file(&self) -> bool {
        self.mode & (libc::S_IFMT as u32) == libc::S_IFREG as u32
    }

    pub fn is_dir(&self) -> bool {
        self.mode & (libc::S_IFMT as u32) == libc::S_IFDIR as u32
    }
}

impl Gdal {
    /// Query a path; `None` when it does not exist or cannot be queried
    pub fn stat(&self, path: &str, flags: StatFlags) -> Result<Option<Stat>> {
        let c_path = c_string(path)?;
        // Safety: the stat buffer is plain old data, all-zero is a valid value
        let mut buf: VSIStatBufL = unsafe { MaybeUninit::zeroed().assume_init() };

        let rc = unsafe { (self.api().vsi_stat_ex_l)(c_path.as_ptr(), &mut buf, flags.0) };
        if rc != 0 {
            tracing::trace!(path, "stat found nothing");
            return Ok(None);
        }
        Ok(Some(Stat::from_native(&buf)))
    }

    /// Cheap existence check
    pub fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.stat(path, StatFlags::EXISTS)?.is_some())
    }

    pub fn mkdir(&self, path: &str, mode: u32) -> Result<()> {
        let c_path = c_string(path)?;
        let rc = unsafe { (self.api().vsi_mkdir)(c_path.as_ptr(), mode as c_long) };
        vsi_status(rc, "mkdir", path)
    }

    /// Create a directory and any missing parents
    ///
    /// Fails with [`Error::InvalidArgument`] when the loaded library predates
    /// `VSIMkdirRecursive`.
    pub fn mkdir_recursive(&self, path: &str, mode: u32) -> Result<()> {
        let Some(mkdir_recursive) = self.api().vsi_mkdir_recursive else {
            return Err(Error::invalid(
                "native library does not export VSIMkdirRecursive",
            ));
        };
        let c_path = c_string(path)?;
        let rc = unsafe { mkdir_recursive(c_path.as_ptr(), mode as c_long) };
        vsi_status(rc, "mkdir", path)
    }

    pub fn rmdir(&self, path: &str) -> Result<()> {
        let c_path = c_string(path)?;
        let rc = unsafe { (self.api().vsi_rmdir)(c_path.as_ptr()) };
        vsi_status(rc, "rmdir", path)
    }

    /// Remove a file
    ///
    /// A memory file backed by a borrowed buffer is removed by dropping its
    /// [`MemoryFile`](crate::MemoryFile) guard, not here.
    pub fn unlink(&self, path: &str) -> Result<()> {
        self.ensure_not_view(path, "unlink")?;
        let c_path = c_string(path)?;
        let rc = unsafe { (self.api().vsi_unlink)(c_path.as_ptr()) };
        vsi_status(rc, "unlink", path)
    }

    pub fn rename(&self, from: &str, to: &str) -> Result<()> {
        self.ensure_not_view(from, "rename")?;
        self.ensure_not_view(to, "rename")?;
        let c_from = c_string(from)?;
        let c_to = c_string(to)?;
        let rc = unsafe { (self.api().vsi_rename)(c_from.as_ptr(), c_to.as_ptr()) };
        vsi_status(rc, "rename", from)
    }

    /// Names of the entries in a directory
    ///
    /// A missing or empty directory yields an empty list.
    pub fn read_dir(&self, path: &str) -> Result<Vec<String>> {
        let c_path = c_string(path)?;
        let list = unsafe { (self.api().vsi_read_dir)(c_path.as_ptr()) };
        if list.is_null() {
            return Ok(Vec::new());
        }
        let names = unsafe { csl_to_vec(list as *const *const c_char) };
        unsafe { (self.api().csl_destroy)(list) };
        Ok(names)
    }

    /// Text for a native I/O error number
    pub fn strerror(&self, errno: i32) -> String {
        unsafe { lossy_string((self.api().vsi_strerror)(errno)) }
    }

    pub(crate) fn ensure_not_view(&self, path: &str, op: &str) -> Result<()> {
        if self.views().contains(path) {
            return Err(Error::invalid(format!(
                "cannot {} '{}': it is backed by a borrowed buffer",
                op, path
            )));
        }
        Ok(())
    }
}

fn vsi_status(rc: c_int, op: &'static str, path: &str) -> Result<()> {
    if rc == 0 {
        Ok(())
    } else {
        tracing::debug!(op, path, rc, "VSI path operation failed");
        Err(Error::vsi(op, path))
    }
}
