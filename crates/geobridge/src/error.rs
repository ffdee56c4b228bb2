//! Error types for the binding

use crate::native::LoadError;
use std::ffi::NulError;
use thiserror::Error;

/// Errors surfaced by every fallible binding operation
#[derive(Error, Debug)]
pub enum Error {
    /// Rejected locally before any native call was attempted
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A raw native handle was null
    #[error("Null {kind} handle")]
    NullHandle { kind: &'static str },

    /// A string could not be converted to a C string (interior NUL byte)
    #[error("String contains an interior NUL byte: {0}")]
    InvalidString(#[from] NulError),

    /// A native allocation failed
    #[error("Native allocation of {0} bytes failed")]
    OutOfMemory(usize),

    /// The native call returned a failure code
    ///
    /// `errno` and `message` are the native last-error state read right after
    /// the call, forwarded verbatim.
    #[error("{function} failed (CPLErr {code}, error {errno}): {message}")]
    Native {
        function: &'static str,
        code: i32,
        errno: i32,
        message: String,
    },

    /// A virtual file system operation reported failure
    #[error("VSI {op} failed for '{path}'")]
    Vsi { op: &'static str, path: String },

    /// The native library could not be loaded
    #[error(transparent)]
    Load(#[from] LoadError),
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub(crate) fn vsi(op: &'static str, path: impl Into<String>) -> Self {
        Error::Vsi {
            op,
            path: path.into(),
        }
    }

    /// True when the native side aborted because a progress callback asked to stop
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Error::Native { errno, .. } if *errno == crate::native::types::CPLE_USER_INTERRUPT
        )
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;
