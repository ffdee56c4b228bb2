//! Small helpers shared by the safe wrappers

use crate::error::{Error, Result};
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_void};
use std::ptr::NonNull;

/// Reject a null native handle before it reaches any native call
pub fn check_handle(ptr: *mut c_void, kind: &'static str) -> Result<NonNull<c_void>> {
    NonNull::new(ptr).ok_or(Error::NullHandle { kind })
}

/// Convert a path or string argument for one native call
pub fn c_string(s: &str) -> Result<CString> {
    Ok(CString::new(s)?)
}

/// Convert a string that the native side treats as absent when empty
///
/// Returns `None` for `""`, which callers pass down as a null pointer.
pub fn c_string_or_null(s: &str) -> Result<Option<CString>> {
    if s.is_empty() {
        Ok(None)
    } else {
        c_string(s).map(Some)
    }
}

/// Copy a native-owned C string, treating null as empty
///
/// # Safety
///
/// `ptr` must be null or a valid NUL-terminated string.
pub unsafe fn lossy_string(ptr: *const c_char) -> String {
    if ptr.is_null() {
        String::new()
    } else {
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    }
}
