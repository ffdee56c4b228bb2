//! Option arrays - owned `KEY=VALUE` lists and their `char**` export
//!
//! Native algorithm entry points take option lists as null-terminated arrays
//! of C strings. [`Options`] owns every string; [`Options::export`] builds the
//! pointer array only at the call boundary and borrows the strings for as long
//! as the array lives. Nothing is leaked on any exit path because every
//! allocation has exactly one Rust owner.

use crate::error::Result;
use std::ffi::{CStr, CString};
use std::marker::PhantomData;
use std::os::raw::c_char;
use std::ptr;

/// Ordered list of option strings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    items: Vec<CString>,
}

impl Options {
    /// Create an empty option list
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build from any sequence of strings
    ///
    /// Fails with [`crate::Error::InvalidString`] on the first interior NUL;
    /// strings converted before the failure are dropped with the partial list.
    pub fn from_strs<I, S>(options: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let items = options
            .into_iter()
            .map(|s| CString::new(s.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { items })
    }

    /// Append a raw option string
    pub fn push(&mut self, option: &str) -> Result<()> {
        self.items.push(CString::new(option)?);
        Ok(())
    }

    /// Append `KEY=VALUE`
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.push(&format!("{}={}", key, value))
    }

    /// Append every option of `other`, keeping order
    pub fn extend_from(&mut self, other: &Options) {
        self.items.extend(other.items.iter().cloned());
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over the options as C strings
    pub fn iter(&self) -> impl Iterator<Item = &CStr> {
        self.items.iter().map(|s| s.as_c_str())
    }

    /// Build the null-terminated pointer array for one native call
    pub fn export(&self) -> OptionArray<'_> {
        let mut ptrs: Vec<*mut c_char> = Vec::with_capacity(self.items.len() + 1);
        ptrs.extend(self.items.iter().map(|s| s.as_ptr() as *mut c_char));
        ptrs.push(ptr::null_mut());
        OptionArray {
            ptrs,
            _strings: PhantomData,
        }
    }
}

impl TryFrom<&[&str]> for Options {
    type Error = crate::Error;

    fn try_from(options: &[&str]) -> Result<Self> {
        Self::from_strs(options)
    }
}

/// Null-terminated `char**` view of an [`Options`] list
///
/// Always holds at least the terminator, so [`OptionArray::as_ptr`] is never
/// null even for an empty list.
pub struct OptionArray<'a> {
    ptrs: Vec<*mut c_char>,
    _strings: PhantomData<&'a Options>,
}

impl OptionArray<'_> {
    /// Pointer to pass as the native `char**` argument
    ///
    /// The native side only reads through it.
    pub fn as_ptr(&self) -> *mut *mut c_char {
        self.ptrs.as_ptr() as *mut *mut c_char
    }

    /// Every entry, terminator included
    pub fn as_slice(&self) -> &[*mut c_char] {
        &self.ptrs
    }
}

/// Copy a native null-terminated string list into owned strings
///
/// A null list yields an empty vector. Invalid UTF-8 is replaced lossily.
///
/// # Safety
///
/// `list` must be null or point to an array of valid C strings terminated by a
/// null pointer, all alive for the duration of the call.
pub unsafe fn csl_to_vec(list: *const *const c_char) -> Vec<String> {
    let mut out = Vec::new();
    if list.is_null() {
        return out;
    }

    let mut cursor = list;
    while !(*cursor).is_null() {
        out.push(CStr::from_ptr(*cursor).to_string_lossy().into_owned());
        cursor = cursor.add(1);
    }
    out
}
