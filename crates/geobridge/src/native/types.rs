//! C-level types and constants of the native library
//!
//! Mirrors the subset of `gdal.h`, `gdal_alg.h`, `gdalwarper.h`, `cpl_error.h`
//! and `cpl_vsi.h` that the binding crosses. Handles are opaque `void*`; the
//! binding never dereferences them.

#![allow(non_camel_case_types)]

use std::os::raw::{c_char, c_double, c_int, c_void};

pub type GDALDatasetH = *mut c_void;
pub type GDALRasterBandH = *mut c_void;
pub type GDALColorTableH = *mut c_void;
pub type OGRLayerH = *mut c_void;

/// Opaque `GDALWarpOptions`
pub type GDALWarpOptionsH = *mut c_void;

/// Opaque `VSILFILE`
#[repr(C)]
pub struct VSILFILE {
    _opaque: [u8; 0],
}

pub type vsi_l_offset = u64;

/// `CPLErr` return class
pub type CPLErr = c_int;

pub const CE_NONE: CPLErr = 0;
pub const CE_DEBUG: CPLErr = 1;
pub const CE_WARNING: CPLErr = 2;
pub const CE_FAILURE: CPLErr = 3;
pub const CE_FATAL: CPLErr = 4;

/// `CPLE_UserInterrupt`: the progress callback asked to stop
pub const CPLE_USER_INTERRUPT: c_int = 9;

pub const TRUE: c_int = 1;
pub const FALSE: c_int = 0;

/// `GDALProgressFunc`
pub type GDALProgressFunc =
    Option<unsafe extern "C" fn(c_double, *const c_char, *mut c_void) -> c_int>;

/// Pixel filter accepted by `GDALComputeMedianCutPCT` (always passed as null)
pub type GDALIncludePixelFunc = Option<unsafe extern "C" fn(c_int, c_int, *mut c_void) -> c_int>;

// GDALOpenEx flags
pub const GDAL_OF_READONLY: u32 = 0x00;
pub const GDAL_OF_UPDATE: u32 = 0x01;
pub const GDAL_OF_RASTER: u32 = 0x02;
pub const GDAL_OF_VECTOR: u32 = 0x04;
pub const GDAL_OF_VERBOSE_ERROR: u32 = 0x40;

// GDALPaletteInterp
pub const GPI_GRAY: c_int = 0;
pub const GPI_RGB: c_int = 1;
pub const GPI_CMYK: c_int = 2;
pub const GPI_HLS: c_int = 3;

// VSIFSeekL whence
pub const SEEK_SET: c_int = 0;
pub const SEEK_CUR: c_int = 1;
pub const SEEK_END: c_int = 2;

// VSIStatExL flags
pub const VSI_STAT_EXISTS_FLAG: c_int = 0x1;
pub const VSI_STAT_NATURE_FLAG: c_int = 0x2;
pub const VSI_STAT_SIZE_FLAG: c_int = 0x4;
pub const VSI_STAT_SET_ERROR_FLAG: c_int = 0x8;

/// `VSIStatBufL`: `struct stat64` on Linux, `struct stat` elsewhere
#[cfg(any(target_os = "linux", target_os = "android"))]
pub type VSIStatBufL = libc::stat64;

#[cfg(not(any(target_os = "linux", target_os = "android")))]
pub type VSIStatBufL = libc::stat;
