//! Raster algorithm wrappers
//!
//! One function per native entry point. Each wrapper checks its arguments,
//! exports the option list, threads the progress callback through, makes the
//! call and turns the `CPLErr` into a `Result`. The algorithms themselves run
//! entirely inside the native library.

pub mod palette;
pub mod raster;
pub mod warp;

pub use palette::{compute_median_cut_pct, dither_rgb_to_pct};
pub use raster::{
    compute_proximity, fill_nodata, fpolygonize, polygonize, sieve_filter, Connectedness, Window,
};
pub use warp::{reproject_image, ReprojectParams, ResampleAlg};

use crate::context::Gdal;
use crate::error::{Error, Result};
use crate::ffi::{with_progress, Options, ProgressFn};
use crate::handle::RasterBand;
use crate::native::types::{CPLErr, GDALProgressFunc, GDALRasterBandH};
use std::os::raw::{c_char, c_int, c_void};
use std::ptr;

/// Run one option-taking native algorithm
///
/// The option array and progress bundle live exactly as long as `call`.
pub(crate) fn run_with_options(
    gdal: &Gdal,
    function: &'static str,
    options: &Options,
    progress: Option<ProgressFn<'_>>,
    call: impl FnOnce(*mut *mut c_char, GDALProgressFunc, *mut c_void) -> CPLErr,
) -> Result<()> {
    let array = options.export();
    run(gdal, function, progress, |pfn, arg| call(array.as_ptr(), pfn, arg))
}

/// Run one native algorithm that reports through `CPLErr`
pub(crate) fn run(
    gdal: &Gdal,
    function: &'static str,
    progress: Option<ProgressFn<'_>>,
    call: impl FnOnce(GDALProgressFunc, *mut c_void) -> CPLErr,
) -> Result<()> {
    tracing::debug!(function, has_progress = progress.is_some(), "calling native algorithm");
    gdal.reset_error();
    let code = with_progress(progress, call);
    gdal.check_cpl(function, code)
}

/// Raw handle of an optional band, null when absent
pub(crate) fn band_or_null(band: Option<&RasterBand<'_>>) -> GDALRasterBandH {
    band.map_or(ptr::null_mut(), |b| b.as_raw())
}

/// Narrow a count or offset to the native `int`
pub(crate) fn to_c_int(name: &str, value: usize) -> Result<c_int> {
    c_int::try_from(value)
        .map_err(|_| Error::invalid(format!("{} {} does not fit in a C int", name, value)))
}
