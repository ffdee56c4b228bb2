//! Single-band raster algorithms

use super::{band_or_null, run_with_options, to_c_int};
use crate::error::Result;
use crate::ffi::{Options, ProgressFn};
use crate::handle::{Layer, RasterBand};
use crate::native::types::FALSE;
use std::os::raw::c_int;

/// Pixel connectivity used when grouping pixels into regions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connectedness {
    /// Edge neighbors only
    #[default]
    Four,
    /// Edge and corner neighbors
    Eight,
}

impl Connectedness {
    fn as_native(self) -> c_int {
        match self {
            Connectedness::Four => 4,
            Connectedness::Eight => 8,
        }
    }
}

/// Pixel window of a band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub x_off: usize,
    pub y_off: usize,
    pub x_size: usize,
    pub y_size: usize,
}

impl<'a> RasterBand<'a> {
    /// 16-bit checksum of the pixels in `window` (`GDALChecksumImage`)
    pub fn checksum(&self, window: Window) -> Result<u32> {
        let x_off = to_c_int("x offset", window.x_off)?;
        let y_off = to_c_int("y offset", window.y_off)?;
        let x_size = to_c_int("x size", window.x_size)?;
        let y_size = to_c_int("y size", window.y_size)?;

        let gdal = self.gdal();
        gdal.reset_error();
        let sum = unsafe {
            (gdal.api().gdal_checksum_image)(self.as_raw(), x_off, y_off, x_size, y_size)
        };
        // Recent library versions signal a read failure with -1
        u32::try_from(sum).map_err(|_| gdal.native_error("GDALChecksumImage", sum))
    }

    /// Checksum of the whole band
    pub fn checksum_full(&self) -> Result<u32> {
        let (x_size, y_size) = self.size();
        self.checksum(Window {
            x_off: 0,
            y_off: 0,
            x_size,
            y_size,
        })
    }
}

/// Distance from each pixel to the nearest target pixel
///
/// Target values, distance units and the like are chosen through `options`
/// (`VALUES=`, `DISTUNITS=`, `MAXDIST=`, `NODATA=`, ...).
pub fn compute_proximity(
    src: &RasterBand<'_>,
    dest: &RasterBand<'_>,
    options: &Options,
    progress: Option<ProgressFn<'_>>,
) -> Result<()> {
    let gdal = src.gdal();
    let api = gdal.api();
    run_with_options(gdal, "GDALComputeProximity", options, progress, |opts, pfn, arg| unsafe {
        (api.gdal_compute_proximity)(src.as_raw(), dest.as_raw(), opts, pfn, arg)
    })
}

/// Interpolate nodata pixels of `target` in place
///
/// Pixels where `mask` is zero are treated as nodata; without a mask the
/// band's own mask is used.
pub fn fill_nodata(
    target: &RasterBand<'_>,
    mask: Option<&RasterBand<'_>>,
    max_search_dist: f64,
    smoothing_iterations: usize,
    options: &Options,
    progress: Option<ProgressFn<'_>>,
) -> Result<()> {
    let smoothing_iterations = to_c_int("smoothing iterations", smoothing_iterations)?;
    let gdal = target.gdal();
    let api = gdal.api();
    run_with_options(gdal, "GDALFillNodata", options, progress, |opts, pfn, arg| unsafe {
        (api.gdal_fill_nodata)(
            target.as_raw(),
            band_or_null(mask),
            max_search_dist,
            FALSE,
            smoothing_iterations,
            opts,
            pfn,
            arg,
        )
    })
}

fn field_index(field: Option<usize>) -> Result<c_int> {
    field.map_or(Ok(-1), |i| to_c_int("field index", i))
}

/// Trace connected regions of equal integer value into polygons on `layer`
///
/// With `field`, each polygon's pixel value is written to that attribute.
pub fn polygonize(
    src: &RasterBand<'_>,
    mask: Option<&RasterBand<'_>>,
    layer: &Layer<'_>,
    field: Option<usize>,
    options: &Options,
    progress: Option<ProgressFn<'_>>,
) -> Result<()> {
    let field = field_index(field)?;
    let gdal = src.gdal();
    let api = gdal.api();
    run_with_options(gdal, "GDALPolygonize", options, progress, |opts, pfn, arg| unsafe {
        (api.gdal_polygonize)(
            src.as_raw(),
            band_or_null(mask),
            layer.as_raw(),
            field,
            opts,
            pfn,
            arg,
        )
    })
}

/// [`polygonize`] over floating point pixel values
pub fn fpolygonize(
    src: &RasterBand<'_>,
    mask: Option<&RasterBand<'_>>,
    layer: &Layer<'_>,
    field: Option<usize>,
    options: &Options,
    progress: Option<ProgressFn<'_>>,
) -> Result<()> {
    let field = field_index(field)?;
    let gdal = src.gdal();
    let api = gdal.api();
    run_with_options(gdal, "GDALFPolygonize", options, progress, |opts, pfn, arg| unsafe {
        (api.gdal_fpolygonize)(
            src.as_raw(),
            band_or_null(mask),
            layer.as_raw(),
            field,
            opts,
            pfn,
            arg,
        )
    })
}

/// Merge regions smaller than `threshold` pixels into their largest neighbor
///
/// `dest` may be the same band as `src` for in-place filtering.
pub fn sieve_filter(
    src: &RasterBand<'_>,
    mask: Option<&RasterBand<'_>>,
    dest: &RasterBand<'_>,
    threshold: usize,
    connectedness: Connectedness,
    options: &Options,
    progress: Option<ProgressFn<'_>>,
) -> Result<()> {
    let threshold = to_c_int("threshold", threshold)?;
    let gdal = src.gdal();
    let api = gdal.api();
    run_with_options(gdal, "GDALSieveFilter", options, progress, |opts, pfn, arg| unsafe {
        (api.gdal_sieve_filter)(
            src.as_raw(),
            band_or_null(mask),
            dest.as_raw(),
            threshold,
            connectedness.as_native(),
            opts,
            pfn,
            arg,
        )
    })
}
