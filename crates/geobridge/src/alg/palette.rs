//! Palette computation and dithering

use super::{run, to_c_int};
use crate::error::Result;
use crate::ffi::ProgressFn;
use crate::handle::{ColorTable, RasterBand};

/// Compute an optimal palette for an RGB image with the median cut algorithm
///
/// The result is written into `color_table`, which should be created empty.
pub fn compute_median_cut_pct(
    red: &RasterBand<'_>,
    green: &RasterBand<'_>,
    blue: &RasterBand<'_>,
    colors: usize,
    color_table: &ColorTable,
    progress: Option<ProgressFn<'_>>,
) -> Result<()> {
    let colors = to_c_int("color count", colors)?;
    let gdal = red.gdal();
    let api = gdal.api();

    run(gdal, "GDALComputeMedianCutPCT", progress, |pfn, arg| unsafe {
        (api.gdal_compute_median_cut_pct)(
            red.as_raw(),
            green.as_raw(),
            blue.as_raw(),
            None,
            colors,
            color_table.as_raw(),
            pfn,
            arg,
        )
    })
}

/// Convert an RGB image to a paletted one with Floyd-Steinberg dithering
pub fn dither_rgb_to_pct(
    red: &RasterBand<'_>,
    green: &RasterBand<'_>,
    blue: &RasterBand<'_>,
    target: &RasterBand<'_>,
    color_table: &ColorTable,
    progress: Option<ProgressFn<'_>>,
) -> Result<()> {
    let gdal = red.gdal();
    let api = gdal.api();

    run(gdal, "GDALDitherRGB2PCT", progress, |pfn, arg| unsafe {
        (api.gdal_dither_rgb2pct)(
            red.as_raw(),
            green.as_raw(),
            blue.as_raw(),
            target.as_raw(),
            color_table.as_raw(),
            pfn,
            arg,
        )
    })
}
