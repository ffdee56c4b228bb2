//! Image reprojection
//!
//! ```ignore
//! let params = ReprojectParams::new(&src, &dst)
//!     .dst_wkt(utm_wkt)
//!     .resample(ResampleAlg::Bilinear)
//!     .max_error(0.125);
//! reproject_image(&params, None)?;
//! ```

use super::run;
use crate::error::Result;
use crate::ffi::safety::c_string_or_null;
use crate::ffi::ProgressFn;
use crate::handle::{Dataset, WarpOptions};
use std::os::raw::c_int;
use std::ptr;

/// Resampling kernel (`GDALResampleAlg`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResampleAlg {
    #[default]
    NearestNeighbour,
    Bilinear,
    Cubic,
    CubicSpline,
    Lanczos,
    Average,
    Mode,
    Max,
    Min,
    Med,
    Q1,
    Q3,
    Sum,
    Rms,
}

impl ResampleAlg {
    fn as_native(self) -> c_int {
        match self {
            ResampleAlg::NearestNeighbour => 0,
            ResampleAlg::Bilinear => 1,
            ResampleAlg::Cubic => 2,
            ResampleAlg::CubicSpline => 3,
            ResampleAlg::Lanczos => 4,
            ResampleAlg::Average => 5,
            ResampleAlg::Mode => 6,
            // 7 is reserved
            ResampleAlg::Max => 8,
            ResampleAlg::Min => 9,
            ResampleAlg::Med => 10,
            ResampleAlg::Q1 => 11,
            ResampleAlg::Q3 => 12,
            ResampleAlg::Sum => 13,
            ResampleAlg::Rms => 14,
        }
    }
}

/// Arguments of one `GDALReprojectImage` call
///
/// Empty WKT strings mean "use the dataset's own projection" and are passed
/// down as null.
pub struct ReprojectParams<'a> {
    src: &'a Dataset,
    dst: &'a Dataset,
    src_wkt: String,
    dst_wkt: String,
    resample: ResampleAlg,
    memory_limit: f64,
    max_error: f64,
    warp_options: Option<&'a WarpOptions>,
}

impl<'a> ReprojectParams<'a> {
    pub fn new(src: &'a Dataset, dst: &'a Dataset) -> Self {
        Self {
            src,
            dst,
            src_wkt: String::new(),
            dst_wkt: String::new(),
            resample: ResampleAlg::default(),
            memory_limit: 0.0,
            max_error: 0.0,
            warp_options: None,
        }
    }

    pub fn src_wkt(mut self, wkt: impl Into<String>) -> Self {
        self.src_wkt = wkt.into();
        self
    }

    pub fn dst_wkt(mut self, wkt: impl Into<String>) -> Self {
        self.dst_wkt = wkt.into();
        self
    }

    pub fn resample(mut self, alg: ResampleAlg) -> Self {
        self.resample = alg;
        self
    }

    /// Working memory in bytes; 0 lets the library choose
    pub fn memory_limit(mut self, bytes: f64) -> Self {
        self.memory_limit = bytes;
        self
    }

    /// Maximum approximation error in pixels; 0 computes every pixel exactly
    pub fn max_error(mut self, pixels: f64) -> Self {
        self.max_error = pixels;
        self
    }

    pub fn warp_options(mut self, options: &'a WarpOptions) -> Self {
        self.warp_options = Some(options);
        self
    }
}

/// Reproject `params.src` into `params.dst`
pub fn reproject_image(params: &ReprojectParams<'_>, progress: Option<ProgressFn<'_>>) -> Result<()> {
    let src_wkt = c_string_or_null(&params.src_wkt)?;
    let dst_wkt = c_string_or_null(&params.dst_wkt)?;
    let warp_options = params
        .warp_options
        .map_or(ptr::null_mut(), |options| options.as_raw());

    let gdal = params.src.gdal();
    let api = gdal.api();
    run(gdal, "GDALReprojectImage", progress, |pfn, arg| unsafe {
        (api.gdal_reproject_image)(
            params.src.as_raw(),
            src_wkt.as_ref().map_or(ptr::null(), |s| s.as_ptr()),
            params.dst.as_raw(),
            dst_wkt.as_ref().map_or(ptr::null(), |s| s.as_ptr()),
            params.resample.as_native(),
            params.memory_limit,
            params.max_error,
            pfn,
            arg,
            warp_options,
        )
    })
}
