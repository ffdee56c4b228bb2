//! Native object handles
//!
//! Opaque references to datasets, raster bands, vector layers, color tables
//! and warp options. The binding never looks inside them. Objects created
//! through a native create/open call are released by `Drop` with the matching
//! destroy/close call; objects adopted with `from_raw` are borrowed and left
//! alone.

use crate::context::Gdal;
use crate::error::{Error, Result};
use crate::ffi::safety::{c_string, check_handle};
use crate::native::types::*;
use std::marker::PhantomData;
use std::os::raw::{c_int, c_void};
use std::ptr::{self, NonNull};

/// Access mode for [`Dataset::open`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Access {
    #[default]
    ReadOnly,
    Update,
}

/// An open raster and/or vector dataset
#[derive(Debug)]
pub struct Dataset {
    gdal: Gdal,
    raw: NonNull<c_void>,
    owned: bool,
}

impl Dataset {
    /// Open a dataset with `GDALOpenEx`, raster and vector drivers enabled
    pub fn open(gdal: &Gdal, path: &str, access: Access) -> Result<Self> {
        let c_path = c_string(path)?;
        let mode = match access {
            Access::ReadOnly => GDAL_OF_READONLY,
            Access::Update => GDAL_OF_UPDATE,
        };
        let flags = mode | GDAL_OF_RASTER | GDAL_OF_VECTOR | GDAL_OF_VERBOSE_ERROR;

        gdal.reset_error();
        let raw = unsafe {
            (gdal.api().gdal_open_ex)(c_path.as_ptr(), flags, ptr::null(), ptr::null(), ptr::null())
        };
        let Some(raw) = NonNull::new(raw) else {
            return Err(gdal.native_error("GDALOpenEx", CE_FAILURE));
        };

        tracing::debug!(path, ?access, "opened dataset");
        Ok(Self {
            gdal: gdal.clone(),
            raw,
            owned: true,
        })
    }

    /// Adopt a dataset opened elsewhere; it is not closed on drop
    ///
    /// # Safety
    ///
    /// `raw` must be null or a live `GDALDatasetH` of the same library as
    /// `gdal`, and must outlive the returned value.
    pub unsafe fn from_raw(gdal: &Gdal, raw: GDALDatasetH) -> Result<Self> {
        Ok(Self {
            gdal: gdal.clone(),
            raw: check_handle(raw, "dataset")?,
            owned: false,
        })
    }

    pub fn as_raw(&self) -> GDALDatasetH {
        self.raw.as_ptr()
    }

    pub fn gdal(&self) -> &Gdal {
        &self.gdal
    }

    pub fn raster_count(&self) -> usize {
        let count = unsafe { (self.gdal.api().gdal_get_raster_count)(self.as_raw()) };
        usize::try_from(count).unwrap_or(0)
    }

    /// Raster band by 1-based index
    pub fn band(&self, index: usize) -> Result<RasterBand<'_>> {
        let count = self.raster_count();
        if index == 0 || index > count {
            return Err(Error::invalid(format!(
                "band index {} out of range 1..={}",
                index, count
            )));
        }
        let raw = unsafe { (self.gdal.api().gdal_get_raster_band)(self.as_raw(), index as c_int) };
        unsafe { RasterBand::from_raw(&self.gdal, raw) }
    }

    pub fn layer_count(&self) -> usize {
        let count = unsafe { (self.gdal.api().gdal_dataset_get_layer_count)(self.as_raw()) };
        usize::try_from(count).unwrap_or(0)
    }

    /// Vector layer by 0-based index
    pub fn layer(&self, index: usize) -> Result<Layer<'_>> {
        let count = self.layer_count();
        if index >= count {
            return Err(Error::invalid(format!(
                "layer index {} out of range 0..{}",
                index, count
            )));
        }
        let raw = unsafe { (self.gdal.api().gdal_dataset_get_layer)(self.as_raw(), index as c_int) };
        unsafe { Layer::from_raw(&self.gdal, raw) }
    }
}

impl Drop for Dataset {
    fn drop(&mut self) {
        if self.owned {
            unsafe { (self.gdal.api().gdal_close)(self.as_raw()) };
        }
    }
}

/// A raster band borrowed from its dataset
pub struct RasterBand<'a> {
    gdal: Gdal,
    raw: NonNull<c_void>,
    _dataset: PhantomData<&'a Dataset>,
}

impl<'a> RasterBand<'a> {
    /// Wrap a band handle
    ///
    /// # Safety
    ///
    /// `raw` must be null or a live `GDALRasterBandH` of the same library as
    /// `gdal`, valid for `'a`.
    pub unsafe fn from_raw(gdal: &Gdal, raw: GDALRasterBandH) -> Result<Self> {
        Ok(Self {
            gdal: gdal.clone(),
            raw: check_handle(raw, "raster band")?,
            _dataset: PhantomData,
        })
    }

    pub fn as_raw(&self) -> GDALRasterBandH {
        self.raw.as_ptr()
    }

    pub fn gdal(&self) -> &Gdal {
        &self.gdal
    }

    /// Band size in pixels as `(width, height)`
    pub fn size(&self) -> (usize, usize) {
        let api = self.gdal.api();
        let x = unsafe { (api.gdal_get_raster_band_x_size)(self.as_raw()) };
        let y = unsafe { (api.gdal_get_raster_band_y_size)(self.as_raw()) };
        (
            usize::try_from(x).unwrap_or(0),
            usize::try_from(y).unwrap_or(0),
        )
    }
}

/// A vector layer borrowed from its dataset
pub struct Layer<'a> {
    gdal: Gdal,
    raw: NonNull<c_void>,
    _dataset: PhantomData<&'a Dataset>,
}

impl<'a> Layer<'a> {
    /// Wrap a layer handle
    ///
    /// # Safety
    ///
    /// `raw` must be null or a live `OGRLayerH` of the same library as
    /// `gdal`, valid for `'a`.
    pub unsafe fn from_raw(gdal: &Gdal, raw: OGRLayerH) -> Result<Self> {
        Ok(Self {
            gdal: gdal.clone(),
            raw: check_handle(raw, "layer")?,
            _dataset: PhantomData,
        })
    }

    pub fn as_raw(&self) -> OGRLayerH {
        self.raw.as_ptr()
    }
}

/// Color interpretation of a palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaletteInterp {
    Gray,
    #[default]
    Rgb,
    Cmyk,
    Hls,
}

impl PaletteInterp {
    fn as_native(self) -> c_int {
        match self {
            PaletteInterp::Gray => GPI_GRAY,
            PaletteInterp::Rgb => GPI_RGB,
            PaletteInterp::Cmyk => GPI_CMYK,
            PaletteInterp::Hls => GPI_HLS,
        }
    }
}

/// A color table, filled by the palette algorithms
#[derive(Debug)]
pub struct ColorTable {
    gdal: Gdal,
    raw: NonNull<c_void>,
    owned: bool,
}

impl ColorTable {
    /// Create an empty table owned by this value
    pub fn new(gdal: &Gdal, interp: PaletteInterp) -> Result<Self> {
        let raw = unsafe { (gdal.api().gdal_create_color_table)(interp.as_native()) };
        Ok(Self {
            gdal: gdal.clone(),
            raw: check_handle(raw, "color table")?,
            owned: true,
        })
    }

    /// Borrow a table owned by someone else (for example a band's palette)
    ///
    /// # Safety
    ///
    /// `raw` must be null or a live `GDALColorTableH` of the same library as
    /// `gdal`, and must outlive the returned value.
    pub unsafe fn from_raw(gdal: &Gdal, raw: GDALColorTableH) -> Result<Self> {
        Ok(Self {
            gdal: gdal.clone(),
            raw: check_handle(raw, "color table")?,
            owned: false,
        })
    }

    pub fn as_raw(&self) -> GDALColorTableH {
        self.raw.as_ptr()
    }

    /// Number of palette entries
    pub fn entry_count(&self) -> usize {
        let count = unsafe { (self.gdal.api().gdal_get_color_entry_count)(self.as_raw()) };
        usize::try_from(count).unwrap_or(0)
    }
}

impl Drop for ColorTable {
    fn drop(&mut self) {
        if self.owned {
            unsafe { (self.gdal.api().gdal_destroy_color_table)(self.as_raw()) };
        }
    }
}

/// Native warp options passed through to reprojection
pub struct WarpOptions {
    gdal: Gdal,
    raw: NonNull<c_void>,
}

impl WarpOptions {
    pub fn new(gdal: &Gdal) -> Result<Self> {
        let raw = unsafe { (gdal.api().gdal_create_warp_options)() };
        Ok(Self {
            gdal: gdal.clone(),
            raw: check_handle(raw, "warp options")?,
        })
    }

    pub fn as_raw(&self) -> GDALWarpOptionsH {
        self.raw.as_ptr()
    }
}

impl Drop for WarpOptions {
    fn drop(&mut self) {
        unsafe { (self.gdal.api().gdal_destroy_warp_options)(self.as_raw()) };
    }
}
