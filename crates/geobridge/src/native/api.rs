//! Function table of the native library
//!
//! Every entry point the binding calls is resolved once into a plain
//! `extern "C"` function pointer. The table is `Copy` and carries no
//! lifetime: whoever builds it must keep the backing code loaded for as long
//! as the table is used (`Gdal` keeps the `Library` next to it).

use super::loader::LoadError;
use super::types::*;
use libloading::Library;
use std::os::raw::{c_char, c_double, c_int, c_long, c_uint, c_void};

/// Installer of one virtual file system handler (`VSIInstall*Handler`)
pub type InstallFn = unsafe extern "C" fn();

/// Resolved native entry points
///
/// Fields are public so a test harness can provide an in-process
/// implementation of the same C ABI through [`crate::Gdal::from_api`].
#[derive(Clone, Copy)]
pub struct GdalApi {
    // --- Library / error state ---
    pub gdal_all_register: unsafe extern "C" fn(),
    pub gdal_version_info: unsafe extern "C" fn(*const c_char) -> *const c_char,
    pub cpl_error_reset: unsafe extern "C" fn(),
    pub cpl_get_last_error_no: unsafe extern "C" fn() -> c_int,
    pub cpl_get_last_error_msg: unsafe extern "C" fn() -> *const c_char,
    pub csl_destroy: unsafe extern "C" fn(*mut *mut c_char),

    // --- Datasets and handles ---
    pub gdal_open_ex: unsafe extern "C" fn(
        *const c_char,
        c_uint,
        *const *const c_char,
        *const *const c_char,
        *const *const c_char,
    ) -> GDALDatasetH,
    pub gdal_close: unsafe extern "C" fn(GDALDatasetH),
    pub gdal_get_raster_count: unsafe extern "C" fn(GDALDatasetH) -> c_int,
    pub gdal_get_raster_band: unsafe extern "C" fn(GDALDatasetH, c_int) -> GDALRasterBandH,
    pub gdal_get_raster_band_x_size: unsafe extern "C" fn(GDALRasterBandH) -> c_int,
    pub gdal_get_raster_band_y_size: unsafe extern "C" fn(GDALRasterBandH) -> c_int,
    pub gdal_dataset_get_layer_count: unsafe extern "C" fn(GDALDatasetH) -> c_int,
    pub gdal_dataset_get_layer: unsafe extern "C" fn(GDALDatasetH, c_int) -> OGRLayerH,
    pub gdal_create_color_table: unsafe extern "C" fn(c_int) -> GDALColorTableH,
    pub gdal_destroy_color_table: unsafe extern "C" fn(GDALColorTableH),
    pub gdal_get_color_entry_count: unsafe extern "C" fn(GDALColorTableH) -> c_int,
    pub gdal_create_warp_options: unsafe extern "C" fn() -> GDALWarpOptionsH,
    pub gdal_destroy_warp_options: unsafe extern "C" fn(GDALWarpOptionsH),

    // --- Algorithms ---
    pub gdal_compute_median_cut_pct: unsafe extern "C" fn(
        GDALRasterBandH,
        GDALRasterBandH,
        GDALRasterBandH,
        GDALIncludePixelFunc,
        c_int,
        GDALColorTableH,
        GDALProgressFunc,
        *mut c_void,
    ) -> c_int,
    pub gdal_dither_rgb2pct: unsafe extern "C" fn(
        GDALRasterBandH,
        GDALRasterBandH,
        GDALRasterBandH,
        GDALRasterBandH,
        GDALColorTableH,
        GDALProgressFunc,
        *mut c_void,
    ) -> c_int,
    pub gdal_checksum_image:
        unsafe extern "C" fn(GDALRasterBandH, c_int, c_int, c_int, c_int) -> c_int,
    pub gdal_compute_proximity: unsafe extern "C" fn(
        GDALRasterBandH,
        GDALRasterBandH,
        *mut *mut c_char,
        GDALProgressFunc,
        *mut c_void,
    ) -> CPLErr,
    pub gdal_fill_nodata: unsafe extern "C" fn(
        GDALRasterBandH,
        GDALRasterBandH,
        c_double,
        c_int,
        c_int,
        *mut *mut c_char,
        GDALProgressFunc,
        *mut c_void,
    ) -> CPLErr,
    pub gdal_polygonize: unsafe extern "C" fn(
        GDALRasterBandH,
        GDALRasterBandH,
        OGRLayerH,
        c_int,
        *mut *mut c_char,
        GDALProgressFunc,
        *mut c_void,
    ) -> CPLErr,
    pub gdal_fpolygonize: unsafe extern "C" fn(
        GDALRasterBandH,
        GDALRasterBandH,
        OGRLayerH,
        c_int,
        *mut *mut c_char,
        GDALProgressFunc,
        *mut c_void,
    ) -> CPLErr,
    pub gdal_sieve_filter: unsafe extern "C" fn(
        GDALRasterBandH,
        GDALRasterBandH,
        GDALRasterBandH,
        c_int,
        c_int,
        *mut *mut c_char,
        GDALProgressFunc,
        *mut c_void,
    ) -> CPLErr,
    pub gdal_reproject_image: unsafe extern "C" fn(
        GDALDatasetH,
        *const c_char,
        GDALDatasetH,
        *const c_char,
        c_int,
        c_double,
        c_double,
        GDALProgressFunc,
        *mut c_void,
        GDALWarpOptionsH,
    ) -> CPLErr,

    // --- Virtual file system ---
    pub vsi_fopen_l: unsafe extern "C" fn(*const c_char, *const c_char) -> *mut VSILFILE,
    pub vsi_fclose_l: unsafe extern "C" fn(*mut VSILFILE) -> c_int,
    pub vsi_fseek_l: unsafe extern "C" fn(*mut VSILFILE, vsi_l_offset, c_int) -> c_int,
    pub vsi_ftell_l: unsafe extern "C" fn(*mut VSILFILE) -> vsi_l_offset,
    pub vsi_fread_l: unsafe extern "C" fn(*mut c_void, usize, usize, *mut VSILFILE) -> usize,
    pub vsi_fwrite_l: unsafe extern "C" fn(*const c_void, usize, usize, *mut VSILFILE) -> usize,
    pub vsi_feof_l: unsafe extern "C" fn(*mut VSILFILE) -> c_int,
    pub vsi_ftruncate_l: unsafe extern "C" fn(*mut VSILFILE, vsi_l_offset) -> c_int,
    pub vsi_fflush_l: unsafe extern "C" fn(*mut VSILFILE) -> c_int,
    pub vsi_stat_ex_l: unsafe extern "C" fn(*const c_char, *mut VSIStatBufL, c_int) -> c_int,
    pub vsi_mkdir: unsafe extern "C" fn(*const c_char, c_long) -> c_int,
    pub vsi_mkdir_recursive: Option<unsafe extern "C" fn(*const c_char, c_long) -> c_int>,
    pub vsi_rmdir: unsafe extern "C" fn(*const c_char) -> c_int,
    pub vsi_unlink: unsafe extern "C" fn(*const c_char) -> c_int,
    pub vsi_rename: unsafe extern "C" fn(*const c_char, *const c_char) -> c_int,
    pub vsi_read_dir: unsafe extern "C" fn(*const c_char) -> *mut *mut c_char,
    pub vsi_file_from_mem_buffer:
        unsafe extern "C" fn(*const c_char, *mut u8, vsi_l_offset, c_int) -> *mut VSILFILE,
    pub vsi_get_mem_file_buffer:
        unsafe extern "C" fn(*const c_char, *mut vsi_l_offset, c_int) -> *mut u8,
    pub vsi_strerror: unsafe extern "C" fn(c_int) -> *const c_char,
    pub vsi_malloc: unsafe extern "C" fn(usize) -> *mut c_void,
    pub vsi_free: unsafe extern "C" fn(*mut c_void),

    // Handler installers are not exported by every build of the library
    pub vsi_install_mem_file_handler: Option<InstallFn>,
    pub vsi_install_large_file_handler: Option<InstallFn>,
    pub vsi_install_subfile_handler: Option<InstallFn>,
    pub vsi_install_sparse_file_handler: Option<InstallFn>,
    pub vsi_cleanup_file_manager: unsafe extern "C" fn(),
}

impl std::fmt::Debug for GdalApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GdalApi")
            .field("vsi_fopen_l", &(self.vsi_fopen_l as *const ()))
            .field("has_mkdir_recursive", &self.vsi_mkdir_recursive.is_some())
            .finish_non_exhaustive()
    }
}

/// Look up a required symbol and copy the function pointer out
///
/// # Safety
///
/// `T` must be the exact function pointer type of the symbol.
unsafe fn required<T: Copy>(library: &Library, origin: &str, symbol: &str) -> Result<T, LoadError> {
    library
        .get::<T>(symbol.as_bytes())
        .map(|sym| *sym)
        .map_err(|_| LoadError::SymbolNotFound {
            library: origin.to_string(),
            symbol: symbol.to_string(),
        })
}

/// Look up a symbol that older builds may not export
///
/// # Safety
///
/// Same contract as [`required`].
unsafe fn optional<T: Copy>(library: &Library, symbol: &str) -> Option<T> {
    let found = library.get::<T>(symbol.as_bytes()).map(|sym| *sym).ok();
    if found.is_none() {
        tracing::debug!(symbol, "optional native symbol not exported");
    }
    found
}

impl GdalApi {
    /// Resolve every entry point from a loaded library
    ///
    /// # Safety
    ///
    /// `library` must be a build of the native library whose C ABI matches
    /// the signatures declared in this table. The returned pointers are only
    /// valid while `library` stays loaded.
    pub unsafe fn resolve(library: &Library, origin: &str) -> Result<Self, LoadError> {
        Ok(Self {
            gdal_all_register: required(library, origin, "GDALAllRegister")?,
            gdal_version_info: required(library, origin, "GDALVersionInfo")?,
            cpl_error_reset: required(library, origin, "CPLErrorReset")?,
            cpl_get_last_error_no: required(library, origin, "CPLGetLastErrorNo")?,
            cpl_get_last_error_msg: required(library, origin, "CPLGetLastErrorMsg")?,
            csl_destroy: required(library, origin, "CSLDestroy")?,

            gdal_open_ex: required(library, origin, "GDALOpenEx")?,
            gdal_close: required(library, origin, "GDALClose")?,
            gdal_get_raster_count: required(library, origin, "GDALGetRasterCount")?,
            gdal_get_raster_band: required(library, origin, "GDALGetRasterBand")?,
            gdal_get_raster_band_x_size: required(library, origin, "GDALGetRasterBandXSize")?,
            gdal_get_raster_band_y_size: required(library, origin, "GDALGetRasterBandYSize")?,
            gdal_dataset_get_layer_count: required(library, origin, "GDALDatasetGetLayerCount")?,
            gdal_dataset_get_layer: required(library, origin, "GDALDatasetGetLayer")?,
            gdal_create_color_table: required(library, origin, "GDALCreateColorTable")?,
            gdal_destroy_color_table: required(library, origin, "GDALDestroyColorTable")?,
            gdal_get_color_entry_count: required(library, origin, "GDALGetColorEntryCount")?,
            gdal_create_warp_options: required(library, origin, "GDALCreateWarpOptions")?,
            gdal_destroy_warp_options: required(library, origin, "GDALDestroyWarpOptions")?,

            gdal_compute_median_cut_pct: required(library, origin, "GDALComputeMedianCutPCT")?,
            gdal_dither_rgb2pct: required(library, origin, "GDALDitherRGB2PCT")?,
            gdal_checksum_image: required(library, origin, "GDALChecksumImage")?,
            gdal_compute_proximity: required(library, origin, "GDALComputeProximity")?,
            gdal_fill_nodata: required(library, origin, "GDALFillNodata")?,
            gdal_polygonize: required(library, origin, "GDALPolygonize")?,
            gdal_fpolygonize: required(library, origin, "GDALFPolygonize")?,
            gdal_sieve_filter: required(library, origin, "GDALSieveFilter")?,
            gdal_reproject_image: required(library, origin, "GDALReprojectImage")?,

            vsi_fopen_l: required(library, origin, "VSIFOpenL")?,
            vsi_fclose_l: required(library, origin, "VSIFCloseL")?,
            vsi_fseek_l: required(library, origin, "VSIFSeekL")?,
            vsi_ftell_l: required(library, origin, "VSIFTellL")?,
            vsi_fread_l: required(library, origin, "VSIFReadL")?,
            vsi_fwrite_l: required(library, origin, "VSIFWriteL")?,
            vsi_feof_l: required(library, origin, "VSIFEofL")?,
            vsi_ftruncate_l: required(library, origin, "VSIFTruncateL")?,
            vsi_fflush_l: required(library, origin, "VSIFFlushL")?,
            vsi_stat_ex_l: required(library, origin, "VSIStatExL")?,
            vsi_mkdir: required(library, origin, "VSIMkdir")?,
            vsi_mkdir_recursive: optional(library, "VSIMkdirRecursive"),
            vsi_rmdir: required(library, origin, "VSIRmdir")?,
            vsi_unlink: required(library, origin, "VSIUnlink")?,
            vsi_rename: required(library, origin, "VSIRename")?,
            vsi_read_dir: required(library, origin, "VSIReadDir")?,
            vsi_file_from_mem_buffer: required(library, origin, "VSIFileFromMemBuffer")?,
            vsi_get_mem_file_buffer: required(library, origin, "VSIGetMemFileBuffer")?,
            vsi_strerror: required(library, origin, "VSIStrerror")?,
            vsi_malloc: required(library, origin, "VSIMalloc")?,
            vsi_free: required(library, origin, "VSIFree")?,

            vsi_install_mem_file_handler: optional(library, "VSIInstallMemFileHandler"),
            vsi_install_large_file_handler: optional(library, "VSIInstallLargeFileHandler"),
            vsi_install_subfile_handler: optional(library, "VSIInstallSubFileHandler"),
            vsi_install_sparse_file_handler: optional(library, "VSIInstallSparseFileHandler"),
            vsi_cleanup_file_manager: required(library, origin, "VSICleanupFileManager")?,
        })
    }
}
