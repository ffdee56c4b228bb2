//! In-process stand-in for the native library
//!
//! Implements the C ABI of every entry point in `GdalApi` on top of a
//! thread-local state, so each test thread gets its own private "library".
//! Besides behaving like a small in-memory file system and algorithm host,
//! the fake records what crossed the boundary: option lists, progress
//! pointers, memory buffer pointers and ownership flags, frees and installs.

use geobridge::native::types::*;
use geobridge::{Gdal, GdalApi};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_double, c_int, c_long, c_uint, c_void};
use std::ptr;

pub const CPLE_APP_DEFINED: c_int = 1;
pub const CPLE_OPEN_FAILED: c_int = 4;
pub const CPLE_ILLEGAL_ARG: c_int = 5;

/// Contents of one fake file
pub enum Storage {
    Owned(Vec<u8>),
    /// Host memory lent through `VSIFileFromMemBuffer(.., FALSE)`
    Borrowed { ptr: *mut u8, len: usize },
}

impl Storage {
    pub fn bytes(&self) -> &[u8] {
        match self {
            Storage::Owned(v) => v,
            Storage::Borrowed { ptr, len } => unsafe { std::slice::from_raw_parts(*ptr, *len) },
        }
    }

    fn len(&self) -> usize {
        self.bytes().len()
    }

    /// Write at `pos`; borrowed storage cannot grow
    fn write_at(&mut self, pos: usize, data: &[u8]) -> bool {
        let end = pos + data.len();
        match self {
            Storage::Owned(v) => {
                if v.len() < end {
                    v.resize(end, 0);
                }
                v[pos..end].copy_from_slice(data);
                true
            }
            Storage::Borrowed { ptr, len } => {
                if end > *len {
                    return false;
                }
                unsafe { ptr::copy_nonoverlapping(data.as_ptr(), ptr.add(pos), data.len()) };
                true
            }
        }
    }

    fn set_len(&mut self, new_len: usize) -> bool {
        match self {
            Storage::Owned(v) => {
                v.resize(new_len, 0);
                true
            }
            Storage::Borrowed { len, .. } if new_len <= *len => {
                *len = new_len;
                true
            }
            Storage::Borrowed { .. } => false,
        }
    }
}

pub struct OpenFile {
    pub path: String,
    pub pos: u64,
    pub eof: bool,
    pub writable: bool,
}

/// One `VSIFileFromMemBuffer` call
#[derive(Debug, Clone, PartialEq)]
pub struct MemBufferCall {
    pub path: String,
    pub data: usize,
    pub len: u64,
    pub take_ownership: bool,
}

/// One algorithm call as seen by the native side
#[derive(Debug, Clone, Default)]
pub struct AlgCall {
    pub function: &'static str,
    pub handles: Vec<usize>,
    pub ints: Vec<c_int>,
    pub doubles: Vec<f64>,
    pub strings: Vec<Option<String>>,
    /// `None` when the option array pointer itself was null
    pub options: Option<Vec<String>>,
    pub had_progress: bool,
    pub progress_arg_null: bool,
    pub cancelled: bool,
}

pub struct DatasetInfo {
    pub bands: Vec<usize>,
    pub layers: Vec<usize>,
}

/// A scripted native failure for the next algorithm call
#[derive(Debug, Clone)]
pub struct Failure {
    pub code: CPLErr,
    pub errno: c_int,
    pub message: String,
}

pub struct FakeState {
    pub files: BTreeMap<String, Storage>,
    pub dirs: BTreeSet<String>,
    pub handles: HashMap<usize, OpenFile>,
    pub closed_handles: usize,
    pub flushes: usize,
    next_id: usize,

    pub last_errno: c_int,
    last_msg: CString,
    strerror_buf: CString,

    pub register_calls: usize,
    pub error_resets: usize,
    pub installs: HashMap<&'static str, usize>,
    pub cleanups: usize,

    pub mem_buffer_calls: Vec<MemBufferCall>,
    pub fail_mem_buffer: bool,
    pub mallocs: Vec<usize>,
    pub frees: Vec<usize>,
    pub seized: Vec<usize>,
    pub csl_destroyed: usize,
    pub stat_flags: Vec<c_int>,

    pub datasets: HashMap<usize, DatasetInfo>,
    pub dataset_paths: HashMap<String, usize>,
    pub open_flags: Vec<c_uint>,
    pub closed_datasets: Vec<usize>,
    pub band_sizes: HashMap<usize, (c_int, c_int)>,
    pub color_tables: HashMap<usize, c_int>,
    pub destroyed_color_tables: Vec<usize>,
    pub warp_options: Vec<usize>,
    pub destroyed_warp_options: Vec<usize>,

    pub calls: Vec<AlgCall>,
    pub progress_script: Vec<(f64, Option<String>)>,
    pub fail_next: Option<Failure>,
    pub checksum_result: c_int,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            files: BTreeMap::new(),
            dirs: BTreeSet::new(),
            handles: HashMap::new(),
            closed_handles: 0,
            flushes: 0,
            next_id: 0x1000,
            last_errno: 0,
            last_msg: CString::default(),
            strerror_buf: CString::default(),
            register_calls: 0,
            error_resets: 0,
            installs: HashMap::new(),
            cleanups: 0,
            mem_buffer_calls: Vec::new(),
            fail_mem_buffer: false,
            mallocs: Vec::new(),
            frees: Vec::new(),
            seized: Vec::new(),
            csl_destroyed: 0,
            stat_flags: Vec::new(),
            datasets: HashMap::new(),
            dataset_paths: HashMap::new(),
            open_flags: Vec::new(),
            closed_datasets: Vec::new(),
            band_sizes: HashMap::new(),
            color_tables: HashMap::new(),
            destroyed_color_tables: Vec::new(),
            warp_options: Vec::new(),
            destroyed_warp_options: Vec::new(),
            calls: Vec::new(),
            progress_script: vec![
                (0.0, None),
                (0.5, Some("halfway".to_string())),
                (1.0, None),
            ],
            fail_next: None,
            checksum_result: 4242,
        }
    }
}

impl FakeState {
    fn next_id(&mut self) -> usize {
        self.next_id += 8;
        self.next_id
    }

    fn set_error(&mut self, errno: c_int, message: &str) {
        self.last_errno = errno;
        self.last_msg = CString::new(message).unwrap();
    }

    fn is_dir(&self, path: &str) -> bool {
        let path = path.trim_end_matches('/');
        self.dirs.contains(path) || self.children(path).next().is_some()
    }

    fn children<'a>(&'a self, dir: &'a str) -> impl Iterator<Item = String> + 'a {
        let prefix = format!("{}/", dir.trim_end_matches('/'));
        let files = self.files.keys().map(String::as_str);
        let dirs = self.dirs.iter().map(String::as_str);
        let prefix_len = prefix.len();
        files
            .chain(dirs)
            .filter(move |p| p.starts_with(&prefix) && p.len() > prefix_len)
            .map(move |p| {
                let rest = &p[prefix_len..];
                rest.split('/').next().unwrap_or(rest).to_string()
            })
    }
}

thread_local! {
    static STATE: RefCell<FakeState> = RefCell::new(FakeState::default());
}

/// Inspect or script the fake library of the current thread
pub fn with_state<R>(f: impl FnOnce(&mut FakeState) -> R) -> R {
    STATE.with(|s| f(&mut s.borrow_mut()))
}

/// Forget everything, including files and recorded calls
pub fn reset() {
    STATE.with(|s| *s.borrow_mut() = FakeState::default());
}

/// Register a dataset reachable through `GDALOpenEx(path)`
///
/// Every band is `size` pixels.
pub fn register_dataset(path: &str, bands: usize, layers: usize, size: (c_int, c_int)) -> usize {
    with_state(|s| {
        let id = s.next_id();
        let band_ids: Vec<usize> = (0..bands).map(|_| s.next_id()).collect();
        for band in &band_ids {
            s.band_sizes.insert(*band, size);
        }
        let layer_ids = (0..layers).map(|_| s.next_id()).collect();
        s.datasets.insert(
            id,
            DatasetInfo {
                bands: band_ids,
                layers: layer_ids,
            },
        );
        s.dataset_paths.insert(path.to_string(), id);
        id
    })
}

/// Make the next algorithm call fail with `code`
pub fn fail_next_call(code: CPLErr, errno: c_int, message: &str) {
    with_state(|s| {
        s.fail_next = Some(Failure {
            code,
            errno,
            message: message.to_string(),
        })
    });
}

pub fn last_call() -> AlgCall {
    with_state(|s| s.calls.last().cloned().expect("no algorithm call recorded"))
}

pub fn install_count(symbol: &str) -> usize {
    with_state(|s| s.installs.get(symbol).copied().unwrap_or(0))
}

pub fn file_bytes(path: &str) -> Option<Vec<u8>> {
    with_state(|s| s.files.get(path).map(|f| f.bytes().to_vec()))
}

/// Function table pointing at this fake
pub fn fake_api() -> GdalApi {
    GdalApi {
        gdal_all_register: fake_all_register,
        gdal_version_info: fake_version_info,
        cpl_error_reset: fake_error_reset,
        cpl_get_last_error_no: fake_last_error_no,
        cpl_get_last_error_msg: fake_last_error_msg,
        csl_destroy: fake_csl_destroy,

        gdal_open_ex: fake_open_ex,
        gdal_close: fake_close,
        gdal_get_raster_count: fake_raster_count,
        gdal_get_raster_band: fake_raster_band,
        gdal_get_raster_band_x_size: fake_band_x_size,
        gdal_get_raster_band_y_size: fake_band_y_size,
        gdal_dataset_get_layer_count: fake_layer_count,
        gdal_dataset_get_layer: fake_layer,
        gdal_create_color_table: fake_create_color_table,
        gdal_destroy_color_table: fake_destroy_color_table,
        gdal_get_color_entry_count: fake_color_entry_count,
        gdal_create_warp_options: fake_create_warp_options,
        gdal_destroy_warp_options: fake_destroy_warp_options,

        gdal_compute_median_cut_pct: fake_median_cut,
        gdal_dither_rgb2pct: fake_dither,
        gdal_checksum_image: fake_checksum,
        gdal_compute_proximity: fake_proximity,
        gdal_fill_nodata: fake_fill_nodata,
        gdal_polygonize: fake_polygonize,
        gdal_fpolygonize: fake_fpolygonize,
        gdal_sieve_filter: fake_sieve,
        gdal_reproject_image: fake_reproject,

        vsi_fopen_l: fake_fopen,
        vsi_fclose_l: fake_fclose,
        vsi_fseek_l: fake_fseek,
        vsi_ftell_l: fake_ftell,
        vsi_fread_l: fake_fread,
        vsi_fwrite_l: fake_fwrite,
        vsi_feof_l: fake_feof,
        vsi_ftruncate_l: fake_ftruncate,
        vsi_fflush_l: fake_fflush,
        vsi_stat_ex_l: fake_stat,
        vsi_mkdir: fake_mkdir,
        vsi_mkdir_recursive: Some(fake_mkdir_recursive),
        vsi_rmdir: fake_rmdir,
        vsi_unlink: fake_unlink,
        vsi_rename: fake_rename,
        vsi_read_dir: fake_read_dir,
        vsi_file_from_mem_buffer: fake_from_mem_buffer,
        vsi_get_mem_file_buffer: fake_get_mem_buffer,
        vsi_strerror: fake_strerror,
        vsi_malloc: fake_malloc,
        vsi_free: fake_free,

        vsi_install_mem_file_handler: Some(fake_install_mem),
        vsi_install_large_file_handler: Some(fake_install_large),
        vsi_install_subfile_handler: Some(fake_install_subfile),
        vsi_install_sparse_file_handler: Some(fake_install_sparse),
        vsi_cleanup_file_manager: fake_cleanup,
    }
}

/// Fresh fake state plus a `Gdal` bound to it
pub fn fake_gdal() -> Gdal {
    reset();
    unsafe { Gdal::from_api(fake_api()) }
}

/// Same as [`fake_gdal`] with `api` adjusted first (e.g. optional symbols removed)
pub fn fake_gdal_with(adjust: impl FnOnce(&mut GdalApi)) -> Gdal {
    reset();
    let mut api = fake_api();
    adjust(&mut api);
    unsafe { Gdal::from_api(api) }
}

unsafe fn string_arg(ptr: *const c_char) -> Option<String> {
    (!ptr.is_null()).then(|| CStr::from_ptr(ptr).to_string_lossy().into_owned())
}

unsafe fn path_arg(ptr: *const c_char) -> String {
    string_arg(ptr).unwrap_or_default()
}

unsafe fn csl_arg(list: *mut *mut c_char) -> Option<Vec<String>> {
    if list.is_null() {
        return None;
    }
    let mut out = Vec::new();
    let mut cursor = list;
    while !(*cursor).is_null() {
        out.push(path_arg(*cursor));
        cursor = cursor.add(1);
    }
    Some(out)
}

fn id<T>(ptr: *mut T) -> usize {
    ptr as usize
}

// ----- library and error state -----

unsafe extern "C" fn fake_all_register() {
    with_state(|s| s.register_calls += 1);
}

unsafe extern "C" fn fake_version_info(_request: *const c_char) -> *const c_char {
    b"3.8.4\0".as_ptr() as *const c_char
}

unsafe extern "C" fn fake_error_reset() {
    with_state(|s| {
        s.error_resets += 1;
        s.set_error(0, "");
    });
}

unsafe extern "C" fn fake_last_error_no() -> c_int {
    with_state(|s| s.last_errno)
}

unsafe extern "C" fn fake_last_error_msg() -> *const c_char {
    with_state(|s| s.last_msg.as_ptr())
}

unsafe extern "C" fn fake_csl_destroy(list: *mut *mut c_char) {
    if list.is_null() {
        return;
    }
    let mut cursor = list;
    while !(*cursor).is_null() {
        libc::free(*cursor as *mut c_void);
        cursor = cursor.add(1);
    }
    libc::free(list as *mut c_void);
    with_state(|s| s.csl_destroyed += 1);
}

// ----- datasets and handles -----

unsafe extern "C" fn fake_open_ex(
    path: *const c_char,
    flags: c_uint,
    _drivers: *const *const c_char,
    _open_options: *const *const c_char,
    _siblings: *const *const c_char,
) -> GDALDatasetH {
    let path = path_arg(path);
    with_state(|s| {
        s.open_flags.push(flags);
        match s.dataset_paths.get(&path) {
            Some(id) => *id as GDALDatasetH,
            None => {
                s.set_error(
                    CPLE_OPEN_FAILED,
                    &format!("{}: No such file or directory", path),
                );
                ptr::null_mut()
            }
        }
    })
}

unsafe extern "C" fn fake_close(dataset: GDALDatasetH) {
    with_state(|s| s.closed_datasets.push(id(dataset)));
}

unsafe extern "C" fn fake_raster_count(dataset: GDALDatasetH) -> c_int {
    with_state(|s| s.datasets.get(&id(dataset)).map_or(0, |d| d.bands.len() as c_int))
}

unsafe extern "C" fn fake_raster_band(dataset: GDALDatasetH, index: c_int) -> GDALRasterBandH {
    with_state(|s| {
        s.datasets
            .get(&id(dataset))
            .and_then(|d| d.bands.get((index - 1) as usize))
            .map_or(ptr::null_mut(), |b| *b as GDALRasterBandH)
    })
}

unsafe extern "C" fn fake_band_x_size(band: GDALRasterBandH) -> c_int {
    with_state(|s| s.band_sizes.get(&id(band)).map_or(0, |size| size.0))
}

unsafe extern "C" fn fake_band_y_size(band: GDALRasterBandH) -> c_int {
    with_state(|s| s.band_sizes.get(&id(band)).map_or(0, |size| size.1))
}

unsafe extern "C" fn fake_layer_count(dataset: GDALDatasetH) -> c_int {
    with_state(|s| s.datasets.get(&id(dataset)).map_or(0, |d| d.layers.len() as c_int))
}

unsafe extern "C" fn fake_layer(dataset: GDALDatasetH, index: c_int) -> OGRLayerH {
    with_state(|s| {
        s.datasets
            .get(&id(dataset))
            .and_then(|d| d.layers.get(index as usize))
            .map_or(ptr::null_mut(), |l| *l as OGRLayerH)
    })
}

unsafe extern "C" fn fake_create_color_table(_interp: c_int) -> GDALColorTableH {
    with_state(|s| {
        let id = s.next_id();
        s.color_tables.insert(id, 0);
        id as GDALColorTableH
    })
}

unsafe extern "C" fn fake_destroy_color_table(table: GDALColorTableH) {
    with_state(|s| {
        s.color_tables.remove(&id(table));
        s.destroyed_color_tables.push(id(table));
    });
}

unsafe extern "C" fn fake_color_entry_count(table: GDALColorTableH) -> c_int {
    with_state(|s| s.color_tables.get(&id(table)).copied().unwrap_or(0))
}

unsafe extern "C" fn fake_create_warp_options() -> GDALWarpOptionsH {
    with_state(|s| {
        let id = s.next_id();
        s.warp_options.push(id);
        id as GDALWarpOptionsH
    })
}

unsafe extern "C" fn fake_destroy_warp_options(options: GDALWarpOptionsH) {
    with_state(|s| s.destroyed_warp_options.push(id(options)));
}

// ----- algorithms -----

/// Record the call, drive the progress script, then apply any scripted failure
unsafe fn run_algorithm(mut call: AlgCall, pfn: GDALProgressFunc, arg: *mut c_void) -> CPLErr {
    call.had_progress = pfn.is_some();
    call.progress_arg_null = arg.is_null();

    let script = with_state(|s| s.progress_script.clone());
    if let Some(pfn) = pfn {
        for (fraction, message) in script {
            let message = message.map(|m| CString::new(m).unwrap());
            let msg_ptr = message.as_ref().map_or(ptr::null(), |m| m.as_ptr());
            // No state borrow is held while host code runs
            if pfn(fraction, msg_ptr, arg) == 0 {
                call.cancelled = true;
                break;
            }
        }
    }

    with_state(|s| {
        let cancelled = call.cancelled;
        s.calls.push(call);
        if cancelled {
            s.set_error(CPLE_USER_INTERRUPT, "User terminated");
            return CE_FAILURE;
        }
        match s.fail_next.take() {
            Some(failure) => {
                s.set_error(failure.errno, &failure.message);
                failure.code
            }
            None => CE_NONE,
        }
    })
}

unsafe extern "C" fn fake_median_cut(
    red: GDALRasterBandH,
    green: GDALRasterBandH,
    blue: GDALRasterBandH,
    _include: GDALIncludePixelFunc,
    colors: c_int,
    table: GDALColorTableH,
    pfn: GDALProgressFunc,
    arg: *mut c_void,
) -> c_int {
    let call = AlgCall {
        function: "GDALComputeMedianCutPCT",
        handles: vec![id(red), id(green), id(blue), id(table)],
        ints: vec![colors],
        ..Default::default()
    };
    let code = run_algorithm(call, pfn, arg);
    if code == CE_NONE {
        with_state(|s| s.color_tables.insert(id(table), colors));
    }
    code
}

unsafe extern "C" fn fake_dither(
    red: GDALRasterBandH,
    green: GDALRasterBandH,
    blue: GDALRasterBandH,
    target: GDALRasterBandH,
    table: GDALColorTableH,
    pfn: GDALProgressFunc,
    arg: *mut c_void,
) -> c_int {
    let call = AlgCall {
        function: "GDALDitherRGB2PCT",
        handles: vec![id(red), id(green), id(blue), id(target), id(table)],
        ..Default::default()
    };
    run_algorithm(call, pfn, arg)
}

unsafe extern "C" fn fake_checksum(
    band: GDALRasterBandH,
    x_off: c_int,
    y_off: c_int,
    x_size: c_int,
    y_size: c_int,
) -> c_int {
    with_state(|s| {
        s.calls.push(AlgCall {
            function: "GDALChecksumImage",
            handles: vec![id(band)],
            ints: vec![x_off, y_off, x_size, y_size],
            ..Default::default()
        });
        if s.checksum_result < 0 {
            s.set_error(CPLE_APP_DEFINED, "Checksum failed");
        }
        s.checksum_result
    })
}

unsafe extern "C" fn fake_proximity(
    src: GDALRasterBandH,
    dest: GDALRasterBandH,
    options: *mut *mut c_char,
    pfn: GDALProgressFunc,
    arg: *mut c_void,
) -> CPLErr {
    let call = AlgCall {
        function: "GDALComputeProximity",
        handles: vec![id(src), id(dest)],
        options: csl_arg(options),
        ..Default::default()
    };
    run_algorithm(call, pfn, arg)
}

unsafe extern "C" fn fake_fill_nodata(
    target: GDALRasterBandH,
    mask: GDALRasterBandH,
    max_search_dist: c_double,
    deprecated: c_int,
    smoothing_iterations: c_int,
    options: *mut *mut c_char,
    pfn: GDALProgressFunc,
    arg: *mut c_void,
) -> CPLErr {
    let call = AlgCall {
        function: "GDALFillNodata",
        handles: vec![id(target), id(mask)],
        ints: vec![deprecated, smoothing_iterations],
        doubles: vec![max_search_dist],
        options: csl_arg(options),
        ..Default::default()
    };
    run_algorithm(call, pfn, arg)
}

unsafe fn polygonize_call(
    function: &'static str,
    src: GDALRasterBandH,
    mask: GDALRasterBandH,
    layer: OGRLayerH,
    field: c_int,
    options: *mut *mut c_char,
) -> AlgCall {
    AlgCall {
        function,
        handles: vec![id(src), id(mask), id(layer)],
        ints: vec![field],
        options: csl_arg(options),
        ..Default::default()
    }
}

unsafe extern "C" fn fake_polygonize(
    src: GDALRasterBandH,
    mask: GDALRasterBandH,
    layer: OGRLayerH,
    field: c_int,
    options: *mut *mut c_char,
    pfn: GDALProgressFunc,
    arg: *mut c_void,
) -> CPLErr {
    let call = polygonize_call("GDALPolygonize", src, mask, layer, field, options);
    run_algorithm(call, pfn, arg)
}

unsafe extern "C" fn fake_fpolygonize(
    src: GDALRasterBandH,
    mask: GDALRasterBandH,
    layer: OGRLayerH,
    field: c_int,
    options: *mut *mut c_char,
    pfn: GDALProgressFunc,
    arg: *mut c_void,
) -> CPLErr {
    let call = polygonize_call("GDALFPolygonize", src, mask, layer, field, options);
    run_algorithm(call, pfn, arg)
}

unsafe extern "C" fn fake_sieve(
    src: GDALRasterBandH,
    mask: GDALRasterBandH,
    dest: GDALRasterBandH,
    threshold: c_int,
    connectedness: c_int,
    options: *mut *mut c_char,
    pfn: GDALProgressFunc,
    arg: *mut c_void,
) -> CPLErr {
    let call = AlgCall {
        function: "GDALSieveFilter",
        handles: vec![id(src), id(mask), id(dest)],
        ints: vec![threshold, connectedness],
        options: csl_arg(options),
        ..Default::default()
    };
    run_algorithm(call, pfn, arg)
}

unsafe extern "C" fn fake_reproject(
    src: GDALDatasetH,
    src_wkt: *const c_char,
    dst: GDALDatasetH,
    dst_wkt: *const c_char,
    resample: c_int,
    memory_limit: c_double,
    max_error: c_double,
    pfn: GDALProgressFunc,
    arg: *mut c_void,
    warp_options: GDALWarpOptionsH,
) -> CPLErr {
    let call = AlgCall {
        function: "GDALReprojectImage",
        handles: vec![id(src), id(dst), id(warp_options)],
        ints: vec![resample],
        doubles: vec![memory_limit, max_error],
        strings: vec![string_arg(src_wkt), string_arg(dst_wkt)],
        ..Default::default()
    };
    run_algorithm(call, pfn, arg)
}

// ----- virtual file system: handles -----

fn new_handle(s: &mut FakeState, path: String, pos: u64, writable: bool) -> *mut VSILFILE {
    let id = s.next_id();
    s.handles.insert(
        id,
        OpenFile {
            path,
            pos,
            eof: false,
            writable,
        },
    );
    id as *mut VSILFILE
}

unsafe extern "C" fn fake_fopen(path: *const c_char, mode: *const c_char) -> *mut VSILFILE {
    let path = path_arg(path);
    let mode = path_arg(mode).replace('b', "");
    with_state(|s| {
        let exists = s.files.contains_key(&path);
        match mode.as_str() {
            "r" | "r+" if !exists => {
                s.set_error(CPLE_OPEN_FAILED, "No such file or directory");
                ptr::null_mut()
            }
            "r" => new_handle(s, path, 0, false),
            "r+" => new_handle(s, path, 0, true),
            "w" | "w+" => {
                s.files.insert(path.clone(), Storage::Owned(Vec::new()));
                new_handle(s, path, 0, true)
            }
            "a" | "a+" => {
                let len = s
                    .files
                    .entry(path.clone())
                    .or_insert_with(|| Storage::Owned(Vec::new()))
                    .len();
                new_handle(s, path, len as u64, true)
            }
            _ => ptr::null_mut(),
        }
    })
}

unsafe extern "C" fn fake_fclose(fp: *mut VSILFILE) -> c_int {
    with_state(|s| match s.handles.remove(&id(fp)) {
        Some(_) => {
            s.closed_handles += 1;
            0
        }
        None => -1,
    })
}

unsafe extern "C" fn fake_fseek(fp: *mut VSILFILE, offset: vsi_l_offset, whence: c_int) -> c_int {
    with_state(|s| {
        let len = match s.handles.get(&id(fp)) {
            Some(h) => s.files.get(&h.path).map_or(0, |f| f.len()) as u64,
            None => return -1,
        };
        let Some(handle) = s.handles.get_mut(&id(fp)) else {
            return -1;
        };
        handle.pos = match whence {
            SEEK_SET => offset,
            SEEK_CUR => handle.pos + offset,
            SEEK_END => len + offset,
            _ => return -1,
        };
        handle.eof = false;
        0
    })
}

unsafe extern "C" fn fake_ftell(fp: *mut VSILFILE) -> vsi_l_offset {
    with_state(|s| s.handles.get(&id(fp)).map_or(0, |h| h.pos))
}

unsafe extern "C" fn fake_fread(
    buf: *mut c_void,
    size: usize,
    count: usize,
    fp: *mut VSILFILE,
) -> usize {
    with_state(|s| {
        let FakeState { files, handles, .. } = s;
        let Some(handle) = handles.get_mut(&id(fp)) else {
            return 0;
        };
        let Some(file) = files.get(&handle.path) else {
            return 0;
        };
        let data = file.bytes();
        let pos = (handle.pos as usize).min(data.len());
        let wanted = size * count;
        let available = data.len() - pos;
        let n = wanted.min(available);
        ptr::copy_nonoverlapping(data.as_ptr().add(pos), buf as *mut u8, n);
        handle.pos = (pos + n) as u64;
        if n < wanted {
            handle.eof = true;
        }
        n / size
    })
}

unsafe extern "C" fn fake_fwrite(
    buf: *const c_void,
    size: usize,
    count: usize,
    fp: *mut VSILFILE,
) -> usize {
    with_state(|s| {
        let FakeState { files, handles, .. } = s;
        let Some(handle) = handles.get_mut(&id(fp)) else {
            return 0;
        };
        if !handle.writable {
            return 0;
        }
        let Some(file) = files.get_mut(&handle.path) else {
            return 0;
        };
        let data = std::slice::from_raw_parts(buf as *const u8, size * count);
        if !file.write_at(handle.pos as usize, data) {
            return 0;
        }
        handle.pos += data.len() as u64;
        count
    })
}

unsafe extern "C" fn fake_feof(fp: *mut VSILFILE) -> c_int {
    with_state(|s| s.handles.get(&id(fp)).map_or(0, |h| h.eof as c_int))
}

unsafe extern "C" fn fake_ftruncate(fp: *mut VSILFILE, new_size: vsi_l_offset) -> c_int {
    with_state(|s| {
        let FakeState { files, handles, .. } = s;
        let ok = handles
            .get(&id(fp))
            .filter(|h| h.writable)
            .and_then(|h| files.get_mut(&h.path))
            .map_or(false, |f| f.set_len(new_size as usize));
        if ok {
            0
        } else {
            -1
        }
    })
}

unsafe extern "C" fn fake_fflush(fp: *mut VSILFILE) -> c_int {
    with_state(|s| {
        if s.handles.contains_key(&id(fp)) {
            s.flushes += 1;
            0
        } else {
            -1
        }
    })
}

// ----- virtual file system: paths -----

unsafe extern "C" fn fake_stat(path: *const c_char, buf: *mut VSIStatBufL, flags: c_int) -> c_int {
    let path = path_arg(path);
    with_state(|s| {
        s.stat_flags.push(flags);
        let (size, mode) = if let Some(file) = s.files.get(&path) {
            (file.len(), libc::S_IFREG as u32 | 0o666)
        } else if s.is_dir(&path) {
            (0, libc::S_IFDIR as u32 | 0o755)
        } else {
            return -1;
        };
        (*buf).st_size = size as _;
        (*buf).st_mode = mode as _;
        0
    })
}

unsafe extern "C" fn fake_mkdir(path: *const c_char, _mode: c_long) -> c_int {
    let path = path_arg(path).trim_end_matches('/').to_string();
    with_state(|s| {
        if s.files.contains_key(&path) || s.is_dir(&path) {
            -1
        } else {
            s.dirs.insert(path);
            0
        }
    })
}

unsafe extern "C" fn fake_mkdir_recursive(path: *const c_char, _mode: c_long) -> c_int {
    let path = path_arg(path).trim_end_matches('/').to_string();
    with_state(|s| {
        let mut current = String::new();
        for part in path.split('/').filter(|p| !p.is_empty()) {
            current.push('/');
            current.push_str(part);
            if s.files.contains_key(&current) {
                return -1;
            }
            s.dirs.insert(current.clone());
        }
        0
    })
}

unsafe extern "C" fn fake_rmdir(path: *const c_char) -> c_int {
    let path = path_arg(path).trim_end_matches('/').to_string();
    with_state(|s| {
        if s.dirs.contains(&path) && s.children(&path).next().is_none() {
            s.dirs.remove(&path);
            0
        } else {
            -1
        }
    })
}

unsafe extern "C" fn fake_unlink(path: *const c_char) -> c_int {
    let path = path_arg(path);
    with_state(|s| if s.files.remove(&path).is_some() { 0 } else { -1 })
}

unsafe extern "C" fn fake_rename(from: *const c_char, to: *const c_char) -> c_int {
    let from = path_arg(from);
    let to = path_arg(to);
    with_state(|s| match s.files.remove(&from) {
        Some(file) => {
            s.files.insert(to, file);
            0
        }
        None => -1,
    })
}

unsafe extern "C" fn fake_read_dir(path: *const c_char) -> *mut *mut c_char {
    let path = path_arg(path);
    let names: BTreeSet<String> = with_state(|s| s.children(&path).collect());
    if names.is_empty() {
        return ptr::null_mut();
    }

    let list = libc::calloc(names.len() + 1, std::mem::size_of::<*mut c_char>()) as *mut *mut c_char;
    for (i, name) in names.iter().enumerate() {
        let c_name = CString::new(name.as_str()).unwrap();
        *list.add(i) = libc::strdup(c_name.as_ptr());
    }
    list
}

// ----- virtual file system: memory buffers -----

unsafe extern "C" fn fake_from_mem_buffer(
    path: *const c_char,
    data: *mut u8,
    len: vsi_l_offset,
    take_ownership: c_int,
) -> *mut VSILFILE {
    let path = path_arg(path);
    with_state(|s| {
        s.mem_buffer_calls.push(MemBufferCall {
            path: path.clone(),
            data: data as usize,
            len,
            take_ownership: take_ownership != 0,
        });
        if s.fail_mem_buffer {
            return ptr::null_mut();
        }

        let storage = if take_ownership != 0 {
            // Adopted: keep the bytes and release the allocation the way
            // the real library eventually would
            let bytes = std::slice::from_raw_parts(data, len as usize).to_vec();
            libc::free(data as *mut c_void);
            Storage::Owned(bytes)
        } else {
            Storage::Borrowed {
                ptr: data,
                len: len as usize,
            }
        };
        s.files.insert(path.clone(), storage);
        new_handle(s, path, 0, true)
    })
}

unsafe extern "C" fn fake_get_mem_buffer(
    path: *const c_char,
    len: *mut vsi_l_offset,
    seize: c_int,
) -> *mut u8 {
    let path = path_arg(path);
    with_state(|s| {
        let Some(file) = s.files.get_mut(&path) else {
            return ptr::null_mut();
        };
        *len = file.len() as vsi_l_offset;

        if seize == 0 {
            return match file {
                Storage::Owned(v) => v.as_mut_ptr(),
                Storage::Borrowed { ptr, .. } => *ptr,
            };
        }

        let file = s.files.remove(&path).expect("file checked above");
        let handed = match file {
            Storage::Owned(v) => {
                let out = libc::malloc(v.len().max(1)) as *mut u8;
                ptr::copy_nonoverlapping(v.as_ptr(), out, v.len());
                out
            }
            Storage::Borrowed { ptr, .. } => ptr,
        };
        s.seized.push(handed as usize);
        handed
    })
}

unsafe extern "C" fn fake_strerror(errno: c_int) -> *const c_char {
    with_state(|s| {
        s.strerror_buf = CString::new(format!("fake error {}", errno)).unwrap();
        s.strerror_buf.as_ptr()
    })
}

unsafe extern "C" fn fake_malloc(size: usize) -> *mut c_void {
    let p = libc::malloc(size);
    with_state(|s| s.mallocs.push(p as usize));
    p
}

unsafe extern "C" fn fake_free(p: *mut c_void) {
    with_state(|s| s.frees.push(p as usize));
    libc::free(p);
}

// ----- handler lifecycle -----

unsafe extern "C" fn fake_install_mem() {
    with_state(|s| *s.installs.entry("VSIInstallMemFileHandler").or_default() += 1);
}

unsafe extern "C" fn fake_install_large() {
    with_state(|s| *s.installs.entry("VSIInstallLargeFileHandler").or_default() += 1);
}

unsafe extern "C" fn fake_install_subfile() {
    with_state(|s| *s.installs.entry("VSIInstallSubFileHandler").or_default() += 1);
}

unsafe extern "C" fn fake_install_sparse() {
    with_state(|s| *s.installs.entry("VSIInstallSparseFileHandler").or_default() += 1);
}

unsafe extern "C" fn fake_cleanup() {
    with_state(|s| {
        s.cleanups += 1;
        s.files.clear();
        s.dirs.clear();
        s.handles.clear();
    });
}
