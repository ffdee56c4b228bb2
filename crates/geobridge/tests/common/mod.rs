//! Shared test utilities
//!
//! Every integration test runs against the fake native library in
//! `fake_gdal`, whose state is private to the test's thread.

#![allow(dead_code)]

pub mod fake_gdal;

use geobridge::{Dataset, Gdal};

pub use fake_gdal::{fake_gdal, fake_gdal_with, with_state};
pub use pretty_assertions::{assert_eq, assert_ne};

/// Deterministic test payload of `len` bytes
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

/// Open a fake dataset with `bands` 64x32 raster bands and `layers` layers
pub fn open_dataset(gdal: &Gdal, path: &str, bands: usize, layers: usize) -> Dataset {
    fake_gdal::register_dataset(path, bands, layers, (64, 32));
    Dataset::open(gdal, path, Default::default()).expect("fake dataset opens")
}
