pub mod raster;
pub mod vsi;
