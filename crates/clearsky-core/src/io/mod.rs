pub mod catalog;
pub mod naming;
pub mod raster;
pub mod writer;
