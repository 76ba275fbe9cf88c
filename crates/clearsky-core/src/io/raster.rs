use std::path::Path;

use gdal::raster::{Buffer, GdalType};
use gdal::spatial_ref::SpatialRef;
use gdal::{Dataset, DriverManager, Metadata};
use ndarray::Array2;
use num_traits::NumCast;
use tracing::debug;

use crate::error::{ClearskyError, Result};
use crate::grid::{Bounds, Grid, GridGeometry, Sample};

/// GDAL driver used for every composite.
pub const GEOTIFF_DRIVER: &str = "GTiff";

/// Dataset metadata keys written with each composite.
pub const META_BAND_NAME: &str = "BAND_NAME";
pub const META_ACQUISITION_DATES: &str = "ACQUISITION_DATES";
pub const META_DESCRIPTION: &str = "DESCRIPTION";

/// Descriptive metadata stored alongside the pixels.
#[derive(Clone, Debug, Default)]
pub struct RasterMetadata {
    pub description: String,
    pub band_name: String,
    pub acquisition_dates: Vec<String>,
}

/// Where to place a raster that carries no georeferencing of its own.
#[derive(Clone, Copy, Debug)]
pub struct FallbackPlacement<'a> {
    pub bounds: &'a Bounds,
    pub crs: &'a str,
}

/// Read band 1 of any GDAL-readable raster into a grid.
///
/// Georeferencing comes from the dataset. Plain images (PNG, untagged TIFF)
/// are placed on `fallback` instead; without one they are an error.
pub fn read_raster<T>(path: &Path, fallback: Option<FallbackPlacement<'_>>) -> Result<Grid<T>>
where
    T: Sample + NumCast + GdalType + Copy,
{
    let dataset = Dataset::open(path)?;
    if dataset.raster_count() < 1 {
        return Err(ClearskyError::InvalidRaster(format!(
            "{} has no raster bands",
            path.display()
        )));
    }
    let (cols, rows) = dataset.raster_size();
    if rows == 0 || cols == 0 {
        return Err(ClearskyError::InvalidRaster(format!(
            "{} is {cols}x{rows}",
            path.display()
        )));
    }

    let geometry = match dataset_geometry(&dataset)? {
        Some(geometry) => geometry,
        None => {
            let placement = fallback.ok_or_else(|| {
                ClearskyError::InvalidRaster(format!("{} has no georeferencing", path.display()))
            })?;
            GridGeometry::from_bounds(placement.bounds, rows, cols, placement.crs)?
        }
    };

    let band = dataset.rasterband(1)?;
    let buffer = band.read_as::<T>((0, 0), (cols, rows), (cols, rows), None)?;
    let data = Array2::from_shape_vec((rows, cols), buffer.data)
        .map_err(|e| ClearskyError::InvalidRaster(e.to_string()))?;
    let nodata = band.no_data_value().and_then(|v| <T as NumCast>::from(v));

    debug!(path = %path.display(), rows, cols, crs = %geometry.crs, "Read raster");
    Ok(Grid {
        data,
        geometry,
        nodata,
    })
}

/// North-up geometry of a dataset, or `None` when it has no geotransform.
fn dataset_geometry(dataset: &Dataset) -> Result<Option<GridGeometry>> {
    let Ok(gt) = dataset.geo_transform() else {
        return Ok(None);
    };
    if gt == [0.0, 1.0, 0.0, 0.0, 0.0, 1.0] {
        return Ok(None);
    }
    if gt[2] != 0.0 || gt[4] != 0.0 {
        return Err(ClearskyError::InvalidRaster(format!(
            "rotated geotransform {gt:?} not supported"
        )));
    }
    let crs = dataset
        .spatial_ref()
        .map(|srs| crs_identifier(&srs))
        .unwrap_or_default();
    Ok(Some(GridGeometry::new(gt[0], gt[3], gt[1], -gt[5], &crs)))
}

/// `AUTHORITY:CODE` when the reference has one, WKT otherwise.
fn crs_identifier(srs: &SpatialRef) -> String {
    match (srs.auth_name(), srs.auth_code()) {
        (Ok(name), Ok(code)) => format!("{name}:{code}"),
        _ => srs.to_wkt().unwrap_or_default(),
    }
}

/// Write a single-band Float32 GeoTIFF with geotransform, CRS and no-data tag.
///
/// The grid's no-data sentinel becomes the band's no-data value.
pub fn write_geotiff(grid: &Grid<f32>, path: &Path, meta: &RasterMetadata) -> Result<()> {
    let driver = DriverManager::get_driver_by_name(GEOTIFF_DRIVER)?;
    let (rows, cols) = grid.data.dim();
    let mut dataset =
        driver.create_with_band_type::<f32, _>(path, cols as isize, rows as isize, 1)?;

    let g = &grid.geometry;
    dataset.set_geo_transform(&[
        g.origin_x,
        g.pixel_width,
        0.0,
        g.origin_y,
        0.0,
        -g.pixel_height,
    ])?;
    if !g.crs.is_empty() {
        dataset.set_spatial_ref(&SpatialRef::from_definition(&g.crs)?)?;
    }

    if !meta.description.is_empty() {
        dataset.set_metadata_item(META_DESCRIPTION, &meta.description, "")?;
    }
    if !meta.band_name.is_empty() {
        dataset.set_metadata_item(META_BAND_NAME, &meta.band_name, "")?;
    }
    if !meta.acquisition_dates.is_empty() {
        dataset.set_metadata_item(META_ACQUISITION_DATES, &meta.acquisition_dates.join(","), "")?;
    }

    let mut band = dataset.rasterband(1)?;
    let buffer = Buffer::new((cols, rows), grid.data.iter().copied().collect::<Vec<f32>>());
    band.write((0, 0), (cols, rows), &buffer)?;
    if let Some(nodata) = grid.nodata {
        band.set_no_data_value(Some(nodata as f64))?;
    }
    Ok(())
}
