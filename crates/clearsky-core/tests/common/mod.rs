use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use ndarray::Array2;

use clearsky_core::grid::{Grid, GridGeometry};
use clearsky_core::io::raster::{write_geotiff, RasterMetadata};
use clearsky_core::scene::{CoverageRecord, Scene};

pub const CRS: &str = "EPSG:32633";

/// Classification codes used by the synthetic scenes.
pub const CLEAR: u8 = 4;
pub const CLOUD: u8 = 8;
pub const NODATA: u8 = 0;

/// 10 m grid anchored at a UTM-like upper-left corner.
pub fn geometry() -> GridGeometry {
    GridGeometry::new(500_000.0, 4_200_000.0, 10.0, 10.0, CRS)
}

pub fn utc(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 10, 30, 0).unwrap()
}

/// Timestamp for a (non-normalised) ordinal day of `year`.
pub fn utc_doy(year: i32, doy: u32) -> DateTime<Utc> {
    NaiveDate::from_yo_opt(year, doy)
        .unwrap()
        .and_hms_opt(10, 30, 0)
        .unwrap()
        .and_utc()
}

pub fn record(id: &str, timestamp: DateTime<Utc>, fraction_valid: f64) -> CoverageRecord {
    CoverageRecord {
        scene_id: id.to_string(),
        timestamp,
        fraction_valid,
    }
}

pub fn class_grid(rows: usize, cols: usize, code: u8) -> Grid<u8> {
    Grid::new(Array2::from_elem((rows, cols), code), geometry()).with_nodata(NODATA)
}

/// Classification grid whose first `cloudy` pixels (row-major) are cloud.
pub fn cloudy_class_grid(rows: usize, cols: usize, cloudy: usize) -> Grid<u8> {
    let data = Array2::from_shape_fn((rows, cols), |(r, c)| {
        if r * cols + c < cloudy {
            CLOUD
        } else {
            CLEAR
        }
    });
    Grid::new(data, geometry()).with_nodata(NODATA)
}

pub fn value_grid(rows: usize, cols: usize, value: f32) -> Grid<f32> {
    Grid::new(Array2::from_elem((rows, cols), value), geometry())
}

pub fn value_grid_fn(rows: usize, cols: usize, f: impl Fn(usize, usize) -> f32) -> Grid<f32> {
    Grid::new(Array2::from_shape_fn((rows, cols), |(r, c)| f(r, c)), geometry())
}

pub fn scene(id: &str, timestamp: DateTime<Utc>, classification: Grid<u8>, b04: Grid<f32>) -> Scene {
    let mut bands = BTreeMap::new();
    bands.insert("B04".to_string(), b04);
    Scene {
        id: id.to_string(),
        timestamp,
        classification,
        bands,
    }
}

/// Persist a scene as GeoTIFFs named `<id>_SCL.tif` and `<id>_<band>.tif` under `dir`.
pub fn write_scene_rasters(dir: &Path, scene: &Scene) {
    let class = &scene.classification;
    let as_float = Grid {
        data: class.data.mapv(|c| c as f32),
        geometry: class.geometry.clone(),
        nodata: class.nodata.map(|n| n as f32),
    };
    let meta = RasterMetadata {
        band_name: "SCL".into(),
        ..Default::default()
    };
    write_geotiff(&as_float, &dir.join(format!("{}_SCL.tif", scene.id)), &meta).unwrap();

    for (name, grid) in &scene.bands {
        let meta = RasterMetadata {
            band_name: name.clone(),
            ..Default::default()
        };
        write_geotiff(grid, &dir.join(format!("{}_{name}.tif", scene.id)), &meta).unwrap();
    }
}

/// Catalog JSON entry for a scene written by [`write_scene_rasters`], with relative hrefs.
pub fn catalog_entry(scene: &Scene, cloud_cover: Option<f64>) -> serde_json::Value {
    let bounds = scene.classification.bounds();
    let bands: serde_json::Map<String, serde_json::Value> = scene
        .bands
        .keys()
        .map(|name| {
            (
                name.clone(),
                serde_json::Value::String(format!("{}_{name}.tif", scene.id)),
            )
        })
        .collect();
    serde_json::json!({
        "id": scene.id,
        "datetime": scene.timestamp.to_rfc3339(),
        "eo:cloud_cover": cloud_cover,
        "classification": format!("{}_SCL.tif", scene.id),
        "bands": bands,
        "bbox": [bounds.min_x, bounds.min_y, bounds.max_x, bounds.max_y],
        "crs": CRS,
    })
}

/// Write scenes plus a `catalog.json` into `dir`; returns the catalog path.
pub fn write_catalog(dir: &Path, tile: &str, scenes: &[Scene]) -> std::path::PathBuf {
    for scene in scenes {
        write_scene_rasters(dir, scene);
    }
    let entries: Vec<serde_json::Value> = scenes.iter().map(|s| catalog_entry(s, None)).collect();
    let catalog = serde_json::json!({
        "tile": tile,
        "orbit": "R022",
        "scenes": entries,
    });
    let path = dir.join("catalog.json");
    std::fs::write(&path, serde_json::to_string_pretty(&catalog).unwrap()).unwrap();
    path
}
