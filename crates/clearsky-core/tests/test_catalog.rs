#[allow(dead_code)]
mod common;

use std::path::PathBuf;

use tempfile::TempDir;

use clearsky_core::compute::WorkerPool;
use clearsky_core::error::ClearskyError;
use clearsky_core::grid::Bounds;
use clearsky_core::io::catalog::{AssetRef, LoadOptions, SceneCatalog};
use clearsky_core::pipeline::config::DateRange;

const CATALOG: &str = r#"{
  "tile": "T33TUM",
  "orbit": "R022",
  "scenes": [
    {
      "id": "S2B_20210715",
      "datetime": "2021-07-15T10:20:00Z",
      "eo:cloud_cover": 45.0,
      "classification": "2021/SCL_0715.tif",
      "bands": { "B04": { "href": "2021/B04_0715.tif", "nodata": 0 } },
      "bbox": [500000.0, 4199000.0, 501000.0, 4200000.0],
      "crs": "EPSG:32633"
    },
    {
      "id": "S2A_20210605",
      "datetime": "2021-06-05T10:20:00Z",
      "cloud_cover": 3.5,
      "classification": "/data/SCL_0605.tif",
      "bands": { "B04": "2021/B04_0605.tif" },
      "bbox": [500000.0, 4199000.0, 501000.0, 4200000.0],
      "crs": "EPSG:32633"
    },
    {
      "id": "S2A_20220610",
      "datetime": "2022-06-10T10:20:00Z",
      "classification": "2022/SCL_0610.tif",
      "bands": { "B04": "2022/B04_0610.tif" },
      "bbox": [500000.0, 4199000.0, 501000.0, 4200000.0],
      "crs": "EPSG:32633"
    }
  ]
}"#;

fn catalog() -> SceneCatalog {
    SceneCatalog::from_json_str(CATALOG, PathBuf::from("/archive/T33TUM")).unwrap()
}

#[test]
fn test_catalog_parse_sorted_by_time() {
    let catalog = catalog();
    assert_eq!(catalog.len(), 3);
    assert_eq!(catalog.tile.as_deref(), Some("T33TUM"));
    assert_eq!(catalog.orbit.as_deref(), Some("R022"));
    let ids: Vec<&str> = catalog.scenes.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["S2A_20210605", "S2B_20210715", "S2A_20220610"]);
}

#[test]
fn test_catalog_cloud_cover_alias() {
    let catalog = catalog();
    assert_eq!(catalog.scenes[0].cloud_cover, Some(3.5));
    assert_eq!(catalog.scenes[1].cloud_cover, Some(45.0));
    assert_eq!(catalog.scenes[2].cloud_cover, None);
}

#[test]
fn test_catalog_asset_forms() {
    let catalog = catalog();
    let detailed = &catalog.scenes[1].bands["B04"];
    assert_eq!(detailed.nodata(), Some(0.0));
    assert_eq!(detailed.href(), PathBuf::from("2021/B04_0715.tif"));
    assert!(matches!(catalog.scenes[0].bands["B04"], AssetRef::Path(_)));
}

#[test]
fn test_catalog_resolves_relative_paths() {
    let catalog = catalog();
    assert_eq!(
        catalog.resolve(&catalog.scenes[0].bands["B04"]),
        PathBuf::from("/archive/T33TUM/2021/B04_0605.tif")
    );
    assert_eq!(
        catalog.resolve(&catalog.scenes[0].classification),
        PathBuf::from("/data/SCL_0605.tif")
    );
}

#[test]
fn test_catalog_filter_date_range() {
    let catalog = catalog();
    let range = DateRange {
        start: common::utc(2021, 1, 1),
        end: common::utc(2021, 12, 31),
    };
    let ids: Vec<&str> = catalog
        .filter(Some(&range), None)
        .iter()
        .map(|d| d.id.as_str())
        .collect();
    assert_eq!(ids, vec!["S2A_20210605", "S2B_20210715"]);
}

#[test]
fn test_catalog_filter_cloud_cover_keeps_unknown() {
    let catalog = catalog();
    let ids: Vec<&str> = catalog
        .filter(None, Some(20.0))
        .iter()
        .map(|d| d.id.as_str())
        .collect();
    assert_eq!(ids, vec!["S2A_20210605", "S2A_20220610"]);
}

#[test]
fn test_catalog_rejects_duplicate_ids() {
    let doubled = CATALOG.replace("S2A_20220610", "S2A_20210605");
    assert!(matches!(
        SceneCatalog::from_json_str(&doubled, PathBuf::new()),
        Err(ClearskyError::InvalidCatalog(_))
    ));
}

#[test]
fn test_catalog_rejects_degenerate_bbox() {
    let broken = CATALOG.replacen(
        "[500000.0, 4199000.0, 501000.0, 4200000.0]",
        "[500000.0, 4199000.0, 500000.0, 4200000.0]",
        1,
    );
    assert!(matches!(
        SceneCatalog::from_json_str(&broken, PathBuf::new()),
        Err(ClearskyError::InvalidCatalog(_))
    ));
}

#[test]
fn test_catalog_rejects_malformed_json() {
    assert!(matches!(
        SceneCatalog::from_json_str("{ \"scenes\": [", PathBuf::new()),
        Err(ClearskyError::Json(_))
    ));
}

// ---------------------------------------------------------------------------
// Loading scenes from disk
// ---------------------------------------------------------------------------

fn disk_scenes() -> Vec<clearsky_core::scene::Scene> {
    vec![
        common::scene(
            "a",
            common::utc(2021, 5, 1),
            common::cloudy_class_grid(8, 10, 12),
            common::value_grid_fn(8, 10, |r, c| (r * 10 + c) as f32),
        ),
        common::scene(
            "b",
            common::utc(2021, 6, 1),
            common::class_grid(8, 10, common::CLEAR),
            common::value_grid(8, 10, 2.5),
        ),
    ]
}

#[test]
fn test_load_scene_from_geotiff_assets() {
    let dir = TempDir::new().unwrap();
    let path = common::write_catalog(dir.path(), "T33TUM", &disk_scenes());
    let catalog = SceneCatalog::open(&path).unwrap();

    let scene = catalog
        .load_scene(&catalog.scenes[0], &LoadOptions::default())
        .unwrap();
    assert_eq!(scene.id, "a");
    assert_eq!(scene.classification.data.dim(), (8, 10));
    assert_eq!(scene.classification.nodata, Some(common::NODATA));
    assert_eq!(scene.classification.data[[0, 0]], common::CLOUD);
    assert_eq!(scene.classification.data[[7, 9]], common::CLEAR);
    assert_eq!(scene.band("B04").unwrap().data[[3, 4]], 34.0);
    assert_eq!(scene.classification.geometry, common::geometry());
}

#[test]
fn test_load_scene_classification_only() {
    let dir = TempDir::new().unwrap();
    let path = common::write_catalog(dir.path(), "T33TUM", &disk_scenes());
    let catalog = SceneCatalog::open(&path).unwrap();
    let options = LoadOptions {
        classification_only: true,
        bands: vec!["B04".into()],
        ..Default::default()
    };
    let scene = catalog.load_scene(&catalog.scenes[1], &options).unwrap();
    assert!(scene.bands.is_empty());
}

#[test]
fn test_load_scene_missing_band() {
    let dir = TempDir::new().unwrap();
    let path = common::write_catalog(dir.path(), "T33TUM", &disk_scenes());
    let catalog = SceneCatalog::open(&path).unwrap();
    let options = LoadOptions {
        bands: vec!["B08".into()],
        ..Default::default()
    };
    assert!(matches!(
        catalog.load_scene(&catalog.scenes[0], &options),
        Err(ClearskyError::MissingBand { .. })
    ));
}

#[test]
fn test_load_scene_crops_to_extent() {
    let dir = TempDir::new().unwrap();
    let path = common::write_catalog(dir.path(), "T33TUM", &disk_scenes());
    let catalog = SceneCatalog::open(&path).unwrap();
    // Upper-left 4x5 pixels of the 10 m grid.
    let options = LoadOptions {
        extent: Some(Bounds::new(500_000.0, 4_199_960.0, 500_050.0, 4_200_000.0)),
        ..Default::default()
    };
    let scene = catalog.load_scene(&catalog.scenes[0], &options).unwrap();
    let band = scene.band("B04").unwrap();
    assert_eq!(band.data.dim(), (4, 5));
    assert_eq!(band.data[[3, 4]], 34.0);
    assert_eq!(scene.classification.data.dim(), (4, 5));
}

#[test]
fn test_load_scenes_isolates_failures() {
    let dir = TempDir::new().unwrap();
    let path = common::write_catalog(dir.path(), "T33TUM", &disk_scenes());
    std::fs::remove_file(dir.path().join("b_B04.tif")).unwrap();
    let catalog = SceneCatalog::open(&path).unwrap();

    let descriptors: Vec<_> = catalog.scenes.iter().collect();
    let pool = WorkerPool::new(Some(2)).unwrap();
    let loaded = catalog.load_scenes(&descriptors, &LoadOptions::default(), &pool);
    assert_eq!(loaded.scenes.len(), 1);
    assert_eq!(loaded.scenes[0].id, "a");
    assert_eq!(loaded.failures.len(), 1);
    assert_eq!(loaded.failures[0].0, "b");
}
