#[allow(dead_code)]
mod common;

use ndarray::Array2;

use clearsky_core::error::ClearskyError;
use clearsky_core::grid::{Grid, GridGeometry};
use clearsky_core::mask::{apply_mask, mask_band, validity_mask, ExcludedClasses};

// ---------------------------------------------------------------------------
// validity_mask
// ---------------------------------------------------------------------------

#[test]
fn test_validity_exhaustive_small_alphabet() {
    // Alphabet 0..=11 laid out over every row/column position.
    let excluded = ExcludedClasses::new(&[3, 8, 9]);
    let data = Array2::from_shape_fn((12, 12), |(r, c)| ((r + c) % 12) as u8);
    let grid = Grid::new(data, common::geometry()).with_nodata(0);

    let mask = validity_mask(&grid, &excluded);
    for ((r, c), &valid) in mask.data.indexed_iter() {
        let code = grid.data[[r, c]];
        let expected = !(code == 0 || code == 3 || code == 8 || code == 9);
        assert_eq!(valid, expected, "code {code} at ({r}, {c})");
    }
}

#[test]
fn test_validity_every_u8_code() {
    let excluded = ExcludedClasses::default();
    for code in 0..=u8::MAX {
        let grid = common::class_grid(2, 3, code);
        let mask = validity_mask(&grid, &excluded);
        let expected = ![0u8, 3, 8, 9].contains(&code);
        assert!(mask.data.iter().all(|&v| v == expected), "code {code}");
    }
}

#[test]
fn test_validity_without_nodata_sentinel() {
    let grid = Grid::new(Array2::from_elem((4, 4), 0u8), common::geometry());
    let mask = validity_mask(&grid, &ExcludedClasses::default());
    assert!(mask.data.iter().all(|&v| v));
}

#[test]
fn test_validity_parallel_path_matches() {
    // Large enough to take the parallel branch.
    let data = Array2::from_shape_fn((300, 300), |(r, c)| ((r * 7 + c * 13) % 12) as u8);
    let grid = Grid::new(data, common::geometry()).with_nodata(0);
    let excluded = ExcludedClasses::default();

    let mask = validity_mask(&grid, &excluded);
    for (&code, &valid) in grid.data.iter().zip(mask.data.iter()) {
        assert_eq!(valid, code != 0 && !excluded.contains(code));
    }
    assert_eq!(mask.geometry, grid.geometry);
}

#[test]
fn test_excluded_classes_codes() {
    let excluded = ExcludedClasses::new(&[9, 3, 3, 8]);
    assert_eq!(excluded.codes(), vec![3, 8, 9]);
    assert_eq!(format!("{:?}", excluded), "{3, 8, 9}");
}

// ---------------------------------------------------------------------------
// apply_mask
// ---------------------------------------------------------------------------

#[test]
fn test_apply_mask_sets_nan() {
    let classes = common::cloudy_class_grid(4, 4, 5);
    let band = common::value_grid(4, 4, 0.25);
    let mask = validity_mask(&classes, &ExcludedClasses::default());

    let masked = apply_mask(&band, &mask).unwrap();
    let nan_count = masked.data.iter().filter(|v| v.is_nan()).count();
    assert_eq!(nan_count, 5);
    assert!(masked
        .data
        .iter()
        .filter(|v| !v.is_nan())
        .all(|&v| (v - 0.25).abs() < 1e-6));
}

#[test]
fn test_apply_mask_shape_mismatch() {
    let mask = validity_mask(&common::class_grid(4, 4, 4), &ExcludedClasses::default());
    let band = common::value_grid(4, 5, 1.0);
    assert!(matches!(
        apply_mask(&band, &mask),
        Err(ClearskyError::InvalidGrid(_))
    ));
}

// ---------------------------------------------------------------------------
// Mixed resolutions
// ---------------------------------------------------------------------------

/// 20 m classification covering the same 40 m x 40 m as a 4x4 10 m band.
fn coarse_classes(codes: [[u8; 2]; 2]) -> Grid<u8> {
    let data = Array2::from_shape_fn((2, 2), |(r, c)| codes[r][c]);
    let geometry = GridGeometry::new(500_000.0, 4_200_000.0, 20.0, 20.0, common::CRS);
    Grid::new(data, geometry).with_nodata(common::NODATA)
}

#[test]
fn test_mask_band_coarser_classification() {
    let classes = coarse_classes([
        [common::CLOUD, common::CLEAR],
        [common::CLEAR, common::NODATA],
    ]);
    let band = common::value_grid(4, 4, 1.5);

    let masked = mask_band(&band, &classes, &ExcludedClasses::default()).unwrap();
    assert_eq!(masked.data.dim(), (4, 4));
    assert_eq!(masked.geometry, band.geometry);
    for ((r, c), &v) in masked.data.indexed_iter() {
        let expect_valid = matches!((r / 2, c / 2), (0, 1) | (1, 0));
        assert_eq!(!v.is_nan(), expect_valid, "pixel ({r}, {c})");
    }
}

#[test]
fn test_mask_band_same_grid_matches_apply_mask() {
    let classes = common::cloudy_class_grid(4, 4, 6);
    let band = common::value_grid_fn(4, 4, |r, c| (r + c) as f32);
    let excluded = ExcludedClasses::default();

    let direct = apply_mask(&band, &validity_mask(&classes, &excluded)).unwrap();
    let via = mask_band(&band, &classes, &excluded).unwrap();
    assert_eq!(
        direct.data.iter().map(|v| v.is_nan()).collect::<Vec<_>>(),
        via.data.iter().map(|v| v.is_nan()).collect::<Vec<_>>()
    );
}

#[test]
fn test_resample_nearest_outside_source() {
    // Source covers only the left half of the target.
    let source = Grid::new(
        Array2::from_elem((4, 2), 7u8),
        GridGeometry::new(500_000.0, 4_200_000.0, 10.0, 10.0, common::CRS),
    );
    let out = source.resample_nearest(&common::geometry(), 4, 4, 0).unwrap();
    for ((_, c), &v) in out.data.indexed_iter() {
        assert_eq!(v, if c < 2 { 7 } else { 0 });
    }
}

#[test]
fn test_resample_nearest_crs_mismatch() {
    let source = common::class_grid(2, 2, common::CLEAR);
    let other = GridGeometry::new(500_000.0, 4_200_000.0, 10.0, 10.0, "EPSG:32632");
    assert!(matches!(
        source.resample_nearest(&other, 2, 2, 0),
        Err(ClearskyError::InvalidGrid(_))
    ));
}
