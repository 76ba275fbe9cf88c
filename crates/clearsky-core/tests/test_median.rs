#[allow(dead_code)]
mod common;

use clearsky_core::consts::DEFAULT_CHUNK_ROWS;
use clearsky_core::grid::Grid;
use clearsky_core::stack::median::median_stack;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_grid(h: usize, w: usize, fill: f32) -> Grid<f32> {
    common::value_grid(h, w, fill)
}

fn refs(grids: &[Grid<f32>]) -> Vec<&Grid<f32>> {
    grids.iter().collect()
}

// ---------------------------------------------------------------------------
// median_stack
// ---------------------------------------------------------------------------

#[test]
fn test_median_single_grid() {
    let grid = make_grid(8, 8, 0.7);
    let result = median_stack(&[&grid], 0.0, DEFAULT_CHUNK_ROWS).unwrap();
    for v in result.data.iter() {
        assert!((*v - 0.7).abs() < 1e-5);
    }
}

#[test]
fn test_median_two_grids() {
    let grids = [make_grid(8, 8, 0.2), make_grid(8, 8, 0.8)];
    let result = median_stack(&refs(&grids), 0.0, DEFAULT_CHUNK_ROWS).unwrap();
    // Median of [0.2, 0.8] (even count) = (0.2 + 0.8) / 2 = 0.5
    for v in result.data.iter() {
        assert!((*v - 0.5).abs() < 1e-5);
    }
}

#[test]
fn test_median_odd_count() {
    let grids = [
        make_grid(8, 8, 0.1),
        make_grid(8, 8, 0.5),
        make_grid(8, 8, 0.9),
    ];
    let result = median_stack(&refs(&grids), 0.0, DEFAULT_CHUNK_ROWS).unwrap();
    for v in result.data.iter() {
        assert!((*v - 0.5).abs() < 1e-5);
    }
}

#[test]
fn test_median_even_count() {
    // Median of [0.1, 0.3, 0.7, 0.9] = (0.3+0.7)/2 = 0.5
    let grids: Vec<Grid<f32>> = [0.1f32, 0.3, 0.7, 0.9]
        .iter()
        .map(|&v| make_grid(8, 8, v))
        .collect();
    let result = median_stack(&refs(&grids), 0.0, DEFAULT_CHUNK_ROWS).unwrap();
    for v in result.data.iter() {
        assert!((*v - 0.5).abs() < 1e-5);
    }
}

#[test]
fn test_median_empty_error() {
    assert!(median_stack(&[], 0.0, DEFAULT_CHUNK_ROWS).is_err());
}

#[test]
fn test_median_shape_mismatch_error() {
    let a = make_grid(8, 8, 1.0);
    let b = make_grid(8, 9, 1.0);
    assert!(median_stack(&[&a, &b], 0.0, DEFAULT_CHUNK_ROWS).is_err());
}

#[test]
fn test_median_rejects_outlier() {
    let mut grids: Vec<Grid<f32>> = (0..4).map(|_| make_grid(8, 8, 0.5)).collect();
    grids.push(make_grid(8, 8, 0.0));
    let result = median_stack(&refs(&grids), 0.0, DEFAULT_CHUNK_ROWS).unwrap();
    for v in result.data.iter() {
        assert!((*v - 0.5).abs() < 1e-5);
    }
}

// ---------------------------------------------------------------------------
// No-data handling
// ---------------------------------------------------------------------------

#[test]
fn test_median_skips_nan() {
    let mut a = make_grid(4, 4, 1.0);
    a.data[[0, 0]] = f32::NAN;
    let b = make_grid(4, 4, 3.0);
    let c = make_grid(4, 4, 5.0);
    let result = median_stack(&[&a, &b, &c], -1.0, DEFAULT_CHUNK_ROWS).unwrap();
    // Pixel (0,0) sees [3, 5] only.
    assert!((result.data[[0, 0]] - 4.0).abs() < 1e-6);
    assert!((result.data[[1, 1]] - 3.0).abs() < 1e-6);
}

#[test]
fn test_median_skips_sentinel() {
    let mut a = make_grid(4, 4, 2.0).with_nodata(-9999.0);
    a.data[[2, 3]] = -9999.0;
    let b = make_grid(4, 4, 6.0).with_nodata(-9999.0);
    let result = median_stack(&[&a, &b], 0.0, DEFAULT_CHUNK_ROWS).unwrap();
    assert!((result.data[[2, 3]] - 6.0).abs() < 1e-6);
    assert!((result.data[[0, 0]] - 4.0).abs() < 1e-6);
}

#[test]
fn test_median_fill_when_no_valid_sample() {
    let mut a = make_grid(4, 4, 2.0);
    let mut b = make_grid(4, 4, 4.0);
    a.data[[1, 2]] = f32::NAN;
    b.data[[1, 2]] = f32::NAN;
    let result = median_stack(&[&a, &b], 0.0, DEFAULT_CHUNK_ROWS).unwrap();
    assert_eq!(result.data[[1, 2]], 0.0);
    assert_eq!(result.nodata, Some(0.0));
    assert!(!result.data.iter().any(|v| v.is_nan()));
}

// ---------------------------------------------------------------------------
// Order invariance and idempotence
// ---------------------------------------------------------------------------

fn varied_stack() -> Vec<Grid<f32>> {
    (0..5)
        .map(|t| {
            common::value_grid_fn(16, 16, move |r, c| {
                if (r + c + t) % 7 == 0 {
                    f32::NAN
                } else {
                    ((r * 31 + c * 17 + t * 13) % 23) as f32
                }
            })
        })
        .collect()
}

#[test]
fn test_median_order_invariant() {
    let grids = varied_stack();
    let forward = median_stack(&refs(&grids), 0.0, DEFAULT_CHUNK_ROWS).unwrap();

    let orders: [[usize; 5]; 3] = [[4, 3, 2, 1, 0], [2, 0, 4, 1, 3], [1, 4, 0, 3, 2]];
    for order in orders {
        let shuffled: Vec<&Grid<f32>> = order.iter().map(|&i| &grids[i]).collect();
        let result = median_stack(&shuffled, 0.0, DEFAULT_CHUNK_ROWS).unwrap();
        assert_eq!(result.data, forward.data);
    }
}

#[test]
fn test_median_idempotent() {
    let grids = varied_stack();
    let median = median_stack(&refs(&grids), 0.0, DEFAULT_CHUNK_ROWS).unwrap();
    let repeated = [median.clone(), median.clone(), median.clone()];
    let again = median_stack(&refs(&repeated), 0.0, DEFAULT_CHUNK_ROWS).unwrap();
    assert_eq!(again.data, median.data);
}

// ---------------------------------------------------------------------------
// Chunked path
// ---------------------------------------------------------------------------

#[test]
fn test_median_chunked_matches_unchunked() {
    let grids = varied_stack();
    let whole = median_stack(&refs(&grids), 0.0, DEFAULT_CHUNK_ROWS).unwrap();
    for chunk_rows in [1, 3, 16, 100] {
        let chunked = median_stack(&refs(&grids), 0.0, chunk_rows).unwrap();
        assert_eq!(chunked.data, whole.data, "chunk_rows = {chunk_rows}");
    }
}

#[test]
fn test_median_large_grid_parallel_path() {
    let grids: Vec<Grid<f32>> = [1.0f32, 9.0, 4.0]
        .iter()
        .map(|&v| make_grid(300, 300, v))
        .collect();
    let result = median_stack(&refs(&grids), 0.0, DEFAULT_CHUNK_ROWS).unwrap();
    assert_eq!(result.data.dim(), (300, 300));
    assert!(result.data.iter().all(|&v| (v - 4.0).abs() < 1e-6));
}

#[test]
fn test_median_large_grid_small_chunks() {
    let grids: Vec<Grid<f32>> = (0..4)
        .map(|i| common::value_grid_fn(300, 300, move |r, c| (r * 300 + c) as f32 + i as f32))
        .collect();
    let result = median_stack(&refs(&grids), 0.0, 7).unwrap();
    // Median of x, x+1, x+2, x+3.
    for ((r, c), &v) in result.data.indexed_iter() {
        approx::assert_abs_diff_eq!(v, (r * 300 + c) as f32 + 1.5, epsilon = 1e-2);
    }
}

#[test]
fn test_median_keeps_geometry() {
    let grids = [make_grid(4, 4, 1.0), make_grid(4, 4, 2.0)];
    let result = median_stack(&refs(&grids), 0.0, DEFAULT_CHUNK_ROWS).unwrap();
    assert_eq!(result.geometry, common::geometry());
}
