use ndarray::Array2;
use rayon::prelude::*;

use crate::compute::{plan_chunks, SpatialChunk};
use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::error::{ClearskyError, Result};
use crate::grid::Grid;

/// Reduce a stack of grids to their per-pixel median.
///
/// No-data samples (the grid's sentinel or NaN) are ignored; a pixel with no
/// valid sample across the stack becomes `fill`. Uses `select_nth_unstable`
/// for O(n) median without full sort.
///
/// Rows are split into chunks of `chunk_rows`; every chunk is an independent
/// task with its own scratch buffer, and chunk results are concatenated in
/// row order. Chunks run in parallel on the current Rayon pool once the grid
/// reaches [`PARALLEL_PIXEL_THRESHOLD`] pixels.
pub fn median_stack(grids: &[&Grid<f32>], fill: f32, chunk_rows: usize) -> Result<Grid<f32>> {
    let first = check_stack(grids)?;
    let chunks = plan_chunks(first.rows(), chunk_rows);
    let parallel = first.rows() * first.cols() >= PARALLEL_PIXEL_THRESHOLD && grids.len() > 1;
    reduce(grids, fill, &chunks, parallel)
}

fn check_stack<'a>(grids: &[&'a Grid<f32>]) -> Result<&'a Grid<f32>> {
    let first = *grids
        .first()
        .ok_or_else(|| ClearskyError::InvalidGrid("empty stack".into()))?;
    let expected = first.shape_descriptor();
    for (i, grid) in grids.iter().enumerate().skip(1) {
        let found = grid.shape_descriptor();
        if !expected.matches(&found) {
            return Err(ClearskyError::InvalidGrid(format!(
                "stack member {i} is {found}, expected {expected}"
            )));
        }
    }
    Ok(first)
}

fn reduce(
    grids: &[&Grid<f32>],
    fill: f32,
    chunks: &[SpatialChunk],
    parallel: bool,
) -> Result<Grid<f32>> {
    let first = grids[0];
    let (rows, cols) = first.data.dim();

    let parts: Vec<Vec<f32>> = if parallel {
        chunks
            .par_iter()
            .map(|chunk| reduce_chunk(grids, chunk, cols, fill))
            .collect()
    } else {
        chunks
            .iter()
            .map(|chunk| reduce_chunk(grids, chunk, cols, fill))
            .collect()
    };

    let flat: Vec<f32> = parts.into_iter().flatten().collect();
    let data = Array2::from_shape_vec((rows, cols), flat)
        .map_err(|e| ClearskyError::InvalidGrid(e.to_string()))?;
    Ok(first.with_data(data, Some(fill)))
}

fn reduce_chunk(grids: &[&Grid<f32>], chunk: &SpatialChunk, cols: usize, fill: f32) -> Vec<f32> {
    let mut samples = Vec::with_capacity(grids.len());
    let mut out = Vec::with_capacity(chunk.rows() * cols);

    for row in chunk.row_start..chunk.row_end {
        for col in 0..cols {
            samples.clear();
            for grid in grids {
                let v = grid.data[[row, col]];
                if !grid.is_missing(v) {
                    samples.push(v);
                }
            }
            out.push(if samples.is_empty() {
                fill
            } else {
                compute_median(&mut samples)
            });
        }
    }
    out
}

/// Median of a non-empty slice; even counts average the two middle values.
pub(crate) fn compute_median(values: &mut [f32]) -> f32 {
    let n = values.len();
    if n == 1 {
        values[0]
    } else if n % 2 == 1 {
        let mid = n / 2;
        *values.select_nth_unstable_by(mid, |a, b| a.total_cmp(b)).1
    } else {
        let mid = n / 2;
        values.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
        values[..mid].select_nth_unstable_by(mid - 1, |a, b| a.total_cmp(b));
        (values[mid - 1] + values[mid]) / 2.0
    }
}
