/// A horizontal band of grid rows, the unit of spatial work.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpatialChunk {
    pub index: usize,
    pub row_start: usize,
    pub row_end: usize,
}

impl SpatialChunk {
    pub fn rows(&self) -> usize {
        self.row_end - self.row_start
    }
}

/// Split `rows` into consecutive chunks of at most `chunk_rows` rows.
///
/// Chunks are returned in row order and cover every row exactly once.
pub fn plan_chunks(rows: usize, chunk_rows: usize) -> Vec<SpatialChunk> {
    let step = chunk_rows.max(1);
    (0..rows)
        .step_by(step)
        .enumerate()
        .map(|(index, row_start)| SpatialChunk {
            index,
            row_start,
            row_end: (row_start + step).min(rows),
        })
        .collect()
}
