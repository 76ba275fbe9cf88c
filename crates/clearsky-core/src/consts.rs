/// Minimum pixel count (rows*cols) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Length of the circular day-of-year scale. Leap years are folded onto it.
pub const DAYS_PER_CYCLE: u32 = 365;

/// Largest possible circular distance on a [`DAYS_PER_CYCLE`] scale.
pub const MAX_CIRCULAR_DISTANCE: u32 = DAYS_PER_CYCLE / 2;

/// Ordinal of Feb 28. In leap years Feb 29 collapses onto it.
pub const FEB_28_ORDINAL: u32 = 59;

/// Scene classification codes excluded by default: cloud shadow (3),
/// cloud medium probability (8), cloud high probability (9).
pub const DEFAULT_EXCLUDED_CLASSES: [u8; 3] = [3, 8, 9];

/// Classification code marking no-data pixels.
pub const DEFAULT_CLASSIFICATION_NODATA: u8 = 0;

/// Default per-scene coverage threshold (strict inequality).
pub const DEFAULT_MIN_FRACTION_VALID: f64 = 0.95;

/// Default value written where no valid sample survives the reduction.
pub const DEFAULT_FILL_VALUE: f32 = 0.0;

/// Default cap on the number of date combinations enumerated by the
/// representative-date search.
pub const DEFAULT_MAX_COMBINATIONS: u64 = 10_000_000;

/// Default number of grid rows per spatial chunk during aggregation.
pub const DEFAULT_CHUNK_ROWS: usize = 256;

/// Default output naming template when every retained scene is composited.
pub const DEFAULT_NAMING_TEMPLATE: &str = "{tile}_{orbit}_{bucket}_{band}";

/// Default output naming template for representative-date selection; names
/// carry the chosen acquisition date.
pub const DEFAULT_REPRESENTATIVE_NAMING_TEMPLATE: &str = "{tile}_{orbit}_{date}_{band}";

/// Tolerance when comparing grid origins and resolutions.
pub const GEOMETRY_EPSILON: f64 = 1e-6;
