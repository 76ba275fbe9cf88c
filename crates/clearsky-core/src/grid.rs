use std::fmt;

use ndarray::{s, Array2};
use serde::{Deserialize, Serialize};

use crate::consts::GEOMETRY_EPSILON;
use crate::error::{ClearskyError, Result};

/// Axis-aligned extent in the grid's coordinate reference system.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Build from a `[min_x, min_y, max_x, max_y]` array, the catalog `bbox` layout.
    pub fn from_array(bbox: [f64; 4]) -> Self {
        Self::new(bbox[0], bbox[1], bbox[2], bbox[3])
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn is_valid(&self) -> bool {
        self.width() > 0.0 && self.height() > 0.0
    }

    pub fn intersects(&self, other: &Bounds) -> bool {
        !(self.max_x <= other.min_x
            || self.min_x >= other.max_x
            || self.max_y <= other.min_y
            || self.min_y >= other.max_y)
    }

    pub fn intersection(&self, other: &Bounds) -> Option<Bounds> {
        if !self.intersects(other) {
            return None;
        }
        Some(Bounds {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        })
    }
}

/// Affine placement of a north-up grid: upper-left origin plus pixel size.
///
/// Rows grow southward, so `pixel_height` is stored positive and subtracted
/// from `origin_y`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
    pub crs: String,
}

impl GridGeometry {
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64, crs: &str) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
            crs: crs.to_string(),
        }
    }

    /// Derive the geometry of a `rows x cols` grid that exactly covers `bounds`.
    pub fn from_bounds(bounds: &Bounds, rows: usize, cols: usize, crs: &str) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(ClearskyError::InvalidGrid(format!(
                "cannot place a {rows}x{cols} grid"
            )));
        }
        if !bounds.is_valid() {
            return Err(ClearskyError::InvalidGrid(format!(
                "degenerate bounds {bounds:?}"
            )));
        }
        Ok(Self::new(
            bounds.min_x,
            bounds.max_y,
            bounds.width() / cols as f64,
            bounds.height() / rows as f64,
            crs,
        ))
    }

    pub fn bounds(&self, rows: usize, cols: usize) -> Bounds {
        Bounds {
            min_x: self.origin_x,
            min_y: self.origin_y - rows as f64 * self.pixel_height,
            max_x: self.origin_x + cols as f64 * self.pixel_width,
            max_y: self.origin_y,
        }
    }

    /// Pixel window of a `rows x cols` grid covering `target`, clipped to the grid.
    pub fn window(&self, target: &Bounds, rows: usize, cols: usize) -> Option<PixelWindow> {
        let clipped = self.bounds(rows, cols).intersection(target)?;

        let col_start = ((clipped.min_x - self.origin_x) / self.pixel_width + GEOMETRY_EPSILON)
            .floor()
            .max(0.0) as usize;
        let col_end = ((clipped.max_x - self.origin_x) / self.pixel_width - GEOMETRY_EPSILON)
            .ceil()
            .min(cols as f64) as usize;
        let row_start = ((self.origin_y - clipped.max_y) / self.pixel_height + GEOMETRY_EPSILON)
            .floor()
            .max(0.0) as usize;
        let row_end = ((self.origin_y - clipped.min_y) / self.pixel_height - GEOMETRY_EPSILON)
            .ceil()
            .min(rows as f64) as usize;

        if col_end <= col_start || row_end <= row_start {
            return None;
        }
        Some(PixelWindow {
            row: row_start,
            col: col_start,
            rows: row_end - row_start,
            cols: col_end - col_start,
        })
    }

    fn shifted(&self, window: &PixelWindow) -> Self {
        Self {
            origin_x: self.origin_x + window.col as f64 * self.pixel_width,
            origin_y: self.origin_y - window.row as f64 * self.pixel_height,
            pixel_width: self.pixel_width,
            pixel_height: self.pixel_height,
            crs: self.crs.clone(),
        }
    }
}

/// A rectangle in pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelWindow {
    pub row: usize,
    pub col: usize,
    pub rows: usize,
    pub cols: usize,
}

/// Everything two grids must agree on before they can be stacked.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeDescriptor {
    pub rows: usize,
    pub cols: usize,
    pub pixel_width: f64,
    pub pixel_height: f64,
    pub origin_x: f64,
    pub origin_y: f64,
    pub crs: String,
}

impl ShapeDescriptor {
    pub fn matches(&self, other: &ShapeDescriptor) -> bool {
        let close = |a: f64, b: f64| (a - b).abs() <= GEOMETRY_EPSILON * a.abs().max(1.0);
        self.rows == other.rows
            && self.cols == other.cols
            && self.crs == other.crs
            && close(self.pixel_width, other.pixel_width)
            && close(self.pixel_height, other.pixel_height)
            && close(self.origin_x, other.origin_x)
            && close(self.origin_y, other.origin_y)
    }
}

impl fmt::Display for ShapeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} @ {}x{} {} origin ({}, {})",
            self.rows,
            self.cols,
            self.pixel_width,
            self.pixel_height,
            self.crs,
            self.origin_x,
            self.origin_y
        )
    }
}

/// Pixel types that can live in a [`Grid`].
pub trait Sample: Copy + PartialEq + Send + Sync + 'static {
    /// Whether `self` is a no-data sample given the grid's sentinel.
    fn is_missing(self, nodata: Option<Self>) -> bool {
        nodata == Some(self)
    }
}

impl Sample for bool {}
impl Sample for u8 {}
impl Sample for u16 {}
impl Sample for i16 {}

impl Sample for f32 {
    fn is_missing(self, nodata: Option<Self>) -> bool {
        self.is_nan() || nodata == Some(self)
    }
}

impl Sample for f64 {
    fn is_missing(self, nodata: Option<Self>) -> bool {
        self.is_nan() || nodata == Some(self)
    }
}

/// A georeferenced 2-D raster, shape = (rows, cols), row-major.
#[derive(Clone, Debug)]
pub struct Grid<T> {
    pub data: Array2<T>,
    pub geometry: GridGeometry,
    pub nodata: Option<T>,
}

impl<T: Sample> Grid<T> {
    pub fn new(data: Array2<T>, geometry: GridGeometry) -> Self {
        Self {
            data,
            geometry,
            nodata: None,
        }
    }

    pub fn with_nodata(mut self, nodata: T) -> Self {
        self.nodata = Some(nodata);
        self
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.rows() == 0 || self.cols() == 0
    }

    pub fn is_missing(&self, value: T) -> bool {
        value.is_missing(self.nodata)
    }

    pub fn bounds(&self) -> Bounds {
        self.geometry.bounds(self.rows(), self.cols())
    }

    pub fn shape_descriptor(&self) -> ShapeDescriptor {
        ShapeDescriptor {
            rows: self.rows(),
            cols: self.cols(),
            pixel_width: self.geometry.pixel_width,
            pixel_height: self.geometry.pixel_height,
            origin_x: self.geometry.origin_x,
            origin_y: self.geometry.origin_y,
            crs: self.geometry.crs.clone(),
        }
    }

    /// New grid with the same geometry and no-data sentinel but different samples.
    pub fn with_data<U: Sample>(&self, data: Array2<U>, nodata: Option<U>) -> Grid<U> {
        Grid {
            data,
            geometry: self.geometry.clone(),
            nodata,
        }
    }

    /// Copy out a pixel window. The window must lie inside the grid.
    pub fn crop(&self, window: &PixelWindow) -> Result<Grid<T>> {
        if window.rows == 0
            || window.cols == 0
            || window.row + window.rows > self.rows()
            || window.col + window.cols > self.cols()
        {
            return Err(ClearskyError::InvalidGrid(format!(
                "window {window:?} exceeds grid {}x{}",
                self.rows(),
                self.cols()
            )));
        }
        let data = self
            .data
            .slice(s![
                window.row..window.row + window.rows,
                window.col..window.col + window.cols
            ])
            .to_owned();
        Ok(Grid {
            data,
            geometry: self.geometry.shifted(window),
            nodata: self.nodata,
        })
    }

    /// Nearest-neighbour resample onto a `rows x cols` grid placed by
    /// `geometry`. Target pixels whose centre falls outside this grid get
    /// `outside`. Both grids must share a CRS.
    pub fn resample_nearest(
        &self,
        geometry: &GridGeometry,
        rows: usize,
        cols: usize,
        outside: T,
    ) -> Result<Grid<T>> {
        if geometry.crs != self.geometry.crs {
            return Err(ClearskyError::InvalidGrid(format!(
                "cannot resample from '{}' to '{}'",
                self.geometry.crs, geometry.crs
            )));
        }
        let src = &self.geometry;
        let (src_rows, src_cols) = (self.rows() as f64, self.cols() as f64);
        let data = Array2::from_shape_fn((rows, cols), |(r, c)| {
            let x = geometry.origin_x + (c as f64 + 0.5) * geometry.pixel_width;
            let y = geometry.origin_y - (r as f64 + 0.5) * geometry.pixel_height;
            let col = ((x - src.origin_x) / src.pixel_width).floor();
            let row = ((src.origin_y - y) / src.pixel_height).floor();
            if col < 0.0 || row < 0.0 || col >= src_cols || row >= src_rows {
                outside
            } else {
                self.data[[row as usize, col as usize]]
            }
        });
        Ok(Grid {
            data,
            geometry: geometry.clone(),
            nodata: self.nodata,
        })
    }

    /// Crop to the pixels covering `target`.
    pub fn crop_to_bounds(&self, target: &Bounds) -> Result<Grid<T>> {
        let window = self
            .geometry
            .window(target, self.rows(), self.cols())
            .ok_or_else(|| {
                ClearskyError::InvalidGrid(format!(
                    "extent {target:?} does not overlap grid bounds {:?}",
                    self.bounds()
                ))
            })?;
        self.crop(&window)
    }
}
