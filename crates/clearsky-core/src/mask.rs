use ndarray::{Array2, Zip};

use crate::consts::{DEFAULT_EXCLUDED_CLASSES, PARALLEL_PIXEL_THRESHOLD};
use crate::error::{ClearskyError, Result};
use crate::grid::Grid;

/// Set of classification codes that make a pixel unusable.
///
/// Backed by a 256-entry lookup table over the `u8` code alphabet.
#[derive(Clone)]
pub struct ExcludedClasses {
    table: [bool; 256],
}

impl ExcludedClasses {
    pub fn new(codes: &[u8]) -> Self {
        let mut table = [false; 256];
        for &code in codes {
            table[code as usize] = true;
        }
        Self { table }
    }

    pub fn contains(&self, code: u8) -> bool {
        self.table[code as usize]
    }

    pub fn codes(&self) -> Vec<u8> {
        (0..=u8::MAX).filter(|&c| self.contains(c)).collect()
    }
}

impl Default for ExcludedClasses {
    fn default() -> Self {
        Self::new(&DEFAULT_EXCLUDED_CLASSES)
    }
}

impl std::fmt::Debug for ExcludedClasses {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.codes()).finish()
    }
}

/// Build the validity grid of a classification grid.
///
/// A pixel is valid unless its class is excluded or equals the grid's
/// no-data sentinel.
pub fn validity_mask(classification: &Grid<u8>, excluded: &ExcludedClasses) -> Grid<bool> {
    let nodata = classification.nodata;
    let is_valid = |code: u8| !excluded.contains(code) && Some(code) != nodata;

    let mut valid = Array2::<bool>::from_elem(classification.data.dim(), false);
    let zip = Zip::from(&mut valid).and(&classification.data);
    if classification.rows() * classification.cols() >= PARALLEL_PIXEL_THRESHOLD {
        zip.par_for_each(|v, &code| *v = is_valid(code));
    } else {
        zip.for_each(|v, &code| *v = is_valid(code));
    }

    classification.with_data(valid, None)
}

/// Mask `band` with the validity grid of `classification`.
///
/// Classification rasters are often coarser than value bands (20 m SCL
/// against 10 m reflectance); the validity grid is then resampled onto the
/// band grid by nearest neighbour, with band pixels outside it invalid.
pub fn mask_band(
    band: &Grid<f32>,
    classification: &Grid<u8>,
    excluded: &ExcludedClasses,
) -> Result<Grid<f32>> {
    let validity = validity_mask(classification, excluded);
    if validity.shape_descriptor().matches(&band.shape_descriptor()) {
        return apply_mask(band, &validity);
    }
    let resampled = validity.resample_nearest(&band.geometry, band.rows(), band.cols(), false)?;
    apply_mask(band, &resampled)
}

/// Copy of `band` with every pixel invalid under `validity` set to NaN.
pub fn apply_mask(band: &Grid<f32>, validity: &Grid<bool>) -> Result<Grid<f32>> {
    if band.data.dim() != validity.data.dim() {
        return Err(ClearskyError::InvalidGrid(format!(
            "mask is {:?} but band is {:?}",
            validity.data.dim(),
            band.data.dim()
        )));
    }

    let mut masked = band.data.clone();
    Zip::from(&mut masked)
        .and(&validity.data)
        .for_each(|v, &ok| {
            if !ok {
                *v = f32::NAN;
            }
        });

    Ok(band.with_data(masked, band.nodata))
}
