use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::grid::Grid;

/// One acquisition over the tile: a classification grid plus value bands.
#[derive(Clone, Debug)]
pub struct Scene {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub classification: Grid<u8>,
    /// Value bands by name, e.g. `"B04"`.
    pub bands: BTreeMap<String, Grid<f32>>,
}

impl Scene {
    pub fn band(&self, name: &str) -> Option<&Grid<f32>> {
        self.bands.get(name)
    }
}

/// Fraction of usable pixels in one scene.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoverageRecord {
    pub scene_id: String,
    pub timestamp: DateTime<Utc>,
    pub fraction_valid: f64,
}

/// Temporal grouping of scenes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BucketGranularity {
    #[default]
    Year,
    Month,
}

impl BucketGranularity {
    pub fn key(&self, timestamp: &DateTime<Utc>) -> BucketKey {
        match self {
            Self::Year => BucketKey::year(timestamp.year()),
            Self::Month => BucketKey::month(timestamp.year(), timestamp.month()),
        }
    }

    /// Distinct buckets touched by `timestamps`.
    pub fn keys<'a>(
        &self,
        timestamps: impl IntoIterator<Item = &'a DateTime<Utc>>,
    ) -> BTreeSet<BucketKey> {
        timestamps.into_iter().map(|t| self.key(t)).collect()
    }
}

impl fmt::Display for BucketGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Year => write!(f, "Year"),
            Self::Month => write!(f, "Month"),
        }
    }
}

/// Bucket identifier. Orders chronologically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BucketKey {
    pub year: i32,
    pub month: Option<u32>,
}

impl BucketKey {
    pub fn year(year: i32) -> Self {
        Self { year, month: None }
    }

    pub fn month(year: i32, month: u32) -> Self {
        Self {
            year,
            month: Some(month),
        }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.month {
            Some(m) => write!(f, "{}-{:02}", self.year, m),
            None => write!(f, "{}", self.year),
        }
    }
}
