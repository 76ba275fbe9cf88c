pub mod doy;
mod representative;
mod retain;

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Datelike, Utc};
use tracing::info;

use crate::compute::WorkerPool;
use crate::error::Result;
use crate::pipeline::config::{SelectionConfig, SelectionPolicy};
use crate::scene::{BucketKey, CoverageRecord};

pub use doy::{circular_doy_distance, combination_cost, normalized_day_of_year};
pub use representative::{representative_dates, representative_dates_expecting};
pub use retain::{retain_all, retain_all_expecting};

/// A scene kept for a bucket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChosenScene {
    pub scene_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Outcome of date selection, ordered by bucket.
#[derive(Clone, Debug, Default)]
pub struct SelectionResult {
    /// Chosen scenes per bucket, each list ascending by `(timestamp, scene_id)`.
    pub buckets: BTreeMap<BucketKey, Vec<ChosenScene>>,
    /// Buckets that retained nothing and produce no composite.
    pub skipped: Vec<BucketKey>,
    /// Total pairwise circular day-of-year distance of a representative-date selection.
    pub total_distance: Option<u64>,
}

impl SelectionResult {
    pub fn scene_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn contains_scene(&self, scene_id: &str) -> bool {
        self.buckets
            .values()
            .flatten()
            .any(|c| c.scene_id == scene_id)
    }
}

/// Select scenes per bucket according to `config.policy`.
///
/// `records` may arrive in any order; candidates are always enumerated by
/// ascending bucket, then ascending `(timestamp, scene_id)`.
pub fn select_dates(
    records: &[CoverageRecord],
    config: &SelectionConfig,
    pool: &WorkerPool,
) -> Result<SelectionResult> {
    select_dates_expecting(records, &BTreeSet::new(), config, pool)
}

/// Like [`select_dates`], but every bucket in `expected` must be accounted
/// for even when none of its scenes produced a coverage record, e.g. because
/// they all failed to load.
pub fn select_dates_expecting(
    records: &[CoverageRecord],
    expected: &BTreeSet<BucketKey>,
    config: &SelectionConfig,
    pool: &WorkerPool,
) -> Result<SelectionResult> {
    let result = match config.policy {
        SelectionPolicy::RetainAll => retain_all_expecting(records, expected, config),
        SelectionPolicy::RepresentativeSingleDate => {
            representative_dates_expecting(records, expected, config, pool)?
        }
    };
    info!(
        policy = %config.policy,
        buckets = result.buckets.len(),
        scenes = result.scene_count(),
        skipped = result.skipped.len(),
        "Date selection complete"
    );
    Ok(result)
}

/// Every bucket present in `records` or `expected`, plus the records passing
/// the coverage threshold (and, when `month_filter` is set, the allowed-month
/// filter) grouped by bucket in enumeration order.
pub(crate) fn group_candidates<'a>(
    records: &'a [CoverageRecord],
    expected: &BTreeSet<BucketKey>,
    config: &SelectionConfig,
    month_filter: bool,
) -> (BTreeSet<BucketKey>, BTreeMap<BucketKey, Vec<&'a CoverageRecord>>) {
    let mut all_buckets = expected.clone();
    let mut groups: BTreeMap<BucketKey, Vec<&CoverageRecord>> = BTreeMap::new();

    for record in records {
        let bucket = config.granularity.key(&record.timestamp);
        all_buckets.insert(bucket);

        if record.fraction_valid <= config.min_fraction_valid {
            continue;
        }
        if month_filter
            && !config.allowed_months.is_empty()
            && !config.allowed_months.contains(&record.timestamp.month())
        {
            continue;
        }
        groups.entry(bucket).or_default().push(record);
    }

    for candidates in groups.values_mut() {
        candidates.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.scene_id.cmp(&b.scene_id))
        });
    }
    (all_buckets, groups)
}

fn chosen(record: &CoverageRecord) -> ChosenScene {
    ChosenScene {
        scene_id: record.scene_id.clone(),
        timestamp: record.timestamp,
    }
}
