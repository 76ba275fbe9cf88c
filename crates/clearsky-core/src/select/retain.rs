use std::collections::BTreeSet;

use tracing::info;

use crate::pipeline::config::SelectionConfig;
use crate::scene::{BucketKey, CoverageRecord};

use super::{chosen, group_candidates, SelectionResult};

/// Keep every scene above the coverage threshold, grouped by bucket.
///
/// Buckets where nothing passes are listed in `skipped`.
pub fn retain_all(records: &[CoverageRecord], config: &SelectionConfig) -> SelectionResult {
    retain_all_expecting(records, &BTreeSet::new(), config)
}

/// [`retain_all`] where every bucket in `expected` is reported, kept or skipped.
pub fn retain_all_expecting(
    records: &[CoverageRecord],
    expected: &BTreeSet<BucketKey>,
    config: &SelectionConfig,
) -> SelectionResult {
    let (all_buckets, groups) = group_candidates(records, expected, config, false);

    let mut result = SelectionResult::default();
    for bucket in all_buckets {
        match groups.get(&bucket) {
            Some(candidates) => {
                result
                    .buckets
                    .insert(bucket, candidates.iter().map(|r| chosen(r)).collect());
            }
            None => {
                info!(%bucket, "No scene above coverage threshold, skipping bucket");
                result.skipped.push(bucket);
            }
        }
    }
    result
}
