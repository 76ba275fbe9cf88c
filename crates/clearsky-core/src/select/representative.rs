use std::collections::BTreeSet;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::compute::WorkerPool;
use crate::error::{ClearskyError, Result};
use crate::pipeline::config::{SearchStrategy, SelectionConfig};
use crate::scene::{BucketKey, CoverageRecord};

use super::doy::{circular_doy_distance, normalized_day_of_year};
use super::{chosen, group_candidates, SelectionResult};

/// Best combination found so far: total cost and one candidate index per bucket.
type Best = Option<(u64, Vec<usize>)>;

/// Pick exactly one scene per bucket, minimising the summed pairwise circular
/// day-of-year distance across buckets.
///
/// Candidates pass the coverage threshold and the allowed-month filter. A
/// bucket without candidates makes the whole selection infeasible. Among
/// equally good combinations the first in enumeration order wins: buckets
/// ascending, candidates ascending by `(timestamp, scene_id)`, last bucket
/// varying fastest.
pub fn representative_dates(
    records: &[CoverageRecord],
    config: &SelectionConfig,
    pool: &WorkerPool,
) -> Result<SelectionResult> {
    representative_dates_expecting(records, &BTreeSet::new(), config, pool)
}

/// [`representative_dates`] where every bucket in `expected` needs a
/// candidate, including buckets absent from `records`.
pub fn representative_dates_expecting(
    records: &[CoverageRecord],
    expected: &BTreeSet<BucketKey>,
    config: &SelectionConfig,
    pool: &WorkerPool,
) -> Result<SelectionResult> {
    let (all_buckets, groups) = group_candidates(records, expected, config, true);

    if let Some(&bucket) = all_buckets.iter().find(|b| !groups.contains_key(b)) {
        return Err(ClearskyError::NoCandidateForBucket { bucket });
    }
    if groups.is_empty() {
        return Ok(SelectionResult::default());
    }

    let buckets: Vec<BucketKey> = groups.keys().copied().collect();
    let days: Vec<Vec<u32>> = groups
        .values()
        .map(|cands| cands.iter().map(|r| normalized_day_of_year(&r.timestamp)).collect())
        .collect();

    let combinations = days
        .iter()
        .fold(1u64, |acc, d| acc.saturating_mul(d.len() as u64));
    let forced = days.iter().filter(|d| d.len() == 1).count();
    info!(
        buckets = buckets.len(),
        forced,
        combinations,
        strategy = %config.search.strategy,
        "Searching representative dates"
    );

    let (cost, picks) = match config.search.strategy {
        SearchStrategy::Exhaustive => {
            if let Some(limit) = config.search.max_combinations {
                if combinations > limit {
                    return Err(ClearskyError::CombinationLimitExceeded {
                        combinations,
                        limit,
                    });
                }
            }
            exhaustive_search(&days, pool)
        }
        SearchStrategy::Greedy => greedy_search(&days),
    };
    debug!(cost, ?picks, "Representative combination");

    let mut result = SelectionResult {
        total_distance: Some(cost),
        ..Default::default()
    };
    for ((bucket, cands), &pick) in buckets.iter().zip(groups.values()).zip(&picks) {
        result.buckets.insert(*bucket, vec![chosen(cands[pick])]);
    }
    Ok(result)
}

/// Full enumeration of the Cartesian product, split across the first
/// bucket's candidates. Branch optima are reduced in enumeration order.
fn exhaustive_search(days: &[Vec<u32>], pool: &WorkerPool) -> (u64, Vec<usize>) {
    let branches: Vec<Best> = pool.install(|| {
        days[0]
            .par_iter()
            .enumerate()
            .map(|(i, &day)| {
                let mut best = None;
                let mut picks = vec![i];
                let mut chosen_days = vec![day];
                search_subtree(days, &mut picks, &mut chosen_days, 0, &mut best);
                best
            })
            .collect()
    });

    let mut best: Best = None;
    for (cost, picks) in branches.into_iter().flatten() {
        if best.as_ref().is_none_or(|(c, _)| cost < *c) {
            best = Some((cost, picks));
        }
    }
    // Every bucket has at least one candidate, so some branch produced a result.
    best.unwrap_or_default()
}

/// Depth-first walk in lexicographic order; strict `<` keeps the first optimum.
fn search_subtree(
    days: &[Vec<u32>],
    picks: &mut Vec<usize>,
    chosen_days: &mut Vec<u32>,
    cost: u64,
    best: &mut Best,
) {
    let depth = picks.len();
    if depth == days.len() {
        if best.as_ref().is_none_or(|(c, _)| cost < *c) {
            *best = Some((cost, picks.clone()));
        }
        return;
    }

    for (i, &day) in days[depth].iter().enumerate() {
        let added: u64 = chosen_days
            .iter()
            .map(|&prev| circular_doy_distance(prev, day) as u64)
            .sum();
        picks.push(i);
        chosen_days.push(day);
        search_subtree(days, picks, chosen_days, cost + added, best);
        picks.pop();
        chosen_days.pop();
    }
}

/// Anchor on each first-bucket candidate, then extend bucket by bucket with
/// the candidate closest to everything chosen so far. Not guaranteed optimal.
fn greedy_search(days: &[Vec<u32>]) -> (u64, Vec<usize>) {
    let mut best: Best = None;

    for (anchor, &anchor_day) in days[0].iter().enumerate() {
        let mut picks = vec![anchor];
        let mut chosen_days = vec![anchor_day];
        let mut cost = 0u64;

        for level in &days[1..] {
            let (pick, added) = level
                .iter()
                .enumerate()
                .map(|(i, &day)| {
                    let added: u64 = chosen_days
                        .iter()
                        .map(|&prev| circular_doy_distance(prev, day) as u64)
                        .sum();
                    (i, added)
                })
                .fold((0, u64::MAX), |acc, cur| if cur.1 < acc.1 { cur } else { acc });
            picks.push(pick);
            chosen_days.push(level[pick]);
            cost += added;
        }

        if best.as_ref().is_none_or(|(c, _)| cost < *c) {
            best = Some((cost, picks));
        }
    }
    best.unwrap_or_default()
}
