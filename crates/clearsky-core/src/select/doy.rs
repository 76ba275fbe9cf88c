use chrono::{DateTime, Datelike, Utc};

use crate::consts::{DAYS_PER_CYCLE, FEB_28_ORDINAL};

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Day of year on a 365-day calendar scale (1..=365).
///
/// In leap years every day after Feb 28 is shifted down by one so that the
/// same calendar date maps to the same value in every year; Feb 29 shares
/// the value of Feb 28.
pub fn normalized_day_of_year(timestamp: &DateTime<Utc>) -> u32 {
    let ordinal = timestamp.ordinal();
    if is_leap_year(timestamp.year()) && ordinal > FEB_28_ORDINAL {
        ordinal - 1
    } else {
        ordinal
    }
}

/// Shortest distance between two days of year on the wraparound scale.
///
/// Symmetric and never larger than [`crate::consts::MAX_CIRCULAR_DISTANCE`].
pub fn circular_doy_distance(a: u32, b: u32) -> u32 {
    let diff = a.abs_diff(b) % DAYS_PER_CYCLE;
    diff.min(DAYS_PER_CYCLE - diff)
}

/// Sum of circular distances over every unordered pair of `days`.
pub fn combination_cost(days: &[u32]) -> u64 {
    days.iter()
        .enumerate()
        .flat_map(|(i, &a)| days[i + 1..].iter().map(move |&b| circular_doy_distance(a, b) as u64))
        .sum()
}
