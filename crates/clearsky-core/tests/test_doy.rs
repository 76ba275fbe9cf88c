#[allow(dead_code)]
mod common;

use clearsky_core::consts::MAX_CIRCULAR_DISTANCE;
use clearsky_core::select::{circular_doy_distance, combination_cost, normalized_day_of_year};

#[test]
fn test_distance_symmetric_and_bounded() {
    for a in 1..=365 {
        for b in 1..=365 {
            let d = circular_doy_distance(a, b);
            assert_eq!(d, circular_doy_distance(b, a));
            assert!(d <= MAX_CIRCULAR_DISTANCE, "d({a}, {b}) = {d}");
        }
    }
}

#[test]
fn test_distance_wraps_year_end() {
    assert_eq!(circular_doy_distance(1, 365), 1);
    assert_eq!(circular_doy_distance(360, 5), 10);
    assert_eq!(circular_doy_distance(10, 300), 75);
    assert_eq!(circular_doy_distance(42, 42), 0);
    assert_eq!(circular_doy_distance(1, 183), 182);
}

#[test]
fn test_normalized_doy_common_year() {
    assert_eq!(normalized_day_of_year(&common::utc(2021, 1, 1)), 1);
    assert_eq!(normalized_day_of_year(&common::utc(2021, 3, 1)), 60);
    assert_eq!(normalized_day_of_year(&common::utc(2021, 12, 31)), 365);
}

#[test]
fn test_normalized_doy_leap_year() {
    assert_eq!(normalized_day_of_year(&common::utc(2020, 2, 28)), 59);
    assert_eq!(normalized_day_of_year(&common::utc(2020, 2, 29)), 59);
    assert_eq!(normalized_day_of_year(&common::utc(2020, 3, 1)), 60);
    assert_eq!(normalized_day_of_year(&common::utc(2020, 12, 31)), 365);
}

#[test]
fn test_same_calendar_date_same_doy() {
    for (m, d) in [(1, 15), (3, 1), (6, 30), (10, 27), (12, 31)] {
        assert_eq!(
            normalized_day_of_year(&common::utc(2020, m, d)),
            normalized_day_of_year(&common::utc(2021, m, d))
        );
    }
}

#[test]
fn test_combination_cost_pairwise() {
    assert_eq!(combination_cost(&[10, 12]), 2);
    assert_eq!(combination_cost(&[10, 300]), 75);
    // 2 + 8 + 10
    assert_eq!(combination_cost(&[10, 12, 20]), 20);
    assert_eq!(combination_cost(&[100]), 0);
    assert_eq!(combination_cost(&[]), 0);
}
