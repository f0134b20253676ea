use crate::summary::Latency;

// ---------------------------------------------------------------------------
// Percentiles
// ---------------------------------------------------------------------------

/// Linear-interpolated percentile of an unordered sample.
///
/// `p` is a fraction in `[0.0, 1.0]` (values outside are clamped). Matches the
/// default method used by NumPy, so reports stay numerically comparable with
/// summaries produced elsewhere. Returns `0.0` for an empty sample.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(f64::total_cmp);
    percentile_sorted(&sorted, p)
}

/// Same as [`percentile`] for a sample already sorted ascending.
fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let last = sorted.len() - 1;
    let k = last as f64 * p.clamp(0.0, 1.0);
    let f = k.floor() as usize;
    let c = (f + 1).min(last);
    let (lo, hi) = (sorted[f], sorted[c]);
    if f == c || lo == hi {
        return lo;
    }
    // Stay inside [lo, hi] despite rounding.
    (lo + (hi - lo) * (k - f as f64)).max(lo).min(hi)
}

/// The four reported latency percentiles of a sample, sorting it only once.
pub fn latency_from_samples(values: &[f64]) -> Latency {
    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(f64::total_cmp);
    Latency {
        p50: percentile_sorted(&sorted, 0.50),
        p90: percentile_sorted(&sorted, 0.90),
        p95: percentile_sorted(&sorted, 0.95),
        p99: percentile_sorted(&sorted, 0.99),
    }
}

// ---------------------------------------------------------------------------
// Duration / rates
// ---------------------------------------------------------------------------

/// Span between the earliest and latest timestamp, or 0 for no timestamps.
///
/// Units are whatever the caller uses; no validation happens here.
pub fn duration_ms_from_timestamps(timestamps: &[i64]) -> u64 {
    match (timestamps.iter().min(), timestamps.iter().max()) {
        (Some(min), Some(max)) => max.abs_diff(*min),
        _ => 0,
    }
}

/// `failures / max(requests, 1)` rounded to four decimals.
pub fn error_rate(failures: u64, requests: u64) -> f64 {
    round_to(failures as f64 / requests.max(1) as f64, 4)
}

/// Requests per second over `duration_ms`, or 0.0 when no time elapsed.
pub fn throughput_rps(requests: u64, duration_ms: u64) -> f64 {
    if duration_ms == 0 {
        return 0.0;
    }
    requests as f64 / (duration_ms as f64 / 1000.0)
}

/// Round half away from zero to `places` decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // percentile
    // -----------------------------------------------------------------------

    #[test]
    fn percentile_empty_returns_zero() {
        assert_eq!(percentile(&[], 0.0), 0.0);
        assert_eq!(percentile(&[], 0.5), 0.0);
        assert_eq!(percentile(&[], 1.0), 0.0);
    }

    #[test]
    fn percentile_extremes_are_min_and_max() {
        let xs = [42.0, 7.0, 19.5, 3.0, 88.0];
        assert_eq!(percentile(&xs, 0.0), 3.0);
        assert_eq!(percentile(&xs, 1.0), 88.0);
    }

    #[test]
    fn percentile_median_of_uniform_sample() {
        let xs = [10.0, 20.0, 30.0, 40.0, 50.0];
        assert_eq!(percentile(&xs, 0.5), 30.0);
    }

    #[test]
    fn percentile_interpolates_between_neighbours() {
        // k = 4 * 0.9 = 3.6 -> 40 * 0.4 + 50 * 0.6 = 46
        let xs = [10.0, 20.0, 30.0, 40.0, 50.0];
        assert!((percentile(&xs, 0.9) - 46.0).abs() < 1e-9);
        // k = 3 * 0.5 = 1.5 -> halfway between 2 and 3
        assert!((percentile(&[1.0, 2.0, 3.0, 4.0], 0.5) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn percentile_of_equal_neighbours_is_exact() {
        let xs = [0.1, 0.1, 0.1, 0.7];
        for p in [0.1, 0.25, 0.33, 0.5, 0.6] {
            assert_eq!(percentile(&xs, p), 0.1);
        }
    }

    #[test]
    fn percentile_never_leaves_neighbour_range() {
        let xs = [0.1, 0.30000000000000004, 1e-300, 1e300];
        for i in 0..=100 {
            let v = percentile(&xs, f64::from(i) / 100.0);
            assert!((1e-300..=1e300).contains(&v));
        }
    }

    #[test]
    fn percentile_single_entry_returns_that_value() {
        assert_eq!(percentile(&[250.0], 0.5), 250.0);
        assert_eq!(percentile(&[250.0], 0.99), 250.0);
    }

    #[test]
    fn percentile_is_not_affected_by_insertion_order() {
        let ordered = [10.0, 50.0, 100.0, 200.0, 500.0];
        let reversed = [500.0, 200.0, 100.0, 50.0, 10.0];
        for p in [0.5, 0.9, 0.95, 0.99] {
            assert_eq!(percentile(&ordered, p), percentile(&reversed, p));
        }
    }

    #[test]
    fn percentile_clamps_out_of_range_fraction() {
        let xs = [1.0, 2.0, 3.0];
        assert_eq!(percentile(&xs, -0.5), 1.0);
        assert_eq!(percentile(&xs, 1.5), 3.0);
    }

    #[test]
    fn latency_from_samples_matches_individual_percentiles() {
        let xs = [120.0, 80.0, 95.0, 300.0, 101.0, 99.0, 87.0];
        let lat = latency_from_samples(&xs);
        assert_eq!(lat.p50, percentile(&xs, 0.50));
        assert_eq!(lat.p90, percentile(&xs, 0.90));
        assert_eq!(lat.p95, percentile(&xs, 0.95));
        assert_eq!(lat.p99, percentile(&xs, 0.99));
    }

    #[test]
    fn latency_from_empty_sample_is_zeroed() {
        assert_eq!(latency_from_samples(&[]), Latency::default());
    }

    // -----------------------------------------------------------------------
    // duration / rates
    // -----------------------------------------------------------------------

    #[test]
    fn duration_of_no_timestamps_is_zero() {
        assert_eq!(duration_ms_from_timestamps(&[]), 0);
    }

    #[test]
    fn duration_is_max_minus_min() {
        assert_eq!(duration_ms_from_timestamps(&[100, 500, 300]), 400);
        assert_eq!(duration_ms_from_timestamps(&[1_000]), 0);
    }

    #[test]
    fn error_rate_rounds_to_four_places() {
        assert_eq!(error_rate(1, 2), 0.5);
        assert_eq!(error_rate(1, 3), 0.3333);
        assert_eq!(error_rate(2, 3), 0.6667);
    }

    #[test]
    fn error_rate_with_no_requests_is_zero() {
        assert_eq!(error_rate(0, 0), 0.0);
    }

    #[test]
    fn throughput_is_zero_without_duration() {
        assert_eq!(throughput_rps(100, 0), 0.0);
    }

    #[test]
    fn throughput_uses_seconds() {
        assert!((throughput_rps(100, 2_000) - 50.0).abs() < 1e-9);
        assert!((throughput_rps(3, 500) - 6.0).abs() < 1e-9);
    }

    #[test]
    fn round_to_handles_places() {
        assert_eq!(round_to(0.123456, 4), 0.1235);
        assert_eq!(round_to(2.5, 0), 3.0);
    }
}
