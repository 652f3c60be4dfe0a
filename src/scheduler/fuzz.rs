//! Banded interval fuzzing.
//!
//! Review intervals are jittered so that cards reviewed together do not
//! stay due together forever. The jitter is uniform within a band whose
//! width shrinks as the interval grows; sub-day learning steps and
//! intervals under 2.5 days are never fuzzed.

use rand::Rng;

struct FuzzRange {
    start: f64,
    end: f64,
    factor: f64,
}

const FUZZ_RANGES: [FuzzRange; 3] = [
    FuzzRange {
        start: 2.5,
        end: 7.0,
        factor: 0.15,
    },
    FuzzRange {
        start: 7.0,
        end: 20.0,
        factor: 0.10,
    },
    FuzzRange {
        start: 20.0,
        end: f64::INFINITY,
        factor: 0.05,
    },
];

/// Fuzz an interval in whole days with a provided RNG.
///
/// Intervals under 2.5 days are returned unchanged. The result is a
/// uniform draw from `[interval - delta, interval + delta]` rounded to a
/// whole day, where `delta` is the band factor times the interval; the
/// floor is 2 days and the ceiling is the configured maximum interval.
pub(crate) fn fuzzed_interval_with_rng<R: Rng>(
    rng: &mut R,
    interval_days: f64,
    maximum_interval: u32,
) -> f64 {
    if interval_days < 2.5 {
        return interval_days;
    }

    let factor = FUZZ_RANGES
        .iter()
        .find(|range| interval_days >= range.start && interval_days < range.end)
        .map(|range| range.factor)
        .unwrap_or(0.05);

    let delta = (factor * interval_days).round();
    let max_interval = f64::from(maximum_interval);
    let upper = (interval_days + delta).min(max_interval);
    let lower = (interval_days - delta).max(2.0).min(upper);

    rng.gen_range(lower..=upper).round()
}
