/// Rolling-window statistical tests (codes 4 and 7).
///
/// Code 4 is the workhorse outlier pass: a centered rolling mean and
/// standard deviation over roughly a month of hourly samples, rejecting
/// anything more than `k` standard deviations from the local mean. Code 7
/// is the coarse final sweep with an absolute deviation threshold instead
/// of a standard-deviation multiple, catching drifts the earlier tests let
/// through.
///
/// Both degrade gracefully at window edges and through sparse stretches:
/// a row whose window holds fewer than two non-null samples (or, for code
/// 4, a zero spread) emits no flag rather than aborting the pipeline.

use super::{FLAG_OUTLIER, FLAG_WINDOW_MEAN};

/// Fewest non-null samples a window must hold before either test will
/// judge a row.
const MIN_WINDOW_SAMPLES: usize = 2;

// ---------------------------------------------------------------------------
// Window statistics
// ---------------------------------------------------------------------------

/// Mean and sample standard deviation of the non-null values in the
/// centered window around `i`, including row `i` itself. Returns `None`
/// below `MIN_WINDOW_SAMPLES`.
fn window_stats(values: &[Option<f64>], i: usize, window: usize) -> Option<(f64, f64)> {
    let half = window / 2;
    let lo = i.saturating_sub(half);
    let hi = (i + half + 1).min(values.len());

    let mut n = 0usize;
    let mut sum = 0.0;
    for v in values[lo..hi].iter().flatten() {
        n += 1;
        sum += v;
    }
    if n < MIN_WINDOW_SAMPLES {
        return None;
    }
    let mean = sum / n as f64;

    let mut ss = 0.0;
    for v in values[lo..hi].iter().flatten() {
        ss += (v - mean) * (v - mean);
    }
    let std = (ss / (n - 1) as f64).sqrt();
    Some((mean, std))
}

// ---------------------------------------------------------------------------
// Code 4: rolling statistical outlier
// ---------------------------------------------------------------------------

/// Nulls and flags every value more than `k` standard deviations from the
/// mean of its centered `window`-sample neighbourhood. Statistics are
/// computed once over the input, not re-derived as rows fall, so the
/// pass is order-independent within the window.
pub fn rolling_outlier(
    values: &[Option<f64>],
    window: usize,
    k: f64,
) -> (Vec<Option<f64>>, Vec<u8>) {
    let mut corrected = values.to_vec();
    let mut flags = vec![0u8; values.len()];

    for i in 0..values.len() {
        let Some(v) = values[i] else { continue };
        let Some((mean, std)) = window_stats(values, i, window) else {
            continue;
        };
        if std <= 0.0 {
            continue;
        }
        if (v - mean).abs() > k * std {
            corrected[i] = None;
            flags[i] = FLAG_OUTLIER;
        }
    }

    (corrected, flags)
}

// ---------------------------------------------------------------------------
// Code 7: sliding-window mean threshold
// ---------------------------------------------------------------------------

/// Nulls and flags every value deviating from its centered `window`-sample
/// mean by more than the absolute `threshold`.
pub fn sliding_mean_threshold(
    values: &[Option<f64>],
    window: usize,
    threshold: f64,
) -> (Vec<Option<f64>>, Vec<u8>) {
    let mut corrected = values.to_vec();
    let mut flags = vec![0u8; values.len()];

    for i in 0..values.len() {
        let Some(v) = values[i] else { continue };
        let Some((mean, _)) = window_stats(values, i, window) else {
            continue;
        };
        if (v - mean).abs() > threshold {
            corrected[i] = None;
            flags[i] = FLAG_WINDOW_MEAN;
        }
    }

    (corrected, flags)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// A gently varying base signal long enough to give the window real
    /// statistics, with one wild sample planted in the middle.
    fn signal_with_spike(len: usize, spike_at: usize, spike: f64) -> Vec<Option<f64>> {
        let mut values: Vec<Option<f64>> = (0..len)
            .map(|i| Some(10.0 + ((i % 7) as f64) * 0.5))
            .collect();
        values[spike_at] = Some(spike);
        values
    }

    #[test]
    fn test_outlier_far_from_local_mean_is_nulled() {
        let values = signal_with_spike(200, 100, 500.0);
        let (corrected, flags) = rolling_outlier(&values, 48, 4.0);
        assert_eq!(corrected[100], None, "a 500-unit spike in a ~10-unit signal must fall");
        assert_eq!(flags[100], FLAG_OUTLIER);
        // The base signal survives.
        assert_eq!(corrected[50], values[50]);
        assert_eq!(flags[50], 0);
    }

    #[test]
    fn test_constant_window_emits_no_flags() {
        // Zero spread: the test cannot judge, so it must not reject.
        let values: Vec<_> = std::iter::repeat(Some(3.0)).take(60).collect();
        let (corrected, flags) = rolling_outlier(&values, 24, 4.0);
        assert_eq!(corrected, values);
        assert!(flags.iter().all(|f| *f == 0));
    }

    #[test]
    fn test_sparse_window_degrades_to_no_flag() {
        // One lonely value: fewer than two samples in any window.
        let mut values = vec![None; 30];
        values[15] = Some(1000.0);
        let (corrected, flags) = rolling_outlier(&values, 24, 4.0);
        assert_eq!(corrected[15], Some(1000.0));
        assert!(flags.iter().all(|f| *f == 0));
    }

    #[test]
    fn test_statistics_are_not_rederived_mid_pass() {
        // Two equal spikes close together: each is judged against window
        // statistics that still include the other, so both fall or neither
        // does. With k=2 both must fall.
        let mut values = signal_with_spike(200, 100, 300.0);
        values[103] = Some(300.0);
        let (corrected, flags) = rolling_outlier(&values, 48, 2.0);
        assert_eq!(corrected[100], None);
        assert_eq!(corrected[103], None);
        assert_eq!(flags[100], FLAG_OUTLIER);
        assert_eq!(flags[103], FLAG_OUTLIER);
    }

    #[test]
    fn test_sliding_mean_threshold_uses_absolute_deviation() {
        let values = signal_with_spike(400, 200, 60.0);
        let (corrected, flags) = sliding_mean_threshold(&values, 336, 25.0);
        assert_eq!(corrected[200], None, "60 is more than 25 off a ~10 mean");
        assert_eq!(flags[200], FLAG_WINDOW_MEAN);
        assert_eq!(corrected[10], values[10]);
    }

    #[test]
    fn test_sliding_mean_threshold_keeps_deviation_at_limit() {
        // All values equal: deviation zero, nothing at or under the
        // threshold may fall.
        let values: Vec<_> = std::iter::repeat(Some(8.0)).take(50).collect();
        let (corrected, flags) = sliding_mean_threshold(&values, 20, 0.0);
        assert_eq!(corrected, values);
        assert!(flags.iter().all(|f| *f == 0));
    }
}
