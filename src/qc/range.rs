/// Static range test (code 1).
///
/// A physical quantity sampled hourly cannot jump arbitrarily between
/// samples; a step larger than the configured size is a spike, not weather.
/// Values failing the test are nulled and flagged.
///
/// Comparison policy: the test re-reads the corrected series as it walks.
/// Each value is compared against the most recent RETAINED (non-null)
/// value, so once a spike is nulled its neighbours are judged against the
/// last good sample rather than the spike itself. A value with no retained
/// predecessor (window start, or the head of a long gap) is kept
/// uncompared. This is what lets a single bad sample fall out of
/// [10, 11, 40, 12] without dragging the recovery sample down with it.

use super::FLAG_RANGE;

// ---------------------------------------------------------------------------
// Single pass
// ---------------------------------------------------------------------------

/// Nulls and flags every value whose absolute difference from the last
/// retained value exceeds `step_size`.
pub fn static_range_test(values: &[Option<f64>], step_size: f64) -> (Vec<Option<f64>>, Vec<u8>) {
    let mut corrected = values.to_vec();
    let mut flags = vec![0u8; values.len()];

    let mut last_retained: Option<f64> = None;
    for i in 0..corrected.len() {
        let Some(v) = corrected[i] else { continue };
        match last_retained {
            Some(prev) if (v - prev).abs() > step_size => {
                corrected[i] = None;
                flags[i] = FLAG_RANGE;
            }
            _ => last_retained = Some(v),
        }
    }

    (corrected, flags)
}

// ---------------------------------------------------------------------------
// Multi-pass variant
// ---------------------------------------------------------------------------

/// Runs the static range test repeatedly with a descending list of step
/// sizes, feeding each pass's corrected output into the next. Wide spikes
/// that survive a coarse step get shaved off by the finer ones. A row
/// flagged by any pass stays flagged.
pub fn static_range_multi(values: &[Option<f64>], step_sizes: &[f64]) -> (Vec<Option<f64>>, Vec<u8>) {
    let mut corrected = values.to_vec();
    let mut flags = vec![0u8; values.len()];

    for step in step_sizes {
        let (next, pass_flags) = static_range_test(&corrected, *step);
        corrected = next;
        for (f, pf) in flags.iter_mut().zip(pass_flags) {
            if pf != 0 {
                *f = pf;
            }
        }
    }

    (corrected, flags)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
