/// Duplicate-run suppression (code 3).
///
/// A sensor reporting bit-identical values hour after hour is stuck, not
/// steady: real signals carry noise in the last digit. A run of three or
/// more unchanged readings keeps its first sample (the sensor may have
/// frozen while still at a true value) and rejects the repeats.
///
/// The windowed variant targets a different failure, the tipping bucket
/// that silently clogs: it looks only for runs of one specific value (zero)
/// and only treats them as a fault once the run is implausibly long. Short
/// zero runs are ordinary dry weather and pass untouched. A faulted run is
/// rejected in full; there is no honest first sample in a clog.

use super::FLAG_DUPLICATE;

/// Minimum run length for the plain stuck-sensor test.
const MIN_RUN: usize = 3;

// ---------------------------------------------------------------------------
// Plain variant
// ---------------------------------------------------------------------------

/// Flags and nulls every repeat in a run of >= 3 identical consecutive
/// values, retaining the first occurrence.
pub fn duplicate_runs(values: &[Option<f64>]) -> (Vec<Option<f64>>, Vec<u8>) {
    let mut corrected = values.to_vec();
    let mut flags = vec![0u8; values.len()];

    let mut i = 0;
    while i < values.len() {
        let Some(v) = values[i] else {
            i += 1;
            continue;
        };
        let mut end = i + 1;
        while end < values.len() && values[end] == Some(v) {
            end += 1;
        }
        if end - i >= MIN_RUN {
            for j in (i + 1)..end {
                corrected[j] = None;
                flags[j] = FLAG_DUPLICATE;
            }
        }
        i = end;
    }

    (corrected, flags)
}

// ---------------------------------------------------------------------------
// Windowed variant
// ---------------------------------------------------------------------------

/// Flags and nulls entire runs of `equal_to` whose length reaches `window`
/// samples. Shorter runs of the value are legitimate and untouched.
pub fn duplicate_runs_window(
    values: &[Option<f64>],
    window: usize,
    equal_to: f64,
) -> (Vec<Option<f64>>, Vec<u8>) {
    let mut corrected = values.to_vec();
    let mut flags = vec![0u8; values.len()];

    let mut i = 0;
    while i < values.len() {
        if values[i] != Some(equal_to) {
            i += 1;
            continue;
        }
        let mut end = i + 1;
        while end < values.len() && values[end] == Some(equal_to) {
            end += 1;
        }
        if end - i >= window {
            for j in i..end {
                corrected[j] = None;
                flags[j] = FLAG_DUPLICATE;
            }
        }
        i = end;
    }

    (corrected, flags)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
