/// Gap-limited linear interpolation (code 8).
///
/// The last stage in every profile, and it must be: it fills whatever
/// holes remain after the rejection passes, so running it earlier would
/// paper over spikes the other tests had yet to remove. Only short gaps
/// are filled. A null run longer than `max_hours` stays null and carries
/// no code 8, which is how downstream consumers distinguish "interpolated"
/// from "left as gap": filled rows are flagged 8 even though they hold a
/// value.
///
/// Runs touching the window edge have no anchor on one side and are never
/// filled.

use super::FLAG_INTERPOLATED;

// ---------------------------------------------------------------------------
// Interpolation
// ---------------------------------------------------------------------------

/// Linearly fills null runs of length <= `max_hours` that are bounded by
/// non-null values on both sides, flagging every filled row.
pub fn interpolate_gaps(values: &[Option<f64>], max_hours: usize) -> (Vec<Option<f64>>, Vec<u8>) {
    let mut corrected = values.to_vec();
    let mut flags = vec![0u8; values.len()];

    let mut i = 0;
    while i < values.len() {
        if values[i].is_some() {
            i += 1;
            continue;
        }
        let run_start = i;
        let mut run_end = i;
        while run_end + 1 < values.len() && values[run_end + 1].is_none() {
            run_end += 1;
        }
        let run_len = run_end - run_start + 1;

        let before = run_start.checked_sub(1).and_then(|j| values[j]);
        let after = values.get(run_end + 1).copied().flatten();

        if run_len <= max_hours {
            if let (Some(a), Some(b)) = (before, after) {
                let span = (run_len + 1) as f64;
                for (k, j) in (run_start..=run_end).enumerate() {
                    let frac = (k + 1) as f64 / span;
                    corrected[j] = Some(a + (b - a) * frac);
                    flags[j] = FLAG_INTERPOLATED;
                }
            }
        }
        i = run_end + 1;
    }

    (corrected, flags)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
