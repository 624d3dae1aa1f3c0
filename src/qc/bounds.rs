/// Threshold reset (code 2).
///
/// Absolute validity bounds: a reading outside the physically plausible
/// range for the sensor is an electronics artifact, not weather. Two
/// treatments exist. The general one nulls the value. The negative-to-zero
/// variant is for quantities that cannot be negative but where a small
/// negative excursion means "zero plus sensor noise" (tipping bucket drain
/// counts, a snow ranger reading just below its datum); those are clipped
/// to zero and flagged rather than thrown away.

use super::FLAG_BOUNDS;

// ---------------------------------------------------------------------------
// Bound reset
// ---------------------------------------------------------------------------

/// Nulls and flags every value outside the closed interval [min, max].
/// Either bound may be absent.
pub fn reset_range(
    values: &[Option<f64>],
    min: Option<f64>,
    max: Option<f64>,
) -> (Vec<Option<f64>>, Vec<u8>) {
    let mut corrected = values.to_vec();
    let mut flags = vec![0u8; values.len()];

    for i in 0..corrected.len() {
        let Some(v) = corrected[i] else { continue };
        let below = min.map(|m| v < m).unwrap_or(false);
        let above = max.map(|m| v > m).unwrap_or(false);
        if below || above {
            corrected[i] = None;
            flags[i] = FLAG_BOUNDS;
        }
    }

    (corrected, flags)
}

/// Clips negative values to zero and flags them. Nulls pass through.
pub fn neg_to_zero(values: &[Option<f64>]) -> (Vec<Option<f64>>, Vec<u8>) {
    let mut corrected = values.to_vec();
    let mut flags = vec![0u8; values.len()];

    for i in 0..corrected.len() {
        if let Some(v) = corrected[i] {
            if v < 0.0 {
                corrected[i] = Some(0.0);
                flags[i] = FLAG_BOUNDS;
            }
        }
    }

    (corrected, flags)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
