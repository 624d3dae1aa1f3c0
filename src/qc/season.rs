/// Domain-specific zero corrections (code 6).
///
/// Two unrelated sensors share one failure value, zero, and each gets its
/// own treatment here.
///
/// Air temperature: a thermistor dropout reports exactly 0.0 °C, which is
/// also a perfectly good spring reading. A zero is kept only when both
/// neighbours vouch for it by sitting inside a small band around zero;
/// otherwise it is a dropout artifact and is nulled.
///
/// Snow depth: once the pack has melted out, the ultrasonic ranger reports
/// grass, rocks and wildlife instead of snow. Every reading inside the
/// summer window is forcibly zeroed and flagged. Whether summer has
/// started at all is a per-station, per-year determination made by
/// `summer_status`, an explicit three-outcome decision so it can be
/// tested apart from the zeroing itself.

use chrono::{NaiveDate, NaiveDateTime};

use super::FLAG_DOMAIN_ZERO;
use crate::config::SummerZeroDate;

// ---------------------------------------------------------------------------
// Summer determination
// ---------------------------------------------------------------------------

/// Outcome of the per-station, per-year summer determination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummerStatus {
    /// The nominal summer date (Jul 1 of the closing year) is present in
    /// the series index: the water year has reached summer.
    Arrived,
    /// The operator recorded a zeroing date for this station and year in
    /// the CSV because the automatic melt-out detection fails there.
    ForcedByOverride,
    /// Neither: the water year has not reached summer, and the zeroing
    /// pass must not run.
    NotYet,
}

/// Decides whether summer has started for water year `end_year` (the
/// closing-year label) at `station`.
pub fn summer_status(
    times: &[NaiveDateTime],
    station: &str,
    end_year: i32,
    overrides: &[SummerZeroDate],
) -> SummerStatus {
    let nominal = NaiveDate::from_ymd_opt(end_year, 7, 1).and_then(|d| d.and_hms_opt(0, 0, 0));
    if let Some(nominal) = nominal {
        if times.contains(&nominal) {
            return SummerStatus::Arrived;
        }
    }
    if overrides
        .iter()
        .any(|o| o.station == station && o.year == end_year)
    {
        return SummerStatus::ForcedByOverride;
    }
    SummerStatus::NotYet
}

// ---------------------------------------------------------------------------
// Snow depth: forced summer zeroing
// ---------------------------------------------------------------------------

/// Forcibly zeroes and flags every snow depth reading inside the summer
/// window.
///
/// `summer` is the inclusive index range of the summer window within
/// `values`. Once the determination says summer has started, nothing the
/// ranger reports in that window is snow, so the whole window is zeroed,
/// nulls included: the ground is bare regardless of whether the ranger
/// was transmitting. With `NotYet` the pass is a no-op.
pub fn summer_zeroing(
    values: &[Option<f64>],
    summer: (usize, usize),
    status: SummerStatus,
) -> (Vec<Option<f64>>, Vec<u8>) {
    let mut corrected = values.to_vec();
    let mut flags = vec![0u8; values.len()];
    if status == SummerStatus::NotYet {
        return (corrected, flags);
    }

    let (start, end) = summer;
    let end = end.min(values.len().saturating_sub(1));
    if start > end {
        return (corrected, flags);
    }

    for i in start..=end {
        corrected[i] = Some(0.0);
        flags[i] = FLAG_DOMAIN_ZERO;
    }

    (corrected, flags)
}

// ---------------------------------------------------------------------------
// Air temperature: false zero removal
// ---------------------------------------------------------------------------

/// Nulls and flags readings of exactly 0.0 unless both neighbours exist,
/// are non-null, and sit within `tolerance` of zero. A genuine
/// zero-crossing is always bracketed by small values; a dropout zero in a
/// midsummer series is bracketed by double digits.
pub fn false_zero_removal(values: &[Option<f64>], tolerance: f64) -> (Vec<Option<f64>>, Vec<u8>) {
    let mut corrected = values.to_vec();
    let mut flags = vec![0u8; values.len()];

    for i in 0..values.len() {
        if values[i] != Some(0.0) {
            continue;
        }
        let prev = i.checked_sub(1).and_then(|j| values[j]);
        let next = values.get(i + 1).copied().flatten();
        let bounded = match (prev, next) {
            (Some(p), Some(n)) => p.abs() <= tolerance && n.abs() <= tolerance,
            _ => false,
        };
        if !bounded {
            corrected[i] = None;
            flags[i] = FLAG_DOMAIN_ZERO;
        }
    }

    (corrected, flags)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
