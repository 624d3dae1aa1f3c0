/// Water-year segmentation.
///
/// The hydrological accounting year runs Oct 1 through Sep 30 and is what
/// every QC window is keyed on; a calendar-year split would cut the snow
/// season in half. A water year is identified here by its START year: water
/// year 2022 covers Oct 1 2022 00:00 through Sep 30 2023 23:00. (The store's
/// `WatYr` column uses the opposite convention and labels rows by the END
/// year; `water_year_label` produces that value at write time.)
///
/// Window boundaries are resolved to the nearest actually-present timestamp
/// so a series that starts or ends mid-year still yields a usable window.

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::model::HourlySeries;

// ---------------------------------------------------------------------------
// Per-row helpers
// ---------------------------------------------------------------------------

/// The START year of the water year containing `t`: October onward belongs
/// to the water year beginning that calendar year, January through September
/// to the one that began the year before.
pub fn water_year_of(t: NaiveDateTime) -> i32 {
    if t.month() >= 10 {
        t.year()
    } else {
        t.year() - 1
    }
}

/// The store's `WatYr` column value for a row: the END year of its water
/// year (month >= October rolls forward).
pub fn water_year_label(t: NaiveDateTime) -> i32 {
    water_year_of(t) + 1
}

// ---------------------------------------------------------------------------
// Candidate years
// ---------------------------------------------------------------------------

/// The water years (by start year) that a run dated `now` should consider
/// for a series whose first row is `first`.
///
/// The range opens at the water year containing the first sample, so a
/// station commissioned in January still gets the in-progress year that
/// started the previous October. The in-progress water year is included
/// only from October through December of its start year; in January
/// through September the newest complete-enough year is the one that
/// started last fall, which the exclusive upper bound already covers.
pub fn candidate_years(first: NaiveDateTime, now: NaiveDateTime) -> Vec<i32> {
    let last = if now.month() >= 10 {
        now.year() + 1
    } else {
        now.year()
    };
    (water_year_of(first)..last).collect()
}

// ---------------------------------------------------------------------------
// Segmentation
// ---------------------------------------------------------------------------

/// Index of the timestamp in `times` nearest to `target` (minimum absolute
/// difference, earlier row on a tie). Returns `None` for an empty slice.
pub fn nearest(times: &[NaiveDateTime], target: NaiveDateTime) -> Option<usize> {
    let mut best: Option<(usize, i64)> = None;
    for (i, t) in times.iter().enumerate() {
        let diff = (*t - target).num_seconds().abs();
        match best {
            Some((_, d)) if d <= diff => {}
            _ => best = Some((i, diff)),
        }
    }
    best.map(|(i, _)| i)
}

/// The inclusive index range of `series` covering water year `year`
/// (nearest Oct 1 00:00 through nearest Sep 30 23:00). Returns `None` when
/// the series is empty or the resolved window is inverted, which happens
/// when the series ends before the water year begins.
///
/// The truncation case needs no special handling: for an in-progress year
/// the end target lies beyond the last row and `nearest` resolves it to
/// the final available timestamp.
pub fn segment(series: &HourlySeries, year: i32) -> Option<(usize, usize)> {
    let start_target = NaiveDate::from_ymd_opt(year, 10, 1)?.and_hms_opt(0, 0, 0)?;
    let end_target = NaiveDate::from_ymd_opt(year + 1, 9, 30)?.and_hms_opt(23, 0, 0)?;

    let start = nearest(&series.times, start_target)?;
    let end = nearest(&series.times, end_target)?;
    if end < start {
        return None;
    }
    // Degenerate resolutions: the series ends before this water year begins,
    // or starts after it ends. Both collapse onto a boundary row and must
    // not produce a window.
    if series.times[end] < start_target || series.times[start] > end_target {
        return None;
    }
    Some((start, end))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
