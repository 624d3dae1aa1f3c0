/// Processing-cutoff resolution.
///
/// Each run cleans data only up to a cutoff: by default "now minus 7 days"
/// floored to the hour, which leaves the most recent week untouched so
/// late-arriving retransmissions can still land in the clean table before
/// being judged. Stations with a known permanent offline date use that
/// fixed timestamp instead.
///
/// # Clock injection
/// All functions accept a `now: NaiveDateTime` parameter rather than calling
/// the clock internally. The binary reads wall time exactly once per run and
/// threads it through, keeping every stage deterministic and testable.

use chrono::{Duration, NaiveDateTime, Timelike};

use crate::model::{HourlySeries, QcError};

/// Days held back from processing by default.
const HOLDBACK_DAYS: i64 = 7;

// ---------------------------------------------------------------------------
// Cutoff resolution
// ---------------------------------------------------------------------------

/// The upper processing bound for one station: its permanent offline date
/// if it has one, otherwise `now` minus the holdback week, floored to the
/// hour so it can match a grid row exactly.
pub fn processing_cutoff(now: NaiveDateTime, offline: Option<NaiveDateTime>) -> NaiveDateTime {
    match offline {
        Some(fixed) => fixed,
        None => {
            let held = now - Duration::days(HOLDBACK_DAYS);
            held - Duration::minutes(held.minute() as i64)
                - Duration::seconds(held.second() as i64)
                - Duration::nanoseconds(held.nanosecond() as i64)
        }
    }
}

/// Truncates a regularized series at the cutoff row, inclusive.
///
/// The cutoff must be present in the grid. Because the grid is dense
/// between its first and last row, an absent cutoff means the station's
/// last transmission predates the cutoff, i.e. it stopped transmitting
/// since the previous run. That is `CutoffNotFound`: the station is
/// skipped for this run and no persisted state advances.
pub fn truncate_at_cutoff(
    series: HourlySeries,
    cutoff: NaiveDateTime,
    station: &str,
) -> Result<HourlySeries, QcError> {
    let idx = series
        .times
        .iter()
        .position(|t| *t == cutoff)
        .ok_or_else(|| QcError::CutoffNotFound {
            station: station.to_string(),
            cutoff,
        })?;

    let HourlySeries { mut times, mut values } = series;
    times.truncate(idx + 1);
    values.truncate(idx + 1);
    Ok(HourlySeries { times, values })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
