/// Hourly grid regularization.
///
/// Raw logger output is close to hourly but not trustworthy: some stations
/// transmit on an off-hour schedule (sub-hour jitter in the timestamp),
/// outages leave holes, and retransmissions occasionally duplicate an hour.
/// Everything downstream assumes a strict grid, so this module is the only
/// place allowed to touch row spacing. After `regularize`, consecutive
/// timestamps differ by exactly one hour and data gaps are null readings,
/// never missing rows.

use chrono::{Duration, NaiveDateTime, Timelike};

use crate::model::{HourlySeries, QcError};

// ---------------------------------------------------------------------------
// Regularization
// ---------------------------------------------------------------------------

/// Reindexes raw (timestamp, value) rows onto an exact 1-hour grid spanning
/// the first to the last observed hour.
///
/// Rows are floored to the hour first. When two floored rows land on the
/// same hour (raw timestamps less than one hour apart), the first-seen row
/// wins and the later duplicate is dropped. Hours with no surviving row are
/// inserted with a null reading.
///
/// Input rows must already be in ascending timestamp order, which the store
/// guarantees with ORDER BY.
///
/// Returns `EmptySeries` if the input has zero rows.
pub fn regularize(
    rows: &[(NaiveDateTime, Option<f64>)],
    station: &str,
    variable: &str,
) -> Result<HourlySeries, QcError> {
    if rows.is_empty() {
        return Err(QcError::EmptySeries {
            station: station.to_string(),
            variable: variable.to_string(),
        });
    }

    // Floor to the hour and drop sub-hour duplicates, keeping first-seen.
    let mut hours: Vec<(NaiveDateTime, Option<f64>)> = Vec::with_capacity(rows.len());
    for (t, v) in rows {
        let floored = floor_to_hour(*t);
        let duplicate = hours.last().map(|(prev, _)| *prev == floored).unwrap_or(false);
        if !duplicate {
            hours.push((floored, *v));
        }
    }

    let start = hours[0].0;
    let end = hours[hours.len() - 1].0;
    let n = ((end - start).num_hours() + 1) as usize;

    let mut times = Vec::with_capacity(n);
    let mut values = vec![None; n];
    for i in 0..n {
        times.push(start + Duration::hours(i as i64));
    }
    for (t, v) in &hours {
        let idx = (*t - start).num_hours() as usize;
        values[idx] = *v;
    }

    Ok(HourlySeries { times, values })
}

fn floor_to_hour(t: NaiveDateTime) -> NaiveDateTime {
    t - Duration::minutes(t.minute() as i64) - Duration::seconds(t.second() as i64)
        - Duration::nanoseconds(t.nanosecond() as i64)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
