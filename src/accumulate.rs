/// Derived cumulative precipitation.
///
/// The cumulative gauge column is not cleaned in its own right: its raw
/// history is sporadic and any fault in it traces back to the hourly
/// increments it was summed from. It is cheaper and more defensible to
/// recompute it outright from the already-cleaned increment series, so
/// this pass reads the qaqc table, never the clean one.
///
/// The running total restarts at zero each water year. Null increments
/// contribute nothing but do not break the total: the cumulative output
/// is dense. Every derived row carries the placeholder flag "0", marking
/// it as computed rather than independently tested.

use chrono::NaiveDateTime;

use crate::config::OverrideConfig;
use crate::cutoff::{processing_cutoff, truncate_at_cutoff};
use crate::grid::regularize;
use crate::model::{
    HourlySeries, QcError, QcRecord, VAR_PRECIP_CUMULATIVE, VAR_PRECIP_INCREMENT,
};
use crate::qc::FLAG_DERIVED;
use crate::stations::Station;
use crate::store::Store;
use crate::water_year::{candidate_years, segment};
use crate::{logging, store};

/// Decimal places kept in the running total.
const ROUND_DECIMALS: i32 = 2;

// ---------------------------------------------------------------------------
// Accumulation
// ---------------------------------------------------------------------------

/// Running sum of one water-year window of cleaned increments, rounded to
/// two decimals, nulls contributing zero.
pub fn accumulate_window(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let scale = 10f64.powi(ROUND_DECIMALS);
    let mut total = 0.0;
    values
        .iter()
        .map(|v| {
            total += v.unwrap_or(0.0);
            Some((total * scale).round() / scale)
        })
        .collect()
}

/// Derives the cumulative records for every water year of a cleaned
/// increment series.
pub fn derive_cumulative(
    station: &str,
    series: &HourlySeries,
    overrides: &OverrideConfig,
    now: NaiveDateTime,
) -> Result<Vec<QcRecord>, QcError> {
    if series.all_null() {
        return Err(QcError::NoData {
            station: station.to_string(),
            variable: VAR_PRECIP_CUMULATIVE.to_string(),
        });
    }

    let suppressed = overrides.suppressed_years(station, VAR_PRECIP_CUMULATIVE);
    let mut records = Vec::new();
    for year in candidate_years(series.times[0], now) {
        if suppressed.contains(&(year + 1)) {
            continue;
        }
        let Some((start, end)) = segment(series, year) else {
            continue;
        };
        let cumulative = accumulate_window(&series.values[start..=end]);
        records.extend(
            series.times[start..=end]
                .iter()
                .zip(cumulative)
                .map(|(t, value)| QcRecord {
                    datetime: *t,
                    value,
                    flags: FLAG_DERIVED.to_string(),
                }),
        );
    }

    if records.is_empty() {
        return Err(QcError::NoData {
            station: station.to_string(),
            variable: VAR_PRECIP_CUMULATIVE.to_string(),
        });
    }
    Ok(records)
}

// ---------------------------------------------------------------------------
// Station driver
// ---------------------------------------------------------------------------

/// Recomputes one station's cumulative column end to end: fetch the
/// cleaned increments from the qaqc table, regularize, truncate at the
/// cutoff, derive, and upsert the tail. Returns rows written.
pub fn recalculate_cumulative(
    db: &mut Store,
    station: &Station,
    overrides: &OverrideConfig,
    now: NaiveDateTime,
    dry_run: bool,
) -> Result<usize, QcError> {
    if !station.variables.contains(&VAR_PRECIP_CUMULATIVE)
        || !station.variables.contains(&VAR_PRECIP_INCREMENT)
    {
        return Err(QcError::ConfigurationMissing {
            station: station.name.to_string(),
            variable: VAR_PRECIP_CUMULATIVE.to_string(),
        });
    }

    let cleaned = db.fetch_series("qaqc", station.name, VAR_PRECIP_INCREMENT)?;
    let series = regularize(&cleaned, station.name, VAR_PRECIP_INCREMENT)?;
    let cutoff = processing_cutoff(now, overrides.offline_cutoff(station.name));
    let series = truncate_at_cutoff(series, cutoff, station.name)?;

    let records = derive_cumulative(station.name, &series, overrides, now)?;

    let persisted = db.fetch_series("qaqc", station.name, VAR_PRECIP_CUMULATIVE)?;
    let tail_start = store::tail_start_index(&persisted, &records);
    let tail = &records[tail_start..];
    logging::info(
        logging::DataSource::Engine,
        Some(station.name),
        &format!(
            "{}: {} derived rows, {} new since last persisted value",
            VAR_PRECIP_CUMULATIVE,
            records.len(),
            tail.len()
        ),
    );

    if dry_run || tail.is_empty() {
        return Ok(0);
    }
    db.upsert_records(station.name, VAR_PRECIP_CUMULATIVE, tail)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn dt(y: i32, mo: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_nulls_contribute_zero_to_the_total() {
        let cumulative = accumulate_window(&[Some(0.0), Some(1.5), None, Some(2.0)]);
        assert_eq!(
            cumulative,
            vec![Some(0.0), Some(1.5), Some(1.5), Some(3.5)],
            "a null hour holds the total steady"
        );
    }

    #[test]
    fn test_totals_round_to_two_decimals() {
        let cumulative = accumulate_window(&[Some(0.1), Some(0.2), Some(0.2)]);
        assert_eq!(cumulative, vec![Some(0.1), Some(0.3), Some(0.5)]);
    }

    #[test]
    fn test_total_restarts_each_water_year() {
        // Two water years of steady 1 mm/h: the total must reset to 1.0
        // on Oct 1 of the second year, not keep climbing.
        let start = dt(2021, 10, 1, 0);
        let n = 24 * 365 * 2;
        let series = HourlySeries {
            times: (0..n).map(|i| start + Duration::hours(i as i64)).collect(),
            values: vec![Some(1.0); n],
        };
        let records = derive_cumulative(
            "apelake",
            &series,
            &OverrideConfig::default(),
            dt(2023, 9, 20, 0),
        )
        .unwrap();

        let boundary = records
            .iter()
            .find(|r| r.datetime == dt(2022, 10, 1, 0))
            .expect("second water year's first row");
        assert_eq!(boundary.value, Some(1.0));

        let before = records
            .iter()
            .find(|r| r.datetime == dt(2022, 9, 30, 23))
            .unwrap();
        assert!(before.value.unwrap() > 8000.0, "first year accumulated a full total");
    }

    #[test]
    fn test_every_derived_row_is_flagged_zero() {
        let start = dt(2023, 10, 1, 0);
        let series = HourlySeries {
            times: (0..100).map(|i| start + Duration::hours(i as i64)).collect(),
            values: vec![Some(0.2); 100],
        };
        let records =
            derive_cumulative("apelake", &series, &OverrideConfig::default(), dt(2023, 10, 10, 0))
                .unwrap();
        assert!(records.iter().all(|r| r.flags == "0"));
        assert!(records.iter().all(|r| r.value.is_some()), "derived output is dense");
    }

    #[test]
    fn test_all_null_increments_is_no_data() {
        let start = dt(2023, 10, 1, 0);
        let series = HourlySeries {
            times: (0..50).map(|i| start + Duration::hours(i as i64)).collect(),
            values: vec![None; 50],
        };
        let err =
            derive_cumulative("apelake", &series, &OverrideConfig::default(), dt(2023, 10, 5, 0))
                .unwrap_err();
        assert!(matches!(err, QcError::NoData { .. }));
    }
}
