/// Integration tests for the full cleaning pipeline over synthetic series.
///
/// These tests verify:
/// 1. Raw rows -> grid -> cutoff -> water-year pipeline -> records, end to end
/// 2. The testable properties the engine guarantees: grid spacing, flag
///    consistency, dominant flag, idempotence
/// 3. Interactions between stages that unit tests cannot see (a spike
///    rejected by one stage and filled by another)
///
/// Everything here is deterministic and needs no database: the store is
/// exercised separately in store_integration.rs against a live instance.
///
/// Run with: cargo test --test pipeline_integration

use chrono::{Duration, NaiveDate, NaiveDateTime};

use wxqc_service::config::OverrideConfig;
use wxqc_service::cutoff::{processing_cutoff, truncate_at_cutoff};
use wxqc_service::grid::regularize;
use wxqc_service::model::{HourlySeries, QcRecord, VAR_AIR_TEMP, VAR_SNOW_DEPTH};
use wxqc_service::pipeline::{profile_for, run_variable};
use wxqc_service::store::tail_start_index;

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn dt(y: i32, mo: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

/// A believable October-to-cutoff air temperature series: a daily cycle
/// around a slowly cooling mean, hourly, no gaps.
fn autumn_temps(start: NaiveDateTime, hours: usize) -> Vec<(NaiveDateTime, Option<f64>)> {
    (0..hours)
        .map(|i| {
            let t = start + Duration::hours(i as i64);
            let day = i as f64 / 24.0;
            let diurnal = 4.0 * ((i % 24) as f64 / 24.0 * std::f64::consts::TAU).sin();
            (t, Some(8.0 - day * 0.05 + diurnal))
        })
        .collect()
}

fn to_series(records: &[QcRecord]) -> HourlySeries {
    HourlySeries {
        times: records.iter().map(|r| r.datetime).collect(),
        values: records.iter().map(|r| r.value).collect(),
    }
}

// ---------------------------------------------------------------------------
// End-to-end: raw rows through to records
// ---------------------------------------------------------------------------

#[test]
fn test_raw_rows_to_cleaned_records_end_to_end() {
    let start = dt(2023, 10, 1, 0);
    let mut raw = autumn_temps(start, 24 * 40);

    // Corrupt the series the way real telemetry does: a transmission hole,
    // a spike, and a duplicate retransmission.
    raw.remove(500);
    raw.remove(500);
    raw[400].1 = Some(49.0);
    raw.insert(901, (raw[900].0 + Duration::minutes(20), Some(-99.0)));

    let now = dt(2023, 11, 5, 9);
    let series = regularize(&raw, "apelake", VAR_AIR_TEMP).unwrap();

    // Grid invariant holds whatever the corruption was.
    for w in series.times.windows(2) {
        assert_eq!((w[1] - w[0]).num_hours(), 1);
    }

    let cutoff = processing_cutoff(now, None);
    let series = truncate_at_cutoff(series, cutoff, "apelake").unwrap();
    assert_eq!(*series.times.last().unwrap(), dt(2023, 10, 29, 9));

    let profile = profile_for(VAR_AIR_TEMP).unwrap();
    let records = run_variable(
        "apelake",
        profile,
        &series,
        &OverrideConfig::default(),
        &[],
        now,
    )
    .unwrap();

    // The spike was rejected by the range test and refilled by
    // interpolation, and the record says so.
    let spiked = records.iter().find(|r| r.datetime == raw[400].0).unwrap();
    assert!(spiked.value.is_some());
    assert!(
        spiked.value.unwrap() < 20.0,
        "interpolated replacement must resemble the neighbours, got {:?}",
        spiked.value
    );
    assert!(spiked.flags.contains('1'), "flags were '{}'", spiked.flags);
    assert!(spiked.flags.contains('8'), "flags were '{}'", spiked.flags);

    // The 2-hour transmission hole was interpolated and flagged 8 only.
    let hole = records.iter().find(|r| r.datetime == dt(2023, 10, 21, 20)).unwrap();
    assert_eq!(hole.flags, "8");
    assert!(hole.value.is_some());

    // The sub-hour duplicate retransmission was dropped at the grid, so
    // its -99 never even reached the tests.
    assert!(records.iter().all(|r| r.value != Some(-99.0)));
}

// ---------------------------------------------------------------------------
// Property: flag consistency
// ---------------------------------------------------------------------------

#[test]
fn test_null_value_implies_flag_and_vice_versa() {
    // Build a series with every kind of trouble, then check row by row:
    // a null cleaned value must carry a flag, and a flagged row is either
    // null or was filled (8) / clipped (2) / zeroed (6).
    let start = dt(2023, 10, 1, 0);
    let mut raw = autumn_temps(start, 24 * 60);
    raw[240].1 = Some(49.0); // spike
    for item in raw.iter_mut().skip(300).take(10) {
        item.1 = None; // long gap, stays null, no flag
    }
    raw[400].1 = Some(0.0); // false zero among ~8 degree readings
    for item in raw.iter_mut().skip(500).take(4) {
        item.1 = Some(5.55); // stuck sensor
    }

    let now = dt(2023, 12, 7, 0);
    let series = regularize(&raw, "tetrahedron", VAR_AIR_TEMP).unwrap();
    let profile = profile_for(VAR_AIR_TEMP).unwrap();
    let records = run_variable(
        "tetrahedron",
        profile,
        &series,
        &OverrideConfig::default(),
        &[],
        now,
    )
    .unwrap();

    for rec in &records {
        if rec.value.is_none() {
            assert!(
                !rec.flags.is_empty() || raw_was_null_gap(&raw, rec.datetime),
                "null row {} must be flagged unless it was an uninterpolatable gap",
                rec.datetime
            );
        }
        if rec.flags.is_empty() {
            // An untouched row keeps a value whenever the raw row had one.
            let raw_val = raw.iter().find(|(t, _)| *t == rec.datetime).map(|(_, v)| *v);
            if let Some(Some(_)) = raw_val {
                assert!(rec.value.is_some(), "unflagged row {} lost its value", rec.datetime);
            }
        }
    }

    // The specific plants landed as expected. Both rejected rows sit in
    // gaps short enough for interpolation to refill, so they carry values
    // again; the stuck row records both the rejection and the fill, while
    // the false zero's fill marker is hidden by the dominant code 6.
    let stuck = records.iter().find(|r| r.datetime == raw[502].0).unwrap();
    assert_eq!(stuck.flags, "3,8");
    assert!(stuck.value.is_some());
    let false_zero = records.iter().find(|r| r.datetime == raw[400].0).unwrap();
    assert_eq!(false_zero.flags, "6");
    assert!(false_zero.value.is_some(), "a 1-hour hole is refilled even after a code-6 rejection");
}

fn raw_was_null_gap(raw: &[(NaiveDateTime, Option<f64>)], t: NaiveDateTime) -> bool {
    raw.iter().any(|(rt, v)| *rt == t && v.is_none())
}

// ---------------------------------------------------------------------------
// Property: idempotence
// ---------------------------------------------------------------------------

#[test]
fn test_pipeline_is_idempotent_on_its_own_output() {
    let start = dt(2023, 10, 1, 0);
    let mut raw = autumn_temps(start, 24 * 50);
    raw[333].1 = Some(49.0);
    for item in raw.iter_mut().skip(600).take(2) {
        item.1 = None;
    }

    let now = dt(2023, 11, 27, 0);
    let profile = profile_for(VAR_AIR_TEMP).unwrap();
    let series = regularize(&raw, "perseverance", VAR_AIR_TEMP).unwrap();
    let first = run_variable(
        "perseverance",
        profile,
        &series,
        &OverrideConfig::default(),
        &[],
        now,
    )
    .unwrap();

    let second = run_variable(
        "perseverance",
        profile,
        &to_series(&first),
        &OverrideConfig::default(),
        &[],
        now,
    )
    .unwrap();

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.datetime, b.datetime);
        assert_eq!(a.value, b.value, "value drifted on rerun at {}", a.datetime);
        // A rerun sees already-corrected data, so it may not find new
        // problems; rows it flags must be ones the first run already
        // corrected by filling (the fill is clean data now).
        if !b.flags.is_empty() {
            assert!(
                b.flags == "8" && a.flags.contains('8') || a.flags == b.flags,
                "rerun invented a new rejection at {}: '{}' vs '{}'",
                a.datetime,
                a.flags,
                b.flags
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Dominant flag through a real snow season
// ---------------------------------------------------------------------------

#[test]
fn test_snow_season_summer_window_is_forced_to_zero() {
    let start = dt(2022, 10, 1, 0);
    let hours = 24 * 365;
    let raw: Vec<(NaiveDateTime, Option<f64>)> = (0..hours)
        .map(|i| {
            let t = start + Duration::hours(i as i64);
            let day = i as f64 / 24.0;
            // Accumulate to ~250 cm by March, melt out by mid June.
            let depth = if day < 160.0 {
                day * 1.5
            } else {
                (250.0 - (day - 160.0) * 2.8).max(0.0)
            };
            (t, Some(depth))
        })
        .collect();

    let now = dt(2023, 10, 3, 0);
    let profile = profile_for(VAR_SNOW_DEPTH).unwrap();
    let series = regularize(&raw, "apelake", VAR_SNOW_DEPTH).unwrap();
    let records = run_variable(
        "apelake",
        profile,
        &series,
        &OverrideConfig::default(),
        &[],
        now,
    )
    .unwrap();

    // Every row from Jul 1 to Sep 23 is zero with the dominant flag.
    let summer: Vec<_> = records
        .iter()
        .filter(|r| r.datetime >= dt(2023, 7, 1, 0) && r.datetime <= dt(2023, 9, 23, 0))
        .collect();
    assert!(!summer.is_empty());
    for rec in summer {
        assert_eq!(rec.value, Some(0.0), "summer row {} must be zeroed", rec.datetime);
        assert_eq!(rec.flags, "6", "summer row {} must carry only code 6", rec.datetime);
    }

    // Mid-winter accumulation is untouched.
    let winter = records.iter().find(|r| r.datetime == dt(2023, 1, 15, 12)).unwrap();
    assert!(winter.value.unwrap() > 100.0);
    assert!(winter.flags.is_empty());
}

// ---------------------------------------------------------------------------
// Tail computation against persisted state
// ---------------------------------------------------------------------------

#[test]
fn test_tail_slice_only_covers_new_rows() {
    let start = dt(2023, 10, 1, 0);
    let raw = autumn_temps(start, 24 * 30);
    let now = dt(2023, 11, 7, 0);
    let profile = profile_for(VAR_AIR_TEMP).unwrap();
    let series = regularize(&raw, "apelake", VAR_AIR_TEMP).unwrap();
    let records = run_variable(
        "apelake",
        profile,
        &series,
        &OverrideConfig::default(),
        &[],
        now,
    )
    .unwrap();

    // Simulate a previous run having persisted the first 200 hours.
    let persisted: Vec<(NaiveDateTime, Option<f64>)> = records[..200]
        .iter()
        .map(|r| (r.datetime, r.value))
        .collect();

    let tail_start = tail_start_index(&persisted, &records);
    assert_eq!(tail_start, 200, "exactly the unpersisted suffix is written");
    assert_eq!(records[tail_start].datetime, persisted.last().unwrap().0 + Duration::hours(1));
}
