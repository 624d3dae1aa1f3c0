/// Pipeline orchestration.
///
/// Drives the test stage library for one (station, variable, water year)
/// tuple: applies the manual adjustments from the override table, runs the
/// variable's configured stages in order, threading each stage's corrected
/// output into the next, and merges the per-stage flag vectors into one
/// flag string per row.
///
/// Stage order is not negotiable. The early tests remove gross corruption
/// so the statistical tests see a believable signal, and interpolation
/// runs last so it fills genuinely missing hours rather than masking
/// spikes a later test would have caught.

use chrono::{NaiveDate, NaiveDateTime};

use crate::config::{OverrideConfig, SummerZeroDate};
use crate::cutoff::{processing_cutoff, truncate_at_cutoff};
use crate::grid::regularize;
use crate::model::{
    HourlySeries, QcError, QcRecord, VAR_AIR_TEMP, VAR_PRECIP_INCREMENT, VAR_SNOW_DEPTH,
};
use crate::qc::season::{summer_status, summer_zeroing, SummerStatus};
use crate::qc::{bounds, duplicates, interpolate, merge_flags, range, rolling, season};
use crate::stations::Station;
use crate::store::Store;
use crate::water_year::{candidate_years, nearest, segment};
use crate::{logging, store};

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

/// How much history one run reprocesses for a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearScope {
    /// Only the most recent candidate water year. Keeps the weekly batch
    /// cheap for variables whose old years never change.
    LatestOnly,
    /// Every candidate water year. Snow depth needs this: a summer-zeroing
    /// determination can change retroactively once the CSV gains a row.
    AllYears,
}

/// One configured test stage with its parameters.
#[derive(Debug, Clone, Copy)]
pub enum Stage {
    StaticRange { step: f64 },
    StaticRangeMulti { steps: &'static [f64] },
    ResetRange { min: Option<f64>, max: Option<f64> },
    NegToZero,
    DuplicateRuns,
    DuplicateRunsWindow { window: usize, equal_to: f64 },
    RollingOutlier { window: usize, k: f64 },
    FalseZeroRemoval { tolerance: f64 },
    SummerZeroing,
    SlidingMeanThreshold { window: usize, threshold: f64 },
    InterpolateGaps { max_hours: usize },
}

/// The ordered stage sequence for one variable.
pub struct QcProfile {
    pub variable: &'static str,
    pub scope: YearScope,
    pub stages: &'static [Stage],
}

/// Hourly samples in a nominal month, the outlier-test window.
const MONTH_HOURS: usize = 720;

/// All engine profiles. A variable not listed here is never cleaned, no
/// matter what the registry declares for a station.
pub static PROFILES: &[QcProfile] = &[
    QcProfile {
        variable: VAR_AIR_TEMP,
        scope: YearScope::LatestOnly,
        stages: &[
            Stage::StaticRange { step: 10.0 },
            Stage::ResetRange { min: Some(-45.0), max: Some(50.0) },
            Stage::DuplicateRuns,
            Stage::RollingOutlier { window: MONTH_HOURS, k: 4.0 },
            Stage::FalseZeroRemoval { tolerance: 3.0 },
            Stage::SlidingMeanThreshold { window: 336, threshold: 25.0 },
            Stage::InterpolateGaps { max_hours: 3 },
        ],
    },
    QcProfile {
        variable: VAR_SNOW_DEPTH,
        scope: YearScope::AllYears,
        stages: &[
            Stage::StaticRange { step: 25.0 },
            Stage::NegToZero,
            Stage::DuplicateRuns,
            Stage::RollingOutlier { window: MONTH_HOURS, k: 4.0 },
            Stage::SummerZeroing,
            Stage::StaticRangeMulti { steps: &[20.0, 15.0, 10.0, 5.0] },
            Stage::InterpolateGaps { max_hours: 3 },
        ],
    },
    QcProfile {
        variable: VAR_PRECIP_INCREMENT,
        scope: YearScope::LatestOnly,
        stages: &[
            Stage::StaticRange { step: 30.0 },
            Stage::NegToZero,
            Stage::DuplicateRunsWindow { window: 1000, equal_to: 0.0 },
            Stage::InterpolateGaps { max_hours: 3 },
        ],
    },
];

/// Looks up the engine profile for a variable.
pub fn profile_for(variable: &str) -> Option<&'static QcProfile> {
    PROFILES.iter().find(|p| p.variable == variable)
}

// ---------------------------------------------------------------------------
// Stage dispatch
// ---------------------------------------------------------------------------

/// Per-window context the stages that look beyond raw values need.
struct WindowCtx<'a> {
    station: &'a str,
    /// Water-year end label of the window.
    end_year: i32,
    times: &'a [NaiveDateTime],
    summer_overrides: &'a [SummerZeroDate],
}

impl Stage {
    fn apply(&self, values: &[Option<f64>], ctx: &WindowCtx<'_>) -> (Vec<Option<f64>>, Vec<u8>) {
        match *self {
            Stage::StaticRange { step } => range::static_range_test(values, step),
            Stage::StaticRangeMulti { steps } => range::static_range_multi(values, steps),
            Stage::ResetRange { min, max } => bounds::reset_range(values, min, max),
            Stage::NegToZero => bounds::neg_to_zero(values),
            Stage::DuplicateRuns => duplicates::duplicate_runs(values),
            Stage::DuplicateRunsWindow { window, equal_to } => {
                duplicates::duplicate_runs_window(values, window, equal_to)
            }
            Stage::RollingOutlier { window, k } => rolling::rolling_outlier(values, window, k),
            Stage::FalseZeroRemoval { tolerance } => {
                season::false_zero_removal(values, tolerance)
            }
            Stage::SummerZeroing => {
                let status =
                    summer_status(ctx.times, ctx.station, ctx.end_year, ctx.summer_overrides);
                if status == SummerStatus::NotYet {
                    return (values.to_vec(), vec![0u8; values.len()]);
                }
                match summer_window(ctx.times, ctx.end_year) {
                    Some(window) => summer_zeroing(values, window, status),
                    None => (values.to_vec(), vec![0u8; values.len()]),
                }
            }
            Stage::SlidingMeanThreshold { window, threshold } => {
                rolling::sliding_mean_threshold(values, window, threshold)
            }
            Stage::InterpolateGaps { max_hours } => interpolate::interpolate_gaps(values, max_hours),
        }
    }
}

/// The inclusive index range of the summer period (Jul 1 through Sep 23 of
/// the closing year) within a window's timestamps, by nearest matching.
fn summer_window(times: &[NaiveDateTime], end_year: i32) -> Option<(usize, usize)> {
    let start_target = NaiveDate::from_ymd_opt(end_year, 7, 1)?.and_hms_opt(0, 0, 0)?;
    let end_target = NaiveDate::from_ymd_opt(end_year, 9, 23)?.and_hms_opt(0, 0, 0)?;
    let start = nearest(times, start_target)?;
    let end = nearest(times, end_target)?;
    if end < start { None } else { Some((start, end)) }
}

// ---------------------------------------------------------------------------
// Manual adjustments
// ---------------------------------------------------------------------------

/// Applies the override table's manual adjustments to a window before any
/// test runs. Offsets correct the value silently (the reading stays
/// trustworthy once shifted); suppressions and alternate thresholds reject
/// rows and flag them the way hand-rejected data has always been flagged,
/// codes 1 and 2 respectively.
fn apply_adjustments(
    times: &[NaiveDateTime],
    values: &mut [Option<f64>],
    adjustments: &[&crate::config::ManualAdjustment],
) -> Vec<u8> {
    let mut flags = vec![0u8; values.len()];
    for adj in adjustments {
        for i in 0..values.len() {
            if !adj.covers(times[i]) {
                continue;
            }
            if let Some(offset) = adj.offset {
                if let Some(v) = values[i].as_mut() {
                    *v += offset;
                }
            }
            if adj.suppress && values[i].is_some() {
                values[i] = None;
                flags[i] = crate::qc::FLAG_RANGE;
            }
            if let Some(cap) = adj.reset_above {
                if matches!(values[i], Some(v) if v > cap) {
                    values[i] = None;
                    flags[i] = crate::qc::FLAG_BOUNDS;
                }
            }
            if let Some(floor) = adj.reset_below {
                if matches!(values[i], Some(v) if v < floor) {
                    values[i] = None;
                    flags[i] = crate::qc::FLAG_BOUNDS;
                }
            }
        }
    }
    flags
}

// ---------------------------------------------------------------------------
// Window and variable runs
// ---------------------------------------------------------------------------

/// Runs the full stage sequence over one water-year window and returns its
/// cleaned records.
fn run_window(
    station: &str,
    profile: &QcProfile,
    series: &HourlySeries,
    window: (usize, usize),
    end_year: i32,
    overrides: &OverrideConfig,
    summer_overrides: &[SummerZeroDate],
) -> Vec<QcRecord> {
    let (start, end) = window;
    let times = &series.times[start..=end];
    let mut values: Vec<Option<f64>> = series.values[start..=end].to_vec();

    let adjustments = overrides.adjustments_for(station, profile.variable);
    let manual_flags = apply_adjustments(times, &mut values, &adjustments);

    let ctx = WindowCtx {
        station,
        end_year,
        times,
        summer_overrides,
    };

    let mut stage_flags: Vec<Vec<u8>> = vec![manual_flags];
    for stage in profile.stages {
        let (corrected, flags) = stage.apply(&values, &ctx);
        values = corrected;
        stage_flags.push(flags);
    }

    let merged = merge_flags(&stage_flags);
    times
        .iter()
        .zip(values)
        .zip(merged)
        .map(|((t, value), flags)| QcRecord {
            datetime: *t,
            value,
            flags,
        })
        .collect()
}

/// Cleans one variable of one station: segments the regularized series
/// into water years, runs the stage pipeline per year within the profile's
/// scope, and concatenates the per-year records.
///
/// Returns `NoData` when every reading is null, and never errors on an
/// individual window: a year that cannot be segmented (data ends before
/// it starts) is simply absent from the output.
pub fn run_variable(
    station: &str,
    profile: &QcProfile,
    series: &HourlySeries,
    overrides: &OverrideConfig,
    summer_overrides: &[SummerZeroDate],
    now: NaiveDateTime,
) -> Result<Vec<QcRecord>, QcError> {
    if series.all_null() {
        return Err(QcError::NoData {
            station: station.to_string(),
            variable: profile.variable.to_string(),
        });
    }

    let suppressed = overrides.suppressed_years(station, profile.variable);
    let years: Vec<i32> = candidate_years(series.times[0], now)
        .into_iter()
        .filter(|start_year| !suppressed.contains(&(start_year + 1)))
        .collect();

    let mut records = Vec::new();
    match profile.scope {
        YearScope::AllYears => {
            for year in years {
                let Some(window) = segment(series, year) else {
                    continue;
                };
                records.extend(run_window(
                    station,
                    profile,
                    series,
                    window,
                    year + 1,
                    overrides,
                    summer_overrides,
                ));
            }
        }
        YearScope::LatestOnly => {
            // The newest candidate may not have reached the cutoff yet
            // (first week of October): fall back year by year to the
            // most recent one that actually segments.
            for year in years.into_iter().rev() {
                let Some(window) = segment(series, year) else {
                    continue;
                };
                records = run_window(
                    station,
                    profile,
                    series,
                    window,
                    year + 1,
                    overrides,
                    summer_overrides,
                );
                break;
            }
        }
    }

    if records.is_empty() {
        return Err(QcError::NoData {
            station: station.to_string(),
            variable: profile.variable.to_string(),
        });
    }
    Ok(records)
}

// ---------------------------------------------------------------------------
// Station driver
// ---------------------------------------------------------------------------

/// Cleans one (station, variable) pair end to end against the store:
/// fetch, regularize, truncate at the cutoff, run the pipeline, and upsert
/// the tail slice. Returns the number of rows written (zero in dry-run
/// mode or when the tail is empty).
pub fn clean_station_variable(
    db: &mut Store,
    station: &Station,
    profile: &QcProfile,
    overrides: &OverrideConfig,
    summer_overrides: &[SummerZeroDate],
    now: NaiveDateTime,
    dry_run: bool,
) -> Result<usize, QcError> {
    if !station.variables.contains(&profile.variable) {
        return Err(QcError::ConfigurationMissing {
            station: station.name.to_string(),
            variable: profile.variable.to_string(),
        });
    }

    let raw = db.fetch_series("clean", station.name, profile.variable)?;
    let series = regularize(&raw, station.name, profile.variable)?;
    let cutoff = processing_cutoff(now, overrides.offline_cutoff(station.name));
    let series = truncate_at_cutoff(series, cutoff, station.name)?;

    let records = run_variable(
        station.name,
        profile,
        &series,
        overrides,
        summer_overrides,
        now,
    )?;

    let persisted = db.fetch_series("qaqc", station.name, profile.variable)?;
    let tail_start = store::tail_start_index(&persisted, &records);
    let tail = &records[tail_start..];
    logging::info(
        logging::DataSource::Engine,
        Some(station.name),
        &format!(
            "{}: {} cleaned rows, {} new since last persisted value",
            profile.variable,
            records.len(),
            tail.len()
        ),
    );

    if dry_run || tail.is_empty() {
        return Ok(0);
    }
    db.upsert_records(station.name, profile.variable, tail)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
