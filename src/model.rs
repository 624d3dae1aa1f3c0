/// Core data types for the weather station QA/QC service.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no I/O and no external dependencies beyond chrono, only types
/// and the crate-wide error enum.

use chrono::NaiveDateTime;

// ---------------------------------------------------------------------------
// Variable names
// ---------------------------------------------------------------------------

/// Air temperature in degrees Celsius.
pub const VAR_AIR_TEMP: &str = "Air_Temp";

/// Snow depth in centimetres, from an ultrasonic ranger.
pub const VAR_SNOW_DEPTH: &str = "Snow_Depth";

/// Hourly precipitation increment in millimetres, from a tipping bucket.
pub const VAR_PRECIP_INCREMENT: &str = "PP_Tipper";

/// Cumulative precipitation in millimetres, derived from the cleaned
/// hourly increments. Never QC'd independently.
pub const VAR_PRECIP_CUMULATIVE: &str = "PC_Tipper";

// ---------------------------------------------------------------------------
// Series types
// ---------------------------------------------------------------------------

/// An hourly time series on a strict 1-hour grid.
///
/// Produced by `grid::regularize`. Invariant: `times` strictly increases by
/// exactly one hour between adjacent rows; gaps in the data are represented
/// as `None` in `values`, never as missing rows. The two vectors always have
/// the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlySeries {
    pub times: Vec<NaiveDateTime>,
    pub values: Vec<Option<f64>>,
}

impl HourlySeries {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// True when every reading in the series is null.
    pub fn all_null(&self) -> bool {
        self.values.iter().all(|v| v.is_none())
    }
}

/// One cleaned row, the unit persisted downstream: timestamp, corrected
/// value (null when rejected and not interpolated), and the merged flag
/// string of comma-separated test codes, empty when no test touched
/// the row.
#[derive(Debug, Clone, PartialEq)]
pub struct QcRecord {
    pub datetime: NaiveDateTime,
    pub value: Option<f64>,
    pub flags: String,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise while cleaning one (station, variable) pair.
///
/// Per-station failures are isolated at the batch boundary: none of these
/// abort the run, they only skip the pair that raised them.
#[derive(Debug, PartialEq)]
pub enum QcError {
    /// The clean table returned zero rows for this variable.
    EmptySeries { station: String, variable: String },
    /// Rows exist but every reading is null, so there is nothing to clean.
    NoData { station: String, variable: String },
    /// The processing-cutoff timestamp is absent from the regularized grid,
    /// meaning the station stopped transmitting since the last run.
    CutoffNotFound {
        station: String,
        cutoff: NaiveDateTime,
    },
    /// The station does not declare this variable in the network registry.
    ConfigurationMissing { station: String, variable: String },
    /// The SQL store rejected a read or write.
    Store(String),
    /// The override table or zeroing-date CSV could not be loaded.
    Config(String),
}

impl std::fmt::Display for QcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QcError::EmptySeries { station, variable } => {
                write!(f, "empty series for {}/{}", station, variable)
            }
            QcError::NoData { station, variable } => {
                write!(f, "no data (all null) for {}/{}", station, variable)
            }
            QcError::CutoffNotFound { station, cutoff } => {
                write!(
                    f,
                    "cutoff {} not found in grid for {}: station stopped transmitting",
                    cutoff, station
                )
            }
            QcError::ConfigurationMissing { station, variable } => {
                write!(f, "{} does not declare variable {}", station, variable)
            }
            QcError::Store(msg) => write!(f, "store error: {}", msg),
            QcError::Config(msg) => write!(f, "config error: {}", msg),
        }
    }
}

impl std::error::Error for QcError {}

impl From<postgres::Error> for QcError {
    fn from(err: postgres::Error) -> Self {
        QcError::Store(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_all_null_detects_mixed_series() {
        let t0 = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let series = HourlySeries {
            times: vec![t0, t0 + chrono::Duration::hours(1)],
            values: vec![None, Some(1.0)],
        };
        assert!(!series.all_null());

        let nulls = HourlySeries {
            times: series.times.clone(),
            values: vec![None, None],
        };
        assert!(nulls.all_null());
    }

    #[test]
    fn test_error_display_names_station_and_variable() {
        let err = QcError::NoData {
            station: "apelake".to_string(),
            variable: VAR_SNOW_DEPTH.to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("apelake"), "message should name the station: {}", msg);
        assert!(msg.contains("Snow_Depth"), "message should name the variable: {}", msg);
    }
}
