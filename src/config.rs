/// Declarative override configuration.
///
/// Everything here used to live as per-station conditionals inside the
/// cleaning scripts: eyeballed datum offsets, date windows of known-bad
/// data, water years too corrupted to clean, permanent offline dates, and
/// the snow-zeroing dates the automatic summer detection gets wrong. It is
/// all data, so it ships as data: a TOML override table plus one small CSV,
/// loaded once per batch run and passed to the orchestrator explicitly.
///
/// An entry the engine consumes but a station no longer needs is harmless;
/// an entry for an unknown station is ignored with a warning at load time
/// left to the caller (the registry is the authority on what exists).

use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::model::QcError;

// ---------------------------------------------------------------------------
// Override table
// ---------------------------------------------------------------------------

/// One manual, date-bounded adjustment for a (station, variable) pair.
///
/// Exactly what happens depends on which fields are set:
/// - `offset`: added to every reading in the range (sensor datum shift).
/// - `suppress`: readings in the range are nulled and flagged as manually
///   rejected (code 1, matching how hand-rejected ranges were always
///   flagged).
/// - `reset_above` / `reset_below`: readings beyond the alternate bound
///   are nulled and flagged with the threshold code (2).
///
/// Open-ended ranges omit `from` or `to`.
#[derive(Debug, Clone, Deserialize)]
pub struct ManualAdjustment {
    pub station: String,
    pub variable: String,
    pub from: Option<NaiveDateTime>,
    pub to: Option<NaiveDateTime>,
    pub offset: Option<f64>,
    #[serde(default)]
    pub suppress: bool,
    pub reset_above: Option<f64>,
    pub reset_below: Option<f64>,
}

impl ManualAdjustment {
    /// Whether this adjustment covers the given timestamp.
    pub fn covers(&self, t: NaiveDateTime) -> bool {
        self.from.map(|f| t >= f).unwrap_or(true) && self.to.map(|to| t <= to).unwrap_or(true)
    }
}

/// A water year (by end-year label) that is unrecoverable for a station
/// and must not be cleaned or written. Applies to one variable when set,
/// otherwise to every variable the station declares.
#[derive(Debug, Clone, Deserialize)]
pub struct SuppressedYear {
    pub station: String,
    pub variable: Option<String>,
    pub year: i32,
}

/// A station that permanently stopped transmitting. Its processing cutoff
/// is pinned to `last_valid` instead of the rolling holdback window.
#[derive(Debug, Clone, Deserialize)]
pub struct OfflineCutoff {
    pub station: String,
    pub last_valid: NaiveDateTime,
}

/// The full override table, deserialized from `overrides.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OverrideConfig {
    #[serde(default)]
    pub adjustment: Vec<ManualAdjustment>,
    #[serde(default)]
    pub suppressed_year: Vec<SuppressedYear>,
    #[serde(default)]
    pub offline: Vec<OfflineCutoff>,
}

impl OverrideConfig {
    /// Loads and parses the override table.
    pub fn load(path: &Path) -> Result<Self, QcError> {
        let text = fs::read_to_string(path)
            .map_err(|e| QcError::Config(format!("reading {}: {}", path.display(), e)))?;
        toml::from_str(&text)
            .map_err(|e| QcError::Config(format!("parsing {}: {}", path.display(), e)))
    }

    /// Adjustments applying to one (station, variable) pair, in file order.
    pub fn adjustments_for(&self, station: &str, variable: &str) -> Vec<&ManualAdjustment> {
        self.adjustment
            .iter()
            .filter(|a| a.station == station && a.variable == variable)
            .collect()
    }

    /// Water-year end labels suppressed for one (station, variable) pair.
    pub fn suppressed_years(&self, station: &str, variable: &str) -> Vec<i32> {
        self.suppressed_year
            .iter()
            .filter(|s| {
                s.station == station
                    && s.variable.as_deref().map(|v| v == variable).unwrap_or(true)
            })
            .map(|s| s.year)
            .collect()
    }

    /// Fixed offline cutoff for a station, if it has one.
    pub fn offline_cutoff(&self, station: &str) -> Option<NaiveDateTime> {
        self.offline
            .iter()
            .find(|o| o.station == station)
            .map(|o| o.last_valid)
    }
}

// ---------------------------------------------------------------------------
// Snow-zeroing date CSV
// ---------------------------------------------------------------------------

/// One station/water-year pair whose summer start the automatic detection
/// cannot find, with the operator-chosen zero date. Only the year component
/// of the date participates in the summer decision; the date itself is kept
/// for the operator's records.
#[derive(Debug, Clone, PartialEq)]
pub struct SummerZeroDate {
    pub station: String,
    /// Water-year end label the override applies to.
    pub year: i32,
}

/// Parses the zeroing-date CSV: a `station,zero_date` header followed by
/// one row per override, dates in `YYYY-MM-DD` form. Blank lines are
/// skipped; a malformed row is an error rather than a silent drop, since a
/// dropped override would silently leave a summer of bogus snow depth in
/// the output.
pub fn parse_zeroing_csv(text: &str) -> Result<Vec<SummerZeroDate>, QcError> {
    let mut out = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if i == 0 || line.trim().is_empty() {
            continue; // Skip header or empty lines
        }
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != 2 {
            return Err(QcError::Config(format!(
                "zeroing CSV line {}: expected 2 fields, got {}",
                i + 1,
                fields.len()
            )));
        }
        let station = fields[0].trim().to_string();
        let date = fields[1].trim();
        let year: i32 = date
            .split('-')
            .next()
            .and_then(|y| y.parse().ok())
            .ok_or_else(|| {
                QcError::Config(format!("zeroing CSV line {}: bad date '{}'", i + 1, date))
            })?;
        out.push(SummerZeroDate { station, year });
    }
    Ok(out)
}

/// Loads and parses the zeroing-date CSV.
pub fn load_zeroing_dates(path: &Path) -> Result<Vec<SummerZeroDate>, QcError> {
    let text = fs::read_to_string(path)
        .map_err(|e| QcError::Config(format!("reading {}: {}", path.display(), e)))?;
    parse_zeroing_csv(&text)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(y: i32, mo: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_override_table_parses_all_sections() {
        let text = r#"
            [[adjustment]]
            station = "klinaklini"
            variable = "Snow_Depth"
            to = "2021-09-30T23:00:00"
            offset = 25.0

            [[adjustment]]
            station = "steph6"
            variable = "Snow_Depth"
            from = "2018-10-08T18:00:00"
            to = "2018-10-16T15:00:00"
            suppress = true

            [[suppressed_year]]
            station = "mountcayley"
            variable = "Snow_Depth"
            year = 2022

            [[offline]]
            station = "machmell"
            last_valid = "2023-02-12T11:00:00"
        "#;
        let config: OverrideConfig = toml::from_str(text).expect("table should parse");
        assert_eq!(config.adjustment.len(), 2);
        assert_eq!(config.suppressed_year.len(), 1);
        assert_eq!(config.offline_cutoff("machmell"), Some(dt(2023, 2, 12, 11)));
        assert_eq!(config.offline_cutoff("apelake"), None);
    }

    #[test]
    fn test_adjustment_range_cover() {
        let text = r#"
            [[adjustment]]
            station = "klinaklini"
            variable = "Snow_Depth"
            to = "2021-09-30T23:00:00"
            offset = 25.0
        "#;
        let config: OverrideConfig = toml::from_str(text).unwrap();
        let adj = &config.adjustment[0];
        assert!(adj.covers(dt(2019, 1, 1, 0)), "open-ended start covers early rows");
        assert!(adj.covers(dt(2021, 9, 30, 23)), "range end is inclusive");
        assert!(!adj.covers(dt(2021, 10, 1, 0)));
    }

    #[test]
    fn test_adjustments_for_filters_by_station_and_variable() {
        let text = r#"
            [[adjustment]]
            station = "apelake"
            variable = "Snow_Depth"
            offset = -10.65

            [[adjustment]]
            station = "apelake"
            variable = "Air_Temp"
            suppress = true
        "#;
        let config: OverrideConfig = toml::from_str(text).unwrap();
        assert_eq!(config.adjustments_for("apelake", "Snow_Depth").len(), 1);
        assert_eq!(config.adjustments_for("apelake", "Air_Temp").len(), 1);
        assert!(config.adjustments_for("klinaklini", "Snow_Depth").is_empty());
    }

    #[test]
    fn test_suppressed_year_without_variable_applies_to_all() {
        let text = r#"
            [[suppressed_year]]
            station = "eastbuxton"
            year = 2023
        "#;
        let config: OverrideConfig = toml::from_str(text).unwrap();
        assert_eq!(config.suppressed_years("eastbuxton", "Snow_Depth"), vec![2023]);
        assert_eq!(config.suppressed_years("eastbuxton", "Air_Temp"), vec![2023]);
        assert!(config.suppressed_years("apelake", "Snow_Depth").is_empty());
    }

    #[test]
    fn test_zeroing_csv_takes_year_component() {
        let csv = "station,zero_date\nplaceglacier,2023-07-15\nsteph3,2022-08-02\n";
        let dates = parse_zeroing_csv(csv).unwrap();
        assert_eq!(
            dates,
            vec![
                SummerZeroDate { station: "placeglacier".to_string(), year: 2023 },
                SummerZeroDate { station: "steph3".to_string(), year: 2022 },
            ]
        );
    }

    #[test]
    fn test_zeroing_csv_rejects_malformed_rows() {
        let csv = "station,zero_date\nsteph3\n";
        assert!(parse_zeroing_csv(csv).is_err(), "a dropped override must not be silent");
    }

    #[test]
    fn test_zeroing_csv_skips_blank_lines() {
        let csv = "station,zero_date\n\nsteph3,2022-08-02\n\n";
        assert_eq!(parse_zeroing_csv(csv).unwrap().len(), 1);
    }

    #[test]
    fn test_empty_override_config_defaults() {
        let config: OverrideConfig = toml::from_str("").unwrap();
        assert!(config.adjustment.is_empty());
        assert!(config.suppressed_year.is_empty());
        assert!(config.offline.is_empty());
    }
}
