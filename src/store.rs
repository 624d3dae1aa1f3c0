/// SQL store access and incremental synchronization.
///
/// The store keeps one pair of tables per station: `clean_<station>` holds
/// the raw telemetry as it arrived, `qaqc_<station>` the corrected values
/// plus a `<variable>_flags` TEXT column per variable. `DateTime` is the
/// primary key in both. This module owns every SQL string in the crate;
/// the engine above it only ever sees rows and records.
///
/// Writes are incremental. `tail_start_index` finds the suffix of a
/// cleaned series that postdates the last value the qaqc table already
/// holds, and `upsert_records` writes exactly that suffix, keyed by
/// timestamp, leaving all earlier rows untouched. Upserting (rather than
/// updating) means the write also works against a qaqc table whose empty
/// weekly rows have not been pre-created yet.

use chrono::{Duration, NaiveDateTime};
use postgres::{Client, NoTls};

use crate::model::{QcError, QcRecord};
use crate::water_year::water_year_label;

// ---------------------------------------------------------------------------
// Connection
// ---------------------------------------------------------------------------

pub struct Store {
    client: Client,
}

impl Store {
    /// Connects to the store. `database_url` comes from the environment
    /// via dotenv; see `.env.example`.
    pub fn connect(database_url: &str) -> Result<Store, QcError> {
        let client = Client::connect(database_url, NoTls)?;
        Ok(Store { client })
    }

    /// Runs raw SQL against the store. Exists for migrations and test
    /// fixtures; engine code never calls it.
    pub fn execute_batch(&mut self, sql: &str) -> Result<(), QcError> {
        self.client.batch_execute(sql)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Fetches the full (timestamp, value) history of one variable from a
    /// station's `clean` or `qaqc` table, ordered by timestamp.
    pub fn fetch_series(
        &mut self,
        table_prefix: &str,
        station: &str,
        variable: &str,
    ) -> Result<Vec<(NaiveDateTime, Option<f64>)>, QcError> {
        let query = format!(
            "SELECT \"DateTime\", \"{}\" FROM {}_{} ORDER BY \"DateTime\"",
            variable, table_prefix, station
        );
        let rows = self.client.query(query.as_str(), &[])?;
        Ok(rows
            .iter()
            .map(|row| (row.get::<_, NaiveDateTime>(0), row.get::<_, Option<f64>>(1)))
            .collect())
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Upserts cleaned records into a station's qaqc table: value, flag
    /// string, and water-year label, keyed by timestamp. Rows earlier than
    /// the given slice are never touched. An empty flag string is stored
    /// as NULL to match how untouched rows have always read back.
    ///
    /// Returns the number of rows written.
    pub fn upsert_records(
        &mut self,
        station: &str,
        variable: &str,
        records: &[QcRecord],
    ) -> Result<usize, QcError> {
        let statement = format!(
            "INSERT INTO qaqc_{station} (\"DateTime\", \"WatYr\", \"{var}\", \"{var}_flags\") \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (\"DateTime\") DO UPDATE SET \
             \"WatYr\" = EXCLUDED.\"WatYr\", \
             \"{var}\" = EXCLUDED.\"{var}\", \
             \"{var}_flags\" = EXCLUDED.\"{var}_flags\"",
            station = station,
            var = variable
        );
        let prepared = self.client.prepare(&statement)?;

        let mut written = 0usize;
        for record in records {
            let flags = if record.flags.is_empty() {
                None
            } else {
                Some(record.flags.as_str())
            };
            let label = water_year_label(record.datetime);
            self.client.execute(
                &prepared,
                &[&record.datetime, &label, &record.value, &flags],
            )?;
            written += 1;
        }
        Ok(written)
    }
}

// ---------------------------------------------------------------------------
// Tail computation
// ---------------------------------------------------------------------------

/// Index into `records` of the first row that should be written: the hour
/// after the last non-null value the qaqc table already holds.
///
/// When the persisted series has no valid value at all (fresh table, or a
/// variable that has never produced data) the whole series qualifies.
/// The same applies when the anchor hour cannot be found among the new
/// records, which happens when the persisted table runs ahead of a
/// reprocessing window; rewriting the window is then the correct, if
/// heavier, behaviour.
pub fn tail_start_index(
    persisted: &[(NaiveDateTime, Option<f64>)],
    records: &[QcRecord],
) -> usize {
    let Some(last_valid) = persisted.iter().rposition(|(_, v)| v.is_some()) else {
        return 0;
    };
    let anchor = persisted[last_valid].0 + Duration::hours(1);
    records
        .iter()
        .position(|r| r.datetime == anchor)
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
