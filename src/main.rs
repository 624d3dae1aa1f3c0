/// Weekly QA/QC batch runner.
///
/// Walks the station registry, cleans every profiled variable of every
/// station, then recomputes the derived cumulative precipitation from the
/// freshly cleaned increments. One station's failure never stops the
/// others: each (station, variable) pair is isolated, logged, counted,
/// and the loop moves on.
///
/// Wall time is read exactly once, here, and threaded through the engine;
/// nothing downstream touches the clock, so a rerun against the same
/// store state reproduces the same output bit for bit.
///
/// Environment (via .env):
/// - DATABASE_URL     — postgres connection string (required)
/// - WXQC_CONFIG_DIR  — override table directory (default: config)
/// - WXQC_LOG_FILE    — append-only log file (optional)
/// - WXQC_LOG_LEVEL   — debug | info | warn | error (default: info)
///
/// Flags:
/// - --dry-run        — run the full engine, report tail sizes, write nothing

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Local;
use dotenv::dotenv;

use wxqc_service::accumulate::recalculate_cumulative;
use wxqc_service::config::{load_zeroing_dates, OverrideConfig, SummerZeroDate};
use wxqc_service::logging::{
    self, init_logger, is_transient, log_batch_summary, log_station_failure, DataSource, LogLevel,
};
use wxqc_service::model::{QcError, VAR_PRECIP_CUMULATIVE};
use wxqc_service::pipeline::{clean_station_variable, PROFILES};
use wxqc_service::stations::STATION_REGISTRY;
use wxqc_service::store::Store;

/// Seconds to wait before the single retry of a transient store failure.
const RETRY_DELAY_SECS: u64 = 5;

fn main() -> ExitCode {
    dotenv().ok();

    let dry_run = std::env::args().any(|a| a == "--dry-run");
    let min_level = match std::env::var("WXQC_LOG_LEVEL").as_deref() {
        Ok("debug") => LogLevel::Debug,
        Ok("warn") => LogLevel::Warning,
        Ok("error") => LogLevel::Error,
        _ => LogLevel::Info,
    };
    let log_file = std::env::var("WXQC_LOG_FILE").ok();
    init_logger(min_level, log_file.as_deref());

    let config_dir = PathBuf::from(
        std::env::var("WXQC_CONFIG_DIR").unwrap_or_else(|_| "config".to_string()),
    );
    let overrides = match OverrideConfig::load(&config_dir.join("overrides.toml")) {
        Ok(c) => c,
        Err(e) => {
            logging::error(DataSource::Config, None, &e.to_string());
            return ExitCode::FAILURE;
        }
    };
    let summer_overrides: Vec<SummerZeroDate> =
        match load_zeroing_dates(&config_dir.join("sdepth_zeroing_dates.csv")) {
            Ok(d) => d,
            Err(e) => {
                logging::error(DataSource::Config, None, &e.to_string());
                return ExitCode::FAILURE;
            }
        };

    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            logging::error(DataSource::System, None, "DATABASE_URL is not set");
            return ExitCode::FAILURE;
        }
    };
    let mut db = match Store::connect(&database_url) {
        Ok(db) => db,
        Err(e) => {
            logging::error(DataSource::Store, None, &e.to_string());
            return ExitCode::FAILURE;
        }
    };

    // The single wall-clock read of the run.
    let now = Local::now().naive_local();

    if dry_run {
        logging::info(DataSource::System, None, "dry run: no writes will be issued");
    }

    let mut total = 0usize;
    let mut cleaned = 0usize;
    let mut skipped = 0usize;
    let mut failed = 0usize;

    for station in STATION_REGISTRY {
        logging::info(
            DataSource::Engine,
            Some(station.name),
            &format!("###### Cleaning station: {} ######", station.display_name),
        );

        for profile in PROFILES {
            total += 1;
            let result = with_transient_retry(|db| {
                clean_station_variable(
                    db,
                    station,
                    profile,
                    &overrides,
                    &summer_overrides,
                    now,
                    dry_run,
                )
            }, &mut db);
            match result {
                Ok(_) => cleaned += 1,
                Err(e) => {
                    log_station_failure(station.name, profile.variable, &e);
                    match logging::classify_failure(&e) {
                        logging::FailureType::Unexpected => failed += 1,
                        _ => skipped += 1,
                    }
                }
            }
        }

        // Derived pass: consumes the qaqc increments written above.
        total += 1;
        let result = with_transient_retry(|db| {
            recalculate_cumulative(db, station, &overrides, now, dry_run)
        }, &mut db);
        match result {
            Ok(_) => cleaned += 1,
            Err(e) => {
                log_station_failure(station.name, VAR_PRECIP_CUMULATIVE, &e);
                match logging::classify_failure(&e) {
                    logging::FailureType::Unexpected => failed += 1,
                    _ => skipped += 1,
                }
            }
        }
    }

    log_batch_summary(total, cleaned, skipped, failed);
    if cleaned == 0 && failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Runs a store-touching closure, retrying exactly once after a short
/// pause when the failure looks like transient connectivity. Anything
/// else propagates immediately; retrying a schema error would only log
/// it twice.
fn with_transient_retry<T>(
    mut op: impl FnMut(&mut Store) -> Result<T, QcError>,
    db: &mut Store,
) -> Result<T, QcError> {
    match op(db) {
        Err(e) if is_transient(&e) => {
            logging::warn(
                DataSource::Store,
                None,
                &format!("transient failure, retrying once: {}", e),
            );
            std::thread::sleep(std::time::Duration::from_secs(RETRY_DELAY_SECS));
            op(db)
        }
        other => other,
    }
}
