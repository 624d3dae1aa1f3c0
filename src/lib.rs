/// Weather station QA/QC batch service.
///
/// Cleans the hourly telemetry of a network of remote weather stations:
/// regularizes each raw series onto a strict 1-hour grid, partitions it
/// into water years, runs an ordered sequence of statistical and domain
/// tests over each window, and writes the corrected values with their
/// per-row flag history back to the qaqc store incrementally.
///
/// Module map, roughly in data-flow order:
/// - `model` — shared domain types and the crate error enum
/// - `stations` — the network registry (which station has which sensors)
/// - `config` — declarative override table and zeroing-date CSV
/// - `grid` — raw rows onto the hourly grid
/// - `cutoff` — how far each run is allowed to process
/// - `water_year` — Oct 1 through Sep 30 segmentation
/// - `qc` — the test stage library, one routine per flag code
/// - `pipeline` — stage sequencing, flag merge, per-station driver
/// - `accumulate` — derived cumulative precipitation
/// - `store` — SQL reads, tail computation, incremental upserts
/// - `logging` — structured batch logging

pub mod accumulate;
pub mod config;
pub mod cutoff;
pub mod grid;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod qc;
pub mod stations;
pub mod store;
pub mod water_year;
