/// QA/QC test stage library.
///
/// Each stage is a pure function from a window of values (plus parameters)
/// to a corrected copy of the window and a parallel flag vector, one entry
/// per row, zero where the stage left the row alone and the stage's code
/// where it corrected or rejected it. Stages never share state; the only
/// thing that flows between them is the corrected values the orchestrator
/// threads from one stage into the next.
///
/// Given identical inputs and parameters a stage always produces identical
/// output. Nothing in this tree reads the clock, and nothing here does I/O.
///
/// Submodules:
/// - `range` — step-change spike removal (code 1)
/// - `bounds` — absolute validity bounds and negative clipping (code 2)
/// - `duplicates` — stuck-sensor run suppression (code 3)
/// - `rolling` — rolling statistical outlier removal (code 4) and the
///   coarse sliding-mean final pass (code 7)
/// - `season` — variable-specific zero corrections (code 6)
/// - `interpolate` — gap-limited linear infill (code 8)

pub mod bounds;
pub mod duplicates;
pub mod interpolate;
pub mod range;
pub mod rolling;
pub mod season;

// ---------------------------------------------------------------------------
// Flag codes
// ---------------------------------------------------------------------------

/// Derived value, never independently tested (accumulator output).
pub const FLAG_DERIVED: u8 = 0;
/// Static range test: step change between consecutive samples too large.
pub const FLAG_RANGE: u8 = 1;
/// Threshold reset: outside absolute validity bounds, or negative clipped.
pub const FLAG_BOUNDS: u8 = 2;
/// Duplicate-run suppression: value repeated unchanged (stuck sensor).
pub const FLAG_DUPLICATE: u8 = 3;
/// Rolling statistical outlier: too many standard deviations off the
/// local mean.
pub const FLAG_OUTLIER: u8 = 4;
/// Domain-specific zero correction (false temperature zeros, forced summer
/// snow zeros). Dominant: supersedes every other code on the same row.
pub const FLAG_DOMAIN_ZERO: u8 = 6;
/// Sliding-window mean threshold: coarse final-pass deviation.
pub const FLAG_WINDOW_MEAN: u8 = 7;
/// Gap-limited interpolation: the row was filled linearly.
pub const FLAG_INTERPOLATED: u8 = 8;

// ---------------------------------------------------------------------------
// Flag merge
// ---------------------------------------------------------------------------

/// Merges per-stage flag vectors into one flag string per row: the ascending,
/// deduplicated list of codes that touched the row, comma-joined, empty when
/// untouched.
///
/// Code 6 is dominant. A forced-zero row has no remaining diagnostic value,
/// so any other codes it accumulated are discarded and the final string is
/// exactly "6".
pub fn merge_flags(stage_flags: &[Vec<u8>]) -> Vec<String> {
    let n = stage_flags.first().map(|f| f.len()).unwrap_or(0);
    debug_assert!(
        stage_flags.iter().all(|f| f.len() == n),
        "all stage flag vectors must cover the same window"
    );

    let mut merged = Vec::with_capacity(n);
    for row in 0..n {
        let mut codes: Vec<u8> = stage_flags
            .iter()
            .map(|f| f[row])
            .filter(|c| *c != 0)
            .collect();
        codes.sort_unstable();
        codes.dedup();

        if codes.contains(&FLAG_DOMAIN_ZERO) {
            merged.push(FLAG_DOMAIN_ZERO.to_string());
        } else {
            let joined = codes
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(",");
            merged.push(joined);
        }
    }
    merged
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
