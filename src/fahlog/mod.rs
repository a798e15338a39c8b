//! FAHLog text interpretation.
//!
//! Three passes over an already-loaded log buffer, leaves first:
//! classification (one line -> typed event), segmentation (event stream ->
//! client runs with per-slot unit indexes), and slice extraction (one unit's
//! line range -> `FahLogUnitData`). None of them perform I/O and none of
//! them fail on malformed lines; only a log with zero run-start markers is
//! an error.

mod classify;
mod extract;
mod segment;
mod types;

pub use classify::{classify, classify_all};
pub use extract::extract_unit_data;
pub use segment::segment;
pub use types::{
    ClientRun, FahLogUnitData, LineData, LogLine, LogLineKind, LogParseError, UnitIndex,
};
