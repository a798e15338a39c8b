//! Work Unit Monitor (wumon) Library
//!
//! A Rust library for turning a legacy folding client's on-disk artifacts
//! (activity log, binary queue snapshot, status file) into structured,
//! queryable work-unit records. The engine performs no I/O: callers hand
//! it already-read text and bytes and get freshly allocated records back.

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod diag;
pub mod fahlog;
pub mod frames;
pub mod queue;
pub mod unit;
pub mod unitinfo;

pub use aggregate::{AggregateResult, UnitDataAggregator, LOG_ONLY_SLOTS};
pub use config::Config;
pub use diag::{DiagnosticSink, NullSink, TracingSink};
pub use fahlog::{ClientRun, LogLine, LogLineKind, LogParseError, UnitIndex};
pub use frames::FrameTracker;
pub use queue::{ClientQueue, Endianness, QueueEntry, QueueEntryStatus};
pub use unit::{ClientStatus, FrameObservation, ProjectInfo, UnitInfo, UnitResult};
