//! Shared work-unit data model.
//!
//! Plain immutable records shared by the log parser, the queue decoder and
//! the aggregator. No trait objects: only one concrete source format exists
//! per client version line, so data stays data.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, NaiveTime, Utc};
use serde::Serialize;

/// Four-integer identity of a work assignment: (project, run, clone, gen).
///
/// The identity is atomic: all four sub-fields are simultaneously zero
/// ("unknown") or the unit is considered identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ProjectInfo {
    pub project: u32,
    pub run: u32,
    pub clone: u32,
    pub gen: u32,
}

impl ProjectInfo {
    pub fn new(project: u32, run: u32, clone: u32, gen: u32) -> Self {
        Self {
            project,
            run,
            clone,
            gen,
        }
    }

    /// All four sub-fields zero means the unit is unidentified.
    pub fn is_unknown(&self) -> bool {
        self.project == 0 && self.run == 0 && self.clone == 0 && self.gen == 0
    }

    pub fn is_known(&self) -> bool {
        !self.is_unknown()
    }
}

impl fmt::Display for ProjectInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "P{} (R{}, C{}, G{})",
            self.project, self.run, self.clone, self.gen
        )
    }
}

/// Terminal result reported by the core when a work unit ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum UnitResult {
    #[default]
    Unknown,
    FinishedUnit,
    EarlyUnitEnd,
    UnstableMachine,
    Interrupted,
    BadWorkUnit,
    CoreOutdated,
}

impl UnitResult {
    /// Parse the token after `Folding@home Core Shutdown:`.
    pub fn from_token(token: &str) -> Self {
        match token {
            "FINISHED_UNIT" => UnitResult::FinishedUnit,
            "EARLY_UNIT_END" => UnitResult::EarlyUnitEnd,
            "UNSTABLE_MACHINE" => UnitResult::UnstableMachine,
            "INTERRUPTED" => UnitResult::Interrupted,
            "BAD_WORK_UNIT" => UnitResult::BadWorkUnit,
            "CORE_OUTDATED" => UnitResult::CoreOutdated,
            _ => UnitResult::Unknown,
        }
    }

    /// Results that count toward a run's failed-unit counter.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            UnitResult::EarlyUnitEnd
                | UnitResult::UnstableMachine
                | UnitResult::BadWorkUnit
                | UnitResult::CoreOutdated
        )
    }
}

/// Client state derived from the tail of a log slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ClientStatus {
    #[default]
    Unknown,
    Stopped,
    Paused,
    EuePause,
    GettingWorkPacket,
    RunningNoFrameTimes,
    Running,
}

/// One frame-progress observation parsed from the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameObservation {
    /// Frame id (the reported percent for step-style and percent-style lines).
    pub id: i32,
    pub raw_complete: u32,
    pub raw_total: u32,
    /// Wall-clock-of-day the line was logged at.
    pub timestamp: NaiveTime,
}

/// One recorded frame in a unit's frame map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UnitFrame {
    pub id: i32,
    pub raw_complete: u32,
    pub raw_total: u32,
    pub timestamp: NaiveTime,
    /// Time since the previous frame; zero for the first frame recorded.
    pub duration: Duration,
}

/// Canonical merged record for one work-unit slot.
///
/// Built once per slot per retrieval cycle by the aggregator; the frame map
/// grows only during that construction and is immutable afterwards.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UnitInfo {
    pub project: ProjectInfo,
    pub user_name: String,
    pub team: u32,
    pub download_time: Option<DateTime<Utc>>,
    pub due_time: Option<DateTime<Utc>>,
    pub finished_time: Option<DateTime<Utc>>,
    pub core_version: Option<String>,
    pub protein_name: Option<String>,
    pub protein_tag: Option<String>,
    pub result: UnitResult,
    pub raw_frames_complete: u32,
    pub raw_frames_total: u32,
    /// Count of distinct frames recorded for this unit.
    pub frames_observed: u32,
    /// Frame id -> frame, ids unique, ordered ascending.
    pub frames: BTreeMap<i32, UnitFrame>,
    /// True when the slot was rebuilt from a broad log slice without
    /// project corroboration (log-only fallback or current-slot rescue).
    pub match_override: bool,
}

impl UnitInfo {
    /// The frame with the highest non-negative id, if any.
    pub fn current_frame(&self) -> Option<&UnitFrame> {
        self.frames.range(0..).next_back().map(|(_, frame)| frame)
    }

    /// Percent complete as reported by the newest frame.
    pub fn percent_complete(&self) -> Option<i32> {
        self.current_frame().map(|frame| frame.id)
    }
}
