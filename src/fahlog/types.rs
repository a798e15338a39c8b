//! Classified log line, run segment and slice-extraction records.

use chrono::NaiveTime;
use serde::Serialize;
use thiserror::Error;

use crate::unit::{ClientStatus, FrameObservation, ProjectInfo, UnitResult};

/// Closed set of recognized log line kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogLineKind {
    /// `--- Opening Log file` - a new client process lifetime begins here.
    LogOpen,
    ClientVersion,
    ClientArguments,
    ClientUserNameTeam,
    ClientUserId,
    ClientMachineId,
    ClientAttemptGetWorkPacket,
    WorkUnitProcessing,
    WorkUnitCoreDownload,
    /// `Working on queue slot NN` / `Working on Unit NN` - slot announcement.
    WorkUnitWorking,
    WorkUnitProject,
    WorkUnitFrame,
    WorkUnitCoreVersion,
    WorkUnitPaused,
    WorkUnitResumed,
    ClientEuePause,
    /// `Folding@home Core Shutdown: <result>` - terminal unit result.
    WorkUnitCoreShutdown,
    ClientNumberOfUnitsCompleted,
    ClientShutdown,
    /// No marker matched. Classification never fails; it degrades to this.
    Unknown,
}

/// Structured payload extracted from a recognized line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LineData {
    ClientVersion(String),
    Arguments(String),
    UserNameTeam { user_name: String, team: u32 },
    UserId(String),
    MachineId(u32),
    /// Queue slot number 0-9 from a work-unit slot announcement.
    QueueSlot(u8),
    Project(ProjectInfo),
    Frame(FrameObservation),
    CoreVersion(String),
    UnitResult(UnitResult),
    UnitsCompleted(u32),
}

/// One classified log line. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogLine {
    /// Sequence position in the source buffer.
    pub index: usize,
    pub kind: LogLineKind,
    pub raw: String,
    /// Wall-clock-of-day from the `[HH:MM:SS]` prefix, when present.
    pub timestamp: Option<NaiveTime>,
    pub data: Option<LineData>,
}

/// Marks where one queue slot's activity begins/ends within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UnitIndex {
    pub queue_slot: u8,
    pub start_index: usize,
    /// Line position where the next slot (or run) took over; `None` while
    /// the slot is still the active one.
    pub end_index: Option<usize>,
}

/// One contiguous client process lifetime as recorded in the log.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClientRun {
    pub start_index: usize,
    pub arguments: String,
    pub user_name: String,
    pub team: u32,
    pub user_id: String,
    pub machine_id: u32,
    /// Units finished during this run (counted from terminal results).
    pub completed_units: u32,
    /// Units failed during this run (counted from terminal results).
    pub failed_units: u32,
    /// Lifetime completed total this run last reported.
    pub total_completed_units: u32,
    /// Ordered by start position ascending.
    pub unit_indexes: Vec<UnitIndex>,
}

impl ClientRun {
    pub fn starting_at(start_index: usize) -> Self {
        Self {
            start_index,
            ..Self::default()
        }
    }

    /// The still-open unit index, if the run's last slot was never closed.
    pub fn open_unit_index(&self) -> Option<&UnitIndex> {
        self.unit_indexes
            .last()
            .filter(|index| index.end_index.is_none())
    }

    /// The most recent unit index announced for `queue_slot`.
    pub fn unit_index_for_slot(&self, queue_slot: u8) -> Option<&UnitIndex> {
        self.unit_indexes
            .iter()
            .rev()
            .find(|index| index.queue_slot == queue_slot)
    }
}

/// Per-slice data extracted from the log for one work unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FahLogUnitData {
    /// Wall-clock-of-day the unit started processing.
    pub start_time: Option<NaiveTime>,
    /// Raw count of frame lines seen in the slice (duplicates included).
    pub frames_observed: u32,
    pub core_version: Option<String>,
    /// Every project identity announced in the slice, in order.
    pub project_history: Vec<ProjectInfo>,
    /// Frame observations in slice order.
    pub frames: Vec<FrameObservation>,
    pub result: UnitResult,
    /// Client state derived from the slice tail.
    pub status: ClientStatus,
}

impl FahLogUnitData {
    /// Last project identity announced in the slice, if any.
    pub fn project(&self) -> Option<ProjectInfo> {
        self.project_history.last().copied()
    }
}

/// Hard parse failures. Data-quality problems never surface here.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LogParseError {
    /// The input contains no run-start marker at all, so it is not a
    /// recognizable client log.
    #[error("no client runs found in log")]
    NoRunsFound,
}
