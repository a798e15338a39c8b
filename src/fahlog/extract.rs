//! Per-slice extraction of work-unit data from the log.

use super::types::{FahLogUnitData, LineData, LogLine, LogLineKind};
use crate::unit::ClientStatus;

/// Scan one work-unit's line range and pull out everything the aggregator
/// needs: start time, frames, projects, core version, terminal result and
/// a derived client status for the slice.
///
/// The status is a small state machine over the slice tail: working/resume
/// markers mean running, pause/EUE/shutdown markers override it, and two or
/// more timed frames upgrade "running" to "running with frame times".
pub fn extract_unit_data(slice: &[LogLine]) -> FahLogUnitData {
    let mut data = FahLogUnitData::default();
    let mut status = ClientStatus::Unknown;

    for line in slice {
        match line.kind {
            LogLineKind::WorkUnitProcessing | LogLineKind::WorkUnitWorking => {
                if data.start_time.is_none() {
                    data.start_time = line.timestamp;
                }
                status = ClientStatus::RunningNoFrameTimes;
            }
            LogLineKind::WorkUnitCoreVersion => {
                if let Some(LineData::CoreVersion(version)) = &line.data {
                    data.core_version = Some(version.clone());
                }
            }
            LogLineKind::WorkUnitProject => {
                if let Some(LineData::Project(project)) = line.data {
                    data.project_history.push(project);
                }
            }
            LogLineKind::WorkUnitFrame => {
                if let Some(LineData::Frame(frame)) = line.data {
                    data.frames.push(frame);
                    data.frames_observed += 1;
                    status = ClientStatus::RunningNoFrameTimes;
                }
            }
            LogLineKind::WorkUnitPaused => status = ClientStatus::Paused,
            LogLineKind::WorkUnitResumed => status = ClientStatus::RunningNoFrameTimes,
            LogLineKind::ClientEuePause => status = ClientStatus::EuePause,
            LogLineKind::ClientAttemptGetWorkPacket => status = ClientStatus::GettingWorkPacket,
            LogLineKind::WorkUnitCoreShutdown => {
                if let Some(LineData::UnitResult(result)) = line.data {
                    data.result = result;
                }
            }
            LogLineKind::ClientShutdown => status = ClientStatus::Stopped,
            _ => {}
        }
    }

    if status == ClientStatus::RunningNoFrameTimes && data.frames.len() >= 2 {
        status = ClientStatus::Running;
    }
    data.status = status;
    data
}
