//! Client run segmentation.
//!
//! Single stateful pass over the classified line stream. A run-start marker
//! opens a new `ClientRun` and closes the previous one; a slot announcement
//! opens a new `UnitIndex` and closes the previous one in the same run.
//! Per-run identity lines update fields last-observed-wins.

use super::types::{ClientRun, LineData, LogLine, LogLineKind, LogParseError, UnitIndex};

/// Group the classified line stream into client runs.
///
/// A run with no recognized slot markers yields an empty `unit_indexes`
/// list; that is a valid "config-only" run, not an error. A log with no
/// run-start marker at all is `LogParseError::NoRunsFound`.
pub fn segment(lines: &[LogLine]) -> Result<Vec<ClientRun>, LogParseError> {
    let mut runs: Vec<ClientRun> = Vec::new();

    for line in lines {
        if line.kind == LogLineKind::LogOpen {
            if let Some(previous) = runs.last_mut() {
                close_open_unit(previous, line.index);
            }
            runs.push(ClientRun::starting_at(line.index));
            continue;
        }

        // Lines before the first run-start marker belong to no run
        let Some(run) = runs.last_mut() else {
            continue;
        };

        match line.kind {
            LogLineKind::WorkUnitWorking => {
                if let Some(LineData::QueueSlot(slot)) = line.data {
                    close_open_unit(run, line.index);
                    run.unit_indexes.push(UnitIndex {
                        queue_slot: slot,
                        start_index: line.index,
                        end_index: None,
                    });
                }
            }
            LogLineKind::ClientArguments => {
                if let Some(LineData::Arguments(arguments)) = &line.data {
                    run.arguments = arguments.clone();
                }
            }
            LogLineKind::ClientUserNameTeam => {
                if let Some(LineData::UserNameTeam { user_name, team }) = &line.data {
                    run.user_name = user_name.clone();
                    run.team = *team;
                }
            }
            LogLineKind::ClientUserId => {
                if let Some(LineData::UserId(user_id)) = &line.data {
                    run.user_id = user_id.clone();
                }
            }
            LogLineKind::ClientMachineId => {
                if let Some(LineData::MachineId(machine_id)) = line.data {
                    run.machine_id = machine_id;
                }
            }
            LogLineKind::ClientNumberOfUnitsCompleted => {
                if let Some(LineData::UnitsCompleted(total)) = line.data {
                    run.total_completed_units = total;
                }
            }
            LogLineKind::WorkUnitCoreShutdown => {
                if let Some(LineData::UnitResult(result)) = line.data {
                    if result == crate::unit::UnitResult::FinishedUnit {
                        run.completed_units += 1;
                    } else if result.is_failure() {
                        run.failed_units += 1;
                    }
                }
            }
            _ => {}
        }
    }

    if runs.is_empty() {
        return Err(LogParseError::NoRunsFound);
    }
    Ok(runs)
}

fn close_open_unit(run: &mut ClientRun, end_index: usize) {
    if let Some(open) = run.unit_indexes.last_mut() {
        if open.end_index.is_none() {
            open.end_index = Some(end_index);
        }
    }
}
