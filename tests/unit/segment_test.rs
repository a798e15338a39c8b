//! Client run segmentation tests

use crate::helpers::{CONFIG_ONLY_LOG, SAMPLE_LOG};
use wumon::fahlog::{classify_all, segment, LogParseError};

#[test]
fn one_run_per_start_marker() {
    let two_runs = format!("{SAMPLE_LOG}{CONFIG_ONLY_LOG}");
    let lines = classify_all(&two_runs);
    let runs = segment(&lines).unwrap();
    assert_eq!(runs.len(), 2);
}

#[test]
fn unit_starts_strictly_increase_within_a_run() {
    let lines = classify_all(SAMPLE_LOG);
    let runs = segment(&lines).unwrap();
    let run = &runs[0];
    assert_eq!(run.unit_indexes.len(), 2);
    for pair in run.unit_indexes.windows(2) {
        assert!(pair[0].start_index < pair[1].start_index);
    }
}

#[test]
fn slot_announcement_closes_previous_index() {
    let lines = classify_all(SAMPLE_LOG);
    let runs = segment(&lines).unwrap();
    let run = &runs[0];
    let first = &run.unit_indexes[0];
    let second = &run.unit_indexes[1];
    assert_eq!(first.queue_slot, 1);
    assert_eq!(first.end_index, Some(second.start_index));
    assert_eq!(second.queue_slot, 2);
    assert_eq!(second.end_index, None);
    assert_eq!(run.open_unit_index().map(|u| u.queue_slot), Some(2));
}

#[test]
fn new_run_closes_previous_runs_open_index() {
    let two_runs = format!("{SAMPLE_LOG}{CONFIG_ONLY_LOG}");
    let lines = classify_all(&two_runs);
    let runs = segment(&lines).unwrap();
    let first_run = &runs[0];
    let open = first_run.unit_indexes.last().unwrap();
    assert_eq!(open.end_index, Some(runs[1].start_index));
}

#[test]
fn run_identity_fields_are_extracted() {
    let lines = classify_all(SAMPLE_LOG);
    let runs = segment(&lines).unwrap();
    let run = &runs[0];
    assert_eq!(run.user_name, "harlam357");
    assert_eq!(run.team, 32);
    assert_eq!(run.user_id, "3B99CD3A1D6D7D4D");
    assert_eq!(run.machine_id, 1);
    assert_eq!(run.arguments, "-smp -verbosity 9");
}

#[test]
fn identity_updates_are_last_observed_wins() {
    let log = "\
--- Opening Log file
[10:00:00] - User name: first_name (Team 1)
[10:00:01] - User name: second_name (Team 2)
[10:00:02] - Machine ID: 1
[10:00:03] - Machine ID: 3
";
    let lines = classify_all(log);
    let runs = segment(&lines).unwrap();
    assert_eq!(runs[0].user_name, "second_name");
    assert_eq!(runs[0].team, 2);
    assert_eq!(runs[0].machine_id, 3);
}

#[test]
fn counters_track_terminal_results() {
    let log = "\
--- Opening Log file
[01:00:00] Working on queue slot 00 [June 1]
[02:00:00] Folding@home Core Shutdown: FINISHED_UNIT
[02:10:00] Working on queue slot 01 [June 1]
[03:00:00] Folding@home Core Shutdown: EARLY_UNIT_END
[03:00:01] + Number of Units Completed: 100
[03:10:00] Working on queue slot 02 [June 1]
[04:00:00] Folding@home Core Shutdown: INTERRUPTED
";
    let lines = classify_all(log);
    let runs = segment(&lines).unwrap();
    let run = &runs[0];
    assert_eq!(run.completed_units, 1);
    assert_eq!(run.failed_units, 1);
    // INTERRUPTED counts as neither completed nor failed
    assert_eq!(run.total_completed_units, 100);
}

#[test]
fn config_only_run_has_no_unit_indexes() {
    let lines = classify_all(CONFIG_ONLY_LOG);
    let runs = segment(&lines).unwrap();
    assert_eq!(runs.len(), 1);
    assert!(runs[0].unit_indexes.is_empty());
}

#[test]
fn log_without_run_markers_is_an_error() {
    let lines = classify_all("[10:00:00] Completed 25%\njust noise\n");
    assert_eq!(segment(&lines), Err(LogParseError::NoRunsFound));

    let empty = classify_all("");
    assert_eq!(segment(&empty), Err(LogParseError::NoRunsFound));
}

#[test]
fn lines_before_first_run_are_ignored() {
    let log = "\
[09:59:59] Completed 10%
--- Opening Log file
[10:00:00] Working on queue slot 05 [June 1]
";
    let lines = classify_all(log);
    let runs = segment(&lines).unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].start_index, 1);
    assert_eq!(runs[0].unit_indexes[0].queue_slot, 5);
}
