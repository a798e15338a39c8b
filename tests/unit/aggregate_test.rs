//! Aggregation tests: queue mode, log-only mode, rejection and rescue

use crate::helpers::{
    sample_queue, QueueBuilder, RecordingSink, CONFIG_ONLY_LOG, SAMPLE_LOG, SAMPLE_UNITINFO,
};
use wumon::{
    ClientStatus, LogParseError, NullSink, ProjectInfo, UnitDataAggregator, UnitResult,
    LOG_ONLY_SLOTS,
};

fn aggregator(sink: &RecordingSink) -> UnitDataAggregator<'_> {
    UnitDataAggregator::new(sink).reference_year(2009)
}

#[test]
fn queue_mode_propagates_current_index() {
    let sink = RecordingSink::default();
    let result = aggregator(&sink)
        .aggregate(SAMPLE_LOG, Some(&sample_queue()), Some(SAMPLE_UNITINFO))
        .unwrap();

    assert!(!result.log_only);
    assert_eq!(result.units.len(), 10);
    assert_eq!(result.current_unit_index, 2);
    assert_eq!(
        result.queue.as_ref().map(|q| q.current_index),
        Some(2)
    );
    assert!(result.current_unit().is_some());
}

#[test]
fn queue_mode_merges_all_three_sources() {
    let sink = RecordingSink::default();
    let result = aggregator(&sink)
        .aggregate(SAMPLE_LOG, Some(&sample_queue()), Some(SAMPLE_UNITINFO))
        .unwrap();

    let current = result.current_unit().unwrap();
    // Project from the queue entry, corroborated by the log slice
    assert_eq!(current.project, ProjectInfo::new(7610, 630, 0, 59));
    // Protein name only exists in the secondary file
    assert_eq!(current.protein_name.as_deref(), Some("p7610_lambda"));
    // Core version only exists in the log
    assert_eq!(current.core_version.as_deref(), Some("2.27"));
    // Download time prefers the queue's begin time over the status file
    assert!(current.download_time.is_some());
    assert!(!current.match_override);
    // Frames applied in slice order
    assert_eq!(current.frames.len(), 2);
    assert_eq!(current.current_frame().map(|f| f.id), Some(1));
    assert_eq!(current.raw_frames_total, 500_000);

    assert_eq!(result.current_status, ClientStatus::Running);
}

#[test]
fn finished_slot_keeps_its_own_record() {
    let sink = RecordingSink::default();
    let result = aggregator(&sink)
        .aggregate(SAMPLE_LOG, Some(&sample_queue()), Some(SAMPLE_UNITINFO))
        .unwrap();

    let finished = result.units[1].as_ref().unwrap();
    assert_eq!(finished.project, ProjectInfo::new(2677, 10, 29, 28));
    assert_eq!(finished.result, UnitResult::FinishedUnit);
    assert!(finished.finished_time.is_some());
    // The secondary file informs only the current slot
    assert_eq!(finished.protein_name, None);
}

#[test]
fn empty_slots_come_back_null() {
    let sink = RecordingSink::default();
    let result = aggregator(&sink)
        .aggregate(SAMPLE_LOG, Some(&sample_queue()), None)
        .unwrap();

    for slot in [0usize, 3, 4, 5, 6, 7, 8, 9] {
        assert!(result.units[slot].is_none(), "slot {slot} should be empty");
    }
}

#[test]
fn mismatched_slot_is_rejected() {
    // Queue claims slot 1 folded project 8888; the log slice says 2677
    let bytes = QueueBuilder::new(2)
        .status(1, 0)
        .project(1, 8888, 1, 1, 1)
        .status(2, 1)
        .project(2, 7610, 630, 0, 59)
        .build();

    let sink = RecordingSink::default();
    let result = aggregator(&sink)
        .aggregate(SAMPLE_LOG, Some(&bytes), None)
        .unwrap();

    assert!(result.units[1].is_none());
    assert!(sink.contains("rejected"));
    // The well-matched current slot is unaffected
    assert_eq!(
        result.current_unit().map(|u| u.project),
        Some(ProjectInfo::new(7610, 630, 0, 59))
    );
}

#[test]
fn mismatched_current_slot_is_rebuilt_not_dropped() {
    // Queue claims the current slot is project 9999; nothing corroborates it
    let bytes = QueueBuilder::new(2)
        .status(2, 1)
        .project(2, 9999, 1, 1, 1)
        .build();

    let sink = RecordingSink::default();
    let result = aggregator(&sink)
        .aggregate(SAMPLE_LOG, Some(&bytes), None)
        .unwrap();

    let current = result.current_unit().expect("current slot never dropped");
    assert!(current.match_override);
    // Frames from the broadest slice still flow through
    assert_eq!(current.frames.len(), 2);
}

#[test]
fn queue_decode_failure_degrades_to_log_only() {
    let sink = RecordingSink::default();
    let result = aggregator(&sink)
        .aggregate(SAMPLE_LOG, Some(&[0u8; 100]), Some(SAMPLE_UNITINFO))
        .unwrap();

    assert!(result.log_only);
    assert!(result.queue.is_none());
    assert_eq!(result.units.len(), LOG_ONLY_SLOTS);
    assert!(sink.contains("queue unavailable"));
}

#[test]
fn log_only_mode_builds_previous_and_current() {
    let result = UnitDataAggregator::new(&NullSink)
        .reference_year(2009)
        .aggregate(SAMPLE_LOG, None, Some(SAMPLE_UNITINFO))
        .unwrap();

    assert_eq!(result.units.len(), 2);
    assert_eq!(result.current_unit_index, 1);

    let previous = result.units[0].as_ref().unwrap();
    assert_eq!(previous.project, ProjectInfo::new(2677, 10, 29, 28));
    assert_eq!(previous.result, UnitResult::FinishedUnit);

    let current = result.units[1].as_ref().unwrap();
    assert_eq!(current.project, ProjectInfo::new(7610, 630, 0, 59));
    assert!(!current.match_override);
    assert_eq!(result.current_status, ClientStatus::Running);
}

#[test]
fn log_only_without_open_slice_falls_back_to_whole_run() {
    let result = UnitDataAggregator::new(&NullSink)
        .aggregate(CONFIG_ONLY_LOG, None, None)
        .unwrap();

    assert_eq!(result.units.len(), 2);
    assert!(result.units[0].is_none());

    let current = result.units[1].as_ref().unwrap();
    assert!(current.match_override);
    // The run ends fetching a new assignment: transitional state must not
    // fabricate stale unit data
    assert!(current.project.is_unknown());
    assert!(current.frames.is_empty());
    assert_eq!(result.current_status, ClientStatus::GettingWorkPacket);
}

#[test]
fn folding_identity_comes_from_the_run() {
    let result = UnitDataAggregator::new(&NullSink)
        .aggregate(SAMPLE_LOG, None, None)
        .unwrap();
    let current = result.current_unit().unwrap();
    assert_eq!(current.user_name, "harlam357");
    assert_eq!(current.team, 32);
    assert_eq!(result.current_run().user_id, "3B99CD3A1D6D7D4D");
}

#[test]
fn unrecognizable_log_is_a_hard_error() {
    let err = UnitDataAggregator::new(&NullSink)
        .aggregate("not a folding log at all\n", None, None)
        .unwrap_err();
    assert_eq!(err, LogParseError::NoRunsFound);
}
