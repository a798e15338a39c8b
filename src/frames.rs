//! Frame-progress tracking for a single unit record.
//!
//! A small state machine over one `UnitInfo`'s frame map. Insertion is
//! idempotent per frame id, and inter-frame durations handle the log's
//! wall-clock-of-day rolling over midnight.

use std::time::Duration;

use chrono::{NaiveTime, Timelike};

use crate::unit::{FrameObservation, UnitFrame, UnitInfo};

const SECONDS_PER_DAY: u64 = 86_400;

/// Appends frame observations to a unit under construction.
///
/// Owned by the aggregator while it builds one `UnitInfo`; the frame map
/// is immutable to all downstream consumers afterwards.
pub struct FrameTracker<'a> {
    unit: &'a mut UnitInfo,
}

impl<'a> FrameTracker<'a> {
    pub fn new(unit: &'a mut UnitInfo) -> Self {
        Self { unit }
    }

    /// Record one observation.
    ///
    /// Re-recording an id already in the map is a no-op. Otherwise the
    /// unit's raw frame counters follow the observation, and the new
    /// frame's duration is computed against the frame at `id - 1` - but
    /// only when that predecessor exists and this unit has seen more than
    /// one frame, so the first frame ever recorded is always zero.
    pub fn record(&mut self, observation: &FrameObservation) {
        if self.unit.frames.contains_key(&observation.id) {
            return;
        }

        self.unit.raw_frames_complete = observation.raw_complete;
        self.unit.raw_frames_total = observation.raw_total;
        self.unit.frames_observed += 1;

        let duration = if self.unit.frames_observed > 1 {
            self.unit
                .frames
                .get(&(observation.id - 1))
                .map(|previous| duration_between(previous.timestamp, observation.timestamp))
                .unwrap_or(Duration::ZERO)
        } else {
            Duration::ZERO
        };

        self.unit.frames.insert(
            observation.id,
            UnitFrame {
                id: observation.id,
                raw_complete: observation.raw_complete,
                raw_total: observation.raw_total,
                timestamp: observation.timestamp,
                duration,
            },
        );
    }
}

/// Elapsed wall-clock between two times of day. A new time earlier than
/// the previous one means the clock rolled over midnight:
/// `(24h - previous) + new`.
fn duration_between(previous: NaiveTime, new: NaiveTime) -> Duration {
    let previous_secs = u64::from(previous.num_seconds_from_midnight());
    let new_secs = u64::from(new.num_seconds_from_midnight());
    if new_secs < previous_secs {
        Duration::from_secs(SECONDS_PER_DAY - previous_secs + new_secs)
    } else {
        Duration::from_secs(new_secs - previous_secs)
    }
}
