//! Test helper utilities

#![allow(dead_code)]

use std::cell::RefCell;

use wumon::queue::{ENTRY_LENGTH, QUEUE_LENGTH};
use wumon::DiagnosticSink;

/// A realistic two-slot log for the current run: slot 1 finished a unit of
/// project 2677, slot 2 is open and folding project 7610 (Run 630, Clone 0,
/// Gen 59).
pub const SAMPLE_LOG: &str = "\
--- Opening Log file [December 28 17:15:05 UTC]
Folding@Home Client Version 6.23
Arguments: -smp -verbosity 9
[17:15:05] - User name: harlam357 (Team 32)
[17:15:05] - User ID: 3B99CD3A1D6D7D4D
[17:15:05] - Machine ID: 1
[17:21:43] Working on queue slot 01 [December 28 17:21:43]
[17:21:45] Version 2.27 (Dec. 15, 2010)
[17:21:46] Project: 2677 (Run 10, Clone 29, Gen 28)
[17:21:52] Completed 0 out of 250000 steps  (0%)
[17:38:15] Completed 2500 out of 250000 steps  (1%)
[02:46:04] Folding@home Core Shutdown: FINISHED_UNIT
[02:46:05] + Number of Units Completed: 264
[02:47:00] + Attempting to get work packet
[02:50:00] Working on queue slot 02 [December 29 02:50:00]
[02:50:01] Version 2.27 (Dec. 15, 2010)
[02:50:02] Project: 7610 (Run 630, Clone 0, Gen 59)
[02:50:10] Completed 0 out of 500000 steps  (0%)
[03:10:10] Completed 5000 out of 500000 steps  (1%)
";

/// A "config-only" run: the client started, announced identity, asked for
/// work and never opened a slot.
pub const CONFIG_ONLY_LOG: &str = "\
--- Opening Log file [December 30 09:00:00 UTC]
Folding@Home Client Version 6.23
[09:00:00] - User name: harlam357 (Team 32)
[09:00:05] + Attempting to get work packet
";

/// Secondary status file matching the open slot of `SAMPLE_LOG`.
pub const SAMPLE_UNITINFO: &str = "\
Name: p7610_lambda
Tag: P7610R630C0G59
Download Time: December 29 02:50:00
Due Time: January 9 02:50:00
Progress: 1%  [|_________]
";

// Snapshot layout constants mirrored from the documented format: header is
// version + current index, entries start at byte 8.
const OFFSET_ENTRIES: usize = 8;
const ENTRY_STATUS: usize = 0;
const ENTRY_BEGIN_TIME: usize = 8;
const ENTRY_END_TIME: usize = 12;
const ENTRY_PROJECT: usize = 24;

/// Little-endian queue snapshot builder for tests.
pub struct QueueBuilder {
    bytes: Vec<u8>,
}

impl QueueBuilder {
    pub fn new(current_index: u32) -> Self {
        let mut bytes = vec![0u8; QUEUE_LENGTH];
        bytes[0..4].copy_from_slice(&600u32.to_le_bytes());
        bytes[4..8].copy_from_slice(&current_index.to_le_bytes());
        Self { bytes }
    }

    pub fn status(mut self, slot: usize, raw_status: u32) -> Self {
        self.put_u32(slot, ENTRY_STATUS, raw_status);
        self
    }

    pub fn project(mut self, slot: usize, project: u16, run: u16, clone: u16, gen: u16) -> Self {
        let base = OFFSET_ENTRIES + slot * ENTRY_LENGTH + ENTRY_PROJECT;
        self.bytes[base..base + 2].copy_from_slice(&project.to_le_bytes());
        self.bytes[base + 2..base + 4].copy_from_slice(&run.to_le_bytes());
        self.bytes[base + 4..base + 6].copy_from_slice(&clone.to_le_bytes());
        self.bytes[base + 6..base + 8].copy_from_slice(&gen.to_le_bytes());
        self
    }

    pub fn begin_time(mut self, slot: usize, seconds_past_epoch: u32) -> Self {
        self.put_u32(slot, ENTRY_BEGIN_TIME, seconds_past_epoch);
        self
    }

    pub fn end_time(mut self, slot: usize, seconds_past_epoch: u32) -> Self {
        self.put_u32(slot, ENTRY_END_TIME, seconds_past_epoch);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }

    fn put_u32(&mut self, slot: usize, offset: usize, value: u32) {
        let at = OFFSET_ENTRIES + slot * ENTRY_LENGTH + offset;
        self.bytes[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }
}

/// A snapshot matching `SAMPLE_LOG`: slot 2 folding project 7610, slot 1
/// finished project 2677.
pub fn sample_queue() -> Vec<u8> {
    QueueBuilder::new(2)
        .status(1, 0)
        .project(1, 2677, 10, 29, 28)
        .begin_time(1, 1000)
        .end_time(1, 40_000)
        .status(2, 1)
        .project(2, 7610, 630, 0, 59)
        .begin_time(2, 50_000)
        .build()
}

/// Diagnostic sink that records every message for assertions.
#[derive(Default)]
pub struct RecordingSink {
    pub messages: RefCell<Vec<String>>,
}

impl RecordingSink {
    pub fn warnings(&self) -> Vec<String> {
        self.messages
            .borrow()
            .iter()
            .filter(|m| m.starts_with("warn: "))
            .cloned()
            .collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.messages.borrow().iter().any(|m| m.contains(needle))
    }
}

impl DiagnosticSink for RecordingSink {
    fn warn(&self, message: &str) {
        self.messages.borrow_mut().push(format!("warn: {message}"));
    }

    fn verbose(&self, message: &str) {
        self.messages
            .borrow_mut()
            .push(format!("verbose: {message}"));
    }
}
