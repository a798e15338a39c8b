//! Decoded queue snapshot records.

use std::net::Ipv4Addr;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::unit::ProjectInfo;

/// Total snapshot size in bytes.
pub const QUEUE_LENGTH: usize = 7168;
/// Number of work-unit slots per snapshot.
pub const ENTRY_COUNT: usize = 10;
/// Size of one entry record in bytes.
pub const ENTRY_LENGTH: usize = 712;

/// Byte-order policy for multi-byte numeric fields.
///
/// The legacy format is ambiguously little- or big-endian depending on the
/// originating client version and platform, and the format notes do not
/// resolve it per field. The interpretation is therefore an explicit,
/// documented policy chosen by the caller - never inferred at runtime.
/// `Little` covers the dominant x86 client population and is the default;
/// the choice is flagged for review in `queue::decode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    #[default]
    Little,
    Big,
}

/// Per-slot status derived from the raw status word plus entry contents.
///
/// Raw value mapping: 0 resolves by context to Empty, Deleted or Finished;
/// 1 is FoldingNow for the snapshot's current slot and Queued otherwise;
/// 2 ReadyForUpload; 3 Abandoned; 4 FetchingFromServer. Out-of-range raw
/// values decode as Garbage. Unknown is the never-decoded default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum QueueEntryStatus {
    #[default]
    Unknown,
    Empty,
    Deleted,
    Finished,
    Garbage,
    FoldingNow,
    Queued,
    ReadyForUpload,
    Abandoned,
    FetchingFromServer,
}

impl QueueEntryStatus {
    /// Whether an entry with this status contributes merge fields during
    /// aggregation. Unknown/Empty/Garbage/Abandoned entries carry nothing
    /// trustworthy about a unit.
    pub fn has_unit_data(&self) -> bool {
        !matches!(
            self,
            QueueEntryStatus::Unknown
                | QueueEntryStatus::Empty
                | QueueEntryStatus::Garbage
                | QueueEntryStatus::Abandoned
        )
    }
}

/// One decoded slot of the queue snapshot. Immutable value record; the
/// whole queue is replaced wholesale on every retrieval cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueEntry {
    pub status: QueueEntryStatus,
    pub begin_utc: Option<DateTime<Utc>>,
    pub begin_local: Option<DateTime<Local>>,
    pub end_utc: Option<DateTime<Utc>>,
    pub end_local: Option<DateTime<Local>>,
    pub project: ProjectInfo,
    pub server: Ipv4Addr,
    pub port: u32,
    pub cpu_type: u32,
    pub os_type: u32,
    pub core_count: u32,
    pub benchmark: u32,
    pub memory_mib: u32,
    pub user_id: u64,
    pub machine_id: u32,
    /// Work-unit tag, fixed-length in the snapshot, trimmed at first NUL.
    pub tag: String,
}

/// Full decoded snapshot: ten entries plus aggregate statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientQueue {
    pub version: u32,
    /// Index of the slot the client is currently folding, 0-9.
    pub current_index: u32,
    pub entries: Vec<QueueEntry>,
    pub performance_fraction: f32,
    pub download_rate_avg: f32,
    pub download_rate_unit_weight: u32,
    pub upload_rate_avg: f32,
    pub upload_rate_unit_weight: u32,
}

impl ClientQueue {
    pub fn current_entry(&self) -> &QueueEntry {
        &self.entries[self.current_index as usize % ENTRY_COUNT]
    }
}

/// Snapshot decode failure. Recoverable: the aggregator degrades to
/// log-only mode rather than failing the cycle.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("queue snapshot has wrong size: expected {QUEUE_LENGTH} bytes, got {0}")]
    WrongSize(usize),
    #[error("queue snapshot current index {0} is out of range")]
    IndexOutOfRange(u32),
}
