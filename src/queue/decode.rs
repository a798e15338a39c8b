//! Fixed-offset snapshot decoder.
//!
//! Explicit offset/length byte reads into immutable records; no marshaled
//! struct overlays, so decoding carries no platform memory-layout
//! assumptions. All offsets below are relative to one 712-byte entry,
//! except the header and statistics constants.
//!
//! REVIEW: multi-byte numeric fields use the caller-supplied `Endianness`
//! policy uniformly. The legacy format notes leave per-field byte order
//! unresolved for some client/OS combinations; revisit if a client
//! population surfaces that mixes orders within one snapshot.

use std::net::Ipv4Addr;

use chrono::{DateTime, Local, Utc};

use super::types::{
    ClientQueue, Endianness, QueueEntry, QueueEntryStatus, QueueError, ENTRY_COUNT, ENTRY_LENGTH,
    QUEUE_LENGTH,
};
use crate::unit::ProjectInfo;

// Header
const OFFSET_VERSION: usize = 0;
const OFFSET_CURRENT_INDEX: usize = 4;
const OFFSET_ENTRIES: usize = 8;

// Per-entry field offsets
const ENTRY_STATUS: usize = 0;
const ENTRY_CORE_COUNT: usize = 4;
const ENTRY_BEGIN_TIME: usize = 8;
const ENTRY_END_TIME: usize = 12;
const ENTRY_SERVER_IP: usize = 16;
const ENTRY_SERVER_PORT: usize = 20;
const ENTRY_PROJECT: usize = 24;
const ENTRY_RUN: usize = 26;
const ENTRY_CLONE: usize = 28;
const ENTRY_GEN: usize = 30;
const ENTRY_BENCHMARK: usize = 32;
const ENTRY_CPU_TYPE: usize = 36;
const ENTRY_OS_TYPE: usize = 40;
const ENTRY_MEMORY: usize = 44;
const ENTRY_USER_ID: usize = 48;
const ENTRY_MACHINE_ID: usize = 56;
const ENTRY_TAG: usize = 60;
const ENTRY_TAG_LENGTH: usize = 16;

// Trailing statistics block
const OFFSET_STATS: usize = OFFSET_ENTRIES + ENTRY_COUNT * ENTRY_LENGTH;
const STATS_PERFORMANCE_FRACTION: usize = 0;
const STATS_DOWNLOAD_AVG: usize = 4;
const STATS_DOWNLOAD_WEIGHT: usize = 8;
const STATS_UPLOAD_AVG: usize = 12;
const STATS_UPLOAD_WEIGHT: usize = 16;

/// Queue timestamps count seconds from 2000-01-01 00:00:00 UTC.
const QUEUE_EPOCH_UNIX: i64 = 946_684_800;

/// Decode a full queue snapshot.
///
/// All-or-nothing: anything but an exact `QUEUE_LENGTH` buffer with a
/// plausible current index is an error, and the caller treats every error
/// as the single "queue unavailable" outcome.
pub fn decode(bytes: &[u8], endianness: Endianness) -> Result<ClientQueue, QueueError> {
    if bytes.len() != QUEUE_LENGTH {
        return Err(QueueError::WrongSize(bytes.len()));
    }

    let version = u32_at(bytes, OFFSET_VERSION, endianness);
    let current_index = u32_at(bytes, OFFSET_CURRENT_INDEX, endianness);
    if current_index as usize >= ENTRY_COUNT {
        return Err(QueueError::IndexOutOfRange(current_index));
    }

    let mut entries = Vec::with_capacity(ENTRY_COUNT);
    for slot in 0..ENTRY_COUNT {
        let start = OFFSET_ENTRIES + slot * ENTRY_LENGTH;
        let record = &bytes[start..start + ENTRY_LENGTH];
        entries.push(decode_entry(
            record,
            endianness,
            slot == current_index as usize,
        ));
    }

    let stats = &bytes[OFFSET_STATS..];
    Ok(ClientQueue {
        version,
        current_index,
        entries,
        performance_fraction: f32_at(stats, STATS_PERFORMANCE_FRACTION, endianness),
        download_rate_avg: f32_at(stats, STATS_DOWNLOAD_AVG, endianness),
        download_rate_unit_weight: u32_at(stats, STATS_DOWNLOAD_WEIGHT, endianness),
        upload_rate_avg: f32_at(stats, STATS_UPLOAD_AVG, endianness),
        upload_rate_unit_weight: u32_at(stats, STATS_UPLOAD_WEIGHT, endianness),
    })
}

fn decode_entry(record: &[u8], endianness: Endianness, is_current: bool) -> QueueEntry {
    let raw_status = u32_at(record, ENTRY_STATUS, endianness);
    let project = ProjectInfo::new(
        u16_at(record, ENTRY_PROJECT, endianness) as u32,
        u16_at(record, ENTRY_RUN, endianness) as u32,
        u16_at(record, ENTRY_CLONE, endianness) as u32,
        u16_at(record, ENTRY_GEN, endianness) as u32,
    );
    let begin_raw = u32_at(record, ENTRY_BEGIN_TIME, endianness);
    let end_raw = u32_at(record, ENTRY_END_TIME, endianness);
    let begin_utc = epoch_time(begin_raw);
    let end_utc = epoch_time(end_raw);

    let ip = &record[ENTRY_SERVER_IP..ENTRY_SERVER_IP + 4];
    QueueEntry {
        status: derive_status(raw_status, project.is_known(), begin_raw != 0, is_current),
        begin_local: begin_utc.map(|t| t.with_timezone(&Local)),
        begin_utc,
        end_local: end_utc.map(|t| t.with_timezone(&Local)),
        end_utc,
        project,
        server: Ipv4Addr::new(ip[0], ip[1], ip[2], ip[3]),
        port: u32_at(record, ENTRY_SERVER_PORT, endianness),
        cpu_type: u32_at(record, ENTRY_CPU_TYPE, endianness),
        os_type: u32_at(record, ENTRY_OS_TYPE, endianness),
        core_count: u32_at(record, ENTRY_CORE_COUNT, endianness),
        benchmark: u32_at(record, ENTRY_BENCHMARK, endianness),
        memory_mib: u32_at(record, ENTRY_MEMORY, endianness),
        user_id: u64_at(record, ENTRY_USER_ID, endianness),
        machine_id: u32_at(record, ENTRY_MACHINE_ID, endianness),
        tag: tag_at(record, ENTRY_TAG),
    }
}

/// Raw status word 0-4 -> slot status. Raw 0 is overloaded in the legacy
/// format and resolves by entry contents: a known project means the slot
/// finished, a begin time without a project means it was deleted, and a
/// blank entry is empty.
fn derive_status(
    raw: u32,
    project_known: bool,
    begin_set: bool,
    is_current: bool,
) -> QueueEntryStatus {
    match raw {
        0 if project_known => QueueEntryStatus::Finished,
        0 if begin_set => QueueEntryStatus::Deleted,
        0 => QueueEntryStatus::Empty,
        1 if is_current => QueueEntryStatus::FoldingNow,
        1 => QueueEntryStatus::Queued,
        2 => QueueEntryStatus::ReadyForUpload,
        3 => QueueEntryStatus::Abandoned,
        4 => QueueEntryStatus::FetchingFromServer,
        _ => QueueEntryStatus::Garbage,
    }
}

fn epoch_time(raw: u32) -> Option<DateTime<Utc>> {
    if raw == 0 {
        return None;
    }
    DateTime::from_timestamp(QUEUE_EPOCH_UNIX + i64::from(raw), 0)
}

/// Fixed-length text field, trimmed at the first NUL.
fn tag_at(record: &[u8], offset: usize) -> String {
    let field = &record[offset..offset + ENTRY_TAG_LENGTH];
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

fn u16_at(buf: &[u8], offset: usize, endianness: Endianness) -> u16 {
    let mut b = [0u8; 2];
    b.copy_from_slice(&buf[offset..offset + 2]);
    match endianness {
        Endianness::Little => u16::from_le_bytes(b),
        Endianness::Big => u16::from_be_bytes(b),
    }
}

fn u32_at(buf: &[u8], offset: usize, endianness: Endianness) -> u32 {
    let mut b = [0u8; 4];
    b.copy_from_slice(&buf[offset..offset + 4]);
    match endianness {
        Endianness::Little => u32::from_le_bytes(b),
        Endianness::Big => u32::from_be_bytes(b),
    }
}

fn u64_at(buf: &[u8], offset: usize, endianness: Endianness) -> u64 {
    let mut b = [0u8; 8];
    b.copy_from_slice(&buf[offset..offset + 8]);
    match endianness {
        Endianness::Little => u64::from_le_bytes(b),
        Endianness::Big => u64::from_be_bytes(b),
    }
}

fn f32_at(buf: &[u8], offset: usize, endianness: Endianness) -> f32 {
    f32::from_bits(u32_at(buf, offset, endianness))
}
