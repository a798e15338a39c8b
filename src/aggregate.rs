//! Three-way work-unit aggregation.
//!
//! One invocation per monitored client per retrieval cycle: classified log
//! slices, the decoded queue snapshot and the secondary status file are
//! reconciled into an ordered array of canonical unit records. All
//! data-quality problems degrade (null slots, log-only mode, diagnostics);
//! only a log with no runs at all is a hard error.
//!
//! Merge precedence per field: queue entry (unless its status carries no
//! unit data) -> secondary file -> log slice. Project identity specifically:
//! queue -> log -> secondary. A merged identity that no source corroborates
//! rejects the slot, so frame data is never presented against the wrong
//! work unit - except the current slot, which is rebuilt from the broadest
//! log slice instead of being dropped.

use crate::diag::DiagnosticSink;
use crate::fahlog::{
    self, ClientRun, FahLogUnitData, LogLine, LogParseError, UnitIndex,
};
use crate::frames::FrameTracker;
use crate::queue::{self, ClientQueue, Endianness, QueueEntry, ENTRY_COUNT};
use crate::unit::{ClientStatus, ProjectInfo, UnitInfo};
use crate::unitinfo::{self, UnitInfoLogData};

/// Number of synthesized slots when the queue snapshot is unavailable:
/// "previous" and "current".
pub const LOG_ONLY_SLOTS: usize = 2;

/// Everything one retrieval cycle produces.
#[derive(Debug)]
pub struct AggregateResult {
    /// 10 slots in queue mode, 2 in log-only mode; rejected or empty slots
    /// are `None`.
    pub units: Vec<Option<UnitInfo>>,
    /// Index into `units` of the slot being folded right now.
    pub current_unit_index: usize,
    /// Decoded snapshot, absent in log-only mode.
    pub queue: Option<ClientQueue>,
    /// Every client run found in the log, oldest first. The last run is the
    /// one the cycle aggregated against.
    pub runs: Vec<ClientRun>,
    /// Client state resolved for the cycle.
    pub current_status: ClientStatus,
    pub log_only: bool,
}

impl AggregateResult {
    /// The run this cycle aggregated against.
    pub fn current_run(&self) -> &ClientRun {
        // segment() guarantees at least one run
        &self.runs[self.runs.len() - 1]
    }

    pub fn current_unit(&self) -> Option<&UnitInfo> {
        self.units.get(self.current_unit_index)?.as_ref()
    }
}

/// Reconciles the three artifact sources for one client.
///
/// Holds no state between invocations beyond its configuration; safe to
/// share across threads for distinct clients.
pub struct UnitDataAggregator<'a> {
    diag: &'a dyn DiagnosticSink,
    endianness: Endianness,
    reference_year: i32,
}

impl<'a> UnitDataAggregator<'a> {
    pub fn new(diag: &'a dyn DiagnosticSink) -> Self {
        Self {
            diag,
            endianness: Endianness::default(),
            reference_year: 2000,
        }
    }

    /// Byte-order policy for the queue snapshot.
    pub fn endianness(mut self, endianness: Endianness) -> Self {
        self.endianness = endianness;
        self
    }

    /// Year attached to the secondary file's year-less timestamps. Callers
    /// should pass the year the artifacts were retrieved.
    pub fn reference_year(mut self, year: i32) -> Self {
        self.reference_year = year;
        self
    }

    /// Run one aggregation cycle over already-read artifact content.
    ///
    /// `queue_bytes`/`unitinfo_text` are optional: absence (or an
    /// undecodable snapshot) is a normal degraded condition, not an error.
    ///
    /// # Errors
    ///
    /// `LogParseError::NoRunsFound` when the log has no run-start marker.
    pub fn aggregate(
        &self,
        log_text: &str,
        queue_bytes: Option<&[u8]>,
        unitinfo_text: Option<&str>,
    ) -> Result<AggregateResult, LogParseError> {
        let lines = fahlog::classify_all(log_text);
        let runs = fahlog::segment(&lines)?;
        let run = &runs[runs.len() - 1];

        let queue = match queue_bytes {
            None => {
                self.diag.warn("queue unavailable: no snapshot provided");
                None
            }
            Some(bytes) => match queue::decode(bytes, self.endianness) {
                Ok(queue) => Some(queue),
                Err(err) => {
                    self.diag.warn(&format!("queue unavailable: {err}"));
                    None
                }
            },
        };

        let mut result = match &queue {
            Some(queue) => self.queue_mode(queue, run, &lines, unitinfo_text),
            None => self.log_only_mode(run, &lines, unitinfo_text),
        };
        result.queue = queue;
        result.runs = runs;
        Ok(result)
    }

    /// One slot per queue entry; the secondary file only informs the slot
    /// the queue says is current.
    fn queue_mode(
        &self,
        queue: &ClientQueue,
        run: &ClientRun,
        lines: &[LogLine],
        unitinfo_text: Option<&str>,
    ) -> AggregateResult {
        let current_index = queue.current_index as usize;
        let mut units = Vec::with_capacity(ENTRY_COUNT);
        let mut current_status = ClientStatus::Unknown;

        for slot in 0..ENTRY_COUNT {
            let entry = &queue.entries[slot];
            let is_current = slot == current_index;

            let log_data = run
                .unit_index_for_slot(slot as u8)
                .map(|index| fahlog::extract_unit_data(slot_slice(lines, index)));
            let info_data = if is_current {
                unitinfo_text.map(|text| unitinfo::parse(text, self.reference_year))
            } else {
                None
            };

            if !entry.status.has_unit_data() && log_data.is_none() && !is_current {
                units.push(None);
                continue;
            }

            let mut unit = self.build_unit(run, Some(entry), log_data.as_ref(), info_data.as_ref(), false);
            let corroborated = project_is_corroborated(unit.project, log_data.as_ref(), info_data.as_ref());

            let built = if corroborated {
                apply_frames(&mut unit, log_data.as_ref());
                if is_current {
                    current_status = slice_status(log_data.as_ref());
                }
                Some(unit)
            } else if is_current {
                // The current slot is never silently dropped
                self.diag.verbose(&format!(
                    "slot {slot} project {} not corroborated; rebuilding from broadest log slice",
                    unit.project
                ));
                let (rescued, status) = self.rescue_current(run, lines, Some(entry), info_data);
                current_status = status;
                Some(rescued)
            } else {
                self.diag.verbose(&format!(
                    "slot {slot} rejected: merged project {} matches neither log history nor status file",
                    unit.project
                ));
                None
            };
            units.push(built);
        }

        if current_status == ClientStatus::Unknown {
            current_status = fahlog::extract_unit_data(&lines[run.start_index..]).status;
        }

        AggregateResult {
            units,
            current_unit_index: current_index,
            queue: None,
            runs: Vec::new(),
            current_status,
            log_only: false,
        }
    }

    /// Degraded mode: synthesize a "previous" and a "current" slot from the
    /// log alone.
    fn log_only_mode(
        &self,
        run: &ClientRun,
        lines: &[LogLine],
        unitinfo_text: Option<&str>,
    ) -> AggregateResult {
        let info_data = unitinfo_text.map(|text| unitinfo::parse(text, self.reference_year));
        let open = run.open_unit_index();

        let previous = open
            .and_then(|open| {
                run.unit_indexes
                    .iter()
                    .rev()
                    .find(|index| index.start_index < open.start_index)
            })
            .and_then(|index| {
                let log_data = fahlog::extract_unit_data(slot_slice(lines, index));
                let mut unit = self.build_unit(run, None, Some(&log_data), None, false);
                if project_is_corroborated(unit.project, Some(&log_data), None) {
                    apply_frames(&mut unit, Some(&log_data));
                    Some(unit)
                } else {
                    self.diag
                        .verbose("previous slot rejected: no project identity in its log slice");
                    None
                }
            });

        let (current, current_status) = match open {
            Some(index) => {
                let log_data = fahlog::extract_unit_data(slot_slice(lines, index));
                let mut unit = self.build_unit(run, None, Some(&log_data), info_data.as_ref(), false);
                if project_is_corroborated(unit.project, Some(&log_data), info_data.as_ref()) {
                    apply_frames(&mut unit, Some(&log_data));
                    (unit, log_data.status)
                } else {
                    self.rescue_current(run, lines, None, info_data)
                }
            }
            None => {
                // No open slot: fall back to the whole current-run slice,
                // flagged as an override build.
                self.rescue_current(run, lines, None, info_data)
            }
        };

        AggregateResult {
            units: vec![previous, Some(current)],
            current_unit_index: LOG_ONLY_SLOTS - 1,
            queue: None,
            runs: Vec::new(),
            current_status,
            log_only: true,
        }
    }

    /// Rebuild the current slot from the broadest available slice: the
    /// still-open slot slice, or failing that the entire current run. If
    /// the derived status says the client is fetching a new assignment,
    /// log and secondary data are reset to empty first so a transitional
    /// state never fabricates plausible-looking stale data.
    fn rescue_current(
        &self,
        run: &ClientRun,
        lines: &[LogLine],
        entry: Option<&QueueEntry>,
        info_data: Option<UnitInfoLogData>,
    ) -> (UnitInfo, ClientStatus) {
        let broad = match run.open_unit_index() {
            Some(index) => slot_slice(lines, index),
            None => &lines[run.start_index..],
        };
        let mut log_data = fahlog::extract_unit_data(broad);
        let mut info = info_data;
        let status = log_data.status;
        if status == ClientStatus::GettingWorkPacket {
            log_data = FahLogUnitData {
                status,
                ..FahLogUnitData::default()
            };
            info = None;
        }
        let mut unit = self.build_unit(run, entry, Some(&log_data), info.as_ref(), true);
        apply_frames(&mut unit, Some(&log_data));
        (unit, status)
    }

    /// Field-by-field merge of the three sources for one slot.
    fn build_unit(
        &self,
        run: &ClientRun,
        entry: Option<&QueueEntry>,
        log: Option<&FahLogUnitData>,
        info: Option<&UnitInfoLogData>,
        match_override: bool,
    ) -> UnitInfo {
        // Skip-status entries contribute no fields at all
        let entry = entry.filter(|e| e.status.has_unit_data());

        let project = entry
            .map(|e| e.project)
            .filter(|p| p.is_known())
            .or_else(|| log.and_then(|d| d.project()))
            .or_else(|| info.and_then(|i| i.project))
            .unwrap_or_default();

        UnitInfo {
            project,
            user_name: run.user_name.clone(),
            team: run.team,
            download_time: entry
                .and_then(|e| e.begin_utc)
                .or_else(|| info.and_then(|i| i.download_time)),
            // The snapshot carries no deadline; only the status file does
            due_time: info.and_then(|i| i.due_time),
            finished_time: entry.and_then(|e| e.end_utc),
            core_version: log.and_then(|d| d.core_version.clone()),
            protein_name: info.and_then(|i| i.protein_name.clone()),
            protein_tag: entry
                .map(|e| e.tag.clone())
                .filter(|tag| !tag.is_empty())
                .or_else(|| info.and_then(|i| i.protein_tag.clone())),
            result: log.map(|d| d.result).unwrap_or_default(),
            match_override,
            ..UnitInfo::default()
        }
    }
}

/// The merged identity must appear in the slice's project history or match
/// the status file's identity.
fn project_is_corroborated(
    project: ProjectInfo,
    log: Option<&FahLogUnitData>,
    info: Option<&UnitInfoLogData>,
) -> bool {
    log.is_some_and(|d| d.project_history.contains(&project))
        || info.and_then(|i| i.project).is_some_and(|p| p == project)
}

fn apply_frames(unit: &mut UnitInfo, log: Option<&FahLogUnitData>) {
    if let Some(log) = log {
        let mut tracker = FrameTracker::new(unit);
        for observation in &log.frames {
            tracker.record(observation);
        }
    }
}

fn slice_status(log: Option<&FahLogUnitData>) -> ClientStatus {
    log.map(|d| d.status).unwrap_or_default()
}

/// The line range a unit index covers; open indexes run to the end of the
/// log since we only aggregate against the last run.
fn slot_slice<'l>(lines: &'l [LogLine], index: &UnitIndex) -> &'l [LogLine] {
    &lines[index.start_index..index.end_index.unwrap_or(lines.len())]
}
