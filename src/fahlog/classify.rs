//! Log line classifier.
//!
//! One raw line of text in, one typed `LogLine` out, never an error. The
//! marker set is the vendor v5/v6 log format and lives in a single ordered
//! rule table: adding a format is adding a row, not editing control flow.
//! First matching rule wins; a matched rule whose payload fails to parse
//! still yields the kind, just without data.

use chrono::NaiveTime;

use super::types::{LineData, LogLine, LogLineKind};
use crate::unit::{FrameObservation, ProjectInfo, UnitResult};

type PayloadParser = fn(&str, Option<NaiveTime>) -> Option<LineData>;

struct Rule {
    marker: &'static str,
    kind: LogLineKind,
    payload: Option<PayloadParser>,
}

/// Ordered marker table. `Folding@Home Client Version` must precede the bare
/// core-banner `Version` marker; the other markers do not overlap.
static RULES: &[Rule] = &[
    Rule {
        marker: "--- Opening Log file",
        kind: LogLineKind::LogOpen,
        payload: None,
    },
    Rule {
        marker: "Folding@Home Client Version",
        kind: LogLineKind::ClientVersion,
        payload: Some(parse_client_version),
    },
    Rule {
        marker: "Arguments:",
        kind: LogLineKind::ClientArguments,
        payload: Some(parse_arguments),
    },
    Rule {
        marker: "- User name:",
        kind: LogLineKind::ClientUserNameTeam,
        payload: Some(parse_user_name_team),
    },
    Rule {
        marker: "- User ID:",
        kind: LogLineKind::ClientUserId,
        payload: Some(parse_user_id),
    },
    Rule {
        marker: "- Machine ID:",
        kind: LogLineKind::ClientMachineId,
        payload: Some(parse_machine_id),
    },
    Rule {
        marker: "+ Attempting to get work packet",
        kind: LogLineKind::ClientAttemptGetWorkPacket,
        payload: None,
    },
    Rule {
        marker: "+ Processing work unit",
        kind: LogLineKind::WorkUnitProcessing,
        payload: None,
    },
    Rule {
        marker: "+ Downloading core",
        kind: LogLineKind::WorkUnitCoreDownload,
        payload: None,
    },
    Rule {
        marker: "Working on queue slot",
        kind: LogLineKind::WorkUnitWorking,
        payload: Some(parse_queue_slot),
    },
    Rule {
        marker: "Working on Unit",
        kind: LogLineKind::WorkUnitWorking,
        payload: Some(parse_queue_slot),
    },
    Rule {
        marker: "Project:",
        kind: LogLineKind::WorkUnitProject,
        payload: Some(parse_project),
    },
    Rule {
        marker: "Completed ",
        kind: LogLineKind::WorkUnitFrame,
        payload: Some(parse_frame),
    },
    Rule {
        marker: "Version",
        kind: LogLineKind::WorkUnitCoreVersion,
        payload: Some(parse_core_version),
    },
    Rule {
        marker: "+ Paused",
        kind: LogLineKind::WorkUnitPaused,
        payload: None,
    },
    Rule {
        marker: "+ Running",
        kind: LogLineKind::WorkUnitResumed,
        payload: None,
    },
    Rule {
        marker: "Folding@Home will go to sleep for 1 day",
        kind: LogLineKind::ClientEuePause,
        payload: None,
    },
    Rule {
        marker: "Folding@home Core Shutdown:",
        kind: LogLineKind::WorkUnitCoreShutdown,
        payload: Some(parse_unit_result),
    },
    Rule {
        marker: "+ Number of Units Completed:",
        kind: LogLineKind::ClientNumberOfUnitsCompleted,
        payload: Some(parse_units_completed),
    },
    Rule {
        marker: "Folding@Home Client Shutdown",
        kind: LogLineKind::ClientShutdown,
        payload: None,
    },
];

/// Classify a single raw log line. Never fails: lines that match no marker
/// come back as `LogLineKind::Unknown` with no payload.
pub fn classify(index: usize, raw: &str) -> LogLine {
    let trimmed = raw.trim_end();
    let (timestamp, body) = strip_time_prefix(trimmed);

    for rule in RULES {
        if body.starts_with(rule.marker) {
            let data = rule.payload.and_then(|parse| parse(body, timestamp));
            return LogLine {
                index,
                kind: rule.kind,
                raw: raw.to_string(),
                timestamp,
                data,
            };
        }
    }

    LogLine {
        index,
        kind: LogLineKind::Unknown,
        raw: raw.to_string(),
        timestamp,
        data: None,
    }
}

/// Classify every line of an already-loaded log buffer, in order.
pub fn classify_all(text: &str) -> Vec<LogLine> {
    text.lines()
        .enumerate()
        .map(|(index, raw)| classify(index, raw))
        .collect()
}

/// Split the `[HH:MM:SS] ` wall-clock prefix off a line, when present.
fn strip_time_prefix(line: &str) -> (Option<NaiveTime>, &str) {
    let bytes = line.as_bytes();
    if bytes.len() >= 10 && bytes[0] == b'[' && bytes[9] == b']' {
        if let Ok(time) = NaiveTime::parse_from_str(&line[1..9], "%H:%M:%S") {
            return (Some(time), line[10..].trim_start());
        }
    }
    (None, line.trim_start())
}

fn rest_after(body: &str, marker: &str) -> Option<String> {
    body.strip_prefix(marker)
        .map(|rest| rest.trim().to_string())
        .filter(|rest| !rest.is_empty())
}

fn parse_client_version(body: &str, _time: Option<NaiveTime>) -> Option<LineData> {
    rest_after(body, "Folding@Home Client Version").map(LineData::ClientVersion)
}

fn parse_arguments(body: &str, _time: Option<NaiveTime>) -> Option<LineData> {
    rest_after(body, "Arguments:").map(LineData::Arguments)
}

/// `- User name: harlam357 (Team 32)`
fn parse_user_name_team(body: &str, _time: Option<NaiveTime>) -> Option<LineData> {
    let rest = body.strip_prefix("- User name:")?.trim();
    let open = rest.rfind("(Team ")?;
    let user_name = rest[..open].trim().to_string();
    let team = rest[open + 6..].strip_suffix(')')?.trim().parse().ok()?;
    if user_name.is_empty() {
        return None;
    }
    Some(LineData::UserNameTeam { user_name, team })
}

fn parse_user_id(body: &str, _time: Option<NaiveTime>) -> Option<LineData> {
    rest_after(body, "- User ID:").map(LineData::UserId)
}

fn parse_machine_id(body: &str, _time: Option<NaiveTime>) -> Option<LineData> {
    let rest = body.strip_prefix("- Machine ID:")?.trim();
    rest.parse().ok().map(LineData::MachineId)
}

/// `Working on queue slot 01 [June 1 12:00:00]` / `Working on Unit 01`.
/// Slot numbers above 9 do not exist in the snapshot and are rejected.
fn parse_queue_slot(body: &str, _time: Option<NaiveTime>) -> Option<LineData> {
    let rest = body
        .strip_prefix("Working on queue slot")
        .or_else(|| body.strip_prefix("Working on Unit"))?
        .trim_start();
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    let slot: u8 = digits.parse().ok()?;
    if slot > 9 {
        return None;
    }
    Some(LineData::QueueSlot(slot))
}

/// `Project: 2677 (Run 10, Clone 29, Gen 28)`
fn parse_project(body: &str, _time: Option<NaiveTime>) -> Option<LineData> {
    let rest = body.strip_prefix("Project:")?.trim();
    let (project_str, parens) = rest.split_once('(')?;
    let project = project_str.trim().parse().ok()?;
    let inner = parens.strip_suffix(')')?;
    let mut run = None;
    let mut clone = None;
    let mut gen = None;
    for part in inner.split(',') {
        let part = part.trim();
        if let Some(value) = part.strip_prefix("Run ") {
            run = value.trim().parse().ok();
        } else if let Some(value) = part.strip_prefix("Clone ") {
            clone = value.trim().parse().ok();
        } else if let Some(value) = part.strip_prefix("Gen ") {
            gen = value.trim().parse().ok();
        }
    }
    Some(LineData::Project(ProjectInfo::new(
        project, run?, clone?, gen?,
    )))
}

/// `Completed 2500 out of 250000 steps  (1%)` or `Completed 25%`.
///
/// The frame id is the reported percent in both shapes; percent-only lines
/// synthesize raw counts out of 100. A frame line without a wall-clock
/// prefix cannot seed duration arithmetic and parses to no payload.
fn parse_frame(body: &str, time: Option<NaiveTime>) -> Option<LineData> {
    let timestamp = time?;
    let rest = body.strip_prefix("Completed ")?.trim();

    if let Some((counts, tail)) = rest.split_once(" out of ") {
        let raw_complete = counts.trim().parse().ok()?;
        let (total_str, percent_tail) = tail.split_once("steps")?;
        let raw_total = total_str.trim().parse().ok()?;
        let percent = parse_parenthesized_percent(percent_tail)?;
        return Some(LineData::Frame(FrameObservation {
            id: percent,
            raw_complete,
            raw_total,
            timestamp,
        }));
    }

    let percent_str = rest.strip_suffix('%')?.trim();
    let percent: i32 = percent_str.parse().ok()?;
    Some(LineData::Frame(FrameObservation {
        id: percent,
        raw_complete: percent.max(0) as u32,
        raw_total: 100,
        timestamp,
    }))
}

fn parse_parenthesized_percent(tail: &str) -> Option<i32> {
    let open = tail.find('(')?;
    let close = tail[open..].find(')')? + open;
    tail[open + 1..close].trim().strip_suffix('%')?.parse().ok()
}

/// Core banner `Version 2.27 (Dec. 15, 2010)`.
fn parse_core_version(body: &str, _time: Option<NaiveTime>) -> Option<LineData> {
    let rest = body.strip_prefix("Version")?.trim_start();
    let version: String = rest
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    // Require a dotted numeric like "2.27" so stray "Version" prose is skipped
    if version.contains('.') && !version.ends_with('.') {
        Some(LineData::CoreVersion(version))
    } else {
        None
    }
}

fn parse_unit_result(body: &str, _time: Option<NaiveTime>) -> Option<LineData> {
    let token = body.strip_prefix("Folding@home Core Shutdown:")?.trim();
    Some(LineData::UnitResult(UnitResult::from_token(token)))
}

fn parse_units_completed(body: &str, _time: Option<NaiveTime>) -> Option<LineData> {
    let rest = body.strip_prefix("+ Number of Units Completed:")?.trim();
    rest.parse().ok().map(LineData::UnitsCompleted)
}
