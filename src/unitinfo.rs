//! Secondary status file (`unitinfo.txt`) parsing.
//!
//! A handful of `Key: value` lines the client rewrites while folding.
//! Parsing is tolerant: unknown keys are skipped, unparsable values become
//! `None`, and an empty or garbled file yields an all-unknown record. The
//! file's timestamps omit the year, so the parser takes an explicit
//! reference year instead of consulting the system clock.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use crate::unit::ProjectInfo;

/// Data extracted from the secondary status file.
///
/// The project identity is parsed wholly from the protein tag or not at
/// all - it is never partially populated.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UnitInfoLogData {
    pub protein_name: Option<String>,
    pub protein_tag: Option<String>,
    pub download_time: Option<DateTime<Utc>>,
    pub due_time: Option<DateTime<Utc>>,
    pub project: Option<ProjectInfo>,
}

/// Parse the key/value status file content.
pub fn parse(content: &str, reference_year: i32) -> UnitInfoLogData {
    let mut data = UnitInfoLogData::default();

    for line in content.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match key.trim() {
            "Name" => data.protein_name = Some(value.to_string()),
            "Tag" => {
                data.protein_tag = Some(value.to_string());
                data.project = parse_tag(value);
            }
            "Download Time" => data.download_time = parse_datetime(value, reference_year),
            "Due Time" | "Due Date" => data.due_time = parse_datetime(value, reference_year),
            _ => {}
        }
    }

    data
}

/// Parse a protein tag like `P2677R10C29G28` into a project identity.
/// All four components must be present; otherwise the identity stays
/// unknown (atomicity invariant).
fn parse_tag(tag: &str) -> Option<ProjectInfo> {
    let rest = tag.strip_prefix('P')?;
    let (project, rest) = split_number(rest)?;
    let rest = rest.strip_prefix('R')?;
    let (run, rest) = split_number(rest)?;
    let rest = rest.strip_prefix('C')?;
    let (clone, rest) = split_number(rest)?;
    let rest = rest.strip_prefix('G')?;
    let (gen, rest) = split_number(rest)?;
    if !rest.is_empty() {
        return None;
    }
    Some(ProjectInfo::new(project, run, clone, gen))
}

fn split_number(s: &str) -> Option<(u32, &str)> {
    let end = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    Some((s[..end].parse().ok()?, &s[end..]))
}

/// Parse `May 28 11:41:31` style timestamps, attaching the reference year.
/// Both full and abbreviated month names occur in the wild.
fn parse_datetime(value: &str, reference_year: i32) -> Option<DateTime<Utc>> {
    let with_year = format!("{reference_year} {value}");
    let parsed = NaiveDateTime::parse_from_str(&with_year, "%Y %B %d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(&with_year, "%Y %b %d %H:%M:%S"))
        .ok()?;
    // Status-file times are recorded in UTC by the client
    Some(DateTime::from_naive_utc_and_offset(parsed, Utc))
}
