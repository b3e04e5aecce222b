//! `snapraid status` parsing.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::{smart, Line};
use crate::error::ParseError;
use crate::report::{ArrayAggregate, DiskRecord, Report, ScrubAge};

static SCRUB_AGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"The oldest block was scrubbed (\d+) days ago, the median (\d+), the newest (\d+)",
    )
    .expect("scrub age pattern compiles")
});

static NOT_SCRUBBED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)% of the array is not scrubbed")
        .expect("not scrubbed pattern compiles")
});

/// Parses `snapraid status` output.
///
/// Besides the disk table and the summary sentences, a SMART table printed
/// in the same report is picked up and merged into the disks by name.
///
/// # Errors
///
/// Returns an error if a table row or a recognized summary line cannot be
/// coerced, or if a disk is listed twice.
pub fn parse(text: &str) -> Result<Report, ParseError> {
    let lines = Line::all(text);

    let mut disks = vec![];
    let mut smart_rows = vec![];
    let mut array = ArrayAggregate::default();

    let mut i = 0;
    while i < lines.len() {
        let line = &lines[i];

        if is_disk_table_header(line) {
            i = parse_disk_table(&lines, i, &mut disks, &mut array)?;
            continue;
        }

        if smart::is_table_header(line) {
            i = smart::parse_table(&lines, i, &mut smart_rows)?;
            continue;
        }

        parse_summary_line(line, &mut array)?;

        i += 1;
    }

    merge_smart(&mut disks, smart_rows)?;

    let array = (!array.is_empty()).then_some(array);

    Ok(Report {
        disks,
        array,
        diff: None,
    })
}

/// Merges SMART rows into the status table disks of the same name. Rows
/// without a status table disk are appended.
fn merge_smart(
    disks: &mut Vec<DiskRecord>,
    rows: Vec<smart::Row<'_>>,
) -> Result<(), ParseError> {
    let status_disks = disks.len();
    let mut merged = vec![false; status_disks];

    for smart::Row { line, disk } in rows {
        let known = disks[..status_disks]
            .iter()
            .position(|known| disk.name != "-" && known.name == disk.name);

        let Some(i) = known else {
            disks.push(disk);
            continue;
        };

        if merged[i] {
            return Err(line.duplicate(format!(
                "SMART data for disk {} is listed more than once",
                disk.name
            )));
        }

        merged[i] = true;
        disks[i].merge(disk);
    }

    Ok(())
}

fn is_disk_table_header(line: &Line<'_>) -> bool {
    line.text.contains("Files Fragmented Excess")
}

fn is_numeric(token: &str) -> bool {
    token.bytes().next().is_some_and(|b| b.is_ascii_digit())
}

/// Parses the disk table whose header is at `header`, including the totals
/// line below it.
///
/// Returns the index of the first line after the table.
fn parse_disk_table(
    lines: &[Line<'_>],
    header: usize,
    disks: &mut Vec<DiskRecord>,
    array: &mut ArrayAggregate,
) -> Result<usize, ParseError> {
    let mut i = header + 1;

    // units line
    if lines
        .get(i)
        .and_then(|line| line.tokens().first().copied())
        .is_some_and(|token| !is_numeric(token.text) && token.text != "-")
    {
        i += 1;
    }

    while i < lines.len() {
        let line = &lines[i];
        i += 1;

        if line.is_divider() {
            break;
        }

        if line.is_blank() {
            continue;
        }

        let disk = parse_disk_row(line)?;

        if disks.iter().any(|known| known.name == disk.name) {
            return Err(line.duplicate(format!(
                "disk {} is listed more than once",
                disk.name
            )));
        }

        disks.push(disk);
    }

    while lines.get(i).is_some_and(Line::is_blank) {
        i += 1;
    }

    if let Some(line) = lines.get(i) {
        let tokens = line.tokens();

        if tokens.first().is_some_and(|token| is_numeric(token.text)) {
            parse_totals(line, array)?;
            i += 1;
        } else {
            debug!(line = line.number, "status table has no totals line");
        }
    }

    Ok(i)
}

/// Space figures shared by disk rows and the totals line.
struct Figures {
    files: Option<u64>,
    fragmented_files: Option<u64>,
    excess_fragments: Option<u64>,
    used_bytes: Option<u64>,
    free_bytes: Option<u64>,
}

/// Parses `files fragmented excess wasted used free use%`.
fn parse_figures(
    line: &Line<'_>,
    tokens: &[&str],
) -> Result<Figures, ParseError> {
    let figures = Figures {
        files: line.count(tokens[0], "files")?,
        fragmented_files: line.count(tokens[1], "fragmented files")?,
        excess_fragments: line.count(tokens[2], "excess fragments")?,
        used_bytes: line.scaled(tokens[4], 9, "used GB")?,
        free_bytes: line.scaled(tokens[5], 9, "free GB")?,
    };

    line.validate_decimal(tokens[3], "wasted GB")?;
    line.percent(tokens[6], "use")?;

    Ok(figures)
}

fn parse_disk_row(line: &Line<'_>) -> Result<DiskRecord, ParseError> {
    let tokens = line
        .tokens()
        .into_iter()
        .map(|token| token.text)
        .collect::<Vec<_>>();

    if tokens.len() != 8 {
        return Err(line.malformed(format!(
            "expected 8 status fields, found {}",
            tokens.len()
        )));
    }

    let figures = parse_figures(line, &tokens)?;

    Ok(DiskRecord {
        files: figures.files,
        fragmented_files: figures.fragmented_files,
        excess_fragments: figures.excess_fragments,
        used_bytes: figures.used_bytes,
        free_bytes: figures.free_bytes,
        ..DiskRecord::named(tokens[7])
    })
}

fn parse_totals(
    line: &Line<'_>,
    array: &mut ArrayAggregate,
) -> Result<(), ParseError> {
    let tokens = line
        .tokens()
        .into_iter()
        .map(|token| token.text)
        .collect::<Vec<_>>();

    if tokens.len() != 7 {
        return Err(line.malformed(format!(
            "expected 7 status total fields, found {}",
            tokens.len()
        )));
    }

    let figures = parse_figures(line, &tokens)?;

    array.files = figures.files;
    array.fragmented_files = figures.fragmented_files;
    array.excess_fragments = figures.excess_fragments;
    array.used_bytes = figures.used_bytes;
    array.free_bytes = figures.free_bytes;

    Ok(())
}

/// The boolean status sentences.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Flag {
    SyncInProgress,
    ZeroSubsecondTimestamps,
    RehashNeeded,
    ErrorsDetected,
}

fn status_flag(text: &str) -> Option<(Flag, bool)> {
    let text = text.trim();

    let flag = if text.starts_with("No sync is in progress") {
        (Flag::SyncInProgress, false)
    } else if text.contains("sync in progress") {
        (Flag::SyncInProgress, true)
    } else if text.starts_with("No file has a zero sub-second timestamp") {
        (Flag::ZeroSubsecondTimestamps, false)
    } else if text.contains("zero sub-second timestamp") {
        (Flag::ZeroSubsecondTimestamps, true)
    } else if text.starts_with("No rehash is in progress or needed") {
        (Flag::RehashNeeded, false)
    } else if text.starts_with("No rehash is in progress")
        || text.contains("rehash in progress")
        || text.contains("rehash is needed")
    {
        (Flag::RehashNeeded, true)
    } else if text.starts_with("No error detected") {
        (Flag::ErrorsDetected, false)
    } else if text.starts_with("DANGER!")
        || (text.starts_with("There are") && text.contains("error"))
    {
        (Flag::ErrorsDetected, true)
    } else {
        return None;
    };

    Some(flag)
}

fn parse_summary_line(
    line: &Line<'_>,
    array: &mut ArrayAggregate,
) -> Result<(), ParseError> {
    if let Some(captures) = SCRUB_AGE.captures(line.text) {
        let age = |i: usize, what: &str| {
            line.count(&captures[i], what)
                .map(Option::unwrap_or_default)
        };

        array.scrub_age = Some(ScrubAge {
            oldest: age(1, "oldest scrub age")?,
            median: age(2, "median scrub age")?,
            newest: age(3, "newest scrub age")?,
        });
    } else if let Some(captures) = NOT_SCRUBBED.captures(line.text) {
        let percent = line
            .count(&captures[1], "not scrubbed percent")?
            .and_then(|percent| u32::try_from(percent).ok())
            .filter(|percent| *percent <= 100)
            .ok_or_else(|| {
                line.malformed("not scrubbed percent exceeds 100")
            })?;

        array.scrub_coverage_ratio = Some(f64::from(100 - percent) / 100.0);
    } else if line
        .text
        .contains("The full array was scrubbed at least one time")
    {
        array.scrub_coverage_ratio = Some(1.0);
    } else if let Some((flag, value)) = status_flag(line.text) {
        let slot = match flag {
            Flag::SyncInProgress => &mut array.flags.sync_in_progress,
            Flag::ZeroSubsecondTimestamps => {
                &mut array.flags.zero_subsecond_timestamps
            }
            Flag::RehashNeeded => &mut array.flags.rehash_needed,
            Flag::ErrorsDetected => &mut array.flags.errors_detected,
        };

        *slot = Some(value);
    } else if let Some(probability) = smart::array_failure_probability(line)?
    {
        array.failure_probability_percent = Some(probability);
    }

    Ok(())
}
