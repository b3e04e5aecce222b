//! `snapraid smart` parsing.
//!
//! The report is a table followed by the array failure probability:
//!
//! ```text
//!    Temp  Power   Error   FP Size
//!       C OnDays   Count        TB  Serial    Device    Disk
//!  -----------------------------------------------------------------------
//!      29   1307       0   4%  3.0  W1F0ABCD  /dev/sdb  d1
//!  -----------------------------------------------------------------------
//!
//! Probability that at least one disk is going to fail in the next year is 20%.
//! ```

use tracing::debug;

use super::{Line, Token};
use crate::error::ParseError;
use crate::report::{ArrayAggregate, DiskRecord, Report};

/// Words `snapraid` prints in the error column instead of a count when the
/// disk health check or the SMART error log reports a problem.
const HEALTH_FLAGS: [&str; 4] = ["FAIL", "PREFAIL", "logfail", "logerr"];

/// Parses `snapraid smart` output.
///
/// # Errors
///
/// Returns an error if a table row or the failure probability line cannot
/// be coerced, or if a disk is listed twice.
pub fn parse(text: &str) -> Result<Report, ParseError> {
    let lines = Line::all(text);

    let mut rows = vec![];
    let mut array = ArrayAggregate::default();

    let mut i = 0;
    while i < lines.len() {
        let line = &lines[i];

        if is_table_header(line) {
            i = parse_table(&lines, i, &mut rows)?;
            continue;
        }

        if let Some(probability) = array_failure_probability(line)? {
            array.failure_probability_percent = Some(probability);
        }

        i += 1;
    }

    let array = (!array.is_empty()).then_some(array);

    Ok(Report {
        disks: rows.into_iter().map(|row| row.disk).collect(),
        array,
        diff: None,
    })
}

/// Returns `true` for the first header line of a SMART table.
pub(crate) fn is_table_header(line: &Line<'_>) -> bool {
    let tokens = line.tokens();

    tokens.first().is_some_and(|token| token.text == "Temp")
        && tokens.iter().any(|token| token.text == "Power")
}

/// A parsed SMART table row and the line it came from.
#[derive(Debug)]
pub(crate) struct Row<'a> {
    pub line: Line<'a>,
    pub disk: DiskRecord,
}

/// Parses the SMART table whose header is at `header`, appending its rows.
///
/// Returns the index of the first line after the table.
pub(crate) fn parse_table<'a>(
    lines: &[Line<'a>],
    header: usize,
    rows: &mut Vec<Row<'a>>,
) -> Result<usize, ParseError> {
    let columns = Columns::from_header(&lines[header])?;

    let divider = lines
        .iter()
        .enumerate()
        .skip(header + 1)
        .take(3)
        .find(|(_, line)| line.is_divider())
        .map(|(i, _)| i);

    let mut i = divider.map_or(header + 2, |i| i + 1);

    while i < lines.len() {
        let line = &lines[i];
        i += 1;

        if line.is_divider() || line.text.starts_with("The FP column") {
            break;
        }

        if line.is_blank() {
            continue;
        }

        let Some(disk) = parse_row(line, &columns)? else {
            continue;
        };

        let duplicate = rows.iter().map(|row| &row.disk).any(|other| {
            other.device == disk.device
                && other.serial == disk.serial
                && other.name == disk.name
        });

        if duplicate {
            return Err(line.duplicate(format!(
                "disk {} is listed more than once",
                disk.name
            )));
        }

        rows.push(Row { line: *line, disk });
    }

    Ok(i)
}

/// The value columns of a SMART table.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Column {
    Temp,
    Power,
    Error,
    Fp,
    Size,
}

impl Column {
    const ALL: [Self; 5] =
        [Self::Temp, Self::Power, Self::Error, Self::Fp, Self::Size];

    const fn label(self) -> &'static str {
        match self {
            Self::Temp => "Temp",
            Self::Power => "Power",
            Self::Error => "Error",
            Self::Fp => "FP",
            Self::Size => "Size",
        }
    }
}

/// Right edges of the value columns, taken from the header.
///
/// `snapraid` right-aligns values under their header labels, which is what
/// allows placing the values of rows with blank cells.
#[derive(Debug)]
struct Columns {
    ends: [usize; 5],
}

impl Columns {
    fn from_header(line: &Line<'_>) -> Result<Self, ParseError> {
        let tokens = line.tokens();
        let mut ends = [0; 5];

        for (end, column) in ends.iter_mut().zip(Column::ALL) {
            *end = tokens
                .iter()
                .find(|token| token.text == column.label())
                .map(Token::end)
                .ok_or_else(|| {
                    line.malformed(format!(
                        "SMART header lacks column {}",
                        column.label()
                    ))
                })?;
        }

        Ok(Self { ends })
    }

    /// Returns the column whose right edge is closest to the token's.
    fn nearest(&self, token: &Token<'_>) -> Column {
        let mut best = Column::Temp;
        let mut best_distance = usize::MAX;

        for (end, column) in self.ends.iter().zip(Column::ALL) {
            let distance = end.abs_diff(token.end());

            if distance < best_distance {
                best = column;
                best_distance = distance;
            }
        }

        best
    }
}

fn parse_row(
    line: &Line<'_>,
    columns: &Columns,
) -> Result<Option<DiskRecord>, ParseError> {
    let tokens = line.tokens();

    if !(3..=8).contains(&tokens.len()) {
        return Err(line.malformed(format!(
            "expected 3 to 8 SMART fields, found {}",
            tokens.len()
        )));
    }

    let (values, identity) = tokens.split_at(tokens.len() - 3);

    let mut cells: [Option<&str>; 5] = [None; 5];

    if values.len() == Column::ALL.len() {
        for (cell, value) in cells.iter_mut().zip(values) {
            *cell = Some(value.text);
        }
    } else {
        for value in values {
            let column = columns.nearest(value);
            let cell = &mut cells[column as usize];

            if cell.is_some() {
                return Err(line.malformed(format!(
                    "two values in SMART column {}",
                    column.label()
                )));
            }

            *cell = Some(value.text);
        }
    }

    let serial = identity[0].text;
    let device = identity[1].text;
    let name = identity[2].text;

    if device == "-" || serial == "-" {
        debug!(line = line.number, name, "skipping SMART row without disk");
        return Ok(None);
    }

    let cell = |column: Column| cells[column as usize].unwrap_or("-");

    let disk = DiskRecord {
        device: Some(device.into()),
        serial: Some(serial.into()),
        temperature_celsius: line.count(cell(Column::Temp), "temperature")?,
        power_on_days: line.count(cell(Column::Power), "power on days")?,
        error_count: error_count(line, cell(Column::Error))?,
        failure_probability_percent: line
            .percent(cell(Column::Fp), "failure probability")?,
        size_bytes: line.scaled(cell(Column::Size), 12, "size TB")?,
        ..DiskRecord::named(name)
    };

    Ok(Some(disk))
}

/// Parses the error column, health flags meaning the count is unknown.
fn error_count(
    line: &Line<'_>,
    token: &str,
) -> Result<Option<u64>, ParseError> {
    if HEALTH_FLAGS.contains(&token) {
        debug!(line = line.number, flag = token, "SMART health flag");
        return Ok(None);
    }

    line.count(token, "error count")
}

/// Parses `Probability that at least one disk is going to fail in the next
/// year is 20%.`
pub(crate) fn array_failure_probability(
    line: &Line<'_>,
) -> Result<Option<f64>, ParseError> {
    let Some((_, value)) = line.text.split_once("fail in the next year is")
    else {
        return Ok(None);
    };

    let value = value.trim().trim_end_matches('.');

    line.percent(value, "array failure probability")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseErrorKind;

    const HEADER: &str = "   Temp  Power   Error   FP Size\n      C OnDays   Count        TB  Serial    Device    Disk\n -----------------------------------------------------------------------\n";

    fn with_rows(rows: &str) -> String {
        format!("SnapRAID SMART report:\n\n{HEADER}{rows} -----------------------------------------------------------------------\n")
    }

    #[test]
    fn parse() {
        let input = include_str!("smart-example.in");

        let report = super::parse(input).unwrap();
        assert_eq!(report.disks.len(), 5);

        assert_eq!(
            report.disks[0],
            DiskRecord {
                name: "d1".into(),
                device: Some("/dev/sdb".into()),
                serial: Some("ZCT0AB12".into()),
                temperature_celsius: Some(31),
                power_on_days: Some(1307),
                error_count: Some(0),
                failure_probability_percent: Some(4.0),
                size_bytes: Some(4_000_000_000_000),
                ..DiskRecord::default()
            }
        );

        assert_eq!(report.disks[3].name, "parity");
        assert_eq!(report.disks[4].name, "2-parity");
        assert_eq!(report.disks[4].error_count, Some(12));

        let array = report.array.unwrap();
        assert_eq!(array.failure_probability_percent, Some(27.0));
    }

    #[test]
    fn blank_error_cell_is_absent() {
        let input = include_str!("smart-degraded.in");

        let report = super::parse(input).unwrap();
        assert_eq!(report.disks.len(), 3);

        let d2 = &report.disks[1];
        assert_eq!(d2.name, "d2");
        assert_eq!(d2.temperature_celsius, Some(35));
        assert_eq!(d2.power_on_days, Some(812));
        assert_eq!(d2.error_count, None);
        assert_eq!(d2.failure_probability_percent, Some(6.0));
        assert_eq!(d2.size_bytes, Some(8_000_000_000_000));

        let parity = &report.disks[2];
        assert_eq!(parity.temperature_celsius, None);
        assert_eq!(parity.error_count, None);
        assert_eq!(parity.failure_probability_percent, None);
        assert_eq!(parity.size_bytes, Some(500_000_000_000));
    }

    #[test]
    fn health_flags_are_absent_error_counts() {
        let input = include_str!("smart-failing.in");

        let report = super::parse(input).unwrap();
        assert_eq!(report.disks.len(), 5);

        assert_eq!(report.disks[0].error_count, Some(0));

        let d2 = &report.disks[1];
        assert_eq!(d2.name, "d2");
        assert_eq!(d2.error_count, None);
        assert_eq!(d2.temperature_celsius, Some(44));
        assert_eq!(d2.power_on_days, Some(2911));
        assert_eq!(d2.failure_probability_percent, Some(100.0));
        assert_eq!(d2.size_bytes, Some(4_000_000_000_000));

        for disk in &report.disks[2..] {
            assert_eq!(disk.error_count, None, "{}", disk.name);
            assert!(disk.failure_probability_percent.is_some());
        }

        let array = report.array.unwrap();
        assert_eq!(array.failure_probability_percent, Some(100.0));
    }

    #[test]
    fn unknown_error_word_is_malformed() {
        let input = with_rows(
            "     29   1307    oops   4%  3.0  W1F0ABCD  /dev/sdb  d1\n",
        );

        let error = super::parse(&input).unwrap_err();

        assert_eq!(error.kind(), ParseErrorKind::MalformedSection);
        assert_eq!(error.line(), 6);
    }

    #[test]
    fn rows_without_device_or_serial_are_skipped() {
        let input = with_rows(concat!(
            "     29   1307       0   4%  3.0  W1F0ABCD  /dev/sdb  d1\n",
            "      -      -       -    -  0.2  -         /dev/sda  -\n",
        ));

        let report = super::parse(&input).unwrap();

        assert_eq!(report.disks.len(), 1);
        assert!(report.array.is_none());
    }

    #[test]
    fn non_numeric_size_is_malformed() {
        let input = with_rows(
            "     29   1307       0   4%  abc  W1F0ABCD  /dev/sdb  d1\n",
        );

        let error = super::parse(&input).unwrap_err();

        assert_eq!(error.kind(), ParseErrorKind::MalformedSection);
        assert_eq!(error.line(), 6);
    }

    #[test]
    fn duplicate_disk_is_rejected() {
        let input = with_rows(concat!(
            "     29   1307       0   4%  3.0  W1F0ABCD  /dev/sdb  d1\n",
            "     29   1307       0   4%  3.0  W1F0ABCD  /dev/sdb  d1\n",
        ));

        let error = super::parse(&input).unwrap_err();

        assert_eq!(error.kind(), ParseErrorKind::DuplicateDiskIdentity);
        assert_eq!(error.line(), 7);
    }

    #[test]
    fn too_many_fields_is_malformed() {
        let input = with_rows(
            "     29   1307       0   4%  3.0  1  W1F0ABCD  /dev/sdb  d1\n",
        );

        let error = super::parse(&input).unwrap_err();

        assert_eq!(error.kind(), ParseErrorKind::MalformedSection);
    }

    #[test]
    fn array_probability_not_available() {
        let line = Line {
            number: 1,
            text: "Probability that at least one disk is going to fail in the next year is n/a.",
        };

        assert_eq!(array_failure_probability(&line).unwrap(), None);

        let line = Line {
            number: 1,
            text: "Probability that at least one disk is going to fail in the next year is 8.5%.",
        };

        assert_eq!(array_failure_probability(&line).unwrap(), Some(8.5));
    }
}
