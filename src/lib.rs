//! Exports SnapRAID `status`, `smart` and `diff` reports in prometheus text
//! format for the node exporter textfile collector.
//!
//! A run reads the report text, parses it, builds metric samples, renders
//! them and writes the result atomically:
//!
//! ```no_run
//! use snapraid_prometheus::{export, Config, ReportKind};
//!
//! let path = export(ReportKind::Smart, &Config::default())?;
//! # Ok::<(), snapraid_prometheus::Error>(())
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]

pub mod config;
pub mod error;
pub mod metrics;
pub mod parse;
pub mod prom;
pub mod report;
pub mod source;
pub mod textfile;

use std::path::PathBuf;

use tracing::{debug, info};

pub use crate::config::{Config, Output};
pub use crate::error::{Error, ParseError, ParseErrorKind};
pub use crate::report::ReportKind;
pub use crate::source::Source;

/// Converts report text to prometheus metric format.
///
/// # Errors
///
/// Returns [`Error::Parse`] if the report cannot be parsed, or
/// [`Error::Render`] if formatting the metrics fails.
pub fn convert(kind: ReportKind, text: &str) -> Result<String, Error> {
    let report = parse::parse(kind, text)?;

    let samples = metrics::build(&report);

    debug!(
        %kind,
        disks = report.disks.len(),
        samples = samples.len(),
        "parsed report"
    );

    let prom = prom::render(&samples)?;

    Ok(prom)
}

/// Runs the whole pipeline for one report.
///
/// Returns the written file, or `None` when printing to **STDOUT**.
///
/// # Errors
///
/// Returns an error if the report cannot be read or parsed, or if writing
/// the output fails. Nothing is written unless all previous steps succeed.
pub fn export(
    kind: ReportKind,
    config: &Config,
) -> Result<Option<PathBuf>, Error> {
    let raw = config.source.read(kind)?;

    let prom = convert(raw.kind(), raw.text())?;

    match &config.output {
        Output::Stdout => {
            print!("{prom}");
            Ok(None)
        }

        Output::Directory { path, create } => {
            if *create {
                textfile::create_dir(path)?;
            }

            let path = textfile::write(path, kind.file_name(), &prom)?;

            info!(path = %path.display(), "wrote metrics");

            Ok(Some(path))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status() {
        let input = include_str!("parse/status-example.in");
        let expected = include_str!("parse/status-example.prom");

        assert_eq!(convert(ReportKind::Status, input).unwrap(), expected);
    }

    #[test]
    fn status_with_smart() {
        let input = include_str!("parse/status-with-smart.in");
        let expected = include_str!("parse/status-with-smart.prom");

        let prom = convert(ReportKind::Status, input).unwrap();
        assert_eq!(prom, expected);

        let temperatures = prom
            .lines()
            .filter(|line| line.starts_with("snapraid_disk_temperature_celsius{"))
            .count();

        assert_eq!(temperatures, 5);
        assert!(prom.contains("\nsnapraid_scrub_coverage_ratio 0.65\n"));
    }

    #[test]
    fn smart() {
        let input = include_str!("parse/smart-example.in");
        let expected = include_str!("parse/smart-example.prom");

        assert_eq!(convert(ReportKind::Smart, input).unwrap(), expected);
    }

    #[test]
    fn smart_without_error_count() {
        let input = include_str!("parse/smart-degraded.in");

        let prom = convert(ReportKind::Smart, input).unwrap();

        assert!(prom.contains(
            "snapraid_disk_failure_probability_percent{device=\"/dev/sdc\",serial=\"ZR5DE111\",name=\"d2\"} 6\n"
        ));
        assert!(!prom.contains("snapraid_disk_error_count{device=\"/dev/sdc\""));
        assert!(prom.contains(
            "snapraid_disk_error_count{device=\"/dev/sdb\",serial=\"ZCT0AB12\",name=\"d1\"} 0\n"
        ));
        assert!(!prom.contains("snapraid_array_failure_probability_percent"));
    }

    #[test]
    fn diff() {
        let input = include_str!("parse/diff-example.in");
        let expected = include_str!("parse/diff-example.prom");

        assert_eq!(convert(ReportKind::Diff, input).unwrap(), expected);
    }

    #[test]
    fn diff_without_differences() {
        let input = include_str!("parse/diff-equal.in");
        let expected = include_str!("parse/diff-equal.prom");

        let prom = convert(ReportKind::Diff, input).unwrap();

        assert_eq!(prom, expected);
        assert!(prom.ends_with("\nsnapraid_diff_has_differences 0\n"));
    }

    #[test]
    fn deterministic() {
        for (kind, input) in [
            (ReportKind::Status, include_str!("parse/status-with-smart.in")),
            (ReportKind::Smart, include_str!("parse/smart-degraded.in")),
            (ReportKind::Diff, include_str!("parse/diff-example.in")),
        ] {
            assert_eq!(
                convert(kind, input).unwrap(),
                convert(kind, input).unwrap()
            );
        }
    }

    #[test]
    fn series_are_unique() {
        let prom =
            convert(ReportKind::Status, include_str!("parse/status-with-smart.in"))
                .unwrap();

        let mut series = std::collections::HashSet::new();

        for line in prom.lines() {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (name_and_labels, _) = line.rsplit_once(' ').unwrap();
            assert!(series.insert(name_and_labels), "{name_and_labels}");
        }
    }

    #[test]
    fn malformed_status() {
        let input = include_str!("parse/status-malformed.in");

        let error = convert(ReportKind::Status, input).unwrap_err();

        assert!(matches!(
            error,
            Error::Parse(ref error)
                if error.kind() == ParseErrorKind::MalformedSection
        ));
    }

    #[test]
    fn failing_smart_disks() {
        let input = include_str!("parse/smart-failing.in");

        let prom = convert(ReportKind::Smart, input).unwrap();

        let error_counts = prom
            .lines()
            .filter(|line| line.starts_with("snapraid_disk_error_count{"))
            .collect::<Vec<_>>();

        assert_eq!(
            error_counts,
            vec![
                "snapraid_disk_error_count{device=\"/dev/sdb\",serial=\"ZCT0AB12\",name=\"d1\"} 0"
            ]
        );
        assert!(prom.contains(
            "snapraid_disk_failure_probability_percent{device=\"/dev/sdc\",serial=\"ZCT0AB34\",name=\"d2\"} 100\n"
        ));
        assert!(prom.contains(
            "snapraid_disk_temperature_celsius{device=\"/dev/sdc\",serial=\"ZCT0AB34\",name=\"d2\"} 44\n"
        ));
        assert!(prom.contains("\nsnapraid_array_failure_probability_percent 100\n"));
    }
}
