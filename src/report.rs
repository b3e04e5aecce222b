//! Intermediate records produced by the report parsers.

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;

/// The SnapRAID report an exporter run works on.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ReportKind {
    /// `snapraid status`
    Status,
    /// `snapraid smart`
    Smart,
    /// `snapraid diff`
    Diff,
}

impl ReportKind {
    /// All report kinds.
    pub const ALL: [Self; 3] = [Self::Status, Self::Smart, Self::Diff];

    /// Returns the `snapraid` subcommand that prints this report.
    #[must_use]
    pub const fn subcommand(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Smart => "smart",
            Self::Diff => "diff",
        }
    }

    /// Returns the textfile collector file name for this report.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Status => "snapraid_status.prom",
            Self::Smart => "snapraid_smart.prom",
            Self::Diff => "snapraid_diff.prom",
        }
    }

    /// Returns `true` if the command exit code means the report was printed.
    ///
    /// `snapraid diff` exits with 2 when it found differences.
    #[must_use]
    pub const fn accepts_exit_code(self, code: i32) -> bool {
        match self {
            Self::Diff => code == 0 || code == 2,
            Self::Status | Self::Smart => code == 0,
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.subcommand())
    }
}

impl FromStr for ReportKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.subcommand() == s)
            .ok_or_else(|| anyhow!("unknown report kind: {}", s))
    }
}

/// Raw report text, as printed by `snapraid`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawReport {
    kind: ReportKind,
    text: String,
}

impl RawReport {
    #[must_use]
    pub fn new(kind: ReportKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ReportKind {
        self.kind
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// One data or parity disk.
///
/// Which fields are set depends on the report the disk was read from. A
/// status table only knows the name and file/space figures, a SMART table
/// knows device, serial and health figures.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DiskRecord {
    /// Logical name or role, e.g. `d1`, `parity` or `2-parity`.
    pub name: String,
    pub device: Option<String>,
    pub serial: Option<String>,

    pub temperature_celsius: Option<u64>,
    pub power_on_days: Option<u64>,
    pub error_count: Option<u64>,
    /// Estimated probability to fail in the next year, in percent.
    pub failure_probability_percent: Option<f64>,
    pub size_bytes: Option<u64>,

    pub files: Option<u64>,
    pub fragmented_files: Option<u64>,
    pub excess_fragments: Option<u64>,
    pub used_bytes: Option<u64>,
    pub free_bytes: Option<u64>,
}

impl DiskRecord {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Copies every field set in `other` into `self`.
    pub(crate) fn merge(&mut self, other: Self) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(
                    if other.$field.is_some() {
                        self.$field = other.$field;
                    }
                )*
            };
        }

        take!(
            device,
            serial,
            temperature_celsius,
            power_on_days,
            error_count,
            failure_probability_percent,
            size_bytes,
            files,
            fragmented_files,
            excess_fragments,
            used_bytes,
            free_bytes
        );
    }
}

/// Scrub age of the array blocks, in days.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ScrubAge {
    pub oldest: u64,
    pub median: u64,
    pub newest: u64,
}

/// Status flags, each absent when the report did not mention it.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct StatusFlags {
    pub sync_in_progress: Option<bool>,
    pub zero_subsecond_timestamps: Option<bool>,
    pub rehash_needed: Option<bool>,
    pub errors_detected: Option<bool>,
}

/// Array wide figures.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ArrayAggregate {
    pub files: Option<u64>,
    pub fragmented_files: Option<u64>,
    pub excess_fragments: Option<u64>,
    pub used_bytes: Option<u64>,
    pub free_bytes: Option<u64>,

    pub scrub_age: Option<ScrubAge>,
    /// Scrubbed share of the array, in `[0, 1]`.
    pub scrub_coverage_ratio: Option<f64>,
    pub flags: StatusFlags,

    /// Probability that at least one disk fails in the next year, in
    /// percent.
    pub failure_probability_percent: Option<f64>,
}

impl ArrayAggregate {
    /// Returns `true` if no figure is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A file state reported by `snapraid diff`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum DiffState {
    Equal,
    Added,
    Removed,
    Updated,
    Moved,
    Copied,
    Restored,
}

impl DiffState {
    /// All states, in output order.
    pub const ALL: [Self; 7] = [
        Self::Equal,
        Self::Added,
        Self::Removed,
        Self::Updated,
        Self::Moved,
        Self::Copied,
        Self::Restored,
    ];

    /// Returns the word `snapraid diff` uses in its summary.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Updated => "updated",
            Self::Moved => "moved",
            Self::Copied => "copied",
            Self::Restored => "restored",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// Per state file counts of `snapraid diff`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DiffSummary {
    counts: [u64; 7],
}

impl DiffSummary {
    #[must_use]
    pub const fn count(&self, state: DiffState) -> u64 {
        self.counts[state.index()]
    }

    pub fn set(&mut self, state: DiffState, count: u64) {
        self.counts[state.index()] = count;
    }

    /// Returns `true` if any file is not [`DiffState::Equal`].
    #[must_use]
    pub fn has_differences(&self) -> bool {
        DiffState::ALL
            .into_iter()
            .filter(|state| *state != DiffState::Equal)
            .any(|state| self.count(state) > 0)
    }
}

/// Parsed report.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Report {
    pub disks: Vec<DiskRecord>,
    pub array: Option<ArrayAggregate>,
    pub diff: Option<DiffSummary>,
}
