//! Metric schema and the mapping from parsed reports to metric samples.

use std::fmt;

use crate::report::{
    ArrayAggregate, DiffState, DiffSummary, DiskRecord, Report,
};

/// Prometheus metric type.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricType {
    Counter,
    Gauge,
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Counter => f.write_str("counter"),
            Self::Gauge => f.write_str("gauge"),
        }
    }
}

const DISK: &[&str] = &["device", "serial", "name"];
const NAME: &[&str] = &["name"];
const NAME_TYPE: &[&str] = &["name", "type"];
const TYPE: &[&str] = &["type"];
const STATE: &[&str] = &["state"];
const NONE: &[&str] = &[];

/// A metric family: one metric name with its HELP text, type and label
/// keys.
///
/// [`Family::ALL`] is also the order in which families are rendered.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Family {
    DiskTemperature,
    DiskPowerOnDays,
    DiskErrorCount,
    DiskFailureProbability,
    DiskSize,
    ArrayFailureProbability,
    DiskFiles,
    DiskFragmentedFiles,
    DiskExcessFragments,
    DiskSpace,
    ArrayFiles,
    ArrayFragmentedFiles,
    ArrayExcessFragments,
    ArraySpace,
    ScrubAge,
    ScrubCoverage,
    Status,
    DiffFiles,
    DiffHasDifferences,
}

impl Family {
    /// All families, in render order.
    pub const ALL: [Self; 19] = [
        Self::DiskTemperature,
        Self::DiskPowerOnDays,
        Self::DiskErrorCount,
        Self::DiskFailureProbability,
        Self::DiskSize,
        Self::ArrayFailureProbability,
        Self::DiskFiles,
        Self::DiskFragmentedFiles,
        Self::DiskExcessFragments,
        Self::DiskSpace,
        Self::ArrayFiles,
        Self::ArrayFragmentedFiles,
        Self::ArrayExcessFragments,
        Self::ArraySpace,
        Self::ScrubAge,
        Self::ScrubCoverage,
        Self::Status,
        Self::DiffFiles,
        Self::DiffHasDifferences,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::DiskTemperature => "snapraid_disk_temperature_celsius",
            Self::DiskPowerOnDays => "snapraid_disk_power_on_days",
            Self::DiskErrorCount => "snapraid_disk_error_count",
            Self::DiskFailureProbability => {
                "snapraid_disk_failure_probability_percent"
            }
            Self::DiskSize => "snapraid_disk_size_bytes",
            Self::ArrayFailureProbability => {
                "snapraid_array_failure_probability_percent"
            }
            Self::DiskFiles => "snapraid_disk_files_total",
            Self::DiskFragmentedFiles => "snapraid_disk_fragmented_files",
            Self::DiskExcessFragments => "snapraid_disk_excess_fragments",
            Self::DiskSpace => "snapraid_disk_space_bytes",
            Self::ArrayFiles => "snapraid_array_files_total",
            Self::ArrayFragmentedFiles => {
                "snapraid_array_fragmented_files_total"
            }
            Self::ArrayExcessFragments => {
                "snapraid_array_excess_fragments_total"
            }
            Self::ArraySpace => "snapraid_array_space_bytes",
            Self::ScrubAge => "snapraid_scrub_age_days",
            Self::ScrubCoverage => "snapraid_scrub_coverage_ratio",
            Self::Status => "snapraid_status",
            Self::DiffFiles => "snapraid_diff_files_total",
            Self::DiffHasDifferences => "snapraid_diff_has_differences",
        }
    }

    #[must_use]
    pub const fn help(self) -> &'static str {
        match self {
            Self::DiskTemperature => "Current temperature of the disk.",
            Self::DiskPowerOnDays => {
                "Total number of days the disk has been powered on."
            }
            Self::DiskErrorCount => {
                "Total number of errors detected on the disk."
            }
            Self::DiskFailureProbability => {
                "Estimated probability of disk failure in the next year."
            }
            Self::DiskSize => "Size of the disk in bytes.",
            Self::ArrayFailureProbability => {
                "Probability that at least one disk will fail in the next year."
            }
            Self::DiskFiles => "Number of files on each disk.",
            Self::DiskFragmentedFiles => {
                "Number of fragmented files on each disk."
            }
            Self::DiskExcessFragments => {
                "Number of excess fragments on each disk."
            }
            Self::DiskSpace => "Disk space information in bytes.",
            Self::ArrayFiles => "Total number of files in the array.",
            Self::ArrayFragmentedFiles => {
                "Total number of fragmented files in the array."
            }
            Self::ArrayExcessFragments => {
                "Total number of excess fragments in the array."
            }
            Self::ArraySpace => "Array space information in bytes.",
            Self::ScrubAge => "Age of scrubbed blocks in days.",
            Self::ScrubCoverage => {
                "Ratio of the array that has been scrubbed (0.0-1.0)."
            }
            Self::Status => "Status indicators (0=no, 1=yes).",
            Self::DiffFiles => "Number of files in each diff state.",
            Self::DiffHasDifferences => {
                "Whether there are any differences (0=no, 1=yes)."
            }
        }
    }

    #[must_use]
    pub const fn metric_type(self) -> MetricType {
        match self {
            Self::DiskPowerOnDays | Self::DiskErrorCount => {
                MetricType::Counter
            }
            _ => MetricType::Gauge,
        }
    }

    /// Returns the label keys every sample of this family carries, in
    /// order.
    #[must_use]
    pub const fn label_keys(self) -> &'static [&'static str] {
        match self {
            Self::DiskTemperature
            | Self::DiskPowerOnDays
            | Self::DiskErrorCount
            | Self::DiskFailureProbability
            | Self::DiskSize => DISK,
            Self::DiskFiles
            | Self::DiskFragmentedFiles
            | Self::DiskExcessFragments => NAME,
            Self::DiskSpace => NAME_TYPE,
            Self::ArraySpace | Self::ScrubAge | Self::Status => TYPE,
            Self::DiffFiles => STATE,
            Self::ArrayFailureProbability
            | Self::ArrayFiles
            | Self::ArrayFragmentedFiles
            | Self::ArrayExcessFragments
            | Self::ScrubCoverage
            | Self::DiffHasDifferences => NONE,
        }
    }
}

/// A sample value.
///
/// Integers are kept apart from floats so that byte counts beyond `2^53`
/// stay exact.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value {
    Integer(u64),
    Float(f64),
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Integer(u64::from(value))
    }
}

/// One series of a metric family.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricSample {
    family: Family,
    labels: Vec<(&'static str, String)>,
    value: Value,
}

impl MetricSample {
    #[must_use]
    pub const fn family(&self) -> Family {
        self.family
    }

    #[must_use]
    pub fn labels(&self) -> &[(&'static str, String)] {
        &self.labels
    }

    #[must_use]
    pub const fn value(&self) -> Value {
        self.value
    }
}

/// Collects samples, checking label keys against the schema.
#[derive(Debug, Default)]
struct Samples {
    samples: Vec<MetricSample>,
}

impl Samples {
    fn push(
        &mut self,
        family: Family,
        label_values: &[&str],
        value: impl Into<Value>,
    ) {
        let keys = family.label_keys();

        debug_assert_eq!(
            keys.len(),
            label_values.len(),
            "label values of {}",
            family.name()
        );

        let labels = keys
            .iter()
            .zip(label_values)
            .map(|(key, value)| (*key, (*value).to_owned()))
            .collect();

        self.samples.push(MetricSample {
            family,
            labels,
            value: value.into(),
        });
    }

    /// Pushes a sample if the value is present.
    fn push_some<V: Into<Value>>(
        &mut self,
        family: Family,
        label_values: &[&str],
        value: Option<V>,
    ) {
        if let Some(value) = value {
            self.push(family, label_values, value);
        }
    }
}

/// Converts a parsed report to metric samples.
///
/// Fields absent from the report produce no sample. Disk samples follow the
/// order of the disks in the report.
#[must_use]
pub fn build(report: &Report) -> Vec<MetricSample> {
    let mut samples = Samples::default();

    for disk in &report.disks {
        disk_samples(&mut samples, disk);
    }

    if let Some(array) = &report.array {
        array_samples(&mut samples, array);
    }

    if let Some(diff) = &report.diff {
        diff_samples(&mut samples, diff);
    }

    samples.samples
}

fn disk_samples(samples: &mut Samples, disk: &DiskRecord) {
    let name = disk.name.as_str();

    if let (Some(device), Some(serial)) = (&disk.device, &disk.serial) {
        let labels = [device.as_str(), serial.as_str(), name];

        samples.push_some(
            Family::DiskTemperature,
            &labels,
            disk.temperature_celsius,
        );
        samples.push_some(Family::DiskPowerOnDays, &labels, disk.power_on_days);
        samples.push_some(Family::DiskErrorCount, &labels, disk.error_count);
        samples.push_some(
            Family::DiskFailureProbability,
            &labels,
            disk.failure_probability_percent,
        );
        samples.push_some(Family::DiskSize, &labels, disk.size_bytes);
    }

    samples.push_some(Family::DiskFiles, &[name], disk.files);
    samples.push_some(
        Family::DiskFragmentedFiles,
        &[name],
        disk.fragmented_files,
    );
    samples.push_some(
        Family::DiskExcessFragments,
        &[name],
        disk.excess_fragments,
    );
    samples.push_some(Family::DiskSpace, &[name, "used"], disk.used_bytes);
    samples.push_some(Family::DiskSpace, &[name, "free"], disk.free_bytes);
}

fn array_samples(samples: &mut Samples, array: &ArrayAggregate) {
    samples.push_some(
        Family::ArrayFailureProbability,
        &[],
        array.failure_probability_percent,
    );

    samples.push_some(Family::ArrayFiles, &[], array.files);
    samples.push_some(
        Family::ArrayFragmentedFiles,
        &[],
        array.fragmented_files,
    );
    samples.push_some(
        Family::ArrayExcessFragments,
        &[],
        array.excess_fragments,
    );
    samples.push_some(Family::ArraySpace, &["used"], array.used_bytes);
    samples.push_some(Family::ArraySpace, &["free"], array.free_bytes);

    if let Some(age) = array.scrub_age {
        samples.push(Family::ScrubAge, &["oldest"], age.oldest);
        samples.push(Family::ScrubAge, &["median"], age.median);
        samples.push(Family::ScrubAge, &["newest"], age.newest);
    }

    samples.push_some(
        Family::ScrubCoverage,
        &[],
        array.scrub_coverage_ratio,
    );

    let flags = [
        ("sync_in_progress", array.flags.sync_in_progress),
        (
            "zero_subsecond_timestamps",
            array.flags.zero_subsecond_timestamps,
        ),
        ("rehash_needed", array.flags.rehash_needed),
        ("errors_detected", array.flags.errors_detected),
    ];

    for (kind, flag) in flags {
        samples.push_some(Family::Status, &[kind], flag);
    }
}

fn diff_samples(samples: &mut Samples, diff: &DiffSummary) {
    for state in DiffState::ALL {
        samples.push(Family::DiffFiles, &[state.as_str()], diff.count(state));
    }

    samples.push(Family::DiffHasDifferences, &[], diff.has_differences());
}
