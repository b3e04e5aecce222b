//! Run configuration.

use std::path::PathBuf;

use crate::source::Source;

/// Default node exporter textfile collector directory.
pub const DEFAULT_OUTPUT_DIR: &str = "/var/lib/prometheus/node_exporter";

/// Where rendered metrics go.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Output {
    /// Atomically write `<dir>/<report file name>`.
    Directory {
        path: PathBuf,
        /// Create `path` if it does not exist yet.
        create: bool,
    },

    /// Print to **STDOUT**.
    Stdout,
}

impl Default for Output {
    fn default() -> Self {
        Self::Directory {
            path: DEFAULT_OUTPUT_DIR.into(),
            create: false,
        }
    }
}

/// Everything an export run needs besides the report kind.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Config {
    pub source: Source,
    pub output: Output,
}
