//! Obtaining report text.

use std::io::Read;
use std::path::PathBuf;
use std::process::Command;

use tracing::debug;

use crate::error::Error;
use crate::report::{RawReport, ReportKind};

/// Where report text comes from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Source {
    /// A captured report.
    File(PathBuf),

    /// A captured report on **STDIN**.
    Stdin,

    /// Runs `snapraid`, optionally via `sudo`.
    Command { program: String, sudo: bool },
}

impl Default for Source {
    fn default() -> Self {
        Self::Command {
            program: "snapraid".into(),
            sudo: false,
        }
    }
}

impl Source {
    /// Reads the report of the given kind.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SourceUnavailable`] if the file cannot be read, the
    /// command cannot be started or exits unsuccessfully, or the text is not
    /// UTF-8.
    pub fn read(&self, kind: ReportKind) -> Result<RawReport, Error> {
        let text = match self {
            Self::File(path) => {
                debug!(path = %path.display(), "reading captured report");

                std::fs::read_to_string(path).map_err(|error| {
                    Error::source_unavailable(
                        path.display().to_string(),
                        error,
                    )
                })?
            }

            Self::Stdin => {
                let mut text = String::new();

                std::io::stdin()
                    .lock()
                    .read_to_string(&mut text)
                    .map_err(|error| {
                        Error::source_unavailable("STDIN", error)
                    })?;

                text
            }

            Self::Command { program, sudo } => {
                run(command(program, *sudo, kind), kind)?
            }
        };

        Ok(RawReport::new(kind, text))
    }
}

fn command(program: &str, sudo: bool, kind: ReportKind) -> Command {
    let mut cmd = if sudo {
        let mut cmd = Command::new("sudo");
        cmd.arg(program);
        cmd
    } else {
        Command::new(program)
    };

    cmd.arg(kind.subcommand());
    cmd
}

fn run(mut cmd: Command, kind: ReportKind) -> Result<String, Error> {
    let origin = format!("{cmd:?}");

    debug!(command = %origin, "running");

    let output = cmd
        .output()
        .map_err(|error| Error::source_unavailable(&origin, error))?;

    let accepted = output
        .status
        .code()
        .is_some_and(|code| kind.accepts_exit_code(code));

    if !accepted {
        let stderr = String::from_utf8_lossy(&output.stderr);

        return Err(Error::source_unavailable(
            origin,
            format!("{}: {}", output.status, stderr.trim()),
        ));
    }

    String::from_utf8(output.stdout).map_err(|error| {
        Error::source_unavailable(
            origin,
            format!("parsing command output to UTF8: {error}"),
        )
    })
}
