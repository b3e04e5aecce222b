//! Error types of the export pipeline.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort an export run.
///
/// All of these are terminal. None of them is raised after the output file
/// has been replaced.
#[derive(Debug, Error)]
pub enum Error {
    /// The report text could not be obtained.
    #[error("source unavailable: {origin}: {reason}")]
    SourceUnavailable {
        /// The file or command that was read.
        origin: String,
        /// Why reading it failed.
        reason: String,
    },

    /// The report text is structurally invalid.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Formatting the metrics failed.
    #[error("rendering metrics")]
    Render(#[from] fmt::Error),

    /// Persisting the rendered metrics failed.
    #[error("write error: {}", path.display())]
    Write {
        /// The file that was being written.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn source_unavailable(
        origin: impl Into<String>,
        reason: impl fmt::Display,
    ) -> Self {
        Self::SourceUnavailable {
            origin: origin.into(),
            reason: reason.to_string(),
        }
    }
}

/// The kind of a [`ParseError`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParseErrorKind {
    /// A recognized line has fields that cannot be coerced.
    MalformedSection,

    /// The same disk is listed twice.
    DuplicateDiskIdentity,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedSection => f.write_str("malformed section"),
            Self::DuplicateDiskIdentity => {
                f.write_str("duplicate disk identity")
            }
        }
    }
}

/// A structural error in a report, pointing at the offending line.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("parse error ({kind}) at line {line}: {detail}: {content:?}")]
pub struct ParseError {
    kind: ParseErrorKind,
    line: usize,
    content: String,
    detail: String,
}

impl ParseError {
    pub(crate) fn malformed(
        line: usize,
        content: &str,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            kind: ParseErrorKind::MalformedSection,
            line,
            content: content.into(),
            detail: detail.into(),
        }
    }

    pub(crate) fn duplicate(
        line: usize,
        content: &str,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            kind: ParseErrorKind::DuplicateDiskIdentity,
            line,
            content: content.into(),
            detail: detail.into(),
        }
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ParseErrorKind {
        self.kind
    }

    /// Returns the 1-based line number.
    #[must_use]
    pub const fn line(&self) -> usize {
        self.line
    }

    /// Returns the offending line.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }
}
