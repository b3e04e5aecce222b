//! `snapraid diff` parsing.
//!
//! Only the summary at the end of the report is read:
//!
//! ```text
//!   147732 equal
//!        1 added
//!        0 removed
//! ```
//!
//! The per file lines above it (`add path`, `move a -> b`, ...) are skipped.

use super::Line;
use crate::error::ParseError;
use crate::report::{DiffState, DiffSummary, Report};

/// Parses `snapraid diff` output.
///
/// States without a summary line count as zero.
///
/// # Errors
///
/// Returns an error if a summary count overflows or a state is reported
/// twice.
pub fn parse(text: &str) -> Result<Report, ParseError> {
    let mut summary = DiffSummary::default();
    let mut seen = Vec::with_capacity(DiffState::ALL.len());

    for line in Line::all(text) {
        let Some((count, state)) = summary_line(&line)? else {
            continue;
        };

        if seen.contains(&state) {
            return Err(line.malformed(format!(
                "{} is reported more than once",
                state.as_str()
            )));
        }

        seen.push(state);
        summary.set(state, count);
    }

    Ok(Report {
        disks: vec![],
        array: None,
        diff: Some(summary),
    })
}

fn summary_line(
    line: &Line<'_>,
) -> Result<Option<(u64, DiffState)>, ParseError> {
    let tokens = line.tokens();

    let [count, word] = tokens.as_slice() else {
        return Ok(None);
    };

    if !count.text.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(None);
    }

    let Some(state) = DiffState::ALL
        .into_iter()
        .find(|state| state.as_str() == word.text)
    else {
        return Ok(None);
    };

    let count = line
        .count(count.text, state.as_str())?
        .unwrap_or_default();

    Ok(Some((count, state)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseErrorKind;

    #[test]
    fn parse() {
        let input = include_str!("diff-example.in");

        let diff = super::parse(input).unwrap().diff.unwrap();

        assert_eq!(diff.count(DiffState::Equal), 147_721);
        assert_eq!(diff.count(DiffState::Added), 3);
        assert_eq!(diff.count(DiffState::Removed), 1);
        assert_eq!(diff.count(DiffState::Updated), 2);
        assert_eq!(diff.count(DiffState::Moved), 1);
        assert_eq!(diff.count(DiffState::Copied), 1);
        assert_eq!(diff.count(DiffState::Restored), 0);
        assert!(diff.has_differences());
    }

    #[test]
    fn no_differences() {
        let input = include_str!("diff-equal.in");

        let diff = super::parse(input).unwrap().diff.unwrap();

        assert_eq!(diff.count(DiffState::Equal), 147_732);
        for state in DiffState::ALL.into_iter().skip(1) {
            assert_eq!(diff.count(state), 0, "{state:?}");
        }
        assert!(!diff.has_differences());
    }

    #[test]
    fn empty_array_is_all_zero() {
        let diff = super::parse("Comparing...\n").unwrap().diff.unwrap();

        assert_eq!(diff, DiffSummary::default());
        assert!(!diff.has_differences());
    }

    #[test]
    fn file_lines_are_not_counts() {
        let input = concat!(
            "add added\n",
            "add 12 added.jpg\n",
            "       0 added\n",
        );

        let diff = super::parse(input).unwrap().diff.unwrap();

        assert_eq!(diff.count(DiffState::Added), 0);
    }

    #[test]
    fn repeated_state_is_malformed() {
        let input = "       1 added\n       2 added\n";

        let error = super::parse(input).unwrap_err();

        assert_eq!(error.kind(), ParseErrorKind::MalformedSection);
        assert_eq!(error.line(), 2);
    }

    #[test]
    fn overflowing_count_is_malformed() {
        let input = "99999999999999999999999 equal\n";

        let error = super::parse(input).unwrap_err();

        assert_eq!(error.kind(), ParseErrorKind::MalformedSection);
    }
}
