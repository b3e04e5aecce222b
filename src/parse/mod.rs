//! Parsers for the text printed by `snapraid status`, `snapraid smart` and
//! `snapraid diff`.
//!
//! All parsers share the same policy: unknown lines are skipped, the marker
//! `-` means a field is absent, and a recognized field that does not coerce
//! to its type fails the whole report.

pub mod diff;
pub mod smart;
pub mod status;

use crate::error::ParseError;
use crate::report::{Report, ReportKind};

/// Parses a report of the given kind.
///
/// # Errors
///
/// Returns an error if a recognized section of the report is malformed or
/// if a disk is listed twice.
pub fn parse(kind: ReportKind, text: &str) -> Result<Report, ParseError> {
    match kind {
        ReportKind::Status => status::parse(text),
        ReportKind::Smart => smart::parse(text),
        ReportKind::Diff => diff::parse(text),
    }
}

/// A report line with its 1-based number.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Line<'a> {
    pub number: usize,
    pub text: &'a str,
}

impl<'a> Line<'a> {
    pub fn all(text: &'a str) -> Vec<Self> {
        text.lines()
            .enumerate()
            .map(|(i, text)| Self { number: i + 1, text })
            .collect()
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Returns `true` for the `-----` lines framing a table.
    pub fn is_divider(&self) -> bool {
        let trimmed = self.text.trim();
        trimmed.len() >= 4 && trimmed.starts_with("----")
    }

    /// Returns the whitespace separated tokens with their byte offsets.
    pub fn tokens(&self) -> Vec<Token<'a>> {
        let text = self.text;
        let mut tokens = vec![];
        let mut start = None;

        for (i, c) in text.char_indices() {
            match (c.is_whitespace(), start) {
                (true, Some(s)) => {
                    tokens.push(Token::new(s, &text[s..i]));
                    start = None;
                }
                (false, None) => start = Some(i),
                _ => {}
            }
        }

        if let Some(s) = start {
            tokens.push(Token::new(s, &text[s..]));
        }

        tokens
    }

    pub fn malformed(&self, detail: impl Into<String>) -> ParseError {
        ParseError::malformed(self.number, self.text, detail)
    }

    pub fn duplicate(&self, detail: impl Into<String>) -> ParseError {
        ParseError::duplicate(self.number, self.text, detail)
    }

    /// Parses an integer field, `-` meaning absent.
    pub fn count(
        &self,
        token: &str,
        what: &str,
    ) -> Result<Option<u64>, ParseError> {
        if is_absent(token) {
            return Ok(None);
        }

        token.parse::<u64>().map(Some).map_err(|_| {
            self.malformed(format!("parsing {what} token {token} to u64"))
        })
    }

    /// Parses a decimal field scaled by `10^exponent` into an exact integer,
    /// `-` meaning absent.
    pub fn scaled(
        &self,
        token: &str,
        exponent: u32,
        what: &str,
    ) -> Result<Option<u64>, ParseError> {
        if is_absent(token) {
            return Ok(None);
        }

        scale_decimal(token, exponent).map(Some).ok_or_else(|| {
            self.malformed(format!("parsing {what} token {token} to bytes"))
        })
    }

    /// Parses a percentage such as `12%` or `0.5%`, `-` and `n/a` meaning
    /// absent.
    pub fn percent(
        &self,
        token: &str,
        what: &str,
    ) -> Result<Option<f64>, ParseError> {
        if is_absent(token) || token == "n/a" {
            return Ok(None);
        }

        let number = token.strip_suffix('%').unwrap_or(token);

        decimal(number).map(Some).ok_or_else(|| {
            self.malformed(format!("parsing {what} token {token} to percent"))
        })
    }

    /// Checks that a field is a (possibly signed) decimal, `-` being
    /// allowed.
    pub fn validate_decimal(
        &self,
        token: &str,
        what: &str,
    ) -> Result<(), ParseError> {
        let number = token.strip_prefix('-').unwrap_or(token);

        if is_absent(token) || decimal(number).is_some() {
            Ok(())
        } else {
            Err(self.malformed(format!("parsing {what} token {token}")))
        }
    }
}

/// A token of a line and where it starts.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Token<'a> {
    pub start: usize,
    pub text: &'a str,
}

impl<'a> Token<'a> {
    const fn new(start: usize, text: &'a str) -> Self {
        Self { start, text }
    }

    /// Returns the byte offset just past the token.
    pub const fn end(&self) -> usize {
        self.start + self.text.len()
    }
}

fn is_absent(token: &str) -> bool {
    token == "-"
}

/// Parses plain `digits[.digits]` text. Rejects signs, exponents, `inf` and
/// `nan`, which [`str::parse`] would otherwise accept.
fn decimal(s: &str) -> Option<f64> {
    let (int, frac) = s.split_once('.').unwrap_or((s, ""));

    let digits_only = |part: &str| part.bytes().all(|b| b.is_ascii_digit());

    if int.is_empty() || !digits_only(int) || !digits_only(frac) {
        return None;
    }

    if s.ends_with('.') {
        return None;
    }

    s.parse().ok()
}

/// Converts `digits[.digits]` times `10^exponent` to an integer without
/// going through floating point.
fn scale_decimal(s: &str, exponent: u32) -> Option<u64> {
    decimal(s)?;

    let (int, frac) = s.split_once('.').unwrap_or((s, ""));

    let frac_len = u32::try_from(frac.len()).ok()?;
    if frac_len > exponent {
        return None;
    }

    let int = int.parse::<u64>().ok()?;
    let frac = if frac.is_empty() {
        0
    } else {
        frac.parse::<u64>().ok()?
    };

    let unit = 10_u64.checked_pow(exponent)?;
    let frac_unit = 10_u64.checked_pow(exponent - frac_len)?;

    int.checked_mul(unit)?.checked_add(frac.checked_mul(frac_unit)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_with_offsets() {
        let line = Line {
            number: 1,
            text: "     29   1307 d1",
        };

        let tokens = line.tokens();

        assert_eq!(
            tokens,
            vec![
                Token::new(5, "29"),
                Token::new(10, "1307"),
                Token::new(15, "d1"),
            ]
        );
        assert_eq!(tokens[1].end(), 14);
    }

    #[test]
    fn scaled_decimals_are_exact() {
        assert_eq!(scale_decimal("2936", 9), Some(2_936_000_000_000));
        assert_eq!(scale_decimal("0.5", 12), Some(500_000_000_000));
        assert_eq!(scale_decimal("4.0", 12), Some(4_000_000_000_000));
        assert_eq!(scale_decimal("15373.25", 9), Some(15_373_250_000_000));
    }

    #[test]
    fn scaled_rejects_garbage() {
        assert_eq!(scale_decimal("abc", 9), None);
        assert_eq!(scale_decimal("1e3", 9), None);
        assert_eq!(scale_decimal("-1", 9), None);
        assert_eq!(scale_decimal("1.", 9), None);
        assert_eq!(scale_decimal(".5", 9), None);
        assert_eq!(scale_decimal("99999999999999999999", 9), None);
    }

    #[test]
    fn decimal_rejects_special_floats() {
        assert_eq!(decimal("inf"), None);
        assert_eq!(decimal("NaN"), None);
        assert_eq!(decimal("12.5"), Some(12.5));
    }

    #[test]
    fn absent_and_malformed_fields() {
        let line = Line {
            number: 3,
            text: "   -  x  n/a",
        };

        assert_eq!(line.count("-", "files").unwrap(), None);
        assert_eq!(line.percent("n/a", "FP").unwrap(), None);
        assert_eq!(line.percent("12%", "FP").unwrap(), Some(12.0));

        let error = line.count("x", "files").unwrap_err();
        assert_eq!(error.line(), 3);
        assert_eq!(
            error.kind(),
            crate::error::ParseErrorKind::MalformedSection
        );
    }
}
