//! Prometheus text exposition format.

use std::fmt::{self, Write};

use crate::metrics::{Family, MetricSample, Value};

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Integer(value) => write!(f, "{value}"),
            Self::Float(value) if value.is_nan() => f.write_str("NaN"),
            Self::Float(value) if value.is_infinite() => {
                f.write_str(if value > 0.0 { "+Inf" } else { "-Inf" })
            }
            // shortest representation that round-trips, no exponent
            Self::Float(value) => write!(f, "{value}"),
        }
    }
}

/// Converts samples to prometheus metric format.
///
/// Families are written in [`Family::ALL`] order, each with its `HELP` and
/// `TYPE` line, and separated by a blank line. Families without samples are
/// left out. Within a family, samples keep their order.
///
/// # Errors
///
/// Returns an error if formatting a sample fails.
pub fn render(samples: &[MetricSample]) -> Result<String, fmt::Error> {
    let mut output = String::default();

    for family in Family::ALL {
        let mut series = samples
            .iter()
            .filter(|sample| sample.family() == family)
            .peekable();

        if series.peek().is_none() {
            continue;
        }

        if !output.is_empty() {
            output.push('\n');
        }

        write_family(&mut output, family, series)?;
    }

    Ok(output)
}

fn write_family<'a>(
    output: &mut String,
    family: Family,
    series: impl Iterator<Item = &'a MetricSample>,
) -> fmt::Result {
    writeln!(output, "# HELP {} {}", family.name(), family.help())?;
    writeln!(output, "# TYPE {} {}", family.name(), family.metric_type())?;

    for sample in series {
        output.push_str(family.name());

        if !sample.labels().is_empty() {
            output.push('{');

            for (i, (key, value)) in sample.labels().iter().enumerate() {
                if i > 0 {
                    output.push(',');
                }

                write!(output, "{key}=\"{}\"", escape_label_value(value))?;
            }

            output.push('}');
        }

        writeln!(output, " {}", sample.value())?;
    }

    Ok(())
}

/// Escapes backslash, double quote and newline in a label value.
fn escape_label_value(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());

    for c in s.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(c),
        }
    }

    escaped
}
