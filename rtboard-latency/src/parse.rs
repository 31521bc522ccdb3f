//! Probe Output Parsing
//!
//! The probe's quiet mode prints one summary line per measurement thread:
//!
//! ```text
//! T: 0 (12345) P:99 I:100 C: 10000 Min:      5 Act:   12 Avg:   15 Max:      85
//! ```
//!
//! The parser scans for the first such line and reads the integer after
//! each of the `Min:`/`Avg:`/`Max:` labels. Anything else (garbage
//! output, truncated lines, non-numeric fields) is a [`ParseError`]
//! value carrying a bounded excerpt of the raw output for diagnostics;
//! the parser never panics past its boundary.

use thiserror::Error;

/// Upper bound on raw output carried inside a parse error.
pub const MAX_RAW_DIAGNOSTIC: usize = 500;

/// Failure to extract latency figures from probe output.
#[derive(Debug, Clone, Error)]
#[error("failed to parse probe output: {message}")]
pub struct ParseError {
    /// What went wrong
    pub message: String,
    /// Raw output, truncated to [`MAX_RAW_DIAGNOSTIC`] bytes
    pub raw_output: String,
}

impl ParseError {
    fn new(message: impl Into<String>, raw: &str) -> Self {
        let mut raw_output = raw.to_string();
        if raw_output.len() > MAX_RAW_DIAGNOSTIC {
            let mut cut = MAX_RAW_DIAGNOSTIC;
            while !raw_output.is_char_boundary(cut) {
                cut -= 1;
            }
            raw_output.truncate(cut);
        }
        Self {
            message: message.into(),
            raw_output,
        }
    }
}

/// Latency figures extracted from one summary line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencySummary {
    /// Value following `Min:`
    pub min_us: Option<u64>,
    /// Value following `Avg:`
    pub avg_us: Option<u64>,
    /// Value following `Max:`; always present in a successful parse
    pub max_us: u64,
}

/// Extract the latency summary from raw probe output.
pub fn parse_summary(output: &str) -> Result<LatencySummary, ParseError> {
    for line in output.lines() {
        let line = line.trim();
        if !(line.starts_with("T:") && line.contains("Min:") && line.contains("Max:")) {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let mut min_us = None;
        let mut avg_us = None;
        let mut max_us = None;

        for (i, token) in tokens.iter().enumerate() {
            let slot = match *token {
                "Min:" => &mut min_us,
                "Avg:" => &mut avg_us,
                "Max:" => &mut max_us,
                _ => continue,
            };
            let Some(value) = tokens.get(i + 1) else {
                return Err(ParseError::new(
                    format!("label '{token}' at end of summary line"),
                    output,
                ));
            };
            match value.parse::<u64>() {
                Ok(parsed) => *slot = Some(parsed),
                Err(_) => {
                    return Err(ParseError::new(
                        format!("non-integer value '{value}' after '{token}'"),
                        output,
                    ));
                }
            }
        }

        return match max_us {
            Some(max_us) => Ok(LatencySummary {
                min_us,
                avg_us,
                max_us,
            }),
            None => Err(ParseError::new("summary line carries no Max: value", output)),
        };
    }

    Err(ParseError::new("no summary line found", output))
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD_LINE: &str =
        "T: 0 (12345) P:99 I:100 C:  10000 Min:      5 Act:   12 Avg:   15 Max:      85";

    #[test]
    fn parses_the_canonical_line() {
        let summary = parse_summary(GOOD_LINE).expect("canonical line parses");
        assert_eq!(summary.min_us, Some(5));
        assert_eq!(summary.avg_us, Some(15));
        assert_eq!(summary.max_us, 85);
    }

    #[test]
    fn finds_the_summary_among_noise() {
        let output = format!(
            "# /dev/cpu_dma_latency set to 0us\npolicy: fifo: loadavg: 0.52\n{GOOD_LINE}\n"
        );
        let summary = parse_summary(&output).expect("summary found");
        assert_eq!(summary.max_us, 85);
    }

    #[test]
    fn min_le_avg_le_max_gives_nonnegative_jitter() {
        let summary = parse_summary(GOOD_LINE).unwrap();
        let jitter = summary.max_us - summary.min_us.unwrap();
        assert!(jitter > 0);
        assert!(summary.min_us.unwrap() <= summary.avg_us.unwrap());
        assert!(summary.avg_us.unwrap() <= summary.max_us);
    }

    #[test]
    fn garbage_output_is_a_parse_error() {
        let err = parse_summary("cyclictest: unrecognized option").unwrap_err();
        assert!(err.message.contains("no summary line"));
    }

    #[test]
    fn non_integer_field_is_a_parse_error() {
        let err = parse_summary("T: 0 P:99 Min: five Avg: 15 Max: 85").unwrap_err();
        assert!(err.message.contains("non-integer"));
    }

    #[test]
    fn truncated_line_is_a_parse_error() {
        let err = parse_summary("T: 0 P:99 Min: 5 Avg: 15 Max:").unwrap_err();
        assert!(err.message.contains("end of summary line"));
    }

    #[test]
    fn raw_diagnostic_is_bounded() {
        let noise = "x".repeat(5000);
        let err = parse_summary(&noise).unwrap_err();
        assert!(err.raw_output.len() <= MAX_RAW_DIAGNOSTIC);
    }

    #[test]
    fn empty_output_is_a_parse_error() {
        assert!(parse_summary("").is_err());
    }
}
