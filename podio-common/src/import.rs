//! Bulk talk-list import parser
//!
//! Converts a free-text block pasted by an administrator (one
//! `"N. Title"` entry per line) into validated `(number, title)` records.
//! Malformed lines are collected as rejections and never abort the batch;
//! only an empty input body is a hard error.
//!
//! # Pure Functions
//!
//! This module contains ONLY pure functions. Applying the parsed records
//! against the catalog lives in [`crate::db::catalog`].

use crate::{Error, Result};
use serde::Serialize;

/// Lowest accepted talk number (inclusive)
pub const MIN_TALK_NUMBER: i64 = 1;

/// Highest accepted talk number (inclusive)
pub const MAX_TALK_NUMBER: i64 = 200;

/// Maximum rejection messages shown to the user in one response.
///
/// This is a display cap only: the full rejection list is always returned
/// to the caller, and the presentation layer truncates.
pub const DISPLAY_LIMIT: usize = 5;

/// Why a line was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// No `". "` or `"."` separator between number and title
    InvalidFormat,
    /// Prefix before the separator is not all decimal digits
    InvalidNumber,
    /// Parsed number falls outside `MIN_TALK_NUMBER..=MAX_TALK_NUMBER`
    OutOfRange,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::InvalidFormat => write!(f, "invalid format"),
            RejectReason::InvalidNumber => write!(f, "invalid number"),
            RejectReason::OutOfRange => write!(f, "number out of range"),
        }
    }
}

/// One successfully parsed line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedTalk {
    pub number: i64,
    pub title: String,
}

/// One rejected line with its 1-based index (blank lines counted)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedLine {
    pub line_number: usize,
    pub text: String,
    pub reason: RejectReason,
}

impl RejectedLine {
    /// User-facing message for this rejection
    pub fn message(&self) -> String {
        format!("Line {}: {} - '{}'", self.line_number, self.reason, self.text)
    }
}

/// Result of parsing one pasted text block
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParseOutcome {
    pub talks: Vec<ParsedTalk>,
    pub rejected: Vec<RejectedLine>,
}

impl ParseOutcome {
    /// First `DISPLAY_LIMIT` rejection messages, formatted for display
    pub fn warning_messages(&self) -> Vec<String> {
        self.rejected
            .iter()
            .take(DISPLAY_LIMIT)
            .map(RejectedLine::message)
            .collect()
    }
}

/// Parse a pasted talk list into `(number, title)` records.
///
/// Input must be non-empty after trimming; otherwise returns
/// `Error::InvalidInput` and nothing is parsed. Blank lines are skipped
/// silently (they still count toward line numbering). A single bad line
/// never aborts the batch.
pub fn parse_talk_list(input: &str) -> Result<ParseOutcome> {
    if input.trim().is_empty() {
        return Err(Error::InvalidInput(
            "talk list is empty".to_string(),
        ));
    }

    let mut outcome = ParseOutcome::default();

    for (index, raw_line) in input.lines().enumerate() {
        let line_number = index + 1;
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_line(line) {
            Ok(talk) => outcome.talks.push(talk),
            Err(reason) => outcome.rejected.push(RejectedLine {
                line_number,
                text: line.to_string(),
                reason,
            }),
        }
    }

    Ok(outcome)
}

/// Parse a single trimmed, non-blank line
fn parse_line(line: &str) -> std::result::Result<ParsedTalk, RejectReason> {
    // Prefer the two-character ". " separator, fall back to a lone "."
    let (prefix, rest) = if let Some(pos) = line.find(". ") {
        (&line[..pos], &line[pos + 2..])
    } else if let Some(pos) = line.find('.') {
        (&line[..pos], &line[pos + 1..])
    } else {
        return Err(RejectReason::InvalidFormat);
    };

    let prefix = prefix.trim();
    let title = rest.trim();

    if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_digit()) {
        return Err(RejectReason::InvalidNumber);
    }

    // All-digit strings too long for i64 are out of range by definition
    let number: i64 = prefix.parse().map_err(|_| RejectReason::OutOfRange)?;
    if !(MIN_TALK_NUMBER..=MAX_TALK_NUMBER).contains(&number) {
        return Err(RejectReason::OutOfRange);
    }

    Ok(ParsedTalk {
        number,
        title: title.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed_lines_parsed() {
        let outcome = parse_talk_list("1. Topic One\n2. Topic Two").unwrap();
        assert_eq!(outcome.rejected.len(), 0);
        assert_eq!(
            outcome.talks,
            vec![
                ParsedTalk { number: 1, title: "Topic One".to_string() },
                ParsedTalk { number: 2, title: "Topic Two".to_string() },
            ]
        );
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(parse_talk_list("").is_err());
        assert!(parse_talk_list("   \n\t  \n").is_err());
    }

    #[test]
    fn test_blank_lines_skipped_silently() {
        let outcome = parse_talk_list("1. One\n\n   \n2. Two\n").unwrap();
        assert_eq!(outcome.talks.len(), 2);
        assert_eq!(outcome.rejected.len(), 0);
    }

    #[test]
    fn test_blank_lines_count_toward_line_numbers() {
        let outcome = parse_talk_list("1. One\n\nbogus line\n").unwrap();
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].line_number, 3);
    }

    #[test]
    fn test_period_without_space_accepted() {
        let outcome = parse_talk_list("7.Tight Title").unwrap();
        assert_eq!(outcome.talks[0].number, 7);
        assert_eq!(outcome.talks[0].title, "Tight Title");
    }

    #[test]
    fn test_period_space_preferred_over_lone_period() {
        // "1. A.B" must split at ". ", keeping the title's inner period
        let outcome = parse_talk_list("1. A.B").unwrap();
        assert_eq!(outcome.talks[0].title, "A.B");
    }

    #[test]
    fn test_missing_separator_is_invalid_format() {
        let outcome = parse_talk_list("no separator here").unwrap();
        assert_eq!(outcome.rejected[0].reason, RejectReason::InvalidFormat);
    }

    #[test]
    fn test_non_digit_prefix_is_invalid_number() {
        let outcome = parse_talk_list("abc. Bad Line").unwrap();
        assert_eq!(outcome.rejected[0].reason, RejectReason::InvalidNumber);
    }

    #[test]
    fn test_range_boundaries() {
        let outcome = parse_talk_list("1. Low\n200. High\n0. Too Low\n201. Too High").unwrap();
        assert_eq!(outcome.talks.len(), 2);
        assert_eq!(outcome.rejected.len(), 2);
        assert!(outcome
            .rejected
            .iter()
            .all(|r| r.reason == RejectReason::OutOfRange));
    }

    #[test]
    fn test_overflowing_digits_out_of_range() {
        let outcome = parse_talk_list("99999999999999999999. Huge").unwrap();
        assert_eq!(outcome.rejected[0].reason, RejectReason::OutOfRange);
    }

    #[test]
    fn test_whitespace_trimmed_from_number_and_title() {
        let outcome = parse_talk_list("  42.   Padded Title  ").unwrap();
        assert_eq!(outcome.talks[0].number, 42);
        assert_eq!(outcome.talks[0].title, "Padded Title");
    }

    #[test]
    fn test_example_scenario() {
        let input = "1. Topic One\n2. Topic Two\nabc. Bad Line\n500. Out of Range";
        let outcome = parse_talk_list(input).unwrap();

        assert_eq!(outcome.talks.len(), 2);
        assert_eq!(outcome.rejected.len(), 2);
        assert_eq!(outcome.rejected[0].line_number, 3);
        assert_eq!(outcome.rejected[0].reason, RejectReason::InvalidNumber);
        assert_eq!(outcome.rejected[1].line_number, 4);
        assert_eq!(outcome.rejected[1].reason, RejectReason::OutOfRange);
    }

    #[test]
    fn test_warning_messages_capped_for_display() {
        let input = "x\nx\nx\nx\nx\nx\nx";
        let outcome = parse_talk_list(input).unwrap();

        assert_eq!(outcome.rejected.len(), 7);
        let warnings = outcome.warning_messages();
        assert_eq!(warnings.len(), DISPLAY_LIMIT);
        assert_eq!(warnings[0], "Line 1: invalid format - 'x'");
    }
}
