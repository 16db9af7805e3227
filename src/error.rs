//! Error types for the demand extraction core
//!
//! Provides typed errors for all failure modes of an extraction cycle:
//! - Decode errors (payload not valid in the declared encoding)
//! - Layout errors (configured row offsets exceed the decoded line count)
//! - Selection errors (no published reading yet for the requested window)
//! - Metrics errors (non-positive peak supply)
//! - Field parse errors (numeric/time coercion failures)
//!
//! Errors are never swallowed into defaults. Each variant carries the area
//! and the sub-extraction it came from so the caller can decide whether to
//! retry, alert, or skip.

use std::fmt;

/// Top-level error type for one extraction cycle
///
/// Supports automatic conversion from specific error types via From trait
#[derive(Debug, Clone, PartialEq)]
pub enum DemandError {
    /// Payload could not be decoded in the declared encoding
    Decode(DecodeError),

    /// A configured row span exceeds the decoded line count
    ///
    /// Signals an upstream format change; must reach an operator rather than
    /// be silently truncated.
    LayoutOutOfRange {
        area: String,
        section: Section,
        rows_needed: usize,
        rows_available: usize,
    },

    /// No row in the scanned region satisfies the validity predicate
    ///
    /// Expected before any data has been published for the day; the caller
    /// retries later.
    NoValidReading { area: String, series: Section },

    /// Peak supply was zero or negative, so a utilization percentage is
    /// undefined for this cycle
    DivisionUndefined { area: String, peak_supply: f64 },

    /// A field failed numeric or time coercion
    Parse(ParseError),
}

impl fmt::Display for DemandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DemandError::Decode(e) => write!(f, "Decode error: {}", e),
            DemandError::LayoutOutOfRange {
                area,
                section,
                rows_needed,
                rows_available,
            } => write!(
                f,
                "[{}] {} layout out of range: needs rows up to {}, payload has {} lines",
                area, section, rows_needed, rows_available
            ),
            DemandError::NoValidReading { area, series } => {
                write!(f, "[{}] no valid reading published yet in the {}", area, series)
            }
            DemandError::DivisionUndefined { area, peak_supply } => write!(
                f,
                "[{}] utilization undefined: peak supply is {} (must be positive)",
                area, peak_supply
            ),
            DemandError::Parse(e) => write!(f, "Parse error: {}", e),
        }
    }
}

impl std::error::Error for DemandError {}

impl From<DecodeError> for DemandError {
    fn from(err: DecodeError) -> Self {
        DemandError::Decode(err)
    }
}

impl From<ParseError> for DemandError {
    fn from(err: ParseError) -> Self {
        DemandError::Parse(err)
    }
}

/// The sub-extraction a failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// The 289-row five-minute series
    FiveMin,
    /// The 25-row hourly series
    Hourly,
    /// The single-row peak block reported by amount
    PeakAmount,
    /// The single-row peak block reported as a percentage of supply
    PeakPercentage,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Section::FiveMin => "five-minute series",
            Section::Hourly => "hourly series",
            Section::PeakAmount => "peak amount block",
            Section::PeakPercentage => "peak percentage block",
        };
        write!(f, "{}", name)
    }
}

/// Payload decode errors
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// The declared encoding label is not a recognized WHATWG label
    ///
    /// Example: "shift-jis-2004"
    UnknownEncoding(String),

    /// The byte payload is not valid in the declared encoding
    Malformed { encoding: String },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::UnknownEncoding(label) => {
                write!(f, "unknown encoding label: '{}'", label)
            }
            DecodeError::Malformed { encoding } => {
                write!(f, "payload is not valid {} data", encoding)
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// Field-level coercion errors
///
/// These indicate format drift in a published row (a field that should be a
/// number or an HH:MM time is not), as opposed to the blank placeholders of
/// not-yet-published slots.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// A numeric field could not be parsed
    ///
    /// Example: DEMAND = "4,500a"
    InvalidNumber { field: &'static str, value: String },

    /// A time-of-day field is not HH:MM
    ///
    /// Example: TIME = "25:70"
    InvalidTime(String),

    /// A fixed-position row is shorter than the expected field list
    MissingField { section: Section, field: &'static str },

    /// The csv reader rejected a region row (malformed quoting etc.)
    CsvFormat { section: Section, detail: String },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidNumber { field, value } => {
                write!(f, "invalid number in {}: '{}'", field, value)
            }
            ParseError::InvalidTime(value) => {
                write!(f, "invalid time-of-day: '{}' (expected HH:MM)", value)
            }
            ParseError::MissingField { section, field } => {
                write!(f, "{} row is missing the {} field", section, field)
            }
            ParseError::CsvFormat { section, detail } => {
                write!(f, "{} is not parseable CSV: {}", section, detail)
            }
        }
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_conversion() {
        let err = DecodeError::UnknownEncoding("euc-kr-legacy".to_string());
        let core_err: DemandError = err.into();

        match core_err {
            DemandError::Decode(DecodeError::UnknownEncoding(label)) => {
                assert_eq!(label, "euc-kr-legacy");
            }
            _ => panic!("Expected Decode error"),
        }
    }

    #[test]
    fn test_parse_error_conversion() {
        let err = ParseError::InvalidNumber {
            field: "DEMAND",
            value: "4,500a".to_string(),
        };
        let core_err: DemandError = err.into();

        match core_err {
            DemandError::Parse(ParseError::InvalidNumber { field, value }) => {
                assert_eq!(field, "DEMAND");
                assert_eq!(value, "4,500a");
            }
            _ => panic!("Expected Parse error"),
        }
    }

    #[test]
    fn test_layout_error_formatting() {
        let err = DemandError::LayoutOutOfRange {
            area: "tokyo".to_string(),
            section: Section::FiveMin,
            rows_needed: 331,
            rows_available: 40,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("tokyo"));
        assert!(msg.contains("five-minute series"));
        assert!(msg.contains("331"));
        assert!(msg.contains("40"));
    }

    #[test]
    fn test_no_valid_reading_formatting() {
        let err = DemandError::NoValidReading {
            area: "kansai".to_string(),
            series: Section::Hourly,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("kansai"));
        assert!(msg.contains("hourly series"));
    }

    #[test]
    fn test_division_undefined_formatting() {
        let err = DemandError::DivisionUndefined {
            area: "tokyo".to_string(),
            peak_supply: 0.0,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("tokyo"));
        assert!(msg.contains("peak supply"));
    }

    #[test]
    fn test_invalid_time_formatting() {
        let err = ParseError::InvalidTime("25:70".to_string());
        let msg = format!("{}", err);
        assert!(msg.contains("25:70"));
        assert!(msg.contains("HH:MM"));
    }
}
