//! Row and reading types for the demand feeds
//!
//! Region rows keep every field as text, exactly as published: unpublished
//! future slots are blank placeholders, and whether a slot counts as a
//! reading is decided at selection time, not at parse time. Numeric coercion
//! happens when a row is promoted to a [`Reading`].
//!
//! Everything here is constructed fresh for a single extraction cycle and
//! discarded once the output records are built; there is no shared state and
//! no multi-cycle history.

use crate::error::{DemandError, ParseError};
use crate::metrics;

/// One row of the five-minute region (text fields, source-verbatim)
#[derive(Debug, Clone, PartialEq)]
pub struct FiveMinRow {
    /// Date string as published (e.g. "2024/1/1")
    pub date: String,

    /// Time-of-day string as published (e.g. "12:05")
    pub time: String,

    /// Demand in 万kW; blank until the slot is published
    pub demand: String,

    /// Solar generation in 万kW; blank until published
    pub solar: String,

    /// Wind generation in 万kW; None when the operator does not publish a
    /// wind column
    pub wind: Option<String>,
}

/// One row of the hourly region (text fields, source-verbatim)
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyRow {
    /// Date string as published
    pub date: String,

    /// Hour slot as published (e.g. "13:00")
    pub time: String,

    /// Actual demand in 万kW; blank until the hour closes
    pub demand: String,

    /// Expected demand for the hour in 万kW
    pub expected: String,

    /// Published utilization percentage for the hour
    pub percentage: String,

    /// Published reserve percentage; None when the operator does not
    /// publish the column
    pub reserve_pct: Option<String>,

    /// Supply capacity for the hour in 万kW
    pub supply: String,
}

/// The most recent published demand reading of a region
///
/// Date and time keep the source format verbatim; only the demand amount is
/// coerced to a number.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub date: String,
    pub time: String,
    /// Demand in 万kW, non-negative
    pub demand_mw: f64,
}

impl Reading {
    /// Utilization percentage of this reading against a peak supply
    ///
    /// Structured-reading counterpart of
    /// [`compute_utilization`](crate::metrics::compute_utilization).
    pub fn utilization_against(&self, peak_supply_mw: f64, area: &str) -> Result<f64, DemandError> {
        metrics::compute_utilization(self.demand_mw, peak_supply_mw, area)
    }
}

/// A five-minute reading with its generation components
///
/// Solar and wind default to 0 when the source leaves them blank or does
/// not publish the column.
#[derive(Debug, Clone, PartialEq)]
pub struct FiveMinReading {
    pub date: String,
    pub time: String,
    pub demand_mw: f64,
    pub solar_mw: f64,
    pub wind_mw: f64,
}

impl FiveMinReading {
    /// Promote a five-minute row to a reading, coercing the numeric fields
    ///
    /// Blank optional fields become 0; a field with non-numeric content is a
    /// [`ParseError`], since that indicates format drift rather than a slot
    /// that has not been published yet.
    pub fn from_row(row: &FiveMinRow) -> Result<FiveMinReading, DemandError> {
        Ok(FiveMinReading {
            date: row.date.clone(),
            time: row.time.clone(),
            demand_mw: parse_optional_amount("DEMAND", &row.demand)?,
            solar_mw: parse_optional_amount("SOLAR", &row.solar)?,
            wind_mw: match &row.wind {
                Some(value) => parse_optional_amount("WIND", value)?,
                None => 0.0,
            },
        })
    }

    /// The demand portion of this reading
    pub fn demand_reading(&self) -> Reading {
        Reading {
            date: self.date.clone(),
            time: self.time.clone(),
            demand_mw: self.demand_mw,
        }
    }
}

/// Peak-block metrics for one peak type (amount or percentage)
#[derive(Debug, Clone, PartialEq)]
pub struct PeakMetrics {
    /// Peak supply capacity declared for the day, in 万kW
    pub peak_supply: f64,

    /// Forecast maximum demand, in 万kW
    pub peak_demand: f64,

    /// Forecast maximum demand as a percentage of peak supply
    pub peak_percentage: f64,

    /// Hour band the peak is expected in (e.g. "17:00〜18:00")
    pub expected_hour: String,

    /// Reserve percentage at the peak; 0 when the operator does not
    /// publish it
    pub reserve_pct: f64,
}

/// Parse a mandatory numeric field
///
/// # Examples
///
/// ```
/// use demandwatch::types::parse_amount;
///
/// assert_eq!(parse_amount("DEMAND", "4500").unwrap(), 4500.0);
/// assert!(parse_amount("DEMAND", "").is_err());
/// assert!(parse_amount("DEMAND", "4,500").is_err());
/// ```
pub fn parse_amount(field: &'static str, value: &str) -> Result<f64, ParseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ParseError::InvalidNumber {
            field,
            value: value.to_string(),
        });
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ParseError::InvalidNumber {
            field,
            value: value.to_string(),
        })
}

/// Parse a numeric field where blank means "not published", coerced to 0
///
/// # Examples
///
/// ```
/// use demandwatch::types::parse_optional_amount;
///
/// assert_eq!(parse_optional_amount("SOLAR", "300").unwrap(), 300.0);
/// assert_eq!(parse_optional_amount("SOLAR", "").unwrap(), 0.0);
/// assert!(parse_optional_amount("SOLAR", "n/a").is_err());
/// ```
pub fn parse_optional_amount(field: &'static str, value: &str) -> Result<f64, ParseError> {
    if value.trim().is_empty() {
        return Ok(0.0);
    }
    parse_amount(field, value)
}
