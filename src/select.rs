//! Latest-valid-reading selection
//!
//! The feeds publish a full day of slots up front and fill them in as the
//! day progresses, so "the current reading" is the last row whose value
//! field holds a positive number; everything after it is a zero/blank
//! placeholder. Selection scans backwards from the last row and returns the
//! first valid one, which is deterministic and always the most recent
//! published reading.
//!
//! Solar is scanned independently of demand: the generation series can lag
//! or lead demand reporting by a different cadence, so its latest valid row
//! is not necessarily the demand-latest row.

use crate::error::{DemandError, Section};
use crate::types::{FiveMinRow, HourlyRow};

/// A field holds a valid reading when it parses as a strictly positive,
/// finite number. Blank, non-numeric, zero and NaN values are all
/// placeholder states.
fn positive_value(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
}

/// Backward scan: the first row (from the end) whose selected field is a
/// valid reading, together with the parsed value.
fn scan_latest<'a, R>(
    rows: &'a [R],
    field: impl Fn(&R) -> &str,
) -> Option<(&'a R, f64)> {
    rows.iter()
        .rev()
        .find_map(|row| positive_value(field(row)).map(|value| (row, value)))
}

/// The most recent five-minute row with a published demand value
///
/// # Errors
///
/// [`DemandError::NoValidReading`] when every demand field in the region is
/// blank or zero, the expected state before the first slot of the day is
/// published. The caller retries later; this is never defaulted to a zero
/// reading.
pub fn latest_five_min_demand<'a>(
    region: &'a [FiveMinRow],
    area: &str,
) -> Result<(&'a FiveMinRow, f64), DemandError> {
    scan_latest(region, |row| row.demand.as_str()).ok_or_else(|| DemandError::NoValidReading {
        area: area.to_string(),
        series: Section::FiveMin,
    })
}

/// The most recent hourly row with a published demand value
pub fn latest_hourly_demand<'a>(
    region: &'a [HourlyRow],
    area: &str,
) -> Result<(&'a HourlyRow, f64), DemandError> {
    scan_latest(region, |row| row.demand.as_str()).ok_or_else(|| DemandError::NoValidReading {
        area: area.to_string(),
        series: Section::Hourly,
    })
}

/// The most recent five-minute row with a published solar value
///
/// Returns `None` when no slot has positive solar output yet (routine
/// before dawn), which is not an error: only the demand series is mandatory
/// for a cycle. When the returned row's `time` differs from the
/// demand-latest row's `time`, the two series have skewed and both rows
/// should be emitted as distinct records.
pub fn latest_five_min_solar(region: &[FiveMinRow]) -> Option<(&FiveMinRow, f64)> {
    scan_latest(region, |row| row.solar.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn five_min_row(time: &str, demand: &str, solar: &str) -> FiveMinRow {
        FiveMinRow {
            date: "2024/1/1".to_string(),
            time: time.to_string(),
            demand: demand.to_string(),
            solar: solar.to_string(),
            wind: None,
        }
    }

    fn hourly_row(time: &str, demand: &str) -> HourlyRow {
        HourlyRow {
            date: "2024/1/1".to_string(),
            time: time.to_string(),
            demand: demand.to_string(),
            expected: "4100".to_string(),
            percentage: "82".to_string(),
            reserve_pct: None,
            supply: "5000".to_string(),
        }
    }

    #[test]
    fn test_latest_demand_is_last_valid_row() {
        let region = vec![
            five_min_row("11:55", "4400", "280"),
            five_min_row("12:00", "4450", "290"),
            five_min_row("12:05", "4500", "300"),
            five_min_row("12:10", "", ""),
            five_min_row("12:15", "", ""),
        ];
        let (row, demand) = latest_five_min_demand(&region, "tokyo").unwrap();
        assert_eq!(row.time, "12:05");
        assert_eq!(demand, 4500.0);
    }

    #[test]
    fn test_never_returns_earlier_valid_row() {
        // A later valid row must win even if earlier rows are valid too
        let region = vec![
            five_min_row("0:00", "3000", "0"),
            five_min_row("0:05", "", ""),
            five_min_row("0:10", "3100", "0"),
        ];
        let (row, _) = latest_five_min_demand(&region, "tokyo").unwrap();
        assert_eq!(row.time, "0:10");
    }

    #[test]
    fn test_zero_and_blank_are_placeholders() {
        let region = vec![
            five_min_row("0:00", "3000", "0"),
            five_min_row("0:05", "0", ""),
            five_min_row("0:10", "", ""),
        ];
        let (row, _) = latest_five_min_demand(&region, "tokyo").unwrap();
        assert_eq!(row.time, "0:00");
    }

    #[test]
    fn test_non_numeric_demand_is_invalid() {
        let region = vec![
            five_min_row("0:00", "3000", "0"),
            five_min_row("0:05", "pending", ""),
        ];
        let (row, _) = latest_five_min_demand(&region, "tokyo").unwrap();
        assert_eq!(row.time, "0:00");
    }

    #[test]
    fn test_all_blank_region_is_no_valid_reading() {
        let region = vec![
            five_min_row("0:00", "", ""),
            five_min_row("0:05", "0", "0"),
        ];
        let err = latest_five_min_demand(&region, "tokyo").unwrap_err();
        match err {
            DemandError::NoValidReading { area, series } => {
                assert_eq!(area, "tokyo");
                assert_eq!(series, Section::FiveMin);
            }
            other => panic!("Expected NoValidReading, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_region_is_no_valid_reading() {
        let err = latest_five_min_demand(&[], "tokyo").unwrap_err();
        assert!(matches!(err, DemandError::NoValidReading { .. }));
    }

    #[test]
    fn test_hourly_selection() {
        let region = vec![
            hourly_row("12:00", "4300"),
            hourly_row("13:00", "4350"),
            hourly_row("14:00", ""),
        ];
        let (row, demand) = latest_hourly_demand(&region, "kansai").unwrap();
        assert_eq!(row.time, "13:00");
        assert_eq!(demand, 4350.0);
    }

    #[test]
    fn test_solar_scans_independently_of_demand() {
        // Solar lags demand by one slot here
        let region = vec![
            five_min_row("12:00", "4450", "290"),
            five_min_row("12:05", "4500", ""),
        ];
        let (solar_row, solar) = latest_five_min_solar(&region).unwrap();
        assert_eq!(solar_row.time, "12:00");
        assert_eq!(solar, 290.0);

        let (demand_row, _) = latest_five_min_demand(&region, "tokyo").unwrap();
        assert_ne!(solar_row.time, demand_row.time);
    }

    #[test]
    fn test_solar_absent_before_dawn() {
        let region = vec![
            five_min_row("4:00", "3000", "0"),
            five_min_row("4:05", "3010", "0"),
        ];
        assert!(latest_five_min_solar(&region).is_none());
    }
}
