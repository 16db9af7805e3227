//! Peak metrics, utilization percentage, and alert severity
//!
//! The peak blocks are single rows at fixed offsets carrying the day's
//! declared supply capacity and forecast maximum demand, once by amount and
//! once as a percentage of supply. Utilization is current demand over peak
//! supply; severity is a fixed-threshold classification of that percentage.
//!
//! The thresholds are a policy constant of the alerting system, not derived
//! from the data, and use strict greater-than so that historical alert
//! behavior is reproduced exactly: a reading of exactly 92% is still
//! [`AlertLevel::None`].

use serde::Serialize;

use crate::error::{DemandError, ParseError, Section};
use crate::extract::peak_row;
use crate::layout::LayoutSpec;
use crate::types::{parse_amount, PeakMetrics};

/// Utilization above this is a 注意報 (watch)
pub const WATCH_THRESHOLD: f64 = 92.0;

/// Utilization above this is a 警報 (warning)
pub const WARNING_THRESHOLD: f64 = 95.0;

/// Utilization above this is a 緊急警報 (critical)
pub const CRITICAL_THRESHOLD: f64 = 97.0;

/// Alert severity band for a utilization percentage
///
/// Stateless and recomputed every cycle; ordering follows severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    None,
    Watch,
    Warning,
    Critical,
}

impl AlertLevel {
    /// Classify a utilization percentage
    ///
    /// The four bands partition `[0, ∞)` with no gaps or overlaps; boundary
    /// values map to the lower band (strict greater-than).
    ///
    /// # Examples
    ///
    /// ```
    /// use demandwatch::AlertLevel;
    ///
    /// assert_eq!(AlertLevel::from_percentage(90.0), AlertLevel::None);
    /// assert_eq!(AlertLevel::from_percentage(92.5), AlertLevel::Watch);
    /// assert_eq!(AlertLevel::from_percentage(98.0), AlertLevel::Critical);
    /// // Boundaries belong to the lower band
    /// assert_eq!(AlertLevel::from_percentage(97.0), AlertLevel::Warning);
    /// ```
    pub fn from_percentage(percentage: f64) -> AlertLevel {
        if percentage > CRITICAL_THRESHOLD {
            AlertLevel::Critical
        } else if percentage > WARNING_THRESHOLD {
            AlertLevel::Warning
        } else if percentage > WATCH_THRESHOLD {
            AlertLevel::Watch
        } else {
            AlertLevel::None
        }
    }

    /// Operator-facing label, as published in the status message
    pub fn label(&self) -> &'static str {
        match self {
            AlertLevel::None => "",
            AlertLevel::Watch => "注意報",
            AlertLevel::Warning => "警報",
            AlertLevel::Critical => "緊急警報",
        }
    }

    /// Whether any alert band is active
    ///
    /// Callers use this for delivery policy (the status message is
    /// typically published with reduced visibility when no band is active).
    pub fn is_alert(&self) -> bool {
        !matches!(self, AlertLevel::None)
    }
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AlertLevel::None => "none",
            AlertLevel::Watch => "watch",
            AlertLevel::Warning => "warning",
            AlertLevel::Critical => "critical",
        };
        write!(f, "{}", name)
    }
}

/// Which peak block to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PeakKind {
    /// The block reporting forecast maximum demand by amount
    Amount,
    /// The block reporting forecast maximum demand as a percentage of supply
    Percentage,
}

impl PeakKind {
    /// Stable identifier used in store record keys
    pub fn as_str(&self) -> &'static str {
        match self {
            PeakKind::Amount => "amount",
            PeakKind::Percentage => "percentage",
        }
    }

    fn section(&self) -> Section {
        match self {
            PeakKind::Amount => Section::PeakAmount,
            PeakKind::Percentage => Section::PeakPercentage,
        }
    }
}

fn block_field<'a>(
    fields: &'a [String],
    index: usize,
    section: Section,
    name: &'static str,
) -> Result<&'a str, ParseError> {
    fields
        .get(index)
        .map(String::as_str)
        .ok_or(ParseError::MissingField {
            section,
            field: name,
        })
}

/// Read one peak block into metrics
///
/// The supply row carries the declared capacity in field 0. The demand row
/// carries the forecast maximum in field 0 and the expected hour band in
/// field 1; when the layout has a reserve-percentage field, the reserve sits
/// in field 2 and the usage percentage shifts to field 3, otherwise the
/// percentage is field 2 and the reserve is fixed at 0.
pub fn compute_peak(
    lines: &[String],
    layout: &LayoutSpec,
    kind: PeakKind,
) -> Result<PeakMetrics, DemandError> {
    let section = kind.section();
    let (supply_row_idx, demand_row_idx) = layout.peak_rows(section);

    let supply_fields = peak_row(lines, layout, section, supply_row_idx)?;
    let demand_fields = peak_row(lines, layout, section, demand_row_idx)?;

    let peak_supply = parse_amount(
        "peak supply",
        block_field(&supply_fields, 0, section, "peak supply")?,
    )?;
    let peak_demand = parse_amount(
        "peak demand",
        block_field(&demand_fields, 0, section, "peak demand")?,
    )?;
    let expected_hour = block_field(&demand_fields, 1, section, "expected hour")?.to_string();

    let (reserve_pct, peak_percentage) = if layout.has_reserve_pct {
        let reserve = parse_amount(
            "reserve percentage",
            block_field(&demand_fields, 2, section, "reserve percentage")?,
        )?;
        let pct = parse_amount(
            "peak percentage",
            block_field(&demand_fields, 3, section, "peak percentage")?,
        )?;
        (reserve, pct)
    } else {
        let pct = parse_amount(
            "peak percentage",
            block_field(&demand_fields, 2, section, "peak percentage")?,
        )?;
        (0.0, pct)
    };

    Ok(PeakMetrics {
        peak_supply,
        peak_demand,
        peak_percentage,
        expected_hour,
        reserve_pct,
    })
}

/// Utilization percentage: `100 * demand / peak supply`
///
/// Pure and idempotent. Fails with
/// [`DemandError::DivisionUndefined`] when peak supply is not positive;
/// the cycle reports failure instead of emitting a garbage percentage.
///
/// # Examples
///
/// ```
/// use demandwatch::metrics::compute_utilization;
///
/// let pct = compute_utilization(4500.0, 5000.0, "tokyo").unwrap();
/// assert_eq!(pct, 90.0);
///
/// assert!(compute_utilization(4500.0, 0.0, "tokyo").is_err());
/// ```
pub fn compute_utilization(
    demand_mw: f64,
    peak_supply_mw: f64,
    area: &str,
) -> Result<f64, DemandError> {
    if !(peak_supply_mw > 0.0) {
        return Err(DemandError::DivisionUndefined {
            area: area.to_string(),
            peak_supply: peak_supply_mw,
        });
    }
    Ok(demand_mw * 100.0 / peak_supply_mw)
}
