//! One extraction cycle, end to end
//!
//! `run_cycle` is the whole pipeline: decode the payload, slice the two
//! series and the peak blocks, select the latest readings, compute
//! utilization and severity, and assemble the output shapes. It is purely
//! computational and stateless across cycles; running one cycle per area
//! concurrently needs no coordination beyond collecting the results.
//!
//! Failures propagate as typed [`DemandError`]s; converting one into a
//! best-effort text message, retrying, or skipping is the caller's policy,
//! not this core's.

use chrono::{DateTime, FixedOffset};

use crate::error::DemandError;
use crate::extract::{extract_five_min_region, extract_hourly_region};
use crate::layout::LayoutSpec;
use crate::metrics::{compute_peak, compute_utilization, AlertLevel, PeakKind};
use crate::raw_table::RawTable;
use crate::record::{MutationPayload, RecordBuilder, StoreRecord};
use crate::select::{latest_five_min_demand, latest_five_min_solar, latest_hourly_demand};
use crate::types::FiveMinReading;

/// Everything one cycle produces
///
/// The mutation payload's `five` key carries the demand-latest record; when
/// the solar series has skewed from demand, the store set contains a second
/// five-minute record for the solar-latest slot (persisting it is the
/// caller's decision).
#[derive(Debug, Clone)]
pub struct CycleOutput {
    pub severity: AlertLevel,
    pub utilization_pct: f64,
    pub status_text: String,
    pub mutation: MutationPayload,
    pub store: Vec<StoreRecord>,
}

/// Run one extraction cycle over a raw payload
///
/// # Arguments
///
/// * `payload` - Raw CSV bytes as fetched from the operator
/// * `layout` - The operator's layout (offsets, flags, encoding)
/// * `now` - Current local date/time in the region's timezone; used to
///   synthesize absolute timestamps for time-of-day rows
///
/// # Errors
///
/// Any [`DemandError`]: decode failures, layout drift, no published reading
/// yet, or undefined utilization. Nothing is defaulted.
pub fn run_cycle(
    payload: &[u8],
    layout: &LayoutSpec,
    now: DateTime<FixedOffset>,
) -> Result<CycleOutput, DemandError> {
    let table = RawTable::decode(payload, &layout.encoding)?;
    log::debug!(
        "[{}] decoded {} lines from {} bytes",
        layout.area_id,
        table.len(),
        payload.len()
    );

    let five_region = extract_five_min_region(table.lines(), layout)?;
    let hourly_region = extract_hourly_region(table.lines(), layout)?;

    let peak = compute_peak(table.lines(), layout, PeakKind::Amount)?;
    let peak_pct = compute_peak(table.lines(), layout, PeakKind::Percentage)?;

    let (five_row, _) = latest_five_min_demand(&five_region, &layout.area_id)?;
    let five_reading = FiveMinReading::from_row(five_row)?;
    let (hourly_row, _) = latest_hourly_demand(&hourly_region, &layout.area_id)?;

    let utilization_pct =
        compute_utilization(five_reading.demand_mw, peak.peak_supply, &layout.area_id)?;
    let severity = AlertLevel::from_percentage(utilization_pct);
    log::debug!(
        "[{}] {} {} demand {}万kW / supply {}万kW = {:.2}% ({})",
        layout.area_id,
        five_reading.date,
        five_reading.time,
        five_reading.demand_mw,
        peak.peak_supply,
        utilization_pct,
        severity
    );

    let builder = RecordBuilder::new(layout, now);
    let peak_record = builder.peak_record(&peak);
    let peak_pct_record = builder.peak_record(&peak_pct);
    let hourly_record = builder.hourly_record(hourly_row)?;
    let five_record = builder.five_min_record(&five_reading)?;
    let status_text = builder.status_text(&five_reading, peak.peak_supply, utilization_pct, severity);

    let mut store = vec![
        StoreRecord::PeakElectricity {
            kind: PeakKind::Amount,
            record: peak_record.clone(),
        },
        StoreRecord::PeakElectricity {
            kind: PeakKind::Percentage,
            record: peak_pct_record.clone(),
        },
        StoreRecord::HourlyDemand(hourly_record.clone()),
        StoreRecord::FiveMinDemand(five_record.clone()),
    ];

    // Solar can lag or lead demand reporting by a different cadence; when
    // the two latest rows disagree on the slot, both become records.
    if let Some((solar_row, _)) = latest_five_min_solar(&five_region) {
        if solar_row.time != five_row.time {
            log::warn!(
                "[{}] solar series skewed from demand: latest solar at {}, latest demand at {}",
                layout.area_id,
                solar_row.time,
                five_row.time
            );
            let solar_reading = FiveMinReading::from_row(solar_row)?;
            store.push(StoreRecord::FiveMinDemand(
                builder.five_min_record(&solar_reading)?,
            ));
        }
    }

    Ok(CycleOutput {
        severity,
        utilization_pct,
        status_text,
        mutation: MutationPayload {
            peak: peak_record,
            peak_pct: peak_pct_record,
            hourly: hourly_record,
            five: five_record,
        },
        store,
    })
}
