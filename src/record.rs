//! Output record assembly
//!
//! Pure assembly, no I/O: the selected readings and computed metrics are
//! packaged into the three shapes downstream sinks consume: a
//! human-readable status sentence, a mutation payload with camelCase keys,
//! and per-table store records with composite keys.
//!
//! Source rows carry only a time-of-day, so the absolute instant downstream
//! consumers need for ordering and deduplication is synthesized here from
//! the caller-supplied current local date and the row's `TIME` field, in the
//! region's fixed UTC offset.
//!
//! Demand and supply are published in whole 万kW units; numeric fields are
//! coerced to integers at this stage, truncating fractional values toward
//! zero.

use chrono::{DateTime, FixedOffset, NaiveTime, SecondsFormat};
use serde::Serialize;

use crate::error::{DemandError, ParseError};
use crate::layout::LayoutSpec;
use crate::metrics::{AlertLevel, PeakKind};
use crate::types::{parse_amount, parse_optional_amount, FiveMinReading, HourlyRow, PeakMetrics};

/// Integer coercion used for every numeric record field
///
/// Truncation toward zero, not rounding; this preserves the historical
/// behavior of the published records.
fn to_whole(value: f64) -> i64 {
    value.trunc() as i64
}

/// Peak-block record (one per peak kind per cycle)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeakRecord {
    pub area: String,
    /// Current local date, `YYYY-MM-DD`
    pub date: String,
    /// Peak supply capacity in 万kW
    pub supply: i64,
    /// Forecast maximum demand in 万kW
    pub amount: i64,
    /// Forecast maximum demand as a percentage of supply
    pub percentage: i64,
    /// Reserve percentage at the peak; 0 when the source has none
    pub reserve_pct: i64,
    /// Hour band the peak is expected in, source-verbatim
    pub expected_hour: String,
}

/// Hourly demand record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyRecord {
    pub area: String,
    /// Date string, source-verbatim
    pub date: String,
    /// Absolute instant of the hour slot, RFC 3339 in the region's offset
    pub abs_date: String,
    /// Hour slot, source-verbatim (e.g. "13:00")
    pub time: String,
    /// Actual demand in 万kW
    pub amount: i64,
    /// Expected demand in 万kW
    pub expected: i64,
    /// Supply capacity in 万kW
    pub supply: i64,
    /// Published utilization percentage for the hour
    pub percentage: i64,
    /// Published reserve percentage; 0 when the source has none
    pub reserve_pct: i64,
}

/// Five-minute demand record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FiveMinRecord {
    pub area: String,
    /// Date string, source-verbatim
    pub date: String,
    /// Absolute instant of the slot, RFC 3339 in the region's offset
    pub abs_date: String,
    /// Slot time, source-verbatim (e.g. "12:05")
    pub time: String,
    /// Demand in 万kW
    pub amount: i64,
    /// Solar generation in 万kW; 0 when not published
    pub solar: i64,
    /// Wind generation in 万kW; 0 when not published
    pub wind: i64,
}

/// Mutation payload for the GraphQL sink
///
/// Four flat mappings under fixed keys; `five` is the demand-latest
/// five-minute record (a skewed solar record, when present, is carried in
/// the store record set instead).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MutationPayload {
    pub peak: PeakRecord,
    #[serde(rename = "peakPct")]
    pub peak_pct: PeakRecord,
    pub hourly: HourlyRecord,
    pub five: FiveMinRecord,
}

impl MutationPayload {
    /// The payload as a JSON variables object
    pub fn to_variables(&self) -> serde_json::Value {
        serde_json::json!({
            "peak": self.peak,
            "peakPct": self.peak_pct,
            "hourly": self.hourly,
            "five": self.five,
        })
    }
}

/// One record for the key-value store sink
///
/// Each variant maps to a table-equivalent; the key is a composite of area,
/// date, and a type/slot discriminator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StoreRecord {
    PeakElectricity { kind: PeakKind, record: PeakRecord },
    HourlyDemand(HourlyRecord),
    FiveMinDemand(FiveMinRecord),
}

impl StoreRecord {
    /// Table-equivalent name
    pub fn table(&self) -> &'static str {
        match self {
            StoreRecord::PeakElectricity { .. } => "PeakElectricity",
            StoreRecord::HourlyDemand(_) => "HourlyDemand",
            StoreRecord::FiveMinDemand(_) => "FiveMinDemand",
        }
    }

    /// Composite store key: `area:date:discriminator`
    pub fn key(&self) -> String {
        match self {
            StoreRecord::PeakElectricity { kind, record } => {
                format!("{}:{}:{}", record.area, record.date, kind.as_str())
            }
            StoreRecord::HourlyDemand(record) => {
                format!("{}:{}:{}", record.area, record.date, record.time)
            }
            StoreRecord::FiveMinDemand(record) => {
                format!("{}:{}:{}", record.area, record.date, record.time)
            }
        }
    }
}

/// Assembles output records for one extraction cycle
///
/// Holds the layout (for area identity) and the caller-supplied current
/// local date/time; everything else is passed per call. No ambient clock
/// and no service handles.
#[derive(Debug, Clone)]
pub struct RecordBuilder<'a> {
    layout: &'a LayoutSpec,
    now: DateTime<FixedOffset>,
}

impl<'a> RecordBuilder<'a> {
    pub fn new(layout: &'a LayoutSpec, now: DateTime<FixedOffset>) -> RecordBuilder<'a> {
        RecordBuilder { layout, now }
    }

    /// Current local date in the configured offset, `YYYY-MM-DD`
    fn local_date(&self) -> String {
        self.now.format("%Y-%m-%d").to_string()
    }

    /// Combine the current local date with a row's `HH:MM` time-of-day into
    /// an RFC 3339 instant in the region's offset
    pub fn absolute_timestamp(&self, time: &str) -> Result<String, DemandError> {
        let time_of_day = NaiveTime::parse_from_str(time.trim(), "%H:%M")
            .map_err(|_| ParseError::InvalidTime(time.to_string()))?;
        let instant = self
            .now
            .date_naive()
            .and_time(time_of_day)
            .and_local_timezone(*self.now.offset())
            .single()
            .ok_or_else(|| ParseError::InvalidTime(time.to_string()))?;
        Ok(instant.to_rfc3339_opts(SecondsFormat::Secs, false))
    }

    /// Package one peak block
    pub fn peak_record(&self, metrics: &PeakMetrics) -> PeakRecord {
        PeakRecord {
            area: self.layout.area_id.clone(),
            date: self.local_date(),
            supply: to_whole(metrics.peak_supply),
            amount: to_whole(metrics.peak_demand),
            percentage: to_whole(metrics.peak_percentage),
            reserve_pct: to_whole(metrics.reserve_pct),
            expected_hour: metrics.expected_hour.clone(),
        }
    }

    /// Package the selected hourly row
    ///
    /// The row was chosen by demand validity, so every mandatory numeric
    /// field is expected to be present; a blank or garbled one is format
    /// drift and fails the cycle.
    pub fn hourly_record(&self, row: &HourlyRow) -> Result<HourlyRecord, DemandError> {
        let reserve_pct = match &row.reserve_pct {
            Some(value) => parse_optional_amount("RESERVE_PCT", value)?,
            None => 0.0,
        };
        Ok(HourlyRecord {
            area: self.layout.area_id.clone(),
            date: row.date.clone(),
            abs_date: self.absolute_timestamp(&row.time)?,
            time: row.time.clone(),
            amount: to_whole(parse_amount("DEMAND", &row.demand)?),
            expected: to_whole(parse_amount("EXPECTED", &row.expected)?),
            supply: to_whole(parse_amount("SUPPLY", &row.supply)?),
            percentage: to_whole(parse_amount("PERCENTAGE", &row.percentage)?),
            reserve_pct: to_whole(reserve_pct),
        })
    }

    /// Package a five-minute reading
    pub fn five_min_record(&self, reading: &FiveMinReading) -> Result<FiveMinRecord, DemandError> {
        Ok(FiveMinRecord {
            area: self.layout.area_id.clone(),
            date: reading.date.clone(),
            abs_date: self.absolute_timestamp(&reading.time)?,
            time: reading.time.clone(),
            amount: to_whole(reading.demand_mw),
            solar: to_whole(reading.solar_mw),
            wind: to_whole(reading.wind_mw),
        })
    }

    /// The operator-facing status sentence
    ///
    /// Format preserved verbatim from the published messages; the severity
    /// label is prefixed with a space only when a band is active.
    pub fn status_text(
        &self,
        reading: &FiveMinReading,
        peak_supply: f64,
        percentage: f64,
        severity: AlertLevel,
    ) -> String {
        let label = if severity.is_alert() {
            format!(" {}", severity.label())
        } else {
            String::new()
        };
        format!(
            "【{}管内 電力使用状況{}】{} {}の電力使用量は{}万kWでした。ピーク時供給力 {}万kW に対する使用率は {:.2}%です。",
            self.layout.area_name,
            label,
            reading.date,
            reading.time,
            to_whole(reading.demand_mw),
            to_whole(peak_supply),
            percentage
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Area;
    use chrono::TimeZone;

    fn jst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    fn noon() -> DateTime<FixedOffset> {
        jst().with_ymd_and_hms(2024, 1, 1, 12, 10, 0).unwrap()
    }

    fn reading() -> FiveMinReading {
        FiveMinReading {
            date: "2024/1/1".to_string(),
            time: "12:05".to_string(),
            demand_mw: 4500.0,
            solar_mw: 300.0,
            wind_mw: 0.0,
        }
    }

    fn peaks() -> PeakMetrics {
        PeakMetrics {
            peak_supply: 5000.0,
            peak_demand: 4600.0,
            peak_percentage: 92.0,
            expected_hour: "17:00〜18:00".to_string(),
            reserve_pct: 0.0,
        }
    }

    #[test]
    fn test_absolute_timestamp_combines_date_and_time() {
        let layout = Area::Tokyo.layout();
        let builder = RecordBuilder::new(&layout, noon());
        assert_eq!(
            builder.absolute_timestamp("12:05").unwrap(),
            "2024-01-01T12:05:00+09:00"
        );
        // Single-digit hour, as published
        assert_eq!(
            builder.absolute_timestamp("9:00").unwrap(),
            "2024-01-01T09:00:00+09:00"
        );
    }

    #[test]
    fn test_absolute_timestamp_rejects_garbage() {
        let layout = Area::Tokyo.layout();
        let builder = RecordBuilder::new(&layout, noon());
        let err = builder.absolute_timestamp("25:70").unwrap_err();
        assert!(matches!(
            err,
            DemandError::Parse(ParseError::InvalidTime(_))
        ));
    }

    #[test]
    fn test_truncation_toward_zero() {
        assert_eq!(to_whole(4500.0), 4500);
        assert_eq!(to_whole(4500.9), 4500);
        assert_eq!(to_whole(-0.5), 0);
    }

    #[test]
    fn test_peak_record_round_trip() {
        let layout = Area::Tokyo.layout();
        let builder = RecordBuilder::new(&layout, noon());
        let record = builder.peak_record(&peaks());

        assert_eq!(record.area, "tokyo");
        assert_eq!(record.date, "2024-01-01");
        // Integer-valued inputs survive coercion exactly
        assert_eq!(record.supply, 5000);
        assert_eq!(record.amount, 4600);
        assert_eq!(record.percentage, 92);
        assert_eq!(record.reserve_pct, 0);
        assert_eq!(record.expected_hour, "17:00〜18:00");
    }

    #[test]
    fn test_five_min_record_fields() {
        let layout = Area::Tokyo.layout();
        let builder = RecordBuilder::new(&layout, noon());
        let record = builder.five_min_record(&reading()).unwrap();

        assert_eq!(record.abs_date, "2024-01-01T12:05:00+09:00");
        assert_eq!(record.amount, 4500);
        assert_eq!(record.solar, 300);
        assert_eq!(record.wind, 0);
    }

    #[test]
    fn test_hourly_record_fields() {
        let layout = Area::Tokyo.layout();
        let builder = RecordBuilder::new(&layout, noon());
        let row = HourlyRow {
            date: "2024/1/1".to_string(),
            time: "11:00".to_string(),
            demand: "4400".to_string(),
            expected: "4600".to_string(),
            percentage: "88".to_string(),
            reserve_pct: None,
            supply: "5000".to_string(),
        };
        let record = builder.hourly_record(&row).unwrap();

        assert_eq!(record.abs_date, "2024-01-01T11:00:00+09:00");
        assert_eq!(record.amount, 4400);
        assert_eq!(record.expected, 4600);
        assert_eq!(record.supply, 5000);
        assert_eq!(record.percentage, 88);
        assert_eq!(record.reserve_pct, 0);
    }

    #[test]
    fn test_hourly_record_blank_mandatory_field_fails() {
        let layout = Area::Tokyo.layout();
        let builder = RecordBuilder::new(&layout, noon());
        let row = HourlyRow {
            date: "2024/1/1".to_string(),
            time: "11:00".to_string(),
            demand: "4400".to_string(),
            expected: String::new(),
            percentage: "88".to_string(),
            reserve_pct: None,
            supply: "5000".to_string(),
        };
        assert!(builder.hourly_record(&row).is_err());
    }

    #[test]
    fn test_status_text_without_alert() {
        let layout = Area::Tokyo.layout();
        let builder = RecordBuilder::new(&layout, noon());
        let text = builder.status_text(&reading(), 5000.0, 90.0, AlertLevel::None);
        assert_eq!(
            text,
            "【東京電力パワーグリッド管内 電力使用状況】2024/1/1 12:05の電力使用量は4500万kWでした。ピーク時供給力 5000万kW に対する使用率は 90.00%です。"
        );
    }

    #[test]
    fn test_status_text_with_alert_label() {
        let layout = Area::Tokyo.layout();
        let builder = RecordBuilder::new(&layout, noon());
        let text = builder.status_text(&reading(), 5000.0, 98.0, AlertLevel::Critical);
        assert!(text.contains("電力使用状況 緊急警報】"));
        assert!(text.contains("98.00%"));
    }

    #[test]
    fn test_mutation_payload_keys() {
        let layout = Area::Tokyo.layout();
        let builder = RecordBuilder::new(&layout, noon());
        let payload = MutationPayload {
            peak: builder.peak_record(&peaks()),
            peak_pct: builder.peak_record(&peaks()),
            hourly: builder
                .hourly_record(&HourlyRow {
                    date: "2024/1/1".to_string(),
                    time: "11:00".to_string(),
                    demand: "4400".to_string(),
                    expected: "4600".to_string(),
                    percentage: "88".to_string(),
                    reserve_pct: None,
                    supply: "5000".to_string(),
                })
                .unwrap(),
            five: builder.five_min_record(&reading()).unwrap(),
        };

        let value = payload.to_variables();
        let object = value.as_object().unwrap();
        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["five", "hourly", "peak", "peakPct"]);

        // Flat mappings use camelCase field names
        assert!(value["peak"]["expectedHour"].is_string());
        assert!(value["hourly"]["absDate"].is_string());
        assert_eq!(value["five"]["amount"], 4500);
    }

    #[test]
    fn test_store_record_keys() {
        let layout = Area::Tokyo.layout();
        let builder = RecordBuilder::new(&layout, noon());

        let peak = StoreRecord::PeakElectricity {
            kind: PeakKind::Amount,
            record: builder.peak_record(&peaks()),
        };
        assert_eq!(peak.table(), "PeakElectricity");
        assert_eq!(peak.key(), "tokyo:2024-01-01:amount");

        let five = StoreRecord::FiveMinDemand(builder.five_min_record(&reading()).unwrap());
        assert_eq!(five.table(), "FiveMinDemand");
        assert_eq!(five.key(), "tokyo:2024/1/1:12:05");
    }
}
