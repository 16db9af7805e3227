//! demandwatch - demand/supply extraction core for regional electricity feeds
//!
//! Japanese regional electricity operators publish fixed-layout CSV dumps
//! with the day's demand readings, generation components, and peak supply
//! figures. This crate turns one raw payload into structured readings and
//! derived metrics: it decodes the legacy-encoded bytes, slices the
//! five-minute and hourly series plus the peak blocks out of known row
//! offsets, selects the most recent published reading, computes the
//! utilization percentage against peak supply, classifies alert severity,
//! and assembles the results for downstream sinks (a status message, a
//! mutation payload, a key-value store record set).
//!
//! Fetching the payload, loading credentials, posting to a sink, and
//! scheduling are all external collaborators: bytes come in, records go
//! out, and every failure in between is a typed [`DemandError`].
//!
//! # Pipeline
//!
//! raw bytes → [`RawTable`] → [`extract`] (per [`LayoutSpec`]) →
//! [`select`] → [`metrics`] → [`record`], or all at once via
//! [`run_cycle`].
//!
//! # Example
//!
//! ```no_run
//! use chrono::{FixedOffset, TimeZone};
//! use demandwatch::{run_cycle, Area};
//!
//! let payload: Vec<u8> = Vec::new(); // fetched by an external collaborator
//! let jst = FixedOffset::east_opt(9 * 3600).unwrap();
//! let now = jst.with_ymd_and_hms(2024, 1, 1, 12, 10, 0).unwrap();
//!
//! let out = run_cycle(&payload, &Area::Tokyo.layout(), now)?;
//! println!("{}", out.status_text);
//! # Ok::<(), demandwatch::DemandError>(())
//! ```

pub mod cycle;
pub mod error;
pub mod extract;
pub mod layout;
pub mod metrics;
pub mod raw_table;
pub mod record;
pub mod select;
pub mod types;

// Re-export the public surface for easier access
pub use cycle::{run_cycle, CycleOutput};
pub use error::{DecodeError, DemandError, ParseError, Section};
pub use layout::{Area, LayoutSpec};
pub use metrics::{compute_peak, compute_utilization, AlertLevel, PeakKind};
pub use raw_table::RawTable;
pub use record::{
    FiveMinRecord, HourlyRecord, MutationPayload, PeakRecord, RecordBuilder, StoreRecord,
};
pub use types::{FiveMinReading, FiveMinRow, HourlyRow, PeakMetrics, Reading};
