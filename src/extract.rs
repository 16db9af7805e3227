//! Fixed-layout slicing of decoded payloads
//!
//! The demand CSVs are not self-describing: the two time series and the peak
//! blocks sit at known row offsets, and the header rows carry operator-language
//! column names that change wording between operators. Extraction therefore
//! slices fixed row ranges out of the line table and assigns columns by
//! position from the layout-derived schema, instead of looking fields up by
//! header text.
//!
//! A span that does not fit in the decoded payload is a hard
//! [`LayoutOutOfRange`](crate::DemandError::LayoutOutOfRange) error: it means
//! the operator changed the format, and truncating silently would produce
//! plausible-looking garbage.

use csv::ReaderBuilder;

use crate::error::{DemandError, ParseError, Section};
use crate::layout::{LayoutSpec, FIVE_MIN_ROWS, HOURLY_ROWS};
use crate::types::{FiveMinRow, HourlyRow};

/// Slice a fixed row span out of the line table
fn region_slice<'a>(
    lines: &'a [String],
    layout: &LayoutSpec,
    section: Section,
    start: usize,
    rows: usize,
) -> Result<&'a [String], DemandError> {
    let end = start.saturating_add(rows);
    if end > lines.len() {
        return Err(DemandError::LayoutOutOfRange {
            area: layout.area_id.clone(),
            section,
            rows_needed: end,
            rows_available: lines.len(),
        });
    }
    Ok(&lines[start..end])
}

/// Build a csv reader over a joined region slice
///
/// The first row of every region is header-equivalent and is consumed as
/// such; column names are positional and come from the layout, not from the
/// header text.
fn region_reader(slice: &[String]) -> csv::Reader<std::io::Cursor<String>> {
    ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // placeholder rows for future slots can be ragged
        .trim(csv::Trim::All)
        .from_reader(std::io::Cursor::new(slice.join("\n")))
}

/// Extract the five-minute region as typed rows
///
/// Exactly [`FIVE_MIN_ROWS`] consecutive lines starting at
/// `layout.five_min_start`: one header-equivalent row plus 288 five-minute
/// intervals spanning 24 hours. Columns are DATE, TIME, DEMAND, SOLAR and,
/// when `layout.has_wind` is set, WIND.
///
/// Field values stay text; unpublished slots come through as rows with blank
/// fields and are filtered at selection time.
pub fn extract_five_min_region(
    lines: &[String],
    layout: &LayoutSpec,
) -> Result<Vec<FiveMinRow>, DemandError> {
    let slice = region_slice(
        lines,
        layout,
        Section::FiveMin,
        layout.five_min_start,
        FIVE_MIN_ROWS,
    )?;

    let mut reader = region_reader(slice);
    let mut rows = Vec::with_capacity(FIVE_MIN_ROWS - 1);
    for result in reader.records() {
        let record = result.map_err(|e| ParseError::CsvFormat {
            section: Section::FiveMin,
            detail: e.to_string(),
        })?;
        let field = |i: usize| record.get(i).unwrap_or("").to_string();
        rows.push(FiveMinRow {
            date: field(0),
            time: field(1),
            demand: field(2),
            solar: field(3),
            wind: layout.has_wind.then(|| field(4)),
        });
    }
    Ok(rows)
}

/// Extract the hourly region as typed rows
///
/// Exactly [`HOURLY_ROWS`] consecutive lines starting at
/// `layout.hourly_start`: one header-equivalent row plus the 24 hourly
/// slots. Columns are DATE, TIME, DEMAND, EXPECTED, PERCENTAGE and, when
/// `layout.has_five_min_reserve` is set, RESERVE_PCT, then SUPPLY.
pub fn extract_hourly_region(
    lines: &[String],
    layout: &LayoutSpec,
) -> Result<Vec<HourlyRow>, DemandError> {
    let slice = region_slice(
        lines,
        layout,
        Section::Hourly,
        layout.hourly_start,
        HOURLY_ROWS,
    )?;

    let mut reader = region_reader(slice);
    let mut rows = Vec::with_capacity(HOURLY_ROWS - 1);
    for result in reader.records() {
        let record = result.map_err(|e| ParseError::CsvFormat {
            section: Section::Hourly,
            detail: e.to_string(),
        })?;
        let field = |i: usize| record.get(i).unwrap_or("").to_string();
        let (reserve_pct, supply) = if layout.has_five_min_reserve {
            (Some(field(5)), field(6))
        } else {
            (None, field(5))
        };
        rows.push(HourlyRow {
            date: field(0),
            time: field(1),
            demand: field(2),
            expected: field(3),
            percentage: field(4),
            reserve_pct,
            supply,
        });
    }
    Ok(rows)
}

/// Slice a single peak-block row and split it into fields
///
/// Peak blocks are one-line fixed-position slices, not tables, so they are
/// split on commas directly.
pub fn peak_row(
    lines: &[String],
    layout: &LayoutSpec,
    section: Section,
    row: usize,
) -> Result<Vec<String>, DemandError> {
    if row >= lines.len() {
        return Err(DemandError::LayoutOutOfRange {
            area: layout.area_id.clone(),
            section,
            rows_needed: row + 1,
            rows_available: lines.len(),
        });
    }
    Ok(lines[row].split(',').map(|f| f.trim().to_string()).collect())
}
