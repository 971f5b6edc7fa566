use chrono::NaiveDate;
use csv::StringRecord;

use crate::error::Result;
use crate::feed::{parse_count, SourceTable};
use crate::geo::{self, SubdivisionName};

/// Counts for one reporting day, aligned across the three series tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCounts {
    pub day: NaiveDate,
    pub positive_cases: i64,
    pub deaths: i64,
    pub recovered: i64,
}

/// Geography of one source row, resolved to canonical names but not yet
/// to ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowGeography {
    pub country: String,
    pub subdivision: Option<String>,
    pub county: Option<String>,
    /// The row was folded into a coarser subdivision by synonym resolution
    /// and must take the additive path even for tracked days.
    pub synonym_merge: bool,
}

/// One normalized source row: canonical geography plus its per-day counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRow {
    pub geography: RowGeography,
    pub counts: Vec<DayCounts>,
}

/// Normalize one confirmed-table row against its row-aligned sibling
/// deaths/recovered tables.
///
/// Returns `None` for rows outside this feed's jurisdiction: the US county
/// feed is authoritative for US data, so the global feed's "US" rows are
/// dropped here rather than double counted.
pub fn normalize_row(
    confirmed: &SourceTable,
    row: &StringRecord,
    deaths: &SourceTable,
    recovered: Option<&SourceTable>,
) -> Result<Option<NormalizedRow>> {
    let variant = confirmed.variant();
    let subdivision_raw = confirmed.subdivision(row);
    let country_raw = confirmed.country(row);
    let county_raw = confirmed.county(row);

    let country = match variant.implicit_country() {
        Some(country) => country.to_string(),
        None => {
            let country = geo::normalize_name(country_raw);
            if country.eq_ignore_ascii_case("US") {
                return Ok(None);
            }
            country
        }
    };

    let (subdivision, synonym_merge) = if subdivision_raw.is_empty() {
        (None, false)
    } else {
        match geo::resolve_subdivision_name(subdivision_raw)? {
            SubdivisionName::Direct(name) => (Some(name), false),
            SubdivisionName::StateSynonym(state) => (Some(state.to_string()), true),
        }
    };

    // a synonym-merged row contributes to the state's own aggregate, so its
    // county (if any) is not kept as a separate geography
    let county = if synonym_merge {
        None
    } else {
        county_raw
            .map(geo::normalize_name)
            .filter(|name| !name.is_empty())
    };

    // row-aligned sibling rows; a key with no match zero-fills, it never
    // fails the row
    let death_row = deaths.find_row(subdivision_raw, country_raw, county_raw);
    let recovered_row =
        recovered.and_then(|table| table.find_row(subdivision_raw, country_raw, county_raw));

    let mut counts = Vec::new();
    for &(col, day) in confirmed.dates() {
        // a missing confirmed cell means the day is not yet reported for
        // this geography; the fact is skipped, not zeroed
        let Some(positive_cases) = parse_count(row.get(col).unwrap_or("")) else {
            continue;
        };

        let deaths_count = death_row
            .and_then(|r| deaths.column_for(day).map(|c| r.get(c).unwrap_or("")))
            .and_then(parse_count)
            .unwrap_or(0);
        let recovered_count = recovered
            .zip(recovered_row)
            .and_then(|(table, r)| table.column_for(day).map(|c| r.get(c).unwrap_or("")))
            .and_then(parse_count)
            .unwrap_or(0);

        counts.push(DayCounts {
            day,
            positive_cases,
            deaths: deaths_count,
            recovered: recovered_count,
        });
    }

    Ok(Some(NormalizedRow {
        geography: RowGeography {
            country,
            subdivision,
            county,
            synonym_merge,
        },
        counts,
    }))
}
