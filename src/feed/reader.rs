use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;

use crate::error::Result;
use crate::geo;

use super::FeedVariant;

/// Column-header date format shared by every feed variant.
const DATE_FORMAT: &str = "%m/%d/%y";

/// One loaded source CSV: geography columns resolved to indices up front,
/// reporting-day columns parsed from the header, rows held for keyed
/// lookup against sibling tables.
pub struct SourceTable {
    variant: FeedVariant,
    subdivision_col: usize,
    country_col: usize,
    county_col: Option<usize>,
    dates: Vec<(usize, NaiveDate)>,
    rows: Vec<StringRecord>,
}

impl SourceTable {
    pub fn load(path: impl AsRef<Path>, variant: FeedVariant) -> Result<Self> {
        let reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path.as_ref())?;
        Self::parse(reader, variant)
    }

    pub fn from_reader<R: Read>(source: R, variant: FeedVariant) -> Result<Self> {
        let reader = csv::ReaderBuilder::new().flexible(true).from_reader(source);
        Self::parse(reader, variant)
    }

    fn parse<R: Read>(mut reader: csv::Reader<R>, variant: FeedVariant) -> Result<Self> {
        let headers = reader.headers()?.clone();
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);

        let subdivision_col = find(variant.subdivision_column()).ok_or_else(|| {
            anyhow::anyhow!("source is missing column {:?}", variant.subdivision_column())
        })?;
        let country_col = find(variant.country_column()).ok_or_else(|| {
            anyhow::anyhow!("source is missing column {:?}", variant.country_column())
        })?;
        let county_col = match variant.county_column() {
            Some(name) => Some(
                find(name)
                    .ok_or_else(|| anyhow::anyhow!("source is missing column {:?}", name))?,
            ),
            None => None,
        };

        // every header that parses as a date is a reporting-day column
        let dates: Vec<(usize, NaiveDate)> = headers
            .iter()
            .enumerate()
            .filter_map(|(idx, header)| {
                NaiveDate::parse_from_str(header.trim(), DATE_FORMAT)
                    .ok()
                    .map(|day| (idx, day))
            })
            .collect();

        if dates.is_empty() {
            return Err(anyhow::anyhow!("source has no reporting-day columns").into());
        }

        let rows = reader
            .records()
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            variant,
            subdivision_col,
            country_col,
            county_col,
            dates,
            rows,
        })
    }

    pub fn variant(&self) -> FeedVariant {
        self.variant
    }

    pub fn rows(&self) -> &[StringRecord] {
        &self.rows
    }

    /// Reporting days, in header order, paired with their column index.
    pub fn dates(&self) -> &[(usize, NaiveDate)] {
        &self.dates
    }

    pub fn column_for(&self, day: NaiveDate) -> Option<usize> {
        self.dates
            .iter()
            .find(|&&(_, d)| d == day)
            .map(|&(col, _)| col)
    }

    pub fn subdivision<'a>(&self, row: &'a StringRecord) -> &'a str {
        row.get(self.subdivision_col).unwrap_or("").trim()
    }

    pub fn country<'a>(&self, row: &'a StringRecord) -> &'a str {
        row.get(self.country_col).unwrap_or("").trim()
    }

    pub fn county<'a>(&self, row: &'a StringRecord) -> Option<&'a str> {
        self.county_col.map(|col| row.get(col).unwrap_or("").trim())
    }

    /// Find the row for a geography key. Sibling deaths/recovered tables
    /// are aligned to the confirmed table this way; a key with no match
    /// means the sibling simply does not cover that geography.
    pub fn find_row(
        &self,
        subdivision: &str,
        country: &str,
        county: Option<&str>,
    ) -> Option<&StringRecord> {
        self.rows.iter().find(|row| {
            geo::names_equal(self.subdivision(row), subdivision)
                && geo::names_equal(self.country(row), country)
                && match (self.county_col, county) {
                    (Some(_), Some(want)) => {
                        geo::names_equal(self.county(row).unwrap_or(""), want)
                    }
                    (Some(_), None) => self.county(row).unwrap_or("").is_empty(),
                    (None, _) => true,
                }
        })
    }
}

/// Parse one count cell. Empty or non-numeric cells are "not reported";
/// numeric cells are rounded to a non-negative integer.
pub fn parse_count(cell: &str) -> Option<i64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    let value: f64 = cell.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some((value.round() as i64).max(0))
}
