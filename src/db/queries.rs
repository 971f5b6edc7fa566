use chrono::NaiveDate;
use rusqlite::{params, Row};

use crate::error::Result;
use crate::models::{Country, County, GeoLevel, SeriesMode, SeriesPoint, Subdivision};

use super::repository::{Repository, DAY_FORMAT};

// Read-only queries consumed by the dashboard. Listings come back
// alphabetical and series chronological because the consumer renders them
// positionally.

impl Repository {
    pub async fn list_countries(&self) -> Result<Vec<Country>> {
        let countries = self
            .conn
            .call(|conn| {
                let mut stmt =
                    conn.prepare("SELECT id, name FROM country WHERE id > 0 ORDER BY name")?;
                let countries = stmt
                    .query_map([], |row| {
                        Ok(Country {
                            id: row.get(0)?,
                            name: row.get(1)?,
                        })
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(countries)
            })
            .await?;
        Ok(countries)
    }

    pub async fn list_subdivisions(&self, country: i64) -> Result<Vec<Subdivision>> {
        let subdivisions = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, name, country FROM subdivision
                     WHERE id > 0 AND country = ?1 ORDER BY name",
                )?;
                let subdivisions = stmt
                    .query_map(params![country], |row| {
                        Ok(Subdivision {
                            id: row.get(0)?,
                            name: row.get(1)?,
                            country: row.get(2)?,
                        })
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(subdivisions)
            })
            .await?;
        Ok(subdivisions)
    }

    pub async fn list_counties(&self, subdivision: i64) -> Result<Vec<County>> {
        let counties = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, name, subdivision FROM county
                     WHERE id > 0 AND subdivision = ?1 ORDER BY name",
                )?;
                let counties = stmt
                    .query_map(params![subdivision], |row| {
                        Ok(County {
                            id: row.get(0)?,
                            name: row.get(1)?,
                            subdivision: row.get(2)?,
                        })
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(counties)
            })
            .await?;
        Ok(counties)
    }

    /// Fetch the series for one geography, in the requested mode.
    pub async fn series(
        &self,
        level: GeoLevel,
        geography: i64,
        mode: SeriesMode,
    ) -> Result<Vec<SeriesPoint>> {
        let sql = format!(
            "SELECT day, positive_cases, deaths, recovered FROM {}
             WHERE geo = ?1 ORDER BY day",
            view_name(level, mode)
        );
        let points = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let points = stmt
                    .query_map(params![geography], |row| Ok(point_from_row(row)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(points)
            })
            .await?;
        Ok(points)
    }

    /// Fetch the world aggregate, the per-day sum across every country.
    pub async fn world_series(&self, mode: SeriesMode) -> Result<Vec<SeriesPoint>> {
        let sql = format!(
            "SELECT day, positive_cases, deaths, recovered FROM {} ORDER BY day",
            world_view_name(mode)
        );
        let points = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let points = stmt
                    .query_map([], |row| Ok(point_from_row(row)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(points)
            })
            .await?;
        Ok(points)
    }
}

fn view_name(level: GeoLevel, mode: SeriesMode) -> &'static str {
    match (level, mode) {
        (GeoLevel::Country, SeriesMode::Raw) => "country_daily",
        (GeoLevel::Country, SeriesMode::RollingAverage) => "country_rolling",
        (GeoLevel::Country, SeriesMode::Derivative) => "country_derivative",
        (GeoLevel::Subdivision, SeriesMode::Raw) => "subdivision_daily",
        (GeoLevel::Subdivision, SeriesMode::RollingAverage) => "subdivision_rolling",
        (GeoLevel::Subdivision, SeriesMode::Derivative) => "subdivision_derivative",
        (GeoLevel::County, SeriesMode::Raw) => "county_daily",
        (GeoLevel::County, SeriesMode::RollingAverage) => "county_rolling",
        (GeoLevel::County, SeriesMode::Derivative) => "county_derivative",
    }
}

fn world_view_name(mode: SeriesMode) -> &'static str {
    match mode {
        SeriesMode::Raw => "world_daily",
        SeriesMode::RollingAverage => "world_rolling",
        SeriesMode::Derivative => "world_derivative",
    }
}

fn point_from_row(row: &Row) -> SeriesPoint {
    SeriesPoint {
        day: row
            .get::<_, String>(0)
            .ok()
            .and_then(|day| NaiveDate::parse_from_str(&day, DAY_FORMAT).ok())
            .unwrap_or_default(),
        positive_cases: row.get(1).unwrap(),
        deaths: row.get(2).unwrap(),
        recovered: row.get(3).unwrap(),
    }
}
