use std::collections::HashSet;

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::geo::{self, NYC_BOROUGHS, NYC_CITY_COUNTY, NYC_SUBDIVISION};
use crate::models::{BoroughPolicy, NewFact};

use super::schema::SCHEMA;

/// Day storage format; ISO dates sort chronologically as text.
pub(crate) const DAY_FORMAT: &str = "%Y-%m-%d";

pub struct Repository {
    pub(crate) conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;

        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    /// In-memory store for tests.
    #[cfg(test)]
    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;

        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // Geography resolution
    //
    // Each resolver is one idempotent upsert that returns the id whether
    // the row existed or was just created. Names are normalized before the
    // lookup; the no-op update keeps the first-seen spelling.

    pub async fn resolve_country(&self, name: &str) -> Result<i64> {
        let name = geo::normalize_name(name);
        let id = self
            .conn
            .call(move |conn| {
                let id = conn.query_row(
                    "INSERT INTO country (name) VALUES (?1)
                     ON CONFLICT(name) DO UPDATE SET name = name
                     RETURNING id",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(id)
            })
            .await?;
        Ok(id)
    }

    pub async fn resolve_subdivision(&self, name: &str, country: i64) -> Result<i64> {
        let name = geo::normalize_name(name);
        let id = self
            .conn
            .call(move |conn| {
                let id = conn.query_row(
                    "INSERT INTO subdivision (name, country) VALUES (?1, ?2)
                     ON CONFLICT(name, country) DO UPDATE SET name = name
                     RETURNING id",
                    params![name, country],
                    |row| row.get(0),
                )?;
                Ok(id)
            })
            .await?;
        Ok(id)
    }

    pub async fn resolve_county(&self, name: &str, subdivision: i64) -> Result<i64> {
        let name = geo::normalize_name(name);
        let id = self
            .conn
            .call(move |conn| {
                let id = conn.query_row(
                    "INSERT INTO county (name, subdivision) VALUES (?1, ?2)
                     ON CONFLICT(name, subdivision) DO UPDATE SET name = name
                     RETURNING id",
                    params![name, subdivision],
                    |row| row.get(0),
                )?;
                Ok(id)
            })
            .await?;
        Ok(id)
    }

    // Fact reconciliation
    //
    // Each write commits on its own, so an aborted run keeps every fact
    // written before the fault.

    /// Insert a fact unless one already holds the key; first writer wins.
    pub async fn insert_fact(&self, fact: NewFact) -> Result<()> {
        let day = fact.day.format(DAY_FORMAT).to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO cases (day, country, subdivision, county, positive_cases, deaths, recovered)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     ON CONFLICT(day, country, subdivision, county) DO NOTHING",
                    params![
                        day,
                        fact.country,
                        fact.subdivision,
                        fact.county,
                        fact.positive_cases,
                        fact.deaths,
                        fact.recovered,
                    ],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Upsert a fact, summing column-wise into any fact already at the key.
    pub async fn merge_fact(&self, fact: NewFact) -> Result<()> {
        let day = fact.day.format(DAY_FORMAT).to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO cases (day, country, subdivision, county, positive_cases, deaths, recovered)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     ON CONFLICT(day, country, subdivision, county) DO UPDATE SET
                         positive_cases = positive_cases + excluded.positive_cases,
                         deaths = deaths + excluded.deaths,
                         recovered = recovered + excluded.recovered",
                    params![
                        day,
                        fact.country,
                        fact.subdivision,
                        fact.county,
                        fact.positive_cases,
                        fact.deaths,
                        fact.recovered,
                    ],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    // Tracked dates

    pub async fn tracked_dates(&self) -> Result<HashSet<NaiveDate>> {
        let days = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare("SELECT day FROM tracked_dates")?;
                let days = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(days)
            })
            .await?;

        Ok(days
            .iter()
            .filter_map(|day| NaiveDate::parse_from_str(day, DAY_FORMAT).ok())
            .collect())
    }

    pub async fn track_dates(&self, days: Vec<NaiveDate>) -> Result<()> {
        let days: Vec<String> = days
            .into_iter()
            .map(|day| day.format(DAY_FORMAT).to_string())
            .collect();
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare("INSERT OR IGNORE INTO tracked_dates (day) VALUES (?1)")?;
                for day in &days {
                    stmt.execute(params![day])?;
                }
                Ok(())
            })
            .await?;
        Ok(())
    }

    // Borough cleanup

    /// Remove the transitional NYC borough county rows under "New York".
    ///
    /// `Drop` deletes the borough facts outright; `MergeUp` first folds
    /// each borough fact into the same-day "New York City" county fact.
    /// Returns the number of fact rows removed.
    pub async fn cleanup_boroughs(&self, policy: BoroughPolicy) -> Result<usize> {
        let removed = self
            .conn
            .call(move |conn| {
                let subdivision: Option<i64> = conn
                    .query_row(
                        "SELECT s.id FROM subdivision s
                         JOIN country c ON s.country = c.id
                         WHERE s.name = ?1 AND c.name = 'US'",
                        params![NYC_SUBDIVISION],
                        |row| row.get(0),
                    )
                    .optional()?;
                let Some(subdivision) = subdivision else {
                    return Ok(0);
                };

                let mut removed = 0;
                for borough in NYC_BOROUGHS {
                    let county: Option<i64> = conn
                        .query_row(
                            "SELECT id FROM county WHERE name = ?1 AND subdivision = ?2",
                            params![borough, subdivision],
                            |row| row.get(0),
                        )
                        .optional()?;
                    let Some(county) = county else {
                        continue;
                    };

                    if policy == BoroughPolicy::MergeUp {
                        let city: i64 = conn.query_row(
                            "INSERT INTO county (name, subdivision) VALUES (?1, ?2)
                             ON CONFLICT(name, subdivision) DO UPDATE SET name = name
                             RETURNING id",
                            params![NYC_CITY_COUNTY, subdivision],
                            |row| row.get(0),
                        )?;
                        conn.execute(
                            "INSERT INTO cases (day, country, subdivision, county, positive_cases, deaths, recovered)
                             SELECT day, country, subdivision, ?1, positive_cases, deaths, recovered
                             FROM cases WHERE county = ?2
                             ON CONFLICT(day, country, subdivision, county) DO UPDATE SET
                                 positive_cases = positive_cases + excluded.positive_cases,
                                 deaths = deaths + excluded.deaths,
                                 recovered = recovered + excluded.recovered",
                            params![city, county],
                        )?;
                    }

                    removed += conn.execute("DELETE FROM cases WHERE county = ?1", params![county])?;
                    conn.execute("DELETE FROM county WHERE id = ?1", params![county])?;
                }
                Ok(removed)
            })
            .await?;
        Ok(removed)
    }
}
