use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One (day, geography) tuple of counts ready to be reconciled into the
/// fact table. Geography ids are already resolved; counts are never
/// negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewFact {
    pub day: NaiveDate,
    pub country: i64,
    pub subdivision: i64,
    pub county: i64,
    pub positive_cases: i64,
    pub deaths: i64,
    pub recovered: i64,
}

/// How a source file's facts reconcile against facts already at the same
/// key: first writer wins, or column-wise summation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergePolicy {
    #[default]
    Replace,
    Additive,
}

/// What the borough cleanup pass does with NYC borough-level county rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoroughPolicy {
    /// Delete the borough county rows and their facts outright.
    #[default]
    Drop,
    /// Fold each borough fact into the same-day "New York City" county
    /// fact, then delete.
    MergeUp,
}
