use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesMode {
    Raw,
    RollingAverage,
    Derivative,
}

impl SeriesMode {
    pub fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "raw" => Some(SeriesMode::Raw),
            "rolling-average" => Some(SeriesMode::RollingAverage),
            "derivative" => Some(SeriesMode::Derivative),
            _ => None,
        }
    }
}

/// One point of a queried series. Counts are `None` only on the first day
/// of a derivative series; raw and rolling-average points are always
/// populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub day: NaiveDate,
    pub positive_cases: Option<i64>,
    pub deaths: Option<i64>,
    pub recovered: Option<i64>,
}
