use serde::{Deserialize, Serialize};

/// Reserved id meaning "no finer geography reported" at every level.
///
/// The row named `None` with this id is seeded by the schema so the
/// uniqueness key on `cases` stays total even when a fact carries no
/// subdivision or county.
pub const NONE_ID: i64 = 0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Country {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subdivision {
    pub id: i64,
    pub name: String,
    pub country: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct County {
    pub id: i64,
    pub name: String,
    pub subdivision: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoLevel {
    Country,
    Subdivision,
    County,
}

impl GeoLevel {
    pub fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "country" => Some(GeoLevel::Country),
            "subdivision" => Some(GeoLevel::Subdivision),
            "county" => Some(GeoLevel::County),
            _ => None,
        }
    }
}
