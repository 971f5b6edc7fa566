use serde::{Deserialize, Serialize};

/// The closed set of source-file layouts the normalizer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeedVariant {
    /// Global time series: `Province/State` and `Country/Region` columns,
    /// no county column, confirmed/deaths/recovered files.
    Global,
    /// US county-level time series: `Province_State`, `Country_Region` and
    /// `Admin2` columns; the country is always "US" and there is no
    /// recovered file.
    UsCounty,
}

impl FeedVariant {
    pub fn subdivision_column(self) -> &'static str {
        match self {
            FeedVariant::Global => "Province/State",
            FeedVariant::UsCounty => "Province_State",
        }
    }

    pub fn country_column(self) -> &'static str {
        match self {
            FeedVariant::Global => "Country/Region",
            FeedVariant::UsCounty => "Country_Region",
        }
    }

    pub fn county_column(self) -> Option<&'static str> {
        match self {
            FeedVariant::Global => None,
            FeedVariant::UsCounty => Some("Admin2"),
        }
    }

    /// The country this feed reports for, when it is not carried per row.
    pub fn implicit_country(self) -> Option<&'static str> {
        match self {
            FeedVariant::Global => None,
            FeedVariant::UsCounty => Some("US"),
        }
    }
}
