mod fact;
mod geography;
mod series;

pub use fact::{BoroughPolicy, MergePolicy, NewFact};
pub use geography::{Country, County, GeoLevel, Subdivision, NONE_ID};
pub use series::{SeriesMode, SeriesPoint};
