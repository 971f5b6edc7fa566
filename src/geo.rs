use crate::error::{AppError, Result};

/// US state and territory postal abbreviations, as they appear as suffixes
/// in compound "County, ST" province literals.
const US_STATES: &[(&str, &str)] = &[
    ("AL", "Alabama"),
    ("AK", "Alaska"),
    ("AZ", "Arizona"),
    ("AR", "Arkansas"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DE", "Delaware"),
    ("DC", "District of Columbia"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("HI", "Hawaii"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("IA", "Iowa"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("ME", "Maine"),
    ("MD", "Maryland"),
    ("MA", "Massachusetts"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MS", "Mississippi"),
    ("MO", "Missouri"),
    ("MT", "Montana"),
    ("NE", "Nebraska"),
    ("NV", "Nevada"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NY", "New York"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VT", "Vermont"),
    ("VA", "Virginia"),
    ("WA", "Washington"),
    ("WV", "West Virginia"),
    ("WI", "Wisconsin"),
    ("WY", "Wyoming"),
    ("PR", "Puerto Rico"),
    ("GU", "Guam"),
    ("VI", "Virgin Islands"),
    ("AS", "American Samoa"),
    ("MP", "Northern Mariana Islands"),
];

/// The five borough-level county names that appear under "New York" before
/// city-level data replaces them.
pub const NYC_BOROUGHS: &[&str] = &["Bronx", "Brooklyn", "Manhattan", "Queens", "Staten Island"];

pub const NYC_SUBDIVISION: &str = "New York";
pub const NYC_CITY_COUNTY: &str = "New York City";

/// Trim and collapse runs of inner whitespace so uniqueness lookups see one
/// spelling per name.
pub fn normalize_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Case- and whitespace-insensitive name comparison, matching how the
/// store's uniqueness constraints compare names.
pub fn names_equal(a: &str, b: &str) -> bool {
    normalize_name(a).eq_ignore_ascii_case(&normalize_name(b))
}

pub fn state_for_abbreviation(abbr: &str) -> Option<&'static str> {
    US_STATES
        .iter()
        .find(|(code, _)| *code == abbr)
        .map(|(_, name)| *name)
}

/// How a raw subdivision literal resolves against the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubdivisionName {
    /// The literal is the subdivision itself.
    Direct(String),
    /// Compound "County, ST" literal. The row's values belong to the full
    /// state's aggregate and must be folded in additively rather than
    /// creating a new subdivision.
    StateSynonym(&'static str),
}

/// Resolve a subdivision literal, handling the compound "County, ST" form.
///
/// A two-uppercase-letter suffix after the last comma must match the state
/// table; one that matches the shape but not the table is an unresolvable
/// geography and fails the run. Everything else (no comma, longer suffix,
/// empty or "None" prefix) is taken verbatim.
pub fn resolve_subdivision_name(raw: &str) -> Result<SubdivisionName> {
    let name = normalize_name(raw);

    if let Some((entity, suffix)) = name.rsplit_once(',') {
        let entity = entity.trim();
        let suffix = suffix.trim();
        let looks_like_state = suffix.len() == 2 && suffix.chars().all(|c| c.is_ascii_uppercase());

        if looks_like_state && !entity.is_empty() && !entity.eq_ignore_ascii_case("none") {
            return match state_for_abbreviation(suffix) {
                Some(state) => Ok(SubdivisionName::StateSynonym(state)),
                None => Err(AppError::UnresolvedGeography { literal: name }),
            };
        }
    }

    Ok(SubdivisionName::Direct(name))
}
