//! State FIPS codes, postal abbreviations and names.

use crate::error::{Error, Result};

/// (postal code, two-digit FIPS code, name) for the 50 states, DC and PR.
const STATES: [(&str, &str, &str); 52] = [
    ("AL", "01", "Alabama"),
    ("AK", "02", "Alaska"),
    ("AZ", "04", "Arizona"),
    ("AR", "05", "Arkansas"),
    ("CA", "06", "California"),
    ("CO", "08", "Colorado"),
    ("CT", "09", "Connecticut"),
    ("DE", "10", "Delaware"),
    ("DC", "11", "District of Columbia"),
    ("FL", "12", "Florida"),
    ("GA", "13", "Georgia"),
    ("HI", "15", "Hawaii"),
    ("ID", "16", "Idaho"),
    ("IL", "17", "Illinois"),
    ("IN", "18", "Indiana"),
    ("IA", "19", "Iowa"),
    ("KS", "20", "Kansas"),
    ("KY", "21", "Kentucky"),
    ("LA", "22", "Louisiana"),
    ("ME", "23", "Maine"),
    ("MD", "24", "Maryland"),
    ("MA", "25", "Massachusetts"),
    ("MI", "26", "Michigan"),
    ("MN", "27", "Minnesota"),
    ("MS", "28", "Mississippi"),
    ("MO", "29", "Missouri"),
    ("MT", "30", "Montana"),
    ("NE", "31", "Nebraska"),
    ("NV", "32", "Nevada"),
    ("NH", "33", "New Hampshire"),
    ("NJ", "34", "New Jersey"),
    ("NM", "35", "New Mexico"),
    ("NY", "36", "New York"),
    ("NC", "37", "North Carolina"),
    ("ND", "38", "North Dakota"),
    ("OH", "39", "Ohio"),
    ("OK", "40", "Oklahoma"),
    ("OR", "41", "Oregon"),
    ("PA", "42", "Pennsylvania"),
    ("RI", "44", "Rhode Island"),
    ("SC", "45", "South Carolina"),
    ("SD", "46", "South Dakota"),
    ("TN", "47", "Tennessee"),
    ("TX", "48", "Texas"),
    ("UT", "49", "Utah"),
    ("VT", "50", "Vermont"),
    ("VA", "51", "Virginia"),
    ("WA", "53", "Washington"),
    ("WV", "54", "West Virginia"),
    ("WI", "55", "Wisconsin"),
    ("WY", "56", "Wyoming"),
    ("PR", "72", "Puerto Rico"),
];

fn by_fips(fips: &str) -> Option<&'static (&'static str, &'static str, &'static str)> {
    STATES.iter().find(|(_, f, _)| *f == fips)
}

/// Resolve a state given as FIPS code, postal abbreviation or full name
/// (case-insensitive, spaces or underscores) to its two-digit FIPS code.
pub fn normalize_state(state: &str) -> Result<&'static str> {
    let trimmed = state.trim();
    let upper = trimmed.to_ascii_uppercase().replace('_', " ");

    let found = STATES.iter().find(|(abbr, fips, name)| {
        *fips == trimmed
            || (trimmed.len() == 1 && format!("0{trimmed}") == *fips)
            || *abbr == upper
            || name.to_ascii_uppercase() == upper
    });

    found.map(|(_, fips, _)| *fips).ok_or_else(|| Error::UnknownKey {
        what: "state",
        name: state.to_string(),
        valid: "a two-digit FIPS code, postal abbreviation or state name".into(),
    })
}

/// Display name for a FIPS code, e.g. "New York".
pub fn state_name(fips: &str) -> Option<&'static str> { by_fips(fips).map(|s| s.2) }

/// Postal abbreviation for a FIPS code, e.g. "NY".
pub fn state_abbrev(fips: &str) -> Option<&'static str> { by_fips(fips).map(|s| s.0) }

/// All known FIPS codes in ascending order.
pub fn all_fips() -> impl Iterator<Item = &'static str> { STATES.iter().map(|s| s.1) }
