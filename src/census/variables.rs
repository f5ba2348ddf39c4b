//! PL 94-171 (2020 redistricting) variable dictionary.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Documented PL 94-171 variables and their labels.
pub const VARIABLES: &[(&str, &str)] = &[
    // P1: Race
    ("P1_001N", "Total Population"),
    ("P1_002N", "Population of one race"),
    ("P1_003N", "White alone"),
    ("P1_004N", "Black or African American alone"),
    ("P1_005N", "American Indian and Alaska Native alone"),
    ("P1_006N", "Asian alone"),
    ("P1_007N", "Native Hawaiian and Other Pacific Islander alone"),
    ("P1_008N", "Some Other Race alone"),
    ("P1_009N", "Population of two or more races"),
    ("P1_010N", "Population of two races"),
    ("P1_011N", "White; Black or African American"),
    ("P1_012N", "White; American Indian and Alaska Native"),
    ("P1_013N", "White; Asian"),
    ("P1_014N", "White; Native Hawaiian and Other Pacific Islander"),
    ("P1_015N", "White; Some Other Race"),
    ("P1_016N", "Black or African American; American Indian and Alaska Native"),
    ("P1_017N", "Black or African American; Asian"),
    ("P1_018N", "Black or African American; Native Hawaiian and Other Pacific Islander"),
    ("P1_019N", "Black or African American; Some Other Race"),
    ("P1_020N", "American Indian and Alaska Native; Asian"),
    ("P1_021N", "American Indian and Alaska Native; Native Hawaiian and Other Pacific Islander"),
    ("P1_022N", "American Indian and Alaska Native; Some Other Race"),
    ("P1_023N", "Asian; Native Hawaiian and Other Pacific Islander"),
    ("P1_024N", "Asian; Some Other Race"),
    ("P1_025N", "Native Hawaiian and Other Pacific Islander; Some Other Race"),
    // P2: Hispanic or Latino by race
    ("P2_001N", "Total Population"),
    ("P2_002N", "Hispanic or Latino"),
    ("P2_003N", "Not Hispanic or Latino"),
    ("P2_004N", "Not Hispanic or Latino: Population of one race"),
    ("P2_005N", "Not Hispanic or Latino: White alone"),
    ("P2_006N", "Not Hispanic or Latino: Black or African American alone"),
    ("P2_007N", "Not Hispanic or Latino: American Indian and Alaska Native alone"),
    ("P2_008N", "Not Hispanic or Latino: Asian alone"),
    ("P2_009N", "Not Hispanic or Latino: Native Hawaiian and Other Pacific Islander alone"),
    ("P2_010N", "Not Hispanic or Latino: Some Other Race alone"),
    ("P2_011N", "Not Hispanic or Latino: Population of two or more races"),
    // P3: Race, 18 and over
    ("P3_001N", "Total Population 18 years and over"),
    ("P3_002N", "Population 18+ of one race"),
    ("P3_003N", "Population 18+ White alone"),
    ("P3_004N", "Population 18+ Black or African American alone"),
    ("P3_005N", "Population 18+ American Indian and Alaska Native alone"),
    ("P3_006N", "Population 18+ Asian alone"),
    ("P3_007N", "Population 18+ Native Hawaiian and Other Pacific Islander alone"),
    ("P3_008N", "Population 18+ Some Other Race alone"),
    ("P3_009N", "Population 18+ of two or more races"),
    // P4: Hispanic or Latino by race, 18 and over
    ("P4_001N", "Total Population 18 years and over"),
    ("P4_002N", "Hispanic or Latino 18+"),
    ("P4_003N", "Not Hispanic or Latino 18+"),
    // H1: Housing units
    ("H1_001N", "Total Housing Units"),
    ("H1_002N", "Occupied Housing Units"),
    ("H1_003N", "Vacant Housing Units"),
];

/// Variables selected when none are configured.
pub const DEFAULT_LOOKUP_VARIABLES: &[&str] = &["P1_001N"];

/// Commonly used subset, listed by `variables` and used for quick summaries.
pub const DEFAULT_VARIABLES: &[&str] = &[
    "P1_001N", // Total population
    "P1_003N", // White alone
    "P1_004N", // Black alone
    "P1_005N", // American Indian alone
    "P1_006N", // Asian alone
    "P1_007N", // Pacific Islander alone
    "P1_008N", // Other race alone
    "P2_002N", // Hispanic or Latino
    "P2_005N", // Non-Hispanic White alone
    "P3_001N", // Voting age population
    "H1_001N",
    "H1_002N",
    "H1_003N",
];

/// Label of a PL 94-171 variable.
pub fn describe(variable: &str) -> Option<&'static str> {
    VARIABLES.iter().find(|(code, _)| *code == variable).map(|(_, label)| *label)
}

/// PL 94-171 tables and their titles.
pub fn list_tables() -> &'static [(&'static str, &'static str)] {
    &[
        ("P1", "Race"),
        ("P2", "Hispanic or Latino by Race"),
        ("P3", "Race for Population 18 Years and Over"),
        ("P4", "Hispanic or Latino by Race for Population 18+"),
        ("H1", "Housing Units"),
    ]
}

/// `{table}_{001..=last}N`
fn numbered(table: &str, last: u32) -> Vec<String> {
    (1..=last).map(|i| format!("{table}_{i:03}N")).collect()
}

/// Named PL 94-171 variable groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pl94171Group {
    Population,
    RaceSimple,
    RaceDetailed,
    Hispanic,
    HispanicDetailed,
    VotingAge,
    VotingAgeRace,
    Housing,
    All,
}

impl Pl94171Group {
    pub const ALL: [Pl94171Group; 9] = [
        Self::Population, Self::RaceSimple, Self::RaceDetailed, Self::Hispanic,
        Self::HispanicDetailed, Self::VotingAge, Self::VotingAgeRace, Self::Housing, Self::All,
    ];

    pub fn to_str(self) -> &'static str {
        match self {
            Self::Population => "population",
            Self::RaceSimple => "race_simple",
            Self::RaceDetailed => "race_detailed",
            Self::Hispanic => "hispanic",
            Self::HispanicDetailed => "hispanic_detailed",
            Self::VotingAge => "voting_age",
            Self::VotingAgeRace => "voting_age_race",
            Self::Housing => "housing",
            Self::All => "all",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Population => "Total population only",
            Self::RaceSimple => "Population by major race categories",
            Self::RaceDetailed => "Population by all race combinations",
            Self::Hispanic => "Hispanic/Latino population",
            Self::HispanicDetailed => "Hispanic/Latino by race",
            Self::VotingAge => "Population 18 years and over",
            Self::VotingAgeRace => "Voting age population by race",
            Self::Housing => "Housing unit counts",
            Self::All => "All available variables",
        }
    }

    /// Variable codes in this group.
    pub fn variables(self) -> Vec<String> {
        fn fixed(codes: &[&str]) -> Vec<String> { codes.iter().map(|c| c.to_string()).collect() }

        match self {
            Self::Population => fixed(&["P1_001N"]),
            Self::RaceSimple => fixed(&["P1_001N", "P1_003N", "P1_004N", "P1_005N", "P1_006N", "P1_007N", "P1_008N"]),
            Self::RaceDetailed => numbered("P1", 25),
            Self::Hispanic => fixed(&["P2_001N", "P2_002N", "P2_003N"]),
            Self::HispanicDetailed => numbered("P2", 11),
            Self::VotingAge => fixed(&["P3_001N"]),
            Self::VotingAgeRace => numbered("P3", 9),
            Self::Housing => fixed(&["H1_001N", "H1_002N", "H1_003N"]),
            Self::All => VARIABLES.iter().map(|(code, _)| code.to_string()).collect(),
        }
    }
}

impl fmt::Display for Pl94171Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.to_str()) }
}

impl FromStr for Pl94171Group {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Self::ALL.into_iter()
            .find(|g| g.to_str() == name)
            .ok_or_else(|| Error::UnknownKey {
                what: "variable group",
                name: s.to_string(),
                valid: Self::ALL.map(|g| g.to_str()).join(", "),
            })
    }
}
