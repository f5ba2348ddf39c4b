use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Census summary levels addressable by a GEOID prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeoLevel {
    State,      // Highest-level entity
    County,     // County -> State
    Tract,      // Tract -> County
    BlockGroup, // Group -> Tract
    Block,      // Lowest-level entity
}

impl GeoLevel {
    pub const ALL: [GeoLevel; 5] = [
        GeoLevel::State,
        GeoLevel::County,
        GeoLevel::Tract,
        GeoLevel::BlockGroup,
        GeoLevel::Block,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            GeoLevel::State => "state",
            GeoLevel::County => "county",
            GeoLevel::Tract => "tract",
            GeoLevel::BlockGroup => "block_group",
            GeoLevel::Block => "block",
        }
    }

    /// Number of GEOID characters identifying a unit at this level.
    pub fn geoid_len(&self) -> usize {
        match self {
            GeoLevel::State => 2,
            GeoLevel::County => 5,
            GeoLevel::Tract => 11,
            GeoLevel::BlockGroup => 12,
            GeoLevel::Block => 15,
        }
    }
}

impl fmt::Display for GeoLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.to_str()) }
}

impl FromStr for GeoLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "state" => Ok(GeoLevel::State),
            "county" => Ok(GeoLevel::County),
            "tract" => Ok(GeoLevel::Tract),
            "block_group" | "group" | "bg" => Ok(GeoLevel::BlockGroup),
            "block" => Ok(GeoLevel::Block),
            _ => Err(Error::UnknownKey {
                what: "geographic level",
                name: s.to_string(),
                valid: GeoLevel::ALL.map(|l| l.to_str()).join(", "),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lengths_are_strictly_increasing() {
        let lens: Vec<usize> = GeoLevel::ALL.iter().map(|l| l.geoid_len()).collect();
        assert_eq!(lens, vec![2, 5, 11, 12, 15]);
    }

    #[test]
    fn parse_aliases() {
        assert_eq!("Block-Group".parse::<GeoLevel>().unwrap(), GeoLevel::BlockGroup);
        assert_eq!("bg".parse::<GeoLevel>().unwrap(), GeoLevel::BlockGroup);
        assert_eq!(" TRACT ".parse::<GeoLevel>().unwrap(), GeoLevel::Tract);
        assert!(matches!("zip".parse::<GeoLevel>(), Err(Error::UnknownKey { .. })));
    }
}
