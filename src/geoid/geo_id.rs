use std::{fmt, sync::Arc};

use serde::Serialize;

use super::geo_level::GeoLevel;
use crate::error::{Error, Result};

/// Stable key for any entity across levels.
/// Keep the original GEOID text (with leading zeros) but avoid repeated owned Strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GeoId {
    pub ty: GeoLevel,
    pub id: Arc<str>, // e.g., "31001" for county, "310010001001001" for block
}

impl GeoId {
    /// Validate `id` against the exact length of `ty` and wrap it.
    pub fn new(ty: GeoLevel, id: &str) -> Result<Self> {
        if !validate(id, Some(ty)) {
            return Err(Error::InvalidGeoid {
                geoid: id.to_string(),
                reason: format!("expected {} digits for a {} GEOID", ty.geoid_len(), ty),
            });
        }
        Ok(Self { ty, id: Arc::from(id) })
    }

    /// Returns a new `GeoId` corresponding to the higher-level `GeoLevel`
    /// by truncating this GeoId's string to the correct prefix length.
    pub fn to_parent(&self, parent_ty: GeoLevel) -> GeoId {
        GeoId { ty: parent_ty, id: Arc::from(truncate(&self.id, parent_ty)) }
    }

    pub fn as_str(&self) -> &str { &self.id }
}

impl fmt::Display for GeoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.id) }
}

/// Positional pieces of a GEOID. Fields beyond the input's length are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeoComponents {
    pub state: String,
    pub county: Option<String>,
    pub tract: Option<String>,
    pub block_group: Option<String>,
    /// Four-digit block code; its first digit is the block group.
    pub block: Option<String>,
}

impl GeoComponents {
    /// Five-digit state+county prefix.
    pub fn county_geoid(&self) -> Option<String> {
        Some(format!("{}{}", self.state, self.county.as_ref()?))
    }

    /// Eleven-digit state+county+tract prefix.
    pub fn tract_geoid(&self) -> Option<String> {
        Some(format!("{}{}", self.county_geoid()?, self.tract.as_ref()?))
    }

    /// Twelve-digit block group GEOID.
    pub fn block_group_geoid(&self) -> Option<String> {
        Some(format!("{}{}", self.tract_geoid()?, self.block_group.as_ref()?))
    }

    /// Rebuild the GEOID these components were parsed from.
    pub fn to_geoid(&self) -> String {
        let mut out = self.state.clone();
        let Some(county) = &self.county else { return out };
        out.push_str(county);
        let Some(tract) = &self.tract else { return out };
        out.push_str(tract);
        match (&self.block, &self.block_group) {
            (Some(block), _) => out.push_str(block),
            (None, Some(group)) => out.push_str(group),
            (None, None) => {}
        }
        out
    }
}

fn is_digits(s: &str) -> bool { !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) }

/// Split a GEOID into state/county/tract/block-group/block pieces.
pub fn parse(geoid: &str) -> Result<GeoComponents> {
    if !is_digits(geoid) || geoid.len() < GeoLevel::State.geoid_len() {
        return Err(Error::InvalidGeoid {
            geoid: geoid.to_string(),
            reason: "expected at least two ASCII digits".into(),
        });
    }

    let slice = |start: usize, end: usize| (geoid.len() >= end).then(|| geoid[start..end].to_string());

    Ok(GeoComponents {
        state: geoid[0..2].to_string(),
        county: slice(2, 5),
        tract: slice(5, 11),
        block_group: slice(11, 12),
        block: slice(11, 15),
    })
}

/// First `level.geoid_len()` characters of `geoid` (the whole string if shorter).
pub fn truncate(geoid: &str, level: GeoLevel) -> &str {
    geoid.char_indices().nth(level.geoid_len()).map_or(geoid, |(end, _)| &geoid[..end])
}

/// Infer the level of a GEOID from its length.
/// Lengths between two canonical sizes fall into the lower (coarser) level.
pub fn level_of(geoid: &str) -> GeoLevel {
    match geoid.len() {
        n if n >= 15 => GeoLevel::Block,
        n if n >= 12 => GeoLevel::BlockGroup,
        n if n >= 11 => GeoLevel::Tract,
        n if n >= 5 => GeoLevel::County,
        _ => GeoLevel::State,
    }
}

/// Check that `geoid` is all digits and has a canonical length,
/// or exactly the length of `level` when one is given.
pub fn validate(geoid: &str, level: Option<GeoLevel>) -> bool {
    if !is_digits(geoid) || geoid.len() < GeoLevel::State.geoid_len() {
        return false;
    }
    match level {
        Some(level) => geoid.len() == level.geoid_len(),
        None => GeoLevel::ALL.iter().any(|l| l.geoid_len() == geoid.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCK: &str = "060014001001000";

    #[test]
    fn parse_block_geoid() {
        let c = parse(BLOCK).unwrap();
        assert_eq!(c.state, "06");
        assert_eq!(c.county.as_deref(), Some("001"));
        assert_eq!(c.tract.as_deref(), Some("400100"));
        assert_eq!(c.block_group.as_deref(), Some("1"));
        assert_eq!(c.block.as_deref(), Some("1000"));
        assert_eq!(c.county_geoid().as_deref(), Some("06001"));
        assert_eq!(c.tract_geoid().as_deref(), Some("06001400100"));
        assert_eq!(c.block_group_geoid().as_deref(), Some("060014001001"));
    }

    #[test]
    fn parse_short_geoid_has_partial_components() {
        let c = parse("06001").unwrap();
        assert_eq!(c.county.as_deref(), Some("001"));
        assert_eq!(c.tract, None);
        assert_eq!(c.block, None);
        assert_eq!(c.tract_geoid(), None);
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(matches!(parse("0"), Err(Error::InvalidGeoid { .. })));
        assert!(matches!(parse("06A01"), Err(Error::InvalidGeoid { .. })));
        assert!(matches!(parse(""), Err(Error::InvalidGeoid { .. })));
    }

    #[test]
    fn reconstruction_round_trips_canonical_lengths() {
        for level in GeoLevel::ALL {
            let g = truncate(BLOCK, level);
            assert_eq!(parse(g).unwrap().to_geoid(), g, "level {level}");
        }
    }

    #[test]
    fn truncation_yields_valid_parents() {
        for level in GeoLevel::ALL {
            let parent = truncate(BLOCK, level);
            assert!(validate(parent, Some(level)));
            assert!(BLOCK.starts_with(parent));
            assert_eq!(level_of(parent), level);
        }
        assert_eq!(truncate("06", GeoLevel::Tract), "06");
    }

    #[test]
    fn level_of_buckets_odd_lengths_down() {
        assert_eq!(level_of("0600140"), GeoLevel::County);
        assert_eq!(level_of("0600140010010"), GeoLevel::BlockGroup);
        assert_eq!(level_of("0"), GeoLevel::State);
    }

    #[test]
    fn validate_lengths() {
        assert!(validate("06", None));
        assert!(validate(BLOCK, None));
        assert!(!validate("0600140", None));
        assert!(!validate("06001", Some(GeoLevel::Tract)));
        assert!(!validate("6", None));
        assert!(!validate("06 01", None));
    }

    #[test]
    fn geo_id_parent() {
        let block = GeoId::new(GeoLevel::Block, BLOCK).unwrap();
        let tract = block.to_parent(GeoLevel::Tract);
        assert_eq!(tract.as_str(), "06001400100");
        assert_eq!(tract.ty, GeoLevel::Tract);
        assert!(GeoId::new(GeoLevel::Block, "06001").is_err());
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate(BLOCK, GeoLevel::County), "06001");
        assert_eq!(truncate("060", GeoLevel::Tract), "060");
        assert_eq!(truncate("0\u{e9}12345", GeoLevel::State), "0\u{e9}");
        assert_eq!(truncate("\u{e9}", GeoLevel::State), "\u{e9}");
    }
}
