//! Street-name canonicalization for matching against TIGER names.

use std::sync::LazyLock;

use ahash::AHashMap;

const DIRECTIONALS: &[(&str, &str)] = &[
    ("N", "NORTH"),
    ("S", "SOUTH"),
    ("E", "EAST"),
    ("W", "WEST"),
    ("NE", "NORTHEAST"),
    ("NW", "NORTHWEST"),
    ("SE", "SOUTHEAST"),
    ("SW", "SOUTHWEST"),
    ("NO", "NORTH"),
    ("SO", "SOUTH"),
];

const DIRECTIONALS_ABBREV: &[(&str, &str)] = &[
    ("NORTH", "N"),
    ("SOUTH", "S"),
    ("EAST", "E"),
    ("WEST", "W"),
    ("NORTHEAST", "NE"),
    ("NORTHWEST", "NW"),
    ("SOUTHEAST", "SE"),
    ("SOUTHWEST", "SW"),
];

/// USPS suffix abbreviations and their full forms.
const STREET_TYPES: &[(&str, &str)] = &[
    ("ST", "STREET"), ("STR", "STREET"),
    ("AVE", "AVENUE"), ("AV", "AVENUE"),
    ("BLVD", "BOULEVARD"), ("BLV", "BOULEVARD"),
    ("DR", "DRIVE"), ("DRV", "DRIVE"),
    ("RD", "ROAD"),
    ("LN", "LANE"),
    ("CT", "COURT"), ("CRT", "COURT"),
    ("PL", "PLACE"),
    ("WAY", "WAY"),
    ("CIR", "CIRCLE"), ("CRCL", "CIRCLE"),
    ("TRL", "TRAIL"), ("TR", "TRAIL"),
    ("PKWY", "PARKWAY"), ("PKY", "PARKWAY"),
    ("HWY", "HIGHWAY"), ("HWAY", "HIGHWAY"),
    ("EXPY", "EXPRESSWAY"), ("EXP", "EXPRESSWAY"), ("EXPW", "EXPRESSWAY"),
    ("FWY", "FREEWAY"), ("FRWY", "FREEWAY"),
    ("ALY", "ALLEY"), ("ALLY", "ALLEY"),
    ("ANX", "ANNEX"),
    ("ARC", "ARCADE"),
    ("BCH", "BEACH"),
    ("BND", "BEND"),
    ("BRG", "BRIDGE"),
    ("BRK", "BROOK"),
    ("BYP", "BYPASS"),
    ("CYN", "CANYON"),
    ("CPE", "CAPE"),
    ("CSWY", "CAUSEWAY"),
    ("CTR", "CENTER"),
    ("CLF", "CLIFF"),
    ("CLB", "CLUB"),
    ("CMN", "COMMON"),
    ("CMNS", "COMMONS"),
    ("CRK", "CREEK"),
    ("CRES", "CRESCENT"),
    ("CRST", "CREST"),
    ("XING", "CROSSING"),
    ("DL", "DALE"),
    ("DM", "DAM"),
    ("DV", "DIVIDE"),
    ("EST", "ESTATE"),
    ("ESTS", "ESTATES"),
    ("FALL", "FALL"),
    ("FLS", "FALLS"),
    ("FRY", "FERRY"),
    ("FLD", "FIELD"),
    ("FLDS", "FIELDS"),
    ("FLT", "FLAT"),
    ("FLTS", "FLATS"),
    ("FRD", "FORD"),
    ("FRST", "FOREST"),
    ("FRG", "FORGE"),
    ("FRK", "FORK"),
    ("FRKS", "FORKS"),
    ("FT", "FORT"),
    ("GDN", "GARDEN"),
    ("GDNS", "GARDENS"),
    ("GTWY", "GATEWAY"),
    ("GLN", "GLEN"),
    ("GRN", "GREEN"),
    ("GRV", "GROVE"),
    ("HBR", "HARBOR"),
    ("HVN", "HAVEN"),
    ("HTS", "HEIGHTS"),
    ("HL", "HILL"),
    ("HLS", "HILLS"),
    ("HOLW", "HOLLOW"),
    ("INLT", "INLET"),
    ("IS", "ISLAND"),
    ("ISS", "ISLANDS"),
    ("JCT", "JUNCTION"),
    ("KY", "KEY"),
    ("KYS", "KEYS"),
    ("KNL", "KNOLL"),
    ("KNLS", "KNOLLS"),
    ("LK", "LAKE"),
    ("LKS", "LAKES"),
    ("LNDG", "LANDING"),
    ("LGT", "LIGHT"),
    ("LF", "LOAF"),
    ("LCK", "LOCK"),
    ("LCKS", "LOCKS"),
    ("LDG", "LODGE"),
    ("LOOP", "LOOP"),
    ("MALL", "MALL"),
    ("MNR", "MANOR"),
    ("MDWS", "MEADOWS"),
    ("ML", "MILL"),
    ("MLS", "MILLS"),
    ("MSN", "MISSION"),
    ("MT", "MOUNT"),
    ("MTN", "MOUNTAIN"),
    ("NCK", "NECK"),
    ("ORCH", "ORCHARD"),
    ("OVAL", "OVAL"),
    ("PARK", "PARK"),
    ("PASS", "PASS"),
    ("PATH", "PATH"),
    ("PIKE", "PIKE"),
    ("PNE", "PINE"),
    ("PNES", "PINES"),
    ("PLN", "PLAIN"),
    ("PLNS", "PLAINS"),
    ("PLZ", "PLAZA"),
    ("PT", "POINT"),
    ("PTS", "POINTS"),
    ("PRT", "PORT"),
    ("PRTS", "PORTS"),
    ("PR", "PRAIRIE"),
    ("RADL", "RADIAL"),
    ("RNCH", "RANCH"),
    ("RPD", "RAPID"),
    ("RPDS", "RAPIDS"),
    ("RST", "REST"),
    ("RDG", "RIDGE"),
    ("RDGS", "RIDGES"),
    ("RIV", "RIVER"),
    ("ROW", "ROW"),
    ("RUN", "RUN"),
    ("SHL", "SHOAL"),
    ("SHLS", "SHOALS"),
    ("SHR", "SHORE"),
    ("SHRS", "SHORES"),
    ("SPG", "SPRING"),
    ("SPGS", "SPRINGS"),
    ("SPUR", "SPUR"),
    ("SQ", "SQUARE"),
    ("SQS", "SQUARES"),
    ("STA", "STATION"),
    ("STRA", "STRAVENUE"),
    ("STRM", "STREAM"),
    ("SMT", "SUMMIT"),
    ("TER", "TERRACE"),
    ("TRCE", "TRACE"),
    ("TRAK", "TRACK"),
    ("TRFY", "TRAFFICWAY"),
    ("TUNL", "TUNNEL"),
    ("TPKE", "TURNPIKE"),
    ("UN", "UNION"),
    ("UNS", "UNIONS"),
    ("VLY", "VALLEY"),
    ("VLYS", "VALLEYS"),
    ("VIA", "VIADUCT"),
    ("VW", "VIEW"),
    ("VWS", "VIEWS"),
    ("VLG", "VILLAGE"),
    ("VLGS", "VILLAGES"),
    ("VL", "VILLE"),
    ("VIS", "VISTA"),
    ("WALK", "WALK"),
    ("WALL", "WALL"),
    ("WL", "WELL"),
    ("WLS", "WELLS"),
];

const ORDINALS: &[(&str, &str)] = &[
    ("1ST", "FIRST"),
    ("2ND", "SECOND"),
    ("3RD", "THIRD"),
    ("4TH", "FOURTH"),
    ("5TH", "FIFTH"),
    ("6TH", "SIXTH"),
    ("7TH", "SEVENTH"),
    ("8TH", "EIGHTH"),
    ("9TH", "NINTH"),
    ("10TH", "TENTH"),
    ("11TH", "ELEVENTH"),
    ("12TH", "TWELFTH"),
];

static DIRECTIONAL_MAP: LazyLock<AHashMap<&'static str, &'static str>> =
    LazyLock::new(|| DIRECTIONALS.iter().copied().collect());

static DIRECTIONAL_ABBREV_MAP: LazyLock<AHashMap<&'static str, &'static str>> =
    LazyLock::new(|| DIRECTIONALS_ABBREV.iter().copied().collect());

static STREET_TYPE_MAP: LazyLock<AHashMap<&'static str, &'static str>> =
    LazyLock::new(|| STREET_TYPES.iter().copied().collect());

/// Full street type -> canonical TIGER abbreviation (first abbreviation listed wins).
static STREET_TYPE_ABBREV_MAP: LazyLock<AHashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut map = AHashMap::new();
    for &(abbrev, full) in STREET_TYPES {
        map.entry(full).or_insert(abbrev);
    }
    map
});

static ORDINAL_MAP: LazyLock<AHashMap<&'static str, &'static str>> =
    LazyLock::new(|| ORDINALS.iter().copied().collect());

/// Whether `word` is a street type in either abbreviated or full form.
pub fn is_street_type(word: &str) -> bool {
    STREET_TYPE_MAP.contains_key(word) || STREET_TYPE_ABBREV_MAP.contains_key(word)
}

/// Whether `word` is a directional in either abbreviated or full form.
pub fn is_directional(word: &str) -> bool {
    DIRECTIONAL_MAP.contains_key(word) || DIRECTIONAL_ABBREV_MAP.contains_key(word)
}

/// Uppercase, drop everything but alphanumerics, whitespace, `-` and `_`,
/// and collapse runs of whitespace. No token rewriting.
pub fn clean(raw: &str) -> String {
    let stripped: String = raw.to_uppercase().chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-' || *c == '_')
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// [`clean`] followed by expansion of directionals, street types and
/// ordinals to their full forms. Idempotent.
pub fn normalize(raw: &str) -> String {
    clean(raw).split(' ')
        .filter(|w| !w.is_empty())
        .map(|word| {
            DIRECTIONAL_MAP.get(word)
                .or_else(|| STREET_TYPE_MAP.get(word))
                .or_else(|| ORDINAL_MAP.get(word))
                .copied()
                .unwrap_or(word)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn rewrite(words: &[&str], maps: &[&AHashMap<&'static str, &'static str>]) -> String {
    words.iter()
        .map(|&w| maps.iter().find_map(|m| m.get(w).copied()).unwrap_or(w))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Alternative spellings of an already-cleaned street name, in the order
/// they should be tried: the input itself, street types abbreviated,
/// directionals abbreviated, both abbreviated, then the name without a
/// trailing street type. Duplicates are dropped.
pub fn generate_variants(street_name: &str) -> Vec<String> {
    let mut variants = vec![street_name.to_string()];
    let mut push = |v: String| if !variants.contains(&v) { variants.push(v) };

    let words: Vec<&str> = street_name.split_whitespace().collect();

    push(rewrite(&words, &[&STREET_TYPE_ABBREV_MAP]));
    push(rewrite(&words, &[&DIRECTIONAL_ABBREV_MAP]));
    push(rewrite(&words, &[&STREET_TYPE_ABBREV_MAP, &DIRECTIONAL_ABBREV_MAP]));

    if let [head @ .., last] = words.as_slice() {
        if !head.is_empty() && is_street_type(last) {
            push(head.join(" "));
        }
    }

    variants
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_strips_and_collapses() {
        assert_eq!(clean("  main   st. "), "MAIN ST");
        assert_eq!(clean("O'Brien-Smith  Ave #2"), "OBRIEN-SMITH AVE 2");
        assert_eq!(clean(""), "");
    }

    #[test]
    fn normalize_expands_tokens() {
        assert_eq!(normalize("n main st"), "NORTH MAIN STREET");
        assert_eq!(normalize("1st ave ne"), "FIRST AVENUE NORTHEAST");
        assert_eq!(normalize("So Park Blvd."), "SOUTH PARK BOULEVARD");
    }

    #[test]
    fn normalize_is_idempotent() {
        for raw in ["N 1st St", "  sw  pkwy  ", "12th Ter", "Martin Luther King Jr Blvd", "EST", "PR"] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "input {raw:?}");
        }
    }

    #[test]
    fn no_expansion_feeds_another_rewrite() {
        for &(_, full) in DIRECTIONALS.iter().chain(STREET_TYPES).chain(ORDINALS) {
            assert_eq!(normalize(full), full);
        }
    }

    #[test]
    fn variants_in_order() {
        assert_eq!(
            generate_variants("NORTH MAIN STREET"),
            vec!["NORTH MAIN STREET", "NORTH MAIN ST", "N MAIN STREET", "N MAIN ST", "NORTH MAIN"]
        );
    }

    #[test]
    fn variants_drop_trailing_type() {
        assert_eq!(generate_variants("MAIN ST"), vec!["MAIN ST", "MAIN"]);
        assert_eq!(generate_variants("OAK AVENUE"), vec!["OAK AVENUE", "OAK AVE", "OAK"]);
    }

    #[test]
    fn variants_never_empty_or_duplicated() {
        assert_eq!(generate_variants("BROADWAY"), vec!["BROADWAY"]);
        assert_eq!(generate_variants("WAY"), vec!["WAY"]);
        let v = generate_variants("WEST WAY");
        let mut dedup = v.clone();
        dedup.dedup();
        assert_eq!(v, dedup);
        assert_eq!(v[0], "WEST WAY");
    }

    #[test]
    fn canonical_abbreviation_is_first_listed() {
        assert_eq!(STREET_TYPE_ABBREV_MAP.get("STREET"), Some(&"ST"));
        assert_eq!(STREET_TYPE_ABBREV_MAP.get("EXPRESSWAY"), Some(&"EXPY"));
    }
}
