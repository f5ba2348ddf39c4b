//! Rule-based US address tokenizer.
//!
//! Works best on comma-separated input ("123 N Main St, Springfield, IL 62701").
//! Without commas, the street/city boundary is guessed from the first
//! abbreviated street type after the street name.

use std::sync::LazyLock;

use regex::Regex;

use super::normalize::{is_directional, is_street_type, normalize};
use super::parsed::{AddressTagger, Label};
use crate::fips;

const OCCUPANCY: &[&str] = &[
    "#", "APT", "APARTMENT", "UNIT", "STE", "SUITE", "RM", "ROOM", "FL", "FLOOR",
    "BLDG", "BUILDING", "LOT", "TRLR", "DEPT", "SPC",
];

const PRE_TYPES: &[&str] = &["AVENUE", "AVE", "HIGHWAY", "HWY", "ROUTE", "RTE"];

const PRE_MODIFIERS: &[&str] = &["OLD"];

/// Full street types common enough to mark the end of a street name when
/// no abbreviated type is present.
const COMMON_FULL_TYPES: &[&str] = &[
    "STREET", "AVENUE", "BOULEVARD", "DRIVE", "ROAD", "LANE", "COURT", "PLACE",
    "CIRCLE", "TRAIL", "PARKWAY", "HIGHWAY", "TERRACE",
];

#[derive(Debug, Clone)]
struct Token {
    text: String,
    upper: String,
    segment: usize,
}

fn tokenize(raw: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    for (segment, part) in raw.split(',').enumerate() {
        for word in part.split_whitespace() {
            let word = word.trim_matches(|c: char| matches!(c, '.' | ';' | ':'));
            if word.is_empty() {
                continue;
            }
            // "#4" -> "#", "4"
            let pieces: Vec<&str> = match word.strip_prefix('#') {
                Some(rest) if !rest.is_empty() => vec!["#", rest],
                _ => vec![word],
            };
            for piece in pieces {
                tokens.push(Token { text: piece.to_string(), upper: piece.to_uppercase(), segment });
            }
        }
    }
    tokens
}

static ZIP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{5}(-[0-9]{4})?$").expect("valid ZIP pattern"));

static HOUSE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(-[0-9]+)?[A-Z]?$").expect("valid house number pattern"));

fn is_occupancy(word: &str) -> bool { OCCUPANCY.contains(&word) }

/// Heuristic tokenizer backed by the street-type and directional tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleTagger;

impl RuleTagger {
    pub fn new() -> Self { Self }

    /// Label a trailing state name or abbreviation ending at `end`.
    /// Returns the number of tokens consumed.
    fn label_state(tokens: &[Token], labels: &mut [Option<Label>], end: usize, has_zip: bool) -> usize {
        for width in (1..=3).rev() {
            // Keep at least one token in front of the state.
            if end <= width {
                continue;
            }
            let words = &tokens[end - width..end];
            // Without a ZIP, only trust a state that sits in its own comma segment.
            if !has_zip && words[0].segment == tokens[0].segment {
                continue;
            }
            if !words.iter().all(|t| t.upper.chars().all(|c| c.is_ascii_alphabetic())) {
                continue;
            }
            let phrase = words.iter().map(|t| t.upper.as_str()).collect::<Vec<_>>().join(" ");
            if fips::normalize_state(&phrase).is_ok() {
                for label in &mut labels[end - width..end] {
                    *label = Some(Label::StateName);
                }
                return width;
            }
        }
        0
    }

    /// Find where the street ends when no comma separates it from the city.
    fn street_end_without_commas(tokens: &[Token], start: usize, end: usize) -> usize {
        let is_abbrev = |t: &Token| is_street_type(&t.upper) && normalize(&t.upper) != t.upper;
        let is_common = |t: &Token| COMMON_FULL_TYPES.contains(&t.upper.as_str());

        let found = (start + 1..end).find(|&i| is_abbrev(&tokens[i]))
            .or_else(|| (start + 1..end).find(|&i| is_common(&tokens[i])));

        match found {
            Some(i) if i + 1 < end && is_directional(&tokens[i + 1].upper) => i + 2,
            Some(i) => i + 1,
            None => end,
        }
    }

    /// Label pre/post directionals and types around the core street name.
    fn label_street(tokens: &[Token], labels: &mut [Option<Label>]) {
        let (mut lo, mut hi) = (0, tokens.len());
        let up = |i: usize| tokens[i].upper.as_str();

        if hi >= 2 && is_directional(up(0)) && !(hi == 2 && is_street_type(up(1))) {
            labels[0] = Some(Label::StreetNamePreDirectional);
            lo = 1;
        }
        if hi - lo >= 2 && is_directional(up(hi - 1)) {
            labels[hi - 1] = Some(Label::StreetNamePostDirectional);
            hi -= 1;
        }
        if hi - lo >= 2 && is_street_type(up(hi - 1)) {
            labels[hi - 1] = Some(Label::StreetNamePostType);
            hi -= 1;
        } else if hi - lo >= 2 && PRE_TYPES.contains(&up(lo)) {
            labels[lo] = Some(Label::StreetNamePreType);
            lo += 1;
        }
        if hi - lo >= 2 && PRE_MODIFIERS.contains(&up(lo)) {
            labels[lo] = Some(Label::StreetNamePreModifier);
            lo += 1;
        }
        for label in &mut labels[lo..hi] {
            *label = Some(Label::StreetName);
        }
    }

    /// Label subaddress pairs, then treat whatever remains as the place name.
    fn label_tail(tokens: &[Token], labels: &mut [Option<Label>]) {
        let mut i = 0;
        while i < tokens.len() {
            if is_occupancy(&tokens[i].upper) {
                labels[i] = Some(Label::SubaddressType);
                if i + 1 < tokens.len() {
                    labels[i + 1] = Some(Label::SubaddressIdentifier);
                }
                i += 2;
            } else {
                labels[i] = Some(Label::PlaceName);
                i += 1;
            }
        }
    }
}

impl AddressTagger for RuleTagger {
    fn parse(&self, raw: &str) -> Vec<(String, Label)> {
        let tokens = tokenize(raw);
        if tokens.is_empty() {
            return Vec::new();
        }
        let mut labels: Vec<Option<Label>> = vec![None; tokens.len()];
        let mut end = tokens.len();

        let has_zip = end > 1 && ZIP.is_match(&tokens[end - 1].upper);
        if has_zip {
            labels[end - 1] = Some(Label::ZipCode);
            end -= 1;
        }
        end -= Self::label_state(&tokens, &mut labels, end, has_zip);

        let mut start = 0;
        if HOUSE_NUMBER.is_match(&tokens[0].upper) {
            labels[0] = Some(Label::AddressNumber);
            start = 1;
        }

        if start < end {
            let street_segment = tokens[start].segment;
            let street_end = match (start..end).find(|&i| tokens[i].segment != street_segment) {
                Some(i) => i,
                None => Self::street_end_without_commas(&tokens, start, end),
            };

            // Subaddress inside the street segment ("Main St Apt 4").
            let sub = (start + 1..street_end).find(|&i| is_occupancy(&tokens[i].upper)).unwrap_or(street_end);
            Self::label_street(&tokens[start..sub], &mut labels[start..sub]);
            Self::label_tail(&tokens[sub..end], &mut labels[sub..end]);
        }

        tokens.into_iter().zip(labels)
            .filter_map(|(token, label)| label.map(|l| (token.text, l)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::parsed::{ParsedAddress, parse_address};

    fn parse(raw: &str) -> ParsedAddress { parse_address(&RuleTagger::new(), raw).unwrap() }

    #[test]
    fn comma_separated_address() {
        let p = parse("123 N Main St, Springfield, IL 62701");
        assert_eq!(p.house_number.as_deref(), Some("123"));
        assert_eq!(p.street_name_pre_directional.as_deref(), Some("N"));
        assert_eq!(p.street_name.as_deref(), Some("Main"));
        assert_eq!(p.street_name_post_type.as_deref(), Some("St"));
        assert_eq!(p.city.as_deref(), Some("Springfield"));
        assert_eq!(p.state.as_deref(), Some("IL"));
        assert_eq!(p.zipcode.as_deref(), Some("62701"));
    }

    #[test]
    fn address_without_commas() {
        let p = parse("1600 Pennsylvania Ave NW Washington DC 20500");
        assert_eq!(p.street_name.as_deref(), Some("Pennsylvania"));
        assert_eq!(p.street_name_post_type.as_deref(), Some("Ave"));
        assert_eq!(p.street_name_post_directional.as_deref(), Some("NW"));
        assert_eq!(p.city.as_deref(), Some("Washington"));
        assert_eq!(p.state.as_deref(), Some("DC"));
    }

    #[test]
    fn subaddress_and_multiword_state() {
        let p = parse("350 5th Ave Apt 4B, New York, New York 10118");
        assert_eq!(p.street_name.as_deref(), Some("5th"));
        assert_eq!(p.subaddress_type.as_deref(), Some("Apt"));
        assert_eq!(p.subaddress_identifier.as_deref(), Some("4B"));
        assert_eq!(p.city.as_deref(), Some("New York"));
        assert_eq!(p.state.as_deref(), Some("New York"));
    }

    #[test]
    fn hash_unit_is_split() {
        let p = parse("10 Elm St #12, Boston, MA 02108");
        assert_eq!(p.subaddress_type.as_deref(), Some("#"));
        assert_eq!(p.subaddress_identifier.as_deref(), Some("12"));
    }

    #[test]
    fn directional_as_street_name() {
        let p = parse("500 North St, Pittsfield, MA");
        assert_eq!(p.street_name_pre_directional, None);
        assert_eq!(p.street_name.as_deref(), Some("North"));
        assert_eq!(p.street_name_post_type.as_deref(), Some("St"));
        assert_eq!(p.state.as_deref(), Some("MA"));
    }

    #[test]
    fn pre_type_highway() {
        let p = parse("4100 Highway 61, Festus, MO 63028");
        assert_eq!(p.street_name_pre_type.as_deref(), Some("Highway"));
        assert_eq!(p.street_name.as_deref(), Some("61"));
        assert_eq!(p.full_street_name(), "Highway 61");
    }

    #[test]
    fn street_abbreviation_is_not_a_state_without_zip() {
        let p = parse("12 Oak Ct");
        assert_eq!(p.state, None);
        assert_eq!(p.street_name_post_type.as_deref(), Some("Ct"));
    }

    #[test]
    fn repeated_subaddress_falls_back() {
        let p = parse("9 Pine Rd Apt 1 Apt 2, Salem, OR 97301");
        assert_eq!(p.subaddress_identifier.as_deref(), Some("1"));
        assert_eq!(p.state.as_deref(), Some("OR"));
    }

    #[test]
    fn no_number_means_no_street_info() {
        let p = parse("Main St, Springfield, IL");
        assert!(!p.has_street_info());
    }

    #[test]
    fn non_ascii_digits_are_not_numbers() {
        let arabic_zip = "\u{661}\u{662}\u{663}\u{664}\u{665}";
        let p = parse(&format!("123 Main St, Washington, DC {arabic_zip}"));
        assert_ne!(p.zipcode.as_deref(), Some(arabic_zip));
        assert_eq!(p.zip5(), None);

        let p = parse("\u{661}\u{662}\u{663} Main St, Washington, DC 20001");
        assert_eq!(p.house_number, None);
        assert_eq!(p.zip5(), Some("20001"));
    }
}
