use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{Error, Result};

/// Component labels an address tokenizer can assign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Label {
    AddressNumber,
    StreetNamePreDirectional,
    StreetNamePreModifier,
    StreetNamePreType,
    StreetName,
    StreetNamePostType,
    StreetNamePostDirectional,
    SubaddressType,
    SubaddressIdentifier,
    PlaceName,
    StateName,
    ZipCode,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::AddressNumber => "AddressNumber",
            Label::StreetNamePreDirectional => "StreetNamePreDirectional",
            Label::StreetNamePreModifier => "StreetNamePreModifier",
            Label::StreetNamePreType => "StreetNamePreType",
            Label::StreetName => "StreetName",
            Label::StreetNamePostType => "StreetNamePostType",
            Label::StreetNamePostDirectional => "StreetNamePostDirectional",
            Label::SubaddressType => "SubaddressType",
            Label::SubaddressIdentifier => "SubaddressIdentifier",
            Label::PlaceName => "PlaceName",
            Label::StateName => "StateName",
            Label::ZipCode => "ZipCode",
        }
    }
}

/// Failure modes of strict tagging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagError {
    /// A label reappeared after a different label, so the input cannot be
    /// grouped into one value per label.
    RepeatedLabel(Label),
}

/// Address tokenizer seam.
pub trait AddressTagger: Send + Sync {
    /// Label every token of `raw`, in input order.
    fn parse(&self, raw: &str) -> Vec<(String, Label)>;

    /// Group contiguous tokens sharing a label into one value per label.
    fn tag(&self, raw: &str) -> std::result::Result<Vec<(Label, String)>, TagError> {
        let mut groups: Vec<(Label, String)> = Vec::new();
        for (token, label) in self.parse(raw) {
            if groups.last().is_some_and(|(last, _)| *last == label) {
                if let Some((_, value)) = groups.last_mut() {
                    value.push(' ');
                    value.push_str(&token);
                }
            } else if groups.iter().any(|(l, _)| *l == label) {
                return Err(TagError::RepeatedLabel(label));
            } else {
                groups.push((label, token));
            }
        }
        Ok(groups)
    }
}

/// Labeled components of a single address. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedAddress {
    pub house_number: Option<String>,
    pub street_name_pre_directional: Option<String>,
    pub street_name_pre_modifier: Option<String>,
    pub street_name_pre_type: Option<String>,
    pub street_name: Option<String>,
    pub street_name_post_type: Option<String>,
    pub street_name_post_directional: Option<String>,
    pub subaddress_type: Option<String>,
    pub subaddress_identifier: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zipcode: Option<String>,
    /// Every labeled value as the tokenizer produced it.
    pub raw_components: BTreeMap<String, String>,
}

impl ParsedAddress {
    /// Build from one value per label.
    pub fn from_components(components: Vec<(Label, String)>) -> Self {
        let mut out = ParsedAddress::default();
        for (label, value) in components {
            out.raw_components.insert(label.as_str().to_string(), value.clone());
            let slot = match label {
                Label::AddressNumber => &mut out.house_number,
                Label::StreetNamePreDirectional => &mut out.street_name_pre_directional,
                Label::StreetNamePreModifier => &mut out.street_name_pre_modifier,
                Label::StreetNamePreType => &mut out.street_name_pre_type,
                Label::StreetName => &mut out.street_name,
                Label::StreetNamePostType => &mut out.street_name_post_type,
                Label::StreetNamePostDirectional => &mut out.street_name_post_directional,
                Label::SubaddressType => &mut out.subaddress_type,
                Label::SubaddressIdentifier => &mut out.subaddress_identifier,
                Label::PlaceName => &mut out.city,
                Label::StateName => &mut out.state,
                Label::ZipCode => &mut out.zipcode,
            };
            *slot = Some(value);
        }
        out
    }

    /// Street name parts joined by single spaces, skipping absent parts.
    pub fn full_street_name(&self) -> String {
        [
            &self.street_name_pre_directional,
            &self.street_name_pre_modifier,
            &self.street_name_pre_type,
            &self.street_name,
            &self.street_name_post_type,
            &self.street_name_post_directional,
        ]
        .into_iter()
        .filter_map(|part| part.as_deref())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }

    /// Both a house number and a core street name are present.
    pub fn has_street_info(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.house_number) && present(&self.street_name)
    }

    /// House number as an integer, if it is one.
    pub fn house_number_value(&self) -> Option<i64> {
        self.house_number.as_deref()?.trim().parse().ok()
    }

    /// Five-digit ZIP, dropping any +4 suffix.
    pub fn zip5(&self) -> Option<&str> {
        let zip = self.zipcode.as_deref()?.trim();
        zip.get(..5).filter(|z| z.bytes().all(|b| b.is_ascii_digit()))
    }
}

/// Parse `raw` with `tagger`. Strict tagging is tried first; when a label
/// repeats, tokens are regrouped keeping the first value seen per label.
pub fn parse_address(tagger: &dyn AddressTagger, raw: &str) -> Result<ParsedAddress> {
    if raw.trim().is_empty() {
        return Err(Error::Parse { address: raw.to_string(), reason: "empty address".into() });
    }

    match tagger.tag(raw) {
        Ok(components) => Ok(ParsedAddress::from_components(components)),
        Err(TagError::RepeatedLabel(label)) => {
            tracing::debug!(address = raw, label = label.as_str(), "repeated label, regrouping tokens");
            let mut first_seen: Vec<(Label, String)> = Vec::new();
            for (token, label) in tagger.parse(raw) {
                if !first_seen.iter().any(|(l, _)| *l == label) {
                    first_seen.push((label, token));
                }
            }
            Ok(ParsedAddress::from_components(first_seen))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tagger that returns a fixed token labeling.
    struct Fixed(Vec<(&'static str, Label)>);

    impl AddressTagger for Fixed {
        fn parse(&self, _raw: &str) -> Vec<(String, Label)> {
            self.0.iter().map(|(t, l)| (t.to_string(), *l)).collect()
        }
    }

    #[test]
    fn empty_input_is_parse_error() {
        let tagger = Fixed(vec![]);
        assert!(matches!(parse_address(&tagger, "   "), Err(Error::Parse { .. })));
    }

    #[test]
    fn tag_groups_contiguous_tokens() {
        let tagger = Fixed(vec![
            ("123", Label::AddressNumber),
            ("Martin", Label::StreetName),
            ("Luther", Label::StreetName),
            ("King", Label::StreetName),
            ("Blvd", Label::StreetNamePostType),
        ]);
        let parsed = parse_address(&tagger, "x").unwrap();
        assert_eq!(parsed.street_name.as_deref(), Some("Martin Luther King"));
        assert_eq!(parsed.full_street_name(), "Martin Luther King Blvd");
        assert_eq!(parsed.raw_components.get("StreetNamePostType").map(String::as_str), Some("Blvd"));
    }

    #[test]
    fn repeated_label_keeps_first_value() {
        let tagger = Fixed(vec![
            ("123", Label::AddressNumber),
            ("Main", Label::StreetName),
            ("St", Label::StreetNamePostType),
            ("456", Label::AddressNumber),
            ("Oak", Label::StreetName),
        ]);
        assert_eq!(tagger.tag("x"), Err(TagError::RepeatedLabel(Label::AddressNumber)));
        let parsed = parse_address(&tagger, "x").unwrap();
        assert_eq!(parsed.house_number.as_deref(), Some("123"));
        assert_eq!(parsed.street_name.as_deref(), Some("Main"));
    }

    #[test]
    fn street_info_and_full_name() {
        let parsed = ParsedAddress {
            house_number: Some("42".into()),
            street_name_pre_directional: Some("N".into()),
            street_name: Some("Main".into()),
            street_name_post_type: Some("St".into()),
            zipcode: Some("62701-1234".into()),
            ..Default::default()
        };
        assert!(parsed.has_street_info());
        assert_eq!(parsed.full_street_name(), "N Main St");
        assert_eq!(parsed.house_number_value(), Some(42));
        assert_eq!(parsed.zip5(), Some("62701"));

        let no_number = ParsedAddress { house_number: None, ..parsed.clone() };
        assert!(!no_number.has_street_info());
        let letter = ParsedAddress { house_number: Some("42B".into()), ..parsed };
        assert_eq!(letter.house_number_value(), None);
    }

    #[test]
    fn zip5_needs_five_ascii_digits() {
        let zip = |z: &str| ParsedAddress { zipcode: Some(z.into()), ..Default::default() };
        assert_eq!(zip(" 20500-0003 ").zip5(), Some("20500"));
        assert_eq!(zip("2050").zip5(), None);
        assert_eq!(zip("\u{661}\u{662}\u{663}\u{664}\u{665}").zip5(), None);
        assert_eq!(zip("2\u{e9}500").zip5(), None);
    }
}
