use ahash::AHashMap;
use geo::{Euclidean, InterpolatableLine, LineString};
use serde::Serialize;
use smallvec::SmallVec;

use super::normalize::{clean, generate_variants};
use super::parsed::ParsedAddress;

/// House-number parity constraint on one side of a segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parity {
    Odd,
    Even,
    Both,
    /// Any other code; falls back to matching the parity of the range start.
    Unknown(String),
}

impl Parity {
    /// Parse a TIGER `PARITYL`/`PARITYR` code. Blank means absent.
    pub fn from_code(code: &str) -> Option<Parity> {
        match code.trim().to_ascii_uppercase().as_str() {
            "" => None,
            "O" => Some(Parity::Odd),
            "E" => Some(Parity::Even),
            "B" => Some(Parity::Both),
            other => Some(Parity::Unknown(other.to_string())),
        }
    }
}

/// Which side of the centerline a match was found on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn code(&self) -> &'static str {
        match self {
            Side::Left => "L",
            Side::Right => "R",
        }
    }
}

/// House-number range for one side of a segment. Endpoints are unordered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SideRange {
    pub from: Option<i64>,
    pub to: Option<i64>,
    pub parity: Option<Parity>,
    pub zip: Option<String>,
}

impl SideRange {
    /// Whether `house` falls inside this range and satisfies its parity.
    fn accepts(&self, house: i64) -> bool {
        let (Some(from), Some(to)) = (self.from, self.to) else { return false };
        let (lo, hi) = (from.min(to), from.max(to));
        (lo..=hi).contains(&house) && parity_matches(house, self.parity.as_ref(), from)
    }
}

fn parity_matches(house: i64, parity: Option<&Parity>, range_start: i64) -> bool {
    match parity {
        None | Some(Parity::Both) => true,
        Some(Parity::Odd) => house.rem_euclid(2) == 1,
        Some(Parity::Even) => house.rem_euclid(2) == 0,
        Some(Parity::Unknown(_)) => house.rem_euclid(2) == range_start.rem_euclid(2),
    }
}

/// A street centerline annotated with per-side address ranges.
#[derive(Debug, Clone)]
pub struct AddressRangeSegment {
    pub linear_id: String,
    pub full_name: String,
    pub left: SideRange,
    pub right: SideRange,
    pub geometry: LineString<f64>,
}

impl AddressRangeSegment {
    fn side(&self, side: Side) -> &SideRange {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    fn serves_zip(&self, zip: &str) -> bool {
        self.left.zip.as_deref() == Some(zip) || self.right.zip.as_deref() == Some(zip)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Exact,
    Interpolated,
    NoMatch,
}

/// Outcome of matching one address against the segment index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeocodeResult {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// `FULLNAME` of the matched segment.
    pub matched_address: Option<String>,
    pub match_type: MatchType,
    pub match_score: f64,
    pub segment_id: Option<String>,
    pub side: Option<Side>,
}

impl GeocodeResult {
    pub fn no_match() -> Self {
        Self {
            latitude: None,
            longitude: None,
            matched_address: None,
            match_type: MatchType::NoMatch,
            match_score: 0.0,
            segment_id: None,
            side: None,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.match_type != MatchType::NoMatch && self.latitude.is_some() && self.longitude.is_some()
    }
}

/// Score assigned to every interpolated match.
pub const INTERPOLATED_SCORE: f64 = 0.9;

/// Fraction along a segment for `house` between range endpoints, clamped to [0, 1].
pub fn interpolation_fraction(house: i64, from: i64, to: i64) -> f64 {
    if from == to {
        return 0.5;
    }
    ((house - from) as f64 / (to - from) as f64).clamp(0.0, 1.0)
}

/// Name-indexed address range segments for one region.
#[derive(Debug, Clone, Default)]
pub struct AddressMatcher {
    segments: Vec<AddressRangeSegment>,
    index: AHashMap<String, SmallVec<[usize; 4]>>,
}

impl AddressMatcher {
    /// Index `segments` by cleaned full name; blank names are not indexed.
    pub fn new(segments: Vec<AddressRangeSegment>) -> Self {
        let mut index: AHashMap<String, SmallVec<[usize; 4]>> = AHashMap::new();
        for (i, segment) in segments.iter().enumerate() {
            let key = clean(&segment.full_name);
            if !key.is_empty() {
                index.entry(key).or_default().push(i);
            }
        }
        tracing::debug!(segments = segments.len(), names = index.len(), "built address range index");
        Self { segments, index }
    }

    #[inline] pub fn len(&self) -> usize { self.segments.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.segments.is_empty() }

    #[inline] pub fn segments(&self) -> &[AddressRangeSegment] { &self.segments }

    /// Candidate segment indices for a cleaned street name: exact key first,
    /// then each generated variant in order.
    fn candidates(&self, street: &str) -> Option<&[usize]> {
        self.index.get(street)
            .or_else(|| generate_variants(street).iter().skip(1).find_map(|v| self.index.get(v)))
            .map(|c| c.as_slice())
    }

    /// Interpolate a position for `parsed` along the first segment whose
    /// range and parity accept the house number. `zip` narrows candidates
    /// only when at least one candidate serves it.
    pub fn match_address(&self, parsed: &ParsedAddress, zip: Option<&str>) -> GeocodeResult {
        if !parsed.has_street_info() {
            return GeocodeResult::no_match();
        }
        let Some(house) = parsed.house_number_value() else { return GeocodeResult::no_match() };

        let street = clean(&parsed.full_street_name());
        let Some(candidates) = self.candidates(&street) else { return GeocodeResult::no_match() };

        let mut pool: SmallVec<[&AddressRangeSegment; 4]> = candidates.iter().map(|&i| &self.segments[i]).collect();
        if let Some(zip) = zip {
            let narrowed: SmallVec<[&AddressRangeSegment; 4]> = pool.iter().copied().filter(|s| s.serves_zip(zip)).collect();
            if !narrowed.is_empty() {
                pool = narrowed;
            }
        }

        for segment in pool {
            for side in [Side::Left, Side::Right] {
                let range = segment.side(side);
                if !range.accepts(house) {
                    continue;
                }
                let (Some(from), Some(to)) = (range.from, range.to) else { continue };
                let t = interpolation_fraction(house, from, to);
                let Some(point) = segment.geometry.point_at_ratio_from_start(&Euclidean, t) else { continue };

                return GeocodeResult {
                    latitude: Some(point.y()),
                    longitude: Some(point.x()),
                    matched_address: Some(segment.full_name.clone()),
                    match_type: MatchType::Interpolated,
                    match_score: INTERPOLATED_SCORE,
                    segment_id: Some(segment.linear_id.clone()),
                    side: Some(side),
                };
            }
        }

        GeocodeResult::no_match()
    }
}
