//! Address text to census block and aggregated counts, using in-memory data.

use census_lookup::address::{AddressMatcher, AddressRangeSegment, MatchType, Parity, RuleTagger, SideRange, parse_address};
use census_lookup::census::{aggregate, to_value_maps};
use census_lookup::geom::{GeoUnit, SpatialResolver};
use census_lookup::{GeoLevel, geoid};
use geo::{LineString, MultiPolygon, Point, polygon};
use polars::prelude::*;

const WEST_BLOCK: &str = "110010001011000";
const EAST_BLOCK: &str = "110010001011001";

fn block(geoid: &str, west: f64, east: f64) -> GeoUnit {
    let square = polygon![
        (x: west, y: 38.895), (x: east, y: 38.895), (x: east, y: 38.905), (x: west, y: 38.905), (x: west, y: 38.895)
    ];
    GeoUnit::new(geoid, MultiPolygon::new(vec![square]))
}

fn main_street() -> AddressRangeSegment {
    AddressRangeSegment {
        linear_id: "110123".into(),
        full_name: "Main St".into(),
        left: SideRange { from: Some(101), to: Some(199), parity: Some(Parity::Odd), zip: Some("20001".into()) },
        right: SideRange { from: Some(100), to: Some(198), parity: Some(Parity::Even), zip: Some("20001".into()) },
        geometry: LineString::from(vec![(-77.02, 38.90), (-77.00, 38.90)]),
    }
}

fn counts() -> DataFrame {
    df!(
        "GEO_ID" => [WEST_BLOCK, EAST_BLOCK],
        "P1_001N" => [10i64, 6],
        "H1_001N" => [4i64, 3],
    )
    .unwrap()
}

#[test]
fn address_resolves_to_block_and_tract_totals() {
    let tagger = RuleTagger::new();
    let parsed = parse_address(&tagger, "125 Main St, Washington, DC 20001").unwrap();
    assert_eq!(parsed.state.as_deref(), Some("DC"));
    assert_eq!(parsed.zip5(), Some("20001"));

    let matcher = AddressMatcher::new(vec![main_street()]);
    let geocoded = matcher.match_address(&parsed, parsed.zip5());
    assert_eq!(geocoded.match_type, MatchType::Interpolated);
    assert_eq!(geocoded.segment_id.as_deref(), Some("110123"));

    let (lat, lon) = (geocoded.latitude.unwrap(), geocoded.longitude.unwrap());
    let expected_lon = -77.02 + 0.02 * (24.0 / 98.0);
    assert!((lon - expected_lon).abs() < 1e-9);
    assert!((lat - 38.90).abs() < 1e-9);

    let resolver = SpatialResolver::new(vec![block(WEST_BLOCK, -77.02, -77.01), block(EAST_BLOCK, -77.01, -77.00)]);
    let unit = resolver.resolve(Point::new(lon, lat)).unwrap();
    assert_eq!(unit.geoid, WEST_BLOCK);
    assert_eq!(resolver.resolve_level(Point::new(lon, lat), GeoLevel::Tract), Some("11001000101"));

    let tract = geoid::truncate(&unit.geoid, GeoLevel::Tract);
    let variables = vec!["P1_001N".to_string(), "H1_001N".to_string()];
    let df = aggregate(&counts(), "GEO_ID", &[tract], &variables, GeoLevel::Tract).unwrap();
    let rows = to_value_maps(&df, &variables).unwrap();
    assert_eq!(rows[0]["P1_001N"], Some(16.0));
    assert_eq!(rows[0]["H1_001N"], Some(7.0));
}

#[test]
fn house_range_and_street_name_gate_matches() {
    let tagger = RuleTagger::new();
    let matcher = AddressMatcher::new(vec![main_street()]);

    let even = parse_address(&tagger, "150 Main St, Washington, DC 20001").unwrap();
    assert!(matcher.match_address(&even, even.zip5()).is_matched());

    let out_of_range = parse_address(&tagger, "450 Main St, Washington, DC 20001").unwrap();
    assert_eq!(matcher.match_address(&out_of_range, out_of_range.zip5()).match_type, MatchType::NoMatch);

    let other_street = parse_address(&tagger, "125 Oak Ave, Washington, DC 20001").unwrap();
    assert!(!matcher.match_address(&other_street, other_street.zip5()).is_matched());
}

#[test]
fn batch_resolution_keeps_input_order() {
    let resolver = SpatialResolver::new(vec![block(WEST_BLOCK, -77.02, -77.01), block(EAST_BLOCK, -77.01, -77.00)]);
    let points = [Point::new(-77.005, 38.9), Point::new(-80.0, 38.9), Point::new(-77.015, 38.9)];
    let hits: Vec<Option<&str>> = resolver.resolve_batch(&points).into_iter()
        .map(|unit| unit.map(|u| u.geoid.as_str()))
        .collect();
    assert_eq!(hits, [Some(EAST_BLOCK), None, Some(WEST_BLOCK)]);
}

#[test]
fn aggregation_preserves_duplicates_and_unknown_ids() {
    let variables = vec!["P1_001N".to_string()];
    let df = aggregate(
        &counts(),
        "GEO_ID",
        &[EAST_BLOCK, "110019999999999", EAST_BLOCK],
        &variables,
        GeoLevel::Block,
    )
    .unwrap();
    let rows = to_value_maps(&df, &variables).unwrap();
    let values: Vec<Option<f64>> = rows.iter().map(|r| r["P1_001N"]).collect();
    assert_eq!(values, [Some(6.0), None, Some(6.0)]);
}
