use std::{collections::BTreeSet, path::Path};

use anyhow::Context;
use shapefile::{Shape, dbase::Record};

use crate::address::{AddressRangeSegment, Parity, SideRange};
use crate::common;
use crate::error::{Error, Result};
use crate::geoid::{GeoLevel, validate};
use crate::geom::GeoUnit;

/// Load TIGER block polygons from a `tabblock20` shapefile.
pub fn read_blocks(path: &Path) -> Result<Vec<GeoUnit>> {
    let (shapes, records) = common::read_from_shapefile(path)?;
    let units = blocks_from_parts(shapes, &records)?;
    tracing::debug!(path = %path.display(), blocks = units.len(), "loaded block shapefile");
    Ok(units)
}

/// Every block must carry a 15-digit `GEOID20`.
fn blocks_from_parts(shapes: Vec<Shape>, records: &[Record]) -> Result<Vec<GeoUnit>> {
    shapes.into_iter()
        .zip(records)
        .filter_map(|(shape, record)| {
            let geometry = match shape {
                Shape::Polygon(p) => common::shp_to_geo(&p),
                Shape::NullShape => return None,
                other => return Some(Err(Error::Data(format!("unexpected block geometry: {:?}", other.shapetype())))),
            };
            Some(block_geoid(record).map(|geoid| GeoUnit::new(geoid, geometry)))
        })
        .collect()
}

fn block_geoid(record: &Record) -> Result<String> {
    let geoid = common::get_character_field(record, "GEOID20")
        .context("[data::shapefile] block record")?;
    if !validate(&geoid, Some(GeoLevel::Block)) {
        return Err(Error::InvalidGeoid { geoid, reason: "expected 15 digits for a block".into() });
    }
    Ok(geoid)
}

/// Distinct three-digit county codes of a block shapefile, read from the
/// attribute table only.
pub fn read_block_counties(path: &Path) -> Result<Vec<String>> {
    let dbf = path.with_extension("dbf");
    let records = shapefile::dbase::Reader::from_path(&dbf)
        .and_then(|mut reader| reader.read())
        .with_context(|| format!("[data::shapefile] Failed to read {}", dbf.display()))?;
    counties_from_records(&records)
}

fn counties_from_records(records: &[Record]) -> Result<Vec<String>> {
    let counties: BTreeSet<String> = records.iter()
        .map(|record| block_geoid(record).map(|geoid| geoid[2..5].to_string()))
        .collect::<Result<_>>()?;
    Ok(counties.into_iter().collect())
}

/// Load address range segments from an `addrfeat` shapefile.
pub fn read_address_features(path: &Path) -> Result<Vec<AddressRangeSegment>> {
    let (shapes, records) = common::read_from_shapefile(path)?;
    let segments = segments_from_parts(shapes, &records);
    tracing::debug!(path = %path.display(), segments = segments.len(), "loaded address features");
    Ok(segments)
}

/// Records without a line geometry are skipped.
fn segments_from_parts(shapes: Vec<Shape>, records: &[Record]) -> Vec<AddressRangeSegment> {
    let side = |record: &Record, from: &str, to: &str, parity: &str, zip: &str| SideRange {
        from: common::get_house_number_field(record, from),
        to: common::get_house_number_field(record, to),
        parity: common::get_optional_field(record, parity).and_then(|code| Parity::from_code(&code)),
        zip: common::get_optional_field(record, zip),
    };

    shapes.into_iter()
        .zip(records)
        .filter_map(|(shape, record)| {
            let Shape::Polyline(line) = shape else { return None };
            Some(AddressRangeSegment {
                linear_id: common::get_optional_field(record, "LINEARID").unwrap_or_default(),
                full_name: common::get_optional_field(record, "FULLNAME").unwrap_or_default(),
                left: side(record, "LFROMHN", "LTOHN", "PARITYL", "ZIPL"),
                right: side(record, "RFROMHN", "RTOHN", "PARITYR", "ZIPR"),
                geometry: common::polyline_to_geo(&line),
            })
        })
        .collect()
}
