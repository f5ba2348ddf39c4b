use std::path::Path;

use anyhow::{Context, Result, bail};
use shapefile::{self as shp, Reader, Shape, dbase::{FieldValue, Record}};

/// Reads all shapes and attribute records from a given `.shp` file path.
pub(crate) fn read_from_shapefile(path: &Path) -> Result<(Vec<Shape>, Vec<Record>)> {
    let mut reader = Reader::from_path(path)
        .with_context(|| format!("Failed to open shapefile: {}", path.display()))?;

    let count = reader.shape_count()?;
    let (mut shapes, mut records) = (Vec::with_capacity(count), Vec::with_capacity(count));
    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result
            .with_context(|| format!("Error reading shape+record from {}", path.display()))?;
        shapes.push(shape);
        records.push(record);
    }
    Ok((shapes, records))
}

/// Get the value of a character field from a Record.
pub(crate) fn get_character_field(record: &Record, field: &str) -> Result<String> {
    match record.get(field) {
        Some(FieldValue::Character(Some(s))) => Ok(s.trim().to_string()),
        _ => bail!("missing or invalid character field: {}", field)
    }
}

/// Character field that may be absent or blank.
pub(crate) fn get_optional_field(record: &Record, field: &str) -> Option<String> {
    match record.get(field) {
        Some(FieldValue::Character(Some(s))) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

/// House-number field stored as text. Non-numeric values read as absent.
pub(crate) fn get_house_number_field(record: &Record, field: &str) -> Option<i64> {
    match record.get(field) {
        Some(FieldValue::Character(Some(s))) => s.trim().parse().ok(),
        Some(FieldValue::Numeric(Some(n))) => Some(*n as i64),
        _ => None,
    }
}

/// Convert shapefile::Polygon to geo::MultiPolygon<f64>
pub(crate) fn shp_to_geo(p: &shp::Polygon) -> geo::MultiPolygon<f64> {
    /// Ensure first and last are the same for geo::LineString coords
    fn ensure_closed(coords: &mut Vec<geo::Coord<f64>>) {
        if coords.first() != coords.last() {
            coords.push(coords[0]);
        }
    }

    /// Get the signed area of a geo::Coord list (negative for clockwise)
    fn signed_area(pts: &[geo::Coord<f64>]) -> f64 {
        pts.windows(2).map(|w| w[0].x * w[1].y - w[1].x * w[0].y).sum::<f64>() / 2.0
    }

    // Shapefile stores each exterior (clockwise) followed by its holes.
    let mut polys: Vec<geo::Polygon<f64>> = Vec::new();
    let mut exterior: Option<geo::LineString<f64>> = None;
    let mut holes: Vec<geo::LineString<f64>> = Vec::new();

    for ring in p.rings() {
        let mut coords: Vec<geo::Coord<f64>> = ring.points().iter()
            .map(|pt| geo::Coord { x: pt.x, y: pt.y })
            .collect();
        if coords.is_empty() {
            continue;
        }
        ensure_closed(&mut coords);

        if signed_area(&coords) < 0.0 {
            if let Some(ext) = exterior.replace(geo::LineString(coords)) {
                polys.push(geo::Polygon::new(ext, std::mem::take(&mut holes)));
            }
        } else {
            holes.push(geo::LineString(coords));
        }
    }
    if let Some(ext) = exterior {
        polys.push(geo::Polygon::new(ext, holes));
    }

    geo::MultiPolygon(polys)
}

/// Flatten a shapefile::Polyline into one geo::LineString, parts in order.
pub(crate) fn polyline_to_geo(line: &shp::Polyline) -> geo::LineString<f64> {
    line.parts().iter()
        .flatten()
        .map(|pt| geo::Coord { x: pt.x, y: pt.y })
        .collect()
}
