use geo::{Area, Contains, Coord, Intersects, MultiPolygon, Point, Rect};
use rstar::{AABB, RTree};

use crate::geoid::{GeoLevel, truncate};
use crate::geom::BoundingBox;

/// A census geography with its polygon and precomputed planar area.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoUnit {
    pub geoid: String,
    pub geometry: MultiPolygon<f64>,
    pub area: f64,
}

impl GeoUnit {
    pub fn new(geoid: impl Into<String>, geometry: MultiPolygon<f64>) -> Self {
        let area = geometry.unsigned_area();
        Self { geoid: geoid.into(), geometry, area }
    }
}

/// Point-in-polygon lookup over a fixed set of units, with an R-tree of
/// bounding boxes as the broad phase.
#[derive(Debug, Clone)]
pub struct SpatialResolver {
    units: Vec<GeoUnit>,
    rtree: RTree<BoundingBox>,
}

impl SpatialResolver {
    /// Build the index. Units with empty geometry are kept but never match.
    pub fn new(units: Vec<GeoUnit>) -> Self {
        let rtree = RTree::bulk_load(
            units.iter().enumerate()
                .filter_map(|(i, unit)| BoundingBox::of(i, &unit.geometry))
                .collect()
        );
        tracing::debug!(units = units.len(), "built spatial index");
        Self { units, rtree }
    }

    /// Get the number of units.
    #[inline] pub fn len(&self) -> usize { self.units.len() }

    /// Check if there are no units.
    #[inline] pub fn is_empty(&self) -> bool { self.units.is_empty() }

    #[inline] pub fn units(&self) -> &[GeoUnit] { &self.units }

    /// Indices of units whose bounding box contains `point`, ascending.
    fn candidates(&self, point: Point<f64>) -> Vec<usize> {
        let mut hits: Vec<usize> = self.rtree
            .locate_in_envelope_intersecting(&AABB::from_point([point.x(), point.y()]))
            .map(|bbox| bbox.idx())
            .collect();
        hits.sort_unstable();
        hits
    }

    /// Unit covering `point` (boundary included). When several cover it,
    /// the one with the smallest area wins, ties going to the earlier unit.
    pub fn resolve(&self, point: Point<f64>) -> Option<&GeoUnit> {
        self.candidates(point).into_iter()
            .map(|i| &self.units[i])
            .filter(|unit| unit.geometry.intersects(&point))
            .fold(None, |best: Option<&GeoUnit>, unit| match best {
                Some(b) if b.area <= unit.area => Some(b),
                _ => Some(unit),
            })
    }

    /// GEOID of the covering unit, truncated to `level`.
    pub fn resolve_level(&self, point: Point<f64>, level: GeoLevel) -> Option<&str> {
        self.resolve(point).map(|unit| truncate(&unit.geoid, level))
    }

    /// Strict-interior lookup for many points. Each point gets the first
    /// unit (in load order) that contains it; points on a boundary or
    /// outside every unit get `None`.
    pub fn resolve_batch(&self, points: &[Point<f64>]) -> Vec<Option<&GeoUnit>> {
        points.iter()
            .map(|&point| {
                self.candidates(point).into_iter()
                    .map(|i| &self.units[i])
                    .find(|unit| unit.geometry.contains(&point))
            })
            .collect()
    }

    /// Compute the bounding rectangle of all units.
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.rtree.iter()
            .map(|bbox| *bbox.bbox())
            .reduce(|a, b| Rect::new(
                Coord {
                    x: a.min().x.min(b.min().x),
                    y: a.min().y.min(b.min().y),
                },
                Coord {
                    x: a.max().x.max(b.max().x),
                    y: a.max().y.max(b.max().y),
                }
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, point};

    fn square(x0: f64, y0: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
            (x: x0, y: y0),
            (x: x0 + size, y: y0),
            (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size),
            (x: x0, y: y0),
        ]])
    }

    fn resolver() -> SpatialResolver {
        SpatialResolver::new(vec![
            GeoUnit::new("060010001001000", square(0.0, 0.0, 1.0)),
            GeoUnit::new("060010001001001", square(1.0, 0.0, 1.0)),
            GeoUnit::new("060010001001002", square(0.0, 1.0, 2.0)),
            // Nested inside the 2x2 square above.
            GeoUnit::new("060010001001003", square(0.5, 1.5, 0.5)),
        ])
    }

    #[test]
    fn resolves_interior_point() {
        let r = resolver();
        assert_eq!(r.resolve(point!(x: 0.5, y: 0.5)).unwrap().geoid, "060010001001000");
        assert_eq!(r.resolve(point!(x: 1.5, y: 0.5)).unwrap().geoid, "060010001001001");
    }

    #[test]
    fn outside_everything_is_none() {
        let r = resolver();
        assert!(r.resolve(point!(x: 5.0, y: 5.0)).is_none());
        assert_eq!(r.resolve_batch(&[point!(x: -1.0, y: 0.5)]), vec![None]);
    }

    #[test]
    fn smallest_area_wins_when_overlapping() {
        let r = resolver();
        assert_eq!(r.resolve(point!(x: 0.75, y: 1.75)).unwrap().geoid, "060010001001003");
    }

    #[test]
    fn boundary_point_covered_but_not_within() {
        let r = resolver();
        // Shared edge between the two unit squares; equal areas -> first unit.
        let p = point!(x: 1.0, y: 0.5);
        assert_eq!(r.resolve(p).unwrap().geoid, "060010001001000");
        assert!(r.resolve_batch(&[p])[0].is_none());
    }

    #[test]
    fn batch_takes_first_containing_unit() {
        let r = resolver();
        let hits = r.resolve_batch(&[point!(x: 0.75, y: 1.75), point!(x: 0.5, y: 0.5)]);
        assert_eq!(hits[0].unwrap().geoid, "060010001001002");
        assert_eq!(hits[1].unwrap().geoid, "060010001001000");
    }

    #[test]
    fn bbox_hit_without_polygon_hit() {
        let triangle = MultiPolygon(vec![polygon![
            (x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 0.0, y: 4.0), (x: 0.0, y: 0.0),
        ]]);
        let r = SpatialResolver::new(vec![GeoUnit::new("01", triangle)]);
        assert!(r.resolve(point!(x: 3.5, y: 3.5)).is_none());
        assert!(r.resolve(point!(x: 1.0, y: 1.0)).is_some());
    }

    #[test]
    fn resolve_level_truncates() {
        let r = resolver();
        assert_eq!(r.resolve_level(point!(x: 0.5, y: 0.5), GeoLevel::Tract), Some("06001000100"));
    }

    #[test]
    fn bounds_cover_all_units() {
        let b = resolver().bounds().unwrap();
        assert_eq!((b.min().x, b.min().y, b.max().x, b.max().y), (0.0, 0.0, 2.0, 3.0));
        assert!(SpatialResolver::new(vec![]).bounds().is_none());
    }
}
