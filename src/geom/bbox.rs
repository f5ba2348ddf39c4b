use geo::{BoundingRect, MultiPolygon, Rect};
use rstar::{AABB, RTreeObject};

/// A bounding box in an R-tree, associated with a geographic unit by index.
#[derive(Debug, Clone)]
pub(super) struct BoundingBox {
    idx: usize, // Index of corresponding unit in the resolver
    bbox: Rect<f64>,
}

impl BoundingBox {
    /// Box around `shape`, or `None` for an empty geometry.
    pub(super) fn of(idx: usize, shape: &MultiPolygon<f64>) -> Option<Self> {
        shape.bounding_rect().map(|bbox| Self { idx, bbox })
    }

    /// Get the index of the corresponding unit.
    pub(super) fn idx(&self) -> usize { self.idx }

    /// Get a reference to the bounding rectangle.
    pub(super) fn bbox(&self) -> &Rect<f64> { &self.bbox }
}

impl RTreeObject for BoundingBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bbox.min().into(), self.bbox.max().into())
    }
}
