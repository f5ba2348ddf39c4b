mod bbox;
mod resolver;

use bbox::BoundingBox;
pub use resolver::{GeoUnit, SpatialResolver};
