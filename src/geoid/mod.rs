mod geo_id;
mod geo_level;

pub use geo_id::{GeoComponents, GeoId, level_of, parse, truncate, validate};
pub use geo_level::GeoLevel;
