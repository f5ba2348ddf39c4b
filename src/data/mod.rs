mod manager;
mod shapefile;

pub use manager::{DataManager, DiskUsage, StateData};
pub use shapefile::{read_address_features, read_block_counties, read_blocks};
