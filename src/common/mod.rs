mod data;
mod fs;
mod shp;

pub(crate) use data::*;
pub(crate) use fs::*;
pub(crate) use shp::*;
