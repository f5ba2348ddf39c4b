#![doc = "Offline US Census geocoding: addresses and coordinates to census geographies and variables"]
mod common;

pub mod address;
pub mod catalog;
pub mod census;
pub mod config;
pub mod data;
pub mod download;
pub mod fips;
pub mod geoid;
pub mod geom;

mod error;
mod logging;
mod lookup;

#[doc(inline)]
pub use error::{Error, Result};

#[doc(inline)]
pub use config::{DownloadConfig, LookupConfig};

#[doc(inline)]
pub use geoid::{GeoComponents, GeoId, GeoLevel};

#[doc(inline)]
pub use lookup::{CensusLookup, LookupResult, LookupStatus, StateIndex};

#[doc(inline)]
pub use logging::{default_filter, init_logging};
