mod catalog;
mod coordinator;

pub use catalog::{Catalog, DatasetDescriptor, DatasetKey, DatasetKind};
pub use coordinator::{DownloadCoordinator, Fetched, FlightStats, SingleFlight};
