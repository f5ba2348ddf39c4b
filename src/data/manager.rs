//! On-disk dataset cache: layout, coordinated downloads and loading.
//!
//! ```text
//! {data_dir}/
//! ├── catalog.json
//! ├── tiger/blocks/{ss}/tl_2020_{ss}_tabblock20.shp
//! ├── tiger/addrfeat/{ss}/{ssccc}/tl_2020_{ssccc}_addrfeat.shp
//! ├── census/pl94171/{ss}.parquet
//! ├── census/acs5/tract/{ss}.parquet
//! └── temp/
//! ```

use std::{collections::BTreeMap, future::Future, path::{Path, PathBuf}, sync::Arc};

use futures::{StreamExt, TryStreamExt, stream};
use polars::prelude::DataFrame;
use serde::Serialize;

use super::shapefile::{read_address_features, read_block_counties, read_blocks};
use crate::address::AddressRangeSegment;
use crate::catalog::{Catalog, DatasetKey, DatasetKind, DownloadCoordinator, Fetched, FlightStats};
use crate::census::DEFAULT_ACS_VARIABLES;
use crate::common;
use crate::config::LookupConfig;
use crate::download::{self, RetryPolicy, Transport, addrfeat_url, blocks_url};
use crate::error::{Error, Result};
use crate::fips;
use crate::geom::GeoUnit;

/// Disk usage subdirectories reported by `disk_usage`.
const USAGE_CATEGORIES: [&str; 4] = ["tiger/blocks", "tiger/addrfeat", "census/pl94171", "census/acs5"];

/// Paths of a state's core datasets once they are all present.
#[derive(Debug, Clone)]
pub struct StateData {
    pub state_fips: String,
    pub blocks: PathBuf,
    pub address_features: Vec<PathBuf>,
    pub pl94171: PathBuf,
}

/// Bytes on disk per category plus their total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiskUsage {
    pub categories: BTreeMap<String, u64>,
    pub total: u64,
}

/// Owns the data directory and fetches missing datasets through a single
/// `DownloadCoordinator`.
pub struct DataManager {
    data_dir: PathBuf,
    coordinator: DownloadCoordinator,
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
    auto_download: bool,
    acs_year: u16,
    max_concurrency: usize,
}

impl DataManager {
    /// Create the directory layout and open the catalog.
    pub fn new(config: &LookupConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let data_dir = config.data_dir.clone();
        for dir in ["tiger", "census", "temp"] {
            common::ensure_dir_exists(&data_dir.join(dir))?;
        }
        let catalog = Arc::new(Catalog::open(data_dir.join("catalog.json")));
        Ok(Self {
            data_dir,
            coordinator: DownloadCoordinator::new(catalog),
            transport,
            retry: config.download.retry_policy(),
            auto_download: config.auto_download,
            acs_year: config.acs_year,
            max_concurrency: config.max_concurrency.max(1),
        })
    }

    pub fn data_dir(&self) -> &Path { &self.data_dir }

    pub fn catalog(&self) -> &Catalog { self.coordinator.catalog() }

    pub fn download_stats(&self) -> FlightStats { self.coordinator.stats() }

    fn temp_dir(&self) -> PathBuf { self.data_dir.join("temp") }

    fn blocks_dir(&self, state: &str) -> PathBuf { self.data_dir.join("tiger/blocks").join(state) }

    fn addrfeat_dir(&self, state: &str, county: &str) -> PathBuf {
        self.data_dir.join("tiger/addrfeat").join(state).join(format!("{state}{county}"))
    }

    fn pl94171_path(&self, state: &str) -> PathBuf {
        self.data_dir.join("census/pl94171").join(format!("{state}.parquet"))
    }

    fn acs_path(&self, state: &str) -> PathBuf {
        self.data_dir.join("census/acs5/tract").join(format!("{state}.parquet"))
    }

    /// Registered path of `key`, or `DataNotAvailable`.
    fn registered(&self, key: &DatasetKey) -> Result<PathBuf> {
        self.catalog().get_path(key).ok_or_else(|| not_available(key))
    }

    /// Path of `key`, fetching it through the coordinator when missing and
    /// auto-download is on.
    async fn ensure<F, Fut>(&self, key: DatasetKey, fetch: F) -> Result<PathBuf>
    where
        F: FnOnce(Arc<dyn Transport>, RetryPolicy) -> Fut + Send + 'static,
        Fut: Future<Output = Result<Fetched>> + Send + 'static,
    {
        if !self.auto_download {
            return self.registered(&key);
        }
        let transport = Arc::clone(&self.transport);
        let retry = self.retry;
        self.coordinator.ensure(key, move || fetch(transport, retry)).await
    }

    /// Make sure blocks, address features and PL 94-171 data for a state are
    /// on disk. Address features wait on blocks for the county list; PL data
    /// is fetched alongside.
    pub async fn ensure_state_data(&self, state: &str) -> Result<StateData> {
        let state_fips = fips::normalize_state(state)?;

        let geography = async {
            let blocks = self.ensure_blocks(state_fips).await?;
            let features = self.ensure_address_features(state_fips, &blocks).await?;
            Ok::<_, Error>((blocks, features))
        };
        let ((blocks, address_features), pl94171) =
            tokio::try_join!(geography, self.ensure_pl94171(state_fips))?;

        Ok(StateData { state_fips: state_fips.to_string(), blocks, address_features, pl94171 })
    }

    async fn ensure_blocks(&self, state: &str) -> Result<PathBuf> {
        let key = DatasetKey::state(DatasetKind::Blocks, state);
        let (url, temp, dest) = (blocks_url(state), self.temp_dir(), self.blocks_dir(state));
        self.ensure(key, move |transport, retry| async move {
            download::download_shapefile(transport.as_ref(), &retry, &url, &temp, &dest).await
        })
        .await
    }

    async fn ensure_address_features(&self, state: &str, blocks: &Path) -> Result<Vec<PathBuf>> {
        let shp = blocks.to_path_buf();
        let counties = tokio::task::spawn_blocking(move || read_block_counties(&shp))
            .await
            .map_err(|err| Error::Data(format!("county scan task failed: {err}")))??;
        tracing::debug!(state, counties = counties.len(), "address features per county");

        stream::iter(counties)
            .map(|county| {
                let key = DatasetKey::county(DatasetKind::Addrfeat, state, county.as_str());
                let url = addrfeat_url(state, &county);
                let (temp, dest) = (self.temp_dir(), self.addrfeat_dir(state, &county));
                self.ensure(key, move |transport, retry| async move {
                    download::download_shapefile(transport.as_ref(), &retry, &url, &temp, &dest).await
                })
            })
            .buffered(self.max_concurrency)
            .try_collect()
            .await
    }

    async fn ensure_pl94171(&self, state: &str) -> Result<PathBuf> {
        let key = DatasetKey::state(DatasetKind::Pl94171, state);
        let (state_fips, temp, dest) = (state.to_string(), self.temp_dir(), self.pl94171_path(state));
        self.ensure(key, move |transport, retry| async move {
            download::download_pl94171(transport.as_ref(), &retry, &state_fips, &temp, &dest).await
        })
        .await
    }

    /// Make sure tract-level ACS data holding every variable in `variables`
    /// is on disk. A cached file missing some of them is fetched again with
    /// the union of old and new variables.
    pub async fn ensure_acs_data(&self, state: &str, variables: &[String]) -> Result<PathBuf> {
        let state_fips = fips::normalize_state(state)?;
        let key = DatasetKey::state(DatasetKind::Acs5Tract, state_fips);

        let mut wanted: Vec<String> = DEFAULT_ACS_VARIABLES.iter().map(|v| v.to_string()).collect();
        if let Some(path) = self.catalog().get_path(&key) {
            let cached = tokio::task::spawn_blocking(move || common::read_from_parquet(&path))
                .await
                .map_err(|err| Error::Data(format!("ACS read task failed: {err}")))??;
            let columns: Vec<String> = cached.get_column_names().iter().map(|c| c.to_string()).collect();
            let missing: Vec<&String> = variables.iter().filter(|v| !columns.contains(v)).collect();
            if missing.is_empty() || !self.auto_download {
                return self.registered(&key);
            }
            tracing::info!(state = state_fips, ?missing, "cached ACS data lacks variables, refetching");
            self.catalog().unregister(&key)?;
            wanted.extend(columns.into_iter().filter(|c| c != "GEOID" && c != "NAME"));
        }
        wanted.extend(variables.iter().cloned());
        wanted.sort();
        wanted.dedup();

        let (year, state, dest) = (self.acs_year, state_fips.to_string(), self.acs_path(state_fips));
        self.ensure(key, move |transport, retry| async move {
            download::download_acs(transport.as_ref(), &retry, year, &state, &wanted, &dest).await
        })
        .await
    }

    /// Block polygons of a state already on disk. Blocking.
    pub fn load_blocks(&self, state_fips: &str) -> Result<Vec<GeoUnit>> {
        let path = self.registered(&DatasetKey::state(DatasetKind::Blocks, state_fips))?;
        read_blocks(&path)
    }

    /// Address range segments of every registered county of a state. Blocking.
    pub fn load_address_features(&self, state_fips: &str) -> Result<Vec<AddressRangeSegment>> {
        let counties = self.catalog().list_counties(DatasetKind::Addrfeat, state_fips);
        if counties.is_empty() {
            return Err(not_available(&DatasetKey::state(DatasetKind::Addrfeat, state_fips)));
        }
        let mut segments = Vec::new();
        for county in counties {
            let path = self.registered(&DatasetKey::county(DatasetKind::Addrfeat, state_fips, county))?;
            segments.extend(read_address_features(&path)?);
        }
        Ok(segments)
    }

    /// Block-level PL 94-171 counts keyed by `GEO_ID`. Blocking.
    pub fn load_pl94171(&self, state_fips: &str) -> Result<DataFrame> {
        let path = self.registered(&DatasetKey::state(DatasetKind::Pl94171, state_fips))?;
        Ok(common::read_from_parquet(&path)?)
    }

    /// Tract-level ACS estimates keyed by `GEOID`. Blocking.
    pub fn load_acs(&self, state_fips: &str) -> Result<DataFrame> {
        let path = self.registered(&DatasetKey::state(DatasetKind::Acs5Tract, state_fips))?;
        Ok(common::read_from_parquet(&path)?)
    }

    /// Delete cached data for one state, or everything. Returns the number of
    /// catalog entries removed.
    pub fn clear_cache(&self, state: Option<&str>) -> Result<usize> {
        let state_fips = state.map(fips::normalize_state).transpose()?;
        let removed = self.catalog().clear(state_fips)?;

        match state_fips {
            Some(ss) => {
                common::remove_path(&self.blocks_dir(ss))?;
                common::remove_path(&self.data_dir.join("tiger/addrfeat").join(ss))?;
                common::remove_path(&self.pl94171_path(ss))?;
                common::remove_path(&self.acs_path(ss))?;
                for descriptor in &removed {
                    common::remove_path(&descriptor.file_path)?;
                }
            }
            None => {
                for dir in ["tiger", "census", "temp"] {
                    let path = self.data_dir.join(dir);
                    common::remove_path(&path)?;
                    common::ensure_dir_exists(&path)?;
                }
            }
        }
        tracing::info!(state = state_fips.unwrap_or("all"), entries = removed.len(), "cleared cache");
        Ok(removed.len())
    }

    pub fn disk_usage(&self) -> DiskUsage {
        let mut usage = DiskUsage::default();
        for category in USAGE_CATEGORIES {
            let size = common::dir_size(&self.data_dir.join(category));
            usage.categories.insert(category.to_string(), size);
            usage.total += size;
        }
        usage
    }

    /// States with at least one dataset of `kind` registered.
    pub fn available_states(&self, kind: DatasetKind) -> Vec<String> {
        self.catalog().list_keys(kind)
    }
}

fn not_available(key: &DatasetKey) -> Error {
    let location = match &key.county {
        Some(county) => format!("{}{county}", key.state),
        None => key.state.clone(),
    };
    Error::DataNotAvailable { kind: key.kind.to_string(), key: location }
}
