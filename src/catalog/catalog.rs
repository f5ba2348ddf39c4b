use std::{collections::BTreeMap, fmt, fs, path::{Path, PathBuf}, sync::{Mutex, MutexGuard, PoisonError}};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common;
use crate::error::Result;

const CATALOG_VERSION: &str = "1.0";

/// Kinds of locally cached datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    /// TIGER/Line block polygons, one shapefile per state.
    Blocks,
    /// TIGER/Line address range features, one shapefile per county.
    Addrfeat,
    /// PL 94-171 block counts, one parquet file per state.
    Pl94171,
    /// ACS 5-year tract estimates, one parquet file per state.
    Acs5Tract,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 4] = [Self::Blocks, Self::Addrfeat, Self::Pl94171, Self::Acs5Tract];

    pub fn to_str(self) -> &'static str {
        match self {
            DatasetKind::Blocks => "blocks",
            DatasetKind::Addrfeat => "addrfeat",
            DatasetKind::Pl94171 => "pl94171",
            DatasetKind::Acs5Tract => "acs5_tract",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.to_str()) }
}

/// Identity of one cached dataset: kind, state FIPS and optional county FIPS.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DatasetKey {
    pub kind: DatasetKind,
    pub state: String,
    pub county: Option<String>,
}

impl DatasetKey {
    pub fn state(kind: DatasetKind, state: impl Into<String>) -> Self {
        Self { kind, state: state.into(), county: None }
    }

    pub fn county(kind: DatasetKind, state: impl Into<String>, county: impl Into<String>) -> Self {
        Self { kind, state: state.into(), county: Some(county.into()) }
    }
}

impl fmt::Display for DatasetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.county {
            Some(county) => write!(f, "{}:{}:{}", self.kind, self.state, county),
            None => write!(f, "{}:{}", self.kind, self.state),
        }
    }
}

/// Catalog entry for one downloaded dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetDescriptor {
    pub dataset_type: DatasetKind,
    pub state_fips: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub county_fips: Option<String>,
    pub file_path: PathBuf,
    pub downloaded_at: DateTime<Utc>,
    pub file_size: u64,
    pub source_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl DatasetDescriptor {
    /// Describe a file that was just written, computing its size and SHA-256.
    pub fn for_file(key: &DatasetKey, path: &Path, source_url: impl Into<String>) -> Result<Self> {
        let file_size = fs::metadata(path)
            .with_context(|| format!("[catalog] Failed to stat {}", path.display()))?
            .len();
        Ok(Self {
            dataset_type: key.kind,
            state_fips: key.state.clone(),
            county_fips: key.county.clone(),
            file_path: path.to_path_buf(),
            downloaded_at: Utc::now(),
            file_size,
            source_url: source_url.into(),
            checksum: Some(common::sha256_file(path)?),
        })
    }

    pub fn key(&self) -> DatasetKey {
        DatasetKey { kind: self.dataset_type, state: self.state_fips.clone(), county: self.county_fips.clone() }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogFile {
    version: String,
    datasets: BTreeMap<String, DatasetDescriptor>,
}

impl CatalogFile {
    fn empty() -> Self { Self { version: CATALOG_VERSION.into(), datasets: BTreeMap::new() } }
}

/// Persistent record of which datasets are cached on disk.
///
/// All mutations hold one lock and rewrite the JSON file through a temp file
/// and atomic rename.
#[derive(Debug)]
pub struct Catalog {
    path: PathBuf,
    inner: Mutex<CatalogFile>,
}

impl Catalog {
    /// Open the catalog at `path`. A missing file yields an empty catalog; a
    /// corrupt one is logged and replaced by an empty catalog.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let inner = Self::read_file(&path);
        Self { path, inner: Mutex::new(inner) }
    }

    fn read_file(path: &Path) -> CatalogFile {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(_) => return CatalogFile::empty(),
        };
        match serde_json::from_slice(&bytes) {
            Ok(file) => file,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "catalog is corrupt, starting empty");
                CatalogFile::empty()
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, CatalogFile> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn save(&self, file: &CatalogFile) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(file)?;
        common::write_atomic(&self.path, &bytes)?;
        Ok(())
    }

    /// Location of the catalog file.
    pub fn path(&self) -> &Path { &self.path }

    /// Insert or replace the entry for the descriptor's key.
    pub fn register(&self, descriptor: DatasetDescriptor) -> Result<()> {
        let mut file = self.lock();
        let key = descriptor.key().to_string();
        tracing::debug!(key = %key, path = %descriptor.file_path.display(), "registering dataset");
        file.datasets.insert(key, descriptor);
        self.save(&file)
    }

    /// Remove the entry for `key`. Returns whether one existed.
    pub fn unregister(&self, key: &DatasetKey) -> Result<bool> {
        let mut file = self.lock();
        let removed = file.datasets.remove(&key.to_string()).is_some();
        if removed {
            self.save(&file)?;
        }
        Ok(removed)
    }

    /// Registered and still present on disk.
    pub fn is_available(&self, key: &DatasetKey) -> bool {
        self.lock().datasets.get(&key.to_string())
            .is_some_and(|d| d.file_path.exists())
    }

    pub fn get_info(&self, key: &DatasetKey) -> Option<DatasetDescriptor> {
        self.lock().datasets.get(&key.to_string()).cloned()
    }

    /// Path of an available dataset. On a miss the catalog is reloaded from
    /// disk once, picking up entries written by another process.
    pub fn get_path(&self, key: &DatasetKey) -> Option<PathBuf> {
        let lookup = |file: &CatalogFile| file.datasets.get(&key.to_string())
            .map(|d| d.file_path.clone())
            .filter(|p| p.exists());

        let mut file = self.lock();
        if let Some(path) = lookup(&file) {
            return Some(path);
        }
        *file = Self::read_file(&self.path);
        lookup(&file)
    }

    /// Sorted, distinct state keys with at least one dataset of `kind`.
    pub fn list_keys(&self, kind: DatasetKind) -> Vec<String> {
        let mut states: Vec<String> = self.lock().datasets.values()
            .filter(|d| d.dataset_type == kind)
            .map(|d| d.state_fips.clone())
            .collect();
        states.sort();
        states.dedup();
        states
    }

    /// Sorted county keys of `kind` within `state`.
    pub fn list_counties(&self, kind: DatasetKind, state: &str) -> Vec<String> {
        let mut counties: Vec<String> = self.lock().datasets.values()
            .filter(|d| d.dataset_type == kind && d.state_fips == state)
            .filter_map(|d| d.county_fips.clone())
            .collect();
        counties.sort();
        counties
    }

    /// All entries, ordered by key.
    pub fn entries(&self) -> Vec<DatasetDescriptor> {
        self.lock().datasets.values().cloned().collect()
    }

    /// Drop every entry, or only those of one state. Returns the removed entries.
    pub fn clear(&self, state: Option<&str>) -> Result<Vec<DatasetDescriptor>> {
        let mut file = self.lock();
        let (removed, kept): (BTreeMap<_, _>, BTreeMap<_, _>) = std::mem::take(&mut file.datasets)
            .into_iter()
            .partition(|(_, d)| state.is_none_or(|s| d.state_fips == s));
        file.datasets = kept;
        self.save(&file)?;
        Ok(removed.into_values().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(dir: &Path, key: &DatasetKey) -> DatasetDescriptor {
        let path = dir.join(format!("{}.bin", key.to_string().replace(':', "_")));
        fs::write(&path, b"data").unwrap();
        DatasetDescriptor::for_file(key, &path, "https://example.test/file.zip").unwrap()
    }

    #[test]
    fn key_display() {
        assert_eq!(DatasetKey::state(DatasetKind::Blocks, "06").to_string(), "blocks:06");
        assert_eq!(DatasetKey::county(DatasetKind::Addrfeat, "06", "001").to_string(), "addrfeat:06:001");
        assert_eq!(DatasetKey::state(DatasetKind::Acs5Tract, "06").to_string(), "acs5_tract:06");
    }

    #[test]
    fn register_persists_and_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let key = DatasetKey::state(DatasetKind::Blocks, "06");
        let catalog = Catalog::open(dir.path().join("catalog.json"));
        assert!(!catalog.is_available(&key));

        let d = descriptor(dir.path(), &key);
        catalog.register(d.clone()).unwrap();
        assert!(catalog.is_available(&key));
        assert_eq!(d.file_size, 4);
        assert_eq!(d.checksum.as_deref().map(str::len), Some(64));

        let reopened = Catalog::open(dir.path().join("catalog.json"));
        assert_eq!(reopened.get_info(&key), Some(d));
    }

    #[test]
    fn missing_file_is_not_available() {
        let dir = tempfile::tempdir().unwrap();
        let key = DatasetKey::state(DatasetKind::Pl94171, "06");
        let catalog = Catalog::open(dir.path().join("catalog.json"));
        let d = descriptor(dir.path(), &key);
        fs::remove_file(&d.file_path).unwrap();
        catalog.register(d).unwrap();
        assert!(!catalog.is_available(&key));
        assert!(catalog.get_path(&key).is_none());
        assert!(catalog.get_info(&key).is_some());
    }

    #[test]
    fn corrupt_catalog_resets_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(&path, b"{ not json").unwrap();
        let catalog = Catalog::open(&path);
        assert!(catalog.entries().is_empty());

        let key = DatasetKey::state(DatasetKind::Blocks, "01");
        catalog.register(descriptor(dir.path(), &key)).unwrap();
        assert!(Catalog::open(&path).is_available(&key));
    }

    #[test]
    fn get_path_reloads_on_miss() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let reader = Catalog::open(&path);
        let writer = Catalog::open(&path);

        let key = DatasetKey::state(DatasetKind::Blocks, "11");
        let d = descriptor(dir.path(), &key);
        writer.register(d.clone()).unwrap();
        assert_eq!(reader.get_path(&key), Some(d.file_path));
    }

    #[test]
    fn list_and_clear_by_state() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::open(dir.path().join("catalog.json"));
        for key in [
            DatasetKey::state(DatasetKind::Blocks, "06"),
            DatasetKey::state(DatasetKind::Blocks, "01"),
            DatasetKey::county(DatasetKind::Addrfeat, "06", "003"),
            DatasetKey::county(DatasetKind::Addrfeat, "06", "001"),
        ] {
            catalog.register(descriptor(dir.path(), &key)).unwrap();
        }
        assert_eq!(catalog.list_keys(DatasetKind::Blocks), vec!["01", "06"]);
        assert_eq!(catalog.list_keys(DatasetKind::Addrfeat), vec!["06"]);
        assert_eq!(catalog.list_counties(DatasetKind::Addrfeat, "06"), vec!["001", "003"]);

        let removed = catalog.clear(Some("06")).unwrap();
        assert_eq!(removed.len(), 3);
        assert_eq!(catalog.list_keys(DatasetKind::Blocks), vec!["01"]);

        let key = DatasetKey::state(DatasetKind::Blocks, "01");
        assert!(catalog.unregister(&key).unwrap());
        assert!(!catalog.unregister(&key).unwrap());
        assert!(catalog.clear(None).unwrap().is_empty());
    }
}
