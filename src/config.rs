use std::{collections::BTreeSet, path::{Path, PathBuf}, time::Duration};

use serde::{Deserialize, Serialize};

use crate::census::{AcsGroup, DEFAULT_LOOKUP_VARIABLES, Pl94171Group};
use crate::download::RetryPolicy;
use crate::error::{Error, Result};
use crate::geoid::GeoLevel;

/// Name of the cache directory under the user's home.
pub const DEFAULT_DIR_NAME: &str = ".census-lookup";

/// `~/.census-lookup`, or a relative `.census-lookup` when no home is known.
pub fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(DEFAULT_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DIR_NAME))
}

/// Remote fetch settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Attempts per file, including the first.
    pub retries: u32,
    /// Base delay before the first retry; doubles each attempt.
    pub backoff_ms: u64,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            backoff_ms: 1000,
            timeout_secs: 300,
            user_agent: concat!("census-lookup/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl DownloadConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retries, Duration::from_millis(self.backoff_ms))
    }

    pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }
}

/// Settings for a `CensusLookup`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    pub data_dir: PathBuf,
    /// Level results are reported at unless a call overrides it.
    pub geo_level: GeoLevel,
    /// PL 94-171 variables, merged with `variable_groups`.
    pub variables: Vec<String>,
    pub variable_groups: Vec<Pl94171Group>,
    /// ACS 5-year variables, merged with `acs_variable_groups`.
    pub acs_variables: Vec<String>,
    pub acs_variable_groups: Vec<AcsGroup>,
    pub acs_year: u16,
    /// Fetch missing datasets instead of failing with `DataNotAvailable`.
    pub auto_download: bool,
    /// Upper bound on concurrently processed batch rows.
    pub max_concurrency: usize,
    pub download: DownloadConfig,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            geo_level: GeoLevel::Block,
            variables: Vec::new(),
            variable_groups: Vec::new(),
            acs_variables: Vec::new(),
            acs_variable_groups: Vec::new(),
            acs_year: 2020,
            auto_download: true,
            max_concurrency: 16,
            download: DownloadConfig::default(),
        }
    }
}

impl LookupConfig {
    /// Defaults, overlaid with `path` if given, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Read a JSON config file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|err| Error::Config(format!("cannot read {}: {err}", path.display())))?;
        serde_json::from_str(&text)
            .map_err(|err| Error::Config(format!("{}: {err}", path.display())))
    }

    /// Apply `CENSUS_LOOKUP_*` overrides read through `lookup`.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(dir) = lookup("CENSUS_LOOKUP_DATA_DIR").filter(|v| !v.trim().is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(flag) = lookup("CENSUS_LOOKUP_AUTO_DOWNLOAD") {
            self.auto_download = match flag.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                other => return Err(Error::Config(format!("CENSUS_LOOKUP_AUTO_DOWNLOAD: not a boolean: {other:?}"))),
            };
        }
        if let Some(level) = lookup("CENSUS_LOOKUP_GEO_LEVEL") {
            self.geo_level = level.parse()?;
        }
        Ok(())
    }

    /// Configured PL 94-171 variables plus group members, sorted and
    /// deduplicated. Falls back to total population when nothing is set.
    pub fn resolved_variables(&self) -> Vec<String> {
        let mut set: BTreeSet<String> = self.variables.iter().cloned().collect();
        set.extend(self.variable_groups.iter().flat_map(|g| g.variables()));
        if set.is_empty() {
            set.extend(DEFAULT_LOOKUP_VARIABLES.iter().map(|v| v.to_string()));
        }
        set.into_iter().collect()
    }

    /// Configured ACS variables plus group members, sorted and deduplicated.
    pub fn resolved_acs_variables(&self) -> Vec<String> {
        let mut set: BTreeSet<String> = self.acs_variables.iter().cloned().collect();
        set.extend(self.acs_variable_groups.iter().flat_map(|g| g.variables()));
        set.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = LookupConfig::default();
        assert!(config.data_dir.ends_with(DEFAULT_DIR_NAME));
        assert_eq!(config.geo_level, GeoLevel::Block);
        assert_eq!(config.acs_year, 2020);
        assert!(config.auto_download);
        assert_eq!(config.max_concurrency, 16);
        assert_eq!(config.download.retry_policy(), RetryPolicy::new(3, Duration::from_secs(1)));
        assert_eq!(config.resolved_variables(), ["P1_001N"]);
        assert!(config.resolved_acs_variables().is_empty());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{
            "geo_level": "tract",
            "variable_groups": ["housing"],
            "variables": ["H1_001N", "P1_001N"],
            "acs_variable_groups": ["income"],
            "download": { "retries": 5 }
        }"#).unwrap();

        let config = LookupConfig::from_file(&path).unwrap();
        assert_eq!(config.geo_level, GeoLevel::Tract);
        assert_eq!(config.download.retries, 5);
        assert_eq!(config.download.backoff_ms, 1000);
        assert_eq!(config.resolved_variables(), ["H1_001N", "H1_002N", "H1_003N", "P1_001N"]);
        assert!(config.resolved_acs_variables().contains(&"B19013_001E".to_string()));
    }

    #[test]
    fn unknown_group_in_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "variable_groups": ["nope"] }"#).unwrap();
        assert!(matches!(LookupConfig::from_file(&path), Err(Error::Config(_))));
    }

    #[test]
    fn env_overrides() {
        let mut config = LookupConfig::default();
        config.apply_env_overrides(env(&[
            ("CENSUS_LOOKUP_DATA_DIR", "/tmp/census"),
            ("CENSUS_LOOKUP_AUTO_DOWNLOAD", "off"),
            ("CENSUS_LOOKUP_GEO_LEVEL", "bg"),
        ])).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/census"));
        assert!(!config.auto_download);
        assert_eq!(config.geo_level, GeoLevel::BlockGroup);

        assert!(config.apply_env_overrides(env(&[("CENSUS_LOOKUP_AUTO_DOWNLOAD", "maybe")])).is_err());
        assert!(matches!(
            config.apply_env_overrides(env(&[("CENSUS_LOOKUP_GEO_LEVEL", "planet")])),
            Err(Error::UnknownKey { .. })
        ));
    }
}
