use std::{collections::BTreeMap, sync::Arc};

use dashmap::DashMap;
use futures::{StreamExt, stream};
use geo::Point;
use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::address::{AddressMatcher, AddressTagger, MatchType, ParsedAddress, RuleTagger, parse_address};
use crate::catalog::SingleFlight;
use crate::census::{AcsGroup, Pl94171Group, aggregate, join_native, to_value_maps};
use crate::config::LookupConfig;
use crate::data::DataManager;
use crate::download::Transport;
use crate::error::{Error, Result};
use crate::fips;
use crate::geoid::{self, GeoLevel, truncate};
use crate::geom::SpatialResolver;

/// GEOID column of the block-level PL 94-171 frame.
const PL_ID_COLUMN: &str = "GEO_ID";
/// GEOID column of the tract-level ACS frame.
const ACS_ID_COLUMN: &str = "GEOID";

/// How a lookup row was resolved, or why it wasn't.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupStatus {
    Exact,
    Interpolated,
    /// Resolved from coordinates supplied by the caller.
    Coordinates,
    #[default]
    NoMatch,
    ParseError,
    NoState,
    /// Geocoded, but no loaded block contains the point.
    NoBlock,
    /// Region data could not be loaded for this row.
    Failed,
}

impl LookupStatus {
    pub fn to_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Interpolated => "interpolated",
            Self::Coordinates => "coordinates",
            Self::NoMatch => "no_match",
            Self::ParseError => "parse_error",
            Self::NoState => "no_state",
            Self::NoBlock => "no_block",
            Self::Failed => "failed",
        }
    }
}

/// One address or coordinate lookup with its census identifiers and values.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LookupResult {
    pub input_address: Option<String>,
    pub parsed_address: Option<ParsedAddress>,
    pub matched_address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub status: LookupStatus,
    pub match_score: f64,
    /// GEOID at the requested level.
    pub geoid: Option<String>,
    pub state_fips: Option<String>,
    /// Five-digit state+county code.
    pub county_fips: Option<String>,
    pub tract: Option<String>,
    pub block_group: Option<String>,
    /// Full block GEOID, only for block-level lookups.
    pub block: Option<String>,
    pub variables: BTreeMap<String, Option<f64>>,
    pub error: Option<String>,
}

impl LookupResult {
    fn for_address(address: &str, status: LookupStatus) -> Self {
        Self { input_address: Some(address.to_string()), status, ..Default::default() }
    }

    fn at_point(lat: f64, lon: f64, status: LookupStatus) -> Self {
        Self { latitude: Some(lat), longitude: Some(lon), status, ..Default::default() }
    }

    /// Fill identifiers from the containing block's GEOID.
    fn with_block(mut self, block_geoid: &str, level: GeoLevel) -> Self {
        self.geoid = Some(truncate(block_geoid, level).to_string());
        if let Ok(components) = geoid::parse(block_geoid) {
            self.county_fips = components.county_geoid();
            self.tract = components.tract_geoid();
            self.block_group = components.block_group_geoid();
            self.state_fips = Some(components.state);
        }
        self.block = (level == GeoLevel::Block).then(|| block_geoid.to_string());
        self
    }

    /// Resolved to a census geography.
    pub fn is_matched(&self) -> bool { self.geoid.is_some() }
}

/// Everything needed to answer lookups inside one state.
#[derive(Debug)]
pub struct StateIndex {
    pub state_fips: String,
    pub matcher: AddressMatcher,
    pub resolver: SpatialResolver,
    /// Block-level PL 94-171 counts.
    pub pl94171: DataFrame,
}

impl StateIndex {
    /// Load and index a state's datasets. Blocking.
    fn build(data: &DataManager, state_fips: &str) -> Result<Self> {
        let resolver = SpatialResolver::new(data.load_blocks(state_fips)?);
        let matcher = AddressMatcher::new(data.load_address_features(state_fips)?);
        let pl94171 = data.load_pl94171(state_fips)?;
        info!(state = state_fips, blocks = resolver.len(), segments = matcher.len(), "state loaded");
        Ok(Self { state_fips: state_fips.to_string(), matcher, resolver, pl94171 })
    }
}

/// Offline address and coordinate lookup against census geographies.
///
/// States load lazily on first use. Concurrent lookups for a state that is
/// still loading wait on the same load.
pub struct CensusLookup {
    data: Arc<DataManager>,
    tagger: Arc<dyn AddressTagger>,
    geo_level: GeoLevel,
    variables: Vec<String>,
    acs_variables: Vec<String>,
    max_concurrency: usize,
    states: Arc<DashMap<String, Arc<StateIndex>>>,
    loads: SingleFlight<String, Arc<StateIndex>>,
    acs: Arc<DashMap<String, Arc<DataFrame>>>,
    acs_loads: SingleFlight<String, Arc<DataFrame>>,
}

impl CensusLookup {
    /// Lookup backed by HTTPS downloads.
    #[cfg(feature = "download")]
    pub fn new(config: LookupConfig) -> Result<Self> {
        let transport = crate::download::HttpTransport::new(&config.download.user_agent, config.download.timeout())?;
        Self::with_transport(config, Arc::new(transport))
    }

    pub fn with_transport(config: LookupConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let data = Arc::new(DataManager::new(&config, transport)?);
        Ok(Self {
            data,
            tagger: Arc::new(RuleTagger::new()),
            geo_level: config.geo_level,
            variables: config.resolved_variables(),
            acs_variables: config.resolved_acs_variables(),
            max_concurrency: config.max_concurrency.max(1),
            states: Arc::new(DashMap::new()),
            loads: SingleFlight::new(),
            acs: Arc::new(DashMap::new()),
            acs_loads: SingleFlight::new(),
        })
    }

    /// Replace the address tokenizer.
    pub fn with_tagger(mut self, tagger: Arc<dyn AddressTagger>) -> Self {
        self.tagger = tagger;
        self
    }

    pub fn data(&self) -> &DataManager { &self.data }

    pub fn geo_level(&self) -> GeoLevel { self.geo_level }

    pub fn set_geo_level(&mut self, level: GeoLevel) { self.geo_level = level; }

    pub fn variables(&self) -> &[String] { &self.variables }

    pub fn acs_variables(&self) -> &[String] { &self.acs_variables }

    /// Replace the PL 94-171 variables returned with each result.
    pub fn set_variables(&mut self, variables: Vec<String>) {
        self.variables = variables;
    }

    /// Add a named PL 94-171 group's variables, e.g. `"race_simple"`.
    pub fn add_variable_group(&mut self, group: &str) -> Result<()> {
        let group: Pl94171Group = group.parse()?;
        extend_unique(&mut self.variables, group.variables());
        Ok(())
    }

    pub fn set_acs_variables(&mut self, variables: Vec<String>) {
        self.acs_variables = variables;
    }

    /// Add a named ACS group's variables, e.g. `"income"`.
    pub fn add_acs_variable_group(&mut self, group: &str) -> Result<()> {
        let group: AcsGroup = group.parse()?;
        extend_unique(&mut self.acs_variables, group.variables());
        Ok(())
    }

    pub fn clear_acs_variables(&mut self) {
        self.acs_variables.clear();
    }

    /// FIPS codes of states currently in memory, sorted.
    pub fn loaded_states(&self) -> Vec<String> {
        let mut states: Vec<String> = self.states.iter().map(|e| e.key().clone()).collect();
        states.sort();
        states
    }

    /// Download (if needed) and index a state. Accepts a FIPS code, postal
    /// abbreviation or name.
    pub async fn load_state(&self, state: &str) -> Result<Arc<StateIndex>> {
        let state_fips = fips::normalize_state(state)?.to_string();
        if let Some(index) = self.states.get(&state_fips) {
            return Ok(Arc::clone(index.value()));
        }

        let data = Arc::clone(&self.data);
        let states = Arc::clone(&self.states);
        let key = state_fips.clone();
        let index = self.loads.run(state_fips.clone(), move || index_state(data, states, key)).await?;

        if !self.acs_variables.is_empty() {
            self.acs_frame(&state_fips).await?;
        }
        Ok(index)
    }

    /// Load several states concurrently.
    pub async fn load_states(&self, states: &[&str]) -> Result<()> {
        futures::future::try_join_all(states.iter().map(|s| self.load_state(s))).await?;
        Ok(())
    }

    /// Tract-level ACS frame for a state covering the configured variables.
    async fn acs_frame(&self, state_fips: &str) -> Result<Arc<DataFrame>> {
        let wanted = self.acs_variables.clone();
        if let Some(frame) = self.acs.get(state_fips) {
            let has_all = wanted.iter().all(|v| frame.get_column_names().iter().any(|c| c.as_str() == v));
            if has_all {
                return Ok(Arc::clone(frame.value()));
            }
        }

        let data = Arc::clone(&self.data);
        let cache = Arc::clone(&self.acs);
        let key = state_fips.to_string();
        self.acs_loads.run(key.clone(), move || async move {
            data.ensure_acs_data(&key, &wanted).await?;
            let load_key = key.clone();
            let frame = tokio::task::spawn_blocking(move || data.load_acs(&load_key))
                .await
                .map_err(|err| Error::Data(format!("ACS load task failed: {err}")))??;
            let frame = Arc::new(frame);
            cache.insert(key, Arc::clone(&frame));
            Ok(frame)
        })
        .await
    }

    /// Geocode one address and attach census variables at `level` (the
    /// configured level when `None`).
    ///
    /// Address-level failures come back as a result with the matching
    /// status. Errors loading the state's data are returned as `Err`.
    pub async fn geocode(&self, address: &str, level: Option<GeoLevel>) -> Result<LookupResult> {
        let level = level.unwrap_or(self.geo_level);
        let mut result = self.locate(address, level).await?;
        self.attach_variables(std::slice::from_mut(&mut result), level).await?;
        Ok(result)
    }

    /// Geocode many addresses concurrently. Output rows line up with the
    /// input; per-row failures are reported in the row.
    pub async fn geocode_batch<S: AsRef<str>>(&self, addresses: &[S], level: Option<GeoLevel>) -> Vec<LookupResult> {
        let level = level.unwrap_or(self.geo_level);
        let mut rows: Vec<LookupResult> = stream::iter(addresses)
            .map(|address| async move {
                let address = address.as_ref();
                self.locate(address, level).await.unwrap_or_else(|err| LookupResult {
                    error: Some(err.to_string()),
                    ..LookupResult::for_address(address, LookupStatus::Failed)
                })
            })
            .buffered(self.max_concurrency)
            .collect()
            .await;

        if let Err(err) = self.attach_variables(&mut rows, level).await {
            warn!(error = %err, "census variables unavailable for some rows");
        }
        let matched = rows.iter().filter(|r| r.is_matched()).count();
        info!(total = rows.len(), matched, "batch geocode complete");
        rows
    }

    /// Parse, match and resolve one address without variables.
    async fn locate(&self, address: &str, level: GeoLevel) -> Result<LookupResult> {
        let parsed = match parse_address(self.tagger.as_ref(), address) {
            Ok(parsed) => parsed,
            Err(err) => {
                debug!(address, error = %err, "address did not parse");
                return Ok(LookupResult {
                    error: Some(err.to_string()),
                    ..LookupResult::for_address(address, LookupStatus::ParseError)
                });
            }
        };

        let state_fips = parsed.state.as_deref().and_then(|s| fips::normalize_state(s).ok());
        let Some(state_fips) = state_fips else {
            return Ok(LookupResult {
                parsed_address: Some(parsed),
                ..LookupResult::for_address(address, LookupStatus::NoState)
            });
        };

        let index = self.load_state(state_fips).await?;
        let geocoded = index.matcher.match_address(&parsed, parsed.zip5());
        let (Some(lat), Some(lon)) = (geocoded.latitude, geocoded.longitude) else {
            return Ok(LookupResult {
                parsed_address: Some(parsed),
                ..LookupResult::for_address(address, LookupStatus::NoMatch)
            });
        };

        let status = match geocoded.match_type {
            MatchType::Exact => LookupStatus::Exact,
            _ => LookupStatus::Interpolated,
        };
        let located = LookupResult {
            input_address: Some(address.to_string()),
            parsed_address: Some(parsed),
            matched_address: geocoded.matched_address,
            latitude: Some(lat),
            longitude: Some(lon),
            match_score: geocoded.match_score,
            ..Default::default()
        };

        Ok(match index.resolver.resolve(Point::new(lon, lat)) {
            Some(unit) => LookupResult { status, ..located }.with_block(&unit.geoid, level),
            None => LookupResult { status: LookupStatus::NoBlock, ..located },
        })
    }

    /// Resolve a coordinate pair against every loaded state.
    pub async fn lookup_coordinates(&self, lat: f64, lon: f64, level: Option<GeoLevel>) -> Result<LookupResult> {
        let level = level.unwrap_or(self.geo_level);
        let point = Point::new(lon, lat);

        let block = self.indexes().iter()
            .find_map(|index| index.resolver.resolve(point).map(|unit| unit.geoid.clone()));
        let Some(block) = block else {
            return Ok(LookupResult::at_point(lat, lon, LookupStatus::NoBlock));
        };

        let mut result = LookupResult {
            match_score: 1.0,
            ..LookupResult::at_point(lat, lon, LookupStatus::Coordinates)
        }
        .with_block(&block, level);
        self.attach_variables(std::slice::from_mut(&mut result), level).await?;
        Ok(result)
    }

    /// Resolve many `(lat, lon)` pairs with the batch containment test.
    /// Non-finite coordinates resolve to nothing.
    pub async fn lookup_coordinates_batch(&self, points: &[(f64, f64)], level: Option<GeoLevel>) -> Result<Vec<LookupResult>> {
        let level = level.unwrap_or(self.geo_level);
        let geo_points: Vec<Point<f64>> = points.iter()
            .map(|&(lat, lon)| if lat.is_finite() && lon.is_finite() {
                Point::new(lon, lat)
            } else {
                Point::new(f64::NAN, f64::NAN)
            })
            .collect();

        let mut blocks: Vec<Option<String>> = vec![None; points.len()];
        for index in self.indexes() {
            for (slot, hit) in blocks.iter_mut().zip(index.resolver.resolve_batch(&geo_points)) {
                if slot.is_none() {
                    *slot = hit.map(|unit| unit.geoid.clone());
                }
            }
        }

        let mut rows: Vec<LookupResult> = points.iter().zip(blocks)
            .map(|(&(lat, lon), block)| match block {
                Some(block) => LookupResult {
                    match_score: 1.0,
                    ..LookupResult::at_point(lat, lon, LookupStatus::Coordinates)
                }
                .with_block(&block, level),
                None => LookupResult::at_point(lat, lon, LookupStatus::NoBlock),
            })
            .collect();
        self.attach_variables(&mut rows, level).await?;
        Ok(rows)
    }

    /// Loaded state indexes in FIPS order.
    fn indexes(&self) -> Vec<Arc<StateIndex>> {
        let mut indexes: Vec<Arc<StateIndex>> = self.states.iter().map(|e| Arc::clone(e.value())).collect();
        indexes.sort_by(|a, b| a.state_fips.cmp(&b.state_fips));
        indexes
    }

    /// Fill `variables` of every resolved row, one aggregation per state.
    /// A state whose values can't be computed gets its error recorded on
    /// each of its rows; the last such error is returned.
    async fn attach_variables(&self, rows: &mut [LookupResult], level: GeoLevel) -> Result<()> {
        let mut by_state: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (i, row) in rows.iter().enumerate() {
            if let (Some(state), Some(_)) = (&row.state_fips, &row.geoid) {
                by_state.entry(state.clone()).or_default().push(i);
            }
        }

        let mut outcome = Ok(());
        for (state, members) in by_state {
            let geoids: Vec<String> = members.iter().filter_map(|&i| rows[i].geoid.clone()).collect();
            let tracts: Vec<String> = members.iter().map(|&i| rows[i].tract.clone().unwrap_or_default()).collect();
            match self.state_values(&state, geoids, tracts, level).await {
                Ok(values) => {
                    for (&i, value) in members.iter().zip(values) {
                        rows[i].variables = value;
                    }
                }
                Err(err) => {
                    for &i in &members {
                        rows[i].error = Some(err.to_string());
                    }
                    outcome = Err(err);
                }
            }
        }
        outcome
    }

    /// PL 94-171 sums at `level` plus ACS estimates at tract level.
    async fn state_values(
        &self,
        state: &str,
        geoids: Vec<String>,
        tracts: Vec<String>,
        level: GeoLevel,
    ) -> Result<Vec<BTreeMap<String, Option<f64>>>> {
        let index = self.states.get(state)
            .map(|e| Arc::clone(e.value()))
            .ok_or_else(|| Error::DataNotAvailable { kind: "pl94171".into(), key: state.to_string() })?;

        let variables = self.variables.clone();
        let mut values = tokio::task::spawn_blocking(move || -> Result<_> {
            let ids: Vec<&str> = geoids.iter().map(String::as_str).collect();
            let df = aggregate(&index.pl94171, PL_ID_COLUMN, &ids, &variables, level)?;
            Ok(to_value_maps(&df, &variables)?)
        })
        .await
        .map_err(|err| Error::Data(format!("aggregation task failed: {err}")))??;

        if !self.acs_variables.is_empty() {
            let frame = self.acs_frame(state).await?;
            let variables = self.acs_variables.clone();
            let acs = tokio::task::spawn_blocking(move || -> Result<_> {
                let ids: Vec<&str> = tracts.iter().map(String::as_str).collect();
                let df = join_native(&frame, ACS_ID_COLUMN, &ids, &variables)?;
                Ok(to_value_maps(&df, &variables)?)
            })
            .await
            .map_err(|err| Error::Data(format!("ACS join task failed: {err}")))??;
            for (row, extra) in values.iter_mut().zip(acs) {
                row.extend(extra);
            }
        }
        Ok(values)
    }
}

fn extend_unique(target: &mut Vec<String>, extra: Vec<String>) {
    for variable in extra {
        if !target.contains(&variable) {
            target.push(variable);
        }
    }
}

/// Body of a state load flight. A flight that finished between the caller's
/// fast path and this one has already indexed the state.
async fn index_state(
    data: Arc<DataManager>,
    states: Arc<DashMap<String, Arc<StateIndex>>>,
    key: String,
) -> Result<Arc<StateIndex>> {
    if let Some(index) = states.get(&key).map(|entry| Arc::clone(entry.value())) {
        return Ok(index);
    }
    data.ensure_state_data(&key).await?;
    let build_key = key.clone();
    let index = tokio::task::spawn_blocking(move || StateIndex::build(&data, &build_key))
        .await
        .map_err(|err| Error::Data(format!("index build task failed: {err}")))??;
    let index = Arc::new(index);
    states.insert(key, Arc::clone(&index));
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::future::{BoxFuture, FutureExt};

    struct Offline;

    impl Transport for Offline {
        fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Bytes>> {
            async move { Err(Error::download(url, 0, "offline")) }.boxed()
        }
    }

    fn lookup(dir: &std::path::Path) -> CensusLookup {
        let config = LookupConfig { data_dir: dir.to_path_buf(), auto_download: false, ..Default::default() };
        CensusLookup::with_transport(config, Arc::new(Offline)).unwrap()
    }

    #[test]
    fn block_geoid_fills_components() {
        let result = LookupResult::default().with_block("110010001011000", GeoLevel::Tract);
        assert_eq!(result.geoid.as_deref(), Some("11001000101"));
        assert_eq!(result.state_fips.as_deref(), Some("11"));
        assert_eq!(result.county_fips.as_deref(), Some("11001"));
        assert_eq!(result.tract.as_deref(), Some("11001000101"));
        assert_eq!(result.block_group.as_deref(), Some("110010001011"));
        assert_eq!(result.block, None);
        assert!(result.is_matched());

        let block = LookupResult::default().with_block("110010001011000", GeoLevel::Block);
        assert_eq!(block.block.as_deref(), Some("110010001011000"));
    }

    #[test]
    fn variable_selection() {
        let dir = tempfile::tempdir().unwrap();
        let mut lookup = lookup(dir.path());
        assert_eq!(lookup.variables(), ["P1_001N"]);

        lookup.add_variable_group("housing").unwrap();
        lookup.add_variable_group("population").unwrap();
        assert_eq!(lookup.variables(), ["P1_001N", "H1_001N", "H1_002N", "H1_003N"]);
        assert!(matches!(lookup.add_variable_group("nope"), Err(Error::UnknownKey { .. })));

        lookup.add_acs_variable_group("income").unwrap();
        assert!(lookup.acs_variables().contains(&"B19013_001E".to_string()));
        lookup.clear_acs_variables();
        assert!(lookup.acs_variables().is_empty());

        lookup.set_variables(vec!["P3_001N".into()]);
        assert_eq!(lookup.variables(), ["P3_001N"]);
    }

    #[tokio::test]
    async fn address_level_failures_are_rows() {
        let dir = tempfile::tempdir().unwrap();
        let lookup = lookup(dir.path());

        let empty = lookup.geocode("   ", None).await.unwrap();
        assert_eq!(empty.status, LookupStatus::ParseError);

        let no_state = lookup.geocode("123 Main St", None).await.unwrap();
        assert_eq!(no_state.status, LookupStatus::NoState);
        assert!(no_state.parsed_address.is_some());
    }

    #[tokio::test]
    async fn missing_region_data_is_an_error_for_single_and_a_row_in_batch() {
        let dir = tempfile::tempdir().unwrap();
        let lookup = lookup(dir.path());

        let err = lookup.geocode("1600 Pennsylvania Ave NW, Washington, DC 20500", None).await.unwrap_err();
        assert!(matches!(err, Error::DataNotAvailable { .. }));

        let rows = lookup.geocode_batch(&["1600 Pennsylvania Ave NW, Washington, DC 20500", ""], None).await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].status, LookupStatus::Failed);
        assert!(rows[0].error.is_some());
        assert_eq!(rows[1].status, LookupStatus::ParseError);
        assert!(lookup.loaded_states().is_empty());
    }

    #[tokio::test]
    async fn batch_with_unusual_row_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let lookup = lookup(dir.path());
        let inputs = ["", "123 Main St", "123 Main St, Washington, DC \u{661}\u{662}\u{663}\u{664}\u{665}", "42 Elm St"];

        let rows = lookup.geocode_batch(&inputs, None).await;
        assert_eq!(rows.len(), inputs.len());
        for (row, input) in rows.iter().zip(inputs) {
            assert_eq!(row.input_address.as_deref(), Some(input));
        }
        assert_eq!(rows[0].status, LookupStatus::ParseError);
        assert_eq!(rows[1].status, LookupStatus::NoState);
        assert!(!rows[2].is_matched());
        assert_eq!(rows[3].status, LookupStatus::NoState);
    }

    #[tokio::test]
    async fn flight_reuses_an_index_built_meanwhile() {
        let dir = tempfile::tempdir().unwrap();
        let lookup = lookup(dir.path());
        let built = Arc::new(StateIndex {
            state_fips: "11".into(),
            matcher: AddressMatcher::new(Vec::new()),
            resolver: SpatialResolver::new(Vec::new()),
            pl94171: DataFrame::empty(),
        });
        lookup.states.insert("11".into(), Arc::clone(&built));

        let index = index_state(Arc::clone(&lookup.data), Arc::clone(&lookup.states), "11".into()).await.unwrap();
        assert!(Arc::ptr_eq(&index, &built));

        let err = index_state(Arc::clone(&lookup.data), Arc::clone(&lookup.states), "24".into()).await.unwrap_err();
        assert!(matches!(err, Error::DataNotAvailable { .. }));
    }

    #[tokio::test]
    async fn coordinates_without_loaded_states() {
        let dir = tempfile::tempdir().unwrap();
        let lookup = lookup(dir.path());
        let result = lookup.lookup_coordinates(38.9, -77.0, None).await.unwrap();
        assert_eq!(result.status, LookupStatus::NoBlock);
        assert_eq!(result.latitude, Some(38.9));

        let rows = lookup.lookup_coordinates_batch(&[(38.9, -77.0), (f64::NAN, 0.0)], None).await.unwrap();
        assert!(rows.iter().all(|r| r.status == LookupStatus::NoBlock));
    }
}
