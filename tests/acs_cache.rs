//! ACS downloads through the data manager against a fake Census API.

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use census_lookup::catalog::{DatasetKey, DatasetKind};
use census_lookup::data::DataManager;
use census_lookup::download::{Transport, acs_api_base};
use census_lookup::{Error, LookupConfig, Result};
use futures::future::{BoxFuture, FutureExt};
use serde_json::{Value, json};

/// Answers every ACS request with two DC tracts and records the URLs.
#[derive(Default)]
struct FakeCensusApi {
    urls: Mutex<Vec<String>>,
}

impl FakeCensusApi {
    fn requests(&self) -> Vec<String> { self.urls.lock().unwrap().clone() }
}

impl Transport for FakeCensusApi {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Bytes>> {
        self.urls.lock().unwrap().push(url.to_string());
        async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            let get = url.split("get=").nth(1).and_then(|s| s.split('&').next()).unwrap_or("");
            let header: Vec<&str> = get.split(',').chain(["state", "county", "tract"]).collect();
            let row = |geo: &str, tract: &str, value: i64| {
                let mut row = vec![Value::from(geo), Value::from("Tract")];
                row.extend((5..header.len()).map(|_| Value::from(value.to_string())));
                row.extend(["11", "001", tract].map(Value::from));
                row
            };
            let body = json!([
                header,
                row("1400000US11001000100", "000100", 52000),
                row("1400000US11001000200", "000200", 61000),
            ]);
            Ok(Bytes::from(body.to_string()))
        }
        .boxed()
    }
}

fn manager(dir: &std::path::Path, api: Arc<FakeCensusApi>, auto_download: bool) -> DataManager {
    let mut config = LookupConfig { data_dir: dir.to_path_buf(), auto_download, ..Default::default() };
    config.download.backoff_ms = 1;
    DataManager::new(&config, api).unwrap()
}

#[tokio::test]
async fn concurrent_requests_share_one_download() {
    let dir = tempfile::tempdir().unwrap();
    let api = Arc::new(FakeCensusApi::default());
    let data = Arc::new(manager(dir.path(), Arc::clone(&api), true));
    let vars = vec!["B19013_001E".to_string()];

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let (data, vars) = (Arc::clone(&data), vars.clone());
            tokio::spawn(async move { data.ensure_acs_data("DC", &vars).await })
        })
        .collect();
    let paths: Vec<_> = futures::future::join_all(tasks).await.into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    assert!(paths.windows(2).all(|w| w[0] == w[1]));
    assert!(paths[0].ends_with("census/acs5/tract/11.parquet"));
    assert_eq!(api.requests().len(), 1);
    assert!(api.requests()[0].starts_with(&acs_api_base(2020)));
    assert!(data.catalog().is_available(&DatasetKey::state(DatasetKind::Acs5Tract, "11")));

    let frame = data.load_acs("11").unwrap();
    assert_eq!(frame.height(), 2);
    let income: Vec<f64> = frame.column("B19013_001E").unwrap().f64().unwrap().into_no_null_iter().collect();
    assert_eq!(income, [52000.0, 61000.0]);
}

#[tokio::test]
async fn missing_variables_trigger_a_wider_refetch() {
    let dir = tempfile::tempdir().unwrap();
    let api = Arc::new(FakeCensusApi::default());
    let data = manager(dir.path(), Arc::clone(&api), true);

    data.ensure_acs_data("11", &["B19013_001E".to_string()]).await.unwrap();
    data.ensure_acs_data("11", &["B19013_001E".to_string()]).await.unwrap();
    assert_eq!(api.requests().len(), 1);

    data.ensure_acs_data("11", &["B08303_001E".to_string()]).await.unwrap();
    assert_eq!(api.requests().len(), 2);
    let columns: Vec<String> = data.load_acs("11").unwrap()
        .get_column_names().iter().map(|c| c.to_string()).collect();
    assert!(columns.contains(&"B19013_001E".to_string()));
    assert!(columns.contains(&"B08303_001E".to_string()));
}

#[tokio::test]
async fn offline_manager_reports_missing_data() {
    let dir = tempfile::tempdir().unwrap();
    let api = Arc::new(FakeCensusApi::default());
    let data = manager(dir.path(), Arc::clone(&api), false);

    let err = data.ensure_acs_data("DC", &["B19013_001E".to_string()]).await.unwrap_err();
    assert!(matches!(err, Error::DataNotAvailable { ref key, .. } if key == "11"));
    assert!(api.requests().is_empty());

    let err = data.ensure_state_data("DC").await.unwrap_err();
    assert!(matches!(err, Error::DataNotAvailable { .. }));
}

#[tokio::test]
async fn catalog_survives_reopen_and_clear() {
    let dir = tempfile::tempdir().unwrap();
    let api = Arc::new(FakeCensusApi::default());
    {
        let data = manager(dir.path(), Arc::clone(&api), true);
        data.ensure_acs_data("11", &[]).await.unwrap();
    }

    let reopened = manager(dir.path(), Arc::clone(&api), false);
    assert_eq!(reopened.available_states(DatasetKind::Acs5Tract), ["11"]);
    assert!(reopened.disk_usage().categories["census/acs5"] > 0);

    assert_eq!(reopened.clear_cache(Some("DC")).unwrap(), 1);
    assert!(reopened.available_states(DatasetKind::Acs5Tract).is_empty());
    assert!(!dir.path().join("census/acs5/tract/11.parquet").exists());
}
