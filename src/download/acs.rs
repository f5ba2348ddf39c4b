//! ACS 5-year estimates from the Census Data API, tract level.

use std::{collections::BTreeMap, path::Path};

use futures::future::try_join_all;
use polars::prelude::*;
use serde_json::Value;

use super::{RetryPolicy, Transport};
use crate::catalog::Fetched;
use crate::common;
use crate::error::{Error, Result};

/// Maximum variables per API request.
pub const ACS_BATCH_SIZE: usize = 50;

/// API endpoint for a survey year.
pub fn acs_api_base(year: u16) -> String {
    format!("https://api.census.gov/data/{year}/acs/acs5")
}

/// Tract-level request for one batch of variables in a state.
pub fn acs_url(year: u16, state_fips: &str, batch: &[String]) -> String {
    format!(
        "{}?get=GEO_ID,NAME,{}&for=tract:*&in=state:{state_fips}%20county:*",
        acs_api_base(year),
        batch.join(","),
    )
}

/// One merged row: display name plus values by variable.
#[derive(Debug, Default)]
struct TractRow {
    name: Option<String>,
    values: BTreeMap<String, Option<f64>>,
}

/// Trailing digits of `1400000US06001400100`.
fn geoid_from_api(geo_id: &str) -> &str {
    let start = geo_id.rfind(|c: char| !c.is_ascii_digit()).map_or(0, |i| i + 1);
    &geo_id[start..]
}

fn parse_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Merge one API response (header row first) into `rows`, keyed by GEOID.
fn merge_response(body: &[u8], rows: &mut BTreeMap<String, TractRow>) -> Result<()> {
    let table: Vec<Vec<Value>> = serde_json::from_slice(body)?;
    let Some((header, records)) = table.split_first() else { return Ok(()) };

    let header: Vec<&str> = header.iter().map(|h| h.as_str().unwrap_or("")).collect();
    let column = |name: &str| header.iter().position(|h| *h == name);
    let geo_col = column("GEO_ID")
        .ok_or_else(|| Error::Data("ACS response has no GEO_ID column".into()))?;
    let name_col = column("NAME");

    for record in records {
        let Some(geo_id) = record.get(geo_col).and_then(Value::as_str) else { continue };
        let row = rows.entry(geoid_from_api(geo_id).to_string()).or_default();
        if row.name.is_none() {
            row.name = name_col.and_then(|i| record.get(i)).and_then(Value::as_str).map(str::to_string);
        }
        for (i, field) in header.iter().enumerate() {
            if matches!(*field, "GEO_ID" | "NAME" | "state" | "county" | "tract") {
                continue;
            }
            row.values.insert(field.to_string(), record.get(i).and_then(parse_value));
        }
    }
    Ok(())
}

/// `GEOID`, `NAME`, then `variables` as Float64.
fn to_frame(rows: BTreeMap<String, TractRow>, variables: &[String]) -> Result<DataFrame> {
    let mut columns = vec![
        Column::new("GEOID".into(), rows.keys().cloned().collect::<Vec<_>>()),
        Column::new("NAME".into(), rows.values().map(|r| r.name.clone()).collect::<Vec<_>>()),
    ];
    for variable in variables {
        let values: Vec<Option<f64>> = rows.values()
            .map(|r| r.values.get(variable).copied().flatten())
            .collect();
        columns.push(Column::new(variable.as_str().into(), values));
    }
    Ok(DataFrame::new(columns)?)
}

/// Fetch `variables` for every tract in a state, batches in parallel, and
/// write them to `dest` as parquet.
pub(crate) async fn download_acs(
    transport: &dyn Transport,
    retry: &RetryPolicy,
    year: u16,
    state_fips: &str,
    variables: &[String],
    dest: &Path,
) -> Result<Fetched> {
    let api_base = acs_api_base(year);
    tracing::info!(state = state_fips, year, variables = variables.len(), "Downloading ACS 5-year data");

    let requests = variables.chunks(ACS_BATCH_SIZE).map(|batch| {
        let url = acs_url(year, state_fips, batch);
        let api_base = &api_base;
        async move {
            retry.run(&url, || transport.fetch(&url)).await.map_err(|err| match err.status() {
                Some(400) => Error::download(api_base.as_str(), 400, "Invalid API request. Check variable names."),
                _ => err,
            })
        }
    });
    let bodies = try_join_all(requests).await?;

    let mut rows = BTreeMap::new();
    for body in &bodies {
        merge_response(body, &mut rows)?;
    }
    tracing::debug!(state = state_fips, tracts = rows.len(), batches = bodies.len(), "merged ACS responses");

    let mut df = to_frame(rows, variables)?;
    let dest_path = dest.to_path_buf();
    tokio::task::spawn_blocking(move || common::write_to_parquet(&mut df, &dest_path))
        .await
        .map_err(|err| Error::Data(format!("ACS write task failed: {err}")))??;

    Ok(Fetched { path: dest.to_path_buf(), source_url: api_base })
}
