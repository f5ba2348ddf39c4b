use std::collections::BTreeMap;

use anyhow::{Context, Result};
use polars::prelude::*;

use crate::geoid::{GeoLevel, truncate};

/// Name of the GEOID column in every aggregated frame.
pub const GEOID_COLUMN: &str = "GEOID";

/// Requested variables split into those present in `df` and those missing.
fn partition_variables<'a>(df: &DataFrame, variables: &'a [String]) -> (Vec<&'a str>, Vec<&'a str>) {
    variables.iter()
        .map(String::as_str)
        .partition(|v| df.get_column_names().iter().any(|c| c.as_str() == *v))
}

/// One row per input GEOID, in input order: `GEOID` followed by `variables`
/// as Float64, joined from `values`. Variables missing from `values` are null.
fn align(geoids: &[&str], values: DataFrame, right_on: &str, present: &[&str], variables: &[String]) -> Result<DataFrame> {
    let base = DataFrame::new(vec![
        Series::new(GEOID_COLUMN.into(), geoids.to_vec()).into(),
    ])?
    .with_row_index("idx".into(), None)?;

    let mut out = base.lazy()
        .left_join(values.lazy(), col(GEOID_COLUMN), col(right_on))
        .sort(["idx"], SortMultipleOptions::default())
        .select(std::iter::once(col(GEOID_COLUMN))
            .chain(present.iter().map(|&v| col(v).cast(DataType::Float64).alias(v)))
            .collect::<Vec<_>>())
        .collect()
        .context("[census::aggregate] Failed to join values onto input GEOIDs")?;

    let height = out.height();
    for variable in variables.iter().filter(|v| !present.contains(&v.as_str())) {
        out.with_column(Series::full_null(variable.as_str().into(), height, &DataType::Float64))?;
    }
    Ok(out.select(std::iter::once(GEOID_COLUMN).chain(variables.iter().map(String::as_str)))?)
}

/// Sum finest-grain `variables` up to `level` and return one row per entry of
/// `geoids` (already at `level`), preserving order and duplicates.
///
/// `data` must hold a string GEOID column `id_col`. GEOIDs with no matching
/// records get nulls, as do variables absent from `data`.
pub fn aggregate(data: &DataFrame, id_col: &str, geoids: &[&str], variables: &[String], level: GeoLevel) -> Result<DataFrame> {
    let (present, missing) = partition_variables(data, variables);
    if !missing.is_empty() {
        tracing::debug!(?missing, "variables not present in data, filling with nulls");
    }

    // Replace id column with the parent prefix and sum everything else.
    let parent_ids: Vec<Option<&str>> = data.column(id_col)?.str()?
        .into_iter()
        .map(|id| id.map(|id| truncate(id, level)))
        .collect();

    let mut prefixed = data.select(std::iter::once(id_col).chain(present.iter().copied()))?;
    prefixed.replace(id_col, Series::new(id_col.into(), parent_ids))?;

    let grouped = prefixed.lazy()
        .group_by([col(id_col)])
        .agg(present.iter()
            .map(|&v| col(v).sum().alias(v))
            .collect::<Vec<_>>())
        .collect()
        .with_context(|| format!("[census::aggregate] Failed to aggregate to {level}"))?;

    align(geoids, grouped, id_col, &present, variables)
}

/// Join values that are already at the level of `geoids` without summing.
/// Used for ACS estimates, which are not additive.
pub fn join_native(data: &DataFrame, id_col: &str, geoids: &[&str], variables: &[String]) -> Result<DataFrame> {
    let (present, _) = partition_variables(data, variables);
    let values = data.select(std::iter::once(id_col).chain(present.iter().copied()))?;
    align(geoids, values, id_col, &present, variables)
}

/// Per-row `variable -> value` maps of an aligned frame.
pub fn to_value_maps(df: &DataFrame, variables: &[String]) -> Result<Vec<BTreeMap<String, Option<f64>>>> {
    let mut rows = vec![BTreeMap::new(); df.height()];
    for variable in variables {
        let values = df.column(variable)?.f64()?;
        for (row, value) in rows.iter_mut().zip(values.into_iter()) {
            row.insert(variable.clone(), value);
        }
    }
    Ok(rows)
}
