use std::{collections::BTreeSet, fs::File, path::Path};

use anyhow::{Context, Result};
use census_lookup::LookupResult;
use polars::{frame::DataFrame, io::{SerReader, SerWriter}, prelude::{Column, CsvReadOptions, CsvWriter, NamedFrom}, series::Series};

use crate::cli::{BatchArgs, Cli};
use crate::commands::build_lookup;

pub async fn run(cli: &Cli, args: &BatchArgs) -> Result<()> {
    let addresses = read_addresses(&args.input, &args.address_column)?;
    eprintln!("[batch] geocoding {} addresses from {}", addresses.len(), args.input.display());

    let lookup = build_lookup(cli, &args.vars)?;
    let results = lookup.geocode_batch(&addresses, None).await;

    let matched = results.iter().filter(|r| r.is_matched()).count();
    let mut df = results_frame(&results)?;
    let file = File::create(&args.output)
        .with_context(|| format!("[batch] Failed to create CSV file: {}", args.output.display()))?;
    CsvWriter::new(file)
        .finish(&mut df)
        .with_context(|| format!("[batch] Failed to write CSV to {}", args.output.display()))?;

    eprintln!("[batch] matched {matched} of {} -> {}", results.len(), args.output.display());
    Ok(())
}

/// Address column as strings; nulls become empty addresses.
fn read_addresses(path: &Path, column: &str) -> Result<Vec<String>> {
    let file = File::open(path)
        .with_context(|| format!("[batch] Failed to open CSV file: {}", path.display()))?;
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(file)
        .finish()
        .with_context(|| format!("[batch] Failed to read CSV from {}", path.display()))?;

    let values = df.column(column)
        .with_context(|| format!("[batch] Missing address column {column:?}"))?
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or_default().to_string())
        .collect();
    Ok(values)
}

/// One row per result, variables as trailing columns.
fn results_frame(results: &[LookupResult]) -> Result<DataFrame> {
    let mut columns: Vec<Column> = vec![
        text_column("input_address", results, |r| r.input_address.as_deref()),
        text_column("matched_address", results, |r| r.matched_address.as_deref()),
        Series::new("status".into(), results.iter().map(|r| r.status.to_str()).collect::<Vec<_>>()).into(),
        Series::new("match_score".into(), results.iter().map(|r| r.match_score).collect::<Vec<_>>()).into(),
        Series::new("latitude".into(), results.iter().map(|r| r.latitude).collect::<Vec<_>>()).into(),
        Series::new("longitude".into(), results.iter().map(|r| r.longitude).collect::<Vec<_>>()).into(),
        text_column("geoid", results, |r| r.geoid.as_deref()),
        text_column("state_fips", results, |r| r.state_fips.as_deref()),
        text_column("county_fips", results, |r| r.county_fips.as_deref()),
        text_column("tract", results, |r| r.tract.as_deref()),
        text_column("block_group", results, |r| r.block_group.as_deref()),
        text_column("block", results, |r| r.block.as_deref()),
        text_column("error", results, |r| r.error.as_deref()),
    ];

    let variables: BTreeSet<&String> = results.iter().flat_map(|r| r.variables.keys()).collect();
    for variable in variables {
        let values: Vec<Option<f64>> = results.iter()
            .map(|r| r.variables.get(variable).copied().flatten())
            .collect();
        columns.push(Series::new(variable.as_str().into(), values).into());
    }

    DataFrame::new(columns).context("[batch] Failed to build results frame")
}

fn text_column(name: &str, results: &[LookupResult], field: fn(&LookupResult) -> Option<&str>) -> Column {
    Series::new(name.into(), results.iter().map(field).collect::<Vec<_>>()).into()
}
