//! PL 94-171 legacy-format redistricting files.
//!
//! Each state archive holds a geographic header (`xxgeo2020.pl`) plus data
//! segments joined on LOGRECNO. Segment 1 carries P1 and P2, segment 2
//! carries P3, P4 and H1. All files are pipe-delimited Latin-1 text.

use std::{ops::Range, path::Path};

use anyhow::{Context, anyhow};
use polars::prelude::*;

use super::{RetryPolicy, Transport};
use crate::catalog::Fetched;
use crate::common;
use crate::error::{Error, Result};
use crate::fips;

const PL_BASE: &str = "https://www2.census.gov/programs-surveys/decennial/2020/data/01-Redistricting_File--PL_94-171";

/// Block summary level in the geographic header.
pub const BLOCK_SUMMARY_LEVEL: &str = "750";

// Geographic header column positions.
const GEO_SUMLEV: usize = 2;
const GEO_LOGRECNO: usize = 7;
const GEO_GEOID: usize = 9;

// Segment files start with FILEID, STUSAB, CHARITER, CIFSN, LOGRECNO.
const SEG_LOGRECNO: usize = 4;

/// (table, first column index, column count) per segment.
const SEGMENT1_TABLES: &[(&str, usize, usize)] = &[("P1", 5, 71), ("P2", 76, 73)];
const SEGMENT2_TABLES: &[(&str, usize, usize)] = &[("P3", 5, 71), ("P4", 76, 73), ("H1", 149, 3)];

/// Archive URL for a state, e.g. `.../California/ca2020.pl.zip`.
pub fn pl94171_url(state_fips: &str) -> Result<String> {
    let unknown = || Error::UnknownKey {
        what: "state FIPS code",
        name: state_fips.to_string(),
        valid: "two-digit FIPS codes of the 50 states, DC and PR".into(),
    };
    let name = fips::state_name(state_fips).ok_or_else(unknown)?;
    let abbrev = fips::state_abbrev(state_fips).ok_or_else(unknown)?;
    Ok(format!("{PL_BASE}/{}/{}2020.pl.zip", name.replace(' ', "_"), abbrev.to_ascii_lowercase()))
}

/// Nth column of a headerless frame (`column_{n+1}`).
fn nth<'a>(df: &'a DataFrame, n: usize) -> anyhow::Result<&'a Column> {
    df.get_columns().get(n)
        .ok_or_else(|| anyhow!("expected at least {} columns, found {}", n + 1, df.width()))
}

/// LOGRECNO -> GEOID for records at `summary_level`.
fn parse_geo_header(bytes: &[u8], summary_level: &str) -> anyhow::Result<DataFrame> {
    let raw = common::read_pipe_delimited_bytes(bytes).context("[download::pl94171] geo header")?;

    let sumlev = nth(&raw, GEO_SUMLEV)?.str()?;
    let logrecno = nth(&raw, GEO_LOGRECNO)?.str()?;
    let geoid = nth(&raw, GEO_GEOID)?.str()?;

    let (mut recnos, mut geoids) = (Vec::new(), Vec::new());
    for ((level, recno), id) in sumlev.into_iter().zip(logrecno.into_iter()).zip(geoid.into_iter()) {
        if level != Some(summary_level) {
            continue;
        }
        let (Some(recno), Some(id)) = (recno, id) else { continue };
        // "7500000US060014001001000" -> "060014001001000"
        let id = id.split_once("US").map_or(id, |(_, rest)| rest);
        recnos.push(recno.to_string());
        geoids.push(id.to_string());
    }

    Ok(DataFrame::new(vec![
        Column::new("LOGRECNO".into(), recnos),
        Column::new("GEO_ID".into(), geoids),
    ])?)
}

/// LOGRECNO plus the named tables of one segment, counts as Int64.
fn parse_segment(bytes: &[u8], tables: &[(&str, usize, usize)]) -> anyhow::Result<DataFrame> {
    let raw = common::read_pipe_delimited_bytes(bytes).context("[download::pl94171] segment")?;

    let mut columns = vec![nth(&raw, SEG_LOGRECNO)?.clone().with_name("LOGRECNO".into())];
    for &(table, first, count) in tables {
        let range: Range<usize> = first..first + count;
        for (i, idx) in range.enumerate() {
            let name = format!("{table}_{:03}N", i + 1);
            columns.push(nth(&raw, idx)?.cast(&DataType::Int64)?.with_name(name.into()));
        }
    }
    Ok(DataFrame::new(columns)?)
}

/// Parse a state archive into `GEO_ID` plus every P1-P4 and H1 count at
/// `summary_level`.
pub fn parse_pl94171_zip(zip_path: &Path, summary_level: &str) -> anyhow::Result<DataFrame> {
    let geo = parse_geo_header(&common::read_zip_member(zip_path, "geo2020.pl")?, summary_level)?;
    let seg1 = parse_segment(&common::read_zip_member(zip_path, "000012020.pl")?, SEGMENT1_TABLES)?;
    let seg2 = parse_segment(&common::read_zip_member(zip_path, "000022020.pl")?, SEGMENT2_TABLES)?;

    let df = geo.lazy()
        .inner_join(seg1.lazy(), col("LOGRECNO"), col("LOGRECNO"))
        .inner_join(seg2.lazy(), col("LOGRECNO"), col("LOGRECNO"))
        .select([all().exclude_cols(["LOGRECNO"]).as_expr()])
        .collect()
        .with_context(|| format!("[download::pl94171] Failed to join segments of {}", zip_path.display()))?;

    tracing::debug!(rows = df.height(), columns = df.width(), "parsed PL 94-171 archive");
    Ok(df)
}

/// Download a state's archive and write block-level counts to `dest`.
pub(crate) async fn download_pl94171(
    transport: &dyn Transport,
    retry: &RetryPolicy,
    state_fips: &str,
    temp_dir: &Path,
    dest: &Path,
) -> Result<Fetched> {
    let url = pl94171_url(state_fips)?;
    let zip_path = temp_dir.join(format!("pl94171_{state_fips}.zip"));

    tracing::info!(url = %url, state = state_fips, "Downloading PL 94-171 data");
    retry.download(transport, &url, &zip_path).await?;

    let dest_path = dest.to_path_buf();
    tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
        let mut df = parse_pl94171_zip(&zip_path, BLOCK_SUMMARY_LEVEL)?;
        common::write_to_parquet(&mut df, &dest_path)?;
        common::remove_path(&zip_path)
    })
    .await
    .map_err(|err| Error::Data(format!("PL 94-171 parse task failed: {err}")))??;

    Ok(Fetched { path: dest.to_path_buf(), source_url: url })
}
