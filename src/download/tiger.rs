//! TIGER/Line 2020 shapefile downloads.

use std::path::{Path, PathBuf};

use anyhow::Context;

use super::{RetryPolicy, Transport};
use crate::catalog::Fetched;
use crate::common;
use crate::error::{Error, Result};

const TIGER_BASE: &str = "https://www2.census.gov/geo/tiger/TIGER2020";

/// Block polygons for one state, e.g. `tl_2020_06_tabblock20.zip`.
pub fn blocks_url(state_fips: &str) -> String {
    format!("{TIGER_BASE}/TABBLOCK20/tl_2020_{state_fips}_tabblock20.zip")
}

/// Address range features for one county, e.g. `tl_2020_06001_addrfeat.zip`.
pub fn addrfeat_url(state_fips: &str, county_fips: &str) -> String {
    format!("{TIGER_BASE}/ADDRFEAT/tl_2020_{state_fips}{county_fips}_addrfeat.zip")
}

/// Download a zipped shapefile and extract it into `dest_dir`, replacing any
/// previous contents. Returns the path of the extracted `.shp`.
pub(crate) async fn download_shapefile(
    transport: &dyn Transport,
    retry: &RetryPolicy,
    url: &str,
    temp_dir: &Path,
    dest_dir: &Path,
) -> Result<Fetched> {
    let file_name = url.rsplit('/').next().unwrap_or("download.zip");
    let zip_path = temp_dir.join(file_name);

    tracing::info!(url, dest = %dest_dir.display(), "Downloading shapefile");
    retry.download(transport, url, &zip_path).await?;

    let dest = dest_dir.to_path_buf();
    let shp = tokio::task::spawn_blocking(move || extract_shapefile(&zip_path, &dest))
        .await
        .map_err(|err| Error::Data(format!("extract task failed: {err}")))??;

    Ok(Fetched { path: shp, source_url: url.to_string() })
}

/// Extract next to `dest` first, then swap into place so a reader never sees
/// a half-extracted directory.
fn extract_shapefile(zip_path: &Path, dest: &Path) -> anyhow::Result<PathBuf> {
    let staging = dest.with_extension("partial");
    common::remove_path(&staging)?;
    common::ensure_dir_exists(&staging)?;
    common::extract_zip(zip_path, &staging, true)?;

    common::remove_path(dest)?;
    std::fs::rename(&staging, dest)
        .with_context(|| format!("[download::tiger] Failed to move {} to {}", staging.display(), dest.display()))?;
    common::find_with_extension(dest, "shp")
}
