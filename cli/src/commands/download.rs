use anyhow::Result;
use census_lookup::{CensusLookup, census::DEFAULT_ACS_VARIABLES, fips};

use crate::cli::{Cli, DownloadArgs};
use crate::commands::load_config;

pub async fn run(cli: &Cli, args: &DownloadArgs) -> Result<()> {
    let mut config = load_config(cli)?;
    config.auto_download = true;
    let lookup = CensusLookup::new(config)?;
    let acs: Vec<String> = DEFAULT_ACS_VARIABLES.iter().map(|v| v.to_string()).collect();

    for state in &args.states {
        let state_fips = fips::normalize_state(state)?;
        let data = lookup.data().ensure_state_data(state_fips).await?;
        if args.acs {
            lookup.data().ensure_acs_data(state_fips, &acs).await?;
        }
        eprintln!(
            "[download] {} ({}): {} county address files",
            fips::state_name(state_fips).unwrap_or(state_fips),
            state_fips,
            data.address_features.len(),
        );
    }

    let stats = lookup.data().download_stats();
    tracing::info!(requests = stats.total_requests, coalesced = stats.coalesced_requests, "download finished");
    Ok(())
}
