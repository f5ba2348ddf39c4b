use anyhow::Result;
use census_lookup::CensusLookup;

use crate::cli::{Cli, ClearArgs};
use crate::commands::load_config;

pub fn run(cli: &Cli, args: &ClearArgs) -> Result<()> {
    let config = load_config(cli)?;
    let lookup = CensusLookup::new(config)?;
    let data = lookup.data();
    let removed = data.clear_cache(args.state.as_deref())?;
    match &args.state {
        Some(state) => eprintln!("[clear] removed {removed} datasets for {state}"),
        None => eprintln!("[clear] removed {removed} datasets from {}", data.data_dir().display()),
    }
    Ok(())
}
