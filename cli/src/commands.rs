pub mod batch;
pub mod clear;
pub mod coords;
pub mod download;
pub mod lookup;
pub mod status;
pub mod variables;

use anyhow::Result;
use census_lookup::{CensusLookup, LookupConfig};

use crate::cli::{Cli, VariableArgs};

/// Config from the file, environment and global flags.
pub fn load_config(cli: &Cli) -> Result<LookupConfig> {
    let mut config = LookupConfig::load(cli.config.as_deref())?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if cli.offline {
        config.auto_download = false;
    }
    Ok(config)
}

/// Lookup with the variable selection from `vars` applied.
pub fn build_lookup(cli: &Cli, vars: &VariableArgs) -> Result<CensusLookup> {
    let mut config = load_config(cli)?;
    if let Some(level) = vars.level {
        config.geo_level = level;
    }
    config.variables.extend(vars.variables.iter().cloned());
    config.acs_variables.extend(vars.acs_variables.iter().cloned());

    let mut lookup = CensusLookup::new(config)?;
    for group in &vars.groups {
        lookup.add_variable_group(group)?;
    }
    for group in &vars.acs_groups {
        lookup.add_acs_variable_group(group)?;
    }
    Ok(lookup)
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
