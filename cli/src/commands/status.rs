use anyhow::Result;
use census_lookup::{CensusLookup, catalog::DatasetKind};
use serde_json::json;

use crate::cli::Cli;
use crate::commands::{load_config, print_json};

pub fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let lookup = CensusLookup::new(config.clone())?;
    let data = lookup.data();

    let states: serde_json::Map<String, serde_json::Value> = DatasetKind::ALL.iter()
        .map(|&kind| (kind.to_str().to_string(), json!(data.available_states(kind))))
        .collect();

    print_json(&json!({
        "data_dir": data.data_dir(),
        "auto_download": config.auto_download,
        "states": states,
        "disk_usage": data.disk_usage(),
    }))
}
