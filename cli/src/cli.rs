use std::path::PathBuf;

use census_lookup::GeoLevel;

/// Offline census geocoding CLI
#[derive(clap::Parser, Debug)]
#[command(name = "census-lookup", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Data cache directory, defaults to ~/.census-lookup
    #[arg(long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub data_dir: Option<PathBuf>,

    /// JSON config file
    #[arg(long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Fail instead of downloading missing data
    #[arg(long, global = true)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Geocode one address and print the result as JSON
    Lookup(LookupArgs),

    /// Resolve a latitude/longitude pair within a state
    Coords(CoordsArgs),

    /// Geocode a CSV of addresses into an output CSV
    Batch(BatchArgs),

    /// Fetch data for one or more states ahead of time
    Download(DownloadArgs),

    /// Remove cached data for a state, or everything
    Clear(ClearArgs),

    /// Show cached states and disk usage
    Status,

    /// List available census variables and groups
    Variables(VariablesArgs),
}

/// Variable selection shared by lookup commands.
#[derive(clap::Args, Debug, Default)]
pub struct VariableArgs {
    /// Geographic level of the reported GEOID and values
    #[arg(short, long)]
    pub level: Option<GeoLevel>,

    /// PL 94-171 variable codes, e.g. P1_001N
    #[arg(long = "variables", value_delimiter = ',')]
    pub variables: Vec<String>,

    /// PL 94-171 variable groups, e.g. race_simple
    #[arg(long = "group", value_delimiter = ',')]
    pub groups: Vec<String>,

    /// ACS 5-year variable codes, e.g. B19013_001E
    #[arg(long = "acs", value_delimiter = ',')]
    pub acs_variables: Vec<String>,

    /// ACS variable groups, e.g. income
    #[arg(long = "acs-group", value_delimiter = ',')]
    pub acs_groups: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct LookupArgs {
    /// Full address, e.g. "1600 Pennsylvania Ave NW, Washington, DC 20500"
    pub address: String,

    #[command(flatten)]
    pub vars: VariableArgs,
}

#[derive(clap::Args, Debug)]
#[command(allow_negative_numbers = true)]
pub struct CoordsArgs {
    pub lat: f64,

    pub lon: f64,

    /// State to load before resolving (FIPS, abbreviation or name)
    #[arg(short, long)]
    pub state: String,

    #[command(flatten)]
    pub vars: VariableArgs,
}

#[derive(clap::Args, Debug)]
pub struct BatchArgs {
    /// Input CSV with an address column
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub input: PathBuf,

    /// Output CSV
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub output: PathBuf,

    /// Name of the address column
    #[arg(short, long, default_value = "address")]
    pub address_column: String,

    #[command(flatten)]
    pub vars: VariableArgs,
}

#[derive(clap::Args, Debug)]
pub struct DownloadArgs {
    /// States as FIPS codes, abbreviations or names
    #[arg(required = true)]
    pub states: Vec<String>,

    /// Also fetch the default ACS tract estimates
    #[arg(long)]
    pub acs: bool,
}

#[derive(clap::Args, Debug)]
pub struct ClearArgs {
    /// State to clear; everything when omitted
    pub state: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct VariablesArgs {
    /// List ACS variables instead of PL 94-171
    #[arg(long)]
    pub acs: bool,
}
