use anyhow::{Result, ensure};

use crate::cli::{Cli, CoordsArgs};
use crate::commands::{build_lookup, print_json};

pub async fn run(cli: &Cli, args: &CoordsArgs) -> Result<()> {
    ensure!((-90.0..=90.0).contains(&args.lat), "latitude out of range: {}", args.lat);
    ensure!((-180.0..=180.0).contains(&args.lon), "longitude out of range: {}", args.lon);

    let lookup = build_lookup(cli, &args.vars)?;
    lookup.load_state(&args.state).await?;
    let result = lookup.lookup_coordinates(args.lat, args.lon, None).await?;
    print_json(&result)
}
