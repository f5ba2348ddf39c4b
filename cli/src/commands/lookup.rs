use anyhow::Result;

use crate::cli::{Cli, LookupArgs};
use crate::commands::{build_lookup, print_json};

pub async fn run(cli: &Cli, args: &LookupArgs) -> Result<()> {
    let lookup = build_lookup(cli, &args.vars)?;
    let result = lookup.geocode(&args.address, None).await?;
    print_json(&result)
}
