mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::{batch, clear, coords, download, lookup, status, variables};

pub fn run() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    census_lookup::init_logging(cli.verbose);

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(async {
        match &cli.command {
            Commands::Lookup(args) => lookup::run(&cli, args).await,
            Commands::Coords(args) => coords::run(&cli, args).await,
            Commands::Batch(args) => batch::run(&cli, args).await,
            Commands::Download(args) => download::run(&cli, args).await,
            Commands::Clear(args) => clear::run(&cli, args),
            Commands::Status => status::run(&cli),
            Commands::Variables(args) => variables::run(args),
        }
    })
}

fn main() -> anyhow::Result<()> { run() }
