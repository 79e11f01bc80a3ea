use anyhow::Result;
use clap::Parser;

use seoscan::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.run()
}
