use anyhow::Result;
use clap::{Args, Subcommand};

use super::CommandContext;
use crate::cli::OutputFormat;
use crate::config::ConfigFormat;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Display current merged configuration (TOML, or JSON with --format json)
    Show,
    /// Validate the merged configuration
    Validate,
}

pub fn execute(args: ConfigArgs, ctx: &CommandContext) -> Result<()> {
    match args.command {
        ConfigCommand::Show => {
            let format = match ctx.format {
                OutputFormat::Text => ConfigFormat::Toml,
                OutputFormat::Json => ConfigFormat::Json,
            };
            println!("{}", ctx.config.export(format)?);
        }
        ConfigCommand::Validate => {
            ctx.config.validate()?;
            ctx.output.success("Configuration is valid!");
        }
    }

    Ok(())
}
