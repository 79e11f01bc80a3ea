//! Command-line interface for seoscan
//!
//! Parses arguments with clap, loads the merged configuration, installs the
//! logger once and dispatches to the command implementations.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};

pub mod commands;
mod output;

pub use output::Output;

use crate::config::SeoscanConfig;
use crate::logging::{self, LoggingConfig};
use commands::CommandContext;

/// Parallel keyword extraction and page analysis for SEO audits
#[derive(Parser)]
#[command(
    name = "seoscan",
    author,
    version,
    about,
    long_about = "seoscan runs keyword extraction over text files and fetches web pages \
                  in parallel, with a bounded number of worker threads derived from the \
                  available processing units."
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (can be repeated); -v also writes seoscan.log
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Use custom configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<String>,

    /// Maximum number of concurrent workers (default: 75% of processing units)
    #[arg(
        short = 'j',
        long,
        value_name = "N",
        global = true,
        allow_negative_numbers = true
    )]
    pub workers: Option<i64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rank the most frequent keywords of each text
    Keywords(commands::keywords::KeywordsArgs),
    /// Fetch pages in parallel and report per-URL status
    Pages(commands::pages::PagesArgs),
    /// Show the worker count that would be used on this machine
    Workers,
    /// Configuration management
    Config(commands::config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let Some(command) = self.command else {
            // Show help when no command is provided
            Cli::command().print_help()?;
            return Ok(());
        };

        let config = SeoscanConfig::load(self.config.as_deref())?;
        setup_logging(self.verbose, self.quiet, &config)?;
        tracing::debug!("Loaded configuration: {:?}", config);

        let ctx = CommandContext {
            output: Output::new(self.verbose > 0, self.quiet),
            format: self.format,
            workers: self.workers,
            config,
        };

        match command {
            Commands::Keywords(args) => commands::keywords::execute(args, &ctx),
            Commands::Pages(args) => commands::pages::execute(args, &ctx),
            Commands::Workers => commands::workers::execute(&ctx),
            Commands::Config(args) => commands::config::execute(args, &ctx),
        }
    }
}

fn setup_logging(verbose: u8, quiet: bool, config: &SeoscanConfig) -> Result<()> {
    let cfg = LoggingConfig::from_verbosity(verbose, quiet, &config.logging.dir)
        .with_format(config.logging.format);
    logging::init(&cfg).context("Failed to set up logging")
}
