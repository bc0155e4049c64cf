//! CLI definitions and entry point

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::commands;
use codeattest::config::RecalculationMode;
use codeattest::output::OutputMode;

/// codeattest - Code attestation and webhook ingestion service
#[derive(Parser, Debug)]
#[command(
    name = "codeattest",
    version,
    about = "Code attestation and webhook ingestion service",
    long_about = "Records human attestations of AI/human code labels, broadcasts them to \
                  every chunk sharing the same content hash, and ingests provider webhooks.\n\n\
                  Configuration is read from codeattest.toml in the working directory."
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output in JSON format (machine-readable)
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file (default: ./codeattest.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default config file and create the datastore
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,

        /// Recalculation mode to write (immediate or deferred)
        #[arg(long, value_parser = parse_mode)]
        mode: Option<RecalculationMode>,
    },

    /// Run the HTTP service
    Serve {
        /// Interface to bind (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Recompute composition now
    Recalculate {
        /// Commit ids to recompute; without any, drain queued jobs
        #[arg(long = "commit")]
        commits: Vec<i64>,
    },

    /// Show version
    Version,
}

fn parse_mode(raw: &str) -> Result<RecalculationMode, String> {
    match raw.to_lowercase().as_str() {
        "immediate" => Ok(RecalculationMode::Immediate),
        "deferred" => Ok(RecalculationMode::Deferred),
        _ => Err(format!("Invalid mode: {raw}. Use: immediate, deferred")),
    }
}

/// Run the CLI
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };
    let config_path = cli.config.as_deref();

    match cli.command {
        Some(Command::Init { force, mode }) => {
            commands::init(config_path, force, mode, output_mode)
        },
        Some(Command::Serve { host, port }) => commands::serve(config_path, host, port),
        Some(Command::Recalculate { commits }) => {
            commands::recalculate(config_path, &commits, output_mode)
        },
        Some(Command::Version) => {
            if output_mode == OutputMode::Json {
                println!(
                    "{}",
                    serde_json::json!({
                        "version": codeattest::VERSION
                    })
                );
            } else {
                println!("codeattest v{}", codeattest::VERSION);
            }
            Ok(())
        },
        None => {
            if output_mode == OutputMode::Json {
                println!(
                    "{}",
                    serde_json::json!({
                        "version": codeattest::VERSION,
                        "hint": "Use --help for usage"
                    })
                );
            } else {
                println!("codeattest v{}", codeattest::VERSION);
                println!("\nRun 'codeattest --help' for usage");
                println!("Run 'codeattest init' to get started");
            }
            Ok(())
        },
    }
}
