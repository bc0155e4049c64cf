//! Output formatting for human and JSON modes
//!
//! This module provides structured output that can be rendered either as
//! human-readable text or machine-parseable JSON.

use std::path::PathBuf;

use colored::Colorize as _;
use serde::Serialize;

/// Output mode for the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output (machine-readable)
    Json,
}

/// Result of `init`
#[derive(Debug, Serialize)]
pub struct InitResult {
    /// Config file written (or kept)
    pub config_path: PathBuf,
    /// Whether the config file was written by this run
    pub config_written: bool,
    /// Datastore location
    pub database_path: PathBuf,
    /// Webhook payload directory
    pub webhook_data_directory: PathBuf,
}

/// Result of `recalculate`
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RecalculateResult {
    /// Commits recomputed from explicit ids
    pub commits: usize,
    /// Queued jobs drained
    pub jobs: usize,
}

/// Generic operation result for simple commands
#[derive(Debug, Serialize)]
pub struct OperationResult {
    /// Whether the operation succeeded
    pub success: bool,
    /// Human-readable message
    pub message: String,
}

fn print_json<T: Serialize>(value: &T) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

impl InitResult {
    /// Render the result based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => self.render_human(),
            OutputMode::Json => print_json(self),
        }
    }

    fn render_human(&self) {
        if self.config_written {
            println!("{} {}", "Wrote".green(), self.config_path.display());
        } else {
            println!("Keeping existing {}", self.config_path.display());
        }
        println!("  database: {}", self.database_path.display());
        println!("  webhooks: {}", self.webhook_data_directory.display());
        println!("\nRun 'codeattest serve' to start the service");
    }
}

impl RecalculateResult {
    /// Render the result based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => {
                if self.commits == 0 && self.jobs == 0 {
                    println!("Nothing to recalculate.");
                } else {
                    println!(
                        "Recalculated {} commit(s), drained {} job(s)",
                        self.commits, self.jobs
                    );
                }
            },
            OutputMode::Json => print_json(self),
        }
    }
}

impl OperationResult {
    /// Render the result based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => println!("{}", self.message),
            OutputMode::Json => print_json(self),
        }
    }
}
