//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Invoice bot - turn invoice photos and documents into structured data.
#[derive(Debug, Parser)]
#[command(name = "invoice-bot")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// TOML file with [extractor] and [supervisor] tables
    #[arg(short, long, global = true, env = "INTAKE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the Telegram bot (default)
    Run,

    /// Process one local file and print the result as JSON
    Process(ProcessArgs),
}

/// Arguments for the process command.
#[derive(Debug, Parser)]
pub struct ProcessArgs {
    /// File to process
    pub file: PathBuf,

    /// Public URL of the same file, needed for OCR of images and PDFs
    #[arg(long)]
    pub remote_ref: Option<String>,

    /// Also write the parsed invoice as a spreadsheet
    #[arg(long, value_name = "OUT")]
    pub xlsx: Option<PathBuf>,
}
