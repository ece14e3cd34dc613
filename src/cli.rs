use std::path::PathBuf;

use clap::Parser;

/// sarif-merge — combine SARIF scan outputs into one deduplicated file
///
/// Reads every SARIF file in a directory, deduplicates findings and rule
/// definitions, and writes a single combined document. Prefers the SARIF
/// Multitool when it is installed and responsive; falls back to the built-in
/// merge otherwise.
#[derive(Parser, Debug)]
#[command(
    name = "sarif-merge",
    version,
    about = "Combine SARIF scan outputs into one deduplicated file"
)]
pub struct Cli {
    /// Directory containing the raw SARIF files (not searched recursively)
    pub input_dir: PathBuf,

    /// Path of the merged output file (parent directories are created)
    pub output: PathBuf,

    /// Filename glob for input selection (default "*.sarif")
    #[arg(long)]
    pub pattern: Option<String>,

    /// Skip the external helper probe and always use the built-in merge
    #[arg(long)]
    pub no_external: bool,

    /// Override the external helper program (default: npx)
    #[arg(long, value_name = "CMD")]
    pub external_cmd: Option<String>,

    /// Enable verbose output (debug level)
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}
