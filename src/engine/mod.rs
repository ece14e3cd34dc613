pub mod collector;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::Cli;
use crate::config::{ExternalConfig, MergeConfig};
use crate::merge::builtin;
use crate::merge::multitool::{self, ExternalMerge};
use crate::sarif::SarifLog;

/// Which merge path produced the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    External,
    Builtin,
}

/// Summary of one merge invocation, consumed by the terminal report.
#[derive(Debug)]
pub struct MergeReport {
    pub files_found: usize,
    pub skipped: Vec<PathBuf>,
    pub findings: usize,
    pub strategy: Strategy,
    pub output: PathBuf,
}

/// The merge orchestrator. Collects inputs, picks a strategy, and writes the
/// combined document exactly once.
pub struct Merger {
    input_dir: PathBuf,
    output: PathBuf,
    pattern: String,
    external: ExternalConfig,
    use_external: bool,
}

impl Merger {
    pub fn new(cli: &Cli) -> Self {
        // Optional config next to (or above) the input directory
        let config = MergeConfig::load(&cli.input_dir).unwrap_or_default();

        // CLI flags beat config values, which beat the built-in defaults
        let pattern = cli.pattern.clone().unwrap_or(config.inputs.pattern);
        let mut external = config.external;
        if let Some(ref cmd) = cli.external_cmd {
            external.command = cmd.clone();
        }
        let use_external = external.enabled && !cli.no_external;

        Merger {
            input_dir: cli.input_dir.clone(),
            output: cli.output.clone(),
            pattern,
            external,
            use_external,
        }
    }

    /// Run the full merge pipeline.
    pub fn run(&self) -> Result<MergeReport> {
        // Step 1: Collect inputs
        let files = collector::collect_inputs(&self.input_dir, &self.pattern)?;
        info!(
            "Found {} SARIF files to merge in {}",
            files.len(),
            self.input_dir.display()
        );

        // Step 2: External helper first, built-in as the fallback
        let mut skipped = Vec::new();
        let (log, strategy) = if self.use_external {
            match multitool::try_external(&self.external, &files) {
                ExternalMerge::Merged(log) => {
                    info!("External merge successful");
                    (log, Strategy::External)
                }
                ExternalMerge::Unavailable => {
                    info!("External helper not available, using built-in merge");
                    let merged = builtin::merge(&files);
                    skipped = merged.skipped;
                    (merged.log, Strategy::Builtin)
                }
                ExternalMerge::Failed(reason) => {
                    warn!("External merge failed, falling back to built-in: {reason}");
                    let merged = builtin::merge(&files);
                    skipped = merged.skipped;
                    (merged.log, Strategy::Builtin)
                }
            }
        } else {
            let merged = builtin::merge(&files);
            skipped = merged.skipped;
            (merged.log, Strategy::Builtin)
        };

        if !skipped.is_empty() {
            warn!(
                "{} of {} input files could not be parsed; results may be incomplete",
                skipped.len(),
                files.len()
            );
        }

        // Step 3: Write the combined document
        let findings = log.result_count();
        info!("Merged SARIF contains {findings} findings");
        self.write(&log)?;
        info!("Written to {}", self.output.display());

        Ok(MergeReport {
            files_found: files.len(),
            skipped,
            findings,
            strategy,
            output: self.output.clone(),
        })
    }

    fn write(&self, log: &SarifLog) -> Result<()> {
        if let Some(parent) = self.output.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        let json = serde_json::to_string_pretty(log)?;
        std::fs::write(&self.output, json)
            .with_context(|| format!("failed to write {}", self.output.display()))?;
        Ok(())
    }
}
