mod cli;
mod config;
mod engine;
mod merge;
mod report;
mod sarif;

use anyhow::Result;
use clap::Parser;
use clap::error::ErrorKind;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use engine::Merger;

fn main() {
    // The contract is exit 0 or 1 only, so usage errors map to 1 instead of
    // clap's default 2. Help and version requests still exit 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            std::process::exit(0);
        }
        Err(err) => {
            let _ = err.print();
            std::process::exit(1);
        }
    };

    // Initialize logging. Everything diagnostic goes to stderr; only the
    // merged document lands at the output path.
    let filter = if cli.verbose {
        EnvFilter::new("sarif_merge=debug")
    } else if cli.quiet {
        EnvFilter::new("sarif_merge=error")
    } else {
        EnvFilter::new("sarif_merge=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    if let Err(err) = run(&cli) {
        tracing::error!("{err:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    info!("sarif-merge v{}", env!("CARGO_PKG_VERSION"));

    let merger = Merger::new(cli);
    let merge_report = merger.run()?;

    if !cli.quiet {
        report::render(&merge_report);
    }

    Ok(())
}
