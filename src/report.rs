use owo_colors::OwoColorize;

use crate::engine::{MergeReport, Strategy};

/// Render a short merge summary to stderr with colors. The output file is the
/// only thing this tool ever writes outside the error stream.
pub fn render(report: &MergeReport) {
    let strategy = match report.strategy {
        Strategy::External => "external helper",
        Strategy::Builtin => "built-in merge",
    };
    let merged_ok = report.files_found - report.skipped.len();

    eprintln!();
    eprintln!(
        "  {}  Merged {} files via {}",
        "✔".green().bold(),
        merged_ok.to_string().bold(),
        strategy,
    );

    if !report.skipped.is_empty() {
        eprintln!(
            "  {}  {} files skipped (parse failures):",
            "⚠".yellow().bold(),
            report.skipped.len().to_string().yellow(),
        );
        for path in &report.skipped {
            eprintln!("       {}", path.display().dimmed());
        }
    }

    eprintln!(
        "  {} findings → {}",
        report.findings.to_string().bold(),
        report.output.display().dimmed(),
    );
    eprintln!();
}
