use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::sarif::{self, DedupKey, Driver, Run, SarifLog, Tool};

/// Outcome of the built-in merge: the combined log plus the inputs that were
/// skipped because they failed to parse.
#[derive(Debug)]
pub struct BuiltinMerge {
    pub log: SarifLog,
    pub skipped: Vec<PathBuf>,
}

/// Merge `files` (already sorted) into a single deduplicated SARIF log.
///
/// - The first tool descriptor seen becomes the merged run's tool.
/// - Rule definitions are first-wins by id; rules without an id are dropped.
/// - Findings are deduplicated by (ruleId, uri, startLine); the first
///   occurrence wins and input order is preserved.
/// - Files that fail to parse are skipped and recorded, never fatal.
pub fn merge(files: &[PathBuf]) -> BuiltinMerge {
    let mut seen_rules: HashSet<String> = HashSet::new();
    let mut rules: Vec<Value> = Vec::new();
    let mut seen_results: HashSet<DedupKey> = HashSet::new();
    let mut results: Vec<Value> = Vec::new();
    let mut tool: Option<Tool> = None;
    let mut skipped: Vec<PathBuf> = Vec::new();

    for file in files {
        let log = match read_log(file) {
            Ok(log) => log,
            Err(err) => {
                warn!("Failed to parse {}: {:#}", file.display(), err);
                skipped.push(file.clone());
                continue;
            }
        };
        debug!("{}: {} runs", file.display(), log.runs.len());

        for run in log.runs {
            if let Some(run_tool) = run.tool {
                if let Some(driver) = &run_tool.driver {
                    for rule in &driver.rules {
                        if let Some(id) = sarif::rule_id(rule) {
                            if seen_rules.insert(id.to_string()) {
                                rules.push(rule.clone());
                            }
                        }
                    }
                }
                if tool.is_none() {
                    tool = Some(run_tool);
                }
            }

            for result in run.results {
                let key = DedupKey::of(&result);
                if seen_results.insert(key) {
                    results.push(result);
                }
            }
        }
    }

    let mut log = SarifLog::empty_merged();
    if !results.is_empty() {
        let mut tool = tool.unwrap_or_else(Tool::placeholder);
        let driver = tool.driver.get_or_insert_with(Driver::default);
        driver.rules = rules;
        log.runs.push(Run {
            tool: Some(tool),
            results,
            extra: Map::new(),
        });
    }

    BuiltinMerge { log, skipped }
}

fn read_log(path: &Path) -> anyhow::Result<SarifLog> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
