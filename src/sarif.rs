use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Version tag stamped on every merged document.
pub const SARIF_VERSION: &str = "2.1.0";

/// Schema reference stamped on every merged document.
pub const SARIF_SCHEMA: &str = "https://json.schemastore.org/sarif-2.1.0.json";

/// Top-level SARIF log.
///
/// Only the layers the merge actually touches are typed; everything else rides
/// in the flattened `extra` maps so unrecognized fields survive a round trip
/// untouched. Findings and rule definitions stay as raw JSON values for the
/// same reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SarifLog {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,

    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(default)]
    pub runs: Vec<Run>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SarifLog {
    /// Output shell with the fixed version and schema tags and no runs yet.
    pub fn empty_merged() -> Self {
        SarifLog {
            version: SARIF_VERSION.to_string(),
            schema: Some(SARIF_SCHEMA.to_string()),
            runs: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Total findings across all runs.
    pub fn result_count(&self) -> usize {
        self.runs.iter().map(|r| r.results.len()).sum()
    }
}

/// One scan's contribution: a tool descriptor plus its findings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<Tool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tool {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<Driver>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Tool {
    /// Placeholder descriptor used when no input run carried a tool at all.
    pub fn placeholder() -> Self {
        Tool {
            driver: Some(Driver {
                name: Some(env!("CARGO_PKG_NAME").to_string()),
                rules: Vec::new(),
                extra: Map::new(),
            }),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Driver {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub rules: Vec<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Identity of a finding for deduplication: exact match on the rule id, the
/// first location's file URI, and its starting line. Absent pieces contribute
/// the empty string / line 0 and still participate in equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub rule_id: String,
    pub uri: String,
    pub start_line: u64,
}

impl DedupKey {
    /// Extract the key from a raw SARIF result, using the first listed
    /// location only.
    pub fn of(result: &Value) -> Self {
        let rule_id = result
            .get("ruleId")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();

        let physical = result
            .get("locations")
            .and_then(Value::as_array)
            .and_then(|locs| locs.first())
            .and_then(|loc| loc.get("physicalLocation"));

        let uri = physical
            .and_then(|p| p.get("artifactLocation"))
            .and_then(|a| a.get("uri"))
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();

        let start_line = physical
            .and_then(|p| p.get("region"))
            .and_then(|r| r.get("startLine"))
            .and_then(Value::as_u64)
            .unwrap_or(0);

        DedupKey {
            rule_id,
            uri,
            start_line,
        }
    }
}

/// Identifier of a rule definition, if it has a usable one. Rules with a
/// missing or empty `id` are never retained.
pub fn rule_id(rule: &Value) -> Option<&str> {
    match rule.get("id").and_then(Value::as_str) {
        Some("") | None => None,
        Some(id) => Some(id),
    }
}
