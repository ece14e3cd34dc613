use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Merge configuration (loaded from .sarif-merge.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MergeConfig {
    #[serde(default)]
    pub external: ExternalConfig,

    #[serde(default)]
    pub inputs: InputsConfig,
}

/// External merge helper settings. Defaults target the SARIF Multitool via
/// npx, the same command line CI images ship with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalConfig {
    /// Master switch for the external helper
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Helper program
    #[serde(default = "default_command")]
    pub command: String,

    /// Arguments placed before the helper's own subcommand
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Capability probe (version query) timeout, seconds
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Merge invocation timeout, seconds
    #[serde(default = "default_merge_timeout")]
    pub merge_timeout_secs: u64,
}

impl Default for ExternalConfig {
    fn default() -> Self {
        ExternalConfig {
            enabled: default_enabled(),
            command: default_command(),
            args: default_args(),
            probe_timeout_secs: default_probe_timeout(),
            merge_timeout_secs: default_merge_timeout(),
        }
    }
}

impl ExternalConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn merge_timeout(&self) -> Duration {
        Duration::from_secs(self.merge_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputsConfig {
    /// Filename glob for input selection
    #[serde(default = "default_pattern")]
    pub pattern: String,
}

impl Default for InputsConfig {
    fn default() -> Self {
        InputsConfig {
            pattern: default_pattern(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_command() -> String {
    "npx".to_string()
}

fn default_args() -> Vec<String> {
    vec![
        "--no-install".to_string(),
        "@microsoft/sarif-multitool".to_string(),
    ]
}

fn default_probe_timeout() -> u64 {
    30
}

fn default_merge_timeout() -> u64 {
    120
}

fn default_pattern() -> String {
    "*.sarif".to_string()
}

impl MergeConfig {
    /// Try to load .sarif-merge.toml from the given directory or its parents.
    /// Config is advisory: unreadable or malformed files are logged and
    /// ignored.
    pub fn load(start: &Path) -> Option<Self> {
        let config_path = find_config_file(start)?;
        debug!("Found config: {}", config_path.display());

        match std::fs::read_to_string(&config_path) {
            Ok(content) => match toml::from_str::<MergeConfig>(&content) {
                Ok(config) => {
                    info!("Loaded config from {}", config_path.display());
                    Some(config)
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}", config_path.display(), e);
                    None
                }
            },
            Err(e) => {
                debug!("Could not read {}: {}", config_path.display(), e);
                None
            }
        }
    }
}

/// Walk up from the start path to find .sarif-merge.toml
fn find_config_file(start: &Path) -> Option<std::path::PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let config = current.join(".sarif-merge.toml");
        if config.exists() {
            return Some(config);
        }
        if !current.pop() {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_stock_multitool_invocation() {
        let config = MergeConfig::default();
        assert!(config.external.enabled);
        assert_eq!(config.external.command, "npx");
        assert_eq!(
            config.external.args,
            vec!["--no-install", "@microsoft/sarif-multitool"]
        );
        assert_eq!(config.external.probe_timeout(), Duration::from_secs(30));
        assert_eq!(config.external.merge_timeout(), Duration::from_secs(120));
        assert_eq!(config.inputs.pattern, "*.sarif");
    }

    #[test]
    fn partial_toml_keeps_defaults_for_the_rest() {
        let config: MergeConfig = toml::from_str(
            r#"
            [external]
            enabled = false
            merge_timeout_secs = 300

            [inputs]
            pattern = "*.json"
            "#,
        )
        .expect("parse config");

        assert!(!config.external.enabled);
        assert_eq!(config.external.merge_timeout_secs, 300);
        // Untouched keys fall back to defaults
        assert_eq!(config.external.command, "npx");
        assert_eq!(config.external.probe_timeout_secs, 30);
        assert_eq!(config.inputs.pattern, "*.json");
    }

    #[test]
    fn load_walks_up_to_a_parent_directory() {
        let root = std::env::temp_dir().join(format!(
            "sarif-merge-config-test-{}",
            std::process::id()
        ));
        let nested = root.join("a").join("b");
        std::fs::create_dir_all(&nested).expect("create dirs");
        std::fs::write(
            root.join(".sarif-merge.toml"),
            "[inputs]\npattern = \"*.custom\"\n",
        )
        .expect("write config");

        let config = MergeConfig::load(&nested).expect("config found");
        assert_eq!(config.inputs.pattern, "*.custom");

        let _ = std::fs::remove_dir_all(&root);
    }
}
