use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, warn};
use wait_timeout::ChildExt;

use crate::config::ExternalConfig;
use crate::sarif::SarifLog;

/// Outcome of attempting the external merge helper.
#[derive(Debug)]
pub enum ExternalMerge {
    /// Helper produced a parseable merged log; it is taken as authoritative.
    Merged(SarifLog),
    /// Capability probe failed; fall through silently to the built-in merge.
    Unavailable,
    /// Probe succeeded but the merge invocation failed; warn and fall back.
    Failed(String),
}

/// Probe the helper, and if it answers, hand it the full input list. All
/// three outcomes are surfaced so the caller can match them exhaustively;
/// nothing in here is fatal.
pub fn try_external(cfg: &ExternalConfig, files: &[PathBuf]) -> ExternalMerge {
    if !probe(cfg) {
        return ExternalMerge::Unavailable;
    }
    match run_merge(cfg, files) {
        Ok(log) => ExternalMerge::Merged(log),
        Err(err) => ExternalMerge::Failed(format!("{err:#}")),
    }
}

/// Check the helper answers a version query within the probe timeout.
/// Absence, spawn errors, timeouts, and non-zero exits all mean "unusable".
fn probe(cfg: &ExternalConfig) -> bool {
    let mut cmd = Command::new(&cfg.command);
    cmd.args(&cfg.args).arg("--version");

    match run_helper(&mut cmd, cfg.probe_timeout()) {
        Ok(out) if out.exit_code == 0 => true,
        Ok(out) => {
            debug!(
                "{} version check exited with code {}",
                cfg.command, out.exit_code
            );
            false
        }
        Err(err) => {
            debug!("{} is not usable: {:#}", cfg.command, err);
            false
        }
    }
}

fn run_merge(cfg: &ExternalConfig, files: &[PathBuf]) -> Result<SarifLog> {
    let tmp = TempPath::new();

    let mut cmd = Command::new(&cfg.command);
    cmd.args(&cfg.args)
        .arg("merge")
        .args(files)
        .arg("--output-file")
        .arg(tmp.path())
        .arg("--force");

    let out = run_helper(&mut cmd, cfg.merge_timeout())?;
    if out.exit_code != 0 {
        return Err(anyhow!(
            "helper exited with code {}: {}",
            out.exit_code,
            out.stderr.trim()
        ));
    }

    let content =
        std::fs::read_to_string(tmp.path()).context("failed to read helper output")?;
    let log: SarifLog =
        serde_json::from_str(&content).context("helper produced invalid SARIF")?;
    Ok(log)
}

struct HelperOutput {
    exit_code: i32,
    stderr: String,
}

/// Spawn the helper and wait for it under `timeout`. On expiry the child is
/// killed and reaped before the error is returned.
fn run_helper(cmd: &mut Command, timeout: Duration) -> Result<HelperOutput> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn().context("failed to spawn helper")?;

    // Drain stderr on its own thread while the child runs. A helper that
    // writes more than the pipe buffer would otherwise block on the full
    // pipe and never exit, turning a healthy merge into a timeout.
    let stderr_pipe = child.stderr.take();
    let drain = std::thread::spawn(move || {
        let mut buf = String::new();
        if let Some(mut err) = stderr_pipe {
            let _ = err.read_to_string(&mut buf);
        }
        buf
    });

    let status = match child
        .wait_timeout(timeout)
        .context("failed to wait for helper")?
    {
        Some(status) => status,
        None => {
            let _ = child.kill();
            let _ = child.wait();
            warn!("helper timed out after {:?}", timeout);
            return Err(anyhow!("timed out after {timeout:?}"));
        }
    };

    let stderr = drain.join().unwrap_or_default();

    Ok(HelperOutput {
        exit_code: status.code().unwrap_or(-1),
        stderr,
    })
}

/// Temp file for the helper's output, removed on drop so every exit path out
/// of the merge (success, failure, panic) cleans up after itself.
struct TempPath(PathBuf);

impl TempPath {
    fn new() -> Self {
        static SEQ: AtomicU64 = AtomicU64::new(0);
        let seq = SEQ.fetch_add(1, Ordering::Relaxed);
        let name = format!("sarif-merge-multitool-{}-{seq}.sarif", std::process::id());
        TempPath(std::env::temp_dir().join(name))
    }

    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for TempPath {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(command: &str, args: &[&str]) -> ExternalConfig {
        ExternalConfig {
            enabled: true,
            command: command.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            probe_timeout_secs: 5,
            merge_timeout_secs: 5,
        }
    }

    #[test]
    fn missing_binary_is_unavailable() {
        let cfg = config_for("sarif-merge-test-no-such-binary", &[]);
        let outcome = try_external(&cfg, &[]);
        assert!(matches!(outcome, ExternalMerge::Unavailable));
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_probe_exit_is_unavailable() {
        // `sh -c 'exit 3'` ignores the appended --version and exits 3
        let cfg = config_for("sh", &["-c", "exit 3"]);
        let outcome = try_external(&cfg, &[]);
        assert!(matches!(outcome, ExternalMerge::Unavailable));
    }

    #[cfg(unix)]
    #[test]
    fn probe_ok_but_no_output_is_failed() {
        // Probe passes (exit 0) but the merge writes no output file
        let cfg = config_for("sh", &["-c", "exit 0"]);
        let outcome = try_external(&cfg, &[PathBuf::from("a.sarif")]);
        match outcome {
            ExternalMerge::Failed(reason) => {
                assert!(reason.contains("failed to read helper output"), "{reason}");
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_merge_exit_is_failed() {
        // $0 is the first appended arg: "--version" for the probe (exit 0),
        // "merge" for the actual invocation (exit 7)
        let cfg = config_for("sh", &["-c", r#"if [ "$0" = "merge" ]; then exit 7; fi"#]);
        let outcome = try_external(&cfg, &[PathBuf::from("a.sarif")]);
        match outcome {
            ExternalMerge::Failed(reason) => assert!(reason.contains("code 7"), "{reason}"),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn invalid_helper_output_is_failed() {
        // Helper "succeeds" but writes junk to the --output-file argument.
        // The output path is the argument after --output-file; for this stub
        // it is easiest to scan for it in the arg list.
        let script = r#"
            out=""
            prev=""
            for a in "$@"; do
                if [ "$prev" = "--output-file" ]; then out="$a"; fi
                prev="$a"
            done
            if [ "$0" = "merge" ] && [ -n "$out" ]; then echo "not sarif" > "$out"; fi
            exit 0
        "#;
        let cfg = config_for("sh", &["-c", script]);
        let outcome = try_external(&cfg, &[PathBuf::from("a.sarif")]);
        match outcome {
            ExternalMerge::Failed(reason) => {
                assert!(reason.contains("invalid SARIF"), "{reason}");
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn chatty_helper_stderr_does_not_stall_the_merge() {
        // The helper floods stderr with more than a pipe buffer before
        // producing valid output; it must still finish within the timeout
        // and be reported as Merged, not killed on a full pipe.
        let script = r#"
            out=""
            prev=""
            for a in "$@"; do
                if [ "$prev" = "--output-file" ]; then out="$a"; fi
                prev="$a"
            done
            head -c 1048576 /dev/zero >&2
            if [ "$0" = "merge" ] && [ -n "$out" ]; then
                printf '{"version":"2.1.0","runs":[{"results":[{"ruleId":"r1"}]}]}' > "$out"
            fi
            exit 0
        "#;
        let cfg = config_for("sh", &["-c", script]);
        let outcome = try_external(&cfg, &[PathBuf::from("a.sarif")]);
        match outcome {
            ExternalMerge::Merged(log) => assert_eq!(log.result_count(), 1),
            other => panic!("expected Merged, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn valid_helper_output_is_merged() {
        let script = r#"
            out=""
            prev=""
            for a in "$@"; do
                if [ "$prev" = "--output-file" ]; then out="$a"; fi
                prev="$a"
            done
            if [ "$0" = "merge" ] && [ -n "$out" ]; then
                printf '{"version":"2.1.0","runs":[{"results":[{"ruleId":"r1"}]}]}' > "$out"
            fi
            exit 0
        "#;
        let cfg = config_for("sh", &["-c", script]);
        let outcome = try_external(&cfg, &[PathBuf::from("a.sarif")]);
        match outcome {
            ExternalMerge::Merged(log) => assert_eq!(log.result_count(), 1),
            other => panic!("expected Merged, got {other:?}"),
        }
    }
}
