use std::path::{Path, PathBuf};

use globset::Glob;
use thiserror::Error;
use tracing::debug;

/// Fatal input-collection failures. Each one aborts the merge with a
/// non-zero exit and no output written.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("invalid input pattern '{pattern}': {source}")]
    BadPattern {
        pattern: String,
        source: globset::Error,
    },

    #[error("failed to read directory {}: {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("no files matching '{pattern}' in {}, nothing to merge", .dir.display())]
    NoInputs { pattern: String, dir: PathBuf },
}

/// List the input files directly inside `dir` whose file name matches
/// `pattern`, sorted lexicographically by name. Subdirectories are never
/// entered.
pub fn collect_inputs(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, CollectError> {
    if !dir.is_dir() {
        return Err(CollectError::NotADirectory(dir.to_path_buf()));
    }

    let matcher = Glob::new(pattern)
        .map_err(|source| CollectError::BadPattern {
            pattern: pattern.to_string(),
            source,
        })?
        .compile_matcher();

    let entries = std::fs::read_dir(dir).map_err(|source| CollectError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        if matcher.is_match(&name) {
            files.push(path);
        } else {
            debug!("Not matched by pattern: {}", name);
        }
    }

    files.sort();

    if files.is_empty() {
        return Err(CollectError::NoInputs {
            pattern: pattern.to_string(),
            dir: dir.to_path_buf(),
        });
    }

    Ok(files)
}
