use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{DetectError, Result};
use crate::transcript::session_meta_cwd;

const ROLLOUT_PREFIX: &str = "rollout-";
const ROLLOUT_EXTENSION: &str = ".jsonl";
/// `<root>/YYYY/MM/DD/rollout-*.jsonl`
const ROLLOUT_DEPTH: usize = 4;

/// Finds transcripts under `sessions_root` that were modified within
/// `max_age` and belong to `repo_root`.
///
/// Paths come back sorted by file name within the date buckets, which is
/// not necessarily the order the sessions ran in. A missing root yields an
/// empty list; a root that exists but cannot be walked is an error.
pub fn find_codex_sessions(
    sessions_root: &Path,
    repo_root: &Path,
    max_age: Duration,
) -> Result<Vec<PathBuf>> {
    if !sessions_root.exists() {
        return Ok(Vec::new());
    }

    let cutoff = SystemTime::now()
        .checked_sub(max_age)
        .unwrap_or(SystemTime::UNIX_EPOCH);

    let mut sessions = Vec::new();
    for entry in WalkDir::new(sessions_root)
        .min_depth(ROLLOUT_DEPTH)
        .max_depth(ROLLOUT_DEPTH)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                return Err(DetectError::Enumerate {
                    root: sessions_root.to_path_buf(),
                    source: err,
                });
            }
            Err(err) => {
                debug!(error = %err, "skipping unreadable sessions entry");
                continue;
            }
        };
        if !entry.file_type().is_file() || !is_rollout_file_name(entry.file_name().to_str()) {
            continue;
        }

        let modified = match entry.metadata().ok().and_then(|meta| meta.modified().ok()) {
            Some(modified) => modified,
            None => continue,
        };
        if modified < cutoff {
            continue;
        }

        if matches_repo(entry.path(), repo_root) {
            sessions.push(entry.into_path());
        }
    }
    Ok(sessions)
}

/// Checks the `session_meta` first line of a transcript against `repo_root`.
///
/// The comparison is exact: no normalization, no trailing separator
/// tolerance. Any read or parse failure is a mismatch.
pub fn matches_repo(jsonl_path: &Path, repo_root: &Path) -> bool {
    let Ok(file) = File::open(jsonl_path) else {
        return false;
    };
    let mut first_line = String::new();
    if BufReader::new(file).read_line(&mut first_line).is_err() {
        return false;
    }

    session_meta_cwd(first_line.trim())
        .is_some_and(|cwd| Path::new(&cwd).as_os_str() == repo_root.as_os_str())
}

fn is_rollout_file_name(name: Option<&str>) -> bool {
    name.is_some_and(|name| name.starts_with(ROLLOUT_PREFIX) && name.ends_with(ROLLOUT_EXTENSION))
}
