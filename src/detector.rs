use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};

use crate::command::CommandExtractor;
use crate::config;
use crate::locator::find_codex_sessions;
use crate::session::{SessionInfo, Tool};
use crate::transcript::parse_codex_session_with;

/// Reconstructs recent agent activity for a repository from session logs.
///
/// `None` means nothing attributable was found. Unexpected failures are
/// reported through `tracing` and never surface to the caller.
pub trait Detector {
    fn tool(&self) -> Tool;

    fn detect(&self, repo_root: &Path, max_age: Duration) -> Option<SessionInfo>;
}

#[derive(Debug, Clone)]
pub struct CodexDetector {
    sessions_root: PathBuf,
    extractor: CommandExtractor,
}

impl CodexDetector {
    pub fn new(sessions_root: impl Into<PathBuf>) -> Self {
        Self {
            sessions_root: sessions_root.into(),
            extractor: CommandExtractor::builtin(),
        }
    }

    /// Replaces the idioms used to infer writes from shell commands.
    pub fn with_extractor(mut self, extractor: CommandExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Detector rooted at `$CODEX_HOME/sessions` (or `~/.codex/sessions`).
    pub fn from_env() -> Self {
        Self::new(config::sessions_path())
    }

    pub fn sessions_root(&self) -> &Path {
        &self.sessions_root
    }

    /// Matching transcript paths, with enumeration failures logged and
    /// treated as "no sessions".
    pub fn session_files(&self, repo_root: &Path, max_age: Duration) -> Vec<PathBuf> {
        match find_codex_sessions(&self.sessions_root, repo_root, max_age) {
            Ok(paths) => paths,
            Err(err) => {
                warn!(
                    error = %err,
                    root = %self.sessions_root.display(),
                    "codex session discovery failed"
                );
                Vec::new()
            }
        }
    }

    /// Folds the given transcripts into one summary. Files that cannot be
    /// read are logged and skipped.
    pub fn merge_sessions(&self, paths: &[PathBuf]) -> Option<SessionInfo> {
        let mut merged = SessionInfo::new(Tool::Codex);
        for path in paths {
            match parse_codex_session_with(path, &self.extractor) {
                Ok(Some(session)) => merged.absorb(session),
                Ok(None) => {
                    debug!(path = %path.display(), "codex session wrote no files");
                }
                Err(err) => {
                    warn!(error = %err, path = %path.display(), "skipping unreadable codex session");
                }
            }
        }

        merged.into_attributable()
    }
}

impl Detector for CodexDetector {
    fn tool(&self) -> Tool {
        Tool::Codex
    }

    fn detect(&self, repo_root: &Path, max_age: Duration) -> Option<SessionInfo> {
        let sessions = self.session_files(repo_root, max_age);
        if sessions.is_empty() {
            return None;
        }
        self.merge_sessions(&sessions)
    }
}

/// Merged Codex activity for `repo_root` over the last `max_age`, read from
/// the sessions directory resolved by [`config::sessions_path`].
pub fn detect_codex(repo_root: &Path, max_age: Duration) -> Option<SessionInfo> {
    CodexDetector::from_env().detect(repo_root, max_age)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Capture, WriteIdiom};
    use tempfile::TempDir;

    const REPO: &str = "/Users/jose/myproject";
    const MAX_AGE: Duration = Duration::from_secs(72 * 60 * 60);

    fn write_session(root: &Path, name: &str, content: &str) -> PathBuf {
        let dir = root.join("2026").join("02").join("10");
        std::fs::create_dir_all(&dir).expect("create session dir");
        let path = dir.join(name);
        std::fs::write(&path, content).expect("write session");
        path
    }

    #[test]
    fn merges_sessions_for_same_repo() {
        let tmp = TempDir::new().expect("temp dir");
        write_session(
            tmp.path(),
            "rollout-2026-02-10T10-25-57-aaa.jsonl",
            r#"{"timestamp":"2026-02-10T10:25:57.694Z","type":"session_meta","payload":{"cwd":"/Users/jose/myproject"}}
{"timestamp":"2026-02-10T10:25:57.753Z","type":"turn_context","payload":{"model":"gpt-5-codex"}}
{"timestamp":"2026-02-10T10:26:00.000Z","type":"event_msg","payload":{"type":"token_count","info":{"total_token_usage":{"total_tokens":9000}}}}
{"timestamp":"2026-02-10T10:28:00.000Z","type":"response_item","payload":{"type":"function_call","name":"exec_command","arguments":"{\"cmd\":\"touch a.go\"}"}}"#,
        );
        write_session(
            tmp.path(),
            "rollout-2026-02-10T11-00-00-bbb.jsonl",
            r#"{"timestamp":"2026-02-10T11:00:00.000Z","type":"session_meta","payload":{"cwd":"/Users/jose/myproject"}}
{"timestamp":"2026-02-10T11:00:00.100Z","type":"turn_context","payload":{"model":"gpt-5.3-codex"}}
{"timestamp":"2026-02-10T11:00:00.500Z","type":"event_msg","payload":{"type":"token_count","info":{"total_token_usage":{"total_tokens":4000}}}}
{"timestamp":"2026-02-10T11:00:01.000Z","type":"response_item","payload":{"type":"function_call","name":"exec_command","arguments":"{\"cmd\":\"touch b.go\"}"}}"#,
        );

        let info = CodexDetector::new(tmp.path())
            .detect(Path::new(REPO), MAX_AGE)
            .expect("merged info");

        assert_eq!(
            info.files_written.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["a.go", "b.go"]
        );
        assert_eq!(info.model, "gpt-5.3-codex");
        assert_eq!(info.total_tokens, 9000);
        assert_eq!(info.session_duration_sec, 122);
        assert_eq!(info.tool, Tool::Codex);
    }

    #[test]
    fn sessions_without_writes_do_not_count() {
        let tmp = TempDir::new().expect("temp dir");
        write_session(
            tmp.path(),
            "rollout-2026-02-10T10-25-57-aaa.jsonl",
            r#"{"timestamp":"2026-02-10T10:25:57.694Z","type":"session_meta","payload":{"cwd":"/Users/jose/myproject"}}
{"timestamp":"2026-02-10T10:25:57.753Z","type":"turn_context","payload":{"model":"gpt-5-codex"}}
{"timestamp":"2026-02-10T10:26:00.000Z","type":"event_msg","payload":{"type":"user_message","message":"hello"}}"#,
        );

        assert_eq!(
            CodexDetector::new(tmp.path()).detect(Path::new(REPO), MAX_AGE),
            None
        );
    }

    #[test]
    fn other_repositories_are_ignored() {
        let tmp = TempDir::new().expect("temp dir");
        write_session(
            tmp.path(),
            "rollout-2026-02-10T10-25-57-aaa.jsonl",
            r#"{"timestamp":"2026-02-10T10:25:57.694Z","type":"session_meta","payload":{"cwd":"/Users/jose/other"}}
{"timestamp":"2026-02-10T10:26:00.000Z","type":"response_item","payload":{"type":"function_call","name":"exec_command","arguments":"{\"cmd\":\"touch a.go\"}"}}"#,
        );

        assert_eq!(
            CodexDetector::new(tmp.path()).detect(Path::new(REPO), MAX_AGE),
            None
        );
    }

    #[test]
    fn missing_sessions_root_is_absent() {
        let tmp = TempDir::new().expect("temp dir");
        let detector = CodexDetector::new(tmp.path().join("does-not-exist"));
        assert!(detector.session_files(Path::new(REPO), MAX_AGE).is_empty());
        assert_eq!(detector.detect(Path::new(REPO), MAX_AGE), None);
    }

    #[test]
    fn custom_idioms_contribute_files() {
        let tmp = TempDir::new().expect("temp dir");
        write_session(
            tmp.path(),
            "rollout-2026-02-10T10-25-57-aaa.jsonl",
            r#"{"timestamp":"2026-02-10T10:25:57.694Z","type":"session_meta","payload":{"cwd":"/Users/jose/myproject"}}
{"timestamp":"2026-02-10T10:26:00.000Z","type":"response_item","payload":{"type":"function_call","name":"exec_command","arguments":"{\"cmd\":\"install -D build/tool bin/tool\"}"}}"#,
        );

        let builtin = CodexDetector::new(tmp.path());
        assert_eq!(builtin.detect(Path::new(REPO), MAX_AGE), None);

        let extractor = CommandExtractor::builtin().with_idiom(
            WriteIdiom::new("install", r"\binstall\s+(?:-\S+\s+)*\S+\s+(\S+)", Capture::Path)
                .expect("pattern"),
        );
        let info = builtin
            .with_extractor(extractor)
            .detect(Path::new(REPO), MAX_AGE)
            .expect("custom idiom info");
        assert_eq!(
            info.files_written.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["bin/tool"]
        );
    }

    #[test]
    fn unreadable_session_does_not_hide_others() {
        let tmp = TempDir::new().expect("temp dir");
        let vanished = write_session(
            tmp.path(),
            "rollout-2026-02-10T10-25-57-aaa.jsonl",
            r#"{"timestamp":"2026-02-10T10:25:57.694Z","type":"session_meta","payload":{"cwd":"/Users/jose/myproject"}}
{"timestamp":"2026-02-10T10:26:00.000Z","type":"response_item","payload":{"type":"function_call","name":"exec_command","arguments":"{\"cmd\":\"touch gone.go\"}"}}"#,
        );
        write_session(
            tmp.path(),
            "rollout-2026-02-10T11-00-00-bbb.jsonl",
            r#"{"timestamp":"2026-02-10T11:00:00.000Z","type":"session_meta","payload":{"cwd":"/Users/jose/myproject"}}
{"timestamp":"2026-02-10T11:00:01.000Z","type":"response_item","payload":{"type":"function_call","name":"exec_command","arguments":"{\"cmd\":\"touch kept.go\"}"}}"#,
        );

        let detector = CodexDetector::new(tmp.path());
        let mut sessions = detector.session_files(Path::new(REPO), MAX_AGE);
        assert_eq!(sessions.len(), 2);
        std::fs::remove_file(&vanished).expect("remove session");
        sessions.push(tmp.path().join("never-existed.jsonl"));

        let info = detector.merge_sessions(&sessions).expect("remaining session");
        assert_eq!(
            info.files_written.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["kept.go"]
        );
    }
}
