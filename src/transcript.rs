use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::command::{CommandExtractor, builtin_extractor};
use crate::error::{DetectError, Result};
use crate::patch::extract_files_from_patch;
use crate::session::{SessionInfo, Tool};

/// Lines longer than this are skipped rather than buffered.
pub const MAX_LINE_BYTES: usize = 10 * 1024 * 1024;

const SHELL_FUNCTIONS: [&str; 3] = ["exec_command", "shell_command", "shell"];
const APPLY_PATCH: &str = "apply_patch";
const TOKEN_COUNT_MARKER: &str = r#""token_count""#;
const WRITE_CALL_MARKERS: [&str; 4] = [
    r#""exec_command""#,
    r#""shell_command""#,
    r#""shell""#,
    r#""apply_patch""#,
];

/// Streams one Codex transcript and summarizes what it wrote.
///
/// Returns `Ok(None)` when the session wrote no files. Malformed lines are
/// skipped; only failing to open or read the file is an error.
pub fn parse_codex_session(jsonl_path: &Path) -> Result<Option<SessionInfo>> {
    parse_codex_session_with(jsonl_path, builtin_extractor())
}

/// Like [`parse_codex_session`], inferring shell writes with `extractor`.
pub fn parse_codex_session_with(
    jsonl_path: &Path,
    extractor: &CommandExtractor,
) -> Result<Option<SessionInfo>> {
    let file = File::open(jsonl_path).map_err(|err| DetectError::io(jsonl_path, err))?;
    let mut reader = BufReader::new(file);
    let mut accumulator = SessionAccumulator::new(extractor);
    scan_lines(&mut reader, jsonl_path, MAX_LINE_BYTES, &mut accumulator)?;
    Ok(accumulator.finish())
}

/// Working directory declared by a `session_meta` line.
pub(crate) fn session_meta_cwd(line: &str) -> Option<String> {
    let parsed = serde_json::from_str::<Value>(line).ok()?;
    if str_at(&parsed, &["type"]).as_deref() != Some("session_meta") {
        return None;
    }
    str_at(&parsed, &["payload", "cwd"])
}

fn scan_lines<R: BufRead>(
    reader: &mut R,
    jsonl_path: &Path,
    max_line_bytes: usize,
    accumulator: &mut SessionAccumulator<'_>,
) -> Result<()> {
    let mut line = Vec::new();
    let mut line_number = 0usize;
    loop {
        line.clear();
        let bytes = reader
            .by_ref()
            .take(max_line_bytes as u64 + 1)
            .read_until(b'\n', &mut line)
            .map_err(|err| DetectError::io(jsonl_path, err))?;
        if bytes == 0 {
            break;
        }
        line_number += 1;

        if line.len() > max_line_bytes && line.last() != Some(&b'\n') {
            let rest = reader
                .skip_until(b'\n')
                .map_err(|err| DetectError::io(jsonl_path, err))?;
            debug!(
                path = %jsonl_path.display(),
                line = line_number,
                bytes = line.len() + rest,
                "skipping oversized transcript line"
            );
            continue;
        }

        accumulator.apply_line(&line);
    }
    Ok(())
}

#[derive(Debug)]
struct SessionAccumulator<'a> {
    extractor: &'a CommandExtractor,
    files_written: BTreeSet<String>,
    model: String,
    total_tokens: u64,
    first_timestamp: Option<DateTime<Utc>>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl<'a> SessionAccumulator<'a> {
    fn new(extractor: &'a CommandExtractor) -> Self {
        Self {
            extractor,
            files_written: BTreeSet::new(),
            model: String::new(),
            total_tokens: 0,
            first_timestamp: None,
            last_timestamp: None,
        }
    }

    fn apply_line(&mut self, raw: &[u8]) {
        let Ok(text) = std::str::from_utf8(raw) else {
            return;
        };
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let parsed = match serde_json::from_str::<Value>(text) {
            Ok(value) => value,
            Err(_) => return,
        };

        if let Some(ts) = str_at(&parsed, &["timestamp"]).and_then(parse_utc_timestamp) {
            self.observe_timestamp(ts);
        }

        let payload = parsed.get("payload").unwrap_or(&Value::Null);
        match str_at(&parsed, &["type"]).as_deref() {
            Some("turn_context") => {
                if let Some(model) = str_at(payload, &["model"]).filter(|m| !m.is_empty()) {
                    self.model = model;
                }
            }
            Some("event_msg") => {
                if !text.contains(TOKEN_COUNT_MARKER) {
                    return;
                }
                if str_at(payload, &["type"]).as_deref() == Some("token_count")
                    && let Some(total) = uint_at(payload, &["info", "total_token_usage", "total_tokens"])
                {
                    self.total_tokens = total;
                }
            }
            Some("response_item") => {
                if !WRITE_CALL_MARKERS.iter().any(|marker| text.contains(marker)) {
                    return;
                }
                self.apply_response_item(payload);
            }
            _ => {}
        }
    }

    fn apply_response_item(&mut self, payload: &Value) {
        let name = str_at(payload, &["name"]).unwrap_or_default();
        match str_at(payload, &["type"]).as_deref() {
            Some("function_call") => {
                let arguments = str_at(payload, &["arguments"]).unwrap_or_default();
                let Ok(args) = serde_json::from_str::<Value>(&arguments) else {
                    debug!(function = %name, "skipping function call with unparseable arguments");
                    return;
                };
                if SHELL_FUNCTIONS.contains(&name.as_str()) {
                    if let Some(command) = shell_command_text(&args) {
                        self.files_written.extend(self.extractor.extract(&command));
                    }
                } else if name == APPLY_PATCH {
                    if let Some(path) = str_at(&args, &["path"]).filter(|p| !p.trim().is_empty()) {
                        self.files_written.insert(path);
                    } else if let Some(input) = str_at(&args, &["input"]) {
                        self.files_written.extend(extract_files_from_patch(&input));
                    }
                }
            }
            Some("custom_tool_call") if name == APPLY_PATCH => {
                if let Some(input) = str_at(payload, &["input"]) {
                    self.files_written.extend(extract_files_from_patch(&input));
                }
            }
            _ => {}
        }
    }

    fn observe_timestamp(&mut self, ts: DateTime<Utc>) {
        if self.first_timestamp.is_none_or(|first| ts < first) {
            self.first_timestamp = Some(ts);
        }
        if self.last_timestamp.is_none_or(|last| ts > last) {
            self.last_timestamp = Some(ts);
        }
    }

    fn finish(self) -> Option<SessionInfo> {
        let session_duration_sec = match (self.first_timestamp, self.last_timestamp) {
            (Some(first), Some(last)) => last.signed_duration_since(first).num_seconds().max(0) as u64,
            _ => 0,
        };

        SessionInfo {
            tool: Tool::Codex,
            files_written: self.files_written,
            model: self.model,
            total_tokens: self.total_tokens,
            session_duration_sec,
        }
        .into_attributable()
    }
}

/// Script text of a shell call: `cmd` for `exec_command`, `command` for the
/// older shell tools, where `command` may also be an argv array.
fn shell_command_text(args: &Value) -> Option<String> {
    if let Some(cmd) = str_at(args, &["cmd"]) {
        return Some(cmd);
    }
    match args.get("command")? {
        Value::String(command) => Some(command.clone()),
        Value::Array(argv) => argv.last().and_then(Value::as_str).map(ToString::to_string),
        _ => None,
    }
}

fn parse_utc_timestamp(text: String) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

fn str_at(value: &Value, path: &[&str]) -> Option<String> {
    let mut cursor = value;
    for key in path {
        cursor = cursor.get(*key)?;
    }
    cursor.as_str().map(|s| s.to_string())
}

fn uint_at(value: &Value, path: &[&str]) -> Option<u64> {
    let mut cursor = value;
    for key in path {
        cursor = cursor.get(*key)?;
    }
    cursor
        .as_u64()
        .or_else(|| cursor.as_i64().and_then(|n| (n >= 0).then_some(n as u64)))
}
