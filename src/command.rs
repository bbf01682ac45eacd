//! Heuristic detection of files written by a shell command string.
//!
//! The command text is never tokenized by a shell grammar. Each idiom is a
//! regular expression whose first capture group holds the written path (or
//! a whitespace separated list of paths), and the extractor runs the idioms
//! in order over the raw text. Path tokens end at whitespace or at one of
//! `; & | < >`. Bare `>`/`>>` redirects from arbitrary commands are
//! intentionally not recognized.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::clean::clean_path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    /// The capture group is a single path token.
    Path,
    /// The capture group is a whitespace separated list of path tokens.
    PathList,
}

#[derive(Debug, Clone)]
pub struct WriteIdiom {
    name: &'static str,
    pattern: Regex,
    capture: Capture,
}

impl WriteIdiom {
    pub fn new(name: &'static str, pattern: &str, capture: Capture) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            pattern: Regex::new(pattern)?,
            capture,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Raw, uncleaned tokens this idiom captures from `command`.
    pub fn candidates<'a>(&'a self, command: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pattern
            .captures_iter(command)
            .filter_map(|caps| caps.get(1))
            .flat_map(move |group| {
                let mut tokens: Vec<&'a str> = match self.capture {
                    Capture::Path => vec![group.as_str()],
                    Capture::PathList => group.as_str().split_whitespace().collect(),
                };
                if touches_redirect(command, group.as_str(), group.end())
                    && tokens.last().is_some_and(|token| is_fd_number(token))
                {
                    tokens.pop();
                }
                tokens
            })
    }
}

/// The capture ends flush against `<` or `>`, as in `2>/dev/null`.
fn touches_redirect(command: &str, group: &str, end: usize) -> bool {
    !group.ends_with(char::is_whitespace) && command[end..].starts_with(['<', '>'])
}

fn is_fd_number(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

const BUILTIN_IDIOMS: [(&str, &str, Capture); 6] = [
    ("cat-redirect", r"\bcat\s+>\s+([^\s;&|<>]+)", Capture::Path),
    ("tee", r"\btee\s+(?:-a\s+)?([^\s;&|<>]+)", Capture::Path),
    ("touch", r"\btouch\s+([^;&|<>\n]+)", Capture::PathList),
    ("cp", r"\bcp\s+(?:-\w+\s+)*\S+\s+([^\s;&|<>]+)", Capture::Path),
    ("mv", r"\bmv\s+(?:-\w+\s+)*\S+\s+([^\s;&|<>]+)", Capture::Path),
    (
        "sed-in-place",
        r#"\bsed\s+-i\S*\s+(?:'[^']*'|"[^"]*"|\S+)\s+([^\s;&|<>]+)"#,
        Capture::Path,
    ),
];

static DEFAULT_EXTRACTOR: LazyLock<CommandExtractor> = LazyLock::new(CommandExtractor::builtin);

/// Ordered list of write idioms applied to a command string.
#[derive(Debug, Clone, Default)]
pub struct CommandExtractor {
    idioms: Vec<WriteIdiom>,
}

impl CommandExtractor {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let idioms = BUILTIN_IDIOMS
            .into_iter()
            .map(|(name, pattern, capture)| {
                WriteIdiom::new(name, pattern, capture).expect("built-in write idiom must compile")
            })
            .collect();
        Self { idioms }
    }

    pub fn with_idiom(mut self, idiom: WriteIdiom) -> Self {
        self.idioms.push(idiom);
        self
    }

    pub fn idioms(&self) -> &[WriteIdiom] {
        &self.idioms
    }

    /// Paths the command likely wrote, deduplicated in first-seen order.
    pub fn extract(&self, command: &str) -> Vec<String> {
        let mut files = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for idiom in &self.idioms {
            for token in idiom.candidates(command) {
                let Some(path) = clean_path(token) else {
                    continue;
                };
                if seen.insert(path.clone()) {
                    files.push(path);
                }
            }
        }
        files
    }
}

/// Shared extractor holding only the built-in idioms.
pub fn builtin_extractor() -> &'static CommandExtractor {
    &DEFAULT_EXTRACTOR
}

/// Runs the built-in idioms over `command`.
pub fn extract_files_from_cmd(command: &str) -> Vec<String> {
    DEFAULT_EXTRACTOR.extract(command)
}
