use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    #[default]
    Codex,
}

impl Tool {
    pub fn title(self) -> &'static str {
        match self {
            Self::Codex => "Codex",
        }
    }
}

/// What one session (or a merge of several) did inside a repository.
///
/// A value only exists when `files_written` is non-empty; sessions that
/// wrote nothing are reported as `None` by every producer in this crate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SessionInfo {
    pub tool: Tool,
    pub files_written: BTreeSet<String>,
    pub model: String,
    pub total_tokens: u64,
    pub session_duration_sec: u64,
}

impl SessionInfo {
    pub fn new(tool: Tool) -> Self {
        Self {
            tool,
            ..Self::default()
        }
    }

    pub fn has_writes(&self) -> bool {
        !self.files_written.is_empty()
    }

    /// Folds another session for the same repository into this one.
    ///
    /// Files are unioned, a non-empty model overwrites the current one, and
    /// tokens and duration keep the maximum: every session reports its own
    /// cumulative snapshot, so summing would double count.
    pub fn absorb(&mut self, other: SessionInfo) {
        self.files_written.extend(other.files_written);
        if !other.model.is_empty() {
            self.model = other.model;
        }
        self.total_tokens = self.total_tokens.max(other.total_tokens);
        self.session_duration_sec = self.session_duration_sec.max(other.session_duration_sec);
    }

    /// Applies the "no writes, no result" rule.
    pub fn into_attributable(self) -> Option<Self> {
        self.has_writes().then_some(self)
    }
}
