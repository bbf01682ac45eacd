//! Reconstructs what a Codex CLI session did inside a repository by reading
//! the rollout transcripts under `~/.codex/sessions/YYYY/MM/DD/`.

pub mod clean;
pub mod cli;
pub mod command;
pub mod config;
pub mod detector;
pub mod error;
pub mod locator;
pub mod patch;
pub mod session;
pub mod transcript;
pub mod util;

pub use detector::{CodexDetector, Detector, detect_codex};
pub use error::DetectError;
pub use session::{SessionInfo, Tool};
