use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_MAX_AGE_HOURS: u64 = 72;
const MAX_AGE_ENV: &str = "CODEX_DETECTOR_MAX_AGE_HOURS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectorSettings {
    pub max_age: Duration,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            max_age: hours(DEFAULT_MAX_AGE_HOURS),
        }
    }
}

pub fn detector_settings() -> DetectorSettings {
    DetectorSettings {
        max_age: hours(env_u64(MAX_AGE_ENV, DEFAULT_MAX_AGE_HOURS)),
    }
}

pub fn hours(count: u64) -> Duration {
    Duration::from_secs(count.saturating_mul(60 * 60))
}

pub fn codex_home() -> PathBuf {
    if let Ok(custom) = env::var("CODEX_HOME") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }

    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".codex")
}

pub fn sessions_path() -> PathBuf {
    codex_home().join("sessions")
}

fn env_u64(name: &str, default: u64) -> u64 {
    parse_positive_u64(env::var(name).ok().as_deref()).unwrap_or(default)
}

fn parse_positive_u64(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
}
