use std::io;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

/// Logs go to stderr so stdout stays reserved for the report.
pub fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .try_init();
}

pub fn format_tokens(tokens: u64) -> String {
    if tokens >= 1_000_000 {
        format!("{:.1}M", tokens as f64 / 1_000_000.0)
    } else if tokens >= 1_000 {
        format!("{:.1}K", tokens as f64 / 1_000.0)
    } else {
        tokens.to_string()
    }
}

pub fn human_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let hours = secs / 3_600;
    let minutes = (secs % 3_600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

pub fn display_model(model: &str) -> &str {
    if model.trim().is_empty() {
        "unknown"
    } else {
        model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_formatting() {
        assert_eq!(format_tokens(999), "999");
        assert_eq!(format_tokens(18_521), "18.5K");
        assert_eq!(format_tokens(1_500_000), "1.5M");
    }

    #[test]
    fn duration_formatting() {
        assert_eq!(human_duration(Duration::from_secs(42)), "42s");
        assert_eq!(human_duration(Duration::from_secs(92)), "1m 32s");
        assert_eq!(human_duration(Duration::from_secs(26 * 3_600 + 120)), "26h 2m");
    }

    #[test]
    fn empty_model_displays_as_unknown() {
        assert_eq!(display_model(""), "unknown");
        assert_eq!(display_model("gpt-5.3-codex"), "gpt-5.3-codex");
    }
}
