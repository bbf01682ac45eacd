use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use codex_session_detector::cli::{Cli, Commands, QueryArgs};
use codex_session_detector::config;
use codex_session_detector::detector::{CodexDetector, Detector};
use codex_session_detector::session::SessionInfo;
use codex_session_detector::util::{display_model, format_tokens, human_duration, setup_tracing};

fn main() -> ExitCode {
    match run() {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("codex-session-detector error: {err:#}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<u8> {
    setup_tracing();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Detect { query, json }) => detect(&query, json),
        Some(Commands::Sessions { query }) => list_sessions(&query),
        None => detect(&QueryArgs::default(), false),
    }
}

struct Query {
    detector: CodexDetector,
    repo_root: PathBuf,
    max_age: Duration,
}

fn resolve(query: &QueryArgs) -> Result<Query> {
    let repo_root = match &query.repo {
        Some(path) => path.clone(),
        None => env::current_dir().context("failed to resolve current directory")?,
    };
    let max_age = query
        .max_age_hours
        .filter(|hours| *hours > 0)
        .map(config::hours)
        .unwrap_or_else(|| config::detector_settings().max_age);
    let detector = query
        .sessions_dir
        .clone()
        .map(|dir| CodexDetector::new(dir))
        .unwrap_or_else(CodexDetector::from_env);

    Ok(Query {
        detector,
        repo_root,
        max_age,
    })
}

fn detect(query: &QueryArgs, json: bool) -> Result<u8> {
    let query = resolve(query)?;
    let Some(info) = query.detector.detect(&query.repo_root, query.max_age) else {
        if json {
            println!("null");
        }
        eprintln!(
            "no {} session activity found for {}",
            query.detector.tool().title(),
            query.repo_root.display()
        );
        return Ok(0);
    };

    if json {
        let data = serde_json::to_string_pretty(&info).context("failed to encode summary")?;
        println!("{data}");
    } else {
        print_summary(&info, &query);
    }
    Ok(0)
}

fn list_sessions(query: &QueryArgs) -> Result<u8> {
    let query = resolve(query)?;
    println!("sessions_dir: {}", query.detector.sessions_root().display());
    for path in query.detector.session_files(&query.repo_root, query.max_age) {
        println!("  - {}", path.display());
    }
    Ok(0)
}

fn print_summary(info: &SessionInfo, query: &Query) {
    println!("repo: {}", query.repo_root.display());
    println!("tool: {}", info.tool.title());
    println!("model: {}", display_model(&info.model));
    println!("tokens: {}", format_tokens(info.total_tokens));
    println!(
        "duration: {}",
        human_duration(Duration::from_secs(info.session_duration_sec))
    );
    println!("files_written: {}", info.files_written.len());
    for file in &info.files_written {
        println!("  - {file}");
    }
}
