use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "codex-session-detector",
    version,
    about = "Attribute recent Codex CLI session activity to a repository"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the merged summary of recent sessions for the repository (default).
    Detect {
        #[command(flatten)]
        query: QueryArgs,
        /// Emit the summary as JSON.
        #[arg(long)]
        json: bool,
    },
    /// List the transcript files that belong to the repository.
    Sessions {
        #[command(flatten)]
        query: QueryArgs,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct QueryArgs {
    /// Repository root, compared verbatim with each session's working directory.
    #[arg(long, value_name = "PATH")]
    pub repo: Option<PathBuf>,
    /// Ignore transcripts not modified within this many hours.
    #[arg(long, value_name = "HOURS")]
    pub max_age_hours: Option<u64>,
    /// Sessions directory to scan instead of `$CODEX_HOME/sessions`.
    #[arg(long, value_name = "PATH")]
    pub sessions_dir: Option<PathBuf>,
}
