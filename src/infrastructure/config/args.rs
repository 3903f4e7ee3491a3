use super::app_config::LogLevel;
use crate::domain::ports::Anchor;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "narrow",
    version,
    about = "Parse a narrow query and show the messages it selects",
    long_about = None
)]
pub struct CliArgs {
    /// Realm snapshot (JSON) to evaluate against.
    #[arg(short, long, value_name = "PATH")]
    pub snapshot: PathBuf,

    /// Where to center the loaded messages: newest, oldest, first_unread, or an id.
    #[arg(short, long, default_value = "first_unread")]
    pub anchor: Anchor,

    /// Only describe the narrow; do not load messages.
    #[arg(short, long)]
    pub describe: bool,

    /// Configuration file path.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Treat `un`/`.d` stream and topic variants as one conversation.
    #[arg(long)]
    pub zephyr_mirror: Option<bool>,

    /// Stream the client is locked to.
    #[arg(long)]
    pub narrow_stream: Option<String>,

    /// Maximum number of cached narrows.
    #[arg(long)]
    pub cache_capacity: Option<usize>,

    /// Messages to fetch before the anchor.
    #[arg(long)]
    pub num_before: Option<usize>,

    /// Messages to fetch after the anchor.
    #[arg(long)]
    pub num_after: Option<usize>,

    /// The narrow query, e.g. `stream:Verona -is:starred lunch`.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub query: Vec<String>,
}

impl CliArgs {
    /// The query words joined back into one search string.
    #[must_use]
    pub fn query_text(&self) -> String {
        self.query.join(" ")
    }
}
