use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use diary_core::pagination::DEFAULT_PAGE_SIZE;

#[derive(Parser)]
#[command(name = "diary")]
#[command(about = "Back up, export and inspect the diary database")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to the diary database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write today's CSV backup of every entry
    Backup {
        /// Directory the backup file is written to
        #[arg(long, value_name = "DIR", default_value = ".")]
        output_dir: PathBuf,
    },
    /// Export all entries
    Export {
        /// Export format
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
        /// Output file, or a completions directory (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// List one owner's entries, newest first
    List {
        /// Owner whose entries are listed
        #[arg(long, value_name = "ID")]
        owner: String,
        /// Page number, or `last`
        #[arg(long, value_name = "N")]
        page: Option<String>,
        /// Entries per page
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Issue a session token for a user (reads DIARY_SESSION_SECRET)
    Token {
        /// User identity the token is issued for
        #[arg(long, value_name = "ID")]
        user: String,
        /// Token lifetime in seconds
        #[arg(long, default_value_t = 86_400)]
        ttl_secs: u64,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Output file, or a completions directory (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl From<ExportFormat> for diary_core::export::ExportFormat {
    fn from(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Json => Self::Json,
            ExportFormat::Csv => Self::Csv,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
