use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "emoji-sync")]
#[command(version)]
#[command(about = "Keep a workspace's custom emoji in step with a numbered config", long_about = None)]
pub struct Cli {
    /// First configuration position to process
    #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
    pub start: i64,

    /// Last configuration position to process (inclusive)
    #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
    pub finish: i64,

    /// Settings profile to load
    #[arg(short, long, default_value = "default")]
    pub profile: String,

    /// Upload configured emoji that are missing
    #[arg(short, long)]
    pub upload: bool,

    /// Remove configured emoji that already exist
    #[arg(short, long)]
    pub remove: bool,

    /// Settings file (defaults to ~/.config/emoji-sync/config.toml)
    #[arg(short, long, env = "EMOJI_SYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Dry run - show what would be done
    #[arg(short = 'z', long)]
    pub dry_run: bool,

    /// Maximum concurrent uploads
    #[arg(short, long, default_value = "4")]
    pub threads: usize,

    /// Directory image filenames are resolved against (defaults to the
    /// directory holding this executable)
    #[arg(long)]
    pub upload_folder: Option<PathBuf>,

    /// Attempts per emoji before giving up
    #[arg(long, default_value = "3")]
    pub retries: u32,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "30")]
    pub timeout: u64,

    /// Enable debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    pub debug: bool,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    pub fn log_level(&self) -> log::LevelFilter {
        if self.quiet {
            log::LevelFilter::Error
        } else if self.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        }
    }
}
