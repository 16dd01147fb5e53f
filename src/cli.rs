use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Repositories one generation request may cover
pub const MAX_SELECTED_REPOS: usize = 3;

#[derive(Parser, Debug)]
#[command(name = "repo-pulse")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "AI-powered engineering summaries from recent GitHub activity",
    long_about = "repo-pulse fetches recent commits for up to three of your GitHub \
                  repositories, filters the diffs down to what matters, and generates \
                  a concise engineering summary with token-cost accounting. Summaries \
                  are stored locally for later retrieval."
)]
pub struct Cli {
    /// Path to config file (default: ~/.config/repo-pulse/config.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List your repositories (served from a 7-day cache)
    Repos {
        /// Bypass the cache and refresh from GitHub
        #[arg(long)]
        refresh: bool,
    },

    /// Generate a summary for up to three repositories
    Generate {
        /// Full repository names (owner/name), comma separated
        #[arg(short, long, value_delimiter = ',')]
        repos: Vec<String>,

        /// Number of days to look back
        #[arg(short, long, value_name = "DAYS")]
        days: Option<u32>,

        /// Write the summary as markdown to a file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// List stored insights, newest first
    List {
        /// Maximum number of insights to show
        #[arg(long, default_value_t = 20)]
        take: usize,
    },

    /// Show one stored insight
    Show {
        /// Insight identifier
        id: String,
    },

    /// Delete a stored insight
    Delete {
        /// Insight identifier
        id: String,
    },

    /// Initialize configuration file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Show current configuration
    Config,

    /// Clear the local repository cache
    ClearCache,
}

impl Cli {
    /// Validate CLI arguments
    pub fn validate(&self) -> Result<(), String> {
        if let Some(Commands::Generate {
            ref repos, days, ..
        }) = self.command
        {
            if repos.len() > MAX_SELECTED_REPOS {
                return Err(format!(
                    "At most {} repositories can be summarized at once.",
                    MAX_SELECTED_REPOS
                ));
            }

            if repos.iter().any(|r| !r.contains('/')) {
                return Err("Repository names must be fully qualified (owner/name).".to_string());
            }

            if days == Some(0) {
                return Err("--days must be at least 1.".to_string());
            }
        }

        Ok(())
    }
}
