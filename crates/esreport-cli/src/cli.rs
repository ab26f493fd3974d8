use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "esreport")]
#[command(about = "Job and request reports in Elasticsearch", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "ESREPORT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install the index templates for report indices
    Configure {
        /// Index prefix (default from config)
        prefix: Option<String>,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Delete report indices outside the retention window
    Tidy {
        /// Index prefix (default from config)
        prefix: Option<String>,

        /// Number of days to keep (default from config)
        #[arg(long, allow_negative_numbers = true)]
        days: Option<i64>,

        /// Print what would be deleted without deleting
        #[arg(long)]
        dry_run: bool,
    },
}
