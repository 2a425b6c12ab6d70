use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "rsync-pulse")]
#[command(about = "Run rsync with a live view of what it is doing", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Synchronize SOURCE into DEST and show progress
    Sync(SyncArgs),
    /// Print the rsync command line that `sync` would run
    ShowCommand(SyncArgs),
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Clone, Args)]
pub struct SyncArgs {
    /// Source folder (falls back to `source_path` in the configuration)
    pub source: Option<String>,
    /// Destination folder (falls back to `dest_path` in the configuration)
    pub dest: Option<String>,
    /// Show what would be transferred without changing anything
    #[arg(long)]
    pub dry_run: bool,
    /// Delete files in DEST that are not in SOURCE
    #[arg(long)]
    pub delete: bool,
    /// Print raw rsync output instead of the classified view
    #[arg(long)]
    pub plain: bool,
    /// Path to the rsync binary
    #[arg(long, value_name = "PATH")]
    pub rsync: Option<String>,
}
