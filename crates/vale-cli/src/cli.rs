use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use vale_types::Status;

#[derive(Parser, Debug)]
#[command(
    name = "vale",
    about = "Voucher registry: numbering, status, reindexing and consolidation",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Artifact directory (overrides the configuration file)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// How `consolidate --register` produces the unified artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum RenderFormat {
    /// Plain-text document listing the aggregated lines
    Text,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the number the next voucher will get
    Next,
    /// List registered vouchers
    List(ListArgs),
    /// Show one voucher and its items
    Show(ShowArgs),
    /// Change the status of one or more vouchers
    SetStatus(SetStatusArgs),
    /// Register artifacts found in the directory but missing from the index
    Reindex,
    /// Report drift between the index and the files on disk
    Verify,
    /// Aggregate the items of several vouchers
    Consolidate(ConsolidateArgs),
    /// Merge documents into one file
    Merge(MergeArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only vouchers with this status
    #[arg(short, long)]
    pub status: Option<Status>,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    pub number: u64,
}

#[derive(Args, Debug)]
pub struct SetStatusArgs {
    pub status: Status,
    #[arg(required = true)]
    pub numbers: Vec<u64>,
}

#[derive(Args, Debug)]
pub struct ConsolidateArgs {
    #[arg(required = true)]
    pub numbers: Vec<u64>,
    /// Print the result as JSON (same as --format json)
    #[arg(long)]
    pub json: bool,
    /// Register the result as a new unified voucher
    #[arg(long)]
    pub register: bool,
    /// Render the unified voucher instead of merging the source documents
    #[arg(long, value_enum, requires = "register")]
    pub render: Option<RenderFormat>,
}

#[derive(Args, Debug)]
pub struct MergeArgs {
    #[arg(short, long)]
    pub output: PathBuf,
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,
}
