use std::path::PathBuf;

/// County vote/COVID linkage CLI (argument schema only)
#[derive(clap::Parser, Debug)]
#[command(name = "covote", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Link all sources in an input directory into the canonical table
    Run(RunArgs),

    /// Fetch the public feeds into an input directory
    Download(DownloadArgs),
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// Input directory: cell dumps from the scrape collaborator plus the
    /// downloaded feeds (see `covote download`)
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub input: PathBuf,

    /// Output directory for the linked tables, defaults to "./out"
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Last reporting date to keep (YYYY-MM-DD), defaults to 2020-12-01
    #[arg(long)]
    pub cutoff: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct DownloadArgs {
    /// Directory to fetch the case, population, density, and boundary
    /// feeds into
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub output: PathBuf,

    /// Re-download feeds that already exist
    #[arg(long)]
    pub force: bool,
}
