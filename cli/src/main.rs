mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::{download, run as run_cmd};

pub fn run() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match &cli.command {
        Commands::Run(args) => run_cmd::run(&cli, args),
        Commands::Download(args) => download::run(&cli, args),
    }
}

fn main() -> anyhow::Result<()> { run() }
