use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crescere::manager::Manager;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    /// Culture directory with `data.csv` and an optional `analysis.toml`.
    #[arg(long)]
    culture_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Exponential-phase kinetics per replicate culture and per clone.
    Phase {
        /// Start of the exponential phase (h); prompted for when omitted.
        #[arg(long, requires = "end")]
        start: Option<i64>,

        /// End of the exponential phase (h); prompted for when omitted.
        #[arg(long, requires = "start")]
        end: Option<i64>,
    },

    /// Interval-to-interval kinetics over the whole culture.
    Interval,

    /// Replicate-collapsed summary per clone and time point.
    Grouped,
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    let mgr = Manager::new(args.culture_dir).context("failed to construct mgr")?;

    match args.command {
        Command::Phase { start, end } => mgr.run_phase(start.zip(end))?,
        Command::Interval => mgr.run_interval()?,
        Command::Grouped => mgr.run_grouped()?,
    }

    Ok(())
}
