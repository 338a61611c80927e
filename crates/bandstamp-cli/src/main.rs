mod commands;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bandstamp", about = "Multi-band frame alignment and stamp extraction")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show FITS frame metadata and coordinate system
    Info(commands::info::InfoArgs),
    /// Print per-band pixel shifts onto the reference grid
    Shift(commands::shift::ShiftArgs),
    /// Align every band and write stamps
    Stamp(commands::stamp::StampArgs),
    /// Print or save a default stamp config
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Info(args) => commands::info::run(args),
        Commands::Shift(args) => commands::shift::run(args),
        Commands::Stamp(args) => commands::stamp::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
