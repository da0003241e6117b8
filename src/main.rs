mod cli;
mod config;
mod error;
mod logging;
mod pbx;
mod tunnel;

use std::path::PathBuf;

use clap::Parser;
use cli::Commands;
use config::SiteConfig;

#[derive(Parser)]
#[command(name = "auer-cfg")]
#[command(version, about = "Manage the Auerswald PBX config templates")]
struct Cli {
    /// Debug output.
    #[arg(long, global = true)]
    debug: bool,

    /// Site configuration file (defaults to auerswald.cfg.yaml next to the binary).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    logging::init(cli.debug);

    let config = SiteConfig::load(cli.config.as_deref())?;
    let report = cli::run(&config, &cli.command)?;
    tracing::debug!(changed = report.changed, "command complete");
    print!("{}", cli::render::render(&report));

    Ok(())
}
