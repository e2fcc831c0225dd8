//! plantlink - PlantUML links, renders and a live-reloading preview page.

mod cli;
mod config;
mod encode;
mod live;
mod logger;
mod render;
mod utils;
mod watch;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::Config;

fn main() {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    if let Err(e) = run(&cli) {
        log!("error"; "{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    if let Commands::Version = cli.command {
        cli::print_version();
        return Ok(());
    }

    let config = Config::load(cli)?;
    if let Some(path) = &config.config_path {
        debug!("config"; "using {}", path.display());
    }

    match &cli.command {
        Commands::Build { args } => cli::build::build(&config, args),
        Commands::Serve { args } => cli::serve::serve(&config, args),
        Commands::Version => Ok(()),
    }
}
