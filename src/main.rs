mod cli;
mod commands;
mod config;
mod progress;
mod slack;
mod ui;

use anyhow::Result;
use clap::Parser;
use cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        // HTTP internals are noise unless something breaks
        .filter_module("ureq", log::LevelFilter::Warn)
        .filter_module("ureq_proto", log::LevelFilter::Warn)
        .format_timestamp(None)
        .init();

    commands::sync::run(&cli)
}
