#![doc = include_str!("../README.md")]

mod commands;
mod config;
mod telemetry;

use clap::Parser;
use config::CliArgs;

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();

    telemetry::init_tracing()?;

    let mut out = std::io::stdout().lock();
    commands::run(&args, &mut out)
}
