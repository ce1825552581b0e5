use anyhow::Result;
use clap::Parser;

use threadcast::config;

mod cli;
mod pipeline;

fn main() -> Result<()> {
    let args = cli::Args::parse();

    let cfg = config::Config::load(args.config.as_deref())?;
    config::init_tracing(&cfg.logging, args.log_level.as_deref())?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "threadcast starting");

    match args.command {
        cli::Command::Schedule(cmd) => pipeline::run_schedule(cmd, &cfg),
        cli::Command::Resolve(cmd) => pipeline::run_resolve(cmd),
        cli::Command::PrintDefaultConfig => {
            let s = cfg.to_toml_pretty()?;
            print!("{s}");
            Ok(())
        }
    }
}
