use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "threadcast")]
#[command(about = "Schedule text-message conversation scripts into video render plans.")]
pub struct Args {
    /// Path to config TOML (defaults to ./threadcast.toml if present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build a schedule from a script
    Schedule(ScheduleCmd),
    /// Print the resolved message stream as JSON
    Resolve(ResolveCmd),
    /// Print the effective default config as TOML and exit
    PrintDefaultConfig,
}

#[derive(Debug, Parser)]
pub struct ScheduleCmd {
    /// Script file path, or '-' for stdin
    pub input: String,

    /// Output file path (optional)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub to: OutputFormat,

    /// Force script format (otherwise inferred from extension or content)
    #[arg(long, value_enum)]
    pub from: Option<ScriptFormat>,

    /// Write to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,

    /// Allow overwriting output file
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Debug, Parser)]
pub struct ResolveCmd {
    /// Script file path, or '-' for stdin
    pub input: String,

    /// Force script format
    #[arg(long, value_enum)]
    pub from: Option<ScriptFormat>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ScriptFormat {
    Txt,
    Json,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Txt,
    Srt,
    Tsv,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "schedule.json",
            OutputFormat::Txt => "schedule.txt",
            OutputFormat::Srt => "srt",
            OutputFormat::Tsv => "tsv",
        }
    }
}
