//! vbroute-cli: command-line inspector for cluster configurations.
//!
//! Loads config documents from disk and answers routing questions about
//! them: where a key lives, who to try after a rejection, what changed
//! between two revisions. Can also generate synthetic configs for tests.

mod commands;
mod format;

use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use colored::Colorize;

use crate::commands::{Command, Context};
use crate::format::OutputFormat;

/// When to colorize output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Let the terminal decide.
    Auto,
    Always,
    Never,
}

/// Inspect and generate cluster configurations.
#[derive(Parser)]
#[command(name = "vbroute-cli", version, about)]
struct Args {
    /// Output format.
    #[arg(long, value_enum, global = true, env = "VBROUTE_FORMAT", default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// When to use colors.
    #[arg(long, value_enum, global = true, env = "VBROUTE_COLOR", default_value_t = ColorChoice::Auto)]
    color: ColorChoice,

    /// Disable colors (same as `--color never`).
    #[arg(long, global = true)]
    no_color: bool,

    /// Host assumed for nodes that do not report their own hostname.
    #[arg(long, global = true, env = "VBROUTE_SOURCE_HOST", default_value = vbroute::DEFAULT_SOURCE_HOST)]
    source_host: String,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    fn color_override(&self) -> Option<bool> {
        if self.no_color || self.format == OutputFormat::Json {
            return Some(false);
        }
        match self.color {
            ColorChoice::Auto => None,
            ColorChoice::Always => Some(true),
            ColorChoice::Never => Some(false),
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vbroute=warn".into()),
        )
        .init();

    let args = Args::parse();
    if let Some(enabled) = args.color_override() {
        colored::control::set_override(enabled);
    }

    let ctx = Context {
        format: args.format,
        source_host: args.source_host.clone(),
    };
    match args.command.execute(&ctx) {
        Ok(out) => {
            println!("{out}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", format!("error: {e}").red());
            ExitCode::FAILURE
        }
    }
}
