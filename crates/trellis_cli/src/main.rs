//! Trellis CLI — render and check layouts from the command line.
//!
//! Provides `trellis render` for rendering a configured layout against JSON
//! data, and `trellis check` for compiling every layout in a project.

#![warn(missing_docs)]

mod check;
mod project;
mod render;

use std::process;

use clap::{Parser, Subcommand};
use log::LevelFilter;

/// Trellis — cached layout rendering.
#[derive(Parser, Debug)]
#[command(name = "trellis", version, about = "Trellis layout renderer")]
pub struct Cli {
    /// Only print errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print debug logs and extra status lines.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a `trellis.toml` file or the directory containing one.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// What to do.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a configured layout to stdout.
    Render(RenderArgs),
    /// Compile layouts and report any errors.
    Check(CheckArgs),
}

/// Arguments for the `trellis render` subcommand.
#[derive(Parser, Debug)]
pub struct RenderArgs {
    /// Layout name from `trellis.toml`.
    pub layout: String,

    /// JSON file holding the render data (a top-level object).
    #[arg(short, long)]
    pub data: Option<String>,

    /// Render from the layout's development source, bypassing the cache.
    #[arg(long)]
    pub dev: bool,

    /// Render this many times, reusing the cached artifact.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub repeat: u32,

    /// Print cache statistics to stderr afterwards.
    #[arg(long)]
    pub stats: bool,
}

/// Arguments for the `trellis check` subcommand.
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Layout names to check. Checks every configured layout if omitted.
    pub layouts: Vec<String>,
}

/// Flags shared by every subcommand.
pub struct GlobalArgs {
    /// `--quiet` was given.
    pub quiet: bool,
    /// `--verbose` was given.
    pub verbose: bool,
    /// The `--config` path, if any.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Render(ref args) => render::run(args, &global),
        Command::Check(ref args) => check::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs the logger. `RUST_LOG` overrides the level implied by the flags.
fn init_logging(quiet: bool, verbose: bool) {
    env_logger::Builder::new()
        .filter_level(log_level(quiet, verbose))
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn log_level(quiet: bool, verbose: bool) -> LevelFilter {
    if quiet {
        LevelFilter::Error
    } else if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    }
}
