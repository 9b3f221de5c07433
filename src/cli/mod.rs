//! Command-line interface for layered-config
//!
//! Provides `show` and `file` subcommands sharing one set of location options.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use layered_config::ConfigLoader;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod file;
mod show;
mod utils;

/// Inspect layered YAML configuration and environment overrides
#[derive(Parser)]
#[command(name = "layered-config")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the merged configuration for one or more file stems
    Show(show::ShowArgs),

    /// Print the file a name resolves to
    File(file::FileArgs),
}

/// Where to look and which environment to apply
#[derive(Args)]
pub struct LocationArgs {
    /// Directory searched first, relative to --root
    #[arg(short = 'd', long, value_name = "DIR", default_value = "")]
    pub dir: String,

    /// Fallback parent; <ROOT>/<PARENT>/<DIR> is searched second
    #[arg(short = 'p', long, value_name = "PARENT", default_value = "")]
    pub parent: String,

    /// Environment suffix for overrides
    #[arg(short = 'e', long, value_name = "ENV", env = "ENV", default_value = "")]
    pub env: String,

    /// Base directory for the search path
    #[arg(long, value_name = "PATH", default_value = ".")]
    pub root: PathBuf,
}

impl LocationArgs {
    pub fn loader(&self) -> ConfigLoader {
        ConfigLoader::new()
            .root(&self.root)
            .parent_path(&self.parent)
            .directory(&self.dir)
            .environment(&self.env)
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Wire verbose flag to the tracing log level.
    // RUST_LOG in the environment always takes precedence; --verbose falls back to DEBUG.
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    match cli.command {
        Commands::Show(args) => show::run(args),
        Commands::File(args) => file::run(args),
    }
}
