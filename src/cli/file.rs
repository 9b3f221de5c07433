//! File command implementation

use anyhow::{Context, Result};
use clap::Args;
use std::io::Write;

use super::LocationArgs;
use layered_config::utils::display_path;

#[derive(Args)]
pub struct FileArgs {
    /// File name to resolve, e.g. `token.txt`
    #[arg(value_name = "NAME")]
    pub name: String,

    #[command(flatten)]
    pub location: LocationArgs,

    /// Write the bytes untouched instead of decoding text
    #[arg(long)]
    pub raw: bool,

    /// Print the resolved path instead of the contents
    #[arg(long)]
    pub path_only: bool,
}

pub fn run(args: FileArgs) -> Result<()> {
    let loader = args.location.loader();

    if args.path_only {
        let path = loader.resolve_file(&args.name)?;
        println!("{}", display_path(&path));
        return Ok(());
    }

    if args.raw {
        let bytes = loader.load_credentials(&args.name)?;
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&bytes).context("Failed writing file contents")?;
        stdout.flush()?;
    } else {
        print!("{}", loader.load_text(&args.name)?);
    }

    Ok(())
}
