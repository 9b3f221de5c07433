//! Show command implementation

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use super::utils::split_stems;
use super::LocationArgs;
use layered_config::utils::display_path;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Yaml,
    Json,
}

#[derive(Args)]
pub struct ShowArgs {
    /// File stems to merge, base first (comma-separated or repeated)
    #[arg(value_name = "STEM", required = true, num_args = 1..)]
    pub stems: Vec<String>,

    #[command(flatten)]
    pub location: LocationArgs,

    /// Output format for the flattened configuration
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub format: OutputFormat,

    /// Print only the value of this dotted key
    #[arg(short = 'g', long, value_name = "KEY")]
    pub get: Option<String>,

    /// List the files that were merged (to stderr)
    #[arg(long)]
    pub sources: bool,
}

pub fn run(args: ShowArgs) -> Result<()> {
    let stems = split_stems(&args.stems);
    if stems.is_empty() {
        anyhow::bail!("At least one file stem must be specified");
    }

    let loader = args.location.loader();

    if args.sources {
        let ctx = loader.merge(&stems)?;
        eprintln!("Sources:");
        for path in ctx.sources() {
            eprintln!("  {}", display_path(path));
        }
    }

    let map = loader.load_map(&stems)?;

    if let Some(key) = args.get.as_deref() {
        let value =
            map.get(key).with_context(|| format!("Key not found in configuration: {key}"))?;
        println!("{}", value);
        return Ok(());
    }

    let rendered = match args.format {
        OutputFormat::Yaml => serde_yaml::to_string(&map)?,
        OutputFormat::Json => serde_json::to_string_pretty(&map)? + "\n",
    };
    print!("{}", rendered);

    Ok(())
}
