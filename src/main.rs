//! layered-config: inspect what a service would load
//!
//! Prints the merged configuration for a set of stems, or the raw file a name
//! resolves to, using the same search path and environment rules as the library.

use anyhow::Result;

mod cli;

fn main() -> Result<()> {
    cli::run()
}
