use clap::Args;

use crate::cli::merge::{build_engine, SourceArgs};

#[derive(Args)]
pub struct HeaderArgs {
    #[command(flatten)]
    pub sources: SourceArgs,
}

/// Execute the header subcommand: print the merged stream's header line
/// without streaming any data.
///
/// # Errors
///
/// Returns an error when no partition can be opened.
pub fn run(args: &HeaderArgs, verbose: bool) -> anyhow::Result<()> {
    let mut engine = build_engine(&args.sources)?;
    let header = engine.header()?;
    engine.close();
    println!("{header}");
    if verbose {
        eprintln!("Header has {} columns", header.split('\t').count());
    }
    Ok(())
}
