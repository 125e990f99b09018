use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod core;
mod error;
mod merge;
mod source;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("genmerge=debug,info")
    } else {
        EnvFilter::new("genmerge=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        cli::Commands::Merge(args) => {
            cli::merge::run(&args, cli.verbose)?;
        }
        cli::Commands::Header(args) => {
            cli::header::run(&args, cli.verbose)?;
        }
    }

    Ok(())
}
