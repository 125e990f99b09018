//! Command-line interface for genmerge.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **merge**: Merge sorted, range-annotated partitions into one stream
//! - **header**: Print the header of the merged stream and exit
//!
//! ## Usage
//!
//! ```text
//! # Merge a set of partition files
//! genmerge merge chr1.tsv chr2.tsv.gz
//!
//! # Merge the partitions listed in a JSON manifest
//! genmerge merge --manifest partitions.json
//!
//! # Jump to a coordinate before streaming
//! genmerge merge --manifest partitions.json --seek chr2:100000
//!
//! # Keep the synthetic progress rows in the output
//! genmerge merge a.tsv b.tsv --progress
//! ```

use clap::{Parser, Subcommand};

pub mod header;
pub mod merge;

#[derive(Parser)]
#[command(name = "genmerge")]
#[command(version)]
#[command(about = "Merge coordinate-sorted genomic partitions into one stream")]
#[command(
    long_about = "genmerge merges many coordinate-sorted, range-annotated tabular partitions into a single globally sorted stream.\n\nPartitions are opened lazily when the merge reaches their declared range and closed as soon as they are exhausted, so merging thousands of partitions never holds more than the overlapping few open."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Merge sorted partitions into one stream
    Merge(merge::MergeArgs),

    /// Print the merged stream's header
    Header(header::HeaderArgs),
}
