//! # genmerge
//!
//! A library for merging coordinate-sorted genomic tabular partitions into
//! one globally sorted stream.
//!
//! Large genomic tables are usually stored as many partitions, each sorted
//! by chromosome and position and each annotated with the genomic range it
//! covers. A query spanning the whole table needs a single sorted stream
//! over all of them, but opening thousands of file handles up front is
//! wasteful and often impossible.
//!
//! `genmerge` solves this with a range-aware k-way merge: partitions are
//! opened only when the merge frontier reaches their declared start and
//! closed the moment they are exhausted, so the number of open partitions
//! tracks the number of overlapping ranges rather than the partition
//! count. Synthetic progress rows keep consumers responsive across long
//! gaps between ranges, and the whole merged stream is itself seekable.
//!
//! ## Features
//!
//! - **Pluggable chromosome ordering**: lexicographic, numerical, and
//!   unprefixed orderings ship built in, and unknown contigs discovered
//!   mid-stream are slotted in on the fly
//! - **Lazy open, eager close**: resource use is bounded by range overlap
//! - **Seekable output**: a merge can be re-seeded at any coordinate,
//!   skipping partitions whose range ends before it
//! - **Driver seam**: any storage format can participate by implementing
//!   one small cursor trait; a plain/gzip text driver is included
//!
//! ## Example
//!
//! ```rust,no_run
//! use genmerge::{GenomicRange, RangeMergeEngine, SourceRef, TextResolver};
//!
//! let sources = vec![
//!     SourceRef::new("part1.tsv").with_range(GenomicRange::new("chr1", 0, "chr1", 100_000)),
//!     SourceRef::new("part2.tsv").with_range(GenomicRange::new("chr1", 90_000, "chr2", 50_000)),
//! ];
//!
//! let mut engine = RangeMergeEngine::new(sources, Box::new(TextResolver::default())).unwrap();
//! println!("{}", engine.header().unwrap());
//! while let Some(row) = engine.next_row().unwrap() {
//!     if !row.is_progress {
//!         println!("{row}");
//!     }
//! }
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Chromosome ordering, the contig cache, and the genomic row
//! - [`source`]: Partition references, the cursor contract, and drivers
//! - [`merge`]: The range-aware streaming merge engine
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod core;
pub mod error;
pub mod merge;
pub mod source;

// Re-export commonly used types for convenience
pub use core::{ContigCache, ContigScheme, Row};
pub use error::{MergeError, Result};
pub use merge::RangeMergeEngine;
pub use source::{
    CursorResolver, FilterCursor, GenomicCursor, GenomicRange, RowPredicate, SelectCursor,
    SourceRef, TextCursor, TextResolver,
};
