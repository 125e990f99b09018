//! Core data types for ordered genomic streams.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`ContigScheme`]: immutable contig name <-> id <-> rank tables, with
//!   canonical human instances
//! - [`ContigCache`]: runtime contig discovery on a private scheme copy,
//!   plus the canonical coordinate comparator
//! - [`Row`]: the `(contig, position, payload)` value type every cursor
//!   and the merge engine produce
//!
//! ## Contig Naming
//!
//! Different data sources use different naming conventions:
//!
//! | Source | Chromosome 1 | Mitochondrial |
//! |--------|--------------|---------------|
//! | UCSC   | chr1         | chrM          |
//! | NCBI   | 1            | MT            |
//!
//! The cache resolves both spellings to the same internal id; ordering is
//! defined by the scheme's ranks, never by the spelling.

pub mod cache;
pub mod row;
pub mod scheme;

pub use cache::ContigCache;
pub use row::Row;
pub use scheme::ContigScheme;
