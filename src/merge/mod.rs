//! The k-way range-aware merge.
//!
//! [`RangeMergeEngine`] turns many coordinate-sorted, range-annotated
//! partitions into one globally sorted stream, opening partitions only
//! when the merge frontier reaches their declared start and closing them
//! the moment they are exhausted or out of range.

pub(crate) mod heap;
pub mod range;

pub use range::RangeMergeEngine;
