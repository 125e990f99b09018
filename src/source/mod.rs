//! Partition references, the cursor contract and concrete drivers.
//!
//! A [`SourceRef`] describes where a partition lives and what genomic range
//! it declares; a [`GenomicCursor`] is the pull-iterator a driver
//! implements for one open partition; a [`CursorResolver`] is the seam
//! between the two. The only driver shipped here is the line-oriented
//! [`text`] one - indexed archives and database-backed partitions plug in
//! through the same resolver seam.

pub mod cursor;
pub mod reference;
pub mod text;

pub use cursor::{CursorResolver, FilterCursor, GenomicCursor, RowPredicate, SelectCursor};
pub use reference::{GenomicRange, SourceRef};
pub use text::{TextCursor, TextResolver};

use crate::error::Result;

/// Resolve every reference to an unopened cursor, with bounded parallelism.
///
/// Connecting to remote or slow partitions is independent per partition, so
/// callers that want eager construction can fan resolution out over up to
/// `parallelism` threads. Order of the returned cursors matches the input;
/// resolution order is irrelevant to merge correctness. This concurrency is
/// confined to construction - consumption stays single-threaded.
///
/// # Errors
///
/// The first resolution failure is returned; there is no per-partition
/// retry.
pub fn resolve_all(
    sources: &[SourceRef],
    resolver: &(dyn CursorResolver + Sync),
    parallelism: usize,
) -> Result<Vec<Box<dyn GenomicCursor>>> {
    let parallelism = parallelism.max(1);
    if parallelism == 1 || sources.len() <= 1 {
        return sources.iter().map(|s| s.resolve(resolver)).collect();
    }

    let chunk = sources.len().div_ceil(parallelism);
    std::thread::scope(|scope| {
        let handles: Vec<_> = sources
            .chunks(chunk)
            .map(|slice| {
                scope.spawn(move || {
                    slice
                        .iter()
                        .map(|s| s.resolve(resolver))
                        .collect::<Result<Vec<_>>>()
                })
            })
            .collect();
        let mut cursors = Vec::with_capacity(sources.len());
        for handle in handles {
            match handle.join() {
                Ok(resolved) => cursors.extend(resolved?),
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
        Ok(cursors)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingResolver {
        resolved: AtomicUsize,
    }

    impl CursorResolver for CountingResolver {
        fn resolve(&self, source: &SourceRef) -> Result<Box<dyn GenomicCursor>> {
            self.resolved.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(TextCursor::new(&source.locator)))
        }
    }

    #[test]
    fn test_resolve_all_preserves_order() {
        let sources: Vec<SourceRef> =
            (0..7).map(|i| SourceRef::new(format!("p{i}.tsv"))).collect();
        let resolver = CountingResolver {
            resolved: AtomicUsize::new(0),
        };
        let cursors = resolve_all(&sources, &resolver, 3).unwrap();
        assert_eq!(cursors.len(), 7);
        assert_eq!(resolver.resolved.load(Ordering::SeqCst), 7);
    }
}
