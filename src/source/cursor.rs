//! The partition cursor contract and its generic adapters.

use std::sync::Arc;

use crate::core::Row;
use crate::error::Result;
use crate::source::SourceRef;

/// Shared row predicate used by engine-level filtering.
pub type RowPredicate = Arc<dyn Fn(&Row) -> bool + Send + Sync>;

/// Seekable, closeable pull-cursor over one genomically sorted partition.
///
/// A cursor is a single-owner handle bound to exactly one underlying
/// resource. It starts unopened; implementations open lazily on the first
/// [`seek`](Self::seek) or [`next_row`](Self::next_row). [`close`](Self::close)
/// is terminal and idempotent and must eventually be called for every
/// cursor that was opened (dropping the owner counts, via `Drop` impls).
///
/// The pushdown hooks are the sole extension point toward format-specific
/// drivers: each returns whether the driver accepted responsibility for the
/// operation, and the default answer is "not accepted", meaning the caller
/// applies the operation itself (see [`FilterCursor`] and [`SelectCursor`]).
///
/// Rows must come back in ascending `(contig order, position)` within the
/// cursor's own stream; the merge engine does not re-validate this.
pub trait GenomicCursor: Send {
    /// Tab-separated column names describing the data.
    fn header(&mut self) -> Result<String>;

    /// Position the cursor at the first row at or after `(chr, pos)`.
    /// Returns true iff at least one such row may exist.
    fn seek(&mut self, chr: &str, pos: i64) -> Result<bool>;

    /// Pull the next row, or `None` when the partition is exhausted.
    fn next_row(&mut self) -> Result<Option<Row>>;

    /// Release the underlying resource. Idempotent.
    fn close(&mut self);

    /// Offer a filter expression to the driver.
    fn pushdown_filter(&mut self, _expr: &str) -> bool {
        false
    }

    /// Offer a column selection to the driver. Indices are full-row
    /// column indices.
    fn pushdown_select(&mut self, _cols: &[usize]) -> bool {
        false
    }

    /// Offer a row-count limit to the driver.
    fn pushdown_limit(&mut self, _limit: u64) -> bool {
        false
    }
}

/// Driver-resolution callback: turns a [`SourceRef`] into an unopened
/// cursor. Concrete drivers (delimited text, indexed archives, database
/// partitions, in-process tables) live behind this seam.
pub trait CursorResolver {
    /// Resolve a partition reference to an unopened cursor.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::ResourceNotFound`](crate::error::MergeError::ResourceNotFound)
    /// when the locator cannot be resolved to a driver.
    fn resolve(&self, source: &SourceRef) -> Result<Box<dyn GenomicCursor>>;
}

/// Adapter applying a row predicate on top of a cursor whose driver did not
/// accept a filter pushdown.
pub struct FilterCursor {
    inner: Box<dyn GenomicCursor>,
    predicate: RowPredicate,
}

impl FilterCursor {
    #[must_use]
    pub fn new(inner: Box<dyn GenomicCursor>, predicate: RowPredicate) -> Self {
        Self { inner, predicate }
    }
}

impl GenomicCursor for FilterCursor {
    fn header(&mut self) -> Result<String> {
        self.inner.header()
    }

    fn seek(&mut self, chr: &str, pos: i64) -> Result<bool> {
        self.inner.seek(chr, pos)
    }

    fn next_row(&mut self) -> Result<Option<Row>> {
        while let Some(row) = self.inner.next_row()? {
            if (self.predicate)(&row) {
                return Ok(Some(row));
            }
        }
        Ok(None)
    }

    fn close(&mut self) {
        self.inner.close();
    }
}

/// Adapter projecting rows onto a column subset on top of a cursor whose
/// driver did not accept a select pushdown.
pub struct SelectCursor {
    inner: Box<dyn GenomicCursor>,
    cols: Vec<usize>,
}

impl SelectCursor {
    #[must_use]
    pub fn new(inner: Box<dyn GenomicCursor>, cols: Vec<usize>) -> Self {
        Self { inner, cols }
    }
}

impl GenomicCursor for SelectCursor {
    fn header(&mut self) -> Result<String> {
        let header = self.inner.header()?;
        let all: Vec<&str> = header.split('\t').collect();
        let mut kept: Vec<&str> = all.iter().take(2).copied().collect();
        for &c in &self.cols {
            if c >= 2 {
                if let Some(name) = all.get(c) {
                    kept.push(name);
                }
            }
        }
        Ok(kept.join("\t"))
    }

    fn seek(&mut self, chr: &str, pos: i64) -> Result<bool> {
        self.inner.seek(chr, pos)
    }

    fn next_row(&mut self) -> Result<Option<Row>> {
        match self.inner.next_row()? {
            Some(row) => Ok(Some(row.project(&self.cols)?)),
            None => Ok(None),
        }
    }

    fn close(&mut self) {
        self.inner.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Canned in-memory cursor.
    struct VecCursor {
        rows: Vec<Row>,
        at: usize,
    }

    impl GenomicCursor for VecCursor {
        fn header(&mut self) -> Result<String> {
            Ok("chrom\tpos\ta\tb".to_string())
        }

        fn seek(&mut self, _chr: &str, _pos: i64) -> Result<bool> {
            Ok(true)
        }

        fn next_row(&mut self) -> Result<Option<Row>> {
            let row = self.rows.get(self.at).cloned();
            self.at += 1;
            Ok(row)
        }

        fn close(&mut self) {}
    }

    fn rows() -> Box<dyn GenomicCursor> {
        Box::new(VecCursor {
            rows: vec![
                Row::new("chr1", 1, "x\t1"),
                Row::new("chr1", 2, "y\t2"),
                Row::new("chr1", 3, "x\t3"),
            ],
            at: 0,
        })
    }

    #[test]
    fn test_pushdowns_default_to_not_accepted() {
        let mut cursor = rows();
        assert!(!cursor.pushdown_filter("a = 'x'"));
        assert!(!cursor.pushdown_select(&[0, 1, 2]));
        assert!(!cursor.pushdown_limit(10));
    }

    #[test]
    fn test_filter_cursor() {
        let pred: RowPredicate = Arc::new(|r: &Row| r.rest.starts_with('x'));
        let mut cursor = FilterCursor::new(rows(), pred);
        assert_eq!(cursor.next_row().unwrap().unwrap().pos, 1);
        assert_eq!(cursor.next_row().unwrap().unwrap().pos, 3);
        assert!(cursor.next_row().unwrap().is_none());
    }

    #[test]
    fn test_select_cursor() {
        let mut cursor = SelectCursor::new(rows(), vec![3]);
        assert_eq!(cursor.header().unwrap(), "chrom\tpos\tb");
        assert_eq!(cursor.next_row().unwrap().unwrap().to_string(), "chr1\t1\t1");
    }
}
