//! The genomic row value type.

use std::fmt;

use crate::error::MergeError;

/// Payload column rendered for synthetic progress rows.
const PROGRESS_PAYLOAD: &str = "progress";

/// One row of genomically sorted tabular data.
///
/// A row is `(contig, position, remaining columns)`. Rows are plain value
/// objects produced one per pull step; they carry no identity beyond their
/// content. The total order over rows comes from a
/// [`ContigCache`](crate::core::ContigCache) comparator, not from the row
/// itself.
///
/// The `is_progress` flag marks the synthetic variant the merge engine
/// emits to report its frontier without opening partitions; see
/// [`RangeMergeEngine`](crate::merge::RangeMergeEngine).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Contig name
    pub chr: String,
    /// Position within the contig
    pub pos: i64,
    /// Remaining tab-separated columns, empty when the row has only the
    /// two coordinate columns
    pub rest: String,
    /// True for synthetic progress rows
    pub is_progress: bool,
}

impl Row {
    /// Build a data row from parts.
    #[must_use]
    pub fn new(chr: impl Into<String>, pos: i64, rest: impl Into<String>) -> Self {
        Self {
            chr: chr.into(),
            pos,
            rest: rest.into(),
            is_progress: false,
        }
    }

    /// The synthetic progress row for a frontier coordinate.
    #[must_use]
    pub fn progress(chr: impl Into<String>, pos: i64) -> Self {
        Self {
            chr: chr.into(),
            pos,
            rest: PROGRESS_PAYLOAD.to_string(),
            is_progress: true,
        }
    }

    /// Parse a tab-separated data line: column 0 is the contig name,
    /// column 1 a signed integer position, the remainder opaque payload.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::MalformedRow`] when the line has fewer than
    /// two columns or the position does not parse as an integer.
    pub fn from_line(line: &str) -> Result<Self, MergeError> {
        let (chr, after) = line.split_once('\t').ok_or_else(|| malformed(line, "fewer than 2 columns"))?;
        let (pos_str, rest) = match after.split_once('\t') {
            Some((p, r)) => (p, r),
            None => (after, ""),
        };
        // i64 parsing already tolerates a leading sign
        let pos: i64 = pos_str
            .parse()
            .map_err(|_| malformed(line, "position is not an integer"))?;
        Ok(Self::new(chr, pos, rest))
    }

    /// All columns of the row, coordinate columns included.
    #[must_use]
    pub fn columns(&self) -> Vec<String> {
        let mut cols = vec![self.chr.clone(), self.pos.to_string()];
        if !self.rest.is_empty() {
            cols.extend(self.rest.split('\t').map(String::from));
        }
        cols
    }

    /// Number of columns, coordinate columns included.
    #[must_use]
    pub fn num_columns(&self) -> usize {
        if self.rest.is_empty() {
            2
        } else {
            2 + self.rest.split('\t').count()
        }
    }

    /// Project the row onto a subset of its columns.
    ///
    /// `cols` are full-row indices; the coordinate columns (0 and 1) are
    /// always retained and indices referring to them are ignored, so a
    /// projected row is still a genomic row.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::ColumnOutOfRange`] when an index points past
    /// the last column.
    pub fn project(&self, cols: &[usize]) -> Result<Self, MergeError> {
        let payload: Vec<&str> = if self.rest.is_empty() {
            Vec::new()
        } else {
            self.rest.split('\t').collect()
        };
        let mut kept = Vec::new();
        for &c in cols {
            if c < 2 {
                continue;
            }
            let col = payload
                .get(c - 2)
                .ok_or(MergeError::ColumnOutOfRange {
                    index: c,
                    columns: payload.len() + 2,
                })?;
            kept.push(*col);
        }
        Ok(Self {
            chr: self.chr.clone(),
            pos: self.pos,
            rest: kept.join("\t"),
            is_progress: self.is_progress,
        })
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rest.is_empty() {
            write!(f, "{}\t{}", self.chr, self.pos)
        } else {
            write!(f, "{}\t{}\t{}", self.chr, self.pos, self.rest)
        }
    }
}

fn malformed(line: &str, msg: &str) -> MergeError {
    MergeError::MalformedRow {
        locator: String::new(),
        msg: format!("{msg}: '{line}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_line() {
        let row = Row::from_line("chr1\t12345\tA\tB").unwrap();
        assert_eq!(row.chr, "chr1");
        assert_eq!(row.pos, 12345);
        assert_eq!(row.rest, "A\tB");
        assert!(!row.is_progress);
        assert_eq!(row.to_string(), "chr1\t12345\tA\tB");
    }

    #[test]
    fn test_from_line_two_columns_only() {
        let row = Row::from_line("chr2\t7").unwrap();
        assert_eq!(row.rest, "");
        assert_eq!(row.num_columns(), 2);
        assert_eq!(row.to_string(), "chr2\t7");
    }

    #[test]
    fn test_sign_tolerant_position() {
        assert_eq!(Row::from_line("chr1\t+5\tx").unwrap().pos, 5);
        assert_eq!(Row::from_line("chr1\t-1\tx").unwrap().pos, -1);
    }

    #[test]
    fn test_malformed_lines() {
        assert!(matches!(
            Row::from_line("justonecolumn"),
            Err(MergeError::MalformedRow { .. })
        ));
        assert!(matches!(
            Row::from_line("chr1\tnotanumber\tx"),
            Err(MergeError::MalformedRow { .. })
        ));
    }

    #[test]
    fn test_progress_row() {
        let row = Row::progress("chr1", 42);
        assert!(row.is_progress);
        assert_eq!(row.to_string(), "chr1\t42\tprogress");
    }

    #[test]
    fn test_project() {
        let row = Row::from_line("chr1\t10\ta\tb\tc").unwrap();
        let picked = row.project(&[0, 1, 4, 2]).unwrap();
        assert_eq!(picked.to_string(), "chr1\t10\tc\ta");
        assert!(matches!(
            row.project(&[9]),
            Err(MergeError::ColumnOutOfRange { index: 9, .. })
        ));
    }
}
