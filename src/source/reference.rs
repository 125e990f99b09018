//! Partition references: the descriptions of data partitions handed to the
//! merge engine by the dictionary layer.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::ContigCache;
use crate::error::Result;
use crate::source::cursor::{CursorResolver, GenomicCursor};

/// Inclusive genomic bound `[start, stop]` declared for a partition.
///
/// The bound is used purely for pruning - to decide whether the partition
/// *can* contain rows in a queried range. It is never applied as a filter
/// on the rows the partition emits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenomicRange {
    pub start_chr: String,
    pub start_pos: i64,
    pub stop_chr: String,
    pub stop_pos: i64,
}

impl GenomicRange {
    #[must_use]
    pub fn new(
        start_chr: impl Into<String>,
        start_pos: i64,
        stop_chr: impl Into<String>,
        stop_pos: i64,
    ) -> Self {
        Self {
            start_chr: start_chr.into(),
            start_pos,
            stop_chr: stop_chr.into(),
            stop_pos,
        }
    }
}

/// Reference to one logical data partition.
///
/// Describes where the partition lives (locator plus optional index and
/// reference-sequence companions), the declared genomic bound used for
/// pruning, and dictionary metadata. Immutable after construction except
/// for the display-name hint. Consumed by one
/// [`RangeMergeEngine`](crate::merge::RangeMergeEngine) instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRef {
    /// Primary locator (file path, URL, virtual-table name)
    pub locator: String,

    /// Companion index locator, when the driver needs one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,

    /// Companion reference-sequence locator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    /// Alias the dictionary assigned to this partition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    /// Declared inclusive bound, `None` when the dictionary declared none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<GenomicRange>,

    /// Dictionary tags for partition pruning. Not interpreted by the merge
    /// engine itself.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,

    /// True when a source-identifying column is already embedded in the data
    #[serde(default)]
    pub source_already_inserted: bool,

    /// Display-name hint, settable after construction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name_hint: Option<String>,
}

impl SourceRef {
    /// Reference to an unbounded partition at `locator`.
    #[must_use]
    pub fn new(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            index: None,
            reference: None,
            alias: None,
            range: None,
            tags: BTreeSet::new(),
            source_already_inserted: false,
            name_hint: None,
        }
    }

    /// Attach a declared bound.
    #[must_use]
    pub fn with_range(mut self, range: GenomicRange) -> Self {
        self.range = Some(range);
        self
    }

    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    #[must_use]
    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    #[must_use]
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = String>) -> Self {
        self.tags = tags.into_iter().collect();
        self
    }

    /// Name shown for this partition in diagnostics: the hint if set, else
    /// the alias, else the locator.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name_hint
            .as_deref()
            .or(self.alias.as_deref())
            .unwrap_or(&self.locator)
    }

    /// Set the display-name hint. The only mutation allowed after
    /// construction.
    pub fn set_name_hint(&mut self, hint: impl Into<String>) {
        self.name_hint = Some(hint.into());
    }

    /// Whether the declared bound can contain rows in
    /// `[(chr, start_pos), (chr, stop_pos)]`.
    ///
    /// Pure pruning predicate: consults only the declared bound, never
    /// opens the partition. A partition without a declared bound overlaps
    /// everything. A queried contig the cache does not know cannot overlap
    /// any declared bound.
    #[must_use]
    pub fn overlaps(&self, cache: &mut ContigCache, chr: &str, start_pos: i64, stop_pos: i64) -> bool {
        let Some(range) = &self.range else {
            return true;
        };
        let Some(chr_id) = cache.id_or_unknown(chr, false) else {
            return false;
        };
        let start_id = cache.id_or_unknown(&range.start_chr, true).unwrap_or(0);
        let stop_id = cache.id_or_unknown(&range.stop_chr, true).unwrap_or(0);
        // not (range.stop < query.start or query.stop < range.start)
        cache.compare(stop_id, range.stop_pos, chr_id, start_pos) != std::cmp::Ordering::Less
            && cache.compare(chr_id, stop_pos, start_id, range.start_pos)
                != std::cmp::Ordering::Less
    }

    /// Resolve this reference to an **unopened** cursor via the driver
    /// resolution callback. The caller (normally the merge engine) is
    /// responsible for `seek`/`next_row` and for closing.
    ///
    /// # Errors
    ///
    /// Propagates the resolver's failure; a partition that cannot be
    /// resolved aborts the merge, there is no retry here.
    pub fn resolve(&self, resolver: &dyn CursorResolver) -> Result<Box<dyn GenomicCursor>> {
        resolver.resolve(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounded(start: (&str, i64), stop: (&str, i64)) -> SourceRef {
        SourceRef::new("part.tsv").with_range(GenomicRange::new(start.0, start.1, stop.0, stop.1))
    }

    #[test]
    fn test_overlaps() {
        let mut cache = ContigCache::new();
        let sr = bounded(("chr1", 100), ("chr2", 50));
        assert!(sr.overlaps(&mut cache, "chr1", 1, 200));
        assert!(sr.overlaps(&mut cache, "chr1", 100, 100));
        assert!(sr.overlaps(&mut cache, "chr2", 1, 10));
        assert!(!sr.overlaps(&mut cache, "chr1", 1, 99));
        assert!(!sr.overlaps(&mut cache, "chr2", 51, 500));
        // lexicographic scheme: chr10 sorts between chr1 and chr2
        assert!(sr.overlaps(&mut cache, "chr10", 1, 2));
        assert!(!sr.overlaps(&mut cache, "chr3", 1, 1_000_000));
    }

    #[test]
    fn test_overlaps_unbounded_and_unknown() {
        let mut cache = ContigCache::new();
        let unbounded = SourceRef::new("any.tsv");
        assert!(unbounded.overlaps(&mut cache, "chr9", 1, 2));
        let sr = bounded(("chr1", 1), ("chr1", 10));
        assert!(!sr.overlaps(&mut cache, "contig_nobody_knows", 1, 10));
    }

    #[test]
    fn test_display_name_precedence() {
        let mut sr = SourceRef::new("/data/p1.tsv").with_alias("p1");
        assert_eq!(sr.display_name(), "p1");
        sr.set_name_hint("partition one");
        assert_eq!(sr.display_name(), "partition one");
        assert_eq!(SourceRef::new("/data/p2.tsv").display_name(), "/data/p2.tsv");
    }

    #[test]
    fn test_manifest_round_trip() {
        let sr = bounded(("chr1", 5), ("chrX", 9))
            .with_alias("a")
            .with_tags(["t1".to_string(), "t2".to_string()]);
        let json = serde_json::to_string(&sr).unwrap();
        let back: SourceRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back.locator, "part.tsv");
        assert_eq!(back.range, sr.range);
        assert_eq!(back.tags, sr.tags);
    }
}
