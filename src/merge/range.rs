//! The range-aware streaming merge engine.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::debug;

use crate::core::{ContigCache, Row};
use crate::error::{MergeError, Result};
use crate::merge::heap;
use crate::source::{
    CursorResolver, FilterCursor, GenomicCursor, RowPredicate, SelectCursor, SourceRef,
};

/// `(contig id, position)` under the engine's cache.
type Key = (usize, i64);

/// Merges many range-annotated partitions into one sorted stream while
/// keeping the minimum number of partitions open at a time.
///
/// Every source starts *Waiting* in a min-heap keyed by its declared start
/// bound. A source becomes *Active* when the merge frontier reaches its
/// start: its cursor is resolved, opened and its head row cached in a
/// second min-heap. An exhausted or out-of-range source is *Retired*: the
/// cursor is closed immediately and never reopened. At no point are more
/// cursors open than there are declared ranges overlapping the frontier.
///
/// When activation becomes mandatory (no Active row is cached, or the
/// lowest cached row is at or after the lowest Waiting start bound) the
/// engine first emits one synthetic progress row at that bound. Only after
/// the caller consumes it are all Waiting sources with exactly that start
/// bound opened in one step. This keeps an early-terminating caller
/// responsive without paying for a burst of partition opens, and emits one
/// progress row per distinct bound rather than one per source. Consumers
/// that do not want progress rows wrap the engine in a
/// [`FilterCursor`] on `!row.is_progress`.
///
/// The engine is single-threaded and pull-based: all state transitions
/// happen inside [`has_next`](Self::has_next) / [`next_row`](Self::next_row)
/// / [`seek`](Self::seek) / [`close`](Self::close). Dropping the engine
/// closes any cursors still open, but callers that can fail between pulls
/// should call `close` explicitly on their early-exit paths.
pub struct RangeMergeEngine {
    sources: Vec<SourceRef>,
    resolver: Box<dyn CursorResolver + Send>,
    cache: ContigCache,
    /// Open cursor per source; `None` while Waiting or after Retirement
    cursors: Vec<Option<Box<dyn GenomicCursor>>>,
    /// Cached head row per Active source
    rows: Vec<Option<Row>>,
    /// Coordinate key of the cached head row
    row_keys: Vec<Key>,
    /// Effective start bound per source
    start_keys: Vec<Key>,
    /// Declared stop bound per source, `None` when unbounded
    stop_keys: Vec<Option<Key>>,
    /// Waiting sources, keyed by `(order(start chr), start pos, index)`
    waiting: Vec<usize>,
    /// Active sources, keyed by `(order(row chr), row pos, index)`
    active: Vec<usize>,
    /// Lowest start bound among Waiting sources
    frontier: Option<Key>,
    must_report: bool,
    progress_reported: bool,
    pending_progress: Option<Row>,
    filter: Option<RowPredicate>,
    selected: Option<Vec<usize>>,
    header: Option<String>,
}

impl RangeMergeEngine {
    /// Engine over the given sources, with the default lexicographic
    /// contig cache.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::NoSources`] for an empty source list.
    pub fn new(sources: Vec<SourceRef>, resolver: Box<dyn CursorResolver + Send>) -> Result<Self> {
        Self::with_cache(sources, resolver, ContigCache::new())
    }

    /// Engine with a caller-supplied contig cache. Scoping one cache per
    /// query is the recommended mitigation for rank shifts caused by
    /// contigs discovered while a merge is in flight.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::NoSources`] for an empty source list.
    pub fn with_cache(
        sources: Vec<SourceRef>,
        resolver: Box<dyn CursorResolver + Send>,
        mut cache: ContigCache,
    ) -> Result<Self> {
        if sources.is_empty() {
            return Err(MergeError::NoSources);
        }
        let n = sources.len();

        let mut start_keys = Vec::with_capacity(n);
        let mut stop_keys = Vec::with_capacity(n);
        for source in &sources {
            match &source.range {
                Some(range) => {
                    start_keys.push((cache.id_or_insert(&range.start_chr), range.start_pos));
                    stop_keys.push(Some((cache.id_or_insert(&range.stop_chr), range.stop_pos)));
                }
                None => {
                    // No declared bound: activate at the lowest-ordered
                    // known contig, never retire by stop bound.
                    let first = cache.contigs_in_order()[0];
                    start_keys.push((first, 0));
                    stop_keys.push(None);
                }
            }
        }

        let mut engine = Self {
            sources,
            resolver,
            cache,
            cursors: (0..n).map(|_| None).collect(),
            rows: vec![None; n],
            row_keys: vec![(0, 0); n],
            start_keys,
            stop_keys,
            waiting: Vec::with_capacity(n),
            active: Vec::with_capacity(n),
            frontier: None,
            must_report: false,
            progress_reported: false,
            pending_progress: None,
            filter: None,
            selected: None,
            header: None,
        };
        for idx in 0..n {
            Self::push_waiting(&mut engine.waiting, &engine.cache, &engine.start_keys, idx);
        }
        engine.update_frontier();
        Ok(engine)
    }

    /// Apply a row predicate to the merged stream. Progress rows are
    /// tested too, so a predicate rejecting them suppresses reporting.
    #[must_use]
    pub fn with_filter(mut self, predicate: RowPredicate) -> Self {
        self.filter = Some(predicate);
        self
    }

    /// Project the merged stream onto a column subset. Offered to each
    /// driver as a pushdown first; drivers that decline get a
    /// [`SelectCursor`] wrapper instead.
    #[must_use]
    pub fn with_select(mut self, cols: Vec<usize>) -> Self {
        self.selected = Some(cols);
        self
    }

    /// The contig cache this engine orders by.
    #[must_use]
    pub fn cache(&self) -> &ContigCache {
        &self.cache
    }

    /// Whether another row (data or progress) is available.
    ///
    /// # Errors
    ///
    /// Propagates partition open and read failures; an open failure aborts
    /// the merge, there is no partition-level retry.
    pub fn has_next(&mut self) -> Result<bool> {
        loop {
            self.update_queue()?;
            if self.must_report {
                if let Some((fid, fpos)) = self.frontier {
                    let row = Row::progress(self.cache.name_of(fid), fpos);
                    if self.filter.as_ref().map_or(true, |f| f(&row)) {
                        self.pending_progress = Some(row);
                        return Ok(true);
                    }
                    // The caller filtered progress rows away; skip the
                    // report and activate as if it had been consumed.
                    self.must_report = false;
                    self.progress_reported = true;
                    self.pending_progress = None;
                    continue;
                }
                self.must_report = false;
            }
            return Ok(!self.active.is_empty());
        }
    }

    /// Pull the next row in global order, or `None` when every source is
    /// Retired. Interleaves synthetic progress rows; see the type docs.
    ///
    /// # Errors
    ///
    /// Propagates partition open and read failures.
    pub fn next_row(&mut self) -> Result<Option<Row>> {
        if !self.has_next()? {
            return Ok(None);
        }
        if self.must_report {
            self.must_report = false;
            self.progress_reported = true;
            return Ok(self.pending_progress.take());
        }
        let Some(idx) = Self::pop_active(&mut self.active, &self.cache, &self.row_keys) else {
            return Ok(None);
        };
        let row = self.rows[idx].take();
        self.refill(idx)?;
        Ok(row)
    }

    /// Re-seed the whole merge at `(chr, pos)`.
    ///
    /// Sources whose declared stop bound precedes the coordinate are
    /// Retired (closed if open). Remaining sources go back to Waiting;
    /// those already holding an open cursor keep it and re-seek instead of
    /// reopening. Sources whose start bound is at or before the coordinate
    /// are then activated until no Waiting source could produce an earlier
    /// row than what is cached. Returns [`has_next`](Self::has_next) of
    /// the re-seeded state.
    ///
    /// # Errors
    ///
    /// Propagates partition open and seek failures.
    pub fn seek(&mut self, chr: &str, pos: i64) -> Result<bool> {
        self.waiting.clear();
        self.active.clear();
        self.must_report = false;
        self.progress_reported = false;
        self.pending_progress = None;

        let target: Key = (self.cache.id_or_insert(chr), pos);
        for idx in 0..self.sources.len() {
            let past_stop = match self.stop_keys[idx] {
                Some((sid, spos)) => {
                    self.cache.compare(sid, spos, target.0, target.1) == Ordering::Less
                }
                None => false,
            };
            self.rows[idx] = None;
            if past_stop {
                if let Some(mut cursor) = self.cursors[idx].take() {
                    debug!(partition = %self.sources[idx].display_name(), "retiring partition before seek target");
                    cursor.close();
                }
            } else {
                Self::push_waiting(&mut self.waiting, &self.cache, &self.start_keys, idx);
            }
        }
        self.update_frontier();

        while self.frontier_at_or_before(target) && self.must_activate_new() {
            self.seek_next(chr, pos)?;
        }
        self.has_next()
    }

    /// Close every open cursor. Safe to call at any time, idempotent;
    /// mandatory for correct cleanup when a caller stops pulling early.
    pub fn close(&mut self) {
        for slot in &mut self.cursors {
            if let Some(mut cursor) = slot.take() {
                cursor.close();
            }
        }
        self.waiting.clear();
        self.active.clear();
        self.rows.iter_mut().for_each(|r| *r = None);
        self.must_report = false;
        self.pending_progress = None;
        self.frontier = None;
    }

    /// The header describing the merged stream: taken from an Active
    /// cursor when one exists, else by activating the nearest Waiting
    /// source, else by briefly opening the first source.
    ///
    /// # Errors
    ///
    /// Propagates partition open failures.
    pub fn header(&mut self) -> Result<String> {
        if let Some(header) = &self.header {
            return Ok(header.clone());
        }
        if heap::peek(&self.active).is_none() && !self.waiting.is_empty() {
            self.activate_next()?;
        }
        let header = match heap::peek(&self.active) {
            Some(idx) => match self.cursors[idx].as_mut() {
                Some(cursor) => cursor.header()?,
                None => self.header_from_first()?,
            },
            None => self.header_from_first()?,
        };
        self.header = Some(header.clone());
        Ok(header)
    }

    fn header_from_first(&mut self) -> Result<String> {
        let mut cursor = self.open_cursor(0)?;
        let header = cursor.header()?;
        cursor.close();
        Ok(header)
    }

    /// Step 1 of the pull protocol: decide whether activation is mandatory
    /// and either arm a progress report or bulk-activate the frontier.
    fn update_queue(&mut self) -> Result<()> {
        if !self.must_activate_new() {
            return Ok(());
        }
        if self.progress_reported {
            let reported = self.frontier;
            loop {
                self.activate_next()?;
                if self.waiting.is_empty() || self.frontier != reported {
                    break;
                }
            }
            self.must_report = self.must_activate_new();
            self.progress_reported = false;
        } else {
            self.must_report = true;
        }
        Ok(())
    }

    /// Activation is mandatory when an unopened source's declared start
    /// could produce a row earlier than anything cached.
    fn must_activate_new(&self) -> bool {
        let Some((fid, fpos)) = self.frontier else {
            return false;
        };
        match heap::peek(&self.active) {
            None => true,
            Some(idx) => {
                let (rid, rpos) = self.row_keys[idx];
                self.cache.compare(rid, rpos, fid, fpos) != Ordering::Less
            }
        }
    }

    /// Open (or reuse) the next Waiting source's cursor and cache its
    /// first row, Retiring it immediately if it produces nothing.
    fn activate_next(&mut self) -> Result<()> {
        let Some(idx) = Self::pop_waiting(&mut self.waiting, &self.cache, &self.start_keys) else {
            return Ok(());
        };
        let mut cursor = match self.cursors[idx].take() {
            // A cursor kept open across a seek: its scan position is
            // arbitrary, re-anchor it at the declared start.
            Some(mut cursor) => {
                let (sid, spos) = self.start_keys[idx];
                let chr = self.cache.name_of(sid).to_string();
                cursor.seek(&chr, spos)?;
                cursor
            }
            None => self.open_cursor(idx)?,
        };
        match cursor.next_row()? {
            Some(row) => {
                self.store_row(idx, row);
                self.cursors[idx] = Some(cursor);
                Self::push_active(&mut self.active, &self.cache, &self.row_keys, idx);
            }
            None => {
                debug!(partition = %self.sources[idx].display_name(), "retiring empty partition");
                cursor.close();
            }
        }
        self.update_frontier();
        Ok(())
    }

    /// Activate the next Waiting source directly at a seek target.
    fn seek_next(&mut self, chr: &str, pos: i64) -> Result<()> {
        let Some(idx) = Self::pop_waiting(&mut self.waiting, &self.cache, &self.start_keys) else {
            return Ok(());
        };
        let mut cursor = match self.cursors[idx].take() {
            Some(cursor) => cursor,
            None => self.open_cursor(idx)?,
        };
        let found = cursor.seek(chr, pos)?;
        let row = if found { cursor.next_row()? } else { None };
        match row {
            Some(row) => {
                self.store_row(idx, row);
                self.cursors[idx] = Some(cursor);
                Self::push_active(&mut self.active, &self.cache, &self.row_keys, idx);
            }
            None => {
                debug!(partition = %self.sources[idx].display_name(), "retiring partition at seek");
                cursor.close();
            }
        }
        self.update_frontier();
        Ok(())
    }

    /// Refill the cached row of a source that just emitted, Retiring it on
    /// exhaustion.
    fn refill(&mut self, idx: usize) -> Result<()> {
        let Some(cursor) = self.cursors[idx].as_mut() else {
            return Ok(());
        };
        match cursor.next_row()? {
            Some(row) => {
                self.store_row(idx, row);
                Self::push_active(&mut self.active, &self.cache, &self.row_keys, idx);
            }
            None => {
                debug!(partition = %self.sources[idx].display_name(), "retiring exhausted partition");
                if let Some(mut cursor) = self.cursors[idx].take() {
                    cursor.close();
                }
                self.rows[idx] = None;
            }
        }
        Ok(())
    }

    /// Resolve a source to its cursor and wrap the engine-level select and
    /// filter around it, preferring pushdown when the driver accepts.
    fn open_cursor(&mut self, idx: usize) -> Result<Box<dyn GenomicCursor>> {
        let source = &self.sources[idx];
        debug!(partition = %source.display_name(), "activating partition");
        let mut cursor = source.resolve(self.resolver.as_ref())?;
        if let Some(cols) = &self.selected {
            if !cursor.pushdown_select(cols) {
                cursor = Box::new(SelectCursor::new(cursor, cols.clone()));
            }
        }
        if let Some(predicate) = &self.filter {
            cursor = Box::new(FilterCursor::new(cursor, Arc::clone(predicate)));
        }
        Ok(cursor)
    }

    fn store_row(&mut self, idx: usize, row: Row) {
        let id = self.cache.id_or_insert(&row.chr);
        self.row_keys[idx] = (id, row.pos);
        self.rows[idx] = Some(row);
    }

    fn update_frontier(&mut self) {
        self.frontier = heap::peek(&self.waiting).map(|idx| self.start_keys[idx]);
    }

    fn frontier_at_or_before(&self, target: Key) -> bool {
        match self.frontier {
            Some((fid, fpos)) => {
                self.cache.compare(target.0, target.1, fid, fpos) != Ordering::Less
            }
            None => false,
        }
    }

    fn push_waiting(waiting: &mut Vec<usize>, cache: &ContigCache, keys: &[Key], idx: usize) {
        heap::push(waiting, idx, |a, b| Self::key_lt(cache, keys, a, b));
    }

    fn pop_waiting(waiting: &mut Vec<usize>, cache: &ContigCache, keys: &[Key]) -> Option<usize> {
        heap::pop(waiting, |a, b| Self::key_lt(cache, keys, a, b))
    }

    fn push_active(active: &mut Vec<usize>, cache: &ContigCache, keys: &[Key], idx: usize) {
        heap::push(active, idx, |a, b| Self::key_lt(cache, keys, a, b));
    }

    fn pop_active(active: &mut Vec<usize>, cache: &ContigCache, keys: &[Key]) -> Option<usize> {
        heap::pop(active, |a, b| Self::key_lt(cache, keys, a, b))
    }

    /// Heap ordering: coordinate key first, source index as the tie-break
    /// for deterministic interleaving.
    fn key_lt(cache: &ContigCache, keys: &[Key], a: usize, b: usize) -> bool {
        let (aid, apos) = keys[a];
        let (bid, bpos) = keys[b];
        cache.compare_with_tiebreak(aid, apos, a, bid, bpos, b) == Ordering::Less
    }
}

impl Drop for RangeMergeEngine {
    fn drop(&mut self) {
        self.close();
    }
}

impl GenomicCursor for RangeMergeEngine {
    fn header(&mut self) -> Result<String> {
        RangeMergeEngine::header(self)
    }

    fn seek(&mut self, chr: &str, pos: i64) -> Result<bool> {
        RangeMergeEngine::seek(self, chr, pos)
    }

    fn next_row(&mut self) -> Result<Option<Row>> {
        RangeMergeEngine::next_row(self)
    }

    fn close(&mut self) {
        RangeMergeEngine::close(self);
    }
}
