//! Line-oriented text driver.
//!
//! Reads tab-separated partitions from plain or gzip-compressed files. The
//! first line is treated as the header when it starts with the `#` marker
//! or when its position column does not parse as an integer. Seeking is a
//! linear re-scan from the top of the file, which is what an unindexed
//! text partition can support; indexed formats belong in their own drivers
//! behind [`CursorResolver`].

use std::fs::File;
use std::io::{BufRead, BufReader, Read};

use flate2::read::GzDecoder;
use tracing::debug;

use crate::core::{ContigCache, ContigScheme, Row};
use crate::error::{MergeError, Result};
use crate::source::cursor::{CursorResolver, GenomicCursor};
use crate::source::SourceRef;

/// Header assumed for files that start directly with data.
const DEFAULT_HEADER: &str = "CHROM\tPOS";

/// Cursor over one delimited text partition.
pub struct TextCursor {
    locator: String,
    reader: Option<BufReader<Box<dyn Read + Send>>>,
    header: Option<String>,
    pending: Option<Row>,
    cache: ContigCache,
    closed: bool,
}

impl TextCursor {
    /// Unopened cursor for a file locator, ordering contigs
    /// lexicographically. The file is not touched until the first read or
    /// seek.
    #[must_use]
    pub fn new(locator: impl Into<String>) -> Self {
        Self::with_cache(locator, ContigCache::new())
    }

    /// Unopened cursor seeking under the given contig cache. The cursor
    /// must order contigs the same way as the merge it feeds, so resolvers
    /// hand every cursor a copy of the cache in play.
    #[must_use]
    pub fn with_cache(locator: impl Into<String>, cache: ContigCache) -> Self {
        Self {
            locator: locator.into(),
            reader: None,
            header: None,
            pending: None,
            cache,
            closed: false,
        }
    }

    fn open(&mut self) -> Result<()> {
        debug!(locator = %self.locator, "opening text partition");
        let file = File::open(&self.locator).map_err(|e| MergeError::ResourceNotFound {
            locator: self.locator.clone(),
            msg: e.to_string(),
        })?;
        let raw: Box<dyn Read + Send> = if self.locator.ends_with(".gz") {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };
        let mut reader = BufReader::new(raw);

        let mut first = String::new();
        reader.read_line(&mut first)?;
        let first = first.trim_end_matches(['\n', '\r']);
        if first.is_empty() {
            self.header = Some(DEFAULT_HEADER.to_string());
        } else if let Some(marked) = first.strip_prefix('#') {
            self.header = Some(marked.to_string());
        } else {
            match Row::from_line(first) {
                // No header line at all; the first line is data
                Ok(row) => {
                    self.header = Some(DEFAULT_HEADER.to_string());
                    self.pending = Some(row);
                }
                Err(_) => self.header = Some(first.to_string()),
            }
        }
        self.reader = Some(reader);
        Ok(())
    }

    fn ensure_open(&mut self) -> Result<()> {
        if self.reader.is_none() {
            self.open()?;
        }
        Ok(())
    }

    fn read_row(&mut self) -> Result<Option<Row>> {
        if let Some(row) = self.pending.take() {
            return Ok(Some(row));
        }
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            let trimmed = line.trim_end_matches(['\n', '\r']);
            if trimmed.is_empty() {
                continue;
            }
            return Row::from_line(trimmed)
                .map(Some)
                .map_err(|e| e.with_locator(&self.locator));
        }
    }
}

impl GenomicCursor for TextCursor {
    fn header(&mut self) -> Result<String> {
        if self.closed {
            return Ok(self.header.clone().unwrap_or_else(|| DEFAULT_HEADER.to_string()));
        }
        self.ensure_open()?;
        Ok(self.header.clone().unwrap_or_else(|| DEFAULT_HEADER.to_string()))
    }

    fn seek(&mut self, chr: &str, pos: i64) -> Result<bool> {
        if self.closed {
            return Ok(false);
        }
        // Restart from the top; a plain text stream has no index and the
        // previous scan position may already be past the target.
        self.reader = None;
        self.pending = None;
        self.ensure_open()?;

        let Some(target) = self.cache.id_or_unknown(chr, true) else {
            return Ok(false);
        };
        while let Some(row) = self.read_row()? {
            let id = self
                .cache
                .id_or_unknown(&row.chr, true)
                .unwrap_or_default();
            if self.cache.compare(id, row.pos, target, pos) != std::cmp::Ordering::Less {
                self.pending = Some(row);
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn next_row(&mut self) -> Result<Option<Row>> {
        if self.closed {
            return Ok(None);
        }
        self.ensure_open()?;
        self.read_row()
    }

    fn close(&mut self) {
        if !self.closed {
            debug!(locator = %self.locator, "closing text partition");
        }
        self.reader = None;
        self.pending = None;
        self.closed = true;
    }
}

/// Resolver mapping every locator to a [`TextCursor`]. Each resolved
/// cursor gets a copy of the resolver's cache so its seeks order contigs
/// the same way as the merge. Missing files surface as
/// [`MergeError::ResourceNotFound`] on first use, not at resolution time,
/// matching the lazy-open discipline of the engine.
#[derive(Debug, Clone)]
pub struct TextResolver {
    cache: ContigCache,
}

impl TextResolver {
    /// Resolver handing out lexicographically ordered cursors.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: ContigCache::new(),
        }
    }

    /// Resolver handing out cursors seeded with the given scheme. Use the
    /// scheme the merge engine's cache was built from.
    #[must_use]
    pub fn with_scheme(scheme: ContigScheme) -> Self {
        Self {
            cache: ContigCache::with_scheme(scheme),
        }
    }
}

impl Default for TextResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl CursorResolver for TextResolver {
    fn resolve(&self, source: &SourceRef) -> Result<Box<dyn GenomicCursor>> {
        Ok(Box::new(TextCursor::with_cache(
            &source.locator,
            self.cache.clone(),
        )))
    }
}
