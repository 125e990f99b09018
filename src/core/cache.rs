//! Runtime contig discovery on top of a [`ContigScheme`].
//!
//! The cache resolves contig names to internal ids and compares coordinates
//! using the scheme's ranks. Names never seen before can be added at
//! runtime and are slotted into the correct relative position among the
//! names known so far. Note that adding a name can shift the *rank* (never
//! the id) of previously known contigs.

use std::collections::HashMap;

use crate::core::scheme::ContigScheme;

/// Ids the fast byte-level prefix decoder hands out for the standard human
/// chromosomes. Only valid when the cache was seeded with a scheme that
/// preallocates them (all canonical schemes do).
const ID_M: usize = 0;
const ID_X: usize = 23;
const ID_XY: usize = 24;
const ID_Y: usize = 25;

/// Mutable contig table with runtime discovery.
///
/// Owns a private copy of a [`ContigScheme`] plus an alias map covering the
/// common spelling variants (`chr`-stripped names, `MT` for `M`). One cache
/// instance is typically scoped to one query; see the crate docs for the
/// caveat about extending the cache while a merge is in flight.
#[derive(Debug, Clone)]
pub struct ContigCache {
    scheme: ContigScheme,
    name2id: HashMap<String, usize>,
    /// True when the scheme preallocates the standard human ids, enabling
    /// the allocation-free prefix fast path.
    human_ids: bool,
}

impl Default for ContigCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ContigCache {
    /// Cache seeded with the lexicographic human scheme.
    #[must_use]
    pub fn new() -> Self {
        Self::with_scheme(ContigScheme::lexicographic())
    }

    /// Cache seeded with a private copy of the given scheme. An empty
    /// scheme falls back to the lexicographic default.
    #[must_use]
    pub fn with_scheme(scheme: ContigScheme) -> Self {
        let scheme = if scheme.is_empty() {
            ContigScheme::lexicographic()
        } else {
            scheme
        };

        let mut name2id = HashMap::new();
        for id in 0..scheme.len() {
            if let Some(name) = scheme.name_of(id) {
                name2id.insert(name.to_string(), id);
                if let Some(stripped) = name.strip_prefix("chr") {
                    name2id.insert(stripped.to_string(), id);
                }
            }
        }
        if let Some(&m) = name2id.get("M") {
            name2id.entry("MT".to_string()).or_insert(m);
        }

        let human_ids = name2id.get("M") == Some(&ID_M)
            && name2id.get("X") == Some(&ID_X)
            && name2id.get("XY") == Some(&ID_XY)
            && name2id.get("Y") == Some(&ID_Y)
            && name2id.get("1") == Some(&1)
            && name2id.get("22") == Some(&22);

        Self {
            scheme,
            name2id,
            human_ids,
        }
    }

    /// Number of known contigs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scheme.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scheme.is_empty()
    }

    /// Canonical name for an id, or empty string for an unknown id.
    #[must_use]
    pub fn name_of(&self, id: usize) -> &str {
        self.scheme.name_of(id).unwrap_or("")
    }

    /// Id for a name or one of its known aliases.
    #[must_use]
    pub fn id_of(&self, name: &str) -> Option<usize> {
        self.name2id.get(name).copied()
    }

    /// Resolve a name to an id, optionally adding it on a miss.
    ///
    /// Returns `None` when the name is unknown and `add_if_missing` is
    /// false. Callers seeking against an unknown contig must treat `None`
    /// as "no such partition region" and skip, not fail.
    pub fn id_or_unknown(&mut self, name: &str, add_if_missing: bool) -> Option<usize> {
        match self.name2id.get(name) {
            Some(&id) => Some(id),
            None if add_if_missing => Some(self.add_contig(name)),
            None => None,
        }
    }

    /// Resolve a name to an id, adding it on a miss.
    pub fn id_or_insert(&mut self, name: &str) -> usize {
        match self.name2id.get(name) {
            Some(&id) => id,
            None => self.add_contig(name),
        }
    }

    /// Decode a contig name prefix from a raw row buffer.
    ///
    /// The buffer is assumed to begin with a tab-terminated contig name
    /// (the name may also run to the end of the buffer). The standard human
    /// encodings - 1-2 ASCII digits, `X`, `Y`, `M`, `XY`, with or without a
    /// `chr` prefix - are decoded without heap allocation; anything else
    /// falls back to a scan-to-tab and a table lookup.
    pub fn prefixed_id(&mut self, buf: &[u8], add_if_missing: bool) -> Option<usize> {
        let body = if buf.len() > 3 && &buf[..3] == b"chr" {
            &buf[3..]
        } else {
            buf
        };
        let name_len = body
            .iter()
            .position(|&b| b == b'\t')
            .unwrap_or(body.len());

        if self.human_ids {
            if name_len == 1 {
                match body[0] {
                    b'Y' => return Some(ID_Y),
                    b'X' => return Some(ID_X),
                    b'M' => return Some(ID_M),
                    d @ b'1'..=b'9' => return Some((d - b'0') as usize),
                    _ => {}
                }
            } else if name_len == 2 {
                if body[0] == b'X' && body[1] == b'Y' {
                    return Some(ID_XY);
                }
                if body[0].is_ascii_digit() && body[1].is_ascii_digit() {
                    let id = (body[0] - b'0') as usize * 10 + (body[1] - b'0') as usize;
                    if (10..=22).contains(&id) {
                        return Some(id);
                    }
                }
            }
        }

        let full_len = buf
            .iter()
            .position(|&b| b == b'\t')
            .unwrap_or(buf.len());
        let name = String::from_utf8_lossy(&buf[..full_len]);
        self.id_or_unknown(&name, add_if_missing)
    }

    /// Add a new contig name, slotting it into the current order.
    ///
    /// Allocates the next unused id, doubles the backing tables if they are
    /// exhausted, finds the insertion rank against the names known so far
    /// and shifts the rank of every id at or after it by one. Cost is
    /// O(contig count), which is bounded by the reference genome, not by
    /// row count.
    pub fn add_contig(&mut self, name: &str) -> usize {
        let id = self.scheme.len();
        if self.scheme.capacity() <= id {
            self.grow();
        }

        let ordered = self.contigs_in_order();
        let rank = self.scheme.insertion_rank(name, &ordered);
        for i in 0..id {
            let order = self.scheme.order_of(i);
            if order >= rank {
                self.scheme.set_order_at(i, order + 1);
            }
        }
        self.scheme.set_order_at(id, rank);
        self.scheme.set_name_at(id, name);

        self.name2id.insert(name.to_string(), id);
        if let Some(stripped) = name.strip_prefix("chr") {
            self.name2id.entry(stripped.to_string()).or_insert(id);
        }
        id
    }

    /// Double the capacity of the backing tables, copying populated slots.
    fn grow(&mut self) {
        let cap = self.scheme.capacity().max(1);
        let new_cap = cap * 2;

        let mut names: Vec<Option<String>> = (0..cap)
            .map(|id| self.scheme.name_of(id).map(String::from))
            .collect();
        names.resize(new_cap, None);
        let mut ranks: Vec<usize> = (0..cap).map(|id| self.scheme.order_of(id)).collect();
        ranks.extend(cap..new_cap);

        self.scheme.replace_order_table(ranks);
        self.scheme.replace_name_table(names);
    }

    /// Rank of an id in the current order.
    #[must_use]
    pub fn order_of(&self, id: usize) -> usize {
        self.scheme.order_of(id)
    }

    /// Compare two coordinates in the cache's canonical total order.
    #[must_use]
    pub fn compare(&self, a_id: usize, a_pos: i64, b_id: usize, b_pos: i64) -> std::cmp::Ordering {
        if a_id == b_id {
            a_pos.cmp(&b_pos)
        } else {
            self.scheme.order_of(a_id).cmp(&self.scheme.order_of(b_id))
        }
    }

    /// Compare two coordinates, breaking full ties on a caller-supplied
    /// value (remaining columns hash, source index, ...). Used by the merge
    /// engine for deterministic interleaving.
    #[must_use]
    pub fn compare_with_tiebreak(
        &self,
        a_id: usize,
        a_pos: i64,
        a_extra: usize,
        b_id: usize,
        b_pos: i64,
        b_extra: usize,
    ) -> std::cmp::Ordering {
        self.compare(a_id, a_pos, b_id, b_pos)
            .then(a_extra.cmp(&b_extra))
    }

    /// The known contig ids sorted by current rank.
    #[must_use]
    pub fn contigs_in_order(&self) -> Vec<usize> {
        let mut ordered = vec![0; self.scheme.len()];
        for id in 0..self.scheme.len() {
            ordered[self.scheme.order_of(id)] = id;
        }
        ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every pair of adjacent names in rank order must be sorted.
    fn check_order(cache: &ContigCache) {
        let ordered = cache.contigs_in_order();
        for pair in ordered.windows(2) {
            assert!(
                cache.name_of(pair[0]) < cache.name_of(pair[1]),
                "{} should sort before {}",
                cache.name_of(pair[0]),
                cache.name_of(pair[1])
            );
        }
    }

    fn check_standard_chromosomes(cache: &ContigCache) {
        assert_eq!(cache.id_of("chrM"), Some(0));
        for i in 1..=22 {
            assert_eq!(cache.id_of(&format!("chr{i}")), Some(i));
        }
        assert_eq!(cache.id_of("chrX"), Some(23));
        assert_eq!(cache.id_of("chrXY"), Some(24));
        assert_eq!(cache.id_of("chrY"), Some(25));
    }

    #[test]
    fn test_standard_human_chromosomes() {
        let cache = ContigCache::new();
        assert_eq!(cache.len(), 26);
        check_standard_chromosomes(&cache);
        check_order(&cache);
    }

    #[test]
    fn test_aliases() {
        let cache = ContigCache::new();
        assert_eq!(cache.id_of("1"), Some(1));
        assert_eq!(cache.id_of("M"), Some(0));
        assert_eq!(cache.id_of("MT"), Some(0));
        assert_eq!(cache.id_of("X"), Some(23));
    }

    #[test]
    fn test_adding_contigs_keeps_order() {
        let mut cache = ContigCache::new();
        for name in ["chrKalli", "chr100", "chrPalli", "chrA", "chr30", "chr76", "chr220"] {
            let id = cache.add_contig(name);
            assert_eq!(cache.id_of(name), Some(id));
            assert_eq!(cache.name_of(id), name);
            check_order(&cache);
        }
        check_standard_chromosomes(&cache);
    }

    #[test]
    fn test_adding_through_lookup() {
        let mut cache = ContigCache::new();
        assert_eq!(cache.id_or_unknown("chrUn_gl000220", false), None);
        let id = cache.id_or_unknown("chrUn_gl000220", true).unwrap();
        assert_eq!(id, 26);
        assert_eq!(cache.id_or_unknown("chrUn_gl000220", false), Some(id));
        check_order(&cache);
    }

    #[test]
    fn test_insertion_preserves_relative_order() {
        // After adding X, every already-known pair keeps its relation and
        // X lands strictly between its lexicographic neighbours.
        let mut cache = ContigCache::new();
        let before: Vec<(usize, usize)> = (0..cache.len())
            .map(|id| (id, cache.order_of(id)))
            .collect();

        let x = cache.add_contig("chr15_KI270905v1_alt");
        for (a, ord_a) in &before {
            for (b, ord_b) in &before {
                if ord_a < ord_b {
                    assert!(cache.order_of(*a) < cache.order_of(*b));
                }
            }
        }
        let a = cache.id_of("chr15").unwrap();
        let b = cache.id_of("chr16").unwrap();
        assert!(cache.order_of(a) < cache.order_of(x));
        assert!(cache.order_of(x) < cache.order_of(b));
    }

    #[test]
    fn test_growth_beyond_initial_capacity() {
        let mut cache = ContigCache::new();
        for i in 0..40 {
            cache.add_contig(&format!("scaffold_{i:03}"));
        }
        assert_eq!(cache.len(), 66);
        check_order(&cache);
        assert_eq!(cache.id_of("scaffold_039"), Some(65));
        check_standard_chromosomes(&cache);
    }

    #[test]
    fn test_prefixed_id_fast_paths() {
        let mut cache = ContigCache::new();
        assert_eq!(cache.prefixed_id(b"chr1\t", false), Some(1));
        assert_eq!(cache.prefixed_id(b"chr15\t12345\tA", false), Some(15));
        assert_eq!(cache.prefixed_id(b"chrX\t", false), Some(23));
        assert_eq!(cache.prefixed_id(b"chrXY\t1\tb", false), Some(24));
        assert_eq!(cache.prefixed_id(b"chrM\t", false), Some(0));
        assert_eq!(cache.prefixed_id(b"chrY", false), Some(25));
        // unprefixed forms
        assert_eq!(cache.prefixed_id(b"9\t100", false), Some(9));
        assert_eq!(cache.prefixed_id(b"22\t100", false), Some(22));
        // not case insensitive
        assert_eq!(cache.prefixed_id(b"CHR1\t", false), None);
    }

    #[test]
    fn test_prefixed_id_fallback() {
        let mut cache = ContigCache::new();
        assert_eq!(cache.prefixed_id(b"chrUn_gl000220\t55\tx", false), None);
        let id = cache.prefixed_id(b"chrUn_gl000220\t55\tx", true);
        assert_eq!(id, Some(26));
        assert_eq!(cache.id_of("chrUn_gl000220"), Some(26));
        // chr23 is not a human chromosome code, falls back to the table
        assert_eq!(cache.prefixed_id(b"chr23\t1", false), None);
    }

    #[test]
    fn test_compare() {
        use std::cmp::Ordering;
        let cache = ContigCache::new();
        let chr1 = cache.id_of("chr1").unwrap();
        let chr2 = cache.id_of("chr2").unwrap();
        let chr10 = cache.id_of("chr10").unwrap();
        assert_eq!(cache.compare(chr1, 100, chr1, 100), Ordering::Equal);
        assert_eq!(cache.compare(chr1, 99, chr1, 100), Ordering::Less);
        // lexicographic default: chr10 < chr2
        assert_eq!(cache.compare(chr10, 500, chr2, 1), Ordering::Less);
        assert_eq!(
            cache.compare_with_tiebreak(chr1, 5, 0, chr1, 5, 1),
            Ordering::Less
        );
    }

    #[test]
    fn test_numerical_scheme_compare() {
        use std::cmp::Ordering;
        let cache = ContigCache::with_scheme(ContigScheme::numerical());
        let chr2 = cache.id_of("chr2").unwrap();
        let chr10 = cache.id_of("chr10").unwrap();
        assert_eq!(cache.compare(chr2, 1, chr10, 1), Ordering::Less);
    }
}
