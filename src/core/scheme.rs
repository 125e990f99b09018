//! Contig naming and ordering schemes.
//!
//! A [`ContigScheme`] assigns each contig a stable internal id and a rank in
//! a canonical sort order. The id never changes once assigned; the rank is
//! what comparisons use, so the same set of ids can be ordered
//! lexicographically, numerically, or in reference-genome order depending on
//! the scheme. Standard human chromosomes get preallocated ids:
//! M = 0, 1 = 1, ..., 22 = 22, X = 23, XY = 24, Y = 25.

use std::collections::HashMap;

/// Immutable-by-convention table mapping contig name <-> internal id <->
/// rank in a canonical sort order.
///
/// Canonical instances are constructed once and never mutated. A
/// [`ContigCache`](crate::core::ContigCache) owns a private copy that it
/// grows and reorders through the two mutation primitives
/// [`set_name_at`](Self::set_name_at) / [`set_order_at`](Self::set_order_at)
/// and the resize primitives [`replace_name_table`](Self::replace_name_table)
/// / [`replace_order_table`](Self::replace_order_table).
///
/// Invariant: `order2id[id2order[i]] == i` for every populated id `i`.
#[derive(Debug, Clone)]
pub struct ContigScheme {
    id2name: Vec<Option<String>>,
    id2order: Vec<usize>,
    order2id: Vec<usize>,
    name2id: HashMap<String, usize>,
    len: usize,
}

/// The 26 standard human contigs, `chr`-prefixed.
const HUMAN_CHR: [&str; 26] = [
    "chrM", "chr1", "chr2", "chr3", "chr4", "chr5", "chr6", "chr7", "chr8", "chr9", "chr10",
    "chr11", "chr12", "chr13", "chr14", "chr15", "chr16", "chr17", "chr18", "chr19", "chr20",
    "chr21", "chr22", "chrX", "chrXY", "chrY",
];

/// The 26 standard human contigs, unprefixed, mitochondrion named `MT`.
const HUMAN_PLAIN: [&str; 26] = [
    "MT", "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12", "13", "14", "15", "16",
    "17", "18", "19", "20", "21", "22", "X", "XY", "Y",
];

/// Ranks placing the ids in lexicographic name order
/// (chr1, chr10, ..., chr19, chr2, chr20, ..., chrM, chrX, chrXY, chrY).
const LEXICO_ORDER: [usize; 26] = [
    22, 0, 11, 15, 16, 17, 18, 19, 20, 21, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 12, 13, 14, 23, 24, 25,
];

/// Ranks placing the ids in numeric order (chr1..chr22, X, XY, Y, M last).
const NUMERIC_ORDER: [usize; 26] = [
    25, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24,
];

impl ContigScheme {
    /// Build a scheme from parallel name and rank tables.
    ///
    /// # Panics
    ///
    /// Panics if the two tables differ in length.
    #[must_use]
    pub fn new(names: &[&str], ranks: &[usize]) -> Self {
        assert_eq!(names.len(), ranks.len(), "name and rank tables must match");
        let mut scheme = Self {
            id2name: Vec::new(),
            id2order: Vec::new(),
            order2id: Vec::new(),
            name2id: HashMap::new(),
            len: 0,
        };
        scheme.replace_order_table(ranks.to_vec());
        scheme.replace_name_table(names.iter().map(|n| Some((*n).to_string())).collect());
        scheme
    }

    /// `chr`-prefixed human chromosomes in lexicographic order.
    #[must_use]
    pub fn lexicographic() -> Self {
        Self::new(&HUMAN_CHR, &LEXICO_ORDER)
    }

    /// `chr`-prefixed human chromosomes in numeric order.
    #[must_use]
    pub fn numerical() -> Self {
        Self::new(&HUMAN_CHR, &NUMERIC_ORDER)
    }

    /// Unprefixed human chromosomes (`1..22, X, XY, Y, MT`) in numeric order.
    #[must_use]
    pub fn hg() -> Self {
        Self::new(&HUMAN_PLAIN, &NUMERIC_ORDER)
    }

    /// Number of populated contig ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size of the backing tables. May exceed [`len`](Self::len) after a
    /// resize; ids in `len..capacity` are unpopulated.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.id2order.len()
    }

    /// Canonical name for an id, or `None` for an unpopulated id.
    #[must_use]
    pub fn name_of(&self, id: usize) -> Option<&str> {
        self.id2name.get(id).and_then(|n| n.as_deref())
    }

    /// Id for a canonical name.
    #[must_use]
    pub fn id_of(&self, name: &str) -> Option<usize> {
        self.name2id.get(name).copied()
    }

    /// Rank of an id in this scheme's sort order.
    #[must_use]
    pub fn order_of(&self, id: usize) -> usize {
        self.id2order[id]
    }

    /// Inverse of [`order_of`](Self::order_of).
    #[must_use]
    pub fn id_at_order(&self, order: usize) -> usize {
        self.order2id[order]
    }

    /// Mutation primitive: bind a name to an id, extending `len` if the id
    /// is past the populated prefix.
    pub fn set_name_at(&mut self, id: usize, name: &str) {
        self.id2name[id] = Some(name.to_string());
        self.name2id.insert(name.to_string(), id);
        if id >= self.len {
            self.len = id + 1;
        }
    }

    /// Mutation primitive: assign a rank to an id, keeping `order2id` in sync.
    pub fn set_order_at(&mut self, id: usize, order: usize) {
        self.id2order[id] = order;
        self.order2id[order] = id;
    }

    /// Resize primitive: install a new name table and rebuild the name map.
    /// The populated length becomes the leading run of `Some` entries.
    pub fn replace_name_table(&mut self, names: Vec<Option<String>>) {
        self.name2id.clear();
        let mut len = 0;
        for (id, name) in names.iter().enumerate() {
            match name {
                Some(n) => {
                    self.name2id.insert(n.clone(), id);
                    len = id + 1;
                }
                None => break,
            }
        }
        self.id2name = names;
        self.len = len;
    }

    /// Resize primitive: install a new rank table and rebuild the inverse.
    /// Slots past the populated prefix keep identity ranks.
    pub fn replace_order_table(&mut self, ranks: Vec<usize>) {
        let mut order2id: Vec<usize> = (0..ranks.len()).collect();
        let bound = if self.len == 0 { ranks.len() } else { self.len };
        for (id, &rank) in ranks.iter().enumerate().take(bound) {
            order2id[rank] = id;
        }
        self.id2order = ranks;
        self.order2id = order2id;
    }

    /// Find the rank a new name should be inserted at so that it lands
    /// between its lexicographic neighbours among the currently known names.
    ///
    /// `ids_in_order` is the populated ids sorted by current rank, as
    /// produced by [`ContigCache::contigs_in_order`](crate::core::ContigCache::contigs_in_order).
    #[must_use]
    pub fn insertion_rank(&self, name: &str, ids_in_order: &[usize]) -> usize {
        let mut pos = ids_in_order.len();
        while pos > 0 {
            match self.name_of(ids_in_order[pos - 1]) {
                Some(existing) if existing > name => pos -= 1,
                _ => break,
            }
        }
        pos
    }
}
