//! Dummy/free index representation.
//!
//! An `Index` identifies one leg of a tensor or operator: which orbital
//! space it belongs to, and its position within that space. Grounded on
//! `wicked/algebra/index.h` (referenced throughout `term.cc`) and on the
//! teacher's own `TensorIndex` (`src/index.rs`), kept as an ordered,
//! `Copy`-able value type in the same style.

use std::fmt;

/// A single tensor/operator index: `(space, pos)`, with an orthogonal
/// "is this a summed dummy" flag that does not participate in identity.
///
/// Equality and ordering are lexicographic on `(space, pos)` alone — two
/// indices with the same `(space, pos)` but different `summed` flags are
/// the same index (spec.md §3: "the `summed` flag does not participate in
/// identity").
#[derive(Debug, Clone, Copy)]
pub struct Index {
    space: usize,
    pos: i64,
    summed: bool,
}

impl Index {
    /// Creates a new index in the given space at the given position.
    ///
    /// `pos < 0` is invalid per spec.md §3; callers that cannot guarantee
    /// this statically should prefer [`Index::try_new`].
    pub fn new(space: usize, pos: i64) -> Self {
        debug_assert!(pos >= 0, "index position must be non-negative");
        Self {
            space,
            pos,
            summed: false,
        }
    }

    /// Fallible constructor; rejects a negative position.
    ///
    /// # Errors
    /// Returns [`crate::error::WickError::Domain`] if `pos < 0`.
    pub fn try_new(space: usize, pos: i64) -> crate::error::Result<Self> {
        if pos < 0 {
            return Err(crate::error::WickError::domain(format!(
                "index position {pos} is negative"
            )));
        }
        Ok(Self {
            space,
            pos,
            summed: false,
        })
    }

    /// The orbital space this index belongs to.
    pub fn space(&self) -> usize {
        self.space
    }

    /// The position of this index within its space.
    pub fn pos(&self) -> i64 {
        self.pos
    }

    /// Whether this index is marked as a summed dummy.
    pub fn is_summed(&self) -> bool {
        self.summed
    }

    /// Sets the summed flag, returning the updated index.
    pub fn with_summed(mut self, summed: bool) -> Self {
        self.summed = summed;
        self
    }

    /// Sets the summed flag in place.
    pub fn set_summed(&mut self, summed: bool) {
        self.summed = summed;
    }

    /// Returns a copy of this index relabeled to a new `(space, pos)`,
    /// preserving the summed flag.
    pub fn relabeled(&self, space: usize, pos: i64) -> Self {
        Self {
            space,
            pos,
            summed: self.summed,
        }
    }

    /// The `(space, pos)` identity key used for equality/ordering.
    fn key(&self) -> (usize, i64) {
        (self.space, self.pos)
    }
}

impl PartialEq for Index {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}
impl Eq for Index {}

impl std::hash::Hash for Index {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for Index {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Index {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.space, self.pos)
    }
}

/// A substitution map used by `reindex`: missing keys pass through
/// unchanged (spec.md §4.1).
pub type IndexMap = std::collections::HashMap<Index, Index>;

/// Substitutes each occurrence of a key in `idx_map` with its value.
/// Indices not present in `idx_map` pass through unchanged.
pub fn reindex_one(index: Index, idx_map: &IndexMap) -> Index {
    idx_map.get(&index).copied().unwrap_or(index)
}

/// Counts occurrences of each space among `indices`, returning a vector of
/// length `num_spaces`. Grounded on `num_indices_per_space` used throughout
/// `wicked/algebra/term.cc`.
pub fn num_indices_per_space(indices: &[Index], num_spaces: usize) -> Vec<usize> {
    let mut counts = vec![0usize; num_spaces];
    for idx in indices {
        if idx.space() < num_spaces {
            counts[idx.space()] += 1;
        }
    }
    counts
}
