//! Second-quantized creation/annihilation operators.

use crate::index::{reindex_one, Index, IndexMap};
use std::fmt;

/// Whether an [`SQOperator`] creates or annihilates a particle in its index's space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperatorKind {
    /// `a†`
    Creation,
    /// `a`
    Annihilation,
}

/// A single fermionic creation or annihilation operator carrying one index.
///
/// Ordering within a `SymbolicTerm`'s operator string is significant and
/// carries a sign on rearrangement (spec.md §3) — `SQOperator` itself only
/// orders by `(kind, index)` for use as a map/set key; the canonicalizer's
/// operator-sort key (`kind, space, pos_key, original_pos`) lives in
/// `canonicalization::operator_sort_key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SQOperator {
    kind: OperatorKind,
    index: Index,
}

impl SQOperator {
    /// Creates a new operator of the given kind carrying `index`.
    pub fn new(kind: OperatorKind, index: Index) -> Self {
        Self { kind, index }
    }

    /// Convenience constructor for a creation operator.
    pub fn creation(index: Index) -> Self {
        Self::new(OperatorKind::Creation, index)
    }

    /// Convenience constructor for an annihilation operator.
    pub fn annihilation(index: Index) -> Self {
        Self::new(OperatorKind::Annihilation, index)
    }

    /// The kind of this operator.
    pub fn kind(&self) -> OperatorKind {
        self.kind
    }

    /// The index this operator carries.
    pub fn index(&self) -> Index {
        self.index
    }

    /// A mutable reference to this operator's index.
    pub fn index_mut(&mut self) -> &mut Index {
        &mut self.index
    }

    /// Substitutes this operator's index per `idx_map`; missing keys pass
    /// through unchanged.
    pub fn reindex(&mut self, idx_map: &IndexMap) {
        self.index = reindex_one(self.index, idx_map);
    }
}

impl fmt::Display for SQOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            OperatorKind::Creation => write!(f, "{}+", self.index),
            OperatorKind::Annihilation => write!(f, "{}", self.index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_and_accessors() {
        let idx = Index::new(0, 3);
        let op = SQOperator::creation(idx);
        assert_eq!(op.kind(), OperatorKind::Creation);
        assert_eq!(op.index(), idx);
    }

    #[test]
    fn reindex_substitutes_index() {
        let mut map = IndexMap::new();
        let from = Index::new(0, 0);
        let to = Index::new(0, 7);
        map.insert(from, to);

        let mut op = SQOperator::annihilation(from);
        op.reindex(&map);
        assert_eq!(op.index(), to);
    }

    #[test]
    fn display_marks_creation_with_dagger() {
        let op = SQOperator::creation(Index::new(0, 1));
        assert_eq!(format!("{op}"), "01+");
    }
}
