//! `SymbolicTerm`: an ordered product of tensors and an ordered string of
//! second-quantized operators.

use crate::index::{num_indices_per_space, Index, IndexMap};
use crate::sqoperator::SQOperator;
use crate::tensor::Tensor;
use std::fmt;

/// An ordered product of [`Tensor`]s and an ordered product of
/// [`SQOperator`]s. The operator list is order-significant; the tensor
/// list is stored ordered but is algebraically order-insensitive — the
/// canonicalizer fixes a unique order (spec.md §3).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SymbolicTerm {
    tensors: Vec<Tensor>,
    operators: Vec<SQOperator>,
}

impl SymbolicTerm {
    /// An empty term (the multiplicative-identity scalar with no tensors or
    /// operators).
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a term from an explicit tensor list and operator string.
    pub fn with(tensors: Vec<Tensor>, operators: Vec<SQOperator>) -> Self {
        Self { tensors, operators }
    }

    /// The tensor factors, in their currently stored order.
    pub fn tensors(&self) -> &[Tensor] {
        &self.tensors
    }

    /// A mutable view of the tensor factors.
    pub fn tensors_mut(&mut self) -> &mut Vec<Tensor> {
        &mut self.tensors
    }

    /// The operator string, in order.
    pub fn operators(&self) -> &[SQOperator] {
        &self.operators
    }

    /// A mutable view of the operator string.
    pub fn operators_mut(&mut self) -> &mut Vec<SQOperator> {
        &mut self.operators
    }

    /// Appends a tensor factor.
    pub fn push_tensor(&mut self, tensor: Tensor) {
        self.tensors.push(tensor);
    }

    /// Appends an operator to the end of the operator string.
    pub fn push_operator(&mut self, op: SQOperator) {
        self.operators.push(op);
    }

    /// The number of operators in the term.
    pub fn num_operators(&self) -> usize {
        self.operators.len()
    }

    /// Whether the term carries any free (uncontracted) operators.
    pub fn has_free_operators(&self) -> bool {
        !self.operators.is_empty()
    }

    /// Tensor indices plus operator indices (spec.md §4.1): the full index
    /// set touched by this term, without deduplication, in
    /// tensors-then-operators order — matches
    /// `wicked/algebra/term.cc::SymbolicTerm::indices`.
    pub fn indices(&self) -> Vec<Index> {
        let mut result = Vec::new();
        for t in &self.tensors {
            result.extend(t.upper());
            result.extend(t.lower());
        }
        for op in &self.operators {
            result.push(op.index());
        }
        result
    }

    /// Substitutes every index occurrence (tensors and operators) per
    /// `idx_map`; missing keys pass through unchanged.
    pub fn reindex(&mut self, idx_map: &IndexMap) {
        for t in &mut self.tensors {
            t.reindex(idx_map);
        }
        for op in &mut self.operators {
            op.reindex(idx_map);
        }
    }

    /// Counts of all indices in the term (tensors + operators), per
    /// orbital space.
    pub fn num_indices_per_space(&self, num_spaces: usize) -> Vec<usize> {
        num_indices_per_space(&self.indices(), num_spaces)
    }

    /// Human-readable form: tensor factors, then the operator string in
    /// `{ ... }` braces if non-empty. Informative only (spec.md §6); never
    /// participates in equality.
    pub fn text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SymbolicTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = self.tensors.iter().map(|t| t.to_string()).collect();
        if !self.operators.is_empty() {
            let ops: Vec<String> = self.operators.iter().map(|o| o.to_string()).collect();
            parts.push(format!("{{{}}}", ops.join(" ")));
        }
        write!(f, "{}", parts.join(" "))
    }
}

/// Total order over `SymbolicTerm`s, used as the key type of [`Expression`]'s
/// ordered map (spec.md §5: "the map is ordered, not hashed"). Orders first
/// by the tensor list, then by the operator string, matching
/// `SymbolicTerm::operator<` in `wicked/algebra/term.cc` (tensors compared
/// first, operators break ties).
impl PartialOrd for SymbolicTerm {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SymbolicTerm {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.tensors
            .cmp(&other.tensors)
            .then_with(|| self.operators.cmp(&other.operators))
    }
}

impl Ord for SQOperator {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.kind()
            .cmp(&other.kind())
            .then_with(|| self.index().cmp(&other.index()))
    }
}
impl PartialOrd for SQOperator {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
