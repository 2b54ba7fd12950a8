//! Tensor slot symmetry.
//!
//! spec.md §3 models symmetry as one tag per `Tensor` (applied uniformly to
//! both the upper and the lower index group) rather than the teacher's
//! per-index-group symmetry list — a rewrite spec.md §9 calls for directly
//! ("a rewrite may model Antisymmetric, Symmetric, and Nonsymmetric as
//! variants, because canonicalization and printing differ per variant").
//! The permutation-parity machinery is kept from the teacher's
//! `symmetry.rs` almost verbatim, since cycle-decomposition parity is
//! symmetry-tag-agnostic.

/// The permutation symmetry of one index slot group (upper or lower) of a
/// [`Tensor`](crate::tensor::Tensor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symmetry {
    /// No symmetry: reordering the slot's indices is forbidden and must
    /// preserve the original order.
    Nonsymmetric,
    /// Permuting the slot's indices leaves the tensor unchanged.
    Symmetric,
    /// Permuting the slot's indices multiplies the tensor by the
    /// permutation's parity; two equal indices in the slot make the tensor
    /// zero.
    Antisymmetric,
}

impl Symmetry {
    /// The symmetry factor `n!` (Antisymmetric/Symmetric) or `1`
    /// (Nonsymmetric) for a slot of size `n`, per spec.md §3.
    pub fn factor(self, slot_len: usize) -> u64 {
        match self {
            Symmetry::Nonsymmetric => 1,
            Symmetry::Symmetric | Symmetry::Antisymmetric => factorial(slot_len),
        }
    }

    /// Whether this symmetry permits reordering a slot's indices at all.
    pub fn allows_reorder(self) -> bool {
        !matches!(self, Symmetry::Nonsymmetric)
    }

    /// The sign contributed by a given permutation of a slot under this
    /// symmetry: `+1` always for Symmetric, the permutation's parity for
    /// Antisymmetric, and `+1` for Nonsymmetric (since no reorder is ever
    /// actually applied for that variant).
    pub fn permutation_sign(self, permutation: &[usize]) -> i32 {
        match self {
            Symmetry::Nonsymmetric | Symmetry::Symmetric => 1,
            Symmetry::Antisymmetric => permutation_parity(permutation),
        }
    }
}

fn factorial(n: usize) -> u64 {
    (1..=n as u64).product()
}

/// The parity of a permutation given in one-line notation: `+1` for an even
/// permutation, `-1` for odd. Grounded on
/// `butler_portugal::symmetry::permutation_parity`.
pub fn permutation_parity(permutation: &[usize]) -> i32 {
    let n = permutation.len();
    let mut visited = vec![false; n];
    let mut sign = 1;

    for i in 0..n {
        if visited[i] {
            continue;
        }
        let mut cycle_length = 0;
        let mut current = i;
        while !visited[current] {
            visited[current] = true;
            current = permutation[current];
            cycle_length += 1;
        }
        if cycle_length % 2 == 0 {
            sign *= -1;
        }
    }
    sign
}

/// Returns the permutation that sorts `keys` (stably, breaking ties by
/// original position) together with its parity, used by the canonicalizer
/// to both reorder a slot and account for the resulting sign.
pub fn sort_permutation<T: Ord + Clone>(keys: &[T]) -> (Vec<usize>, i32) {
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by(|&a, &b| keys[a].cmp(&keys[b]).then(a.cmp(&b)));
    // `order[i]` is the original index now occupying position `i`; the
    // parity of this assignment is the parity of `order` itself.
    let parity = permutation_parity(&order);
    (order, parity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symmetry_factor() {
        assert_eq!(Symmetry::Antisymmetric.factor(3), 6);
        assert_eq!(Symmetry::Symmetric.factor(3), 6);
        assert_eq!(Symmetry::Nonsymmetric.factor(3), 1);
    }

    #[test]
    fn permutation_parity_examples() {
        assert_eq!(permutation_parity(&[0, 1, 2]), 1);
        assert_eq!(permutation_parity(&[1, 0, 2]), -1);
        assert_eq!(permutation_parity(&[2, 1, 0]), -1);
    }

    #[test]
    fn antisymmetric_sign_matches_parity() {
        let sym = Symmetry::Antisymmetric;
        assert_eq!(sym.permutation_sign(&[1, 0]), -1);
        assert_eq!(Symmetry::Symmetric.permutation_sign(&[1, 0]), 1);
        assert_eq!(Symmetry::Nonsymmetric.permutation_sign(&[1, 0]), 1);
    }

    #[test]
    fn sort_permutation_reports_parity() {
        let keys = vec![3, 1, 2];
        let (order, parity) = sort_permutation(&keys);
        assert_eq!(order, vec![1, 2, 0]);
        assert_eq!(parity, permutation_parity(&order));
    }
}
