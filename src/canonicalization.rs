//! Canonicalization of a [`SymbolicTerm`] to a unique representative.
//!
//! Grounded on `wicked/algebra/term.cc::SymbolicTerm::canonicalize` (the
//! `NEW_CANONICALIZATION` branch; the legacy tuple without connectivity, and
//! the commented-out `canonicalize_best` tableau search, are not carried
//! forward — see SPEC_FULL.md §9). The four steps below are the same four
//! steps that function performs, generalized from the original's
//! always-antisymmetric tensors to the per-tensor [`Symmetry`] tag this
//! crate carries.

use crate::index::Index;
use crate::orbital_space::OrbitalSpaceRegistry;
use crate::scalar::Scalar;
use crate::sqoperator::{OperatorKind, SQOperator};
use crate::symmetry::{permutation_parity, sort_permutation, Symmetry};
use crate::tensor::Tensor;
use crate::term::SymbolicTerm;
use std::collections::{HashMap, HashSet};

/// Canonicalizes `term` in place and returns the sign accumulated by the
/// rearrangements (spec.md §4.2). The term's tensors, operator string and
/// dummy-index labels are rewritten; its algebraic value is preserved up to
/// this returned sign.
///
/// If any tensor is forced to zero by a repeated index in an antisymmetric
/// slot, the term is left in its (now partially relabeled) state and
/// [`Scalar::zero`] is returned; callers should drop such terms.
pub fn canonicalize(term: &mut SymbolicTerm, osi: &OrbitalSpaceRegistry) -> Scalar {
    sort_tensors_by_score(term, osi);
    relabel_dummy_indices(term, osi);
    let mut sign = sort_tensor_index_slots(term);

    if term.tensors().iter().any(Tensor::is_zero_by_antisymmetry) {
        return Scalar::zero();
    }

    sign *= sort_operator_string(term);
    Scalar::from_integer(sign as i64)
}

/// Step 1: sort tensors by `(label, rank, num_low, num_upp, lower_conn,
/// upper_conn, tensor)`, matching the `score_t` tuple in `term.cc`.
fn sort_tensors_by_score(term: &mut SymbolicTerm, osi: &OrbitalSpaceRegistry) {
    let num_spaces = osi.num_spaces();
    let tensors = term.tensors().to_vec();

    let mut scored: Vec<(
        String,
        usize,
        Vec<usize>,
        Vec<usize>,
        Vec<(String, Vec<usize>)>,
        Vec<(String, Vec<usize>)>,
        Tensor,
    )> = tensors
        .iter()
        .map(|t| {
            let num_low = t.num_lower_per_space(num_spaces);
            let num_upp = t.num_upper_per_space(num_spaces);
            let lower_conn = tensor_connectivity(&tensors, t, false, num_spaces);
            let upper_conn = tensor_connectivity(&tensors, t, true, num_spaces);
            (
                t.label().to_string(),
                t.rank(),
                num_low,
                num_upp,
                lower_conn,
                upper_conn,
                t.clone(),
            )
        })
        .collect();

    scored.sort();
    *term.tensors_mut() = scored.into_iter().map(|s| s.6).collect();
}

/// For tensor `t`'s upper (or lower) slot, the per-other-tensor count of
/// indices shared with that tensor's opposite slot, keyed by the other
/// tensor's label and sorted — matches
/// `SymbolicTerm::tensor_connectivity` in `term.cc`.
fn tensor_connectivity(
    tensors: &[Tensor],
    t: &Tensor,
    upper: bool,
    num_spaces: usize,
) -> Vec<(String, Vec<usize>)> {
    let mut indices: Vec<Index> = if upper { t.upper().to_vec() } else { t.lower().to_vec() };
    indices.sort();

    let mut result = Vec::new();
    for other in tensors {
        if other == t {
            continue;
        }
        let mut opposite: Vec<Index> = if upper { other.lower().to_vec() } else { other.upper().to_vec() };
        opposite.sort();

        let common: Vec<Index> = indices
            .iter()
            .filter(|idx| opposite.binary_search(idx).is_ok())
            .copied()
            .collect();

        result.push((
            other.label().to_string(),
            crate::index::num_indices_per_space(&common, num_spaces),
        ));
    }
    result.sort();
    result
}

/// Step 2: assign dense per-space labels to dummy indices. Indices shared
/// with a free operator are numbered from one counter
/// (`sqop_index_count`); indices private to the tensor network are numbered
/// from another (`tens_index_count`), which starts pre-offset by the number
/// of operator indices in that space — matches `term.cc` exactly.
fn relabel_dummy_indices(term: &mut SymbolicTerm, osi: &OrbitalSpaceRegistry) {
    let num_spaces = osi.num_spaces();
    let mut sqop_index_count = vec![0i64; num_spaces];
    let mut tens_index_count = vec![0i64; num_spaces];
    let mut index_map: HashMap<Index, Index> = HashMap::new();
    let mut is_operator_index: HashSet<Index> = HashSet::new();

    for sqop in term.operators() {
        let s = sqop.index().space();
        if s < num_spaces {
            tens_index_count[s] += 1;
        }
        is_operator_index.insert(sqop.index());
    }

    let mut assign = |idx: Index,
                      index_map: &mut HashMap<Index, Index>,
                      sqop_index_count: &mut [i64],
                      tens_index_count: &mut [i64]| {
        if index_map.contains_key(&idx) {
            return;
        }
        let s = idx.space();
        let new_idx = if is_operator_index.contains(&idx) {
            let pos = sqop_index_count[s];
            sqop_index_count[s] += 1;
            Index::new(s, pos)
        } else {
            let pos = tens_index_count[s];
            tens_index_count[s] += 1;
            Index::new(s, pos)
        };
        index_map.insert(idx, new_idx);
    };

    for tensor in term.tensors() {
        for l in tensor.lower() {
            assign(*l, &mut index_map, &mut sqop_index_count, &mut tens_index_count);
        }
        for u in tensor.upper() {
            assign(*u, &mut index_map, &mut sqop_index_count, &mut tens_index_count);
        }
    }

    term.reindex(&index_map);
}

/// Step 3: sort each tensor's upper and lower index slots into `(space,
/// pos)` order, accumulating the permutation sign contributed by each
/// reorder under that tensor's symmetry (spec.md §4.2 step 3 generalizes
/// `term.cc`'s always-antisymmetric reorder to the per-tensor tag).
fn sort_tensor_index_slots(term: &mut SymbolicTerm) -> i32 {
    let mut sign = 1;
    for tensor in term.tensors_mut() {
        let symmetry = tensor.symmetry();

        let (new_upper, upper_sign) = canonicalize_slot(tensor.upper(), symmetry);
        tensor.set_upper(new_upper);
        sign *= upper_sign;

        let (new_lower, lower_sign) = canonicalize_slot(tensor.lower(), symmetry);
        tensor.set_lower(new_lower);
        sign *= lower_sign;
    }
    sign
}

fn canonicalize_slot(indices: &[Index], symmetry: Symmetry) -> (Vec<Index>, i32) {
    if indices.len() <= 1 || !symmetry.allows_reorder() {
        return (indices.to_vec(), 1);
    }
    let (order, _) = sort_permutation(indices);
    let sign = symmetry.permutation_sign(&order);
    let new_indices = order.iter().map(|&i| indices[i]).collect();
    (new_indices, sign)
}

/// Step 4: sort the operator string by `(kind, space, signed_pos,
/// original_pos)`, where annihilators sort on `-pos` — matches `term.cc`'s
/// "annihilation operators are written in reverse order" convention.
fn sort_operator_string(term: &mut SymbolicTerm) -> i32 {
    let operators = term.operators().to_vec();
    let mut keyed: Vec<(u8, usize, i64, usize)> = operators
        .iter()
        .enumerate()
        .map(|(pos, op)| {
            let kind_rank = match op.kind() {
                OperatorKind::Creation => 0u8,
                OperatorKind::Annihilation => 1u8,
            };
            let signed_pos = match op.kind() {
                OperatorKind::Creation => op.index().pos(),
                OperatorKind::Annihilation => -op.index().pos(),
            };
            (kind_rank, op.index().space(), signed_pos, pos)
        })
        .collect();
    keyed.sort();

    let order: Vec<usize> = keyed.iter().map(|k| k.3).collect();
    let sign = permutation_parity(&order);

    let new_operators: Vec<SQOperator> = order.iter().map(|&i| operators[i]).collect();
    *term.operators_mut() = new_operators;
    sign
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orbital_space::RdmStructure;

    fn registry() -> OrbitalSpaceRegistry {
        let mut osi = OrbitalSpaceRegistry::new();
        osi.add_space('o', RdmStructure::Occupied, ["i", "j", "k", "l"]).unwrap();
        osi.add_space('v', RdmStructure::Unoccupied, ["a", "b", "c", "d"]).unwrap();
        osi
    }

    fn idx(space: usize, pos: i64) -> Index {
        Index::new(space, pos)
    }

    #[test]
    fn relabels_dummy_indices_densely() {
        let osi = registry();
        let tensor = Tensor::new("f", vec![idx(0, 7)], vec![idx(0, 3)], Symmetry::Nonsymmetric);
        let mut term = SymbolicTerm::with(vec![tensor], vec![]);
        let sign = canonicalize(&mut term, &osi);
        assert_eq!(sign, Scalar::one());
        assert_eq!(term.tensors()[0].upper(), &[idx(0, 0)]);
        assert_eq!(term.tensors()[0].lower(), &[idx(0, 1)]);
    }

    #[test]
    fn antisymmetric_slot_reorder_carries_sign() {
        let osi = registry();
        let tensor = Tensor::new(
            "V",
            vec![idx(0, 5), idx(0, 2)],
            vec![],
            Symmetry::Antisymmetric,
        );
        let mut term = SymbolicTerm::with(vec![tensor], vec![]);
        let sign = canonicalize(&mut term, &osi);
        assert_eq!(sign, Scalar::from_integer(-1));
        assert_eq!(term.tensors()[0].upper(), &[idx(0, 0), idx(0, 1)]);
    }

    #[test]
    fn nonsymmetric_slot_is_never_reordered() {
        let osi = registry();
        let tensor = Tensor::new(
            "t",
            vec![],
            vec![idx(0, 5), idx(0, 2)],
            Symmetry::Nonsymmetric,
        );
        let mut term = SymbolicTerm::with(vec![tensor], vec![]);
        canonicalize(&mut term, &osi);
        // relabeling still applies, but in original slot order: first-seen
        // index (5) gets label 0, second (2) gets label 1.
        assert_eq!(term.tensors()[0].lower(), &[idx(0, 0), idx(0, 1)]);
    }

    #[test]
    fn operator_string_sorts_creation_before_annihilation() {
        let osi = registry();
        let a = SQOperator::annihilation(idx(0, 0));
        let c = SQOperator::creation(idx(0, 1));
        let mut term = SymbolicTerm::with(vec![], vec![a, c]);
        canonicalize(&mut term, &osi);
        assert_eq!(term.operators()[0].kind(), OperatorKind::Creation);
        assert_eq!(term.operators()[1].kind(), OperatorKind::Annihilation);
    }

    #[test]
    fn annihilators_sort_by_negated_position() {
        let osi = registry();
        let a0 = SQOperator::annihilation(idx(0, 0));
        let a1 = SQOperator::annihilation(idx(0, 1));
        let mut term = SymbolicTerm::with(vec![], vec![a0, a1]);
        canonicalize(&mut term, &osi);
        // -0 < -1 is false (0 > -1), so a1 (pos 1, key -1) sorts before a0 (pos 0, key 0).
        assert_eq!(term.operators()[0].index(), idx(0, 1));
        assert_eq!(term.operators()[1].index(), idx(0, 0));
    }

    #[test]
    fn shared_operator_index_uses_sqop_counter() {
        let osi = registry();
        let op = SQOperator::creation(idx(0, 9));
        let tensor = Tensor::new("f", vec![idx(0, 9)], vec![], Symmetry::Nonsymmetric);
        let mut term = SymbolicTerm::with(vec![tensor], vec![op]);
        canonicalize(&mut term, &osi);
        assert_eq!(term.operators()[0].index(), idx(0, 0));
        assert_eq!(term.tensors()[0].upper(), &[idx(0, 0)]);
    }

    #[test]
    fn duplicate_index_in_antisymmetric_slot_canonicalizes_to_zero() {
        let osi = registry();
        let tensor = Tensor::new("V", vec![idx(0, 0), idx(0, 0)], vec![], Symmetry::Antisymmetric);
        let mut term = SymbolicTerm::with(vec![tensor], vec![]);
        let sign = canonicalize(&mut term, &osi);
        assert_eq!(sign, Scalar::zero());
    }

    #[test]
    fn tensor_score_sorts_by_label_first() {
        let osi = registry();
        let g = Tensor::new("g", vec![], vec![idx(0, 0)], Symmetry::Nonsymmetric);
        let f = Tensor::new("f", vec![], vec![idx(0, 1)], Symmetry::Nonsymmetric);
        let mut term = SymbolicTerm::with(vec![g, f], vec![]);
        canonicalize(&mut term, &osi);
        assert_eq!(term.tensors()[0].label(), "f");
        assert_eq!(term.tensors()[1].label(), "g");
    }
}
