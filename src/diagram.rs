//! The diagrammatic operator layer: operators described only by their
//! creation/annihilation leg counts per orbital space, with no explicit
//! indices. The Wick engine materializes indices from these counts
//! (spec.md §4.4); this module is the algebra above that layer —
//! products, commutators, and BCH expansion.
//!
//! No source file in the pack implements this layer directly (the
//! original's `diag_operator_api.cc` only exposes pybind11 bindings over
//! it), so the shapes below are grounded on that binding surface
//! (`DiagOpExpression::add`/`add2`, `__matmul__` as product, `commutator`,
//! `bch_series`) and built in the style of this crate's other ordered-map
//! types ([`crate::expression::Expression`]).

use crate::error::{Result, WickError};
use crate::orbital_space::OrbitalSpaceRegistry;
use crate::scalar::Scalar;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// One diagrammatic operator: a label and its creation/annihilation leg
/// counts per orbital space. `cre[s]`/`ann[s]` is the number of
/// creation/annihilation legs in space `s`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DiagOperator {
    label: String,
    cre: Vec<usize>,
    ann: Vec<usize>,
}

impl DiagOperator {
    /// Builds a diagrammatic operator from explicit per-space leg counts.
    pub fn new(label: impl Into<String>, cre: Vec<usize>, ann: Vec<usize>) -> Self {
        Self { label: label.into(), cre, ann }
    }

    /// The operator's label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Creation-leg counts per space.
    pub fn cre(&self) -> &[usize] {
        &self.cre
    }

    /// Annihilation-leg counts per space.
    pub fn ann(&self) -> &[usize] {
        &self.ann
    }

    /// Total number of legs (creation + annihilation, all spaces).
    pub fn rank(&self) -> usize {
        self.cre.iter().sum::<usize>() + self.ann.iter().sum::<usize>()
    }
}

impl fmt::Display for DiagOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[cre={:?},ann={:?}]", self.label, self.cre, self.ann)
    }
}

/// Resolves `cre_labels`/`ann_labels` (each a space label character) against
/// `osi` and builds the corresponding [`DiagOperator`] (spec.md §4.4).
///
/// # Errors
/// Returns [`WickError::Domain`] if any label is not a registered space.
pub fn make_diag_operator(
    label: impl Into<String>,
    cre_labels: &[char],
    ann_labels: &[char],
    osi: &OrbitalSpaceRegistry,
) -> Result<DiagOperator> {
    let num_spaces = osi.num_spaces();
    let mut cre = vec![0usize; num_spaces];
    let mut ann = vec![0usize; num_spaces];
    for &c in cre_labels {
        let s = osi.label_to_space(c)?;
        cre[s] += 1;
    }
    for &c in ann_labels {
        let s = osi.label_to_space(c)?;
        ann[s] += 1;
    }
    Ok(DiagOperator::new(label, cre, ann))
}

/// An ordered, left-to-right sequence of [`DiagOperator`]s.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct OperatorProduct(Vec<DiagOperator>);

impl OperatorProduct {
    /// Builds a product from an explicit left-to-right operator list.
    pub fn new(operators: Vec<DiagOperator>) -> Self {
        Self(operators)
    }

    /// The empty product (the identity factor).
    pub fn identity() -> Self {
        Self(Vec::new())
    }

    /// The factors, in order.
    pub fn operators(&self) -> &[DiagOperator] {
        &self.0
    }

    /// Total leg count across all factors.
    pub fn rank(&self) -> usize {
        self.0.iter().map(DiagOperator::rank).sum()
    }

    /// Concatenates `self` then `other` into one product, left to right.
    pub fn concat(&self, other: &OperatorProduct) -> OperatorProduct {
        let mut combined = self.0.clone();
        combined.extend(other.0.iter().cloned());
        OperatorProduct(combined)
    }
}

impl fmt::Display for OperatorProduct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|o| o.to_string()).collect();
        write!(f, "{}", parts.join(" "))
    }
}

/// A sum of scalar-weighted [`OperatorProduct`]s, ordered the same way
/// [`crate::expression::Expression`] orders `SymbolicTerm`s.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OpExpression {
    terms: BTreeMap<OperatorProduct, Scalar>,
}

impl OpExpression {
    /// The empty expression (additive identity).
    pub fn new() -> Self {
        Self::default()
    }

    /// A single-term expression, `coeff * product`.
    pub fn from_product(product: OperatorProduct, coeff: Scalar) -> Self {
        let mut expr = Self::new();
        expr.add(product, coeff);
        expr
    }

    /// The number of distinct products carrying a nonzero coefficient.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether this expression has no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Iterates products in canonical (lexicographic) order, paired with
    /// their coefficients.
    pub fn iter(&self) -> impl Iterator<Item = (&OperatorProduct, &Scalar)> {
        self.terms.iter()
    }

    /// Adds `coeff * product` into this expression, merging into any
    /// existing entry and dropping it if the result is zero.
    pub fn add(&mut self, product: OperatorProduct, coeff: Scalar) {
        let new_coeff = match self.terms.remove(&product) {
            Some(existing) => existing + coeff,
            None => coeff,
        };
        if !new_coeff.is_zero() {
            self.terms.insert(product, new_coeff);
        }
    }

    /// Scales every coefficient in place by `factor`.
    pub fn scale(&mut self, factor: &Scalar) {
        for coeff in self.terms.values_mut() {
            *coeff = coeff.clone() * factor.clone();
        }
        self.terms.retain(|_, c| !c.is_zero());
    }
}

impl Add for OpExpression {
    type Output = OpExpression;
    fn add(self, rhs: OpExpression) -> OpExpression {
        let mut result = self;
        for (product, coeff) in rhs.terms {
            result.add(product, coeff);
        }
        result
    }
}

impl Neg for OpExpression {
    type Output = OpExpression;
    fn neg(self) -> OpExpression {
        let mut result = self;
        result.scale(&Scalar::from_integer(-1));
        result
    }
}

impl Sub for OpExpression {
    type Output = OpExpression;
    fn sub(self, rhs: OpExpression) -> OpExpression {
        self + (-rhs)
    }
}

/// Distributes over both sums: every `(product, coeff)` pair of `self` is
/// concatenated with every pair of `rhs`, accumulating coefficient products.
impl Mul for OpExpression {
    type Output = OpExpression;
    fn mul(self, rhs: OpExpression) -> OpExpression {
        let mut result = OpExpression::new();
        for (p1, c1) in self.terms.iter() {
            for (p2, c2) in rhs.terms.iter() {
                result.add(p1.concat(p2), c1.clone() * c2.clone());
            }
        }
        result
    }
}

impl fmt::Display for OpExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "0");
        }
        let parts: Vec<String> = self
            .terms
            .iter()
            .map(|(product, coeff)| format!("{coeff} {product}"))
            .collect();
        write!(f, "{}", parts.join(" + "))
    }
}

/// `commutator(A, B) = A·B − B·A` (spec.md §4.4, property P5).
pub fn commutator(a: &OpExpression, b: &OpExpression) -> OpExpression {
    a.clone() * b.clone() - b.clone() * a.clone()
}

/// The Baker–Campbell–Hausdorff expansion of `exp(−B) A exp(B)` truncated at
/// commutator depth `n`: `Σ_{k=0..n} (1/k!) · ad_B^k(A)`, where `ad_B^0(A) =
/// A` and `ad_B^k(A) = [ad_B^{k-1}(A), B]` (spec.md §4.4, property P6).
///
/// # Errors
/// Returns [`WickError::Argument`] if `n` is large enough that `n!`
/// overflows `i64` (`n > 20`); no realistic truncation depth needs more.
pub fn bch_series(a: &OpExpression, b: &OpExpression, n: usize) -> Result<OpExpression> {
    if n > 20 {
        return Err(WickError::argument(format!(
            "bch_series truncation depth {n} is too large (factorial overflow)"
        )));
    }
    let mut nested = a.clone();
    let mut result = a.clone();
    let mut fact: i64 = 1;
    for k in 1..=n as i64 {
        nested = commutator(&nested, b);
        fact *= k;
        let coeff = Scalar::new(1, fact).expect("factorial is always nonzero");
        result = result + (nested.clone() * coeff);
    }
    Ok(result)
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

    #[test]
    fn make_diag_operator_resolves_space_labels() {
        let osi = registry();
        let op = make_diag_operator("t", &['v'], &['o'], &osi).unwrap();
        assert_eq!(op.cre(), &[0, 1]);
        assert_eq!(op.ann(), &[1, 0]);
        assert_eq!(op.rank(), 2);
    }

    #[test]
    fn make_diag_operator_rejects_unknown_label() {
        let osi = registry();
        assert!(make_diag_operator("t", &['z'], &[], &osi).is_err());
    }

    #[test]
    fn concat_preserves_left_to_right_order() {
        let a = DiagOperator::new("A", vec![1, 0], vec![0, 0]);
        let b = DiagOperator::new("B", vec![0, 1], vec![0, 0]);
        let pa = OperatorProduct::new(vec![a.clone()]);
        let pb = OperatorProduct::new(vec![b.clone()]);
        let combined = pa.concat(&pb);
        assert_eq!(combined.operators(), &[a, b]);
    }

    #[test]
    fn commutator_is_antisymmetric() {
        let a_op = DiagOperator::new("A", vec![1], vec![0]);
        let b_op = DiagOperator::new("B", vec![0], vec![1]);
        let a = OpExpression::from_product(OperatorProduct::new(vec![a_op]), Scalar::one());
        let b = OpExpression::from_product(OperatorProduct::new(vec![b_op]), Scalar::one());

        let ab = commutator(&a, &b);
        let ba = commutator(&b, &a);
        assert_eq!(ab, -ba);
    }

    #[test]
    fn commutator_of_operator_with_itself_is_zero() {
        let a_op = DiagOperator::new("A", vec![1], vec![0]);
        let a = OpExpression::from_product(OperatorProduct::new(vec![a_op]), Scalar::one());
        assert!(commutator(&a, &a).is_empty());
    }

    #[test]
    fn bch_series_depth_one_is_a_plus_commutator() {
        let a_op = DiagOperator::new("A", vec![1], vec![0]);
        let b_op = DiagOperator::new("B", vec![0], vec![1]);
        let a = OpExpression::from_product(OperatorProduct::new(vec![a_op]), Scalar::one());
        let b = OpExpression::from_product(OperatorProduct::new(vec![b_op]), Scalar::one());

        let expected = a.clone() + commutator(&a, &b);
        let actual = bch_series(&a, &b, 1).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn bch_series_with_zero_generator_is_identity() {
        let a_op = DiagOperator::new("A", vec![1], vec![0]);
        let a = OpExpression::from_product(OperatorProduct::new(vec![a_op]), Scalar::one());
        let zero = OpExpression::new();
        let result = bch_series(&a, &zero, 3).unwrap();
        assert_eq!(result, a);
    }
}
