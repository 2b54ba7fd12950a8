//! `Expression`: an ordered mapping from canonicalized [`SymbolicTerm`] to
//! scalar coefficient.
//!
//! The map is a [`BTreeMap`], never a hash map — spec.md §5 requires
//! iteration order to be the canonical order of terms, since downstream
//! consumers produce source code whose textual stability is a tested
//! property.

use crate::canonicalization::canonicalize;
use crate::orbital_space::OrbitalSpaceRegistry;
use crate::scalar::Scalar;
use crate::term::SymbolicTerm;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, Mul};

/// A sum of scalar-weighted, canonicalized `SymbolicTerm`s.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Expression {
    terms: BTreeMap<SymbolicTerm, Scalar>,
}

impl Expression {
    /// The empty expression (additive identity).
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of distinct terms currently carrying a nonzero
    /// coefficient.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether this expression has no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Iterates terms in canonical order, paired with their coefficients.
    pub fn iter(&self) -> impl Iterator<Item = (&SymbolicTerm, &Scalar)> {
        self.terms.iter()
    }

    /// The coefficient of `term` after canonicalizing a copy of it, or
    /// `None` if the (canonicalized) term is not present.
    pub fn coefficient_of(&self, term: &SymbolicTerm, osi: &OrbitalSpaceRegistry) -> Option<Scalar> {
        let mut local = term.clone();
        let sign = canonicalize(&mut local, osi);
        self.terms.get(&local).map(|c| c.clone() * sign)
    }

    /// Adds `coeff * term` into this expression (spec.md §4.3): `term` is
    /// canonicalized in a local copy, the returned sign is absorbed into
    /// `coeff`, and the result is summed into the existing entry for the
    /// canonical term (removing it if the new coefficient is zero).
    pub fn add(&mut self, term: &SymbolicTerm, coeff: Scalar, osi: &OrbitalSpaceRegistry) {
        let mut local = term.clone();
        let sign = canonicalize(&mut local, osi);
        let signed_coeff = coeff * sign;
        self.add_canonical(local, signed_coeff);
    }

    /// Adds a coefficient directly against a term already known to be
    /// canonical, skipping re-canonicalization. Used by the Wick engine,
    /// which canonicalizes each synthesized term itself.
    pub fn add_canonical(&mut self, canonical_term: SymbolicTerm, coeff: Scalar) {
        let new_coeff = match self.terms.remove(&canonical_term) {
            Some(existing) => existing + coeff,
            None => coeff,
        };
        if !new_coeff.is_zero() {
            self.terms.insert(canonical_term, new_coeff);
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

impl Add for Expression {
    type Output = Expression;
    fn add(self, rhs: Expression) -> Expression {
        let mut result = self;
        for (term, coeff) in rhs.terms {
            result.add_canonical(term, coeff);
        }
        result
    }
}

impl Mul<Scalar> for Expression {
    type Output = Expression;
    fn mul(self, rhs: Scalar) -> Expression {
        let mut result = self;
        result.scale(&rhs);
        result
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "0");
        }
        let parts: Vec<String> = self
            .terms
            .iter()
            .map(|(term, coeff)| format!("{coeff} {term}"))
            .collect();
        write!(f, "{}", parts.join(" + "))
    }
}
