//! `Equation`: a single `lhs += factor * rhs` assignment between two
//! [`SymbolicTerm`]s, plus the code-generation step that turns a finished
//! [`Expression`](crate::expression::Expression) into compilable assignments.
//!
//! Grounded on `wicked/algebra/equation.{h,cc}` (`Equation::set_summation_indices`,
//! `Equation::expand_integrals_to_mulliken`, `Equation::compile`).

use crate::error::{Result, WickError};
use crate::expression::Expression;
use crate::index::Index;
use crate::orbital_space::OrbitalSpaceRegistry;
use crate::scalar::Scalar;
use crate::symmetry::Symmetry;
use crate::tensor::Tensor;
use crate::term::SymbolicTerm;
use std::fmt;

/// A single assignment `lhs += factor * rhs`, the unit of generated code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Equation {
    lhs: SymbolicTerm,
    rhs: SymbolicTerm,
    factor: Scalar,
}

impl Equation {
    /// Builds an equation from an explicit left-hand side, right-hand side
    /// and scalar factor.
    pub fn new(lhs: SymbolicTerm, rhs: SymbolicTerm, factor: Scalar) -> Self {
        Self { lhs, rhs, factor }
    }

    /// The left-hand side (target) term.
    pub fn lhs(&self) -> &SymbolicTerm {
        &self.lhs
    }

    /// The right-hand side (source) term.
    pub fn rhs(&self) -> &SymbolicTerm {
        &self.rhs
    }

    /// The scalar factor multiplying the right-hand side.
    pub fn rhs_factor(&self) -> &Scalar {
        &self.factor
    }

    /// The right-hand side as a single-term expression, `factor * rhs`.
    pub fn rhs_expression(&self, osi: &OrbitalSpaceRegistry) -> Expression {
        let mut expr = Expression::new();
        expr.add(&self.rhs, self.factor.clone(), osi);
        expr
    }

    /// Marks every right-hand-side index not appearing among the
    /// left-hand-side's tensor indices as `summed` (spec.md §4.6): the
    /// left-hand side's tensor indices are the *target* indices (those that
    /// survive into the generated assignment's free-index loop), and
    /// anything else on the right is contracted over.
    pub fn set_summation_indices(&mut self) {
        let mut target_indices: Vec<Index> = Vec::new();
        for t in self.lhs.tensors() {
            for idx in t.upper().iter().chain(t.lower()) {
                if !target_indices.contains(idx) {
                    target_indices.push(*idx);
                }
            }
        }

        for t in self.rhs.tensors_mut() {
            for idx in t.upper_mut().iter_mut().chain(t.lower_mut()) {
                if !target_indices.contains(idx) {
                    idx.set_summed(true);
                }
            }
        }
        for op in self.rhs.operators_mut() {
            if !target_indices.contains(&op.index()) {
                op.index_mut().set_summed(true);
            }
        }
    }

    /// Expands an antisymmetrized two-electron integral tensor labeled `"V"`
    /// on the right-hand side into a pair of Mulliken-ordered ("chemist's
    /// notation") integrals: `<pq||rs> = (pr|qs) - (ps|qr)`.
    ///
    /// If no tensor labeled `"V"` appears on the right-hand side, returns
    /// `vec![self.clone()]` unchanged. Otherwise returns two equations
    /// sharing this equation's left-hand side: the first rewrites `V` to a
    /// Mulliken-ordered tensor labeled `"I"` with slots `(p, r | q, s)`; the
    /// second does the same with slots `(p, s | q, r)` and a negated
    /// factor. Only the first `"V"` tensor found is expanded.
    pub fn expand_integrals_to_mulliken(&self) -> Vec<Equation> {
        let Some(pos) = self.rhs.tensors().iter().position(|t| t.label() == "V") else {
            return vec![self.clone()];
        };

        let v = &self.rhs.tensors()[pos];
        let p = v.upper()[0];
        let q = v.upper()[1];
        let r = v.lower()[0];
        let s = v.lower()[1];

        let mut rhs_one = self.rhs.clone();
        rhs_one.tensors_mut()[pos] = Tensor::new("I", vec![p, r], vec![q, s], Symmetry::Nonsymmetric);
        let one = Equation::new(self.lhs.clone(), rhs_one, self.factor.clone());

        let mut rhs_two = self.rhs.clone();
        rhs_two.tensors_mut()[pos] = Tensor::new("I", vec![p, s], vec![q, r], Symmetry::Nonsymmetric);
        let two = Equation::new(self.lhs.clone(), rhs_two, -self.factor.clone());

        vec![one, two]
    }

    /// Renders this equation in one of the code-generation formats spec.md
    /// §6 names.
    ///
    /// # Errors
    /// Returns [`WickError::Argument`] if `format` is not `"ambit"` or
    /// `"einsum"`.
    pub fn compile(&self, format: &str, osi: &OrbitalSpaceRegistry) -> Result<String> {
        match format {
            "ambit" => Ok(self.compile_ambit()),
            "einsum" => self.compile_einsum(osi),
            other => Err(WickError::argument(format!(
                "compile() - '{other}' is not a valid format; choices are 'ambit' or 'einsum'"
            ))),
        }
    }

    fn compile_ambit(&self) -> String {
        format!(
            "{}[\"{}\"] += {} * {};",
            self.lhs.tensors().first().map_or("", |t| t.label()),
            ambit_indices(&self.lhs),
            self.factor,
            ambit_rhs(&self.rhs),
        )
    }

    fn compile_einsum(&self, osi: &OrbitalSpaceRegistry) -> String {
        let mut label_map = IndexLabeler::new();
        let lhs_tensor = self.lhs.tensors().first();
        let lhs_label = lhs_tensor.map_or_else(String::new, |t| {
            format!("{}{}", t.label(), einsum_space_suffix(t, osi))
        });

        let operand_indices: Vec<String> = self
            .rhs
            .tensors()
            .iter()
            .map(|t| label_map.label_tensor(t))
            .collect();
        let output_indices = lhs_tensor.map_or_else(String::new, |t| label_map.label_tensor(t));

        let operand_refs: Vec<String> = self
            .rhs
            .tensors()
            .iter()
            .map(|t| format!("{}[\"{}\"]", t.label(), einsum_space_suffix(t, osi)))
            .collect();

        let factor = self.factor.to_f64_checked().unwrap_or(0.0);
        format!(
            "{lhs_label} += {factor:.9} * np.einsum(\"{}->{output_indices}\",{},optimize=\"optimal\")",
            operand_indices.join(","),
            operand_refs.join(","),
        )
    }
}

fn ambit_indices(term: &SymbolicTerm) -> String {
    term.tensors()
        .first()
        .map(|t| t.upper().iter().chain(t.lower()).map(Index::to_string).collect::<Vec<_>>().join(","))
        .unwrap_or_default()
}

fn ambit_rhs(term: &SymbolicTerm) -> String {
    term.tensors()
        .iter()
        .map(|t| format!("{}[\"{}\"]", t.label(), ambit_indices_of(t)))
        .collect::<Vec<_>>()
        .join(" * ")
}

fn ambit_indices_of(t: &Tensor) -> String {
    t.upper().iter().chain(t.lower()).map(Index::to_string).collect::<Vec<_>>().join(",")
}

fn einsum_space_suffix(t: &Tensor, osi: &OrbitalSpaceRegistry) -> String {
    t.upper()
        .iter()
        .chain(t.lower())
        .map(|idx| osi.label(idx.space()).unwrap_or('?'))
        .collect()
}

/// Assigns each distinct index a fresh single-character `einsum` subscript,
/// drawn from a fixed alphabet, in first-seen order.
struct IndexLabeler {
    seen: Vec<(Index, char)>,
    unused: Vec<char>,
}

impl IndexLabeler {
    fn new() -> Self {
        Self {
            seen: Vec::new(),
            unused: "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ".chars().rev().collect(),
        }
    }

    fn label_tensor(&mut self, t: &Tensor) -> String {
        t.upper().iter().chain(t.lower()).map(|idx| self.label_index(*idx)).collect()
    }

    fn label_index(&mut self, idx: Index) -> char {
        if let Some((_, c)) = self.seen.iter().find(|(i, _)| *i == idx) {
            return *c;
        }
        let c = self.unused.pop().unwrap_or('?');
        self.seen.push((idx, c));
        c
    }
}

impl fmt::Display for Equation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} += {} {}", self.lhs, self.factor, self.rhs)
    }
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
    fn set_summation_indices_flags_non_target_indices() {
        let lhs_t = Tensor::new("T", vec![idx(1, 0)], vec![idx(0, 0)], Symmetry::Nonsymmetric);
        let lhs = SymbolicTerm::with(vec![lhs_t], vec![]);

        let rhs_t = Tensor::new(
            "V",
            vec![idx(1, 0), idx(1, 1)],
            vec![idx(0, 0), idx(0, 1)],
            Symmetry::Antisymmetric,
        );
        let rhs = SymbolicTerm::with(vec![rhs_t], vec![]);

        let mut eq = Equation::new(lhs, rhs, Scalar::one());
        eq.set_summation_indices();

        let rhs_tensor = &eq.rhs().tensors()[0];
        assert!(!rhs_tensor.upper()[0].is_summed()); // idx(1,0) is a target index
        assert!(rhs_tensor.upper()[1].is_summed()); // idx(1,1) is summed
        assert!(!rhs_tensor.lower()[0].is_summed()); // idx(0,0) is a target index
        assert!(rhs_tensor.lower()[1].is_summed()); // idx(0,1) is summed
    }

    #[test]
    fn expand_integrals_to_mulliken_splits_into_two_equations_with_opposite_factor() {
        let lhs_t = Tensor::new("T", vec![], vec![], Symmetry::Nonsymmetric);
        let lhs = SymbolicTerm::with(vec![lhs_t], vec![]);

        let p = idx(1, 0);
        let q = idx(1, 1);
        let r = idx(0, 0);
        let s = idx(0, 1);
        let v = Tensor::new("V", vec![p, q], vec![r, s], Symmetry::Antisymmetric);
        let rhs = SymbolicTerm::with(vec![v], vec![]);

        let eq = Equation::new(lhs, rhs, Scalar::one());
        let expanded = eq.expand_integrals_to_mulliken();
        assert_eq!(expanded.len(), 2);

        let one = &expanded[0].rhs().tensors()[0];
        assert_eq!(one.label(), "I");
        assert_eq!(one.upper(), &[p, r]);
        assert_eq!(one.lower(), &[q, s]);
        assert_eq!(*expanded[0].rhs_factor(), Scalar::one());

        let two = &expanded[1].rhs().tensors()[0];
        assert_eq!(two.upper(), &[p, s]);
        assert_eq!(two.lower(), &[q, r]);
        assert_eq!(*expanded[1].rhs_factor(), -Scalar::one());
    }

    #[test]
    fn expand_integrals_is_identity_when_no_v_tensor_present() {
        let lhs = SymbolicTerm::with(vec![Tensor::new("T", vec![], vec![], Symmetry::Nonsymmetric)], vec![]);
        let rhs = SymbolicTerm::with(vec![Tensor::new("f", vec![], vec![], Symmetry::Nonsymmetric)], vec![]);
        let eq = Equation::new(lhs, rhs, Scalar::one());
        assert_eq!(eq.expand_integrals_to_mulliken(), vec![eq.clone()]);
    }

    #[test]
    fn compile_rejects_unknown_format() {
        let lhs = SymbolicTerm::new();
        let rhs = SymbolicTerm::new();
        let eq = Equation::new(lhs, rhs, Scalar::one());
        let err = eq.compile("fortran", &registry()).unwrap_err();
        assert!(matches!(err, WickError::Argument(_)));
    }

    #[test]
    fn compile_ambit_includes_label_and_factor() {
        let osi = registry();
        let lhs = SymbolicTerm::with(
            vec![Tensor::new("T", vec![idx(1, 0)], vec![idx(0, 0)], Symmetry::Nonsymmetric)],
            vec![],
        );
        let rhs = SymbolicTerm::with(
            vec![Tensor::new("f", vec![idx(1, 0)], vec![idx(0, 0)], Symmetry::Nonsymmetric)],
            vec![],
        );
        let eq = Equation::new(lhs, rhs, Scalar::new(1, 2).unwrap());
        let code = eq.compile("ambit", &osi).unwrap();
        assert!(code.starts_with("T[\""));
        assert!(code.contains("1/2"));
        assert!(code.contains("f[\""));
    }

    #[test]
    fn compile_einsum_includes_space_suffixed_labels() {
        let osi = registry();
        let lhs = SymbolicTerm::with(
            vec![Tensor::new("T", vec![idx(1, 0)], vec![idx(0, 0)], Symmetry::Nonsymmetric)],
            vec![],
        );
        let rhs = SymbolicTerm::with(
            vec![Tensor::new("f", vec![idx(1, 0)], vec![idx(0, 0)], Symmetry::Nonsymmetric)],
            vec![],
        );
        let eq = Equation::new(lhs, rhs, Scalar::one());
        let code = eq.compile("einsum", &osi).unwrap();
        assert!(code.starts_with("Tvo"));
        assert!(code.contains("np.einsum"));
        assert!(code.contains("f[\"vo\"]"));
    }
}
