//! # Wick-theorem algebra engine
//!
//! A symbolic algebra engine for second-quantized many-body operator
//! expressions in electronic-structure theory: an orbital-space/index
//! model, a canonical-form tensor/operator-string canonicalizer, a
//! diagrammatic operator layer with commutator/BCH expansion, a
//! Wick's-theorem contraction engine, and an equation layer that turns a
//! finished expression into generated tensor-contraction code.
//!
//! ## Example
//! ```rust
//! use wick_algebra::{
//!     diagram::{make_diag_operator, OperatorProduct},
//!     orbital_space::{OrbitalSpaceRegistry, RdmStructure},
//!     scalar::Scalar,
//!     wick::WickTheorem,
//! };
//!
//! let mut osi = OrbitalSpaceRegistry::new();
//! osi.add_space('o', RdmStructure::Occupied, ["i", "j", "k", "l"])?;
//! osi.add_space('v', RdmStructure::Unoccupied, ["a", "b", "c", "d"])?;
//!
//! // a one-body excitation operator a^+_a a_i
//! let t1 = make_diag_operator("t", &['v'], &['o'], &osi)?;
//! let product = OperatorProduct::new(vec![t1]);
//!
//! let wick = WickTheorem::new();
//! let fully_contracted = wick.contract(Scalar::one(), &product, 0, 0, &osi)?;
//! assert!(fully_contracted.is_empty()); // a^+_a a_i has no fully-contracted part
//! # Ok::<(), wick_algebra::error::WickError>(())
//! ```

pub mod canonicalization;
pub mod diagram;
pub mod equation;
pub mod error;
pub mod expression;
pub mod index;
pub mod orbital_space;
pub mod scalar;
pub mod sqoperator;
pub mod symmetry;
pub mod tensor;
pub mod term;
pub mod wick;

pub use canonicalization::canonicalize;
pub use diagram::{bch_series, commutator, make_diag_operator, DiagOperator, OpExpression, OperatorProduct};
pub use equation::Equation;
pub use error::{Result, WickError};
pub use expression::Expression;
pub use index::Index;
pub use orbital_space::{OrbitalSpaceRegistry, RdmStructure};
pub use scalar::Scalar;
pub use sqoperator::{OperatorKind, SQOperator};
pub use symmetry::Symmetry;
pub use tensor::Tensor;
pub use term::SymbolicTerm;
pub use wick::{PrintLevel, WickTheorem};

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
    fn end_to_end_single_excitation_fully_contracted_part_is_empty() {
        let osi = registry();
        let t1 = make_diag_operator("t", &['v'], &['o'], &osi).unwrap();
        let product = OperatorProduct::new(vec![t1]);

        let wick = WickTheorem::new();
        let expr = wick.contract(Scalar::one(), &product, 0, 0, &osi).unwrap();
        assert!(expr.is_empty());
    }

    #[test]
    fn end_to_end_two_operators_contract_to_occupied_delta() {
        let osi = registry();
        // a_i from one operator, a^+_j from another: opposite legs in the
        // occupied space contract to a single "eta" tensor.
        let op0 = make_diag_operator("", &[], &['o'], &osi).unwrap();
        let op1 = make_diag_operator("", &['o'], &[], &osi).unwrap();
        let product = OperatorProduct::new(vec![op0, op1]);

        let wick = WickTheorem::new();
        let expr = wick.contract(Scalar::one(), &product, 0, 0, &osi).unwrap();
        assert_eq!(expr.len(), 1);
    }
}
