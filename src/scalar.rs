//! Scalar coefficients: arbitrary-precision rationals, with an optional
//! complex-rational extension for the diagrammatic layer.
//!
//! `Scalar` is deliberately a thin newtype over `num_rational::BigRational`
//! rather than a hand-rolled `p/q` pair — the `num-*` family is already the
//! crate family this domain reaches for (`struqture` and
//! `qiskit-fermions-core`, the nearest neighboring crates in this corpus,
//! both depend on `num-complex`/`num-traits` for exactly this kind of
//! coefficient arithmetic), and it gives us normalization, overflow-free
//! arithmetic and comparison for free.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use crate::error::{Result, WickError};

/// An exact rational scalar coefficient, `p/q` in lowest terms with `q > 0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Scalar(BigRational);

impl Scalar {
    /// Builds `p/q`.
    ///
    /// # Errors
    /// Returns [`WickError::Domain`] if `q == 0`.
    pub fn new(p: i64, q: i64) -> Result<Self> {
        if q == 0 {
            return Err(WickError::domain("rational scalar with zero denominator"));
        }
        Ok(Self(BigRational::new(BigInt::from(p), BigInt::from(q))))
    }

    /// The additive identity.
    pub fn zero() -> Self {
        Self(BigRational::zero())
    }

    /// The multiplicative identity.
    pub fn one() -> Self {
        Self(BigRational::one())
    }

    /// Builds an integer scalar.
    pub fn from_integer(n: i64) -> Self {
        Self(BigRational::from_integer(BigInt::from(n)))
    }

    /// Whether this scalar is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// The sign of this scalar: `-1`, `0`, or `1`.
    pub fn signum(&self) -> i32 {
        if self.0.is_zero() {
            0
        } else if self.0.is_negative() {
            -1
        } else {
            1
        }
    }

    /// Raises this scalar to the power of a small non-negative integer sign
    /// exponent, used to apply permutation parity (`(-1)^k`) to a running
    /// coefficient.
    pub fn signed(sign: i32) -> Self {
        debug_assert!(sign == 1 || sign == -1);
        if sign < 0 {
            -Self::one()
        } else {
            Self::one()
        }
    }

    /// Converts to an `f64`, for the fixed-precision print/compile layer
    /// only (never used inside the algebraic core).
    ///
    /// # Errors
    /// Returns [`WickError::Overflow`] if the value cannot be represented
    /// as a finite `f64`.
    pub fn to_f64_checked(&self) -> Result<f64> {
        match self.0.to_f64() {
            Some(value) if value.is_finite() => Ok(value),
            _ => Err(WickError::overflow(format!(
                "scalar {self} does not fit in a finite f64"
            ))),
        }
    }
}

impl Default for Scalar {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_integer() {
            write!(f, "{}", self.0.numer())
        } else {
            write!(f, "{}/{}", self.0.numer(), self.0.denom())
        }
    }
}

impl Neg for Scalar {
    type Output = Scalar;
    fn neg(self) -> Scalar {
        Scalar(-self.0)
    }
}

impl Add for Scalar {
    type Output = Scalar;
    fn add(self, rhs: Scalar) -> Scalar {
        Scalar(self.0 + rhs.0)
    }
}

impl AddAssign for Scalar {
    fn add_assign(&mut self, rhs: Scalar) {
        self.0 += rhs.0;
    }
}

impl Sub for Scalar {
    type Output = Scalar;
    fn sub(self, rhs: Scalar) -> Scalar {
        Scalar(self.0 - rhs.0)
    }
}

impl SubAssign for Scalar {
    fn sub_assign(&mut self, rhs: Scalar) {
        self.0 -= rhs.0;
    }
}

impl Mul for Scalar {
    type Output = Scalar;
    fn mul(self, rhs: Scalar) -> Scalar {
        Scalar(self.0 * rhs.0)
    }
}

impl MulAssign for Scalar {
    fn mul_assign(&mut self, rhs: Scalar) {
        self.0 *= rhs.0;
    }
}

impl Mul<i32> for Scalar {
    type Output = Scalar;
    fn mul(self, rhs: i32) -> Scalar {
        Scalar(self.0 * BigRational::from_integer(BigInt::from(rhs)))
    }
}

/// Applies a permutation-parity sign (`+1`/`-1`) to a coefficient. Grounded
/// on the `scalar_t factor` accumulation pattern in
/// `wicked/algebra/term.cc::SymbolicTerm::canonicalize`.
pub fn apply_sign(coeff: Scalar, sign: i32) -> Scalar {
    match sign.cmp(&0) {
        Ordering::Less => -coeff,
        Ordering::Equal => Scalar::zero(),
        Ordering::Greater => coeff,
    }
}

/// A complex-rational scalar, for layers above the core that need it
/// (e.g. Hermitian-conjugation bookkeeping in the diagrammatic layer).
/// Built on `num_complex::Complex`, matching the `num-complex` dependency
/// already present in the nearest neighboring domain crates.
pub type ComplexScalar = num_complex::Complex<BigRational>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construct_and_reduce() {
        let s = Scalar::new(2, 4).unwrap();
        assert_eq!(format!("{s}"), "1/2");
    }

    #[test]
    fn zero_denominator_is_domain_error() {
        assert!(Scalar::new(1, 0).is_err());
    }

    #[test]
    fn arithmetic_closed_under_add_mul_neg() {
        let a = Scalar::new(1, 2).unwrap();
        let b = Scalar::new(1, 3).unwrap();
        assert_eq!(format!("{}", a.clone() + b.clone()), "5/6");
        assert_eq!(format!("{}", a.clone() * b), "1/6");
        assert_eq!(format!("{}", -a), "-1/2");
    }

    #[test]
    fn sign_application() {
        let a = Scalar::new(3, 1).unwrap();
        assert_eq!(format!("{}", apply_sign(a.clone(), 1)), "3");
        assert_eq!(format!("{}", apply_sign(a, -1)), "-3");
    }

    #[test]
    fn is_zero_after_cancellation() {
        let a = Scalar::new(1, 2).unwrap();
        let b = Scalar::new(-1, 2).unwrap();
        assert!((a + b).is_zero());
    }
}
