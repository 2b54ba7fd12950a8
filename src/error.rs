//! Error types for the Wick-theorem algebra engine.
//!
//! This module defines the error kinds that can occur while building and
//! canonicalizing symbolic terms and while running the Wick-theorem
//! contraction engine.

use std::error::Error;
use std::fmt;

/// Result type for this crate's fallible operations.
pub type Result<T> = std::result::Result<T, WickError>;

/// Errors that can occur in the Wick-theorem algebra engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WickError {
    /// Unknown space label, ill-formed index name, negative leg count,
    /// inconsistent tensor slot sizes, or mutation of a frozen
    /// [`OrbitalSpaceRegistry`](crate::orbital_space::OrbitalSpaceRegistry).
    Domain(String),
    /// Attempting an operation that is only valid on a fully normal-ordered
    /// (operator-free) `SymbolicTerm`, e.g. converting one that still
    /// carries free `SQOperator`s into a tensor-only source string.
    Logic(String),
    /// A compile/print format string outside the closed set the crate
    /// supports (`ambit`, `einsum`).
    Argument(String),
    /// Scalar arithmetic exceeded the representable range. Unreachable in
    /// ordinary use because `Scalar` is arbitrary-precision; kept for the
    /// fixed-precision export path used by the print/compile layer.
    Overflow(String),
}

impl WickError {
    /// Builds a [`WickError::Domain`].
    pub fn domain(msg: impl Into<String>) -> Self {
        Self::Domain(msg.into())
    }

    /// Builds a [`WickError::Logic`].
    pub fn logic(msg: impl Into<String>) -> Self {
        Self::Logic(msg.into())
    }

    /// Builds a [`WickError::Argument`].
    pub fn argument(msg: impl Into<String>) -> Self {
        Self::Argument(msg.into())
    }

    /// Builds a [`WickError::Overflow`].
    pub fn overflow(msg: impl Into<String>) -> Self {
        Self::Overflow(msg.into())
    }
}

impl fmt::Display for WickError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WickError::Domain(msg) => write!(f, "domain error: {msg}"),
            WickError::Logic(msg) => write!(f, "logic error: {msg}"),
            WickError::Argument(msg) => write!(f, "argument error: {msg}"),
            WickError::Overflow(msg) => write!(f, "overflow: {msg}"),
        }
    }
}

impl Error for WickError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}

/// Helper macro for constructing a [`WickError`] variant with a formatted message.
#[macro_export]
macro_rules! wick_error {
    ($variant:ident, $fmt:expr) => {
        $crate::error::WickError::$variant($fmt.to_string())
    };
    ($variant:ident, $fmt:expr, $($arg:tt)*) => {
        $crate::error::WickError::$variant(format!($fmt, $($arg)*))
    };
}

/// Helper macro for returning a [`WickError`] from a formatted message.
#[macro_export]
macro_rules! wick_bail {
    ($variant:ident, $fmt:expr) => {
        return Err($crate::wick_error!($variant, $fmt))
    };
    ($variant:ident, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::wick_error!($variant, $fmt, $($arg)*))
    };
}
