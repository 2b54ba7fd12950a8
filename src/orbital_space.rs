//! Orbital-space registry: the elementary-space metadata the rest of the
//! crate resolves index and operator labels against.
//!
//! This is deliberately a plain value, threaded by reference into every
//! constructor that needs it, rather than process-wide global state — so
//! tests (and independent call sites within one process) can each hold
//! their own registry.

use crate::error::{Result, WickError};

/// How single-leg contractions in a space are resolved by the Wick engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RdmStructure {
    /// Annihilation·creation contractions collapse to a Kronecker delta.
    Occupied,
    /// Creation·annihilation contractions collapse to a Kronecker delta.
    Unoccupied,
    /// No single-leg contraction is a delta; requires explicit cumulants.
    General,
}

#[derive(Debug, Clone)]
struct SpaceInfo {
    label: char,
    rdm: RdmStructure,
    names: Vec<String>,
}

/// Registry of elementary orbital spaces.
///
/// Lifecycle: `reset` followed by zero or more `add_space` calls forms an
/// initialization phase; every other operation in the crate only reads the
/// registry afterwards. Mutating it again once an [`Index`](crate::index::Index),
/// [`Tensor`](crate::tensor::Tensor) or operator has already been built
/// against it is undefined from the perspective of those values (their
/// `space` fields are plain integers into this table) and is rejected by
/// [`OrbitalSpaceRegistry::add_space`] once [`OrbitalSpaceRegistry::freeze`]
/// has been called.
#[derive(Debug, Clone, Default)]
pub struct OrbitalSpaceRegistry {
    spaces: Vec<SpaceInfo>,
    frozen: bool,
}

impl OrbitalSpaceRegistry {
    /// Creates an empty, unfrozen registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all registered spaces and unfreezes the registry.
    pub fn reset(&mut self) {
        self.spaces.clear();
        self.frozen = false;
    }

    /// Registers an elementary orbital space.
    ///
    /// # Errors
    /// Returns [`WickError::Domain`] if `label` is already registered, if
    /// any name in `names` is already reserved by another space, or if the
    /// registry has been frozen.
    pub fn add_space(
        &mut self,
        label: char,
        rdm: RdmStructure,
        names: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<()> {
        if self.frozen {
            return Err(WickError::domain(format!(
                "cannot add space '{label}': registry is frozen"
            )));
        }
        if self.spaces.iter().any(|s| s.label == label) {
            return Err(WickError::domain(format!(
                "orbital space label '{label}' already registered"
            )));
        }
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        for name in &names {
            if self.indices_to_space(name).is_some() {
                return Err(WickError::domain(format!(
                    "index name '{name}' already reserved by another space"
                )));
            }
        }
        self.spaces.push(SpaceInfo { label, rdm, names });
        Ok(())
    }

    /// Marks the registry read-only. Subsequent `add_space` calls fail.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// The number of registered spaces.
    pub fn num_spaces(&self) -> usize {
        self.spaces.len()
    }

    /// The label of the space at position `pos`.
    pub fn label(&self, pos: usize) -> Result<char> {
        self.spaces
            .get(pos)
            .map(|s| s.label)
            .ok_or_else(|| WickError::domain(format!("no orbital space at position {pos}")))
    }

    /// The RDM structure of the space at position `pos`.
    pub fn rdm_structure(&self, pos: usize) -> Result<RdmStructure> {
        self.spaces
            .get(pos)
            .map(|s| s.rdm)
            .ok_or_else(|| WickError::domain(format!("no orbital space at position {pos}")))
    }

    /// The reserved index names of the space at position `pos`.
    pub fn names(&self, pos: usize) -> Result<&[String]> {
        self.spaces
            .get(pos)
            .map(|s| s.names.as_slice())
            .ok_or_else(|| WickError::domain(format!("no orbital space at position {pos}")))
    }

    /// Maps a space label to its position in the registry.
    pub fn label_to_space(&self, label: char) -> Result<usize> {
        self.spaces
            .iter()
            .position(|s| s.label == label)
            .ok_or_else(|| WickError::domain(format!("unknown orbital space label '{label}'")))
    }

    /// Maps a reserved index name (e.g. `"i"`, `"a"`) to its space position.
    pub fn indices_to_space(&self, name: &str) -> Option<usize> {
        self.spaces.iter().position(|s| s.names.iter().any(|n| n == name))
    }

    /// Whether `pos` is a valid space position in this registry.
    pub fn has_space(&self, pos: usize) -> bool {
        pos < self.spaces.len()
    }
}
