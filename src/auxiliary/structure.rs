//! Periodic structures: a lattice together with the atoms of one unit cell.

use std::fmt;

use anyhow::{self, format_err};
use derive_builder::Builder;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::auxiliary::atom::{AtomRecord, ElementMap};
use crate::auxiliary::lattice::LatticeMetric;

#[cfg(test)]
#[path = "structure_tests.rs"]
mod structure_tests;

/// A structure representing the atoms of one unit cell of a crystal, with fractional
/// coordinates.
#[derive(Clone, Debug, PartialEq, Builder, Serialize, Deserialize)]
pub struct PeriodicStructure {
    /// The lattice of the crystal.
    lattice: LatticeMetric,

    /// The atoms of the unit cell. Orbit tags refer to indices into this list.
    #[builder(default = "vec![]")]
    atoms: Vec<AtomRecord>,
}

impl PeriodicStructure {
    /// Returns a builder to construct a new periodic structure.
    pub fn builder() -> PeriodicStructureBuilder {
        PeriodicStructureBuilder::default()
    }

    /// Constructs a periodic structure from element symbols and fractional coordinates.
    ///
    /// # Errors
    ///
    /// Errors if an element symbol is unknown.
    pub fn from_fractional(
        lattice: LatticeMetric,
        atoms: &[(String, Vector3<f64>)],
        emap: &ElementMap,
    ) -> Result<Self, anyhow::Error> {
        let atoms = atoms
            .iter()
            .map(|(symbol, position)| AtomRecord::new(symbol, *position, emap))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { lattice, atoms })
    }

    /// Constructs a periodic structure from element symbols and cartesian coordinates, which
    /// are converted into fractional coordinates of `lattice`.
    ///
    /// # Errors
    ///
    /// Errors if an element symbol is unknown.
    pub fn from_cartesian(
        lattice: LatticeMetric,
        atoms: &[(String, Vector3<f64>)],
        emap: &ElementMap,
    ) -> Result<Self, anyhow::Error> {
        let fractional = atoms
            .iter()
            .map(|(symbol, position)| (symbol.clone(), lattice.to_fractional(position)))
            .collect::<Vec<_>>();
        Self::from_fractional(lattice, &fractional, emap)
    }

    pub fn lattice(&self) -> &LatticeMetric {
        &self.lattice
    }

    pub fn atoms(&self) -> &[AtomRecord] {
        &self.atoms
    }

    pub fn atoms_mut(&mut self) -> &mut [AtomRecord] {
        &mut self.atoms
    }

    /// Returns the lattice and a mutable view of the atoms at the same time.
    pub fn split_mut(&mut self) -> (&LatticeMetric, &mut [AtomRecord]) {
        (&self.lattice, &mut self.atoms)
    }

    /// Returns the atom at `index`.
    ///
    /// # Errors
    ///
    /// Errors if `index` is out of range.
    pub fn atom(&self, index: usize) -> Result<&AtomRecord, anyhow::Error> {
        self.atoms.get(index).ok_or_else(|| {
            format_err!(
                "Atom index {index} is out of range for {} atoms.",
                self.atoms.len()
            )
        })
    }

    /// Resets every orbit tag.
    pub fn clear_asymmetric_types(&mut self) {
        self.atoms
            .iter_mut()
            .for_each(|atom| atom.asymmetric_type = None);
    }

    /// Returns the number of atoms in the unit cell.
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}

impl fmt::Display for PeriodicStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Lattice: {}", self.lattice)?;
        writeln!(f, "{} atom(s) (fractional coordinates):", self.atoms.len())?;
        for atom in self.atoms.iter() {
            writeln!(f, "  {atom}")?;
        }
        Ok(())
    }
}
