//! Sets of floating space-group operations.

use std::fmt;

use anyhow;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::auxiliary::atom::AtomRecord;
use crate::auxiliary::lattice::LatticeMetric;
use crate::auxiliary::structure::PeriodicStructure;
use crate::symmetry::centring::Centring;
use crate::symmetry::change_of_basis::BasisTransformation;
use crate::symmetry::floating_seitz_operator::FloatingSeitzOperator;
use crate::symmetry::operation_set::{lattice_translations_of, SymmetryOperationSet};
use crate::symmetry::orbit;
use crate::symmetry::seitz_operator::TRANSLATION_DENOMINATOR;

#[cfg(test)]
#[path = "floating_operation_set_tests.rs"]
mod floating_operation_set_tests;

/// Translations closer than this (in fractional units, modulo the lattice) are treated as equal
/// when merging floating operations.
pub const FLOATING_OPERATION_THRESHOLD: f64 = 1e-6;

/// A structure representing a set of floating space-group operations together with their
/// lattice centring.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FloatingSymmetryOperationSet {
    /// The distinct operations, in insertion order.
    operations: Vec<FloatingSeitzOperator>,

    /// The centring classified from the lattice translations of `operations`, with every
    /// translation rounded to the nearest twelfth.
    centring: Centring,
}

impl FloatingSymmetryOperationSet {
    /// Constructs a set from an explicit list of operations, merging operations that coincide
    /// within [`FLOATING_OPERATION_THRESHOLD`].
    ///
    /// # Errors
    ///
    /// Errors if a translation cannot be rounded to a number of twelfths for the centring
    /// classification.
    pub fn new<I>(operations: I) -> Result<Self, anyhow::Error>
    where
        I: IntoIterator<Item = FloatingSeitzOperator>,
    {
        let operations = operations
            .into_iter()
            .fold(vec![], |mut unique: Vec<FloatingSeitzOperator>, op| {
                if !unique
                    .iter()
                    .any(|existing| existing.approx_eq(&op, FLOATING_OPERATION_THRESHOLD))
                {
                    unique.push(op);
                }
                unique
            });
        let exact = operations
            .iter()
            .map(FloatingSeitzOperator::to_exact)
            .collect::<Result<Vec<_>, _>>()?;
        let centring = Centring::classify(&lattice_translations_of(exact.iter()));
        Ok(Self {
            operations,
            centring,
        })
    }

    pub fn operations(&self) -> &[FloatingSeitzOperator] {
        &self.operations
    }

    pub fn iter(&self) -> impl Iterator<Item = &FloatingSeitzOperator> {
        self.operations.iter()
    }

    pub fn centring(&self) -> Centring {
        self.centring
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Converts the set into an exact operation set by rounding every translation to the
    /// nearest twelfth.
    pub fn to_exact(&self) -> Result<SymmetryOperationSet, anyhow::Error> {
        Ok(SymmetryOperationSet::new(
            self.operations
                .iter()
                .map(FloatingSeitzOperator::to_exact)
                .collect::<Result<Vec<_>, _>>()?,
        ))
    }

    /// Returns a new set in which every operation is repeated once for each translation of
    /// `centring`.
    pub fn adding_centring_operations(&self, centring: Centring) -> Result<Self, anyhow::Error> {
        let shifts = centring
            .translations()
            .into_iter()
            .map(|t| t.map(|x| f64::from(x) / f64::from(TRANSLATION_DENOMINATOR)))
            .collect::<Vec<Vector3<f64>>>();
        Self::new(self.operations.iter().flat_map(|op| {
            shifts
                .iter()
                .map(|shift| FloatingSeitzOperator::new(*op.rotation(), op.translation() + shift))
                .collect::<Vec<_>>()
        }))
    }

    /// Returns the set expressed in another setting, merging operations that coincide there.
    ///
    /// # Errors
    ///
    /// Errors if a rotation cannot be transformed into an integer rotation.
    pub fn changed_basis<B: BasisTransformation>(&self, cob: &B) -> Result<Self, anyhow::Error> {
        let operations = self
            .operations
            .iter()
            .map(|op| cob.transform_floating_operator(op))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(operations)
    }

    /// Returns the set with the origin moved to `origin`, given in fractional coordinates of
    /// the current setting.
    ///
    /// # Errors
    ///
    /// Errors if a translation cannot be rounded to a number of twelfths for the centring
    /// classification.
    pub fn with_origin_at(&self, origin: &Vector3<f64>) -> Result<Self, anyhow::Error> {
        Self::new(self.operations.iter().map(|op| op.with_origin_at(origin)))
    }

    /// Returns the images of a position under every operation, wrapped into the unit cell.
    pub fn symmetric_positions(&self, position: &Vector3<f64>) -> Vec<Vector3<f64>> {
        orbit::symmetric_positions(self.operations.iter(), position)
    }

    /// Returns the distinct images of a position.
    pub fn expanded_positions(
        &self,
        lattice: &LatticeMetric,
        position: &Vector3<f64>,
        tolerance: f64,
    ) -> Vec<Vector3<f64>> {
        orbit::expanded_positions(self.operations.iter(), lattice, position, tolerance)
    }

    pub fn symmetrized_position(
        &self,
        lattice: &LatticeMetric,
        position: &Vector3<f64>,
        tolerance: f64,
    ) -> Result<Vector3<f64>, anyhow::Error> {
        orbit::symmetrized_position(self.operations.iter(), lattice, position, tolerance)
    }

    pub fn symmetrize(
        &self,
        lattice: &LatticeMetric,
        atoms: &mut [AtomRecord],
        tolerance: f64,
    ) -> Result<(), anyhow::Error> {
        orbit::symmetrize(self.operations.iter(), lattice, atoms, tolerance)
    }

    pub fn asymmetric_atoms(
        &self,
        lattice: &LatticeMetric,
        atoms: &mut [AtomRecord],
        tolerance: f64,
    ) -> Vec<usize> {
        orbit::asymmetric_atoms(self.operations.iter(), lattice, atoms, tolerance)
    }

    pub fn set_equivalent_atoms(
        &self,
        lattice: &LatticeMetric,
        independent_atoms: &[AtomRecord],
        atom: &mut AtomRecord,
        tolerance: f64,
    ) -> bool {
        orbit::set_equivalent_atoms(
            self.operations.iter(),
            lattice,
            independent_atoms,
            atom,
            tolerance,
        )
    }

    pub fn is_symmetry_of(&self, structure: &PeriodicStructure, tolerance: f64) -> bool {
        orbit::is_symmetry_of(self.operations.iter(), structure, tolerance)
    }
}

impl From<&SymmetryOperationSet> for FloatingSymmetryOperationSet {
    fn from(set: &SymmetryOperationSet) -> Self {
        Self {
            operations: set.iter().map(FloatingSeitzOperator::from).collect(),
            centring: set.centring(),
        }
    }
}

impl fmt::Display for FloatingSymmetryOperationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} floating operation(s), {} lattice",
            self.operations.len(),
            self.centring
        )?;
        for (i, op) in self.operations.iter().enumerate() {
            writeln!(f, "{:>4}  {op}", i + 1)?;
        }
        Ok(())
    }
}
