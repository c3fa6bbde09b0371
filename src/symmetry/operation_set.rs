//! Sets of exact space-group operations.

use std::fmt;

use anyhow::{self, ensure};
use indexmap::{IndexMap, IndexSet};
use log;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::auxiliary::atom::AtomRecord;
use crate::auxiliary::lattice::LatticeMetric;
use crate::auxiliary::structure::PeriodicStructure;
use crate::spacegroup::SpaceGroupSetting;
use crate::symmetry::centring::Centring;
use crate::symmetry::change_of_basis::BasisTransformation;
use crate::symmetry::floating_operation_set::FloatingSymmetryOperationSet;
use crate::symmetry::orbit;
use crate::symmetry::rotation_matrix::RotationMatrix;
use crate::symmetry::seitz_operator::{SeitzOperator, TRANSLATION_DENOMINATOR};

#[cfg(test)]
#[path = "operation_set_tests.rs"]
mod operation_set_tests;

// ================
// Helper functions
// ================

/// Determines the pure lattice translations implied by a list of operations.
///
/// For every rotation, all pairwise differences between the translations of operations sharing
/// that rotation are collected. The result always contains the zero translation first, followed
/// by the remaining translations sorted by squared length and then lexicographically.
pub(crate) fn lattice_translations_of<'a, I>(operations: I) -> Vec<Vector3<i32>>
where
    I: IntoIterator<Item = &'a SeitzOperator>,
{
    let mut by_rotation: IndexMap<RotationMatrix, Vec<Vector3<i32>>> = IndexMap::new();
    for op in operations {
        by_rotation
            .entry(*op.rotation())
            .or_default()
            .push(*op.translation());
    }

    let mut translations: IndexSet<Vector3<i32>> = IndexSet::new();
    translations.insert(Vector3::zeros());
    for ts in by_rotation.values() {
        for (i, ti) in ts.iter().enumerate() {
            for tj in ts[i..].iter() {
                translations.insert((tj - ti).map(|t| t.rem_euclid(TRANSLATION_DENOMINATOR)));
            }
        }
    }
    let mut translations = translations.into_iter().collect::<Vec<_>>();
    translations.sort_by_key(|t| (t.dot(t), t.x, t.y, t.z));
    translations
}

/// Decodes a byte string of packed three-byte operators.
///
/// # Errors
///
/// Errors if the length of `code` is not a multiple of three or if any operator is invalid.
pub fn decode_operators(code: &[u8]) -> Result<Vec<SeitzOperator>, anyhow::Error> {
    ensure!(
        code.len() % 3 == 0,
        "Packed operator string of length {} is not a multiple of three bytes.",
        code.len()
    );
    code.chunks_exact(3)
        .map(|chunk| SeitzOperator::from_encoding(&[chunk[0], chunk[1], chunk[2]]))
        .collect()
}

// ==================
// Struct definitions
// ==================

/// A structure representing a set of exact space-group operations together with the lattice
/// centring implied by its pure translations.
///
/// Sets are never modified in place: every transformation returns a new set whose centring is
/// classified afresh.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymmetryOperationSet {
    /// The distinct operations, in insertion order.
    operations: IndexSet<SeitzOperator>,

    /// The centring classified from the lattice translations of `operations`.
    centring: Centring,
}

impl SymmetryOperationSet {
    /// Constructs a set from an explicit list of operations. Duplicates are removed and the list
    /// is not closed.
    pub fn new<I>(operations: I) -> Self
    where
        I: IntoIterator<Item = SeitzOperator>,
    {
        let operations = operations.into_iter().collect::<IndexSet<_>>();
        let centring = Centring::classify(&lattice_translations_of(operations.iter()));
        Self {
            operations,
            centring,
        }
    }

    /// Constructs a set from packed three-byte operators, taken as an explicit list.
    ///
    /// # Errors
    ///
    /// Errors if any operator cannot be decoded.
    pub fn from_encoding(code: &[u8]) -> Result<Self, anyhow::Error> {
        Ok(Self::new(decode_operators(code)?))
    }

    /// Constructs the smallest group containing the identity and `generators`.
    ///
    /// The group is grown as a multiplication table: after each generator is appended, every
    /// pair $`(i, j)`$ with $`j \le i`$ whose left index $`i`$ points at an element not yet
    /// multiplied contributes both products $`G_j G_i`$ and $`G_i G_j`$, and the table keeps
    /// growing until no new element appears.
    pub fn from_generators(generators: &[SeitzOperator]) -> Self {
        let mut group: IndexSet<SeitzOperator> = IndexSet::new();
        group.insert(SeitzOperator::identity());
        for generator in generators {
            if group.contains(generator) {
                continue;
            }
            let mut i = group.len();
            group.insert(*generator);
            while i < group.len() {
                for j in 0..=i {
                    let (gi, gj) = (group[i], group[j]);
                    group.insert(gj * gi);
                    group.insert(gi * gj);
                }
                i += 1;
            }
        }
        log::debug!(
            "Closure of {} generator(s) contains {} operation(s).",
            generators.len(),
            group.len()
        );
        Self::new(group)
    }

    /// Constructs the full operation set of a table setting: the decoded generators, the
    /// inversion generator for centrosymmetric settings if `include_inversion` is set, closed
    /// under composition, and completed by the centring translations of the setting.
    ///
    /// # Errors
    ///
    /// Errors if the generators of the setting cannot be decoded.
    pub fn from_setting(
        setting: &SpaceGroupSetting,
        include_inversion: bool,
    ) -> Result<Self, anyhow::Error> {
        let generators = if include_inversion {
            setting.generators()?
        } else {
            decode_operators(setting.encoded_generators)?
        };
        Ok(Self::from_generators(&generators).adding_centring_operations(setting.centring))
    }

    pub fn operations(&self) -> &IndexSet<SeitzOperator> {
        &self.operations
    }

    pub fn iter(&self) -> impl Iterator<Item = &SeitzOperator> {
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

    pub fn contains(&self, op: &SeitzOperator) -> bool {
        self.operations.contains(op)
    }

    /// Checks if the set is closed under composition.
    pub fn is_closed(&self) -> bool {
        self.operations.iter().all(|a| {
            self.operations
                .iter()
                .all(|b| self.operations.contains(&(*a * *b)))
        })
    }

    /// Returns the pure lattice translations implied by the set, zero first.
    pub fn lattice_translations(&self) -> Vec<Vector3<i32>> {
        lattice_translations_of(self.operations.iter())
    }

    /// Returns the distinct rotation parts, in order of first appearance.
    pub fn rotations(&self) -> Vec<RotationMatrix> {
        self.operations
            .iter()
            .map(|op| *op.rotation())
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }

    /// Returns the distinct proper parts $`\det(\mathbf{R})\mathbf{R}`$ of the rotations.
    pub fn proper_rotations(&self) -> Vec<RotationMatrix> {
        self.operations
            .iter()
            .map(|op| op.rotation().proper())
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }

    /// Checks if the set contains an operation with rotation part $`-\mathbf{I}`$.
    pub fn is_centrosymmetric(&self) -> bool {
        self.operations.iter().any(|op| op.rotation().is_inversion())
    }

    /// Returns a new set in which every operation is repeated once for each translation of
    /// `centring`.
    pub fn adding_centring_operations(&self, centring: Centring) -> Self {
        let shifts = centring.translations();
        Self::new(self.operations.iter().flat_map(|op| {
            shifts
                .iter()
                .map(|shift| SeitzOperator::new(*op.rotation(), op.translation() + shift))
                .collect::<Vec<_>>()
        }))
    }

    /// Returns the set expressed in another setting.
    ///
    /// Operations that coincide in the new setting are merged, so that a centred set becomes
    /// its primitive quotient under a change to a primitive basis.
    ///
    /// # Errors
    ///
    /// Errors if an operation cannot be transformed exactly.
    pub fn changed_basis<B: BasisTransformation>(&self, cob: &B) -> Result<Self, anyhow::Error> {
        let operations = self
            .operations
            .iter()
            .map(|op| cob.transform_operator(op))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(operations))
    }

    /// Converts the set into a floating operation set.
    pub fn to_floating(&self) -> FloatingSymmetryOperationSet {
        FloatingSymmetryOperationSet::from(self)
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

    /// Symmetrises a position by site-symmetry averaging. See
    /// [`orbit::symmetrized_position`].
    pub fn symmetrized_position(
        &self,
        lattice: &LatticeMetric,
        position: &Vector3<f64>,
        tolerance: f64,
    ) -> Result<Vector3<f64>, anyhow::Error> {
        orbit::symmetrized_position(self.operations.iter(), lattice, position, tolerance)
    }

    /// Symmetrises every atom of a list in place.
    pub fn symmetrize(
        &self,
        lattice: &LatticeMetric,
        atoms: &mut [AtomRecord],
        tolerance: f64,
    ) -> Result<(), anyhow::Error> {
        orbit::symmetrize(self.operations.iter(), lattice, atoms, tolerance)
    }

    /// Partitions atoms into orbits. See [`orbit::asymmetric_atoms`].
    pub fn asymmetric_atoms(
        &self,
        lattice: &LatticeMetric,
        atoms: &mut [AtomRecord],
        tolerance: f64,
    ) -> Vec<usize> {
        orbit::asymmetric_atoms(self.operations.iter(), lattice, atoms, tolerance)
    }

    /// Moves an atom onto the exact image of an independent atom. See
    /// [`orbit::set_equivalent_atoms`].
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

    /// Checks if every operation maps the structure onto itself.
    pub fn is_symmetry_of(&self, structure: &PeriodicStructure, tolerance: f64) -> bool {
        orbit::is_symmetry_of(self.operations.iter(), structure, tolerance)
    }
}

impl fmt::Display for SymmetryOperationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} operation(s), {} lattice",
            self.operations.len(),
            self.centring
        )?;
        for (i, op) in self.operations.iter().enumerate() {
            writeln!(f, "{:>4}  {op}", i + 1)?;
        }
        Ok(())
    }
}
