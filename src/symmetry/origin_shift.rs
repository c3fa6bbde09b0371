//! Search for the origin at which an operation set maps a structure onto itself.
//!
//! Tabulated settings place their origin at a conventional point (an inversion centre, a
//! point of highest site symmetry, ...), which need not coincide with the origin of a structure
//! given in the same axes. Moving the origin of an operation set to $`\mathbf{p}`$ changes
//! every translation by $`(\mathbf{I} - \mathbf{R})\mathbf{p}`$, so $`\mathbf{p}`$ is
//! constrained by the congruences
//!
//! ```math
//! (\mathbf{I} - \mathbf{R})\mathbf{p} \equiv \mathbf{t}_{\mathrm{s}} - \mathbf{t} \pmod 1,
//! ```
//!
//! where $`\mathbf{t}_{\mathrm{s}}`$ is a translation with which $`\mathbf{R}`$ maps the
//! structure onto itself. Three linearly independent rows of these congruences are solved for
//! every admissible integer offset, and each candidate origin is verified on the whole set.

use std::collections::HashMap;

use anyhow::{self, format_err};
use itertools::Itertools;
use log;
use nalgebra::{Matrix3, Vector3};

use crate::auxiliary::structure::PeriodicStructure;
use crate::symmetry::floating_operation_set::FloatingSymmetryOperationSet;
use crate::symmetry::floating_seitz_operator::{fract, FloatingSeitzOperator};
use crate::symmetry::operation_set::SymmetryOperationSet;
use crate::symmetry::orbit;

#[cfg(test)]
#[path = "origin_shift_tests.rs"]
mod origin_shift_tests;

/// One row $`\mathbf{m} \cdot \mathbf{p} \equiv d \pmod 1`$ of the origin congruences.
#[derive(Clone, Copy, Debug)]
struct CongruenceRow {
    /// The integer coefficients $`\mathbf{m}`$.
    coefficients: Vector3<i32>,

    /// The position of the contributing operation in the list of selected operations, and the
    /// component of its translation giving $`d`$. `None` for rows fixing a free direction of
    /// the origin to zero.
    source: Option<(usize, usize)>,
}

impl CongruenceRow {
    /// Returns the integer offsets $`n`$ for which $`\mathbf{m} \cdot \mathbf{p} = d + n`$ can
    /// hold with $`\mathbf{p} \in [0, 1)^3`$ and $`d \in [0, 1)`$.
    fn offsets(&self) -> std::ops::RangeInclusive<i32> {
        if self.source.is_none() {
            return 0..=0;
        }
        let lowest = self.coefficients.iter().filter(|&&m| m < 0).sum::<i32>();
        let highest = self.coefficients.iter().filter(|&&m| m > 0).sum::<i32>();
        (lowest - 1)..=highest
    }
}

/// Checks if `row` is linearly independent of the already selected `rows`.
fn is_independent(rows: &[CongruenceRow], row: &Vector3<i32>) -> bool {
    match rows {
        [] => *row != Vector3::zeros(),
        [a] => a.coefficients.cross(row) != Vector3::zeros(),
        [a, b] => a.coefficients.cross(&b.coefficients).dot(row) != 0,
        _ => false,
    }
}

/// Returns the index of the first atom of the least abundant element.
fn reference_atom(structure: &PeriodicStructure) -> Option<usize> {
    let atoms = structure.atoms();
    let counts: HashMap<u32, usize> = atoms.iter().counts_by(|atom| atom.atomic_number);
    (0..atoms.len()).min_by_key(|&i| counts.get(&atoms[i].atomic_number).copied())
}

/// Selects up to three linearly independent rows of $`\mathbf{I} - \mathbf{R}`$ over the
/// operations in order, then completes them to a basis with unit rows.
///
/// # Returns
///
/// The rows, and the indices in `operations` of the operations contributing them.
fn select_rows(operations: &FloatingSymmetryOperationSet) -> (Vec<CongruenceRow>, Vec<usize>) {
    let mut rows: Vec<CongruenceRow> = vec![];
    let mut selected: Vec<usize> = vec![];
    for (k, op) in operations.iter().enumerate() {
        let m = Matrix3::<i32>::identity() - op.rotation().matrix();
        for component in 0..3 {
            let coefficients = Vector3::new(m[(component, 0)], m[(component, 1)], m[(component, 2)]);
            if rows.len() < 3 && is_independent(&rows, &coefficients) {
                let position = match selected.iter().position(|&s| s == k) {
                    Some(position) => position,
                    None => {
                        selected.push(k);
                        selected.len() - 1
                    }
                };
                rows.push(CongruenceRow {
                    coefficients,
                    source: Some((position, component)),
                });
            }
        }
    }
    for axis in 0..3 {
        let unit = Vector3::from_fn(|i, _| i32::from(i == axis));
        if rows.len() < 3 && is_independent(&rows, &unit) {
            rows.push(CongruenceRow {
                coefficients: unit,
                source: None,
            });
        }
    }
    (rows, selected)
}

/// Finds an origin at which an operation set maps a structure onto itself.
///
/// The zero origin is tried first. Otherwise, for every operation contributing a congruence
/// row, the translations with which its rotation maps the structure onto itself are found by
/// sending the first atom of the least abundant element onto each atom of the same element.
///
/// # Arguments
///
/// * `operations` - The operations, in the axes of the structure.
/// * `structure` - The structure.
/// * `tolerance` - The cartesian distance below which two positions coincide.
///
/// # Returns
///
/// The fractional position in the structure of the origin of `operations`, or `None` if no
/// origin works.
///
/// # Errors
///
/// Errors if the congruence rows cannot be inverted, which cannot happen for independent rows.
pub fn find_origin_shift(
    operations: &SymmetryOperationSet,
    structure: &PeriodicStructure,
    tolerance: f64,
) -> Result<Option<Vector3<f64>>, anyhow::Error> {
    let operations = operations.to_floating();
    let lattice = structure.lattice();
    if !operations
        .iter()
        .all(|op| lattice.is_preserved_by(op.rotation(), tolerance))
    {
        return Ok(None);
    }
    if operations.is_symmetry_of(structure, tolerance) {
        return Ok(Some(Vector3::zeros()));
    }
    let Some(reference) = reference_atom(structure) else {
        return Ok(None);
    };
    let (rows, selected) = select_rows(&operations);
    if selected.is_empty() {
        // Only pure translations, which no origin affects.
        return Ok(None);
    }

    let atoms = structure.atoms();
    let reference_atom = &atoms[reference];
    let right_hand_sides = selected
        .iter()
        .map(|&k| {
            let op = &operations.operations()[k];
            atoms
                .iter()
                .filter(|atom| atom.atomic_number == reference_atom.atomic_number)
                .filter_map(|partner| {
                    let candidate = FloatingSeitzOperator::new(
                        *op.rotation(),
                        partner.position - *op.rotation() * reference_atom.position,
                    );
                    orbit::is_symmetry_of(std::iter::once(&candidate), structure, tolerance)
                        .then(|| fract(&(candidate.translation() - op.translation())))
                })
                .collect_vec()
        })
        .collect_vec();
    if right_hand_sides.iter().any(|rhs| rhs.is_empty()) {
        log::debug!("Some rotation maps no atom onto an atom of the same element.");
        return Ok(None);
    }

    let inverse = Matrix3::<f64>::from_fn(|i, j| f64::from(rows[i].coefficients[j]))
        .try_inverse()
        .ok_or_else(|| format_err!("Origin congruence rows are not linearly independent."))?;
    let offsets = rows.iter().map(|row| row.offsets()).collect_vec();
    for choice in right_hand_sides
        .iter()
        .map(|rhs| rhs.iter())
        .multi_cartesian_product()
    {
        let base = Vector3::from_fn(|i, _| match rows[i].source {
            Some((position, component)) => choice[position][component],
            None => 0.0,
        });
        for n in offsets.iter().cloned().multi_cartesian_product() {
            let origin = fract(&(inverse * (base + Vector3::from_fn(|i, _| f64::from(n[i])))));
            let shifted = operations
                .iter()
                .map(|op| op.with_origin_at(&origin))
                .collect_vec();
            if orbit::is_symmetry_of(shifted.iter(), structure, tolerance) {
                log::debug!("Origin found at {origin:?}.");
                return Ok(Some(origin));
            }
        }
    }
    Ok(None)
}
