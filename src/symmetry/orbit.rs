//! Orbits of sites under space-group operations, and site-symmetry averaging.
//!
//! The functions in this module are shared by exact and floating operation sets through the
//! [`AffineOperation`] trait. Orbit assignment is sensitive to input order: when a tolerance is
//! loose enough for an atom to match several orbits, the first representative in
//! representative order wins, and within one representative the first matching operation.

use anyhow::{self, ensure, format_err};
use log;
use nalgebra::{Matrix3, Vector3};
use num_traits::ToPrimitive;

use crate::auxiliary::atom::AtomRecord;
use crate::auxiliary::lattice::LatticeMetric;
use crate::auxiliary::structure::PeriodicStructure;
use crate::symmetry::floating_seitz_operator::{fract, FloatingSeitzOperator};
use crate::symmetry::rotation_matrix::RotationMatrix;
use crate::symmetry::seitz_operator::SeitzOperator;

#[cfg(test)]
#[path = "orbit_tests.rs"]
mod orbit_tests;

/// Trait for operations acting affinely on fractional coordinates.
pub trait AffineOperation {
    fn rotation_part(&self) -> &RotationMatrix;

    fn translation_part(&self) -> Vector3<f64>;

    /// Applies the operation to a fractional position without wrapping the result.
    fn act_on(&self, position: &Vector3<f64>) -> Vector3<f64> {
        *self.rotation_part() * *position + self.translation_part()
    }
}

impl AffineOperation for SeitzOperator {
    fn rotation_part(&self) -> &RotationMatrix {
        self.rotation()
    }

    fn translation_part(&self) -> Vector3<f64> {
        self.translation_f64()
    }
}

impl AffineOperation for FloatingSeitzOperator {
    fn rotation_part(&self) -> &RotationMatrix {
        self.rotation()
    }

    fn translation_part(&self) -> Vector3<f64> {
        *self.translation()
    }
}

/// Returns the images of a position under every operation, wrapped into the unit cell.
pub fn symmetric_positions<'a, T, I>(operations: I, position: &Vector3<f64>) -> Vec<Vector3<f64>>
where
    T: AffineOperation + 'a,
    I: IntoIterator<Item = &'a T>,
{
    operations
        .into_iter()
        .map(|op| fract(&op.act_on(position)))
        .collect()
}

/// Returns the distinct images of a position under every operation, in the order they are
/// first found.
pub fn expanded_positions<'a, T, I>(
    operations: I,
    lattice: &LatticeMetric,
    position: &Vector3<f64>,
    tolerance: f64,
) -> Vec<Vector3<f64>>
where
    T: AffineOperation + 'a,
    I: IntoIterator<Item = &'a T>,
{
    symmetric_positions(operations, position)
        .into_iter()
        .fold(vec![], |mut unique, image| {
            if !unique
                .iter()
                .any(|existing| lattice.is_overlap(existing, &image, tolerance))
            {
                unique.push(image);
            }
            unique
        })
}

/// Symmetrises a position by averaging its site-symmetry operations.
///
/// Every operation $`(\mathbf{R}, \mathbf{t})`$ mapping `position` onto a lattice translate
/// $`\mathbf{p} + \mathbf{L}`$ of itself contributes $`(\mathbf{R}, \mathbf{t} - \mathbf{L})`$,
/// and the averaged affine map is applied to `position`.
///
/// # Errors
///
/// Errors if no operation maps `position` onto itself, which means the operations are not a
/// symmetry of the structure containing `position`.
pub fn symmetrized_position<'a, T, I>(
    operations: I,
    lattice: &LatticeMetric,
    position: &Vector3<f64>,
    tolerance: f64,
) -> Result<Vector3<f64>, anyhow::Error>
where
    T: AffineOperation + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let (rotation_sum, translation_sum, count) = operations.into_iter().fold(
        (Matrix3::<f64>::zeros(), Vector3::<f64>::zeros(), 0usize),
        |(rotation_sum, translation_sum, count), op| {
            let image = op.act_on(position);
            if lattice.is_overlap(&image, position, tolerance) {
                let lattice_shift = (image - position).map(f64::round);
                (
                    rotation_sum + op.rotation_part().to_f64(),
                    translation_sum + op.translation_part() - lattice_shift,
                    count + 1,
                )
            } else {
                (rotation_sum, translation_sum, count)
            }
        },
    );
    ensure!(
        count > 0,
        "No operation maps position [{:.7}, {:.7}, {:.7}] onto itself.",
        position[0],
        position[1],
        position[2]
    );
    let order = count
        .to_f64()
        .ok_or_else(|| format_err!("Unable to convert the site-symmetry order to `f64`."))?;
    log::debug!("Site-symmetry order of [{position:?}]: {count}");
    Ok(rotation_sum / order * position + translation_sum / order)
}

/// Symmetrises the positions of all atoms in place.
///
/// # Errors
///
/// Errors if any atom has no site-symmetry operation.
pub fn symmetrize<'a, T, I>(
    operations: I,
    lattice: &LatticeMetric,
    atoms: &mut [AtomRecord],
    tolerance: f64,
) -> Result<(), anyhow::Error>
where
    T: AffineOperation + 'a,
    I: IntoIterator<Item = &'a T> + Clone,
{
    for atom in atoms.iter_mut() {
        atom.position =
            symmetrized_position(operations.clone(), lattice, &atom.position, tolerance)?;
    }
    Ok(())
}

/// Partitions atoms into orbits and tags each atom with the index of its orbit.
///
/// Atoms are visited in input order. An atom joins the first orbit whose representative has the
/// same atomic number and is the image of the atom under some operation; otherwise it becomes
/// the representative of a new orbit. Existing tags are cleared first.
///
/// # Returns
///
/// The indices into `atoms` of the orbit representatives, in orbit order.
pub fn asymmetric_atoms<'a, T, I>(
    operations: I,
    lattice: &LatticeMetric,
    atoms: &mut [AtomRecord],
    tolerance: f64,
) -> Vec<usize>
where
    T: AffineOperation + 'a,
    I: IntoIterator<Item = &'a T> + Clone,
{
    atoms
        .iter_mut()
        .for_each(|atom| atom.asymmetric_type = None);
    let mut representatives: Vec<usize> = vec![];
    for i in 0..atoms.len() {
        let atom = &atoms[i];
        let orbit = representatives.iter().position(|&rep| {
            let representative = &atoms[rep];
            representative.atomic_number == atom.atomic_number
                && operations.clone().into_iter().any(|op| {
                    lattice.is_overlap(
                        &op.act_on(&atom.position),
                        &representative.position,
                        tolerance,
                    )
                })
        });
        match orbit {
            Some(orbit) => atoms[i].asymmetric_type = Some(orbit),
            None => {
                atoms[i].asymmetric_type = Some(representatives.len());
                representatives.push(i);
            }
        }
    }
    log::debug!(
        "{} atom(s) partitioned into {} orbit(s).",
        atoms.len(),
        representatives.len()
    );
    representatives
}

/// Moves an atom onto the exact image of an independent atom.
///
/// Independent atoms are searched in order, and for each one the operations in order; the first
/// image of an independent atom of the same element that overlaps `atom` replaces the position
/// of `atom` (wrapped into the unit cell), and `atom` takes the orbit tag of that independent
/// atom.
///
/// # Returns
///
/// `true` if a match was found.
pub fn set_equivalent_atoms<'a, T, I>(
    operations: I,
    lattice: &LatticeMetric,
    independent_atoms: &[AtomRecord],
    atom: &mut AtomRecord,
    tolerance: f64,
) -> bool
where
    T: AffineOperation + 'a,
    I: IntoIterator<Item = &'a T> + Clone,
{
    let found = independent_atoms
        .iter()
        .filter(|independent| independent.atomic_number == atom.atomic_number)
        .find_map(|independent| {
            operations
                .clone()
                .into_iter()
                .map(|op| op.act_on(&independent.position))
                .find(|image| lattice.is_overlap(image, &atom.position, tolerance))
                .map(|image| (fract(&image), independent.asymmetric_type))
        });
    match found {
        Some((position, orbit)) => {
            atom.position = position;
            if orbit.is_some() {
                atom.asymmetric_type = orbit;
            }
            true
        }
        None => false,
    }
}

/// Checks if every operation is an isometry of the lattice and maps every atom onto an atom of
/// the same element.
pub fn is_symmetry_of<'a, T, I>(
    operations: I,
    structure: &PeriodicStructure,
    tolerance: f64,
) -> bool
where
    T: AffineOperation + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let lattice = structure.lattice();
    let atoms = structure.atoms();
    operations.into_iter().all(|op| {
        if !lattice.is_preserved_by(op.rotation_part(), tolerance) {
            log::debug!(
                "Rotation {} is not an isometry of the lattice.",
                op.rotation_part()
            );
            return false;
        }
        atoms.iter().all(|atom| {
            let image = op.act_on(&atom.position);
            atoms.iter().any(|other| {
                other.atomic_number == atom.atomic_number
                    && lattice.is_overlap(&image, &other.position, tolerance)
            })
        })
    })
}
