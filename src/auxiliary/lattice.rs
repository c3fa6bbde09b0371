//! Lattice metrics and the periodic overlap test.

use std::fmt;

use anyhow::{self, ensure, format_err};
use approx::AbsDiffEq;
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::symmetry::change_of_basis::ChangeOfBasis;
use crate::symmetry::rotation_matrix::RotationMatrix;

#[cfg(test)]
#[path = "lattice_tests.rs"]
mod lattice_tests;

/// The default distance below which two sites are considered to coincide.
pub const DEFAULT_OVERLAP_TOLERANCE: f64 = 1e-5;

/// A structure holding the six cell parameters, with lengths in the length unit of the
/// structure and angles in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellParameters {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl fmt::Display for CellParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "a = {:.6}, b = {:.6}, c = {:.6}, α = {:.4}°, β = {:.4}°, γ = {:.4}°",
            self.a, self.b, self.c, self.alpha, self.beta, self.gamma
        )
    }
}

/// A structure representing the metric of a lattice through its cell matrix, whose columns are
/// the cartesian components of the three lattice vectors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatticeMetric {
    cell: Matrix3<f64>,
    inverse_cell: Matrix3<f64>,
}

impl LatticeMetric {
    /// Constructs a lattice metric from a cell matrix.
    ///
    /// # Arguments
    ///
    /// * `cell` - The cell matrix with the lattice vectors as columns.
    ///
    /// # Errors
    ///
    /// Errors if the cell matrix is singular.
    pub fn new(cell: Matrix3<f64>) -> Result<Self, anyhow::Error> {
        let inverse_cell = cell
            .try_inverse()
            .ok_or_else(|| format_err!("Cell matrix {cell} is singular."))?;
        Ok(Self { cell, inverse_cell })
    }

    /// Constructs a lattice metric from cell parameters, with $`\mathbf{a}`$ along $`x`$ and
    /// $`\mathbf{b}`$ in the $`xy`$-plane.
    ///
    /// # Errors
    ///
    /// Errors if the lengths are not positive or if the angles do not span a cell of nonzero
    /// volume.
    pub fn from_parameters(parameters: &CellParameters) -> Result<Self, anyhow::Error> {
        let CellParameters {
            a,
            b,
            c,
            alpha,
            beta,
            gamma,
        } = *parameters;
        ensure!(
            a > 0.0 && b > 0.0 && c > 0.0,
            "Cell lengths must be positive: {parameters}."
        );
        let (cos_alpha, cos_beta) = (alpha.to_radians().cos(), beta.to_radians().cos());
        let (sin_gamma, cos_gamma) = gamma.to_radians().sin_cos();
        ensure!(
            sin_gamma.abs() > f64::EPSILON,
            "Angle γ does not span a plane: {parameters}."
        );
        let cy = (cos_alpha - cos_beta * cos_gamma) / sin_gamma;
        let cz_squared = 1.0 - cos_beta.powi(2) - cy.powi(2);
        ensure!(
            cz_squared > f64::EPSILON,
            "Cell angles do not span a three-dimensional cell: {parameters}."
        );
        let cell = Matrix3::from_columns(&[
            Vector3::new(a, 0.0, 0.0),
            Vector3::new(b * cos_gamma, b * sin_gamma, 0.0),
            Vector3::new(c * cos_beta, c * cy, c * cz_squared.sqrt()),
        ]);
        Self::new(cell)
    }

    pub fn cell(&self) -> &Matrix3<f64> {
        &self.cell
    }

    pub fn inverse_cell(&self) -> &Matrix3<f64> {
        &self.inverse_cell
    }

    /// Returns the metric tensor $`\mathbf{G} = \mathbf{A}^{\mathsf{T}}\mathbf{A}`$.
    pub fn metric_tensor(&self) -> Matrix3<f64> {
        self.cell.transpose() * self.cell
    }

    /// Returns the cell volume.
    pub fn volume(&self) -> f64 {
        self.cell.determinant().abs()
    }

    /// Recovers the cell parameters from the metric tensor.
    pub fn parameters(&self) -> CellParameters {
        let g = self.metric_tensor();
        let (a, b, c) = (g[(0, 0)].sqrt(), g[(1, 1)].sqrt(), g[(2, 2)].sqrt());
        CellParameters {
            a,
            b,
            c,
            alpha: (g[(1, 2)] / (b * c)).clamp(-1.0, 1.0).acos().to_degrees(),
            beta: (g[(0, 2)] / (a * c)).clamp(-1.0, 1.0).acos().to_degrees(),
            gamma: (g[(0, 1)] / (a * b)).clamp(-1.0, 1.0).acos().to_degrees(),
        }
    }

    pub fn to_cartesian(&self, fractional: &Vector3<f64>) -> Vector3<f64> {
        self.cell * fractional
    }

    pub fn to_fractional(&self, cartesian: &Vector3<f64>) -> Vector3<f64> {
        self.inverse_cell * cartesian
    }

    /// Returns the squared cartesian length of the shortest lattice image of the difference
    /// between two fractional positions, taking the nearest integer off each fractional
    /// component.
    pub fn minimum_image_distance_squared(&self, a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
        let dr = a - b;
        let dr = dr - dr.map(|x| (x + 0.5).floor());
        (self.cell * dr).norm_squared()
    }

    /// Checks if two fractional positions coincide modulo a lattice translation.
    ///
    /// # Arguments
    ///
    /// * `a` - The first fractional position.
    /// * `b` - The second fractional position.
    /// * `tolerance` - The cartesian distance below which the positions coincide.
    pub fn is_overlap(&self, a: &Vector3<f64>, b: &Vector3<f64>, tolerance: f64) -> bool {
        self.minimum_image_distance_squared(a, b) < tolerance.powi(2)
    }

    /// Checks if an integer rotation in this basis is an isometry of the lattice, *i.e.* if
    /// $`\mathbf{R}^{\mathsf{T}}\mathbf{G}\mathbf{R} = \mathbf{G}`$.
    ///
    /// Each element $`(i, j)`$ of the difference may deviate by at most `tolerance` times
    /// $`|\mathbf{a}_i| + |\mathbf{a}_j|`$, which is the first-order change of
    /// $`\mathbf{a}_i \cdot \mathbf{a}_j`$ when the images of both lattice vectors are displaced
    /// by up to `tolerance`.
    pub fn is_preserved_by(&self, rotation: &RotationMatrix, tolerance: f64) -> bool {
        let g = self.metric_tensor();
        let r = rotation.to_f64();
        let deviation = r.transpose() * g * r - g;
        let lengths = g.diagonal().map(f64::sqrt);
        (0..3).all(|i| {
            (0..3).all(|j| deviation[(i, j)].abs() <= tolerance * (lengths[i] + lengths[j]))
        })
    }

    /// Returns the lattice expressed in a new setting.
    pub fn transformed(&self, cob: &ChangeOfBasis) -> Result<Self, anyhow::Error> {
        Self::new(cob.transform_cell(&self.cell))
    }
}

impl AbsDiffEq for LatticeMetric {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.cell.abs_diff_eq(&other.cell, epsilon)
    }
}

impl fmt::Display for LatticeMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.parameters())
    }
}
