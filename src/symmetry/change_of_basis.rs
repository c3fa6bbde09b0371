//! Changes of basis between settings of the same lattice.
//!
//! A change of basis is described by a matrix $`\mathbf{C}`$ whose columns are the new basis
//! vectors expressed in the old basis, $`(\mathbf{a}', \mathbf{b}', \mathbf{c}') = (\mathbf{a},
//! \mathbf{b}, \mathbf{c})\mathbf{C}`$. Fractional coordinates then transform as
//! $`\mathbf{x}' = \mathbf{C}^{-1}\mathbf{x}`$ and operations as
//! $`(\mathbf{R}', \mathbf{t}') = (\mathbf{C}^{-1}\mathbf{R}\mathbf{C}, \mathbf{C}^{-1}\mathbf{t})`$.
//!
//! Given the changes of basis $`\mathbf{C}_{\mathrm{old}}`$ and $`\mathbf{C}_{\mathrm{new}}`$
//! relating two settings to a common reference setting, the change of basis from the old to
//! the new setting is $`\mathbf{C}_{\mathrm{old} \to \mathrm{new}} =
//! \mathbf{C}_{\mathrm{new}}^{-1}\mathbf{C}_{\mathrm{old}}`$, which [`ChangeOfBasis::between`],
//! [`IntegerChangeOfBasis::between`] and [`RotationalChangeOfBasis::between`] construct.

use std::fmt;
use std::ops::Mul;

use anyhow::{self, ensure};
use nalgebra::{Matrix3, Vector3};
use num::integer::gcd;
use serde::{Deserialize, Serialize};

use crate::symmetry::floating_seitz_operator::FloatingSeitzOperator;
use crate::symmetry::rotation_matrix::{int_adjugate, int_determinant, RotationMatrix};
use crate::symmetry::seitz_operator::{SeitzOperator, TRANSLATION_DENOMINATOR};

#[cfg(test)]
#[path = "change_of_basis_tests.rs"]
mod change_of_basis_tests;

// =================
// Integer utilities
// =================

/// Divides every entry of an integer matrix by `denominator`, failing if any division is
/// inexact.
fn exact_div_matrix(m: Matrix3<i32>, denominator: i32) -> Result<Matrix3<i32>, anyhow::Error> {
    ensure!(
        denominator != 0 && m.iter().all(|x| x % denominator == 0),
        "Matrix {m} is not exactly divisible by {denominator}."
    );
    Ok(m / denominator)
}

/// Divides every component of an integer vector by `denominator`, failing if any division is
/// inexact.
fn exact_div_vector(v: Vector3<i32>, denominator: i32) -> Result<Vector3<i32>, anyhow::Error> {
    ensure!(
        denominator != 0 && v.iter().all(|x| x % denominator == 0),
        "Vector [{}, {}, {}] is not exactly divisible by {denominator}.",
        v.x,
        v.y,
        v.z
    );
    Ok(v / denominator)
}

// =================
// Rational matrices
// =================

/// A structure representing a $`3 \times 3`$ rational matrix as an integer numerator matrix over
/// a common positive integer denominator, kept in lowest terms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RationalMatrix3 {
    numerator: Matrix3<i32>,
    denominator: i32,
}

impl RationalMatrix3 {
    /// Constructs a rational matrix in lowest terms.
    ///
    /// # Errors
    ///
    /// Errors if `denominator` is zero.
    pub fn new(numerator: Matrix3<i32>, denominator: i32) -> Result<Self, anyhow::Error> {
        ensure!(denominator != 0, "Zero denominator for matrix {numerator}.");
        Ok(Self::reduced(numerator, denominator))
    }

    /// Constructs a rational matrix with unit denominator.
    pub fn from_integer(matrix: Matrix3<i32>) -> Self {
        Self {
            numerator: matrix,
            denominator: 1,
        }
    }

    fn reduced(numerator: Matrix3<i32>, denominator: i32) -> Self {
        let (numerator, denominator) = if denominator < 0 {
            (-numerator, -denominator)
        } else {
            (numerator, denominator)
        };
        let divisor = numerator
            .iter()
            .fold(denominator, |acc, x| gcd(acc, *x));
        if divisor > 1 {
            Self {
                numerator: numerator / divisor,
                denominator: denominator / divisor,
            }
        } else {
            Self {
                numerator,
                denominator,
            }
        }
    }

    pub fn numerator(&self) -> &Matrix3<i32> {
        &self.numerator
    }

    pub fn denominator(&self) -> i32 {
        self.denominator
    }

    /// Returns the exact inverse.
    ///
    /// # Errors
    ///
    /// Errors if the matrix is singular.
    pub fn inverse(&self) -> Result<Self, anyhow::Error> {
        let det = int_determinant(&self.numerator);
        ensure!(det != 0, "Matrix {} is singular.", self.numerator);
        Self::new(int_adjugate(&self.numerator) * self.denominator, det)
    }

    /// Returns the integer matrix if the denominator is one.
    pub fn to_integer(&self) -> Option<Matrix3<i32>> {
        (self.denominator == 1).then_some(self.numerator)
    }

    pub fn to_f64(&self) -> Matrix3<f64> {
        self.numerator.map(f64::from) / f64::from(self.denominator)
    }
}

impl Mul for RationalMatrix3 {
    type Output = RationalMatrix3;

    fn mul(self, rhs: Self) -> Self::Output {
        RationalMatrix3::reduced(
            self.numerator * rhs.numerator,
            self.denominator * rhs.denominator,
        )
    }
}

impl fmt::Display for RationalMatrix3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denominator == 1 {
            write!(f, "{}", IntegerRows(&self.numerator))
        } else {
            write!(f, "{}/{}", IntegerRows(&self.numerator), self.denominator)
        }
    }
}

/// Compact row-wise display of an integer matrix.
struct IntegerRows<'a>(&'a Matrix3<i32>);

impl fmt::Display for IntegerRows<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.0;
        write!(
            f,
            "[[{}, {}, {}], [{}, {}, {}], [{}, {}, {}]]",
            m[(0, 0)],
            m[(0, 1)],
            m[(0, 2)],
            m[(1, 0)],
            m[(1, 1)],
            m[(1, 2)],
            m[(2, 0)],
            m[(2, 1)],
            m[(2, 2)]
        )
    }
}

// =================
// Trait definitions
// =================

/// Trait for transformations of operations and coordinates from one setting into another.
pub trait BasisTransformation {
    /// Transforms a rotation, $`\mathbf{R} \mapsto \mathbf{C}^{-1}\mathbf{R}\mathbf{C}`$.
    ///
    /// # Errors
    ///
    /// Errors if the result is not an integer rotation matrix.
    fn transform_rotation(&self, rotation: &RotationMatrix)
        -> Result<RotationMatrix, anyhow::Error>;

    /// Transforms an exact translation (in twelfths) linearly,
    /// $`\mathbf{t} \mapsto \mathbf{C}^{-1}\mathbf{t}`$.
    ///
    /// # Errors
    ///
    /// Errors if the result is not an integer number of twelfths.
    fn transform_translation(
        &self,
        translation: &Vector3<i32>,
    ) -> Result<Vector3<i32>, anyhow::Error>;

    /// Transforms a fractional vector linearly, $`\mathbf{v} \mapsto \mathbf{C}^{-1}\mathbf{v}`$.
    fn transform_vector(&self, vector: &Vector3<f64>) -> Vector3<f64>;

    /// The position of the old origin in the new setting, in twelfths.
    fn origin_shift(&self) -> Vector3<i32> {
        Vector3::zeros()
    }

    /// Transforms an exact operation. With an origin shift $`\mathbf{p}`$, the translation
    /// becomes $`\mathbf{C}^{-1}\mathbf{t} - (\mathbf{R}' - \mathbf{I})\mathbf{p}`$.
    fn transform_operator(&self, op: &SeitzOperator) -> Result<SeitzOperator, anyhow::Error> {
        let rotation = self.transform_rotation(op.rotation())?;
        let translation = self.transform_translation(op.translation())?
            - (rotation.matrix() - Matrix3::identity()) * self.origin_shift();
        Ok(SeitzOperator::new(rotation, translation))
    }

    /// Transforms a floating operation.
    fn transform_floating_operator(
        &self,
        op: &FloatingSeitzOperator,
    ) -> Result<FloatingSeitzOperator, anyhow::Error> {
        let rotation = self.transform_rotation(op.rotation())?;
        let shift = self
            .origin_shift()
            .map(|s| f64::from(s) / f64::from(TRANSLATION_DENOMINATOR));
        let translation = self.transform_vector(op.translation())
            - (rotation.to_f64() - Matrix3::identity()) * shift;
        Ok(FloatingSeitzOperator::new(rotation, translation))
    }

    /// Transforms a fractional position, including the origin shift.
    fn transform_position(&self, position: &Vector3<f64>) -> Vector3<f64> {
        self.transform_vector(position)
            + self
                .origin_shift()
                .map(|s| f64::from(s) / f64::from(TRANSLATION_DENOMINATOR))
    }
}

// ==================
// Struct definitions
// ==================

// ------------------------
// Rational change of basis
// ------------------------

/// A general change of basis with rational matrices and an optional origin shift.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeOfBasis {
    /// The matrix $`\mathbf{C}`$.
    change_of_basis: RationalMatrix3,

    /// The matrix $`\mathbf{C}^{-1}`$.
    inverse_change_of_basis: RationalMatrix3,

    /// The position of the old origin in the new setting, in twelfths.
    origin_shift: Vector3<i32>,
}

impl ChangeOfBasis {
    /// Constructs a change of basis from an integer matrix $`\mathbf{C}`$.
    ///
    /// # Errors
    ///
    /// Errors if `matrix` is singular.
    pub fn new(matrix: Matrix3<i32>) -> Result<Self, anyhow::Error> {
        Self::from_rational(RationalMatrix3::from_integer(matrix))
    }

    /// Constructs a change of basis from a rational matrix $`\mathbf{C}`$.
    pub fn from_rational(matrix: RationalMatrix3) -> Result<Self, anyhow::Error> {
        Ok(Self {
            change_of_basis: matrix,
            inverse_change_of_basis: matrix.inverse()?,
            origin_shift: Vector3::zeros(),
        })
    }

    /// Sets the position of the old origin in the new setting (in twelfths).
    pub fn with_origin_shift(mut self, shift: Vector3<i32>) -> Self {
        self.origin_shift = shift;
        self
    }

    pub fn matrix(&self) -> &RationalMatrix3 {
        &self.change_of_basis
    }

    pub fn inverse_matrix(&self) -> &RationalMatrix3 {
        &self.inverse_change_of_basis
    }

    /// Returns the inverse change of basis, swapping the forward and inverse matrices. The
    /// origin shift becomes $`-\mathbf{C}\mathbf{p}`$.
    ///
    /// # Errors
    ///
    /// Errors if the inverted origin shift is not an integer number of twelfths.
    pub fn inverse(&self) -> Result<Self, anyhow::Error> {
        let shift = exact_div_vector(
            -(self.change_of_basis.numerator() * self.origin_shift),
            self.change_of_basis.denominator(),
        )?;
        Ok(Self {
            change_of_basis: self.inverse_change_of_basis,
            inverse_change_of_basis: self.change_of_basis,
            origin_shift: shift,
        })
    }

    /// Constructs the change of basis from an old setting to a new one, given the changes of
    /// basis of both settings relative to a common reference setting.
    ///
    /// # Errors
    ///
    /// Errors if either change of basis carries an origin shift.
    pub fn between(old_to_reference: &Self, new_to_reference: &Self) -> Result<Self, anyhow::Error> {
        ensure!(
            old_to_reference.origin_shift == Vector3::zeros()
                && new_to_reference.origin_shift == Vector3::zeros(),
            "Composition of changes of basis with origin shifts is not supported."
        );
        Ok(Self {
            change_of_basis: new_to_reference.inverse_change_of_basis
                * old_to_reference.change_of_basis,
            inverse_change_of_basis: old_to_reference.inverse_change_of_basis
                * new_to_reference.change_of_basis,
            origin_shift: Vector3::zeros(),
        })
    }

    /// Transforms a cell matrix whose columns are the lattice vectors in cartesian
    /// coordinates.
    pub fn transform_cell(&self, cell: &Matrix3<f64>) -> Matrix3<f64> {
        cell * self.change_of_basis.to_f64()
    }
}

impl BasisTransformation for ChangeOfBasis {
    fn transform_rotation(
        &self,
        rotation: &RotationMatrix,
    ) -> Result<RotationMatrix, anyhow::Error> {
        let numerator = self.inverse_change_of_basis.numerator()
            * rotation.matrix()
            * self.change_of_basis.numerator();
        let denominator =
            self.inverse_change_of_basis.denominator() * self.change_of_basis.denominator();
        RotationMatrix::new(exact_div_matrix(numerator, denominator)?)
    }

    fn transform_translation(
        &self,
        translation: &Vector3<i32>,
    ) -> Result<Vector3<i32>, anyhow::Error> {
        exact_div_vector(
            self.inverse_change_of_basis.numerator() * translation,
            self.inverse_change_of_basis.denominator(),
        )
    }

    fn transform_vector(&self, vector: &Vector3<f64>) -> Vector3<f64> {
        self.inverse_change_of_basis.to_f64() * vector
    }

    fn origin_shift(&self) -> Vector3<i32> {
        self.origin_shift
    }
}

impl fmt::Display for ChangeOfBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C = {}", self.change_of_basis)?;
        if self.origin_shift != Vector3::zeros() {
            write!(
                f,
                ", origin shift = ({}, {}, {})/{TRANSLATION_DENOMINATOR}",
                self.origin_shift.x, self.origin_shift.y, self.origin_shift.z
            )?;
        }
        Ok(())
    }
}

// -----------------------
// Integer change of basis
// -----------------------

/// A change of basis without origin shift whose forward and inverse matrices are both kept as
/// integer matrices over separate integer determinants, so that compositions stay exact without
/// rational simplification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegerChangeOfBasis {
    change_of_basis: Matrix3<i32>,
    change_of_basis_determinant: i32,
    inverse_change_of_basis: Matrix3<i32>,
    inverse_change_of_basis_determinant: i32,
}

impl IntegerChangeOfBasis {
    /// Constructs a change of basis from an integer matrix $`\mathbf{C}`$. The inverse is kept as
    /// the adjugate of $`\mathbf{C}`$ over $`\det \mathbf{C}`$.
    ///
    /// # Errors
    ///
    /// Errors if `matrix` is singular.
    pub fn new(matrix: Matrix3<i32>) -> Result<Self, anyhow::Error> {
        let det = int_determinant(&matrix);
        ensure!(det != 0, "Change-of-basis matrix {matrix} is singular.");
        Ok(Self {
            change_of_basis: matrix,
            change_of_basis_determinant: 1,
            inverse_change_of_basis: int_adjugate(&matrix),
            inverse_change_of_basis_determinant: det,
        })
    }

    /// Constructs a change of basis from the integer matrix $`\mathbf{C}^{-1}`$, which maps old
    /// fractional coordinates onto new ones.
    ///
    /// # Errors
    ///
    /// Errors if `inverse` is singular.
    pub fn from_inverse_transformation(inverse: Matrix3<i32>) -> Result<Self, anyhow::Error> {
        let det = int_determinant(&inverse);
        ensure!(det != 0, "Transformation matrix {inverse} is singular.");
        Ok(Self {
            change_of_basis: int_adjugate(&inverse),
            change_of_basis_determinant: det,
            inverse_change_of_basis: inverse,
            inverse_change_of_basis_determinant: 1,
        })
    }

    /// Returns $`\mathbf{C}`$ as a numerator matrix and its denominator.
    pub fn matrix(&self) -> (&Matrix3<i32>, i32) {
        (&self.change_of_basis, self.change_of_basis_determinant)
    }

    /// Returns $`\mathbf{C}^{-1}`$ as a numerator matrix and its denominator.
    pub fn inverse_matrix(&self) -> (&Matrix3<i32>, i32) {
        (
            &self.inverse_change_of_basis,
            self.inverse_change_of_basis_determinant,
        )
    }

    /// Returns the inverse change of basis.
    pub fn inverse(&self) -> Self {
        Self {
            change_of_basis: self.inverse_change_of_basis,
            change_of_basis_determinant: self.inverse_change_of_basis_determinant,
            inverse_change_of_basis: self.change_of_basis,
            inverse_change_of_basis_determinant: self.change_of_basis_determinant,
        }
    }

    /// Returns the change of basis that applies `self` first and `next` second.
    pub fn compose(&self, next: &Self) -> Self {
        Self {
            change_of_basis: self.change_of_basis * next.change_of_basis,
            change_of_basis_determinant: self.change_of_basis_determinant
                * next.change_of_basis_determinant,
            inverse_change_of_basis: next.inverse_change_of_basis * self.inverse_change_of_basis,
            inverse_change_of_basis_determinant: next.inverse_change_of_basis_determinant
                * self.inverse_change_of_basis_determinant,
        }
    }

    /// Constructs the change of basis from an old setting to a new one, given the changes of
    /// basis of both settings relative to a common reference setting.
    pub fn between(old_to_reference: &Self, new_to_reference: &Self) -> Self {
        new_to_reference.inverse().compose(old_to_reference)
    }

    /// Returns the equivalent rational change of basis.
    pub fn to_rational(&self) -> Result<ChangeOfBasis, anyhow::Error> {
        Ok(ChangeOfBasis {
            change_of_basis: RationalMatrix3::new(
                self.change_of_basis,
                self.change_of_basis_determinant,
            )?,
            inverse_change_of_basis: RationalMatrix3::new(
                self.inverse_change_of_basis,
                self.inverse_change_of_basis_determinant,
            )?,
            origin_shift: Vector3::zeros(),
        })
    }
}

impl BasisTransformation for IntegerChangeOfBasis {
    fn transform_rotation(
        &self,
        rotation: &RotationMatrix,
    ) -> Result<RotationMatrix, anyhow::Error> {
        let numerator =
            self.inverse_change_of_basis * rotation.matrix() * self.change_of_basis;
        RotationMatrix::new(exact_div_matrix(
            numerator,
            self.inverse_change_of_basis_determinant * self.change_of_basis_determinant,
        )?)
    }

    fn transform_translation(
        &self,
        translation: &Vector3<i32>,
    ) -> Result<Vector3<i32>, anyhow::Error> {
        exact_div_vector(
            self.inverse_change_of_basis * translation,
            self.inverse_change_of_basis_determinant,
        )
    }

    fn transform_vector(&self, vector: &Vector3<f64>) -> Vector3<f64> {
        self.inverse_change_of_basis.map(f64::from) * vector
            / f64::from(self.inverse_change_of_basis_determinant)
    }
}

// --------------------------
// Rotational change of basis
// --------------------------

/// A change of basis that is a pure axis permutation or combination with determinant $`\pm 1`$
/// and no origin shift.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RotationalChangeOfBasis {
    change_of_basis: RotationMatrix,
    inverse_change_of_basis: RotationMatrix,
}

impl RotationalChangeOfBasis {
    pub fn new(rotation: RotationMatrix) -> Self {
        Self {
            change_of_basis: rotation,
            inverse_change_of_basis: rotation.inverse(),
        }
    }

    pub fn matrix(&self) -> &RotationMatrix {
        &self.change_of_basis
    }

    pub fn inverse_matrix(&self) -> &RotationMatrix {
        &self.inverse_change_of_basis
    }

    pub fn inverse(&self) -> Self {
        Self {
            change_of_basis: self.inverse_change_of_basis,
            inverse_change_of_basis: self.change_of_basis,
        }
    }

    /// Constructs the change of basis from an old setting to a new one, given the changes of
    /// basis of both settings relative to a common reference setting.
    pub fn between(old_to_reference: &Self, new_to_reference: &Self) -> Self {
        Self {
            change_of_basis: new_to_reference.inverse_change_of_basis
                * old_to_reference.change_of_basis,
            inverse_change_of_basis: old_to_reference.inverse_change_of_basis
                * new_to_reference.change_of_basis,
        }
    }

    /// Returns the equivalent rational change of basis.
    pub fn to_rational(&self) -> ChangeOfBasis {
        ChangeOfBasis {
            change_of_basis: RationalMatrix3::from_integer(*self.change_of_basis.matrix()),
            inverse_change_of_basis: RationalMatrix3::from_integer(
                *self.inverse_change_of_basis.matrix(),
            ),
            origin_shift: Vector3::zeros(),
        }
    }
}

impl BasisTransformation for RotationalChangeOfBasis {
    fn transform_rotation(
        &self,
        rotation: &RotationMatrix,
    ) -> Result<RotationMatrix, anyhow::Error> {
        Ok(self.inverse_change_of_basis * *rotation * self.change_of_basis)
    }

    fn transform_translation(
        &self,
        translation: &Vector3<i32>,
    ) -> Result<Vector3<i32>, anyhow::Error> {
        Ok(self.inverse_change_of_basis * *translation)
    }

    fn transform_vector(&self, vector: &Vector3<f64>) -> Vector3<f64> {
        self.inverse_change_of_basis * *vector
    }
}

// ========================
// Standard setting changes
// ========================

/// Columns of the six monoclinic cell choices and unique-axis permutations (Grosse-Kunstleve,
/// Acta Cryst. A55, 383 (1999), table 2).
const MONOCLINIC_SETTING_COLUMNS: [[[i32; 3]; 3]; 6] = [
    [[1, 0, 0], [0, 1, 0], [0, 0, 1]],
    [[-1, 0, -1], [0, 1, 0], [1, 0, 0]],
    [[0, 0, 1], [0, 1, 0], [-1, 0, -1]],
    [[0, 0, 1], [0, -1, 0], [1, 0, 0]],
    [[-1, 0, -1], [0, -1, 0], [0, 0, 1]],
    [[1, 0, 0], [0, -1, 0], [-1, 0, -1]],
];

/// Columns of the six orthorhombic axis permutations.
const ORTHORHOMBIC_SETTING_COLUMNS: [[[i32; 3]; 3]; 6] = [
    [[1, 0, 0], [0, 1, 0], [0, 0, 1]],
    [[0, 1, 0], [0, 0, 1], [1, 0, 0]],
    [[0, 0, 1], [1, 0, 0], [0, 1, 0]],
    [[0, 1, 0], [1, 0, 0], [0, 0, -1]],
    [[1, 0, 0], [0, 0, -1], [0, 1, 0]],
    [[0, 0, -1], [0, 1, 0], [1, 0, 0]],
];

fn settings_from_columns(
    table: &[[[i32; 3]; 3]; 6],
) -> Result<Vec<RotationalChangeOfBasis>, anyhow::Error> {
    table
        .iter()
        .map(|columns| {
            RotationMatrix::from_columns(&columns.map(Vector3::from)).map(RotationalChangeOfBasis::new)
        })
        .collect()
}

/// Returns the six changes of basis relating the monoclinic cell choices and centring axes.
pub fn monoclinic_centring_settings() -> Result<Vec<RotationalChangeOfBasis>, anyhow::Error> {
    settings_from_columns(&MONOCLINIC_SETTING_COLUMNS)
}

/// Returns the six changes of basis relating the orthorhombic axis permutations.
pub fn orthorhombic_centring_settings() -> Result<Vec<RotationalChangeOfBasis>, anyhow::Error> {
    settings_from_columns(&ORTHORHOMBIC_SETTING_COLUMNS)
}
