//! Integer rotation matrices of crystallographic point operations.

use std::fmt;
use std::ops::{Mul, Neg};

use anyhow::{self, bail, ensure};
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "rotation_matrix_tests.rs"]
mod rotation_matrix_tests;

// =================
// Integer utilities
// =================

/// Computes the determinant of an integer $`3 \times 3`$ matrix exactly.
pub(crate) fn int_determinant(m: &Matrix3<i32>) -> i32 {
    m[(0, 0)] * (m[(1, 1)] * m[(2, 2)] - m[(1, 2)] * m[(2, 1)])
        - m[(0, 1)] * (m[(1, 0)] * m[(2, 2)] - m[(1, 2)] * m[(2, 0)])
        + m[(0, 2)] * (m[(1, 0)] * m[(2, 1)] - m[(1, 1)] * m[(2, 0)])
}

/// Computes the adjugate of an integer $`3 \times 3`$ matrix, so that
/// `m * adj(m) = det(m) * I`.
pub(crate) fn int_adjugate(m: &Matrix3<i32>) -> Matrix3<i32> {
    Matrix3::new(
        m[(1, 1)] * m[(2, 2)] - m[(1, 2)] * m[(2, 1)],
        m[(0, 2)] * m[(2, 1)] - m[(0, 1)] * m[(2, 2)],
        m[(0, 1)] * m[(1, 2)] - m[(0, 2)] * m[(1, 1)],
        m[(1, 2)] * m[(2, 0)] - m[(1, 0)] * m[(2, 2)],
        m[(0, 0)] * m[(2, 2)] - m[(0, 2)] * m[(2, 0)],
        m[(0, 2)] * m[(1, 0)] - m[(0, 0)] * m[(1, 2)],
        m[(1, 0)] * m[(2, 1)] - m[(1, 1)] * m[(2, 0)],
        m[(0, 1)] * m[(2, 0)] - m[(0, 0)] * m[(2, 1)],
        m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)],
    )
}

// ==================
// Struct definitions
// ==================

/// An enumerated type classifying crystallographic rotations by their Hermann--Mauguin symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RotationKind {
    /// The identity, $`1`$.
    Identity,

    /// A two-fold rotation, $`2`$.
    TwoFold,

    /// A three-fold rotation, $`3`$.
    ThreeFold,

    /// A four-fold rotation, $`4`$.
    FourFold,

    /// A six-fold rotation, $`6`$.
    SixFold,

    /// The inversion, $`\bar{1}`$.
    Inversion,

    /// A reflection, $`m = \bar{2}`$.
    Mirror,

    /// A three-fold rotoinversion, $`\bar{3}`$.
    ThreeFoldRotoinversion,

    /// A four-fold rotoinversion, $`\bar{4}`$.
    FourFoldRotoinversion,

    /// A six-fold rotoinversion, $`\bar{6}`$.
    SixFoldRotoinversion,
}

impl RotationKind {
    /// Returns the order of rotations of this kind.
    pub fn order(&self) -> usize {
        match self {
            RotationKind::Identity => 1,
            RotationKind::TwoFold | RotationKind::Inversion | RotationKind::Mirror => 2,
            RotationKind::ThreeFold => 3,
            RotationKind::FourFold | RotationKind::FourFoldRotoinversion => 4,
            RotationKind::SixFold
            | RotationKind::ThreeFoldRotoinversion
            | RotationKind::SixFoldRotoinversion => 6,
        }
    }

    /// Returns `true` if rotations of this kind have determinant $`+1`$.
    pub fn is_proper(&self) -> bool {
        matches!(
            self,
            RotationKind::Identity
                | RotationKind::TwoFold
                | RotationKind::ThreeFold
                | RotationKind::FourFold
                | RotationKind::SixFold
        )
    }
}

impl fmt::Display for RotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            RotationKind::Identity => "1",
            RotationKind::TwoFold => "2",
            RotationKind::ThreeFold => "3",
            RotationKind::FourFold => "4",
            RotationKind::SixFold => "6",
            RotationKind::Inversion => "-1",
            RotationKind::Mirror => "m",
            RotationKind::ThreeFoldRotoinversion => "-3",
            RotationKind::FourFoldRotoinversion => "-4",
            RotationKind::SixFoldRotoinversion => "-6",
        };
        write!(f, "{symbol}")
    }
}

/// A structure representing the rotational part of a crystallographic symmetry operation in a
/// lattice basis.
///
/// The matrix has integer entries and determinant $`\pm 1`$. Construction through
/// [`Self::new`] enforces the determinant condition; products and inverses of valid rotation
/// matrices are valid rotation matrices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RotationMatrix(Matrix3<i32>);

impl RotationMatrix {
    /// Constructs a rotation matrix from an integer matrix.
    ///
    /// # Errors
    ///
    /// Errors if the determinant of `matrix` is not $`\pm 1`$.
    pub fn new(matrix: Matrix3<i32>) -> Result<Self, anyhow::Error> {
        let det = int_determinant(&matrix);
        ensure!(
            det == 1 || det == -1,
            "Rotation matrix {matrix} has determinant {det} instead of ±1."
        );
        Ok(Self(matrix))
    }

    /// Constructs a rotation matrix from its three columns.
    pub fn from_columns(columns: &[Vector3<i32>; 3]) -> Result<Self, anyhow::Error> {
        Self::new(Matrix3::from_columns(columns))
    }

    /// Constructs a rotation matrix from its three rows.
    pub fn from_rows(rows: [[i32; 3]; 3]) -> Result<Self, anyhow::Error> {
        Self::new(Matrix3::new(
            rows[0][0], rows[0][1], rows[0][2], rows[1][0], rows[1][1], rows[1][2], rows[2][0],
            rows[2][1], rows[2][2],
        ))
    }

    /// The identity rotation.
    pub fn identity() -> Self {
        Self(Matrix3::identity())
    }

    /// The inversion $`-\mathbf{I}`$.
    pub fn inversion() -> Self {
        Self(-Matrix3::identity())
    }

    /// Returns the underlying integer matrix.
    pub fn matrix(&self) -> &Matrix3<i32> {
        &self.0
    }

    /// Returns the rotation matrix with floating-point entries.
    pub fn to_f64(&self) -> Matrix3<f64> {
        self.0.map(f64::from)
    }

    pub fn determinant(&self) -> i32 {
        int_determinant(&self.0)
    }

    pub fn trace(&self) -> i32 {
        self.0.trace()
    }

    /// Returns the exact inverse. Since the determinant is $`\pm 1`$, this is the adjugate
    /// multiplied by the determinant.
    pub fn inverse(&self) -> Self {
        Self(int_adjugate(&self.0) * self.determinant())
    }

    /// Returns the proper part of this rotation, *i.e.* the rotation itself if it is proper, or
    /// its product with the inversion otherwise.
    pub fn proper(&self) -> Self {
        if self.determinant() == 1 {
            *self
        } else {
            -*self
        }
    }

    pub fn is_identity(&self) -> bool {
        self.0 == Matrix3::identity()
    }

    pub fn is_inversion(&self) -> bool {
        self.0 == -Matrix3::identity()
    }

    /// Classifies this rotation from its determinant and trace.
    ///
    /// # Errors
    ///
    /// Errors if the trace is not compatible with any crystallographic rotation.
    pub fn kind(&self) -> Result<RotationKind, anyhow::Error> {
        let kind = match (self.determinant(), self.trace()) {
            (1, 3) => RotationKind::Identity,
            (1, 2) => RotationKind::SixFold,
            (1, 1) => RotationKind::FourFold,
            (1, 0) => RotationKind::ThreeFold,
            (1, -1) => RotationKind::TwoFold,
            (-1, -3) => RotationKind::Inversion,
            (-1, -2) => RotationKind::SixFoldRotoinversion,
            (-1, -1) => RotationKind::FourFoldRotoinversion,
            (-1, 0) => RotationKind::ThreeFoldRotoinversion,
            (-1, 1) => RotationKind::Mirror,
            (det, trace) => bail!(
                "Rotation matrix {} with determinant {det} and trace {trace} is not crystallographic.",
                self.0
            ),
        };
        Ok(kind)
    }

    /// Returns the order of this rotation.
    pub fn order(&self) -> Result<usize, anyhow::Error> {
        self.kind().map(|kind| kind.order())
    }

    /// Returns the sum $`\sum_{k=0}^{n-1} \mathbf{R}^k`$ where $`n`$ is the order of this
    /// rotation. Multiplying a translation by this matrix and dividing by $`n`$ yields the
    /// intrinsic (screw or glide) part of the translation.
    pub fn accumulate(&self) -> Result<Matrix3<i32>, anyhow::Error> {
        let order = self.order()?;
        let mut power = Matrix3::<i32>::identity();
        let mut sum = Matrix3::<i32>::zeros();
        for _ in 0..order {
            sum += power;
            power *= self.0;
        }
        Ok(sum)
    }
}

// =====================
// Trait implementations
// =====================

impl Mul for RotationMatrix {
    type Output = RotationMatrix;

    fn mul(self, rhs: Self) -> Self::Output {
        RotationMatrix(self.0 * rhs.0)
    }
}

impl Mul<Vector3<i32>> for RotationMatrix {
    type Output = Vector3<i32>;

    fn mul(self, rhs: Vector3<i32>) -> Self::Output {
        self.0 * rhs
    }
}

impl Mul<Vector3<f64>> for RotationMatrix {
    type Output = Vector3<f64>;

    fn mul(self, rhs: Vector3<f64>) -> Self::Output {
        self.to_f64() * rhs
    }
}

impl Neg for RotationMatrix {
    type Output = RotationMatrix;

    fn neg(self) -> Self::Output {
        RotationMatrix(-self.0)
    }
}

impl fmt::Display for RotationMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = (0..3)
            .map(|i| {
                format!(
                    "[{:>2}, {:>2}, {:>2}]",
                    self.0[(i, 0)],
                    self.0[(i, 1)],
                    self.0[(i, 2)]
                )
            })
            .collect::<Vec<_>>();
        write!(f, "[{}]", rows.join(", "))
    }
}
