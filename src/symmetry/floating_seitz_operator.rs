//! Seitz operators with real-valued translations.

use std::fmt;
use std::ops::Mul;

use anyhow::{self, format_err};
use nalgebra::Vector3;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::symmetry::rotation_matrix::RotationMatrix;
use crate::symmetry::seitz_operator::{SeitzOperator, TRANSLATION_DENOMINATOR};

#[cfg(test)]
#[path = "floating_seitz_operator_tests.rs"]
mod floating_seitz_operator_tests;

/// Wraps every component of a fractional vector into $`[0, 1)`$.
pub fn fract(v: &Vector3<f64>) -> Vector3<f64> {
    v.map(|x| {
        let wrapped = x - x.floor();
        // `x - floor(x)` can round up to exactly one for tiny negative `x`.
        if wrapped >= 1.0 {
            0.0
        } else {
            wrapped
        }
    })
}

/// A structure representing a space-group operation with an integer rotation and a real-valued
/// translation in $`[0, 1)`$, used when operations act directly on continuous coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FloatingSeitzOperator {
    rotation: RotationMatrix,
    translation: Vector3<f64>,
}

impl FloatingSeitzOperator {
    /// Constructs a floating Seitz operator, wrapping the translation into the unit cell.
    pub fn new(rotation: RotationMatrix, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation: fract(&translation),
        }
    }

    pub fn rotation(&self) -> &RotationMatrix {
        &self.rotation
    }

    pub fn translation(&self) -> &Vector3<f64> {
        &self.translation
    }

    /// Converts this operator into an exact one by rounding the translation to the nearest
    /// twelfth.
    ///
    /// # Errors
    ///
    /// Errors if a translation component cannot be represented as an integer number of twelfths.
    pub fn to_exact(&self) -> Result<SeitzOperator, anyhow::Error> {
        let mut translation = Vector3::<i32>::zeros();
        for (exact, t) in translation.iter_mut().zip(self.translation.iter()) {
            let scaled = (t * f64::from(TRANSLATION_DENOMINATOR)).round();
            *exact = scaled
                .to_i32()
                .ok_or_else(|| format_err!("Unable to convert `{scaled}` to `i32`."))?;
        }
        Ok(SeitzOperator::new(self.rotation, translation))
    }

    /// Returns the inverse operator.
    pub fn inverse(&self) -> Self {
        let rotation = self.rotation.inverse();
        Self::new(rotation, -(rotation * self.translation))
    }

    /// Returns this operator with the origin moved to `origin`, *i.e.* the operator that acts
    /// about `origin` as this one acts about the zero vector:
    /// $`(\mathbf{R}, \mathbf{t} + (\mathbf{I} - \mathbf{R})\mathbf{p})`$.
    pub fn with_origin_at(&self, origin: &Vector3<f64>) -> Self {
        Self::new(self.rotation, self.translation + origin - self.rotation * *origin)
    }

    /// Applies this operator to a fractional position without wrapping the result.
    pub fn apply(&self, position: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * *position + self.translation
    }

    /// Checks if this operator coincides with another one, with translations compared modulo
    /// lattice translations within `threshold`.
    pub fn approx_eq(&self, other: &Self, threshold: f64) -> bool {
        self.rotation == other.rotation
            && (self.translation - other.translation)
                .iter()
                .all(|dt| (dt - dt.round()).abs() < threshold)
    }
}

impl From<&SeitzOperator> for FloatingSeitzOperator {
    fn from(op: &SeitzOperator) -> Self {
        FloatingSeitzOperator::new(*op.rotation(), op.translation_f64())
    }
}

impl From<SeitzOperator> for FloatingSeitzOperator {
    fn from(op: SeitzOperator) -> Self {
        FloatingSeitzOperator::from(&op)
    }
}

impl Mul for FloatingSeitzOperator {
    type Output = FloatingSeitzOperator;

    fn mul(self, rhs: Self) -> Self::Output {
        FloatingSeitzOperator::new(
            self.rotation * rhs.rotation,
            self.rotation * rhs.translation + self.translation,
        )
    }
}

impl fmt::Display for FloatingSeitzOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, [{:.6}, {:.6}, {:.6}])",
            self.rotation, self.translation[0], self.translation[1], self.translation[2]
        )
    }
}
