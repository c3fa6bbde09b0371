//! Exact Seitz operators with translations expressed in twelfths of lattice vectors.

use std::fmt;
use std::ops::Mul;

use anyhow::{self, ensure, format_err};
use itertools::Itertools;
use lazy_static::lazy_static;
use nalgebra::{Matrix3, Vector3};
use num::rational::Ratio;
use num_traits::ToPrimitive;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::symmetry::rotation_matrix::{RotationKind, RotationMatrix};

#[cfg(test)]
#[path = "seitz_operator_tests.rs"]
mod seitz_operator_tests;

/// The common denominator of all translations of crystallographic symmetry operations.
pub const TRANSLATION_DENOMINATOR: i32 = 12;

/// Rows `(r_x, r_y, r_z, t)` of the packed operator encoding. Each byte of an encoded operator is
/// `b'0'` plus an index into this table, giving one row of the rotation matrix and the
/// corresponding translation numerator (over [`TRANSLATION_DENOMINATOR`]).
const SEITZ_ROWS: [(i32, i32, i32, i32); 46] = [
    (1, 0, 0, 0),   // '0': x
    (0, 1, 0, 0),   // '1': y
    (0, 0, 1, 0),   // '2': z
    (-1, 0, 0, 0),  // '3': -x
    (0, -1, 0, 0),  // '4': -y
    (0, 0, -1, 0),  // '5': -z
    (1, -1, 0, 0),  // '6': x-y
    (-1, 1, 0, 0),  // '7': -x+y
    (1, 0, 0, 6),   // '8': x+1/2
    (1, 0, 0, 4),   // '9': x+1/3
    (1, 0, 0, 3),   // ':': x+1/4
    (1, 0, 0, 8),   // ';': x+2/3
    (1, 0, 0, 9),   // '<': x+3/4
    (0, 1, 0, 6),   // '=': y+1/2
    (0, 1, 0, 4),   // '>': y+1/3
    (0, 1, 0, 3),   // '?': y+1/4
    (0, 1, 0, 8),   // '@': y+2/3
    (0, 1, 0, 9),   // 'A': y+3/4
    (0, 0, 1, 6),   // 'B': z+1/2
    (0, 0, 1, 4),   // 'C': z+1/3
    (0, 0, 1, 3),   // 'D': z+1/4
    (0, 0, 1, 2),   // 'E': z+1/6
    (0, 0, 1, 8),   // 'F': z+2/3
    (0, 0, 1, 9),   // 'G': z+3/4
    (0, 0, 1, 10),  // 'H': z+5/6
    (-1, 0, 0, 6),  // 'I': -x+1/2
    (-1, 0, 0, 4),  // 'J': -x+1/3
    (-1, 0, 0, 3),  // 'K': -x+1/4
    (-1, 0, 0, 8),  // 'L': -x+2/3
    (-1, 0, 0, 9),  // 'M': -x+3/4
    (0, -1, 0, 6),  // 'N': -y+1/2
    (0, -1, 0, 4),  // 'O': -y+1/3
    (0, -1, 0, 3),  // 'P': -y+1/4
    (0, -1, 0, 8),  // 'Q': -y+2/3
    (0, -1, 0, 9),  // 'R': -y+3/4
    (0, 0, -1, 6),  // 'S': -z+1/2
    (0, 0, -1, 4),  // 'T': -z+1/3
    (0, 0, -1, 3),  // 'U': -z+1/4
    (0, 0, -1, 2),  // 'V': -z+1/6
    (0, 0, -1, 8),  // 'W': -z+2/3
    (0, 0, -1, 9),  // 'X': -z+3/4
    (0, 0, -1, 10), // 'Y': -z+5/6
    (1, -1, 0, 4),  // 'Z': x-y+1/3
    (1, -1, 0, 8),  // '[': x-y+2/3
    (-1, 1, 0, 4),  // '\': -x+y+1/3
    (-1, 1, 0, 8),  // ']': -x+y+2/3
];

lazy_static! {
    static ref XYZ_TERM_RE: Regex =
        Regex::new(r"[+-]?[^+-]+").expect("Invalid regular expression for xyz terms.");
}

// ==================
// Struct definitions
// ==================

/// An enumerated type classifying the geometric nature of a space-group operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymmetryType {
    Identity,
    Translation,
    Inversion,
    PureRotation,
    ScrewRotation,
    PureReflection,
    GlideReflection,
    Rotoinversion,
}

impl fmt::Display for SymmetryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SymmetryType::Identity => "identity",
            SymmetryType::Translation => "translation",
            SymmetryType::Inversion => "inversion",
            SymmetryType::PureRotation => "rotation",
            SymmetryType::ScrewRotation => "screw rotation",
            SymmetryType::PureReflection => "reflection",
            SymmetryType::GlideReflection => "glide reflection",
            SymmetryType::Rotoinversion => "rotoinversion",
        };
        write!(f, "{name}")
    }
}

/// A structure representing a space-group operation $`(\mathbf{R}, \mathbf{t})`$ exactly.
///
/// The translation is stored as integer numerators over [`TRANSLATION_DENOMINATOR`] and is always
/// reduced into $`[0, 12)`$ per axis, so that structural equality and hashing coincide with
/// equality of operations modulo lattice translations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeitzOperator {
    rotation: RotationMatrix,
    translation: Vector3<i32>,
}

impl SeitzOperator {
    /// Constructs a Seitz operator, reducing the translation modulo the lattice.
    ///
    /// # Arguments
    ///
    /// * `rotation` - The rotational part.
    /// * `translation` - The translation numerators over [`TRANSLATION_DENOMINATOR`].
    pub fn new(rotation: RotationMatrix, translation: Vector3<i32>) -> Self {
        Self {
            rotation,
            translation: translation.map(|t| t.rem_euclid(TRANSLATION_DENOMINATOR)),
        }
    }

    /// The identity operation $`(\mathbf{I}, \mathbf{0})`$.
    pub fn identity() -> Self {
        Self::new(RotationMatrix::identity(), Vector3::zeros())
    }

    /// The inversion through the point with coordinates `centre` (in twelfths).
    pub fn inversion_through(centre: &Vector3<i32>) -> Self {
        Self::new(RotationMatrix::inversion(), *centre)
    }

    /// A pure lattice translation.
    pub fn translation_only(translation: Vector3<i32>) -> Self {
        Self::new(RotationMatrix::identity(), translation)
    }

    /// Decodes a packed three-byte operator.
    ///
    /// # Errors
    ///
    /// Errors if a byte lies outside the encoding table or if the decoded rotation is invalid.
    pub fn from_encoding(code: &[u8; 3]) -> Result<Self, anyhow::Error> {
        let mut rows = [[0i32; 3]; 3];
        let mut translation = Vector3::<i32>::zeros();
        for (axis, byte) in code.iter().enumerate() {
            let index = byte
                .checked_sub(b'0')
                .map(usize::from)
                .filter(|index| *index < SEITZ_ROWS.len())
                .ok_or_else(|| {
                    format_err!(
                        "Byte `{}` at position {axis} is not a valid packed operator code.",
                        char::from(*byte)
                    )
                })?;
            let (rx, ry, rz, t) = SEITZ_ROWS[index];
            rows[axis] = [rx, ry, rz];
            translation[axis] = t;
        }
        Ok(Self::new(RotationMatrix::from_rows(rows)?, translation))
    }

    /// Encodes this operator into its packed three-byte form.
    ///
    /// # Errors
    ///
    /// Errors if a row of this operator has no entry in the encoding table.
    pub fn encoding(&self) -> Result<[u8; 3], anyhow::Error> {
        let mut code = [0u8; 3];
        let m = self.rotation.matrix();
        for (axis, byte) in code.iter_mut().enumerate() {
            let row = (m[(axis, 0)], m[(axis, 1)], m[(axis, 2)], self.translation[axis]);
            let index = SEITZ_ROWS
                .iter()
                .position(|entry| *entry == row)
                .ok_or_else(|| {
                    format_err!("Row {axis} of operator `{self}` has no packed encoding.")
                })?;
            *byte = b'0'
                + u8::try_from(index)
                    .map_err(|_| format_err!("Unable to convert `{index}` to `u8`."))?;
        }
        Ok(code)
    }

    /// Parses an operator from its `x,y,z` form, *e.g.* `-y,x-y,z+1/3` or `1/2+x, -y, 0.25-z`.
    ///
    /// # Errors
    ///
    /// Errors if the string does not have three comma-separated components, if a term cannot be
    /// parsed, or if a translation is not a multiple of $`1/12`$.
    pub fn from_xyz_str(xyz: &str) -> Result<Self, anyhow::Error> {
        let components = xyz.split(',').collect_vec();
        ensure!(
            components.len() == 3,
            "Operator `{xyz}` does not have exactly three components."
        );
        let mut rows = [[0i32; 3]; 3];
        let mut translation = Vector3::<i32>::zeros();
        for (axis, component) in components.iter().enumerate() {
            let compact = component
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_lowercase();
            ensure!(!compact.is_empty(), "Empty component in operator `{xyz}`.");
            let terms = XYZ_TERM_RE
                .find_iter(&compact)
                .map(|m| m.as_str())
                .collect_vec();
            // Signs without a term after them are not matched by the term pattern.
            ensure!(
                terms.iter().map(|term| term.len()).sum::<usize>() == compact.len(),
                "Dangling sign in component `{compact}` of operator `{xyz}`."
            );
            for term in terms {
                let (sign, body) = match term.strip_prefix('-') {
                    Some(body) => (-1, body),
                    None => (1, term.strip_prefix('+').unwrap_or(term)),
                };
                if let Some(variable) = body.chars().last().filter(|c| "xyz".contains(*c)) {
                    let coefficient = body[..body.len() - 1].trim_end_matches('*');
                    let coefficient = if coefficient.is_empty() {
                        1
                    } else {
                        coefficient.parse::<i32>().map_err(|err| {
                            format_err!("Invalid coefficient in term `{term}` of `{xyz}`: {err}")
                        })?
                    };
                    let column = match variable {
                        'x' => 0,
                        'y' => 1,
                        _ => 2,
                    };
                    rows[axis][column] = rows[axis][column]
                        .checked_add(sign * coefficient)
                        .ok_or_else(|| format_err!("Coefficient overflow in `{xyz}`."))?;
                } else {
                    translation[axis] = translation[axis]
                        .checked_add(sign * parse_twelfths(body)?)
                        .ok_or_else(|| format_err!("Translation overflow in `{xyz}`."))?;
                }
            }
        }
        Ok(Self::new(RotationMatrix::from_rows(rows)?, translation))
    }

    pub fn rotation(&self) -> &RotationMatrix {
        &self.rotation
    }

    /// Returns the translation numerators over [`TRANSLATION_DENOMINATOR`], in $`[0, 12)`$.
    pub fn translation(&self) -> &Vector3<i32> {
        &self.translation
    }

    /// Returns the translation as fractional coordinates.
    pub fn translation_f64(&self) -> Vector3<f64> {
        self.translation
            .map(|t| f64::from(t) / f64::from(TRANSLATION_DENOMINATOR))
    }

    /// Returns the exact inverse $`(\mathbf{R}^{-1}, -\mathbf{R}^{-1}\mathbf{t})`$.
    pub fn inverse(&self) -> Self {
        let rotation = self.rotation.inverse();
        Self::new(rotation, -(rotation * self.translation))
    }

    /// Applies this operator to a fractional position without wrapping the result.
    pub fn apply(&self, position: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * *position + self.translation_f64()
    }

    pub fn is_identity(&self) -> bool {
        self.rotation.is_identity() && self.translation == Vector3::zeros()
    }

    /// Returns `n` times the intrinsic (screw or glide) translation in twelfths, where `n` is the
    /// order of the rotation, together with `n`.
    fn scaled_intrinsic_translation(&self) -> Result<(Vector3<i32>, i32), anyhow::Error> {
        let order = i32::try_from(self.rotation.order()?)
            .map_err(|_| format_err!("Unable to convert the rotation order to `i32`."))?;
        Ok((self.rotation.accumulate()? * self.translation, order))
    }

    /// Returns the intrinsic (screw or glide) part of the translation as fractional coordinates.
    pub fn intrinsic_translation(&self) -> Result<Vector3<f64>, anyhow::Error> {
        let (scaled, order) = self.scaled_intrinsic_translation()?;
        let denominator = f64::from(order * TRANSLATION_DENOMINATOR);
        Ok(scaled.map(|t| f64::from(t) / denominator))
    }

    /// Returns the location part of the translation, *i.e.* the translation minus its intrinsic
    /// part, as fractional coordinates.
    pub fn location_translation(&self) -> Result<Vector3<f64>, anyhow::Error> {
        Ok(self.translation_f64() - self.intrinsic_translation()?)
    }

    /// Classifies the geometric nature of this operation.
    pub fn symmetry_type(&self) -> Result<SymmetryType, anyhow::Error> {
        let kind = self.rotation.kind()?;
        let (scaled, order) = self.scaled_intrinsic_translation()?;
        let has_intrinsic = scaled
            .iter()
            .any(|t| t.rem_euclid(order * TRANSLATION_DENOMINATOR) != 0);
        let symmetry_type = match kind {
            RotationKind::Identity if self.translation == Vector3::zeros() => {
                SymmetryType::Identity
            }
            RotationKind::Identity => SymmetryType::Translation,
            RotationKind::Inversion => SymmetryType::Inversion,
            RotationKind::Mirror if has_intrinsic => SymmetryType::GlideReflection,
            RotationKind::Mirror => SymmetryType::PureReflection,
            _ if kind.is_proper() && has_intrinsic => SymmetryType::ScrewRotation,
            _ if kind.is_proper() => SymmetryType::PureRotation,
            _ => SymmetryType::Rotoinversion,
        };
        Ok(symmetry_type)
    }
}

/// Parses a translation term, either a fraction `n/d` or a decimal number, into twelfths.
fn parse_twelfths(term: &str) -> Result<i32, anyhow::Error> {
    if let Some((num, den)) = term.split_once('/') {
        let num = num
            .parse::<i32>()
            .map_err(|err| format_err!("Invalid numerator in `{term}`: {err}"))?;
        let den = den
            .parse::<i32>()
            .map_err(|err| format_err!("Invalid denominator in `{term}`: {err}"))?;
        let scaled = num
            .checked_mul(TRANSLATION_DENOMINATOR)
            .ok_or_else(|| format_err!("Translation `{term}` is out of range."))?;
        ensure!(
            den != 0 && scaled % den == 0,
            "Translation `{term}` is not a multiple of 1/{TRANSLATION_DENOMINATOR}."
        );
        Ok(scaled / den)
    } else {
        let value = term
            .parse::<f64>()
            .map_err(|err| format_err!("Invalid translation term `{term}`: {err}"))?;
        let scaled = value * f64::from(TRANSLATION_DENOMINATOR);
        ensure!(
            (scaled - scaled.round()).abs() < 1e-6,
            "Translation `{term}` is not a multiple of 1/{TRANSLATION_DENOMINATOR}."
        );
        scaled
            .round()
            .to_i32()
            .ok_or_else(|| format_err!("Unable to convert `{scaled}` to `i32`."))
    }
}

// =====================
// Trait implementations
// =====================

impl Mul for SeitzOperator {
    type Output = SeitzOperator;

    /// Composes two operators: $`(\mathbf{R}_1, \mathbf{t}_1)(\mathbf{R}_2, \mathbf{t}_2) =
    /// (\mathbf{R}_1\mathbf{R}_2, \mathbf{R}_1\mathbf{t}_2 + \mathbf{t}_1)`$.
    fn mul(self, rhs: Self) -> Self::Output {
        SeitzOperator::new(
            self.rotation * rhs.rotation,
            self.rotation * rhs.translation + self.translation,
        )
    }
}

impl fmt::Display for SeitzOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m: &Matrix3<i32> = self.rotation.matrix();
        let components = (0..3)
            .map(|axis| {
                let mut component = String::new();
                for (column, variable) in ['x', 'y', 'z'].iter().enumerate() {
                    let coefficient = m[(axis, column)];
                    let sign = if coefficient < 0 {
                        "-"
                    } else if component.is_empty() {
                        ""
                    } else {
                        "+"
                    };
                    match coefficient.abs() {
                        0 => {}
                        1 => component.push_str(&format!("{sign}{variable}")),
                        n => component.push_str(&format!("{sign}{n}{variable}")),
                    }
                }
                let t = self.translation[axis];
                if t != 0 {
                    let fraction = Ratio::new(t, TRANSLATION_DENOMINATOR);
                    if component.is_empty() {
                        component.push_str(&format!("{fraction}"));
                    } else {
                        component.push_str(&format!("+{fraction}"));
                    }
                }
                if component.is_empty() {
                    component.push('0');
                }
                component
            })
            .collect_vec();
        write!(f, "{}", components.join(","))
    }
}
