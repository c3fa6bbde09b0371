//! Lattice centrings and their pure-translation subgroups.

use std::fmt;

use anyhow::{self, bail, format_err};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "centring_tests.rs"]
mod centring_tests;

/// An enumerated type for the centrings of a conventional cell. Translations are given in
/// twelfths of the lattice vectors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Centring {
    /// No additional lattice points (multiplicity 1).
    Primitive,

    /// Body centring, $`(\frac{1}{2}, \frac{1}{2}, \frac{1}{2})`$ (multiplicity 2).
    Body,

    /// A-face centring, $`(0, \frac{1}{2}, \frac{1}{2})`$ (multiplicity 2).
    AFace,

    /// B-face centring, $`(\frac{1}{2}, 0, \frac{1}{2})`$ (multiplicity 2).
    BFace,

    /// C-face centring, $`(\frac{1}{2}, \frac{1}{2}, 0)`$ (multiplicity 2).
    CFace,

    /// All-face centring (multiplicity 4).
    Face,

    /// Rhombohedral centring of a hexagonal cell in the obverse setting (multiplicity 3).
    R,

    /// Hexagonal centring, $`(\frac{2}{3}, \frac{1}{3}, 0)`$ and $`(\frac{1}{3}, \frac{2}{3}, 0)`$
    /// (multiplicity 3).
    H,

    /// Rhombohedral centring along the body diagonal, $`(\frac{1}{3}, \frac{1}{3},
    /// \frac{1}{3})`$ (multiplicity 3).
    D,
}

impl Centring {
    /// Returns the pure lattice translations of this centring, including the zero translation.
    pub fn translations(&self) -> Vec<Vector3<i32>> {
        let mut translations = vec![Vector3::zeros()];
        match self {
            Centring::Primitive => {}
            Centring::Body => translations.push(Vector3::new(6, 6, 6)),
            Centring::AFace => translations.push(Vector3::new(0, 6, 6)),
            Centring::BFace => translations.push(Vector3::new(6, 0, 6)),
            Centring::CFace => translations.push(Vector3::new(6, 6, 0)),
            Centring::Face => translations.extend([
                Vector3::new(0, 6, 6),
                Vector3::new(6, 0, 6),
                Vector3::new(6, 6, 0),
            ]),
            Centring::R => {
                translations.extend([Vector3::new(8, 4, 4), Vector3::new(4, 8, 8)])
            }
            Centring::H => {
                translations.extend([Vector3::new(8, 4, 0), Vector3::new(4, 8, 0)])
            }
            Centring::D => {
                translations.extend([Vector3::new(4, 4, 4), Vector3::new(8, 8, 8)])
            }
        }
        translations
    }

    /// Returns the number of lattice points per cell.
    pub fn multiplicity(&self) -> usize {
        self.translations().len()
    }

    /// Returns the lattice symbol of this centring.
    pub fn symbol(&self) -> char {
        match self {
            Centring::Primitive => 'P',
            Centring::Body => 'I',
            Centring::AFace => 'A',
            Centring::BFace => 'B',
            Centring::CFace => 'C',
            Centring::Face => 'F',
            Centring::R => 'R',
            Centring::H => 'H',
            Centring::D => 'D',
        }
    }

    /// Parses a lattice symbol.
    pub fn from_symbol(symbol: char) -> Result<Self, anyhow::Error> {
        let centring = match symbol.to_ascii_uppercase() {
            'P' => Centring::Primitive,
            'I' => Centring::Body,
            'A' => Centring::AFace,
            'B' => Centring::BFace,
            'C' => Centring::CFace,
            'F' => Centring::Face,
            'R' => Centring::R,
            'H' => Centring::H,
            'D' => Centring::D,
            other => bail!("Unknown lattice symbol `{other}`."),
        };
        Ok(centring)
    }

    /// Determines the centring from the lattice symbol of a Hall symbol, which follows an
    /// optional leading `-` for centrosymmetric groups.
    pub fn from_hall_symbol(hall: &str) -> Result<Self, anyhow::Error> {
        let symbol = hall
            .trim_start()
            .trim_start_matches('-')
            .chars()
            .next()
            .ok_or_else(|| format_err!("Empty Hall symbol."))?;
        Self::from_symbol(symbol)
    }

    /// Classifies a set of pure lattice translations, as produced by
    /// [`crate::symmetry::operation_set::SymmetryOperationSet::lattice_translations`].
    ///
    /// The translations must be distinct and sorted so that the zero translation comes first.
    /// Counts without a matching centring fall back to [`Centring::Primitive`].
    pub fn classify(translations: &[Vector3<i32>]) -> Self {
        match translations.len() {
            2 => {
                let t = &translations[1];
                if t.x == 0 {
                    Centring::AFace
                } else if t.y == 0 {
                    Centring::BFace
                } else if t.z == 0 {
                    Centring::CFace
                } else {
                    Centring::Body
                }
            }
            3 => {
                if translations[1..].iter().any(|t| t.iter().any(|c| *c == 0)) {
                    Centring::H
                } else if translations[1..].iter().all(|t| t.x == t.y && t.y == t.z) {
                    Centring::D
                } else {
                    Centring::R
                }
            }
            4 => Centring::Face,
            _ => Centring::Primitive,
        }
    }
}

impl fmt::Display for Centring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Centring::Primitive => "primitive",
            Centring::Body => "body-centred",
            Centring::AFace => "A-face-centred",
            Centring::BFace => "B-face-centred",
            Centring::CFace => "C-face-centred",
            Centring::Face => "face-centred",
            Centring::R => "rhombohedrally centred",
            Centring::H => "hexagonally centred",
            Centring::D => "body-diagonal centred",
        };
        write!(f, "{name} ({})", self.symbol())
    }
}
