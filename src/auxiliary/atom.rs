//! Atoms in periodic structures.

use std::collections::HashMap;
use std::fmt;

use anyhow::{self, ensure, format_err};
use nalgebra::Vector3;
use periodic_table;
use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "atom_tests.rs"]
mod atom_tests;

/// A structure storing a look-up between element symbols and atomic numbers.
pub struct ElementMap<'a> {
    /// A [`HashMap`] from a symbol string to a tuple of atomic number and atomic mass.
    pub map: HashMap<&'a str, (u32, f64)>,

    /// A [`HashMap`] from an atomic number to its symbol.
    pub symbols: HashMap<u32, &'a str>,
}

impl Default for ElementMap<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementMap<'static> {
    /// Creates a new [`ElementMap`] for all elements in the periodic table. Elements whose mass
    /// string cannot be parsed are given a zero mass.
    #[must_use]
    pub fn new() -> ElementMap<'static> {
        let mut map = HashMap::new();
        let mut symbols = HashMap::new();
        for element in periodic_table::periodic_table() {
            let mass = parse_atomic_mass(element.atomic_mass).unwrap_or(0.0);
            map.insert(element.symbol, (element.atomic_number, mass));
            symbols.insert(element.atomic_number, element.symbol);
        }
        ElementMap { map, symbols }
    }
}

impl<'a> ElementMap<'a> {
    /// Returns the atomic number of an element symbol.
    ///
    /// # Errors
    ///
    /// Errors if the symbol is not a known element.
    pub fn atomic_number(&self, symbol: &str) -> Result<u32, anyhow::Error> {
        self.map
            .get(symbol)
            .map(|(z, _)| *z)
            .ok_or_else(|| format_err!("Invalid atomic symbol `{symbol}` encountered."))
    }

    /// Returns the symbol of an atomic number.
    ///
    /// # Errors
    ///
    /// Errors if no element has this atomic number.
    pub fn symbol(&self, atomic_number: u32) -> Result<&'a str, anyhow::Error> {
        self.symbols
            .get(&atomic_number)
            .copied()
            .ok_or_else(|| format_err!("Invalid atomic number `{atomic_number}` encountered."))
    }
}

/// Parses an atomic mass string in the format of [`periodic_table`], either `x.y(z)` with the
/// uncertain digit in parentheses or `[x]` with the mass number of the most stable isotope.
fn parse_atomic_mass(mass_str: &str) -> Result<f64, anyhow::Error> {
    let mass = mass_str.replace(&['(', ')', '[', ']'][..], "");
    mass.parse::<f64>()
        .map_err(|err| format_err!("Unable to parse atomic mass string `{mass}`: {err}."))
}

/// A structure representing an atom of a periodic structure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AtomRecord {
    /// The atomic number of the atom.
    pub atomic_number: u32,

    /// The atomic symbol of the atom.
    pub atomic_symbol: String,

    /// The fractional coordinates of the atom.
    pub position: Vector3<f64>,

    /// The index of the orbit this atom belongs to, or [`None`] if the atom has not been
    /// classified yet.
    pub asymmetric_type: Option<usize>,
}

impl AtomRecord {
    /// Creates an unclassified atom from its element symbol.
    ///
    /// # Errors
    ///
    /// Errors if the symbol is not a known element.
    pub fn new(
        atomic_symbol: &str,
        position: Vector3<f64>,
        emap: &ElementMap,
    ) -> Result<Self, anyhow::Error> {
        Ok(Self {
            atomic_number: emap.atomic_number(atomic_symbol)?,
            atomic_symbol: atomic_symbol.to_string(),
            position,
            asymmetric_type: None,
        })
    }

    /// Creates an unclassified atom from its atomic number.
    ///
    /// # Errors
    ///
    /// Errors if no element has this atomic number.
    pub fn from_atomic_number(
        atomic_number: u32,
        position: Vector3<f64>,
        emap: &ElementMap,
    ) -> Result<Self, anyhow::Error> {
        Ok(Self {
            atomic_number,
            atomic_symbol: emap.symbol(atomic_number)?.to_string(),
            position,
            asymmetric_type: None,
        })
    }

    /// Parses a line of the form `symbol x y z`.
    ///
    /// # Errors
    ///
    /// Errors if the line does not have exactly four fields, if the symbol is unknown, or if a
    /// coordinate cannot be parsed.
    pub fn from_line(line: &str, emap: &ElementMap) -> Result<Self, anyhow::Error> {
        let split: Vec<&str> = line.split_whitespace().collect();
        ensure!(
            split.len() == 4,
            "Atom line `{line}` does not have the form `symbol x y z`."
        );
        let mut coordinates = [0.0; 3];
        for (coordinate, field) in coordinates.iter_mut().zip(split[1..].iter()) {
            *coordinate = field
                .parse::<f64>()
                .map_err(|err| format_err!("Unable to parse coordinate `{field}`: {err}."))?;
        }
        Self::new(split[0], Vector3::from(coordinates), emap)
    }
}

impl fmt::Display for AtomRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>3} {:+.7} {:+.7} {:+.7}",
            self.atomic_symbol, self.position[0], self.position[1], self.position[2]
        )?;
        if let Some(orbit) = self.asymmetric_type {
            write!(f, " [{orbit}]")?;
        }
        Ok(())
    }
}
