//! Read-only tables of standard space-group settings keyed by Hall number.
//!
//! The detection and symmetrisation drivers only ever see a table through the
//! [`SpaceGroupTable`] trait, so any table, complete or synthetic, can be supplied. This module
//! ships [`BuiltinSpaceGroupTable`], a small table with one representative setting for several
//! crystal systems and centrings.

use std::fmt;

use anyhow::{self, format_err};
use nalgebra::Vector3;
use phf::phf_map;

use crate::symmetry::centring::Centring;
use crate::symmetry::change_of_basis::{
    monoclinic_centring_settings, orthorhombic_centring_settings, RotationalChangeOfBasis,
};
use crate::symmetry::operation_set::{decode_operators, SymmetryOperationSet};
use crate::symmetry::rotation_matrix::RotationMatrix;
use crate::symmetry::seitz_operator::SeitzOperator;


// ==================
// Struct definitions
// ==================

/// An enumerated type for the seven crystal systems.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CrystalSystem {
    Triclinic,
    Monoclinic,
    Orthorhombic,
    Tetragonal,
    Trigonal,
    Hexagonal,
    Cubic,
}

impl CrystalSystem {
    /// Returns the crystal system of a space group from its number in the International Tables.
    ///
    /// # Errors
    ///
    /// Errors if `space_group_number` is not between 1 and 230.
    pub fn from_space_group_number(space_group_number: u32) -> Result<Self, anyhow::Error> {
        match space_group_number {
            1..=2 => Ok(Self::Triclinic),
            3..=15 => Ok(Self::Monoclinic),
            16..=74 => Ok(Self::Orthorhombic),
            75..=142 => Ok(Self::Tetragonal),
            143..=167 => Ok(Self::Trigonal),
            168..=194 => Ok(Self::Hexagonal),
            195..=230 => Ok(Self::Cubic),
            _ => Err(format_err!(
                "Space group number {space_group_number} is not between 1 and 230."
            )),
        }
    }

    /// Returns the changes of basis under which a tabulated setting of this crystal system is
    /// compared against a structure, the identity first. Monoclinic settings are tried in all
    /// cell choices and unique axes, orthorhombic settings in all axis permutations.
    pub fn setting_changes(&self) -> Result<Vec<RotationalChangeOfBasis>, anyhow::Error> {
        match self {
            Self::Monoclinic => monoclinic_centring_settings(),
            Self::Orthorhombic => orthorhombic_centring_settings(),
            _ => Ok(vec![RotationalChangeOfBasis::new(RotationMatrix::identity())]),
        }
    }
}

impl fmt::Display for CrystalSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Triclinic => "triclinic",
            Self::Monoclinic => "monoclinic",
            Self::Orthorhombic => "orthorhombic",
            Self::Tetragonal => "tetragonal",
            Self::Trigonal => "trigonal",
            Self::Hexagonal => "hexagonal",
            Self::Cubic => "cubic",
        };
        write!(f, "{name}")
    }
}

/// A structure containing one standard setting of a space group, as stored in a space-group
/// table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpaceGroupSetting {
    /// The Hall number of this setting, between 1 and 530 in the standard tables.
    pub hall_number: u32,

    /// The number of the space group in the International Tables.
    pub space_group_number: u32,

    /// The Hall symbol of this setting.
    pub hall_symbol: &'static str,

    /// The Hermann--Mauguin symbol of this setting.
    pub hm_symbol: &'static str,

    /// The packed three-byte generators of this setting, excluding the inversion and the
    /// centring translations.
    pub encoded_generators: &'static [u8],

    /// Boolean indicating if the setting has an inversion centre.
    pub is_centrosymmetric: bool,

    /// The location of the inversion centre, in twelfths of the lattice vectors.
    pub inversion_center: [i32; 3],

    /// The lattice centring of this setting.
    pub centring: Centring,
}

impl SpaceGroupSetting {
    /// Returns the location of the inversion centre, in twelfths of the lattice vectors.
    pub fn inversion_center(&self) -> Vector3<i32> {
        Vector3::from(self.inversion_center)
    }

    /// Decodes the generators of this setting, with the inversion generator appended for
    /// centrosymmetric settings.
    ///
    /// # Errors
    ///
    /// Errors if a packed generator cannot be decoded.
    pub fn generators(&self) -> Result<Vec<SeitzOperator>, anyhow::Error> {
        let mut generators = decode_operators(self.encoded_generators)?;
        if self.is_centrosymmetric {
            generators.push(SeitzOperator::inversion_through(&self.inversion_center()));
        }
        Ok(generators)
    }

    /// Constructs the complete operation set of this setting, modulo lattice translations.
    ///
    /// # Errors
    ///
    /// Errors if a packed generator cannot be decoded.
    pub fn full_operations(&self) -> Result<SymmetryOperationSet, anyhow::Error> {
        SymmetryOperationSet::from_setting(self, true)
    }

    /// Returns the crystal system of this setting.
    pub fn crystal_system(&self) -> Result<CrystalSystem, anyhow::Error> {
        CrystalSystem::from_space_group_number(self.space_group_number)
    }

    /// Returns the pure translations of the centring of this setting.
    pub fn translation_vectors(&self) -> Vec<Vector3<i32>> {
        self.centring.translations()
    }
}

impl fmt::Display for SpaceGroupSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (No. {}, Hall #{}: {})",
            self.hm_symbol, self.space_group_number, self.hall_number, self.hall_symbol
        )
    }
}

// =================
// Trait definitions
// =================

/// Trait for read-only space-group tables.
pub trait SpaceGroupTable: Sync {
    /// Retrieves the setting with a given Hall number, or [`None`] if the table has no such
    /// setting.
    fn lookup(&self, hall_number: u32) -> Option<&SpaceGroupSetting>;

    /// Returns every Hall number in this table in increasing order.
    fn hall_numbers(&self) -> Vec<u32>;

    /// Retrieves the setting with a given Hall number.
    ///
    /// # Errors
    ///
    /// Errors if the table has no such setting.
    fn get(&self, hall_number: u32) -> Result<&SpaceGroupSetting, anyhow::Error> {
        self.lookup(hall_number).ok_or_else(|| {
            format_err!("Hall number {hall_number} is not present in the space-group table.")
        })
    }
}

// ==============
// Built-in table
// ==============

const CUBIC_GENERATORS: &[u8] = b"402045201";

static BUILTIN_SETTINGS: phf::Map<u32, SpaceGroupSetting> = phf_map! {
    1u32 => SpaceGroupSetting {
        hall_number: 1,
        space_group_number: 1,
        hall_symbol: "P 1",
        hm_symbol: "P 1",
        encoded_generators: b"012",
        is_centrosymmetric: false,
        inversion_center: [0, 0, 0],
        centring: Centring::Primitive,
    },
    2u32 => SpaceGroupSetting {
        hall_number: 2,
        space_group_number: 2,
        hall_symbol: "-P 1",
        hm_symbol: "P -1",
        encoded_generators: b"012",
        is_centrosymmetric: true,
        inversion_center: [0, 0, 0],
        centring: Centring::Primitive,
    },
    3u32 => SpaceGroupSetting {
        hall_number: 3,
        space_group_number: 3,
        hall_symbol: "P 2y",
        hm_symbol: "P 1 2 1",
        encoded_generators: b"315",
        is_centrosymmetric: false,
        inversion_center: [0, 0, 0],
        centring: Centring::Primitive,
    },
    9u32 => SpaceGroupSetting {
        hall_number: 9,
        space_group_number: 5,
        hall_symbol: "C 2y",
        hm_symbol: "C 1 2 1",
        encoded_generators: b"315",
        is_centrosymmetric: false,
        inversion_center: [0, 0, 0],
        centring: Centring::CFace,
    },
    108u32 => SpaceGroupSetting {
        hall_number: 108,
        space_group_number: 16,
        hall_symbol: "P 2 2",
        hm_symbol: "P 2 2 2",
        encoded_generators: b"342045",
        is_centrosymmetric: false,
        inversion_center: [0, 0, 0],
        centring: Centring::Primitive,
    },
    433u32 => SpaceGroupSetting {
        hall_number: 433,
        space_group_number: 146,
        hall_symbol: "R 3",
        hm_symbol: "R 3",
        encoded_generators: b"462",
        is_centrosymmetric: false,
        inversion_center: [0, 0, 0],
        centring: Centring::R,
    },
    517u32 => SpaceGroupSetting {
        hall_number: 517,
        space_group_number: 221,
        hall_symbol: "-P 4 2 3",
        hm_symbol: "P m -3 m",
        encoded_generators: CUBIC_GENERATORS,
        is_centrosymmetric: true,
        inversion_center: [0, 0, 0],
        centring: Centring::Primitive,
    },
    523u32 => SpaceGroupSetting {
        hall_number: 523,
        space_group_number: 225,
        hall_symbol: "-F 4 2 3",
        hm_symbol: "F m -3 m",
        encoded_generators: CUBIC_GENERATORS,
        is_centrosymmetric: true,
        inversion_center: [0, 0, 0],
        centring: Centring::Face,
    },
    529u32 => SpaceGroupSetting {
        hall_number: 529,
        space_group_number: 229,
        hall_symbol: "-I 4 2 3",
        hm_symbol: "I m -3 m",
        encoded_generators: CUBIC_GENERATORS,
        is_centrosymmetric: true,
        inversion_center: [0, 0, 0],
        centring: Centring::Body,
    },
};

/// The built-in space-group table: P 1, P -1, P 1 2 1, C 1 2 1, P 2 2 2, R 3 (hexagonal axes),
/// P m -3 m, F m -3 m and I m -3 m, each in its standard setting.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinSpaceGroupTable;

impl BuiltinSpaceGroupTable {
    pub fn new() -> Self {
        Self
    }
}

impl SpaceGroupTable for BuiltinSpaceGroupTable {
    fn lookup(&self, hall_number: u32) -> Option<&SpaceGroupSetting> {
        BUILTIN_SETTINGS.get(&hall_number)
    }

    fn hall_numbers(&self) -> Vec<u32> {
        let mut hall_numbers = BUILTIN_SETTINGS.keys().copied().collect::<Vec<_>>();
        hall_numbers.sort_unstable();
        hall_numbers
    }
}
