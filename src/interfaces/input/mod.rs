//! The YAML input file of the `crysym` binary.

use anyhow::{self, bail, format_err};
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::auxiliary::atom::{AtomRecord, ElementMap};
use crate::auxiliary::lattice::{CellParameters, LatticeMetric};
use crate::auxiliary::structure::PeriodicStructure;
use crate::drivers::crystal_symmetrisation::{
    CrystalSymmetrisationDriver, CrystalSymmetrisationParams,
};
use crate::drivers::space_group_detection::{
    SpaceGroupDetectionDriver, SpaceGroupDetectionParams, SpaceGroupDetectionResult,
};
use crate::drivers::CrySymDriver;
use crate::interfaces::InputHandle;
use crate::io::format::{crysym_output, log_title, CrySymOutput};
use crate::io::{CrySymFile, CrySymFileType};
use crate::spacegroup::BuiltinSpaceGroupTable;


/// A structure specifying the crystal structure in a YAML input file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StructureInput {
    /// The cell parameters $`(a, b, c, \alpha, \beta, \gamma)`$, with angles in degrees. Only one
    /// of this or [`Self::cell_matrix`] should be specified.
    #[serde(default)]
    pub cell_parameters: Option<CellParameters>,

    /// The cell matrix, given as the three lattice vectors in cartesian components. Only one of
    /// this or [`Self::cell_parameters`] should be specified.
    #[serde(default)]
    pub cell_matrix: Option<[[f64; 3]; 3]>,

    /// The atoms of the unit cell, each given as `symbol x y z`.
    pub atoms: Vec<String>,

    /// Boolean indicating if the atom coordinates are cartesian rather than fractional.
    #[serde(default)]
    pub cartesian: bool,
}

impl StructureInput {
    /// Constructs the periodic structure described by this input.
    ///
    /// # Errors
    ///
    /// Errors if neither or both lattice specifications are given, if the lattice is degenerate,
    /// or if an atom line cannot be parsed.
    pub fn to_structure(&self, emap: &ElementMap) -> Result<PeriodicStructure, anyhow::Error> {
        let lattice = match (self.cell_parameters.as_ref(), self.cell_matrix.as_ref()) {
            (Some(parameters), None) => LatticeMetric::from_parameters(parameters)?,
            (None, Some(vectors)) => LatticeMetric::new(Matrix3::from_columns(
                &(*vectors).map(Vector3::from),
            ))?,
            _ => bail!("Exactly one of `cell_parameters` and `cell_matrix` must be specified."),
        };
        let atoms = self
            .atoms
            .iter()
            .map(|line| {
                let atom = AtomRecord::from_line(line, emap)?;
                Ok((atom.atomic_symbol, atom.position))
            })
            .collect::<Result<Vec<_>, anyhow::Error>>()?;
        if self.cartesian {
            PeriodicStructure::from_cartesian(lattice, &atoms, emap)
        } else {
            PeriodicStructure::from_fractional(lattice, &atoms, emap)
        }
    }
}

/// An enumerated type representing possible input kinds for space-group detection from a YAML
/// input file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum SpaceGroupDetectionInputKind {
    /// Variant indicating that the parameters for the space-group detection driver will be
    /// specified.
    Parameters(SpaceGroupDetectionParams),

    /// Variant indicating that the space-group detection results will be read in from a `crysym`
    /// [`CrySymFileType::Sgd`] binary file. The associated string gives the name of the file
    /// without its `.crysym.sgd` extension.
    FromFile(String),
}

impl Default for SpaceGroupDetectionInputKind {
    fn default() -> Self {
        SpaceGroupDetectionInputKind::Parameters(SpaceGroupDetectionParams::default())
    }
}

/// A structure containing `crysym` input parameters which can be serialised into and
/// deserialised from a YAML input file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Input {
    /// The crystal structure to be analysed.
    pub structure: StructureInput,

    /// Specification for space-group detection. If `None`, no space-group detection will be
    /// performed.
    #[serde(default)]
    pub space_group_detection: Option<SpaceGroupDetectionInputKind>,

    /// Parameters for crystal symmetrisation. If `None`, no crystal symmetrisation will be
    /// performed.
    #[serde(default)]
    pub crystal_symmetrisation: Option<CrystalSymmetrisationParams>,
}

impl InputHandle for Input {
    fn handle(&self) -> Result<(), anyhow::Error> {
        let emap = ElementMap::new();
        let structure = self.structure.to_structure(&emap)?;
        let table = BuiltinSpaceGroupTable::new();

        match self.space_group_detection.as_ref() {
            Some(SpaceGroupDetectionInputKind::Parameters(params)) => {
                let mut driver = SpaceGroupDetectionDriver::builder()
                    .parameters(params)
                    .structure(&structure)
                    .table(&table)
                    .build()
                    .map_err(|err| format_err!(err))?;
                driver.run()?;
            }
            Some(SpaceGroupDetectionInputKind::FromFile(name)) => {
                log_title("Space-Group Detection");
                crysym_output!("");
                let result = SpaceGroupDetectionResult::load(name)?;
                crysym_output!(
                    "Space-group detection results read in from {name}.{}:",
                    CrySymFileType::Sgd.ext()
                );
                crysym_output!("");
                result.log_output_display();
            }
            None => {}
        }

        if let Some(params) = self.crystal_symmetrisation.as_ref() {
            let mut driver = CrystalSymmetrisationDriver::builder()
                .parameters(params)
                .structure(&structure)
                .table(&table)
                .build()
                .map_err(|err| format_err!(err))?;
            driver.run()?;
        }
        Ok(())
    }
}
