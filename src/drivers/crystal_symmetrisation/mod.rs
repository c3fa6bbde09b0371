//! Driver for the symmetrisation of a crystal structure in a known space group.

use std::fmt;

use anyhow::{self, bail, format_err};
use derive_builder::Builder;
use log;
use serde::{Deserialize, Serialize};

use crate::auxiliary::atom::AtomRecord;
use crate::auxiliary::lattice::{LatticeMetric, DEFAULT_OVERLAP_TOLERANCE};
use crate::auxiliary::structure::PeriodicStructure;
use crate::drivers::CrySymDriver;
use crate::io::format::{crysym_error, crysym_output, log_subtitle, log_title, nice_bool, CrySymOutput};
use crate::io::{CrySymFile, CrySymFileType};
use crate::spacegroup::SpaceGroupTable;
use crate::symmetry::floating_operation_set::FloatingSymmetryOperationSet;
use crate::symmetry::floating_seitz_operator::fract;


// =========
// Functions
// =========

/// Symmetrises the atoms of a unit cell in place.
///
/// The atoms are partitioned into orbits, each orbit representative is moved to its
/// site-symmetry average, and every other atom is moved onto the image of its representative
/// that it overlaps.
///
/// # Returns
///
/// The indices of the orbit representatives.
///
/// # Errors
///
/// Errors if a representative has no site-symmetry operation or if an atom matches no image of
/// any representative, both of which mean that `operations` is not a symmetry of the atoms.
pub(crate) fn symmetrise_atoms(
    operations: &FloatingSymmetryOperationSet,
    lattice: &LatticeMetric,
    atoms: &mut [AtomRecord],
    tolerance: f64,
) -> Result<Vec<usize>, anyhow::Error> {
    let representatives = operations.asymmetric_atoms(lattice, atoms, tolerance);
    let mut independent_atoms = representatives
        .iter()
        .map(|&i| atoms[i].clone())
        .collect::<Vec<_>>();
    operations.symmetrize(lattice, &mut independent_atoms, tolerance)?;
    for (independent, &i) in independent_atoms.iter_mut().zip(representatives.iter()) {
        independent.position = fract(&independent.position);
        atoms[i].position = independent.position;
    }

    for (i, atom) in atoms.iter_mut().enumerate() {
        if representatives.contains(&i) {
            continue;
        }
        if !operations.set_equivalent_atoms(lattice, &independent_atoms, atom, tolerance) {
            bail!("Atom {i} ({atom}) is not the image of any orbit representative.");
        }
    }
    log::debug!(
        "Symmetrised {} atom(s) from {} orbit representative(s).",
        atoms.len(),
        representatives.len()
    );
    Ok(representatives)
}

// ==================
// Struct definitions
// ==================

// ----------
// Parameters
// ----------

/// A structure containing control parameters for crystal symmetrisation.
#[derive(Clone, Builder, Debug, Serialize, Deserialize)]
pub struct CrystalSymmetrisationParams {
    /// The Hall number of the space-group setting in which the structure is symmetrised.
    pub hall_number: u32,

    /// The cartesian distance below which two positions are considered to coincide.
    #[builder(default = "DEFAULT_OVERLAP_TOLERANCE")]
    #[serde(default = "default_symmetry_precision")]
    pub symmetry_precision: f64,

    /// Optional name for saving the result as a binary file of type [`CrySymFileType::Sym`]. If
    /// `None`, the result will not be saved.
    #[builder(default = "None")]
    #[serde(default)]
    pub result_save_name: Option<String>,
}

fn default_symmetry_precision() -> f64 {
    DEFAULT_OVERLAP_TOLERANCE
}

impl CrystalSymmetrisationParams {
    /// Returns a builder to construct a [`CrystalSymmetrisationParams`] structure.
    pub fn builder() -> CrystalSymmetrisationParamsBuilder {
        CrystalSymmetrisationParamsBuilder::default()
    }
}

impl fmt::Display for CrystalSymmetrisationParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Hall number: {}", self.hall_number)?;
        writeln!(f, "Symmetry precision: {:.3e}", self.symmetry_precision)?;
        writeln!(
            f,
            "Save crystal symmetrisation results to file: {}",
            if let Some(name) = self.result_save_name.as_ref() {
                format!("{name}.{}", CrySymFileType::Sym.ext())
            } else {
                nice_bool(false)
            }
        )?;
        writeln!(f)?;
        Ok(())
    }
}

// ------
// Result
// ------

/// A structure to contain crystal symmetrisation results.
#[derive(Clone, Builder, Debug, Serialize, Deserialize)]
pub struct CrystalSymmetrisationResult {
    /// The control parameters used to obtain this set of results.
    pub parameters: CrystalSymmetrisationParams,

    /// The Hermann--Mauguin symbol of the setting used.
    pub hm_symbol: String,

    /// The operations of the setting used.
    pub operations: FloatingSymmetryOperationSet,

    /// The symmetrised structure. Every atom carries the index of its orbit.
    pub symmetrised_structure: PeriodicStructure,

    /// The indices of the orbit representatives in [`Self::symmetrised_structure`].
    pub asymmetric_atoms: Vec<usize>,

    /// The largest distance by which an atom has been moved.
    pub max_displacement: f64,
}

impl CrySymFile for CrystalSymmetrisationResult {
    const FILE_TYPE: CrySymFileType = CrySymFileType::Sym;
}

impl CrystalSymmetrisationResult {
    fn builder() -> CrystalSymmetrisationResultBuilder {
        CrystalSymmetrisationResultBuilder::default()
    }
}

impl fmt::Display for CrystalSymmetrisationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Symmetrised in: {} ({} operations, {})",
            self.hm_symbol,
            self.operations.len(),
            self.operations.centring()
        )?;
        writeln!(f, "Number of orbits: {}", self.asymmetric_atoms.len())?;
        writeln!(f, "Largest displacement: {:.3e}", self.max_displacement)?;
        writeln!(f)?;
        writeln!(f, "Symmetrised structure:")?;
        write!(f, "{}", self.symmetrised_structure)?;
        Ok(())
    }
}

// ------
// Driver
// ------

/// A driver for crystal symmetrisation.
#[derive(Clone, Builder)]
pub struct CrystalSymmetrisationDriver<'a> {
    /// The control parameters for crystal symmetrisation.
    parameters: &'a CrystalSymmetrisationParams,

    /// The structure to be symmetrised.
    structure: &'a PeriodicStructure,

    /// The table providing the setting of [`CrystalSymmetrisationParams::hall_number`].
    table: &'a dyn SpaceGroupTable,

    /// The result of the crystal symmetrisation.
    #[builder(setter(skip), default = "None")]
    result: Option<CrystalSymmetrisationResult>,
}

impl<'a> CrystalSymmetrisationDriver<'a> {
    /// Returns a builder to construct a [`CrystalSymmetrisationDriver`] structure.
    pub fn builder() -> CrystalSymmetrisationDriverBuilder<'a> {
        CrystalSymmetrisationDriverBuilder::default()
    }

    /// Executes crystal symmetrisation.
    fn symmetrise_crystal(&mut self) -> Result<(), anyhow::Error> {
        log_title("Crystal Symmetrisation");
        crysym_output!("");
        let params = self.parameters;
        params.log_output_display();

        let setting = self.table.get(params.hall_number)?;
        crysym_output!("Space-group setting: {setting}");
        crysym_output!("");
        let operations = setting.full_operations()?.to_floating();
        if !operations.is_symmetry_of(self.structure, params.symmetry_precision) {
            let msg = format!(
                "The operations of {setting} do not map the structure onto itself at a precision of {:.3e}.",
                params.symmetry_precision
            );
            crysym_error!("{msg}");
            bail!(msg);
        }

        let mut symmetrised_structure = self.structure.clone();
        let asymmetric_atoms = {
            let (lattice, atoms) = symmetrised_structure.split_mut();
            symmetrise_atoms(&operations, lattice, atoms, params.symmetry_precision)?
        };

        log_subtitle("Atom displacements");
        crysym_output!("");
        let lattice = self.structure.lattice();
        let displacements = self
            .structure
            .atoms()
            .iter()
            .zip(symmetrised_structure.atoms().iter())
            .map(|(original, symmetrised)| {
                lattice
                    .minimum_image_distance_squared(&original.position, &symmetrised.position)
                    .sqrt()
            })
            .collect::<Vec<_>>();
        crysym_output!("{}", "┈".repeat(42));
        crysym_output!("{:>5} {:>7} {:>7} {:>14}", "#", "Atom", "Orbit", "Displacement");
        crysym_output!("{}", "┈".repeat(42));
        for (i, (atom, displacement)) in symmetrised_structure
            .atoms()
            .iter()
            .zip(displacements.iter())
            .enumerate()
        {
            crysym_output!(
                "{:>5} {:>7} {:>7} {:>14.3e}",
                i,
                atom.atomic_symbol,
                atom.asymmetric_type
                    .map(|orbit| orbit.to_string())
                    .unwrap_or_else(|| "--".to_string()),
                displacement
            );
        }
        crysym_output!("{}", "┈".repeat(42));
        crysym_output!("");
        let max_displacement = displacements.into_iter().fold(0.0, f64::max);

        let result = CrystalSymmetrisationResult::builder()
            .parameters(params.clone())
            .hm_symbol(setting.hm_symbol.to_string())
            .operations(operations)
            .symmetrised_structure(symmetrised_structure)
            .asymmetric_atoms(asymmetric_atoms)
            .max_displacement(max_displacement)
            .build()
            .map_err(|err| format_err!(err))?;
        result.log_output_display();

        if let Some(name) = params.result_save_name.as_ref() {
            result.save(name)?;
            crysym_output!(
                "Crystal symmetrisation results saved as {name}.{}.",
                CrySymFileType::Sym.ext()
            );
            crysym_output!("");
        }
        self.result = Some(result);

        Ok(())
    }
}

impl CrySymDriver for CrystalSymmetrisationDriver<'_> {
    type Params = CrystalSymmetrisationParams;

    type Outcome = CrystalSymmetrisationResult;

    fn result(&self) -> Result<&Self::Outcome, anyhow::Error> {
        self.result
            .as_ref()
            .ok_or_else(|| format_err!("No crystal symmetrisation results found."))
    }

    fn run(&mut self) -> Result<(), anyhow::Error> {
        self.symmetrise_crystal()
    }
}
