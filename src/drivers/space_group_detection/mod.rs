//! Driver for the detection of the space group of a crystal structure.
//!
//! Candidate settings are taken from a [`SpaceGroupTable`] and tried independently, in
//! parallel. A candidate matches if, in one of the alternative settings of its crystal system
//! and with its origin moved to a suitable point of the structure, every one of its operations
//! is an isometry of the lattice and maps the structure onto itself. The match of highest order
//! is reported, ties being broken in favour of the lowest Hall number. Finding no match is a
//! regular outcome.

use std::cmp::Reverse;
use std::fmt;

use anyhow::{self, format_err};
use derive_builder::Builder;
use itertools::Itertools;
use log;
use nalgebra::Vector3;
use num_traits::ToPrimitive;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::auxiliary::lattice::DEFAULT_OVERLAP_TOLERANCE;
use crate::auxiliary::structure::PeriodicStructure;
use crate::drivers::crystal_symmetrisation::symmetrise_atoms;
use crate::drivers::CrySymDriver;
use crate::io::format::{
    crysym_output, crysym_warn, log_subtitle, log_title, nice_bool, write_subtitle,
    CrySymOutput,
};
use crate::io::{CrySymFile, CrySymFileType};
use crate::spacegroup::SpaceGroupTable;
use crate::symmetry::change_of_basis::{ChangeOfBasis, RotationalChangeOfBasis};
use crate::symmetry::floating_operation_set::FloatingSymmetryOperationSet;
use crate::symmetry::operation_set::SymmetryOperationSet;
use crate::symmetry::origin_shift::find_origin_shift;
use crate::symmetry::seitz_operator::TRANSLATION_DENOMINATOR;


// ==================
// Struct definitions
// ==================

// ----------
// Parameters
// ----------

/// A structure containing control parameters for space-group detection.
#[derive(Clone, Builder, Debug, Serialize, Deserialize)]
pub struct SpaceGroupDetectionParams {
    /// The cartesian distance below which two positions are considered to coincide.
    #[builder(default = "DEFAULT_OVERLAP_TOLERANCE")]
    #[serde(default = "default_symmetry_precision")]
    pub symmetry_precision: f64,

    /// The Hall numbers to be tried. If `None`, every Hall number of the table is tried.
    #[builder(default = "None")]
    #[serde(default)]
    pub candidate_hall_numbers: Option<Vec<u32>>,

    /// Boolean indicating if the operations of the detected space group are to be written to the
    /// output.
    #[builder(default = "false")]
    #[serde(default)]
    pub write_operations: bool,

    /// Optional name for saving the result as a binary file of type [`CrySymFileType::Sgd`]. If
    /// `None`, the result will not be saved.
    #[builder(default = "None")]
    #[serde(default)]
    pub result_save_name: Option<String>,
}

fn default_symmetry_precision() -> f64 {
    DEFAULT_OVERLAP_TOLERANCE
}

impl SpaceGroupDetectionParams {
    /// Returns a builder to construct a [`SpaceGroupDetectionParams`] structure.
    pub fn builder() -> SpaceGroupDetectionParamsBuilder {
        SpaceGroupDetectionParamsBuilder::default()
    }
}

impl Default for SpaceGroupDetectionParams {
    fn default() -> Self {
        Self {
            symmetry_precision: DEFAULT_OVERLAP_TOLERANCE,
            candidate_hall_numbers: None,
            write_operations: false,
            result_save_name: None,
        }
    }
}

impl fmt::Display for SpaceGroupDetectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Symmetry precision: {:.3e}", self.symmetry_precision)?;
        writeln!(
            f,
            "Candidate Hall numbers: {}",
            self.candidate_hall_numbers
                .as_ref()
                .map(|hall_numbers| hall_numbers.iter().join(", "))
                .unwrap_or_else(|| "all in table".to_string())
        )?;
        writeln!(
            f,
            "Report space-group operations: {}",
            nice_bool(self.write_operations)
        )?;
        writeln!(
            f,
            "Save space-group detection results to file: {}",
            if let Some(name) = self.result_save_name.as_ref() {
                format!("{name}.{}", CrySymFileType::Sgd.ext())
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

/// A structure recording the trial of one candidate setting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateTrial {
    /// The Hall number of the candidate.
    pub hall_number: u32,

    /// The Hermann--Mauguin symbol of the candidate.
    pub hm_symbol: String,

    /// The number of operations of the candidate modulo lattice translations.
    pub order: usize,

    /// Boolean indicating if the candidate is a symmetry of the structure.
    pub is_match: bool,
}

/// A structure containing the space group found for a structure.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpaceGroupMatch {
    /// The Hall number of the matching setting.
    pub hall_number: u32,

    /// The number of the space group in the International Tables.
    pub space_group_number: u32,

    /// The Hall symbol of the matching setting.
    pub hall_symbol: String,

    /// The Hermann--Mauguin symbol of the matching setting.
    pub hm_symbol: String,

    /// The change of basis from the tabulated setting to the axes of the structure.
    pub setting_change: RotationalChangeOfBasis,

    /// The fractional position in the structure of the origin of the tabulated setting.
    pub origin_shift: Vector3<f64>,

    /// The operations of the matching setting in the axes of the structure, about the origin
    /// of the tabulated setting.
    pub operations: SymmetryOperationSet,

    /// The operations acting on the fractional coordinates of the structure, *i.e.*
    /// [`Self::operations`] with the origin moved to [`Self::origin_shift`].
    pub structure_operations: FloatingSymmetryOperationSet,

    /// The symmetrised structure. Every atom carries the index of its orbit.
    pub symmetrised_structure: PeriodicStructure,

    /// The indices of the orbit representatives in [`Self::symmetrised_structure`].
    pub asymmetric_atoms: Vec<usize>,
}

impl SpaceGroupMatch {
    /// Returns the exact change of basis from the tabulated setting to the structure, with its
    /// origin shift, if the origin shift is a whole number of twelfths within `threshold`.
    pub fn change_of_basis(&self, threshold: f64) -> Option<ChangeOfBasis> {
        let scaled = self.origin_shift * f64::from(TRANSLATION_DENOMINATOR);
        if scaled.iter().any(|x| (x - x.round()).abs() > threshold) {
            return None;
        }
        let mut shift = Vector3::<i32>::zeros();
        for (exact, x) in shift.iter_mut().zip(scaled.iter()) {
            *exact = x.round().to_i32()?.rem_euclid(TRANSLATION_DENOMINATOR);
        }
        Some(self.setting_change.to_rational().with_origin_shift(shift))
    }
}

/// A structure to contain space-group detection results.
#[derive(Clone, Builder, Debug, Serialize, Deserialize)]
pub struct SpaceGroupDetectionResult {
    /// The control parameters used to obtain this set of results.
    pub parameters: SpaceGroupDetectionParams,

    /// The trials of all candidates, in candidate order.
    pub trials: Vec<CandidateTrial>,

    /// The space group found, or `None` if no candidate matches.
    #[builder(default = "None")]
    pub space_group: Option<SpaceGroupMatch>,
}

impl CrySymFile for SpaceGroupDetectionResult {
    const FILE_TYPE: CrySymFileType = CrySymFileType::Sgd;
}

impl SpaceGroupDetectionResult {
    /// Returns a builder to construct a [`SpaceGroupDetectionResult`] structure.
    fn builder() -> SpaceGroupDetectionResultBuilder {
        SpaceGroupDetectionResultBuilder::default()
    }

    /// Writes the operations of the detected space group.
    fn write_operations(&self, f: &mut fmt::Formatter<'_>, sg: &SpaceGroupMatch) -> fmt::Result {
        write_subtitle(f, &format!("Operations of {}", sg.hm_symbol))?;
        writeln!(f)?;
        for (i, op) in sg.operations.iter().enumerate() {
            let kind = op
                .symmetry_type()
                .map(|kind| kind.to_string())
                .unwrap_or_else(|_| "?".to_string());
            writeln!(f, "{:>4}  {:<24} {kind}", i + 1, op.to_string())?;
        }
        writeln!(f)?;
        Ok(())
    }
}

impl fmt::Display for SpaceGroupDetectionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.space_group.as_ref() {
            Some(sg) => {
                writeln!(
                    f,
                    "Highest-order space group found: {} (No. {}, Hall #{}: {})",
                    sg.hm_symbol, sg.space_group_number, sg.hall_number, sg.hall_symbol
                )?;
                writeln!(
                    f,
                    "  Operations modulo lattice translations: {}",
                    sg.operations.len()
                )?;
                writeln!(f, "  Centring: {}", sg.operations.centring())?;
                writeln!(f, "  Setting change: {}", sg.setting_change.matrix())?;
                writeln!(
                    f,
                    "  Origin of the setting: [{:.7}, {:.7}, {:.7}]",
                    sg.origin_shift[0], sg.origin_shift[1], sg.origin_shift[2]
                )?;
                if let Some(cob) = sg.change_of_basis(self.parameters.symmetry_precision) {
                    writeln!(f, "  Change of basis: {cob}")?;
                }
                writeln!(f, "  Number of orbits: {}", sg.asymmetric_atoms.len())?;
                writeln!(f)?;
                writeln!(f, "Asymmetric atoms (symmetrised):")?;
                for &i in sg.asymmetric_atoms.iter() {
                    if let Some(atom) = sg.symmetrised_structure.atoms().get(i) {
                        writeln!(f, "  {i:>4}  {atom}")?;
                    }
                }
                writeln!(f)?;
                if self.parameters.write_operations {
                    self.write_operations(f, sg)?;
                }
            }
            None => {
                writeln!(
                    f,
                    "No space group among the {} candidate(s) matches the structure.",
                    self.trials.len()
                )?;
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

// ------
// Driver
// ------

/// A candidate setting aligned with the structure.
#[derive(Clone, Debug)]
struct CandidateAlignment {
    setting_change: RotationalChangeOfBasis,
    origin_shift: Vector3<f64>,
    operations: SymmetryOperationSet,
}

/// A driver for space-group detection.
#[derive(Clone, Builder)]
pub struct SpaceGroupDetectionDriver<'a> {
    /// The control parameters for space-group detection.
    parameters: &'a SpaceGroupDetectionParams,

    /// The structure whose space group is to be detected.
    structure: &'a PeriodicStructure,

    /// The table providing the candidate settings.
    table: &'a dyn SpaceGroupTable,

    /// The result of the space-group detection.
    #[builder(setter(skip), default = "None")]
    result: Option<SpaceGroupDetectionResult>,
}

impl<'a> SpaceGroupDetectionDriver<'a> {
    /// Returns a builder to construct a [`SpaceGroupDetectionDriver`] structure.
    pub fn builder() -> SpaceGroupDetectionDriverBuilder<'a> {
        SpaceGroupDetectionDriverBuilder::default()
    }

    /// Tries one candidate setting against the structure, in each alternative setting of its
    /// crystal system in turn, stopping at the first one for which an origin is found.
    fn try_candidate(
        &self,
        hall_number: u32,
    ) -> Result<(CandidateTrial, Option<CandidateAlignment>), anyhow::Error> {
        let setting = self.table.get(hall_number)?;
        let reference_operations = setting.full_operations()?;
        let tolerance = self.parameters.symmetry_precision;
        let mut alignment = None;
        for setting_change in setting.crystal_system()?.setting_changes()? {
            let operations = reference_operations.changed_basis(&setting_change)?;
            if let Some(origin_shift) = find_origin_shift(&operations, self.structure, tolerance)?
            {
                log::debug!(
                    "Candidate {setting} matches in setting {} with origin {origin_shift:?}.",
                    setting_change.matrix()
                );
                alignment = Some(CandidateAlignment {
                    setting_change,
                    origin_shift,
                    operations,
                });
                break;
            }
        }
        if alignment.is_none() {
            log::debug!("Candidate {setting} is not a symmetry of the structure.");
        }
        let trial = CandidateTrial {
            hall_number,
            hm_symbol: setting.hm_symbol.to_string(),
            order: reference_operations.len(),
            is_match: alignment.is_some(),
        };
        Ok((trial, alignment))
    }

    /// Executes space-group detection.
    fn detect_space_group(&mut self) -> Result<(), anyhow::Error> {
        log_title("Space-Group Detection");
        crysym_output!("");
        let params = self.parameters;
        params.log_output_display();

        crysym_output!("Structure for space-group detection:");
        self.structure.log_output_display();
        crysym_output!("");

        let candidates = params
            .candidate_hall_numbers
            .clone()
            .unwrap_or_else(|| self.table.hall_numbers());
        let tried = candidates
            .par_iter()
            .map(|&hall_number| self.try_candidate(hall_number))
            .collect::<Result<Vec<_>, _>>()?;

        log_subtitle("Candidate space groups");
        crysym_output!("");
        crysym_output!("{}", "┈".repeat(44));
        crysym_output!(
            "{:>6} {:>16} {:>10} {:>9}",
            "Hall",
            "H-M symbol",
            "Order",
            "Match"
        );
        crysym_output!("{}", "┈".repeat(44));
        for (trial, _) in tried.iter() {
            crysym_output!(
                "{:>6} {:>16} {:>10} {:>9}",
                trial.hall_number,
                trial.hm_symbol,
                trial.order,
                nice_bool(trial.is_match)
            );
        }
        crysym_output!("{}", "┈".repeat(44));
        crysym_output!("(Orders are counted modulo lattice translations of the conventional cell.)");
        crysym_output!("");

        let best = tried
            .iter()
            .filter_map(|(trial, alignment)| alignment.as_ref().map(|aligned| (trial, aligned)))
            .max_by_key(|(trial, _)| (trial.order, Reverse(trial.hall_number)));

        let space_group = match best {
            Some((trial, alignment)) => {
                let setting = self.table.get(trial.hall_number)?;
                let structure_operations = alignment
                    .operations
                    .to_floating()
                    .with_origin_at(&alignment.origin_shift)?;
                let mut symmetrised_structure = self.structure.clone();
                let asymmetric_atoms = {
                    let (lattice, atoms) = symmetrised_structure.split_mut();
                    symmetrise_atoms(
                        &structure_operations,
                        lattice,
                        atoms,
                        params.symmetry_precision,
                    )?
                };
                Some(SpaceGroupMatch {
                    hall_number: setting.hall_number,
                    space_group_number: setting.space_group_number,
                    hall_symbol: setting.hall_symbol.to_string(),
                    hm_symbol: setting.hm_symbol.to_string(),
                    setting_change: alignment.setting_change,
                    origin_shift: alignment.origin_shift,
                    operations: alignment.operations.clone(),
                    structure_operations,
                    symmetrised_structure,
                    asymmetric_atoms,
                })
            }
            None => {
                crysym_warn!("No candidate space group matches the structure.");
                None
            }
        };

        let result = SpaceGroupDetectionResult::builder()
            .parameters(params.clone())
            .trials(tried.into_iter().map(|(trial, _)| trial).collect())
            .space_group(space_group)
            .build()
            .map_err(|err| format_err!(err))?;
        result.log_output_display();

        // Save space-group detection result, if requested
        if let Some(name) = params.result_save_name.as_ref() {
            result.save(name)?;
            crysym_output!(
                "Space-group detection results saved as {name}.{}.",
                CrySymFileType::Sgd.ext()
            );
            crysym_output!("");
        }
        self.result = Some(result);

        Ok(())
    }
}

impl CrySymDriver for SpaceGroupDetectionDriver<'_> {
    type Params = SpaceGroupDetectionParams;

    type Outcome = SpaceGroupDetectionResult;

    fn result(&self) -> Result<&Self::Outcome, anyhow::Error> {
        self.result
            .as_ref()
            .ok_or_else(|| format_err!("No space-group detection results found."))
    }

    fn run(&mut self) -> Result<(), anyhow::Error> {
        self.detect_space_group()
    }
}
