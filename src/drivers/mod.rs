//! Drivers for space-group detection and crystal symmetrisation.
//!
//! A driver is constructed from a parameter structure and its inputs through a builder, is
//! executed with [`CrySymDriver::run`], and keeps its outcome for retrieval with
//! [`CrySymDriver::result`].

use anyhow;

pub mod crystal_symmetrisation;
pub mod space_group_detection;

// =================
// Trait definitions
// =================

/// Trait defining behaviours of `crysym` drivers.
pub trait CrySymDriver {
    /// The type of the parameter structure controlling the driver.
    type Params;

    /// The type of the successful outcome when executing the driver.
    type Outcome;

    /// Executes the driver and stores the result internally.
    fn run(&mut self) -> Result<(), anyhow::Error>;

    /// Returns the result of the driver execution.
    fn result(&self) -> Result<&Self::Outcome, anyhow::Error>;
}
