//! # crysym: Exact Space-Group Symmetry of Periodic Structures
//!
//! `crysym` is a library and program for the symmetry analysis of crystal structures written in
//! Rust with the following capabilities:
//! - exact integer Seitz operators and their compact character encoding,
//! - closure of generator sets and completion with centring translations,
//! - rational, integer, and rotational changes of basis between lattice settings,
//! - floating-point operation sets for the comparison of noisy operators,
//! - orbits, site stabilisers, and asymmetric units of atomic positions, and
//! - space-group detection and crystal symmetrisation against a table of Hall settings.
//!
//! ## Layout
//!
//! - [`symmetry`] holds the operators and operation sets together with the orbit machinery.
//! - [`spacegroup`] holds the Hall-setting table that maps a Hall number to its generators.
//! - [`auxiliary`] holds atoms, lattice metrics, and periodic structures.
//! - [`drivers`] holds the space-group detection and crystal symmetrisation drivers.
//! - [`interfaces`] holds the YAML input and the command-line interface of the `crysym` binary.
//! - [`io`] holds the reading and writing of `crysym` YAML and binary files.
//!
//! ## Examples and usage
//!
//! For most items (structs, enums, functions, and traits), their usages are illustrated in test
//! functions. The `crysym` binary reads a YAML input file:
//!
//! ```yaml
//! structure:
//!   cell_parameters: {a: 3.61, b: 3.61, c: 3.61, alpha: 90.0, beta: 90.0, gamma: 90.0}
//!   atoms:
//!     - Cu 0.0 0.0 0.0
//!     - Cu 0.5 0.5 0.0
//!     - Cu 0.5 0.0 0.5
//!     - Cu 0.0 0.5 0.5
//! space_group_detection: !Parameters
//!   symmetry_precision: 1.0e-5
//! crystal_symmetrisation:
//!   hall_number: 523
//! ```
//!
//! and is run as `crysym --config input.yml --output output.out`.

pub mod auxiliary;
pub mod drivers;
pub mod interfaces;
pub mod io;
pub mod spacegroup;
pub mod symmetry;
