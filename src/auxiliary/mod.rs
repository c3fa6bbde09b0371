//! Helper items describing the periodic structures that symmetry operations act on.

pub mod atom;
pub mod lattice;
pub mod structure;
