//! Space-group operations, their sets, and changes of setting.

pub mod centring;
pub mod change_of_basis;
pub mod floating_operation_set;
pub mod floating_seitz_operator;
pub mod operation_set;
pub mod orbit;
pub mod origin_shift;
pub mod rotation_matrix;
pub mod seitz_operator;
