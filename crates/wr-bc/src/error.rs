//! Boundary-condition resolution errors.

use thiserror::Error;

use crate::{FieldKind, PatchRole};

pub type BcResult<T> = Result<T, BcError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BcError {
    #[error("Wind direction {degrees} is outside 0-360 degrees")]
    InvalidDirection { degrees: f64 },

    #[error("Boundary condition for role '{role}' is not implemented for field {field}")]
    UnhandledBoundaryCondition { field: FieldKind, role: PatchRole },

    #[error("Unknown patch name: {name}")]
    UnknownPatch { name: String },

    #[error("Unknown patch role: {name}")]
    UnknownRole { name: String },
}
