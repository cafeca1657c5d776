//! wr-bc: wind direction to boundary-condition resolution.
//!
//! The chain is angle -> [`Octant`] -> [`PatchRole`] per [`Patch`] ->
//! boundary-condition text for a [`FieldKind`].

pub mod direction;
pub mod error;
pub mod field;
pub mod role;
pub mod templates;

pub use direction::{Octant, flow_direction_vector};
pub use error::{BcError, BcResult};
pub use field::FieldKind;
pub use role::{Patch, PatchRole, role_for};
pub use templates::{BoundaryTemplates, DEFAULT_CONDITION, SYMMETRY_CONDITION};
