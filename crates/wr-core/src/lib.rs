//! wr-core: small shared foundation for windrunner.
//!
//! Contains:
//! - units (uom SI types for wind speed and direction)
//! - numeric (time-label and sweep-label helpers)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod units;

pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use units::*;
