//! wr-case: ownership of one case directory.
//!
//! [`CaseHandler`] enumerates and prunes time directories, keeps a backup of
//! the initial fields and rewrites patch boundary conditions for a new wind
//! direction. [`CaseLock`] keeps two sweeps off the same case.

pub mod boundary;
pub mod case;
pub mod error;
pub mod fs_util;
pub mod lock;

pub use case::{BACKUP_DIR_NAME, CaseHandler, TimeDir, is_field_artifact};
pub use error::{CaseError, CaseResult};
pub use lock::CaseLock;
