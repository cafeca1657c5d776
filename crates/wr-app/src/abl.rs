//! Atmospheric boundary layer inlet parameters.

use std::path::Path;

use tracing::{Span, debug, warn};
use wr_bc::flow_direction_vector;
use wr_core::{Angle, WindSpeed, to_mps};
use wr_dict::DictionaryFile;

use crate::AppResult;

/// Set `Uref`, `flowDir` and `z0` in an `ABLConditions` dictionary.
///
/// Does nothing when the file does not exist; keys missing from the file
/// are skipped with a warning.
pub fn update_abl_conditions(
    path: &Path,
    speed: WindSpeed,
    direction: Angle,
    z0: f64,
    span: &Span,
) -> AppResult<bool> {
    if !path.is_file() {
        debug!(parent: span, file = %path.display(), "no ABL conditions to update");
        return Ok(false);
    }
    let mut dict = DictionaryFile::open(path)?;
    let values = [
        ("Uref", format!("{:.6}", to_mps(speed))),
        ("flowDir", flow_direction_vector(direction)),
        ("z0", format!("uniform {z0:.6}")),
    ];
    for (key, value) in values {
        if dict.get(key)?.is_none() {
            warn!(parent: span, key, file = %path.display(), "ABL parameter not found");
            continue;
        }
        dict.set(key, &value)?;
    }
    Ok(true)
}
