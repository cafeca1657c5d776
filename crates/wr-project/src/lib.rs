//! wr-project: run specification format, loading and validation.
//!
//! A sweep is described either by a legacy `key: value` control file or by
//! a YAML document with the same fields. Both load into [`RunSpec`] and are
//! validated before anything touches the case.

pub mod control;
pub mod schema;
pub mod template;
pub mod validate;

use std::path::Path;

pub use control::from_control_file;
pub use schema::*;
pub use template::{DEFAULT_CONTROL_FILE, write_template};
pub use validate::{ValidationError, validate_spec};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Control file error: {0}")]
    ControlFile(#[from] wr_dict::DictError),

    #[error("{path} already exists (use --force to overwrite)")]
    TemplateExists { path: std::path::PathBuf },
}

pub fn load_yaml(path: &Path) -> ProjectResult<RunSpec> {
    let content = std::fs::read_to_string(path)?;
    let spec: RunSpec = serde_yaml::from_str(&content)?;
    validate_spec(&spec)?;
    Ok(spec)
}

pub fn save_yaml(path: &Path, spec: &RunSpec) -> ProjectResult<()> {
    validate_spec(spec)?;
    let content = serde_yaml::to_string(spec)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_control_file(path: &Path) -> ProjectResult<RunSpec> {
    let cf = wr_dict::ControlFile::open(path)?;
    let spec = from_control_file(&cf)?;
    validate_spec(&spec)?;
    Ok(spec)
}

/// Load a run specification, picking the format from the extension
/// (`.yaml`/`.yml` is YAML, anything else a control file).
pub fn load_spec(path: &Path) -> ProjectResult<RunSpec> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => load_yaml(path),
        _ => load_control_file(path),
    }
}
