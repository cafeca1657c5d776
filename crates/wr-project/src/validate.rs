//! Run specification validation.
//!
//! Everything that can be checked without touching the case is checked
//! here, so a bad specification fails before any external process runs.

use std::collections::HashSet;

use wr_bc::Octant;

use crate::schema::RunSpec;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("No values given for {field}")]
    Empty { field: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Duplicate value in {field}: {value}")]
    Duplicate { field: String, value: String },

    #[error("{field} has {found} values, expected 1 or {expected}")]
    LengthMismatch {
        field: String,
        expected: usize,
        found: usize,
    },
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn non_empty<T>(field: &str, values: &[T]) -> Result<(), ValidationError> {
    if values.is_empty() {
        return Err(ValidationError::Empty {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn unique(field: &str, values: &[f64]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for v in values {
        if !seen.insert(v.to_bits()) {
            return Err(ValidationError::Duplicate {
                field: field.to_string(),
                value: v.to_string(),
            });
        }
    }
    Ok(())
}

pub fn validate_spec(spec: &RunSpec) -> Result<(), ValidationError> {
    non_empty("wspeeds", &spec.wspeeds)?;
    for &speed in &spec.wspeeds {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(invalid("wspeeds", speed, "must be a positive number"));
        }
    }
    unique("wspeeds", &spec.wspeeds)?;

    non_empty("wdirs", &spec.wdirs)?;
    for &dir in &spec.wdirs {
        if Octant::from_degrees(dir).is_err() {
            return Err(invalid("wdirs", dir, "must be within [0, 360] degrees"));
        }
    }
    unique("wdirs", &spec.wdirs)?;

    non_empty("z0", &spec.z0)?;
    if spec.z0.len() != 1 && spec.z0.len() != spec.wdirs.len() {
        return Err(ValidationError::LengthMismatch {
            field: "z0".to_string(),
            expected: spec.wdirs.len(),
            found: spec.z0.len(),
        });
    }
    for &z0 in &spec.z0 {
        if !z0.is_finite() || z0 <= 0.0 {
            return Err(invalid("z0", z0, "roughness length must be positive"));
        }
    }

    if spec.iterations == 0 {
        return Err(invalid("iterations", 0, "must be at least 1"));
    }
    if spec.solver.trim().is_empty() {
        return Err(invalid("solver", "", "solver name is empty"));
    }
    if spec.flow_archive_dir_name.trim().is_empty() || spec.flow_archive_dir_name.contains('/') {
        return Err(invalid(
            "flow_archive_dir_name",
            &spec.flow_archive_dir_name,
            "must be a plain directory name",
        ));
    }
    non_empty("fields_to_archive", &spec.fields_to_archive)?;

    if spec.processes() == 0 {
        return Err(invalid("cpus", 0, "at least one process is needed"));
    }

    for def in &spec.boundary_templates {
        if def.field.trim().is_empty() {
            return Err(invalid("boundary_templates.field", "", "field name is empty"));
        }
        if !def.text.trim_start().starts_with("type") {
            return Err(invalid(
                "boundary_templates.text",
                &def.text,
                "condition must start with a type entry",
            ));
        }
    }

    Ok(())
}
