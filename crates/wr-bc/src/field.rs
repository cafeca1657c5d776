//! Field identity, resolved once from the file name.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix marking species/passive-scalar fields (`spec_NOx`, `spec_PM10`).
pub const SCALAR_PREFIX: &str = "spec_";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Velocity,
    Pressure,
    TurbulentKineticEnergy,
    Dissipation,
    TurbulentViscosity,
    /// Any `spec_*` field, sharing one template family.
    Scalar,
    /// Anything else, keyed by its file name.
    Other(String),
}

impl FieldKind {
    /// Classify a field by its logical file name (no `.gz`).
    pub fn from_field_name(name: &str) -> Self {
        match name {
            "U" => FieldKind::Velocity,
            "p" => FieldKind::Pressure,
            "k" => FieldKind::TurbulentKineticEnergy,
            "epsilon" => FieldKind::Dissipation,
            "nut" => FieldKind::TurbulentViscosity,
            n if n.contains(SCALAR_PREFIX) => FieldKind::Scalar,
            n => FieldKind::Other(n.to_string()),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Velocity => f.write_str("U"),
            FieldKind::Pressure => f.write_str("p"),
            FieldKind::TurbulentKineticEnergy => f.write_str("k"),
            FieldKind::Dissipation => f.write_str("epsilon"),
            FieldKind::TurbulentViscosity => f.write_str("nut"),
            FieldKind::Scalar => f.write_str("scalar"),
            FieldKind::Other(name) => f.write_str(name),
        }
    }
}
