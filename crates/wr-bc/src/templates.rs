//! Boundary-condition text per (field kind, patch role).
//!
//! Template bodies are stored unindented, one dictionary entry per line;
//! the case layer indents them when it writes a patch block.

use std::collections::HashMap;

use tracing::{Span, warn};

use crate::{BcError, BcResult, FieldKind, PatchRole};

/// Condition used for fields without templates.
pub const DEFAULT_CONDITION: &str = "type            zeroGradient;";

/// Condition for symmetry planes, whatever the field.
pub const SYMMETRY_CONDITION: &str = "type            symmetryPlane;";

const ABL_INCLUDE: &str = "#include        \"include/ABLConditions\"";

#[derive(Debug, Clone)]
pub struct BoundaryTemplates {
    entries: HashMap<FieldKind, HashMap<PatchRole, String>>,
    span: Span,
}

impl Default for BoundaryTemplates {
    fn default() -> Self {
        Self::new(Span::none())
    }
}

impl BoundaryTemplates {
    /// Templates for the standard wind fields (`U`, `p`, `k`, `epsilon`,
    /// `nut`) and `spec_*` scalars.
    pub fn new(span: Span) -> Self {
        let mut templates = Self::empty(span);
        for (kind, role, text) in default_entries() {
            templates.insert(kind, role, text);
        }
        templates
    }

    pub fn empty(span: Span) -> Self {
        Self {
            entries: HashMap::new(),
            span,
        }
    }

    /// Register (or replace) the template for one field and role.
    pub fn insert(&mut self, kind: FieldKind, role: PatchRole, text: impl Into<String>) {
        self.entries
            .entry(kind)
            .or_default()
            .insert(role, text.into());
    }

    pub fn is_known(&self, kind: &FieldKind) -> bool {
        self.entries.contains_key(kind)
    }

    /// Condition text for `kind` on a patch playing `role`.
    ///
    /// Unknown fields fall back to [`DEFAULT_CONDITION`] with a warning. A
    /// known field without a template for `role` is an error.
    pub fn condition_for(&self, kind: &FieldKind, role: PatchRole) -> BcResult<&str> {
        if role == PatchRole::SymmetryPlane {
            return Ok(SYMMETRY_CONDITION);
        }

        let Some(by_role) = self.entries.get(kind) else {
            warn!(
                parent: &self.span,
                field = %kind,
                "no boundary-condition rules for field, using zeroGradient"
            );
            return Ok(DEFAULT_CONDITION);
        };

        by_role
            .get(&role)
            .map(String::as_str)
            .ok_or_else(|| BcError::UnhandledBoundaryCondition {
                field: kind.clone(),
                role,
            })
    }
}

fn default_entries() -> Vec<(FieldKind, PatchRole, String)> {
    use FieldKind::*;
    use PatchRole::*;

    let zero_gradient = DEFAULT_CONDITION.to_string();
    vec![
        (
            Velocity,
            Wall,
            "type            uniformFixedValue;\n\
             uniformValue    (0 0 0);\n\
             value           uniform (0 0 0);"
                .to_string(),
        ),
        (
            Velocity,
            Inlet,
            format!("type            atmBoundaryLayerInletVelocity;\n{ABL_INCLUDE}"),
        ),
        (
            Velocity,
            Outlet,
            "type            inletOutlet;\n\
             inletValue      uniform (0 0 0);\n\
             value           $internalField;"
                .to_string(),
        ),
        (Velocity, Side, zero_gradient.clone()),
        (Pressure, Wall, zero_gradient.clone()),
        (Pressure, Inlet, zero_gradient.clone()),
        (
            Pressure,
            Outlet,
            "type            uniformFixedValue;\n\
             uniformValue    constant $pressure;"
                .to_string(),
        ),
        (Pressure, Side, zero_gradient.clone()),
        (
            Dissipation,
            Wall,
            "type            epsilonWallFunction;\n\
             Cmu             0.09;\n\
             kappa           0.4;\n\
             E               9.8;\n\
             value           $internalField;"
                .to_string(),
        ),
        (
            Dissipation,
            Inlet,
            format!("type            atmBoundaryLayerInletEpsilon;\n{ABL_INCLUDE}"),
        ),
        (
            Dissipation,
            Outlet,
            "type            inletOutlet;\n\
             inletValue      uniform $turbulentEpsilon;\n\
             value           $internalField;"
                .to_string(),
        ),
        (Dissipation, Side, zero_gradient.clone()),
        (
            TurbulentKineticEnergy,
            Wall,
            "type            kqRWallFunction;\n\
             value           uniform 0.0;"
                .to_string(),
        ),
        (
            TurbulentKineticEnergy,
            Inlet,
            format!("type            atmBoundaryLayerInletK;\n{ABL_INCLUDE}"),
        ),
        (
            TurbulentKineticEnergy,
            Outlet,
            "type            inletOutlet;\n\
             inletValue      uniform $turbulentKE;\n\
             value           $internalField;"
                .to_string(),
        ),
        (TurbulentKineticEnergy, Side, zero_gradient.clone()),
        (
            TurbulentViscosity,
            Wall,
            "type            nutkAtmRoughWallFunction;\n\
             z0              uniform 0.001;\n\
             value           uniform 0.0;"
                .to_string(),
        ),
        (
            TurbulentViscosity,
            Inlet,
            "type            calculated;\n\
             value           uniform 0;"
                .to_string(),
        ),
        (
            TurbulentViscosity,
            Outlet,
            "type            calculated;\n\
             value           uniform 0;"
                .to_string(),
        ),
        (TurbulentViscosity, Side, zero_gradient.clone()),
        (Scalar, Wall, zero_gradient.clone()),
        (
            Scalar,
            Inlet,
            "type            fixedValue;\n\
             value           uniform 0;"
                .to_string(),
        ),
        (
            Scalar,
            Outlet,
            "type            inletOutlet;\n\
             inletValue      uniform 0;\n\
             value           $internalField;"
                .to_string(),
        ),
        (Scalar, Side, zero_gradient),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_fields_cover_all_lateral_roles() {
        let templates = BoundaryTemplates::default();
        let kinds = [
            FieldKind::Velocity,
            FieldKind::Pressure,
            FieldKind::TurbulentKineticEnergy,
            FieldKind::Dissipation,
            FieldKind::TurbulentViscosity,
            FieldKind::Scalar,
        ];
        for kind in kinds {
            for role in [PatchRole::Inlet, PatchRole::Outlet, PatchRole::Side, PatchRole::Wall] {
                let text = templates.condition_for(&kind, role).unwrap();
                assert!(text.starts_with("type"), "{kind} {role}: {text}");
                assert!(text.ends_with(';') || text.ends_with('"'), "{kind} {role}");
            }
        }
    }

    #[test]
    fn continuation_lines_are_unindented() {
        let templates = BoundaryTemplates::default();
        let text = templates
            .condition_for(&FieldKind::Velocity, PatchRole::Outlet)
            .unwrap();
        assert_eq!(
            text,
            "type            inletOutlet;\ninletValue      uniform (0 0 0);\nvalue           $internalField;"
        );
    }

    #[test]
    fn symmetry_plane_short_circuits() {
        let templates = BoundaryTemplates::empty(Span::none());
        let text = templates
            .condition_for(&FieldKind::Other("T".into()), PatchRole::SymmetryPlane)
            .unwrap();
        assert_eq!(text, SYMMETRY_CONDITION);
    }

    #[test]
    fn unknown_field_gets_default() {
        let templates = BoundaryTemplates::default();
        let text = templates
            .condition_for(&FieldKind::Other("alphat".into()), PatchRole::Inlet)
            .unwrap();
        assert_eq!(text, DEFAULT_CONDITION);
    }

    #[test]
    fn known_field_with_missing_role_fails() {
        let mut templates = BoundaryTemplates::default();
        let kind = FieldKind::Other("T".into());
        templates.insert(kind.clone(), PatchRole::Inlet, "type fixedValue;\nvalue uniform 288;");

        assert!(templates.is_known(&kind));
        assert!(templates.condition_for(&kind, PatchRole::Inlet).is_ok());
        assert_eq!(
            templates.condition_for(&kind, PatchRole::Outlet),
            Err(BcError::UnhandledBoundaryCondition {
                field: kind,
                role: PatchRole::Outlet,
            })
        );
    }
}
