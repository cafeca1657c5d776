//! Run specification schema.

use serde::{Deserialize, Serialize};
use wr_bc::{BoundaryTemplates, FieldKind, PatchRole};

/// Processes per node when only `nodes` is given.
pub const CPUS_PER_NODE: usize = 16;

pub const DEFAULT_SOLVER: &str = "windFoam";
pub const DEFAULT_INIT_COMMAND: &str = "setLanduse";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSpec {
    /// Wind speeds in m/s (outer loop).
    pub wspeeds: Vec<f64>,
    /// Wind directions in degrees, meteorological convention (inner loop).
    pub wdirs: Vec<f64>,
    /// Inlet roughness length, one value or one per direction.
    pub z0: Vec<f64>,
    pub iterations: usize,
    #[serde(default = "default_solver")]
    pub solver: String,
    #[serde(default = "default_initialize")]
    pub initialize: Vec<String>,
    pub flow_archive_dir_name: String,
    pub fields_to_archive: Vec<String>,
    #[serde(default)]
    pub restore_archived: bool,
    #[serde(default)]
    pub reuse_archive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpus: Option<usize>,
    #[serde(default)]
    pub compress: bool,
    #[serde(default)]
    pub continue_on_failure: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub boundary_templates: Vec<TemplateDef>,
}

/// Boundary condition for one field on patches playing one role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemplateDef {
    pub field: String,
    pub role: PatchRole,
    pub text: String,
}

fn default_solver() -> String {
    DEFAULT_SOLVER.to_string()
}

fn default_initialize() -> Vec<String> {
    vec![DEFAULT_INIT_COMMAND.to_string()]
}

impl RunSpec {
    /// Number of solver processes: `cpus`, else `nodes` full nodes, else 1.
    pub fn processes(&self) -> usize {
        match (self.cpus, self.nodes) {
            (Some(cpus), _) => cpus,
            (None, Some(nodes)) => nodes * CPUS_PER_NODE,
            (None, None) => 1,
        }
    }

    pub fn is_parallel(&self) -> bool {
        self.processes() > 1
    }

    /// Roughness length for the direction at `dir_index`.
    pub fn z0_for(&self, dir_index: usize) -> Option<f64> {
        match self.z0.as_slice() {
            [single] => Some(*single),
            many => many.get(dir_index).copied(),
        }
    }

    pub fn total_runs(&self) -> usize {
        self.wspeeds.len() * self.wdirs.len()
    }

    /// Register the extra boundary templates on top of `templates`.
    pub fn apply_templates(&self, templates: &mut BoundaryTemplates) {
        for def in &self.boundary_templates {
            templates.insert(FieldKind::from_field_name(&def.field), def.role, def.text.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> RunSpec {
        serde_yaml::from_str(
            "wspeeds: [3.0]\n\
             wdirs: [0, 90]\n\
             z0: [0.1]\n\
             iterations: 5\n\
             flow_archive_dir_name: flowArchive\n\
             fields_to_archive: [U, p]\n",
        )
        .unwrap()
    }

    #[test]
    fn yaml_defaults() {
        let spec = spec();
        assert_eq!(spec.solver, "windFoam");
        assert_eq!(spec.initialize, vec!["setLanduse"]);
        assert!(!spec.reuse_archive);
        assert_eq!(spec.processes(), 1);
        assert_eq!(spec.total_runs(), 2);
    }

    #[test]
    fn processes_from_nodes_or_cpus() {
        let mut spec = spec();
        spec.nodes = Some(2);
        assert_eq!(spec.processes(), 32);
        spec.cpus = Some(8);
        assert_eq!(spec.processes(), 8);
        assert!(spec.is_parallel());
    }

    #[test]
    fn single_z0_applies_to_every_direction() {
        let mut spec = spec();
        assert_eq!(spec.z0_for(1), Some(0.1));
        spec.z0 = vec![0.1, 0.3];
        assert_eq!(spec.z0_for(1), Some(0.3));
        assert_eq!(spec.z0_for(2), None);
    }

    #[test]
    fn extra_templates_make_fields_known() {
        let mut spec = spec();
        spec.boundary_templates = serde_yaml::from_str(
            "- field: T\n  role: inlet\n  text: \"type fixedValue;\\nvalue uniform 288;\"\n",
        )
        .unwrap();
        let mut templates = BoundaryTemplates::default();
        spec.apply_templates(&mut templates);
        let kind = FieldKind::from_field_name("T");
        assert!(templates.is_known(&kind));
        assert_eq!(
            templates.condition_for(&kind, PatchRole::Inlet).unwrap(),
            "type fixedValue;\nvalue uniform 288;"
        );
    }
}
