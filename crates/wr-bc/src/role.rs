//! Patch roles per octant.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{BcError, Octant};

/// The four lateral boundary patches of a wind domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Patch {
    North,
    East,
    South,
    West,
}

impl Patch {
    pub const ALL: [Patch; 4] = [Patch::North, Patch::East, Patch::South, Patch::West];

    /// Patch name as it appears in the field files.
    pub fn name(self) -> &'static str {
        match self {
            Patch::North => "north",
            Patch::East => "east",
            Patch::South => "south",
            Patch::West => "west",
        }
    }
}

impl fmt::Display for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Patch {
    type Err = BcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Patch::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| BcError::UnknownPatch {
                name: s.to_string(),
            })
    }
}

/// Physical role a patch plays for the current wind direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PatchRole {
    Inlet,
    Outlet,
    Side,
    Wall,
    SymmetryPlane,
}

impl PatchRole {
    pub fn name(self) -> &'static str {
        match self {
            PatchRole::Inlet => "inlet",
            PatchRole::Outlet => "outlet",
            PatchRole::Side => "side",
            PatchRole::Wall => "wall",
            PatchRole::SymmetryPlane => "symmetryPlane",
        }
    }
}

impl fmt::Display for PatchRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PatchRole {
    type Err = BcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inlet" => Ok(PatchRole::Inlet),
            "outlet" => Ok(PatchRole::Outlet),
            "side" => Ok(PatchRole::Side),
            "wall" => Ok(PatchRole::Wall),
            "symmetryPlane" => Ok(PatchRole::SymmetryPlane),
            other => Err(BcError::UnknownRole {
                name: other.to_string(),
            }),
        }
    }
}

/// Role of `patch` when the wind comes from `octant`.
///
/// Windward patches are inlets, leeward patches outlets, and patches
/// parallel to a cardinal wind are sides.
pub fn role_for(octant: Octant, patch: Patch) -> PatchRole {
    use Patch::*;
    use PatchRole::*;

    match (octant, patch) {
        (Octant::N, North) => Inlet,
        (Octant::N, East) => Side,
        (Octant::N, South) => Outlet,
        (Octant::N, West) => Side,

        (Octant::NE, North) => Inlet,
        (Octant::NE, East) => Inlet,
        (Octant::NE, South) => Outlet,
        (Octant::NE, West) => Outlet,

        (Octant::E, North) => Side,
        (Octant::E, East) => Inlet,
        (Octant::E, South) => Side,
        (Octant::E, West) => Outlet,

        (Octant::SE, North) => Outlet,
        (Octant::SE, East) => Inlet,
        (Octant::SE, South) => Inlet,
        (Octant::SE, West) => Outlet,

        (Octant::S, North) => Outlet,
        (Octant::S, East) => Side,
        (Octant::S, South) => Inlet,
        (Octant::S, West) => Side,

        (Octant::SW, North) => Outlet,
        (Octant::SW, East) => Outlet,
        (Octant::SW, South) => Inlet,
        (Octant::SW, West) => Inlet,

        (Octant::W, North) => Side,
        (Octant::W, East) => Outlet,
        (Octant::W, South) => Side,
        (Octant::W, West) => Inlet,

        (Octant::NW, North) => Inlet,
        (Octant::NW, East) => Outlet,
        (Octant::NW, South) => Outlet,
        (Octant::NW, West) => Inlet,
    }
}
