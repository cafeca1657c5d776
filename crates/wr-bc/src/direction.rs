//! Wind direction octants.

use std::fmt;

use serde::{Deserialize, Serialize};
use wr_core::{Angle, to_radians};

use crate::{BcError, BcResult};

/// One of the 8 compass buckets a wind direction falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Octant {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Octant {
    pub const ALL: [Octant; 8] = [
        Octant::N,
        Octant::NE,
        Octant::E,
        Octant::SE,
        Octant::S,
        Octant::SW,
        Octant::W,
        Octant::NW,
    ];

    /// Map a direction in degrees to its octant.
    ///
    /// Exactly 0/360, 90, 180 and 270 are the cardinal octants; everything
    /// strictly between two cardinals is the intercardinal between them.
    /// Values outside [0, 360] (and NaN) are rejected.
    pub fn from_degrees(degrees: f64) -> BcResult<Self> {
        if !(0.0..=360.0).contains(&degrees) {
            return Err(BcError::InvalidDirection { degrees });
        }
        let octant = if degrees == 0.0 || degrees == 360.0 {
            Octant::N
        } else if degrees < 90.0 {
            Octant::NE
        } else if degrees == 90.0 {
            Octant::E
        } else if degrees < 180.0 {
            Octant::SE
        } else if degrees == 180.0 {
            Octant::S
        } else if degrees < 270.0 {
            Octant::SW
        } else if degrees == 270.0 {
            Octant::W
        } else {
            Octant::NW
        };
        Ok(octant)
    }

    pub fn label(self) -> &'static str {
        match self {
            Octant::N => "N",
            Octant::NE => "NE",
            Octant::E => "E",
            Octant::SE => "SE",
            Octant::S => "S",
            Octant::SW => "SW",
            Octant::W => "W",
            Octant::NW => "NW",
        }
    }
}

impl fmt::Display for Octant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Unit vector the wind blows towards, as an OpenFOAM vector literal.
///
/// `direction` is where the wind comes from (0 = from north), so a
/// northerly wind gives `(0.000000 -1.000000 0)`.
pub fn flow_direction_vector(direction: Angle) -> String {
    let theta = std::f64::consts::FRAC_PI_2 - to_radians(direction);
    let x = clean(-theta.cos());
    let y = clean(-theta.sin());
    format!("({x:.6} {y:.6} 0)")
}

// round to the printed precision so tiny negatives do not print as -0.000000
fn clean(v: f64) -> f64 {
    (v * 1e6).round() / 1e6 + 0.0
}
