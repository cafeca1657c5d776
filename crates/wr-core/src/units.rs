// wr-core/src/units.rs

use uom::si::f64::{Angle as UomAngle, Velocity as UomVelocity};
use uom::si::{angle, velocity};

// Public canonical unit types (SI, f64)
pub type WindSpeed = UomVelocity;
pub type Angle = UomAngle;

#[inline]
pub fn mps(v: f64) -> WindSpeed {
    WindSpeed::new::<velocity::meter_per_second>(v)
}

#[inline]
pub fn deg(v: f64) -> Angle {
    Angle::new::<angle::degree>(v)
}

#[inline]
pub fn to_mps(v: WindSpeed) -> f64 {
    v.get::<velocity::meter_per_second>()
}

#[inline]
pub fn to_radians(a: Angle) -> f64 {
    a.get::<angle::radian>()
}

#[inline]
pub fn to_degrees(a: Angle) -> f64 {
    a.get::<angle::degree>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angle_conversions() {
        let a = deg(180.0);
        assert!((to_radians(a) - std::f64::consts::PI).abs() < 1e-12);
        assert!((to_degrees(a) - 180.0).abs() < 1e-12);
    }

    #[test]
    fn speed_round_trip() {
        assert!((to_mps(mps(3.5)) - 3.5).abs() < 1e-12);
    }
}
