// bf-core/src/units.rs

use uom::si::f64::{
    Frequency as UomFrequency, Length as UomLength, Ratio as UomRatio, Time as UomTime,
    Velocity as UomVelocity,
};

// Public canonical unit types (SI, f64)
pub type Frequency = UomFrequency;
pub type Length = UomLength;
pub type Ratio = UomRatio;
pub type Time = UomTime;
pub type Velocity = UomVelocity;

#[inline]
pub fn hz(v: f64) -> Frequency {
    use uom::si::frequency::hertz;
    Frequency::new::<hertz>(v)
}

#[inline]
pub fn m(v: f64) -> Length {
    use uom::si::length::meter;
    Length::new::<meter>(v)
}

#[inline]
pub fn mps(v: f64) -> Velocity {
    use uom::si::velocity::meter_per_second;
    Velocity::new::<meter_per_second>(v)
}

#[inline]
pub fn s(v: f64) -> Time {
    use uom::si::time::second;
    Time::new::<second>(v)
}

#[inline]
pub fn unitless(v: f64) -> Ratio {
    use uom::si::ratio::ratio;
    Ratio::new::<ratio>(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uom::si::frequency::hertz;
    use uom::si::length::meter;
    use uom::si::velocity::meter_per_second;

    #[test]
    fn wavelength_from_speed_and_frequency() {
        let c = mps(346.04);
        let f = hz(4000.0);
        let lambda: Length = c / f;
        assert!((lambda.get::<meter>() - 0.08651).abs() < 1e-5);
    }

    #[test]
    fn constructors_round_trip() {
        assert_eq!(hz(1024.0).get::<hertz>(), 1024.0);
        assert_eq!(mps(346.04).get::<meter_per_second>(), 346.04);
    }
}
