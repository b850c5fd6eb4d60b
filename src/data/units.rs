use crate::scaled_number::{ScaledNumber, ScaledNumberExt};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::{
    fmt::{Display, Write},
    str::FromStr,
};

macro_rules! decl_unit {
    ($name:ident, $unit:literal, $err:literal) => {
        #[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, SerializeDisplay, DeserializeFromStr)]
        pub struct $name(pub f64);

        impl FromStr for $name {
            type Err = &'static str;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim().strip_suffix($unit).ok_or($err)?;
                Ok(Self(f64::parse_scaled(s).ok_or($err)?))
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                ScaledNumber::from(self.0).fmt_with_unit(f, $unit)
            }
        }
    };
}

decl_unit!(Time, "s", "invalid time value");
decl_unit!(Voltage, "V", "invalid voltage");
decl_unit!(SamplingRate, "Sa/s", "invalid sampling rate");

impl SamplingRate {
    /// Time between two consecutive samples.
    pub fn period(self) -> Time {
        Time(self.0.recip())
    }
}

/// Division ratio of the passive probe; displayed voltages are multiplied by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, SerializeDisplay, DeserializeFromStr)]
pub struct ProbeAttenuation(pub u32);

impl ProbeAttenuation {
    pub const X1: Self = Self(1);
    pub const X10: Self = Self(10);

    pub fn factor(self) -> f64 {
        self.0 as f64
    }
}

impl FromStr for ProbeAttenuation {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s
            .strip_prefix(['x', 'X'])
            .or_else(|| s.strip_suffix(['x', 'X']))
            .ok_or("not an attenuation factor")?;

        match s.parse() {
            Ok(0) | Err(_) => Err("invalid attenuation factor"),
            Ok(n) => Ok(Self(n)),
        }
    }
}

impl Display for ProbeAttenuation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_char('x')?;
        self.0.fmt(f)
    }
}

impl Default for ProbeAttenuation {
    fn default() -> Self {
        Self::X1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn display_has_unit_and_prefix() {
        assert_eq!(Time(5e-3).to_string(), "5 ms");
        assert_eq!(Time(100e-9).to_string(), "100 ns");
        assert_eq!(Voltage(0.5).to_string(), "500 mV");
        assert_eq!(Voltage(20.0).to_string(), "20 V");
        assert_eq!(SamplingRate(24e6).to_string(), "24 MSa/s");
        assert_eq!(ProbeAttenuation::X10.to_string(), "x10");
    }

    #[test]
    fn parses_with_and_without_space() {
        assert_approx_eq!(f64, "500mV".parse::<Voltage>().unwrap().0, 0.5, ulps = 2);
        assert_approx_eq!(f64, "500 mV".parse::<Voltage>().unwrap().0, 0.5, ulps = 2);
        assert_approx_eq!(f64, "2 us".parse::<Time>().unwrap().0, 2e-6, ulps = 2);
        assert_approx_eq!(f64, "100 kSa/s".parse::<SamplingRate>().unwrap().0, 100e3, ulps = 2);
        assert!("500m".parse::<Voltage>().is_err());
    }

    #[test]
    fn parses_probe_attenuation() {
        assert_eq!("x10".parse::<ProbeAttenuation>(), Ok(ProbeAttenuation::X10));
        assert_eq!("1X".parse::<ProbeAttenuation>(), Ok(ProbeAttenuation::X1));
        assert!("x0".parse::<ProbeAttenuation>().is_err());
        assert!("10".parse::<ProbeAttenuation>().is_err());
    }

    #[test]
    fn sampling_period() {
        assert_approx_eq!(f64, SamplingRate(1e6).period().0, 1e-6, ulps = 2);
    }
}
