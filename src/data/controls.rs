//! Control-panel selections and the device register codes they map to.

use super::units::{ProbeAttenuation, SamplingRate, Time, Voltage};
use crate::consts::{
    GRID_DIVS_HORIZONTAL, SAMPLE_RATES, TIME_BASES, VERTICAL_SCALES, VOLTAGE_RANGES,
};
use float_cmp::ApproxEqUlps;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::{fmt::Display, str::FromStr};
use strum::Display;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
)]
pub enum Channel {
    #[default]
    #[strum(serialize = "CH1")]
    Ch1 = 0,
    #[strum(serialize = "CH2")]
    Ch2 = 1,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Ch1, Channel::Ch2];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// A device sample rate and the register code that selects it.
#[derive(Debug, Clone, Copy, PartialEq, SerializeDisplay, DeserializeFromStr)]
pub struct SampleRate {
    pub code: u8,
    pub rate: SamplingRate,
}

impl SampleRate {
    pub fn from_code(code: u8) -> Option<Self> {
        SAMPLE_RATES.into_iter().find(|r| r.code == code)
    }

    pub fn from_rate(rate: SamplingRate) -> Option<Self> {
        SAMPLE_RATES
            .into_iter()
            .find(|r| r.rate.0.approx_eq_ulps(&rate.0, 4))
    }
}

impl Display for SampleRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.rate.fmt(f)
    }
}

impl FromStr for SampleRate {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_rate(s.parse()?).ok_or("unsupported sample rate")
    }
}

/// Input range of the front end: the ADC spans `±full_scale`.
#[derive(Debug, Clone, Copy, PartialEq, SerializeDisplay, DeserializeFromStr)]
pub struct VoltageRange {
    pub code: u8,
    pub full_scale: Voltage,
}

impl VoltageRange {
    /// Zero-volt ADC reading before any device calibration.
    pub const NOMINAL_ZERO: f64 = 128.0;

    pub fn from_code(code: u8) -> Option<Self> {
        VOLTAGE_RANGES.into_iter().find(|r| r.code == code)
    }

    pub fn volts_per_lsb(&self) -> f64 {
        self.full_scale.0 / 128.0
    }

    pub fn to_volts(&self, raw: u8) -> f64 {
        (raw as f64 - Self::NOMINAL_ZERO) * self.volts_per_lsb()
    }
}

impl Display for VoltageRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("±")?;
        self.full_scale.fmt(f)
    }
}

impl FromStr for VoltageRange {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix('±').unwrap_or(s);
        let full_scale: Voltage = s.parse()?;
        VOLTAGE_RANGES
            .into_iter()
            .find(|r| r.full_scale.0.approx_eq_ulps(&full_scale.0, 4))
            .ok_or("unsupported voltage range")
    }
}

/// Horizontal scale and the sample rate it acquires at.
#[derive(Debug, Clone, Copy, PartialEq, SerializeDisplay, DeserializeFromStr)]
pub struct TimeBase {
    pub per_div: Time,
    pub sample_rate: SampleRate,
}

impl TimeBase {
    pub fn sample_rate(&self) -> SampleRate {
        self.sample_rate
    }

    /// Samples needed to fill the screen width at `rate`.
    pub fn samples_on_screen(&self, rate: SamplingRate) -> usize {
        (self.per_div.0 * GRID_DIVS_HORIZONTAL * rate.0).ceil().max(0.0) as usize
    }

    pub fn position(&self) -> usize {
        TIME_BASES
            .iter()
            .position(|t| t.per_div.0.approx_eq_ulps(&self.per_div.0, 4))
            .unwrap_or(0)
    }

    /// The next slower timebase (more time per division).
    pub fn slower(&self) -> Option<Self> {
        self.position().checked_sub(1).map(|i| TIME_BASES[i])
    }

    /// The next faster timebase (less time per division).
    pub fn faster(&self) -> Option<Self> {
        TIME_BASES.get(self.position() + 1).copied()
    }
}

impl Display for TimeBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.per_div.fmt(f)?;
        f.write_str("/div")
    }
}

impl FromStr for TimeBase {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let per_div: Time = s.strip_suffix("/div").unwrap_or(s).parse()?;
        TIME_BASES
            .into_iter()
            .find(|t| t.per_div.0.approx_eq_ulps(&per_div.0, 4))
            .ok_or("unsupported time base")
    }
}

/// Displayed volts per division and the input range the device is switched to for it.
#[derive(Debug, Clone, Copy, PartialEq, SerializeDisplay, DeserializeFromStr)]
pub struct VerticalScale {
    pub per_div: Voltage,
    pub range: VoltageRange,
}

impl VerticalScale {
    /// Whether the scale is offered with the given probe.
    pub fn valid_for(&self, probe: ProbeAttenuation) -> bool {
        if probe == ProbeAttenuation::X10 {
            self.per_div.0 >= 1.0
        } else {
            self.per_div.0 <= 5.0
        }
    }

    pub fn from_per_div(per_div: Voltage) -> Option<Self> {
        VERTICAL_SCALES
            .into_iter()
            .find(|v| v.per_div.0.approx_eq_ulps(&per_div.0, 4))
    }
}

impl Display for VerticalScale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.per_div.fmt(f)?;
        f.write_str("/div")
    }
}

impl FromStr for VerticalScale {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let per_div: Voltage = s.strip_suffix("/div").unwrap_or(s).parse()?;
        Self::from_per_div(per_div).ok_or("unsupported vertical scale")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{RANGE_1V, RANGE_2V5, RANGE_500MV, RANGE_5V};

    #[test]
    fn register_codes_resolve() {
        assert_eq!(SampleRate::from_code(0x30).unwrap().rate, SamplingRate(24e6));
        assert_eq!(SampleRate::from_code(0x0A).unwrap().rate, SamplingRate(100e3));
        assert!(SampleRate::from_code(0x02).is_none());
        assert_eq!(VoltageRange::from_code(0x05), Some(RANGE_1V));
        assert!(VoltageRange::from_code(0x03).is_none());
    }

    #[test]
    fn raw_byte_to_volts() {
        assert_eq!(RANGE_5V.to_volts(128), 0.0);
        assert_eq!(RANGE_5V.to_volts(255), 127.0 * 0.0390625);
        assert_eq!(RANGE_5V.to_volts(0), -5.0);
        assert_eq!(RANGE_2V5.volts_per_lsb(), 0.01953125);
        assert_eq!(RANGE_500MV.to_volts(64), -0.25);
    }

    #[test]
    fn labels() {
        assert_eq!(TIME_BASES[0].to_string(), "5 ms/div");
        assert_eq!(TIME_BASES[3].to_string(), "500 µs/div");
        assert_eq!(VERTICAL_SCALES[6].to_string(), "500 mV/div");
        assert_eq!(RANGE_2V5.to_string(), "±2.5 V");
    }

    #[test]
    fn labels_parse_back_to_table_entries() {
        for tb in TIME_BASES {
            assert_eq!(tb.to_string().parse::<TimeBase>(), Ok(tb));
        }
        for vs in VERTICAL_SCALES {
            assert_eq!(vs.to_string().parse::<VerticalScale>(), Ok(vs));
        }
        assert_eq!("±1 V".parse::<VoltageRange>(), Ok(RANGE_1V));
        assert_eq!("24 MSa/s".parse::<SampleRate>().map(|r| r.code), Ok(0x30));
        assert!("3 ms/div".parse::<TimeBase>().is_err());
    }

    #[test]
    fn time_base_neighbours() {
        let first = TIME_BASES[0];
        let last = TIME_BASES[TIME_BASES.len() - 1];
        assert_eq!(first.slower(), None);
        assert_eq!(first.faster(), Some(TIME_BASES[1]));
        assert_eq!(last.faster(), None);
        assert_eq!(last.slower(), Some(TIME_BASES[TIME_BASES.len() - 2]));
    }

    #[test]
    fn probe_limits_offered_scales() {
        let fifty = VerticalScale::from_per_div(Voltage(50.0)).unwrap();
        let tenth = VerticalScale::from_per_div(Voltage(0.1)).unwrap();
        let one = VerticalScale::from_per_div(Voltage(1.0)).unwrap();
        assert!(!fifty.valid_for(ProbeAttenuation::X1));
        assert!(fifty.valid_for(ProbeAttenuation::X10));
        assert!(tenth.valid_for(ProbeAttenuation::X1));
        assert!(!tenth.valid_for(ProbeAttenuation::X10));
        assert!(one.valid_for(ProbeAttenuation::X1) && one.valid_for(ProbeAttenuation::X10));
    }
}
