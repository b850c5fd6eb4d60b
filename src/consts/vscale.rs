use super::voltage_ranges::*;
use crate::data::{
    controls::{VerticalScale, VoltageRange},
    units::Voltage,
};

const fn vs(per_div: f64, range: VoltageRange) -> VerticalScale {
    VerticalScale {
        per_div: Voltage(per_div),
        range,
    }
}

/// Supported vertical scales (displayed, probe attenuation included), largest first.
///
/// The 50/20/10 V entries are only offered with a x10 probe, the sub-volt ones only with x1.
pub const VERTICAL_SCALES: [VerticalScale; 9] = [
    vs(50.0, RANGE_5V),
    vs(20.0, RANGE_5V),
    vs(10.0, RANGE_2V5),
    vs(5.0, RANGE_5V),
    vs(2.0, RANGE_5V),
    vs(1.0, RANGE_2V5),
    vs(0.5, RANGE_1V),
    vs(0.2, RANGE_500MV),
    vs(0.1, RANGE_500MV),
];

pub const DEFAULT_VERTICAL_SCALE: VerticalScale = VERTICAL_SCALES[4];
