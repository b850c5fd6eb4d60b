use crate::data::{controls::VoltageRange, units::Voltage};

const fn range(code: u8, full_scale: f64) -> VoltageRange {
    VoltageRange {
        code,
        full_scale: Voltage(full_scale),
    }
}

pub const RANGE_5V: VoltageRange = range(0x01, 5.0);
pub const RANGE_2V5: VoltageRange = range(0x02, 2.5);
pub const RANGE_1V: VoltageRange = range(0x05, 1.0);
pub const RANGE_500MV: VoltageRange = range(0x0A, 0.5);

pub const VOLTAGE_RANGES: [VoltageRange; 4] = [RANGE_5V, RANGE_2V5, RANGE_1V, RANGE_500MV];
