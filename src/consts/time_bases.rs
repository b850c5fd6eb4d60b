use super::sample_rates::*;
use crate::data::{
    controls::{SampleRate, TimeBase},
    units::Time,
};

const fn tb(per_div: f64, sample_rate: SampleRate) -> TimeBase {
    TimeBase {
        per_div: Time(per_div),
        sample_rate,
    }
}

/// Supported timebases, slowest first.
pub const TIME_BASES: [TimeBase; 15] = [
    tb(5e-3, SR_100K),
    tb(2e-3, SR_100K),
    tb(1e-3, SR_100K),
    tb(500e-6, SR_200K),
    tb(200e-6, SR_500K),
    tb(100e-6, SR_1M),
    tb(50e-6, SR_1M),
    tb(20e-6, SR_4M),
    tb(10e-6, SR_8M),
    tb(5e-6, SR_16M),
    tb(2e-6, SR_24M),
    tb(1e-6, SR_24M),
    tb(500e-9, SR_24M),
    tb(200e-9, SR_24M),
    tb(100e-9, SR_24M),
];

pub const DEFAULT_TIME_BASE: TimeBase = TIME_BASES[9];
