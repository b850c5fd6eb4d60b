use crate::data::{controls::SampleRate, units::SamplingRate};

const fn rate(code: u8, rate: f64) -> SampleRate {
    SampleRate {
        code,
        rate: SamplingRate(rate),
    }
}

pub(crate) const SR_100K: SampleRate = rate(0x0A, 100e3);
pub(crate) const SR_200K: SampleRate = rate(0x14, 200e3);
pub(crate) const SR_500K: SampleRate = rate(0x32, 500e3);
pub(crate) const SR_1M: SampleRate = rate(0x01, 1e6);
pub(crate) const SR_4M: SampleRate = rate(0x04, 4e6);
pub(crate) const SR_8M: SampleRate = rate(0x08, 8e6);
pub(crate) const SR_16M: SampleRate = rate(0x10, 16e6);
pub(crate) const SR_24M: SampleRate = rate(0x30, 24e6);

/// Selectable sample rates, slowest first.
pub const SAMPLE_RATES: [SampleRate; 8] = [
    SR_100K, SR_200K, SR_500K, SR_1M, SR_4M, SR_8M, SR_16M, SR_24M,
];
