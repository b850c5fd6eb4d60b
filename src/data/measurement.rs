use super::units::{ProbeAttenuation, SamplingRate};
use crate::scaled_number::ScaledNumber;
use arrayvec::ArrayVec;
use serde::Serialize;

macro_rules! decl_measurement {
    ($name:ident, $prefix:literal, $unit:literal) => {
        #[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
        pub struct $name(pub Option<ScaledNumber>);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(concat!($prefix, "="))?;
                if let Some(val) = &self.0 {
                    val.fmt(f)?;
                    f.write_str($unit)
                } else {
                    Ok(())
                }
            }
        }
    };
}

decl_measurement!(Minimum, "Vmin", "V");
decl_measurement!(Maximum, "Vmax", "V");
decl_measurement!(PeakToPeak, "Vpp", "V");
decl_measurement!(Average, "Vavg", "V");
decl_measurement!(Rms, "RMS", "V");
decl_measurement!(Period, "T", "s");
decl_measurement!(Frequency, "F", "Hz");

/// Software measurements of one channel, in probe-corrected volts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct Measurements {
    pub minimum: Minimum,
    pub maximum: Maximum,
    pub peak_to_peak: PeakToPeak,
    pub average: Average,
    pub rms: Rms,
    pub period: Period,
    pub frequency: Frequency,
}

impl Measurements {
    pub const MEASUREMENT_COUNT: usize = 7;

    /// Hysteresis around the mid level, as a fraction of peak-to-peak.
    const HYSTERESIS: f64 = 0.1;

    pub fn compute(volts: &[f64], sample_rate: SamplingRate, probe: ProbeAttenuation) -> Self {
        if volts.is_empty() {
            return Self::default();
        }

        let factor = probe.factor();
        let (min, max) = volts
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        let len = volts.len() as f64;
        let mean = volts.iter().sum::<f64>() / len;
        let rms = (volts.iter().map(|v| v * v).sum::<f64>() / len).sqrt();

        let period = rising_crossing_period(volts, min, max).map(|samples| samples / sample_rate.0);

        let scaled = |v: f64| Some(ScaledNumber(v * factor));
        Self {
            minimum: Minimum(scaled(min)),
            maximum: Maximum(scaled(max)),
            peak_to_peak: PeakToPeak(scaled(max - min)),
            average: Average(scaled(mean)),
            rms: Rms(scaled(rms)),
            period: Period(period.map(ScaledNumber)),
            frequency: Frequency(period.map(|p| ScaledNumber(p.recip()))),
        }
    }

    pub fn for_display(&self) -> ArrayVec<String, { Self::MEASUREMENT_COUNT }> {
        let mut out = ArrayVec::new();
        out.push(self.peak_to_peak.to_string());
        out.push(self.minimum.to_string());
        out.push(self.maximum.to_string());
        out.push(self.average.to_string());
        out.push(self.rms.to_string());
        out.push(self.frequency.to_string());
        out.push(self.period.to_string());
        out
    }
}

/// Mean distance in samples between rising crossings of the mid level, if there are at least
/// two of them.
fn rising_crossing_period(volts: &[f64], min: f64, max: f64) -> Option<f64> {
    let span = max - min;
    if span <= f64::EPSILON {
        return None;
    }

    let mid = (max + min) / 2.0;
    let low = mid - span * Measurements::HYSTERESIS;
    let high = mid + span * Measurements::HYSTERESIS;

    let mut armed = false;
    let mut first = None;
    let mut last = 0;
    let mut count = 0usize;

    for (i, &v) in volts.iter().enumerate() {
        if v < low {
            armed = true;
        } else if armed && v > high {
            armed = false;
            first.get_or_insert(i);
            last = i;
            count += 1;
        }
    }

    let first = first?;
    (count >= 2).then(|| (last - first) as f64 / (count - 1) as f64)
}
